//! Harness configuration (`agecalc-eval.toml`).
//!
//! Every section is optional. A missing file means all defaults.
//!
//! ```toml
//! [report]
//! path = "test-results/evaluation.xml"
//!
//! [thresholds]
//! tool_selection = 0.95
//! refusal_accuracy = 1.0
//!
//! [agent]
//! model_id = "age-calculator"
//! max_tool_turns = 4
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::agent::AgentSettings;
use crate::eval::gate::Threshold;
use crate::eval::metric::MetricKind;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "agecalc-eval.toml";

/// Default JUnit report location.
pub const DEFAULT_REPORT_PATH: &str = "test-results/evaluation.xml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvalConfig {
    #[serde(default)]
    pub report: ReportConfig,

    /// Per-metric gate thresholds.
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    #[serde(default)]
    pub agent: AgentSettings,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Where the test step writes its JUnit XML.
    #[serde(default = "default_report_path")]
    pub path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: default_report_path(),
        }
    }
}

fn default_report_path() -> PathBuf {
    PathBuf::from(DEFAULT_REPORT_PATH)
}

/// Thresholds are validated into `[0.0, 1.0]` while parsing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdConfig {
    #[serde(default = "default_tool_selection")]
    pub tool_selection: Threshold,

    #[serde(default = "default_refusal_accuracy")]
    pub refusal_accuracy: Threshold,
}

impl ThresholdConfig {
    /// The configured threshold for `metric`.
    #[must_use]
    pub const fn for_metric(&self, metric: MetricKind) -> Threshold {
        match metric {
            MetricKind::ToolSelection => self.tool_selection,
            MetricKind::RefusalAccuracy => self.refusal_accuracy,
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            tool_selection: default_tool_selection(),
            refusal_accuracy: default_refusal_accuracy(),
        }
    }
}

const fn default_tool_selection() -> Threshold {
    MetricKind::ToolSelection.default_threshold()
}

const fn default_refusal_accuracy() -> Threshold {
    MetricKind::RefusalAccuracy.default_threshold()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl EvalConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found), invalid
    /// TOML, unknown fields, or out-of-range thresholds.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` with a line number when the TOML is invalid.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
