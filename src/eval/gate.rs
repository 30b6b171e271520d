//! Threshold gate: turns a score into a pipeline decision.

use std::fmt;
use std::process::ExitCode;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::metric::MetricKind;
use super::score::Score;

// ---------------------------------------------------------------------------
// Threshold
// ---------------------------------------------------------------------------

/// A required pass rate in `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Threshold(f64);

/// A threshold outside `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
#[error("threshold must be between 0.0 and 1.0, got {value}")]
pub struct ThresholdError {
    pub value: f64,
}

impl Threshold {
    /// Every case must pass.
    pub const PERFECT: Self = Self(1.0);
    /// Default for tool selection.
    pub const TOOL_SELECTION: Self = Self(0.95);

    /// Validate a threshold.
    ///
    /// # Errors
    /// Returns [`ThresholdError`] for values outside `[0.0, 1.0]` and for NaN.
    pub fn new(value: f64) -> Result<Self, ThresholdError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ThresholdError { value })
        }
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Threshold {
    type Error = ThresholdError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Threshold> for f64 {
    fn from(t: Threshold) -> Self {
        t.0
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.0)
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// The gate's verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Pass,
    Fail,
}

impl Decision {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }

    /// Process exit code for the pipeline step.
    #[must_use]
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Pass => ExitCode::SUCCESS,
            Self::Fail => ExitCode::FAILURE,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass iff `score >= threshold`.
#[must_use]
pub fn gate(score: f64, threshold: Threshold) -> Decision {
    if score >= threshold.value() {
        Decision::Pass
    } else {
        Decision::Fail
    }
}

// ---------------------------------------------------------------------------
// GateOutcome
// ---------------------------------------------------------------------------

/// Why a gate failed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailReason {
    /// No record matched the metric. Usually a misconfigured report or metric.
    NoData,
    /// The rate fell short by `deficit`.
    BelowThreshold { deficit: f64 },
}

/// A gated metric, ready to print.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GateOutcome {
    pub metric: MetricKind,
    pub passed: usize,
    pub total: usize,
    pub rate: f64,
    pub threshold: Threshold,
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailReason>,
}

impl GateOutcome {
    /// Gate `score` against `threshold`.
    #[must_use]
    pub fn evaluate(score: Score, threshold: Threshold) -> Self {
        let rate = score.rate();
        let decision = if score.is_empty() {
            Decision::Fail
        } else {
            gate(rate, threshold)
        };
        let reason = match decision {
            Decision::Pass => None,
            Decision::Fail if score.is_empty() => Some(FailReason::NoData),
            Decision::Fail => Some(FailReason::BelowThreshold {
                deficit: threshold.value() - rate,
            }),
        };
        Self {
            metric: score.metric,
            passed: score.passed,
            total: score.total,
            rate,
            threshold,
            decision,
            reason,
        }
    }

    /// The one-line summary printed by `check`.
    #[must_use]
    pub fn status_line(&self) -> String {
        format!(
            "[agecalc-eval] metric={} passed={}/{} ({:.1}%) threshold={} {}",
            self.metric,
            self.passed,
            self.total,
            self.rate * 100.0,
            self.threshold,
            self.decision
        )
    }

    /// A follow-up explanation for failures, if any.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self.reason? {
            FailReason::NoData => Some(format!(
                "no test records matched metric '{}'. Check that the report contains cases for this metric.",
                self.metric
            )),
            FailReason::BelowThreshold { deficit } => Some(format!(
                "{} is {:.1} points below its threshold.",
                self.metric,
                deficit * 100.0
            )),
        }
    }
}

impl fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.status_line())?;
        if let Some(detail) = self.detail() {
            write!(f, "\n  {detail}")?;
        }
        Ok(())
    }
}
