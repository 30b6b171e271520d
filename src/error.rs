//! Top-level error type for evaluation runs.
//!
//! [`EvalError`] is what the `check` and `validate` commands surface. Each
//! variant says what went wrong and what to do next, so a CI log alone is
//! enough to act on.

use std::fmt;
use std::path::PathBuf;

use crate::eval::gate::ThresholdError;
use crate::eval::integrity::IntegrityReport;
use crate::eval::report::ReportError;

// ---------------------------------------------------------------------------
// EvalError
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum EvalError {
    /// The configuration file could not be loaded or parsed.
    Config {
        path: PathBuf,
        detail: String,
    },

    /// A threshold outside `[0.0, 1.0]`.
    InvalidThreshold(ThresholdError),

    /// The dataset failed one or more integrity checks.
    Integrity(IntegrityReport),

    /// The report exists but could not be read or parsed.
    Report(ReportError),
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { path, detail } => write!(
                f,
                "configuration error in '{}': {detail}\n  To fix: edit the config file and correct the issue.",
                path.display()
            ),
            Self::InvalidThreshold(err) => write!(
                f,
                "{err}\n  To fix: pass a fraction such as 0.95, not a percentage."
            ),
            Self::Integrity(report) => write!(
                f,
                "{report}\n  To fix: correct the listed cases; no score is valid until the dataset passes."
            ),
            Self::Report(err @ ReportError::Unreadable { .. }) => write!(
                f,
                "{err}\n  To fix: check file permissions on the report path."
            ),
            Self::Report(err) => write!(
                f,
                "{err}\n  To fix: re-run the evaluation test step so it writes a complete JUnit XML file."
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// std::error::Error
// ---------------------------------------------------------------------------

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidThreshold(err) => Some(err),
            Self::Report(err) => Some(err),
            Self::Config { .. } | Self::Integrity(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// From impls
// ---------------------------------------------------------------------------

impl From<crate::config::ConfigError> for EvalError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config {
            path: err.path.unwrap_or_default(),
            detail: err.message,
        }
    }
}

impl From<ThresholdError> for EvalError {
    fn from(err: ThresholdError) -> Self {
        Self::InvalidThreshold(err)
    }
}

impl From<IntegrityReport> for EvalError {
    fn from(report: IntegrityReport) -> Self {
        Self::Integrity(report)
    }
}

impl From<ReportError> for EvalError {
    fn from(err: ReportError) -> Self {
        Self::Report(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::gate::Threshold;

    #[test]
    fn display_config_error() {
        let err = EvalError::from(crate::config::ConfigError {
            path: Some(PathBuf::from("agecalc-eval.toml")),
            message: "line 2: unknown field `strict`".to_owned(),
        });
        let msg = err.to_string();
        assert!(msg.contains("agecalc-eval.toml"));
        assert!(msg.contains("unknown field"));
        assert!(msg.contains("To fix: edit the config file"));
    }

    #[test]
    fn display_threshold_error() {
        let err: EvalError = Threshold::new(95.0).unwrap_err().into();
        let msg = err.to_string();
        assert!(msg.contains("got 95"));
        assert!(msg.contains("not a percentage"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn display_malformed_report() {
        let err: EvalError = ReportError::Malformed {
            detail: "unexpected end of stream".to_owned(),
        }
        .into();
        assert!(err.to_string().contains("re-run the evaluation test step"));
    }

    #[test]
    fn display_unreadable_report() {
        let err: EvalError = ReportError::Unreadable {
            path: PathBuf::from("r.xml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("r.xml"));
        assert!(msg.contains("file permissions"));
    }

    #[test]
    fn integrity_error_has_no_source() {
        let err = EvalError::from(IntegrityReport::default());
        assert!(std::error::Error::source(&err).is_none());
    }
}
