//! The deployment gate pipeline.
//!
//! dataset integrity → report → score → gate. A missing report is not an
//! error: the step assumes an upstream job already enforced the gate and
//! lets the pipeline continue.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::instrument;

use crate::error::EvalError;
use crate::eval::gate::{Decision, GateOutcome};
use crate::eval::ground_truth::Dataset;
use crate::eval::metric::Metric;
use crate::eval::report::{self, ReportError};
use crate::eval::score::score;

/// What `check` decided.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    Gated(GateOutcome),
    ReportMissing { path: PathBuf },
}

impl CheckOutcome {
    /// Whether the pipeline may proceed.
    #[must_use]
    pub const fn decision(&self) -> Decision {
        match self {
            Self::Gated(outcome) => outcome.decision,
            Self::ReportMissing { .. } => Decision::Pass,
        }
    }

    /// The lines printed for a text-format run.
    #[must_use]
    pub fn render_text(&self) -> String {
        match self {
            Self::Gated(outcome) => outcome.to_string(),
            Self::ReportMissing { path } => format!(
                "[agecalc-eval] WARNING: report not found at {}; assuming the evaluation gate was enforced upstream. Skipping threshold check.",
                path.display()
            ),
        }
    }
}

/// Gate `metric` at its threshold using the report at `report_path`.
///
/// # Errors
/// [`EvalError::Integrity`] if the ground truth is corrupt and
/// [`EvalError::Report`] if the report exists but is unreadable or malformed.
#[instrument(skip_all, fields(metric = %metric.kind, threshold = metric.threshold.value(), report = %report_path.display()))]
pub fn run_check(metric: Metric, report_path: &Path) -> Result<CheckOutcome, EvalError> {
    let dataset = Dataset::ground_truth()?;
    let test_report = match report::load(report_path) {
        Ok(r) => r,
        Err(ReportError::Missing { path }) => {
            tracing::warn!(path = %path.display(), "report missing; skipping gate");
            return Ok(CheckOutcome::ReportMissing { path });
        }
        Err(e) => return Err(e.into()),
    };

    let s = score(&dataset, &test_report.records, metric.kind);
    let outcome = GateOutcome::evaluate(s, metric.threshold);
    tracing::info!(
        passed = outcome.passed,
        total = outcome.total,
        decision = %outcome.decision,
        "gate evaluated"
    );
    Ok(CheckOutcome::Gated(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::gate::Threshold;
    use crate::eval::metric::MetricKind;

    #[test]
    fn missing_report_passes() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_check(
            Metric::with_default_threshold(MetricKind::RefusalAccuracy),
            &dir.path().join("absent.xml"),
        )
        .unwrap();
        assert!(matches!(out, CheckOutcome::ReportMissing { .. }));
        assert_eq!(out.decision(), Decision::Pass);
        assert!(out.render_text().contains("WARNING: report not found"));
    }

    #[test]
    fn malformed_report_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval.xml");
        std::fs::write(&path, "<testsuites><testsuite>").unwrap();
        let err = run_check(Metric::with_default_threshold(MetricKind::ToolSelection), &path).unwrap_err();
        assert!(matches!(err, EvalError::Report(ReportError::Malformed { .. })));
    }

    #[test]
    fn gates_on_report_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval.xml");
        std::fs::write(
            &path,
            r#"<testsuite name="eval">
                <testcase classname="agecalc.eval.out_of_scope" name="TC-040"/>
                <testcase classname="agecalc.eval.out_of_scope" name="TC-041"><failure/></testcase>
            </testsuite>"#,
        )
        .unwrap();
        let out = run_check(Metric::with_default_threshold(MetricKind::RefusalAccuracy), &path).unwrap();
        let CheckOutcome::Gated(g) = &out else {
            panic!("expected a gate outcome");
        };
        assert_eq!((g.passed, g.total), (1, 2));
        assert_eq!(out.decision(), Decision::Fail);

        // The same report clears a lowered threshold.
        let lenient = Metric {
            kind: MetricKind::RefusalAccuracy,
            threshold: Threshold::new(0.5).unwrap(),
        };
        let out = run_check(lenient, &path).unwrap();
        assert_eq!(out.decision(), Decision::Pass);
    }
}
