//! Scorer: counts run records against a metric's case population.
//!
//! A record is attributed to a case when any token of its `name` or
//! `classname` is a case id in the dataset; the metric then counts it iff the
//! case is in its population. Records that name no case fall back to a label
//! match: they count when `name` or `classname` contains the metric label.
//! Skipped records never count.

use serde::Serialize;
use tracing::instrument;

use super::case::Case;
use super::ground_truth::Dataset;
use super::metric::MetricKind;
use super::report::RunRecord;

/// `passed` out of `total` records for one metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Score {
    pub metric: MetricKind,
    pub passed: usize,
    pub total: usize,
}

impl Score {
    /// Pass rate; `0.0` when nothing matched.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64
        }
    }

    /// No record matched the metric.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// How a record relates to a metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attribution<'d> {
    Case(&'d Case),
    Label,
    Unrelated,
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .filter(|t| !t.is_empty())
}

fn attribute<'d>(dataset: &'d Dataset, record: &RunRecord, metric: MetricKind) -> Attribution<'d> {
    let by_id = tokens(&record.name)
        .chain(tokens(&record.classname))
        .find_map(|t| dataset.get(t));
    if let Some(case) = by_id {
        return Attribution::Case(case);
    }
    let label = metric.label();
    if record.name.contains(label) || record.classname.contains(label) {
        Attribution::Label
    } else {
        Attribution::Unrelated
    }
}

/// Whether `record` counts toward `metric`.
#[must_use]
pub fn counts_toward(dataset: &Dataset, record: &RunRecord, metric: MetricKind) -> bool {
    if record.skipped() {
        return false;
    }
    match attribute(dataset, record, metric) {
        Attribution::Case(case) => metric.selects(case),
        Attribution::Label => true,
        Attribution::Unrelated => false,
    }
}

/// Score `records` for `metric`.
#[instrument(skip_all, fields(metric = %metric, records = records.len()))]
pub fn score(dataset: &Dataset, records: &[RunRecord], metric: MetricKind) -> Score {
    let (passed, total) = records
        .iter()
        .filter(|r| counts_toward(dataset, r, metric))
        .fold((0, 0), |(p, t), r| (p + usize::from(r.passed()), t + 1));
    tracing::debug!(passed, total, "scored");
    Score {
        metric,
        passed,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::report::Outcome;

    fn ds() -> Dataset {
        Dataset::ground_truth().unwrap()
    }

    fn rec(classname: &str, name: &str, outcome: Outcome) -> RunRecord {
        RunRecord {
            classname: classname.to_owned(),
            name: name.to_owned(),
            outcome,
        }
    }

    #[test]
    fn attributes_by_case_id_token() {
        let ds = ds();
        let records = [
            rec("agecalc.eval.happy_path", "TC-001", Outcome::Passed),
            rec("tests.test_eval", "test_case[TC-040]", Outcome::Failed),
            rec("agecalc.eval.adversarial", "TC-050", Outcome::Passed),
        ];
        let tool = score(&ds, &records, MetricKind::ToolSelection);
        assert_eq!((tool.passed, tool.total), (1, 1));
        let refusal = score(&ds, &records, MetricKind::RefusalAccuracy);
        assert_eq!((refusal.passed, refusal.total), (1, 2));
    }

    #[test]
    fn falls_back_to_metric_label() {
        let ds = ds();
        let records = [
            rec("tests.test_refusal_accuracy", "test_declines_jokes", Outcome::Passed),
            rec("tests.other", "test_refusal_accuracy_weather", Outcome::Errored),
            rec("tests.other", "test_unrelated", Outcome::Passed),
        ];
        let s = score(&ds, &records, MetricKind::RefusalAccuracy);
        assert_eq!((s.passed, s.total), (1, 2));
        assert!(score(&ds, &records, MetricKind::ToolSelection).is_empty());
    }

    #[test]
    fn case_id_wins_over_label() {
        // TC-040 is a refusal, so the tool_selection label does not pull it in.
        let ds = ds();
        let records = [rec("tool_selection", "TC-040", Outcome::Passed)];
        assert!(score(&ds, &records, MetricKind::ToolSelection).is_empty());
        assert_eq!(score(&ds, &records, MetricKind::RefusalAccuracy).total, 1);
    }

    #[test]
    fn skipped_records_are_excluded() {
        let ds = ds();
        let records = [
            rec("x", "TC-040", Outcome::Skipped),
            rec("x", "TC-041", Outcome::Passed),
        ];
        let s = score(&ds, &records, MetricKind::RefusalAccuracy);
        assert_eq!((s.passed, s.total), (1, 1));
    }

    #[test]
    fn empty_score_rate_is_zero() {
        let s = score(&ds(), &[], MetricKind::ToolSelection);
        assert!(s.is_empty());
        assert!(s.rate().abs() < f64::EPSILON);
    }

    #[test]
    fn partial_id_does_not_match() {
        let ds = ds();
        let records = [rec("x", "TC-0401", Outcome::Passed)];
        assert!(score(&ds, &records, MetricKind::RefusalAccuracy).is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_record() -> impl Strategy<Value = RunRecord> {
            let ids = prop::sample::select(vec![
                "TC-001", "TC-010", "TC-030", "TC-040", "TC-047", "TC-055", "TC-057", "other",
            ]);
            let classes = prop::sample::select(vec![
                "agecalc.eval.case",
                "suite.tool_selection",
                "suite.refusal_accuracy",
            ]);
            let outcomes = prop::sample::select(vec![
                Outcome::Passed,
                Outcome::Failed,
                Outcome::Errored,
                Outcome::Skipped,
            ]);
            (classes, ids, outcomes).prop_map(|(c, n, o)| rec(c, n, o))
        }

        proptest! {
            #[test]
            fn order_does_not_change_scores(
                (records, shuffled) in prop::collection::vec(arb_record(), 0..40)
                    .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
            ) {
                let ds = ds();
                for metric in MetricKind::ALL {
                    prop_assert_eq!(score(&ds, &records, metric), score(&ds, &shuffled, metric));
                }
            }

            #[test]
            fn passed_never_exceeds_total(records in prop::collection::vec(arb_record(), 0..40)) {
                let ds = ds();
                for metric in MetricKind::ALL {
                    let s = score(&ds, &records, metric);
                    prop_assert!(s.passed <= s.total);
                    prop_assert!((0.0..=1.0).contains(&s.rate()));
                }
            }
        }
    }
}
