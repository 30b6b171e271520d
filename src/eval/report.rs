//! JUnit XML reports: parsing into run records and writing them back out.
//!
//! The root element is either `<testsuites>` or a single `<testsuite>`;
//! suites may nest and are flattened in document order. Each `<testcase>`
//! becomes a [`RunRecord`]: a `<failure>` child marks it failed, `<error>`
//! errored, `<skipped>` skipped, anything else passed.
//!
//! Suite attributes (`tests`, `failures`, `errors`, `skipped`) are trusted
//! when all four parse. Otherwise the suite is recounted from its test cases.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// The result of one executed test case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    /// The test raised instead of asserting. Counts as a failure.
    Errored,
    Skipped,
}

/// One `<testcase>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    pub classname: String,
    pub name: String,
    pub outcome: Outcome,
}

impl RunRecord {
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Passed)
    }

    #[must_use]
    pub const fn skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped)
    }
}

/// Counts for one `<testsuite>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SuiteSummary {
    pub name: String,
    pub tests: usize,
    pub failures: usize,
    pub errors: usize,
    pub skipped: usize,
    /// Counts were recomputed because attributes were missing or malformed.
    pub recounted: bool,
}

impl SuiteSummary {
    /// Tests that neither failed, errored nor were skipped.
    #[must_use]
    pub const fn passed(&self) -> usize {
        self.tests
            .saturating_sub(self.failures)
            .saturating_sub(self.errors)
            .saturating_sub(self.skipped)
    }

    fn from_records(name: String, records: &[RunRecord]) -> Self {
        let count = |o: Outcome| records.iter().filter(|r| r.outcome == o).count();
        Self {
            name,
            tests: records.len(),
            failures: count(Outcome::Failed),
            errors: count(Outcome::Errored),
            skipped: count(Outcome::Skipped),
            recounted: true,
        }
    }
}

/// Everything parsed from one report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TestReport {
    pub suites: Vec<SuiteSummary>,
    pub records: Vec<RunRecord>,
}

impl TestReport {
    /// Sum of all suite summaries.
    #[must_use]
    pub fn totals(&self) -> SuiteSummary {
        self.suites.iter().fold(
            SuiteSummary {
                name: "total".to_owned(),
                recounted: self.suites.iter().any(|s| s.recounted),
                ..SuiteSummary::default()
            },
            |acc, s| SuiteSummary {
                tests: acc.tests + s.tests,
                failures: acc.failures + s.failures,
                errors: acc.errors + s.errors,
                skipped: acc.skipped + s.skipped,
                ..acc
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read report {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed report: {detail}")]
    Malformed { detail: String },
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Read and parse the report at `path`.
///
/// # Errors
/// [`ReportError::Missing`] if the file does not exist, `Unreadable` for
/// other I/O failures, `Malformed` for bad XML.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<TestReport, ReportError> {
    let xml = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ReportError::Missing {
                path: path.to_owned(),
            }
        } else {
            ReportError::Unreadable {
                path: path.to_owned(),
                source,
            }
        }
    })?;
    parse(&xml)
}

/// Parse JUnit XML text.
///
/// # Errors
/// Returns [`ReportError::Malformed`] if the text is not XML or the root is
/// neither `<testsuites>` nor `<testsuite>`.
pub fn parse(xml: &str) -> Result<TestReport, ReportError> {
    let doc = Document::parse(xml).map_err(|e| ReportError::Malformed {
        detail: e.to_string(),
    })?;
    let root = doc.root_element();
    let mut report = TestReport::default();
    match root.tag_name().name() {
        "testsuites" => {
            for suite in root.children().filter(|n| is_tag(*n, "testsuite")) {
                collect_suite(suite, &mut report);
            }
        }
        "testsuite" => collect_suite(root, &mut report),
        other => {
            return Err(ReportError::Malformed {
                detail: format!("unexpected root element <{other}>; expected <testsuites> or <testsuite>"),
            });
        }
    }
    tracing::debug!(
        suites = report.suites.len(),
        records = report.records.len(),
        "parsed report"
    );
    Ok(report)
}

fn is_tag(node: Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

/// Push `suite`'s own test cases, then recurse into nested suites.
fn collect_suite(suite: Node<'_, '_>, report: &mut TestReport) {
    let name = suite.attribute("name").unwrap_or_default().to_owned();
    let records: Vec<RunRecord> = suite
        .children()
        .filter(|n| is_tag(*n, "testcase"))
        .map(record_from)
        .collect();

    let summary = match declared_counts(suite, &name) {
        Some(summary) => {
            if summary.tests != records.len() {
                tracing::warn!(
                    suite = %name,
                    declared = summary.tests,
                    found = records.len(),
                    "suite attribute count disagrees with test cases"
                );
            }
            summary
        }
        None => {
            tracing::warn!(suite = %name, "suite counts missing or malformed; recounting");
            SuiteSummary::from_records(name, &records)
        }
    };

    report.suites.push(summary);
    report.records.extend(records);

    for nested in suite.children().filter(|n| is_tag(*n, "testsuite")) {
        collect_suite(nested, report);
    }
}

fn declared_counts(suite: Node<'_, '_>, name: &str) -> Option<SuiteSummary> {
    let attr = |key: &str| suite.attribute(key)?.trim().parse::<usize>().ok();
    Some(SuiteSummary {
        name: name.to_owned(),
        tests: attr("tests")?,
        failures: attr("failures")?,
        errors: attr("errors")?,
        skipped: attr("skipped")?,
        recounted: false,
    })
}

fn record_from(case: Node<'_, '_>) -> RunRecord {
    let has = |tag: &str| case.children().any(|n| is_tag(n, tag));
    let outcome = if has("failure") {
        Outcome::Failed
    } else if has("error") {
        Outcome::Errored
    } else if has("skipped") {
        Outcome::Skipped
    } else {
        Outcome::Passed
    };
    RunRecord {
        classname: case.attribute("classname").unwrap_or_default().to_owned(),
        name: case.attribute("name").unwrap_or_default().to_owned(),
        outcome,
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Render `records` as a single-suite JUnit document.
#[must_use]
pub fn render_junit(suite: &str, records: &[RunRecord]) -> String {
    let summary = SuiteSummary::from_records(suite.to_owned(), records);
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuites>\n");
    let _ = writeln!(
        out,
        "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"{}\" skipped=\"{}\">",
        escape(suite),
        summary.tests,
        summary.failures,
        summary.errors,
        summary.skipped
    );
    for r in records {
        let open = format!(
            "    <testcase classname=\"{}\" name=\"{}\"",
            escape(&r.classname),
            escape(&r.name)
        );
        let _ = match r.outcome {
            Outcome::Passed => writeln!(out, "{open}/>"),
            Outcome::Failed => writeln!(out, "{open}><failure message=\"judge rejected response\"/></testcase>"),
            Outcome::Errored => writeln!(out, "{open}><error message=\"agent error\"/></testcase>"),
            Outcome::Skipped => writeln!(out, "{open}><skipped/></testcase>"),
        };
    }
    out.push_str("  </testsuite>\n</testsuites>\n");
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
