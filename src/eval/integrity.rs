//! Dataset integrity checker.
//!
//! Runs a fixed battery of independent structural checks over authored
//! [`CaseSpec`]s and collects every violation, one per offending case, so a
//! dataset author sees all problems in a single run. No score computed over a
//! dataset is meaningful unless [`check`] comes back clean.
//!
//! The checker is pure: the same specs always produce the same violations in
//! the same order.

use std::collections::BTreeMap;
use std::fmt;

use agecalc_tools::{Capability, calculate_days_between, has_iso_shape};
use serde::Serialize;
use tracing::instrument;

use super::case::{CaseError, CaseId, CaseSpec, Category};

/// Minimum number of cases in a dataset.
pub const MIN_CASES: usize = 40;

/// Minimum number of refusal cases needed to measure refusal accuracy.
pub const MIN_REFUSAL_CASES: usize = 10;

/// Minimum number of tool-selection cases needed to measure tool selection.
pub const MIN_TOOL_CASES: usize = 10;

/// Words that mark a happy-path input as being about dates.
pub const TEMPORAL_KEYWORDS: [&str; 7] = ["born", "birthdate", "birthday", "dob", "date", "today", "days"];

// ---------------------------------------------------------------------------
// CheckId
// ---------------------------------------------------------------------------

/// One check in the integrity battery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    DatasetSize,
    UniqueCaseIds,
    CaseIdFormat,
    TextFields,
    CategoriesPresent,
    CategoryValues,
    CategoryMinimums,
    RefusalFields,
    OutOfScopeRefuses,
    AdversarialRefuses,
    ToolParameters,
    KnownTools,
    DateParameterFormat,
    ParameterKeys,
    ResponseFragments,
    ExpectedDayCounts,
    Coverage,
    HappyPathTemporal,
    /// A `CaseSpec` passed every check but the case constructor still rejected it.
    CaseConstruction,
}

impl CheckId {
    /// The battery, in execution order.
    pub const ALL: [Self; 18] = [
        Self::DatasetSize,
        Self::UniqueCaseIds,
        Self::CaseIdFormat,
        Self::TextFields,
        Self::CategoriesPresent,
        Self::CategoryValues,
        Self::CategoryMinimums,
        Self::RefusalFields,
        Self::OutOfScopeRefuses,
        Self::AdversarialRefuses,
        Self::ToolParameters,
        Self::KnownTools,
        Self::DateParameterFormat,
        Self::ParameterKeys,
        Self::ResponseFragments,
        Self::ExpectedDayCounts,
        Self::Coverage,
        Self::HappyPathTemporal,
    ];

    /// Stable check name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DatasetSize => "dataset_size",
            Self::UniqueCaseIds => "unique_case_ids",
            Self::CaseIdFormat => "case_id_format",
            Self::TextFields => "text_fields",
            Self::CategoriesPresent => "categories_present",
            Self::CategoryValues => "category_values",
            Self::CategoryMinimums => "category_minimums",
            Self::RefusalFields => "refusal_fields",
            Self::OutOfScopeRefuses => "out_of_scope_refuses",
            Self::AdversarialRefuses => "adversarial_refuses",
            Self::ToolParameters => "tool_parameters",
            Self::KnownTools => "known_tools",
            Self::DateParameterFormat => "date_parameter_format",
            Self::ParameterKeys => "parameter_keys",
            Self::ResponseFragments => "response_fragments",
            Self::ExpectedDayCounts => "expected_day_counts",
            Self::Coverage => "coverage",
            Self::HappyPathTemporal => "happy_path_temporal",
            Self::CaseConstruction => "case_construction",
        }
    }

    /// Guidance shown with every violation of this check.
    #[must_use]
    pub const fn fix(self) -> &'static str {
        match self {
            Self::DatasetSize => "add cases until the dataset has at least 40.",
            Self::UniqueCaseIds => "give each case its own case_id (e.g. the next free TC-NNN).",
            Self::CaseIdFormat => {
                "use an id like TC-001: a letter first, then letters, digits, '-' or '_'."
            }
            Self::TextFields => "fill in user_input and notes with non-blank text.",
            Self::CategoriesPresent | Self::CategoryMinimums => {
                "add cases to the under-represented category."
            }
            Self::CategoryValues => {
                "use one of: happy_path, edge_case, out_of_scope, adversarial."
            }
            Self::RefusalFields => {
                "a refusal must leave expected_tool unset and expected_parameters empty."
            }
            Self::OutOfScopeRefuses => "set should_refuse = true for out_of_scope cases.",
            Self::AdversarialRefuses => {
                "set should_refuse = true, or name the legitimate tool the agent may call."
            }
            Self::ToolParameters => {
                "pair expected_parameters with an expected_tool (use an empty map for get_current_date)."
            }
            Self::KnownTools => "use get_current_date or calculate_days_between.",
            Self::DateParameterFormat => "write dates as YYYY-MM-DD.",
            Self::ParameterKeys => {
                "get_current_date takes no parameters; calculate_days_between takes start_date and end_date."
            }
            Self::ResponseFragments => {
                "use the exact day count (e.g. \"3652\") as the expected fragment."
            }
            Self::ExpectedDayCounts => {
                "recompute the expected day count with calculate_days_between and update the case."
            }
            Self::Coverage => "add cases so every scored population is represented.",
            Self::HappyPathTemporal => {
                "happy-path inputs must mention a date or a word like born, birthday, today or days."
            }
            Self::CaseConstruction => "correct the case so it satisfies the case invariants.",
        }
    }

    fn run(self, specs: &[CaseSpec<'_>]) -> Vec<Violation> {
        match self {
            Self::DatasetSize => dataset_size(specs),
            Self::UniqueCaseIds => unique_case_ids(specs),
            Self::CaseIdFormat => case_id_format(specs),
            Self::TextFields => text_fields(specs),
            Self::CategoriesPresent => categories_present(specs),
            Self::CategoryValues => category_values(specs),
            Self::CategoryMinimums => category_minimums(specs),
            Self::RefusalFields => refusal_fields(specs),
            Self::OutOfScopeRefuses => out_of_scope_refuses(specs),
            Self::AdversarialRefuses => adversarial_refuses(specs),
            Self::ToolParameters => tool_parameters(specs),
            Self::KnownTools => known_tools(specs),
            Self::DateParameterFormat => date_parameter_format(specs),
            Self::ParameterKeys => parameter_keys(specs),
            Self::ResponseFragments => response_fragments(specs),
            Self::ExpectedDayCounts => expected_day_counts(specs),
            Self::Coverage => coverage(specs),
            Self::HappyPathTemporal => happy_path_temporal(specs),
            Self::CaseConstruction => Vec::new(),
        }
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Violation / IntegrityReport
// ---------------------------------------------------------------------------

/// A single integrity failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// The check that failed.
    pub check: CheckId,
    /// Offending case ids; empty for dataset-wide failures. A blank id is
    /// reported by position, e.g. `<case #3>`.
    pub case_ids: Vec<String>,
    /// What is wrong.
    pub message: String,
}

impl Violation {
    fn dataset(check: CheckId, message: String) -> Self {
        Self {
            check,
            case_ids: Vec::new(),
            message,
        }
    }

    fn case(check: CheckId, index: usize, spec: &CaseSpec<'_>, message: String) -> Self {
        Self {
            check,
            case_ids: vec![case_label(index, spec)],
            message,
        }
    }
}

impl From<CaseError> for Violation {
    fn from(err: CaseError) -> Self {
        Self {
            check: CheckId::CaseConstruction,
            case_ids: vec![err.case_id],
            message: err.reason,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.check)?;
        if !self.case_ids.is_empty() {
            write!(f, "{}: ", self.case_ids.join(", "))?;
        }
        write!(f, "{}\n  To fix: {}", self.message, self.check.fix())
    }
}

/// Every violation found in one run of the battery.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    violations: Vec<Violation>,
}

impl IntegrityReport {
    /// Whether every check passed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// All violations, in check order then dataset order.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Violations raised by one check.
    pub fn for_check(&self, check: CheckId) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.check == check)
    }
}

impl From<Vec<Violation>> for IntegrityReport {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "dataset integrity: all {} checks passed", CheckId::ALL.len());
        }
        write!(
            f,
            "dataset integrity: {} violation(s)",
            self.violations.len()
        )?;
        for v in &self.violations {
            write!(f, "\n- {v}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run the full battery over `specs`.
#[instrument(skip_all, fields(cases = specs.len()))]
pub fn check(specs: &[CaseSpec<'_>]) -> IntegrityReport {
    let violations: Vec<Violation> = CheckId::ALL
        .into_iter()
        .flat_map(|check| check.run(specs))
        .collect();
    tracing::debug!(violations = violations.len(), "integrity battery complete");
    IntegrityReport { violations }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

fn case_label(index: usize, spec: &CaseSpec<'_>) -> String {
    if spec.case_id.trim().is_empty() {
        format!("<case #{}>", index + 1)
    } else {
        spec.case_id.to_owned()
    }
}

fn category_of(spec: &CaseSpec<'_>) -> Option<Category> {
    Category::from_label(spec.category)
}

fn tool_of(spec: &CaseSpec<'_>) -> Option<Capability> {
    spec.expected_tool.and_then(Capability::from_name)
}

fn is_tool_selection(spec: &CaseSpec<'_>) -> bool {
    spec.expected_tool.is_some() && !spec.should_refuse
}

/// Apply `f` to every spec, collecting one optional violation per case.
fn per_case(
    specs: &[CaseSpec<'_>],
    check: CheckId,
    mut f: impl FnMut(&CaseSpec<'_>) -> Option<String>,
) -> Vec<Violation> {
    specs
        .iter()
        .enumerate()
        .filter_map(|(i, spec)| f(spec).map(|msg| Violation::case(check, i, spec, msg)))
        .collect()
}

fn dataset_size(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    if specs.len() >= MIN_CASES {
        return Vec::new();
    }
    vec![Violation::dataset(
        CheckId::DatasetSize,
        format!("dataset has {} case(s); minimum is {MIN_CASES}", specs.len()),
    )]
}

fn unique_case_ids(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    let mut positions: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, spec) in specs.iter().enumerate() {
        if !spec.case_id.trim().is_empty() {
            positions.entry(spec.case_id).or_default().push(i + 1);
        }
    }
    positions
        .into_iter()
        .filter(|(_, at)| at.len() > 1)
        .map(|(id, at)| {
            let at: Vec<String> = at.iter().map(ToString::to_string).collect();
            Violation {
                check: CheckId::UniqueCaseIds,
                case_ids: vec![id.to_owned()],
                message: format!(
                    "case_id is used {} times (cases #{})",
                    at.len(),
                    at.join(", #")
                ),
            }
        })
        .collect()
}

fn case_id_format(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    per_case(specs, CheckId::CaseIdFormat, |spec| {
        CaseId::validate(spec.case_id).err()
    })
}

fn text_fields(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    let mut out = per_case(specs, CheckId::TextFields, |spec| {
        spec.user_input
            .trim()
            .is_empty()
            .then(|| "user_input is blank".to_owned())
    });
    out.extend(per_case(specs, CheckId::TextFields, |spec| {
        spec.notes
            .trim()
            .is_empty()
            .then(|| "notes is blank".to_owned())
    }));
    out
}

fn categories_present(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    Category::ALL
        .into_iter()
        .filter(|c| !specs.iter().any(|s| category_of(s) == Some(*c)))
        .map(|c| Violation::dataset(CheckId::CategoriesPresent, format!("no {c} cases")))
        .collect()
}

fn category_values(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    per_case(specs, CheckId::CategoryValues, |spec| {
        category_of(spec)
            .is_none()
            .then(|| format!("unknown category {:?}", spec.category))
    })
}

fn category_minimums(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    Category::ALL
        .into_iter()
        .filter_map(|c| {
            let count = specs.iter().filter(|s| category_of(s) == Some(c)).count();
            (count < c.minimum_cases()).then(|| {
                Violation::dataset(
                    CheckId::CategoryMinimums,
                    format!("{count} {c} case(s); minimum is {}", c.minimum_cases()),
                )
            })
        })
        .collect()
}

fn refusal_fields(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    let mut out = per_case(specs, CheckId::RefusalFields, |spec| {
        match (spec.should_refuse, spec.expected_tool) {
            (true, Some(tool)) => Some(format!(
                "should_refuse is set but expected_tool is {tool:?}"
            )),
            _ => None,
        }
    });
    out.extend(per_case(specs, CheckId::RefusalFields, |spec| {
        (spec.should_refuse && spec.has_parameters())
            .then(|| "should_refuse is set but expected_parameters is not empty".to_owned())
    }));
    out
}

fn out_of_scope_refuses(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    per_case(specs, CheckId::OutOfScopeRefuses, |spec| {
        (category_of(spec) == Some(Category::OutOfScope) && !spec.should_refuse)
            .then(|| "out_of_scope case is not marked should_refuse".to_owned())
    })
}

fn adversarial_refuses(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    per_case(specs, CheckId::AdversarialRefuses, |spec| {
        (category_of(spec) == Some(Category::Adversarial)
            && spec.expected_tool.is_none()
            && !spec.should_refuse)
            .then(|| "adversarial case has no expected_tool and is not a refusal".to_owned())
    })
}

fn tool_parameters(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    per_case(specs, CheckId::ToolParameters, |spec| {
        match (spec.expected_tool, spec.expected_parameters) {
            (Some(_), None) => {
                Some("expected_tool is set but expected_parameters is missing".to_owned())
            }
            // Refusals carrying parameters belong to refusal_fields.
            (None, Some(_)) if spec.has_parameters() && !spec.should_refuse => {
                Some("expected_parameters is set but expected_tool is missing".to_owned())
            }
            _ => None,
        }
    })
}

fn known_tools(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    per_case(specs, CheckId::KnownTools, |spec| {
        spec.expected_tool
            .filter(|name| Capability::from_name(name).is_none())
            .map(|name| format!("expected_tool {name:?} is not a known capability"))
    })
}

fn date_parameter_format(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    let mut out = Vec::new();
    for (i, spec) in specs.iter().enumerate() {
        if tool_of(spec) != Some(Capability::CalculateDaysBetween) {
            continue;
        }
        for key in Capability::CalculateDaysBetween.parameters() {
            if let Some(value) = spec.parameter(key).filter(|v| !has_iso_shape(v)) {
                out.push(Violation::case(
                    CheckId::DateParameterFormat,
                    i,
                    spec,
                    format!("expected_parameters[{key:?}] = {value:?} is not YYYY-MM-DD"),
                ));
            }
        }
    }
    out
}

fn parameter_keys(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    let mut out = Vec::new();
    for (i, spec) in specs.iter().enumerate() {
        let (Some(tool), Some(params)) = (tool_of(spec), spec.expected_parameters) else {
            continue;
        };
        for (key, _) in params {
            if !tool.parameters().contains(key) {
                out.push(Violation::case(
                    CheckId::ParameterKeys,
                    i,
                    spec,
                    format!("{tool} has no parameter {key:?}"),
                ));
            }
        }
    }
    out
}

fn response_fragments(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    let mut out = Vec::new();
    for (i, spec) in specs.iter().enumerate() {
        if tool_of(spec) != Some(Capability::CalculateDaysBetween) {
            continue;
        }
        for fragment in spec.expected_response_contains {
            if fragment.is_empty() || !fragment.bytes().all(|b| b.is_ascii_digit()) {
                out.push(Violation::case(
                    CheckId::ResponseFragments,
                    i,
                    spec,
                    format!("expected fragment {fragment:?} is not a plain day count"),
                ));
            }
        }
    }
    out
}

fn expected_day_counts(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    let mut out = Vec::new();
    for (i, spec) in specs.iter().enumerate() {
        if tool_of(spec) != Some(Capability::CalculateDaysBetween) {
            continue;
        }
        let (Some(start), Some(end)) = (spec.parameter("start_date"), spec.parameter("end_date"))
        else {
            continue;
        };
        let actual = match calculate_days_between(start, end) {
            Ok(days) => days,
            Err(err) => {
                out.push(Violation::case(
                    CheckId::ExpectedDayCounts,
                    i,
                    spec,
                    format!("calculate_days_between rejects the expected parameters: {err}"),
                ));
                continue;
            }
        };
        for fragment in spec.expected_response_contains {
            let Ok(expected) = fragment.parse::<i64>() else {
                continue;
            };
            if i64::try_from(actual).ok() != Some(expected) {
                out.push(Violation::case(
                    CheckId::ExpectedDayCounts,
                    i,
                    spec,
                    format!(
                        "expects {expected} days but calculate_days_between({start}, {end}) returns {actual}"
                    ),
                ));
            }
        }
    }
    out
}

fn coverage(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    let mut out = Vec::new();

    let refusals = specs.iter().filter(|s| s.should_refuse).count();
    if refusals < MIN_REFUSAL_CASES {
        out.push(Violation::dataset(
            CheckId::Coverage,
            format!("{refusals} refusal case(s); refusal_accuracy needs at least {MIN_REFUSAL_CASES}"),
        ));
    }

    let tool_cases: Vec<&CaseSpec<'_>> = specs.iter().filter(|s| is_tool_selection(s)).collect();
    if tool_cases.len() < MIN_TOOL_CASES {
        out.push(Violation::dataset(
            CheckId::Coverage,
            format!(
                "{} tool-selection case(s); tool_selection needs at least {MIN_TOOL_CASES}",
                tool_cases.len()
            ),
        ));
    }

    for cap in Capability::ALL {
        if !tool_cases.iter().any(|s| tool_of(s) == Some(cap)) {
            out.push(Violation::dataset(
                CheckId::Coverage,
                format!("no tool-selection case expects {cap}"),
            ));
        }
    }

    if !tool_cases.is_empty() {
        let current_date = tool_cases
            .iter()
            .filter(|s| tool_of(s) == Some(Capability::GetCurrentDate))
            .count();
        // Integer form of `current_date / total >= 0.5`.
        if current_date * 2 < tool_cases.len() {
            out.push(Violation::dataset(
                CheckId::Coverage,
                format!(
                    "get_current_date is the first tool in only {current_date} of {} tool-selection cases; it should be the majority",
                    tool_cases.len()
                ),
            ));
        }
    }

    let mixed_intent = specs.iter().any(|s| {
        category_of(s) == Some(Category::Adversarial) && !s.should_refuse && s.expected_tool.is_some()
    });
    if !mixed_intent {
        out.push(Violation::dataset(
            CheckId::Coverage,
            "no mixed-intent adversarial case (adversarial, not a refusal, with an expected tool)"
                .to_owned(),
        ));
    }

    out
}

fn happy_path_temporal(specs: &[CaseSpec<'_>]) -> Vec<Violation> {
    per_case(specs, CheckId::HappyPathTemporal, |spec| {
        if category_of(spec) != Some(Category::HappyPath) {
            return None;
        }
        let lower = spec.user_input.to_lowercase();
        let temporal = contains_iso_date(spec.user_input)
            || TEMPORAL_KEYWORDS.iter().any(|kw| lower.contains(kw));
        (!temporal).then(|| "happy_path input has no date or temporal keyword".to_owned())
    })
}

fn contains_iso_date(text: &str) -> bool {
    text.as_bytes()
        .windows(agecalc_tools::MAX_DATE_LEN)
        .any(|w| std::str::from_utf8(w).is_ok_and(has_iso_shape))
}
