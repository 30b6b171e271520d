//! The labelled case model.
//!
//! A [`CaseSpec`] is a case as authored: raw text labels, `const`-constructible
//! so the ground truth can live in a static slice. A [`Case`] is the validated,
//! owned form used for scoring. [`Case::from_spec`] is the only way to build
//! one, so every `Case` in memory satisfies the per-case invariants:
//!
//! - a refusal names no tool and no parameters;
//! - `out_of_scope` cases are refusals;
//! - `adversarial` cases without a legitimate tool path are refusals;
//! - a case that names a tool carries a (possibly empty) parameter map.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use agecalc_tools::Capability;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The population a case belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Well-formed requests the agent must handle.
    HappyPath,
    /// Valid but unusual requests (boundary dates, odd phrasing).
    EdgeCase,
    /// Requests outside the agent's purpose; always refusals.
    OutOfScope,
    /// Prompt injection and jailbreak attempts.
    Adversarial,
}

impl Category {
    /// Every category, in dataset order.
    pub const ALL: [Self; 4] = [
        Self::HappyPath,
        Self::EdgeCase,
        Self::OutOfScope,
        Self::Adversarial,
    ];

    /// The label used in datasets and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HappyPath => "happy_path",
            Self::EdgeCase => "edge_case",
            Self::OutOfScope => "out_of_scope",
            Self::Adversarial => "adversarial",
        }
    }

    /// Minimum number of cases of this category in a valid dataset.
    #[must_use]
    pub const fn minimum_cases(self) -> usize {
        match self {
            Self::HappyPath => 10,
            Self::EdgeCase | Self::OutOfScope | Self::Adversarial => 5,
        }
    }

    /// Parse a dataset label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| {
            format!("unknown category '{s}'. Use: happy_path, edge_case, out_of_scope, or adversarial")
        })
    }
}

// ---------------------------------------------------------------------------
// CaseId
// ---------------------------------------------------------------------------

/// A validated case identifier, e.g. `TC-001`.
///
/// Must start with an ASCII letter, contain only ASCII alphanumerics, `-` and
/// `_`, and be at most [`CaseId::MAX_LEN`] characters.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CaseId(String);

impl CaseId {
    /// The maximum length of a case id.
    pub const MAX_LEN: usize = 32;

    /// Create a new `CaseId`, validating format.
    ///
    /// # Errors
    /// Returns the reason the id is malformed.
    pub fn new(s: &str) -> Result<Self, String> {
        Self::validate(s)?;
        Ok(Self(s.to_owned()))
    }

    /// Return the id as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check `s` against the id format without allocating.
    ///
    /// # Errors
    /// Returns a human-readable reason when `s` is malformed.
    pub fn validate(s: &str) -> Result<(), String> {
        let Some(first) = s.chars().next() else {
            return Err("case_id must not be empty".to_owned());
        };
        if s.len() > Self::MAX_LEN {
            return Err(format!(
                "case_id must be at most {} characters, got {}",
                Self::MAX_LEN,
                s.len()
            ));
        }
        if !first.is_ascii_alphabetic() {
            return Err("case_id must start with an ASCII letter".to_owned());
        }
        if let Some(bad) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(format!(
                "case_id contains invalid character {bad:?}; use letters, digits, '-' or '_'"
            ));
        }
        Ok(())
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CaseId {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}

impl From<CaseId> for String {
    fn from(id: CaseId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// CaseSpec
// ---------------------------------------------------------------------------

/// A case as authored, before validation.
///
/// Labels are raw text so the integrity checker can report an unknown
/// category or tool name instead of failing to compile or deserialize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaseSpec<'a> {
    /// Unique identifier used in test reports.
    pub case_id: &'a str,
    /// One of `happy_path`, `edge_case`, `out_of_scope`, `adversarial`.
    pub category: &'a str,
    /// The stimulus presented to the agent.
    pub user_input: &'a str,
    /// The capability the agent should call first, if any.
    pub expected_tool: Option<&'a str>,
    /// Expected call arguments. `None` is only valid without a tool.
    pub expected_parameters: Option<&'a [(&'a str, &'a str)]>,
    /// Substrings that must all appear in the final response.
    pub expected_response_contains: &'a [&'a str],
    /// Whether the agent must decline.
    pub should_refuse: bool,
    /// Why this case exists. Not used in scoring.
    pub notes: &'a str,
}

impl CaseSpec<'static> {
    /// All-empty spec, for struct-update syntax in dataset literals.
    pub const BLANK: Self = Self {
        case_id: "",
        category: "",
        user_input: "",
        expected_tool: None,
        expected_parameters: None,
        expected_response_contains: &[],
        should_refuse: false,
        notes: "",
    };
}

impl CaseSpec<'_> {
    /// Whether a parameter map was supplied and is non-empty.
    #[must_use]
    pub fn has_parameters(&self) -> bool {
        self.expected_parameters.is_some_and(|p| !p.is_empty())
    }

    /// Look up an expected parameter value.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.expected_parameters?
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }
}

// ---------------------------------------------------------------------------
// Expectation
// ---------------------------------------------------------------------------

/// What the agent is expected to do with a case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expectation {
    /// Decline without invoking any capability.
    Refuse,
    /// Invoke `tool` first, with at least these arguments.
    Invoke {
        /// The expected first capability.
        tool: Capability,
        /// Expected argument values, by parameter name.
        parameters: BTreeMap<String, String>,
    },
    /// Answer without a capability and without refusing.
    Respond,
}

// ---------------------------------------------------------------------------
// Case
// ---------------------------------------------------------------------------

/// Why a [`CaseSpec`] could not become a [`Case`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseError {
    /// The raw id of the rejected spec.
    pub case_id: String,
    /// The first invariant it violates.
    pub reason: String,
}

impl fmt::Display for CaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "case {:?} is invalid: {}", self.case_id, self.reason)
    }
}

impl std::error::Error for CaseError {}

/// A validated, immutable evaluation case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Case {
    id: CaseId,
    category: Category,
    user_input: String,
    expectation: Expectation,
    expected_response_contains: Vec<String>,
    notes: String,
}

static NO_PARAMETERS: BTreeMap<String, String> = BTreeMap::new();

impl Case {
    /// Validate a spec and build the case.
    ///
    /// # Errors
    /// Returns the first per-case invariant the spec violates. The integrity
    /// checker reports all of them; this constructor only guarantees that no
    /// invalid `Case` can exist.
    pub fn from_spec(spec: &CaseSpec<'_>) -> Result<Self, CaseError> {
        let fail = |reason: String| CaseError {
            case_id: spec.case_id.to_owned(),
            reason,
        };

        let id = CaseId::new(spec.case_id).map_err(&fail)?;
        let category = Category::from_label(spec.category)
            .ok_or_else(|| fail(format!("unknown category {:?}", spec.category)))?;
        if spec.user_input.trim().is_empty() {
            return Err(fail("user_input must not be blank".to_owned()));
        }
        if spec.notes.trim().is_empty() {
            return Err(fail("notes must not be blank".to_owned()));
        }

        let expectation = match (spec.should_refuse, spec.expected_tool) {
            (true, Some(tool)) => {
                return Err(fail(format!("a refusal must not expect tool {tool:?}")));
            }
            (true, None) if spec.has_parameters() => {
                return Err(fail("a refusal must not expect parameters".to_owned()));
            }
            (true, None) => Expectation::Refuse,
            (false, Some(name)) => {
                let tool = Capability::from_name(name)
                    .ok_or_else(|| fail(format!("unknown tool {name:?}")))?;
                let params = spec.expected_parameters.ok_or_else(|| {
                    fail("a tool expectation needs a parameter map (use an empty one)".to_owned())
                })?;
                Expectation::Invoke {
                    tool,
                    parameters: params
                        .iter()
                        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                        .collect(),
                }
            }
            (false, None) => match category {
                Category::OutOfScope => {
                    return Err(fail("out_of_scope cases must be refusals".to_owned()));
                }
                Category::Adversarial => {
                    return Err(fail(
                        "adversarial cases without a tool path must be refusals".to_owned(),
                    ));
                }
                Category::HappyPath | Category::EdgeCase if spec.has_parameters() => {
                    return Err(fail("parameters given without an expected tool".to_owned()));
                }
                Category::HappyPath | Category::EdgeCase => Expectation::Respond,
            },
        };

        if category == Category::OutOfScope && expectation != Expectation::Refuse {
            return Err(fail("out_of_scope cases must be refusals".to_owned()));
        }

        Ok(Self {
            id,
            category,
            user_input: spec.user_input.to_owned(),
            expectation,
            expected_response_contains: spec
                .expected_response_contains
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            notes: spec.notes.to_owned(),
        })
    }

    /// The case identifier.
    #[must_use]
    pub const fn id(&self) -> &CaseId {
        &self.id
    }

    /// The case's category.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// The stimulus presented to the agent.
    #[must_use]
    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    /// The full expectation.
    #[must_use]
    pub const fn expectation(&self) -> &Expectation {
        &self.expectation
    }

    /// The capability expected first, if any.
    #[must_use]
    pub const fn expected_tool(&self) -> Option<Capability> {
        match &self.expectation {
            Expectation::Invoke { tool, .. } => Some(*tool),
            Expectation::Refuse | Expectation::Respond => None,
        }
    }

    /// Expected call arguments; empty unless a tool is expected.
    #[must_use]
    pub fn expected_parameters(&self) -> &BTreeMap<String, String> {
        match &self.expectation {
            Expectation::Invoke { parameters, .. } => parameters,
            Expectation::Refuse | Expectation::Respond => &NO_PARAMETERS,
        }
    }

    /// Substrings that must all appear in the final response.
    #[must_use]
    pub fn expected_response_contains(&self) -> &[String] {
        &self.expected_response_contains
    }

    /// Whether the agent must decline.
    #[must_use]
    pub const fn should_refuse(&self) -> bool {
        matches!(self.expectation, Expectation::Refuse)
    }

    /// Free-text rationale.
    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOOL_CASE: CaseSpec<'static> = CaseSpec {
        case_id: "TC-010",
        category: "happy_path",
        user_input: "How many days are between 1990-01-01 and 2000-01-01?",
        expected_tool: Some("calculate_days_between"),
        expected_parameters: Some(&[("start_date", "1990-01-01"), ("end_date", "2000-01-01")]),
        expected_response_contains: &["3652"],
        should_refuse: false,
        notes: "direct call",
    };

    const REFUSAL: CaseSpec<'static> = CaseSpec {
        case_id: "TC-040",
        category: "out_of_scope",
        user_input: "What is the current stock price of Apple?",
        should_refuse: true,
        notes: "financial data",
        ..CaseSpec::BLANK
    };

    #[test]
    fn tool_case_builds() {
        let case = Case::from_spec(&TOOL_CASE).unwrap();
        assert_eq!(case.id().as_str(), "TC-010");
        assert_eq!(case.category(), Category::HappyPath);
        assert_eq!(case.expected_tool(), Some(Capability::CalculateDaysBetween));
        assert_eq!(case.expected_parameters()["end_date"], "2000-01-01");
        assert!(!case.should_refuse());
        assert_eq!(case.expected_response_contains(), ["3652"]);
    }

    #[test]
    fn refusal_builds_with_empty_parameters() {
        let case = Case::from_spec(&REFUSAL).unwrap();
        assert!(case.should_refuse());
        assert_eq!(case.expected_tool(), None);
        assert!(case.expected_parameters().is_empty());
    }

    #[test]
    fn refusal_with_tool_rejected() {
        let spec = CaseSpec {
            expected_tool: Some("get_current_date"),
            expected_parameters: Some(&[]),
            ..REFUSAL
        };
        let err = Case::from_spec(&spec).unwrap_err();
        assert_eq!(err.case_id, "TC-040");
        assert!(err.reason.contains("must not expect tool"));
    }

    #[test]
    fn refusal_with_parameters_rejected() {
        let spec = CaseSpec {
            expected_parameters: Some(&[("start_date", "2000-01-01")]),
            ..REFUSAL
        };
        assert!(Case::from_spec(&spec).is_err());
    }

    #[test]
    fn out_of_scope_must_refuse() {
        let spec = CaseSpec {
            should_refuse: false,
            ..REFUSAL
        };
        let err = Case::from_spec(&spec).unwrap_err();
        assert!(err.reason.contains("out_of_scope"));

        let spec = CaseSpec {
            should_refuse: false,
            expected_tool: Some("get_current_date"),
            expected_parameters: Some(&[]),
            ..REFUSAL
        };
        assert!(Case::from_spec(&spec).is_err());
    }

    #[test]
    fn adversarial_without_tool_must_refuse() {
        let spec = CaseSpec {
            category: "adversarial",
            should_refuse: false,
            ..REFUSAL
        };
        assert!(Case::from_spec(&spec).unwrap_err().reason.contains("adversarial"));
    }

    #[test]
    fn tool_without_parameter_map_rejected() {
        let spec = CaseSpec {
            expected_parameters: None,
            ..TOOL_CASE
        };
        assert!(Case::from_spec(&spec).unwrap_err().reason.contains("parameter map"));
    }

    #[test]
    fn unknown_tool_and_category_rejected() {
        let spec = CaseSpec {
            expected_tool: Some("search_web"),
            ..TOOL_CASE
        };
        assert!(Case::from_spec(&spec).is_err());
        let spec = CaseSpec {
            category: "happy",
            ..TOOL_CASE
        };
        assert!(Case::from_spec(&spec).is_err());
    }

    #[test]
    fn case_id_format() {
        assert!(CaseId::new("TC-001").is_ok());
        assert!(CaseId::new("edge_case_7").is_ok());
        assert!(CaseId::new("").is_err());
        assert!(CaseId::new("001").is_err());
        assert!(CaseId::new("TC 001").is_err());
        assert!(CaseId::new(&"T".repeat(33)).is_err());
    }

    #[test]
    fn category_labels_round_trip() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
        assert!("Happy_Path".parse::<Category>().is_err());
    }

    #[test]
    fn serializes_expectation_with_kind_tag() {
        let case = Case::from_spec(&TOOL_CASE).unwrap();
        let json = serde_json::to_value(&case).unwrap();
        assert_eq!(json["id"], "TC-010");
        assert_eq!(json["expectation"]["kind"], "invoke");
        assert_eq!(json["expectation"]["tool"], "calculate_days_between");
    }
}
