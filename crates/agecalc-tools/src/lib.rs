//! Date-arithmetic capabilities exposed to the age calculator agent.
//!
//! The agent has exactly two tools: [`Capability::GetCurrentDate`] and
//! [`Capability::CalculateDaysBetween`]. Both are deterministic given a
//! [`Clock`], validate their input before computing anything, and never echo
//! caller-supplied values in error messages.
//!
//! [`dispatch`] is the single entry point the agent loop uses to run a tool
//! call decoded from a model turn.

mod date;
mod error;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use date::{
    Clock, FixedClock, MAX_DATE_LEN, MAX_YEAR, MIN_YEAR, SystemClock, calculate_days_between,
    get_current_date, has_iso_shape,
};
pub use error::{DateError, DateField, ToolError};

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// A named capability the agent may invoke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// `get_current_date()`: today's date as `YYYY-MM-DD`.
    GetCurrentDate,
    /// `calculate_days_between(start_date, end_date)`: non-negative day count.
    CalculateDaysBetween,
}

impl Capability {
    /// Every registered capability, in registration order.
    pub const ALL: [Self; 2] = [Self::GetCurrentDate, Self::CalculateDaysBetween];

    /// The tool name the model uses to call this capability.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetCurrentDate => "get_current_date",
            Self::CalculateDaysBetween => "calculate_days_between",
        }
    }

    /// Look up a capability by its tool name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Parameter names, in call order.
    #[must_use]
    pub const fn parameters(self) -> &'static [&'static str] {
        match self {
            Self::GetCurrentDate => &[],
            Self::CalculateDaysBetween => &["start_date", "end_date"],
        }
    }

    /// Tool description shown to the model.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::GetCurrentDate => concat!(
                "Get today's date in YYYY-MM-DD format. Use this tool to retrieve the ",
                "current date when you need to calculate how many days old someone is.",
            ),
            Self::CalculateDaysBetween => concat!(
                "Calculate the number of days between two dates. start_date must be ",
                "earlier than or equal to end_date; both in YYYY-MM-DD format.",
            ),
        }
    }

    /// The model-facing tool declaration.
    #[must_use]
    pub const fn spec(self) -> ToolSpec {
        ToolSpec {
            name: self.name(),
            description: self.description(),
            parameters: self.parameters(),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ToolError::UnknownTool { name: s.to_owned() })
    }
}

/// A tool declaration as presented to the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ToolSpec {
    /// Tool name.
    pub name: &'static str,
    /// What the tool does and when to use it.
    pub description: &'static str,
    /// Parameter names (all string-typed dates).
    pub parameters: &'static [&'static str],
}

/// Declarations for every registered capability.
#[must_use]
pub const fn tool_specs() -> [ToolSpec; 2] {
    [
        Capability::GetCurrentDate.spec(),
        Capability::CalculateDaysBetween.spec(),
    ]
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Run a tool call by name with JSON arguments.
///
/// `get_current_date` ignores its arguments and returns a string;
/// `calculate_days_between` returns an integer.
///
/// # Errors
/// Returns [`ToolError::UnknownTool`] for unregistered names,
/// [`ToolError::MissingArgument`] when a date argument is absent, and
/// [`ToolError::Date`] when the dates are rejected.
pub fn dispatch(name: &str, arguments: &Map<String, Value>, clock: &impl Clock) -> Result<Value, ToolError> {
    match name.parse::<Capability>()? {
        Capability::GetCurrentDate => Ok(Value::String(get_current_date(clock))),
        Capability::CalculateDaysBetween => {
            let start = string_arg(arguments, DateField::Start)?;
            let end = string_arg(arguments, DateField::End)?;
            let days = calculate_days_between(start, end)?;
            Ok(Value::from(days))
        }
    }
}

fn string_arg(arguments: &Map<String, Value>, field: DateField) -> Result<&str, ToolError> {
    let value = arguments.get(field.name()).ok_or(ToolError::MissingArgument {
        argument: field.name(),
    })?;
    value
        .as_str()
        .ok_or(ToolError::Date(DateError::NotAString { field }))
}
