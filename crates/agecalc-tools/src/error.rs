//! Error types for the date capabilities.
//!
//! Messages name the offending argument but never echo its value back. Tool
//! errors are fed to the model verbatim, so reflecting caller-controlled text
//! would open an injection path.

use std::fmt;

use thiserror::Error;

/// Which argument of `calculate_days_between` an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateField {
    /// The earlier date (`start_date`).
    Start,
    /// The later date (`end_date`).
    End,
}

impl DateField {
    /// The parameter name as the model sees it.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start_date",
            Self::End => "end_date",
        }
    }
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validation failures of the date-difference capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// The argument was present but not a JSON string.
    #[error("{field} must be a string.")]
    NotAString {
        /// The offending argument.
        field: DateField,
    },

    /// The argument is longer than any `YYYY-MM-DD` date.
    #[error("{field} exceeds maximum length of {max}.")]
    TooLong {
        /// The offending argument.
        field: DateField,
        /// The maximum accepted length.
        max: usize,
    },

    /// The argument is not a calendar date in `YYYY-MM-DD` form.
    #[error("{field} is not a valid ISO date (YYYY-MM-DD).")]
    NotIsoDate {
        /// The offending argument.
        field: DateField,
    },

    /// The date lies outside the supported window.
    #[error("{field} is outside the allowed range (1900-01-01 to 2100-12-31).")]
    OutOfRange {
        /// The offending argument.
        field: DateField,
    },

    /// `start_date` is strictly after `end_date`.
    #[error("start_date must not be after end_date.")]
    StartAfterEnd,
}

/// Errors from dispatching a tool call by name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// The model asked for a capability that is not registered.
    #[error("unknown tool; use get_current_date or calculate_days_between")]
    UnknownTool {
        /// The requested tool name.
        name: String,
    },

    /// A required argument was not supplied.
    #[error("missing required argument `{argument}`")]
    MissingArgument {
        /// The missing parameter name.
        argument: &'static str,
    },

    /// The date-difference capability rejected its arguments.
    #[error(transparent)]
    Date(#[from] DateError),
}
