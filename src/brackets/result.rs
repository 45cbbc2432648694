//! Validation outcome.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Only brackets, correctly nested.
    Valid,
    /// Only brackets, but unbalanced or misordered.
    Invalid,
    /// Nothing left after trimming whitespace.
    Empty,
    /// Too long, or contains something other than brackets.
    InvalidFormat,
}

impl ValidationStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Valid => "valid",
            ValidationStatus::Invalid => "invalid",
            ValidationStatus::Empty => "empty",
            ValidationStatus::InvalidFormat => "invalid_format",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of validating a bracket string.
///
/// The status is fixed at construction; there are no setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    brackets: String,
    status: ValidationStatus,
}

impl ValidationResult {
    fn new(brackets: impl Into<String>, status: ValidationStatus) -> Self {
        Self {
            brackets: brackets.into(),
            status,
        }
    }

    pub fn valid(brackets: impl Into<String>) -> Self {
        Self::new(brackets, ValidationStatus::Valid)
    }

    pub fn invalid(brackets: impl Into<String>) -> Self {
        Self::new(brackets, ValidationStatus::Invalid)
    }

    pub fn empty(brackets: impl Into<String>) -> Self {
        Self::new(brackets, ValidationStatus::Empty)
    }

    pub fn invalid_format(brackets: impl Into<String>) -> Self {
        Self::new(brackets, ValidationStatus::InvalidFormat)
    }

    /// The evaluated string, after normalization.
    pub fn brackets(&self) -> &str {
        &self.brackets
    }

    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }

    pub fn is_empty(&self) -> bool {
        self.status == ValidationStatus::Empty
    }

    pub fn is_invalid_format(&self) -> bool {
        self.status == ValidationStatus::InvalidFormat
    }
}
