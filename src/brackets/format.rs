//! Input normalization and format screening.
//!
//! Runs before the balance scan. Every input maps to a result; empty input
//! is an ordinary `Empty` outcome rather than an error.

use crate::brackets::result::ValidationResult;
use crate::brackets::{CLOSE, OPEN};

/// Default upper bound on input length, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 30;

/// Characters stripped from both ends of the input. Unicode spaces such as
/// NBSP are kept and fail the character check.
fn is_trimmable(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B')
}

/// Screens raw input for emptiness, length and allowed characters.
#[derive(Debug, Clone)]
pub struct FormatValidator {
    max_length: usize,
}

impl FormatValidator {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    /// Validate the format of `input`.
    ///
    /// On success the result carries the trimmed string forward for the
    /// balance check.
    pub fn validate_format(&self, input: &str) -> ValidationResult {
        let normalized = input.trim_matches(is_trimmable);

        if normalized.is_empty() {
            return ValidationResult::empty(normalized);
        }

        if normalized.chars().count() > self.max_length {
            return ValidationResult::invalid_format(normalized);
        }

        if !normalized.chars().all(|c| c == OPEN || c == CLOSE) {
            return ValidationResult::invalid_format(normalized);
        }

        ValidationResult::valid(normalized)
    }
}

impl Default for FormatValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LENGTH)
    }
}
