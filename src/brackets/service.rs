//! Format-then-balance orchestration.

use crate::brackets::balance::BracketValidator;
use crate::brackets::format::FormatValidator;
use crate::brackets::result::ValidationResult;
use crate::config::ValidationConfig;

/// Runs the format check and, when it passes, the balance check.
#[derive(Debug, Clone, Default)]
pub struct ValidationService {
    format: FormatValidator,
    brackets: BracketValidator,
}

impl ValidationService {
    pub fn new(format: FormatValidator, brackets: BracketValidator) -> Self {
        Self { format, brackets }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(FormatValidator::new(config.max_length), BracketValidator::new())
    }

    /// Validate a raw, untrimmed string.
    ///
    /// Statistics are the caller's concern; this has no side effects.
    pub fn validate_string(&self, raw: &str) -> ValidationResult {
        let format_result = self.format.validate_format(raw);
        if !format_result.is_valid() {
            return format_result;
        }

        self.brackets.validate_brackets(format_result.brackets())
    }
}
