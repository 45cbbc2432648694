//! Single-pass balance check.

use crate::brackets::result::ValidationResult;
use crate::brackets::{CLOSE, OPEN};

/// Decides whether a bracket-only string nests correctly.
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketValidator;

impl BracketValidator {
    pub fn new() -> Self {
        Self
    }

    /// Scan `brackets` left to right keeping a running balance.
    ///
    /// The caller guarantees the input holds only bracket characters; any
    /// other character leaves the balance untouched. A closing bracket with
    /// no unclosed opening bracket before it ends the scan immediately.
    pub fn validate_brackets(&self, brackets: &str) -> ValidationResult {
        let mut balance: i64 = 0;

        for c in brackets.chars() {
            if c == OPEN {
                balance += 1;
            } else if c == CLOSE {
                balance -= 1;
                if balance < 0 {
                    return ValidationResult::invalid(brackets);
                }
            }
        }

        if balance == 0 {
            ValidationResult::valid(brackets)
        } else {
            ValidationResult::invalid(brackets)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stack-based reference for the classical balanced-parentheses property.
    fn reference_balanced(s: &str) -> bool {
        let mut stack = Vec::new();
        for c in s.chars() {
            match c {
                '(' => stack.push(c),
                ')' => {
                    if stack.pop().is_none() {
                        return false;
                    }
                }
                _ => unreachable!(),
            }
        }
        stack.is_empty()
    }

    fn all_strings(len: usize) -> Vec<String> {
        (0..1u32 << len)
            .map(|bits| {
                (0..len)
                    .map(|i| if bits & (1 << i) == 0 { '(' } else { ')' })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_known_cases() {
        let validator = BracketValidator::new();
        assert!(validator.validate_brackets("()").is_valid());
        assert!(validator.validate_brackets("(())").is_valid());
        assert!(validator.validate_brackets("()()(())").is_valid());
        assert!(!validator.validate_brackets(")(").is_valid());
        assert!(!validator.validate_brackets("(()").is_valid());
        assert!(!validator.validate_brackets("())").is_valid());
        assert!(!validator.validate_brackets("(").is_valid());
    }

    #[test]
    fn test_premature_closure_keeps_input() {
        let result = BracketValidator::new().validate_brackets("())(()");
        assert!(!result.is_valid());
        assert_eq!(result.brackets(), "())(()");
    }

    #[test]
    fn test_matches_reference_for_every_short_string() {
        let validator = BracketValidator::new();
        for len in 1..=12 {
            for s in all_strings(len) {
                assert_eq!(
                    validator.validate_brackets(&s).is_valid(),
                    reference_balanced(&s),
                    "mismatch for {s:?}"
                );
            }
        }
    }

    #[test]
    fn test_repeated_validation_is_stable() {
        let validator = BracketValidator::new();
        for s in ["(()())", "(()", ")("] {
            assert_eq!(validator.validate_brackets(s), validator.validate_brackets(s));
        }
    }
}
