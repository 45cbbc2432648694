//! Bracket sequence validation.
//!
//! # Data Flow
//! ```text
//! raw input
//!     → format.rs (trim, emptiness, length bound, charset)
//!     → balance.rs (single-pass balance scan)
//!     → ValidationResult (result.rs)
//! ```
//!
//! service.rs sequences the two checks; a failed format check
//! short-circuits and the balance scan never runs.

pub mod balance;
pub mod format;
pub mod result;
pub mod service;

pub use balance::BracketValidator;
pub use format::FormatValidator;
pub use result::{ValidationResult, ValidationStatus};
pub use service::ValidationService;

/// Opening bracket.
pub const OPEN: char = '(';

/// Closing bracket.
pub const CLOSE: char = ')';
