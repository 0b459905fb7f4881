//! Validation error type shared by every desired-state declaration.

use thiserror::Error;

/// Result type alias for declaration validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A malformed desired-state declaration.
///
/// Validation is exhaustive: `problems` lists every offending field found,
/// not just the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {subject}: {}", .problems.join("; "))]
pub struct ValidationError {
    pub subject: String,
    pub problems: Vec<String>,
}

impl ValidationError {
    pub fn new(subject: impl Into<String>, problems: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            problems,
        }
    }

    /// `Ok(())` when no problems were collected, otherwise the error.
    pub fn check(subject: impl Into<String>, problems: Vec<String>) -> ValidationResult<()> {
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Self::new(subject, problems))
        }
    }
}
