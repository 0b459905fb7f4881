//! Store access errors.

use cqlsync_core::ValidationError;
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The shell could not be started at all.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The shell ran and reported failure.
    #[error("bad return code {}: {}", .status.map_or_else(|| "(killed)".to_string(), |c| c.to_string()), .stderr.trim())]
    Connection { status: Option<i32>, stderr: String },

    /// The shell succeeded but its output did not contain the expected fact.
    #[error("unexpected cqlsh output: {0}")]
    Parse(String),

    /// A name or type was refused before being interpolated into a statement.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl StoreError {
    /// The bare failure text, without the wrapping added by `Display`.
    ///
    /// For a failed call this is the trimmed stderr, so identical failures
    /// across attempts compare equal.
    pub fn reason(&self) -> String {
        match self {
            StoreError::Connection { stderr, .. } if !stderr.trim().is_empty() => {
                stderr.trim().to_string()
            }
            StoreError::Spawn { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection { .. } | StoreError::Spawn { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_display_includes_status() {
        let err = StoreError::Connection {
            status: Some(1),
            stderr: "Connection refused\n".to_string(),
        };
        assert_eq!(err.to_string(), "bad return code 1: Connection refused");
        assert_eq!(err.reason(), "Connection refused");
    }

    #[test]
    fn reason_falls_back_to_display_without_stderr() {
        let err = StoreError::Connection {
            status: None,
            stderr: String::new(),
        };
        assert_eq!(err.reason(), "bad return code (killed): ");
    }

    #[test]
    fn spawn_is_a_connection_failure() {
        let err = StoreError::Spawn {
            program: "cqlsh".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.is_connection());
        assert_eq!(err.reason(), "not found");
    }
}
