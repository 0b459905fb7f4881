//! Reconciliation error types.

use cqlsync_core::ValidationError;
use cqlsync_store::StoreError;
use thiserror::Error;

use crate::outcome::ErrorKind;

/// Errors that abort a single reconciler run.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The declaration was rejected before any store call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A store read or write failed. Passed through untouched.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;

impl ReconcileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::Validation(_) => ErrorKind::Validation,
            ReconcileError::Store(StoreError::Invalid(_)) => ErrorKind::Validation,
            ReconcileError::Store(StoreError::Parse(_)) => ErrorKind::Parse,
            ReconcileError::Store(StoreError::Connection { .. } | StoreError::Spawn { .. }) => {
                ErrorKind::Connection
            }
        }
    }

    /// One message per problem. Validation errors list every offending field.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ReconcileError::Validation(e) | ReconcileError::Store(StoreError::Invalid(e)) => {
                e.problems.clone()
            }
            other => vec![other.to_string()],
        }
    }
}
