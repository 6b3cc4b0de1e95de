use thiserror::Error;

use crate::generation::GenerationError;
use crate::ids::DialogId;

/// Errors from repository operations (used by trait definitions in oilan-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by dialog operations.
///
/// `NotFound` and `Forbidden` are kept distinct so callers can apply their
/// own disclosure policy.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("dialog {0} not found")]
    NotFound(DialogId),

    #[error("dialog {0} belongs to another user")]
    Forbidden(DialogId),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

impl ChatError {
    /// Machine-readable code for API error bodies and logs.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::NotFound(_) => "DIALOG_NOT_FOUND",
            ChatError::Forbidden(_) => "FORBIDDEN",
            ChatError::Validation(_) => "VALIDATION_ERROR",
            ChatError::Generation(_) => "GENERATION_FAILED",
            ChatError::Storage(_) => "STORAGE_ERROR",
        }
    }
}
