//! Error types raised by repository implementations.

use thiserror::Error;

use crate::types::Sequence;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("checkpoint for session '{session}' references missing snapshot {sequence}")]
    MissingSnapshot { session: String, sequence: Sequence },

    #[error("snapshot {sequence} hash mismatch: expected {expected}, found {actual}")]
    HashMismatch {
        sequence: Sequence,
        expected: String,
        actual: String,
    },
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
