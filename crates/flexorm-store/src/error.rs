use std::sync::PoisonError;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The addressed record, taxonomy, or term does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store refused the write.
    #[error("write rejected: {0}")]
    Rejected(String),

    /// The backend is unavailable or failed internally.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(e: PoisonError<T>) -> Self {
        StoreError::Unavailable(format!("lock poisoned: {e}"))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
