//! Error types for model operations.

use flexorm_store::StoreError;
use flexorm_types::{RecordId, TypeError};
use thiserror::Error;

/// Errors that can occur while resolving, reading, writing, or persisting
/// model attributes.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A dispatched operation name does not start with a known action.
    #[error("unrecognized operation: {0}")]
    UnrecognizedOperation(String),

    /// The attribute is neither declared on the model nor a native field.
    #[error("unknown attribute {attribute} on model {model}")]
    UnknownAttribute { model: String, attribute: String },

    /// The record store has no record with this identity.
    #[error("record not found: {0}")]
    NotFound(RecordId),

    /// A store rejected a write during `persist()`.
    #[error("persistence failed ({context}): {source}")]
    Persistence {
        context: String,
        #[source]
        source: StoreError,
    },

    /// A store failed outside of persistence.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A value could not be applied to a native field.
    #[error("type error: {0}")]
    Type(#[from] TypeError),

    /// A write operation was dispatched without a value.
    #[error("operation {operation} requires an argument")]
    MissingArgument { operation: String },

    /// The model schema declaration is invalid.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Writing rendered output failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    pub(crate) fn persistence(context: impl Into<String>, source: StoreError) -> Self {
        ModelError::Persistence {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for model operations.
pub type ModelResult<T> = std::result::Result<T, ModelError>;
