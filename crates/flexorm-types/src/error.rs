use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid record id: {0}")]
    InvalidRecordId(String),

    #[error("unknown native field: {0}")]
    UnknownField(String),

    #[error("native field {field} expects {expected}, got {actual}")]
    FieldType {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },
}
