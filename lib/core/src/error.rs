use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field {field} is {actual}, expected {expected}")]
    FieldKindMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store request timed out after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
