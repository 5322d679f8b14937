//! Error types for Leakdex.

use thiserror::Error;

/// Core error type for Leakdex operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid field value: {0}")]
    InvalidValue(String),
}

/// Result type alias using Leakdex's Error.
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
