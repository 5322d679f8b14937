//! Error types for search engine operations.

use thiserror::Error;

/// Errors that can occur when talking to the search engine.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Search engine is not reachable.
    #[error("Search engine is not reachable at {url}")]
    ServerNotRunning { url: String },

    /// Request timeout.
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// API returned an error response.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for search engine operations.
pub type SearchResult<T> = Result<T, SearchError>;
