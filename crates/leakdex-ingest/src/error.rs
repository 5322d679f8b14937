//! Error types for the ingestion pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can occur during ingestion.
///
/// Malformed rows, lines and array elements never surface here; extractors
/// skip them and count them instead.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] leakdex_config::ConfigError),

    #[error("Search engine error: {0}")]
    Search(#[from] leakdex_search::SearchError),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Download of {url} failed: {message}")]
    Download { url: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Ingestion task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
