//! Leakdex Search - HTTP client for the document-search engine.
//!
//! The ingestion pipeline only needs one write primitive from the engine:
//! store a document under a caller-chosen id, replacing any previous
//! version. This crate provides that, plus an availability probe.

mod client;
mod error;
mod types;

pub use client::SearchClient;
pub use error::{SearchError, SearchResult};
pub use types::*;
