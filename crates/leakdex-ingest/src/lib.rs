//! Leakdex Ingest - streaming ingestion of leaked-credential dumps.
//!
//! This crate provides:
//! - Format classification from the upload name
//! - Lazy extractors for delimited, JSON array and line-oriented dumps
//! - Flattening of nested objects into flat records
//! - Document assembly with content fingerprints as idempotency keys
//! - A bounded, concurrent pipeline feeding a pluggable document sink
//! - Streaming download of remote uploads

mod assembler;
mod classify;
mod download;
mod error;
pub mod extractors;
mod flatten;
mod pipeline;
mod sink;

pub use assembler::DocumentAssembler;
pub use classify::classify;
pub use download::{download, source_name_for_url, Download};
pub use error::{IngestError, IngestResult};
pub use extractors::{ExtractOptions, ExtractStats, Extracted, LineKind, RecordExtractor};
pub use flatten::{canonical_json, flatten, flatten_into};
pub use pipeline::{IngestReport, Ingestor, SinkStats};
pub use sink::{DiscardSink, DocumentSink, MemorySink};
