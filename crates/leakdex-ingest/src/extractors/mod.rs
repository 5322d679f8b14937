//! Record extractors for the three upload shapes.
//!
//! Every extractor is a lazy, single-pass iterator over one byte stream and
//! yields one [`Extracted`] per record unit (row, array element or line).
//! Units that cannot be read are skipped and counted; they never end the
//! stream early unless the stream itself can no longer be followed.

mod lines;
mod structured;
mod tabular;

pub use lines::{LineExtractor, LineKind};
pub use structured::StructuredExtractor;
pub use tabular::TabularExtractor;

use crate::error::IngestResult;
use leakdex_config::{FlattenPolicy, IngestConfig};
use leakdex_core::{Record, SourceFormat};
use std::io::BufRead;

/// Fields pulled out of one record unit, before assembly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    /// Extracted fields (already flattened).
    pub fields: Record,
    /// Fingerprint input.
    pub content: String,
    /// Searchable text, when the extractor has a natural one.
    pub full_text: Option<String>,
    /// The original line, for line-oriented sources.
    pub raw_content: Option<String>,
}

/// Per-stream counters kept by an extractor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Units dropped because they could not be read or decoded.
    pub skipped: usize,
    /// Units dropped by the noise filter.
    pub filtered: usize,
}

/// Options shared by the extractors.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub max_line_bytes: usize,
    pub min_line_chars: usize,
    pub csv_delimiter: u8,
    pub flatten: FlattenPolicy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_line_bytes: 10 * 1024 * 1024,
            min_line_chars: 5,
            csv_delimiter: b',',
            flatten: FlattenPolicy::Merge,
        }
    }
}

impl ExtractOptions {
    /// Build options from the ingest section of the configuration.
    pub fn from_config(config: &IngestConfig) -> IngestResult<Self> {
        config.validate()?;

        Ok(Self {
            max_line_bytes: config.max_line_bytes,
            min_line_chars: config.min_line_chars,
            csv_delimiter: config.csv_delimiter as u8,
            flatten: config.flatten,
        })
    }
}

/// A stream of extracted records.
pub trait RecordExtractor: Iterator<Item = Extracted> + Send {
    /// Counters for the units consumed so far.
    fn stats(&self) -> ExtractStats;
}

/// Open the extractor matching `format` over `reader`.
pub fn open<R>(format: SourceFormat, reader: R, options: &ExtractOptions) -> Box<dyn RecordExtractor>
where
    R: BufRead + Send + 'static,
{
    match format {
        SourceFormat::Tabular => Box::new(TabularExtractor::new(reader, options.csv_delimiter)),
        SourceFormat::Structured => Box::new(StructuredExtractor::new(reader, options.flatten)),
        SourceFormat::LineHeuristic => Box::new(LineExtractor::new(reader, options)),
    }
}
