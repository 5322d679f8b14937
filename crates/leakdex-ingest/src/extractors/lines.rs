//! Line-oriented extraction for combo lists, text dumps and JSON lines.

use super::{ExtractOptions, ExtractStats, Extracted, RecordExtractor};
use crate::flatten::flatten;
use leakdex_config::FlattenPolicy;
use leakdex_core::Record;
use serde_json::Value;
use std::io::{self, BufRead};
use tracing::{debug, warn};

/// Secret lengths that look like hex digests (MD5, SHA-1).
const HASH_LENGTHS: [usize; 2] = [32, 40];

/// Secrets longer than this are treated as hashes too.
const LONG_HASH_MIN: usize = 50;

/// What a single line turned out to be. The first matching rule wins, in
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// A complete JSON object on one line, already flattened.
    Json(Record),
    /// `identity:secret`
    ColonPair { identity: String, password: String },
    /// `identity|secret`, only when the line has no colon.
    PipePair { identity: String, password: String },
    /// Contains an `INSERT INTO` statement.
    SqlStatement,
    /// Nothing recognizable; the line is kept as raw text only.
    Fallback,
}

impl LineKind {
    /// Classify a trimmed line.
    pub fn classify(line: &str, policy: FlattenPolicy) -> Self {
        if line.starts_with('{') && line.ends_with('}') {
            if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(line) {
                return LineKind::Json(flatten(&object, policy));
            }
        }

        if let Some((identity, password)) = line.split_once(':') {
            return LineKind::ColonPair {
                identity: identity.trim().to_string(),
                password: password.trim().to_string(),
            };
        }

        if let Some((identity, password)) = line.split_once('|') {
            return LineKind::PipePair {
                identity: identity.trim().to_string(),
                password: password.trim().to_string(),
            };
        }

        if line.to_ascii_uppercase().contains("INSERT INTO") {
            return LineKind::SqlStatement;
        }

        LineKind::Fallback
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            LineKind::Json(_) => "json",
            LineKind::ColonPair { .. } => "colon_pair",
            LineKind::PipePair { .. } => "pipe_pair",
            LineKind::SqlStatement => "sql_statement",
            LineKind::Fallback => "fallback",
        }
    }

    /// The fields this kind contributes to the record.
    pub fn into_fields(self) -> Record {
        match self {
            LineKind::Json(record) => record,
            LineKind::ColonPair { identity, password } => {
                let mut record = Record::new();
                if identity.contains('@') && identity.contains('.') {
                    record.insert("email", identity.as_str());
                } else {
                    record.insert("username", identity.as_str());
                }
                if looks_like_hash(&password) {
                    record.insert("password_hash", password.as_str());
                }
                record.insert("identity", identity);
                record.insert("password", password);
                record
            }
            LineKind::PipePair { identity, password } => Record::new()
                .with("identity", identity)
                .with("password", password),
            LineKind::SqlStatement => Record::new().with("data_type", "sql_query"),
            LineKind::Fallback => Record::new(),
        }
    }
}

/// Lengths are in bytes, not characters.
fn looks_like_hash(secret: &str) -> bool {
    let len = secret.len();
    HASH_LENGTHS.contains(&len) || len > LONG_HASH_MIN
}

enum LineRead {
    Line,
    TooLong,
    Eof,
}

/// Read one `\n`-terminated line into `buf`, holding at most `max` bytes.
///
/// A longer line is consumed up to its terminator and reported as
/// [`LineRead::TooLong`] without being kept.
fn read_bounded_line<R: BufRead>(
    reader: &mut R,
    max: usize,
    buf: &mut Vec<u8>,
) -> io::Result<LineRead> {
    buf.clear();
    let mut seen = false;
    let mut too_long = false;

    loop {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            break;
        }
        seen = true;

        let (chunk, used, complete) = match available.iter().position(|&b| b == b'\n') {
            Some(end) => (&available[..end], end + 1, true),
            None => (available, available.len(), false),
        };

        if !too_long {
            if buf.len() + chunk.len() > max {
                too_long = true;
                buf.clear();
            } else {
                buf.extend_from_slice(chunk);
            }
        }

        reader.consume(used);
        if complete {
            break;
        }
    }

    if !seen {
        return Ok(LineRead::Eof);
    }
    if too_long {
        return Ok(LineRead::TooLong);
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(LineRead::Line)
}

/// Yields one record per retained line.
pub struct LineExtractor<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
    max_line_bytes: usize,
    min_line_chars: usize,
    policy: FlattenPolicy,
    line_no: u64,
    stats: ExtractStats,
    done: bool,
}

impl<R: BufRead> LineExtractor<R> {
    pub fn new(reader: R, options: &ExtractOptions) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            max_line_bytes: options.max_line_bytes,
            min_line_chars: options.min_line_chars,
            policy: options.flatten,
            line_no: 0,
            stats: ExtractStats::default(),
            done: false,
        }
    }
}

fn extract_line(line: &str, policy: FlattenPolicy) -> Extracted {
    let kind = LineKind::classify(line, policy);
    debug!("Line classified as {}", kind.label());

    Extracted {
        fields: kind.into_fields(),
        content: line.to_string(),
        full_text: Some(line.to_string()),
        raw_content: Some(line.to_string()),
    }
}

impl<R: BufRead> Iterator for LineExtractor<R> {
    type Item = Extracted;

    fn next(&mut self) -> Option<Extracted> {
        while !self.done {
            match read_bounded_line(&mut self.reader, self.max_line_bytes, &mut self.buf) {
                Ok(LineRead::Eof) => self.done = true,
                Ok(LineRead::TooLong) => {
                    self.line_no += 1;
                    self.stats.skipped += 1;
                    warn!(
                        "Line {} exceeds {} bytes, skipped",
                        self.line_no, self.max_line_bytes
                    );
                }
                Ok(LineRead::Line) => {
                    self.line_no += 1;
                    let text = String::from_utf8_lossy(&self.buf);
                    let line = text.trim();
                    if line.chars().count() < self.min_line_chars {
                        self.stats.filtered += 1;
                        continue;
                    }
                    return Some(extract_line(line, self.policy));
                }
                Err(e) => {
                    warn!("Stopped reading lines after line {}: {}", self.line_no, e);
                    self.done = true;
                }
            }
        }
        None
    }
}

impl<R: BufRead + Send> RecordExtractor for LineExtractor<R> {
    fn stats(&self) -> ExtractStats {
        self.stats
    }
}
