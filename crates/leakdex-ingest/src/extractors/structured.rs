//! Incremental reader for a top-level JSON array of objects.
//!
//! The array is never held in memory as a whole: each element is decoded on
//! its own and released once it has been yielded.

use super::{ExtractStats, Extracted, RecordExtractor};
use crate::flatten::{canonical_json, flatten};
use leakdex_config::FlattenPolicy;
use serde::Deserialize;
use serde_json::Value;
use std::io::{self, BufRead};
use tracing::{debug, warn};

const BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    InArray,
    Done,
}

/// Yields one record per object element of a top-level array.
///
/// Input that does not open with `[` yields nothing. Elements that are not
/// objects are skipped. A syntax error ends the stream, since the position of
/// the next element can no longer be trusted.
pub struct StructuredExtractor<R: BufRead> {
    reader: R,
    policy: FlattenPolicy,
    state: State,
    stats: ExtractStats,
}

impl<R: BufRead> StructuredExtractor<R> {
    pub fn new(reader: R, policy: FlattenPolicy) -> Self {
        Self {
            reader,
            policy,
            state: State::Start,
            stats: ExtractStats::default(),
        }
    }

    /// Skip whitespace and return the next byte without consuming it.
    fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        loop {
            let buf = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if buf.is_empty() {
                return Ok(None);
            }

            let blank = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
            if blank < buf.len() {
                let byte = buf[blank];
                self.reader.consume(blank);
                return Ok(Some(byte));
            }
            self.reader.consume(blank);
        }
    }

    fn skip_bom(&mut self) -> io::Result<()> {
        let buf = self.reader.fill_buf()?;
        if buf.starts_with(BOM) {
            self.reader.consume(BOM.len());
        }
        Ok(())
    }

    fn open_array(&mut self) -> io::Result<bool> {
        self.skip_bom()?;
        match self.peek_byte()? {
            Some(b'[') => {
                self.reader.consume(1);
                Ok(true)
            }
            Some(other) => {
                warn!(
                    "Structured input does not start with an array (found {:?}), nothing to ingest",
                    other as char
                );
                Ok(false)
            }
            None => Ok(false),
        }
    }

    fn decode_element(&mut self) -> Option<Value> {
        let mut de = serde_json::Deserializer::from_reader(&mut self.reader);
        match Value::deserialize(&mut de) {
            Ok(value) => Some(value),
            Err(e) if e.is_eof() => {
                warn!("Structured input ended inside an element");
                self.stats.skipped += 1;
                self.state = State::Done;
                None
            }
            Err(e) if e.is_io() => {
                warn!("Stopped reading structured input: {}", e);
                self.state = State::Done;
                None
            }
            Err(e) => {
                warn!("Malformed element at line {} column {}: {}", e.line(), e.column(), e);
                self.stats.skipped += 1;
                self.state = State::Done;
                None
            }
        }
    }

    fn next_value(&mut self) -> Option<Value> {
        loop {
            match self.state {
                State::Done => return None,
                State::Start => {
                    self.state = match self.open_array() {
                        Ok(true) => State::InArray,
                        Ok(false) => State::Done,
                        Err(e) => {
                            warn!("Failed to read structured input: {}", e);
                            State::Done
                        }
                    };
                }
                State::InArray => match self.peek_byte() {
                    Ok(Some(b',')) => self.reader.consume(1),
                    Ok(Some(b']')) => {
                        self.reader.consume(1);
                        self.state = State::Done;
                    }
                    // A bare number may swallow the closing bracket.
                    Ok(None) => self.state = State::Done,
                    Ok(Some(_)) => return self.decode_element(),
                    Err(e) => {
                        warn!("Failed to read structured input: {}", e);
                        self.state = State::Done;
                    }
                },
            }
        }
    }
}

impl<R: BufRead> Iterator for StructuredExtractor<R> {
    type Item = Extracted;

    fn next(&mut self) -> Option<Extracted> {
        while let Some(value) = self.next_value() {
            match &value {
                Value::Object(object) => {
                    let content = canonical_json(&value);
                    return Some(Extracted {
                        fields: flatten(object, self.policy),
                        full_text: Some(content.clone()),
                        content,
                        raw_content: None,
                    });
                }
                other => {
                    debug!("Skipping non-object array element: {}", other);
                    self.stats.skipped += 1;
                }
            }
        }
        None
    }
}

impl<R: BufRead + Send> RecordExtractor for StructuredExtractor<R> {
    fn stats(&self) -> ExtractStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leakdex_core::FieldValue;
    use std::io::Cursor;

    fn extract(input: &str) -> (Vec<Extracted>, ExtractStats) {
        let mut extractor =
            StructuredExtractor::new(Cursor::new(input.as_bytes().to_vec()), FlattenPolicy::Merge);
        let records: Vec<_> = extractor.by_ref().collect();
        (records, extractor.stats())
    }

    #[test]
    fn test_nested_elements_are_flattened() {
        let (records, _) = extract(
            r#"[
                {"user": "bob", "contact": {"email": "bob@x.io", "phone": {"cc": "62"}}},
                {"user": "eve"}
            ]"#,
        );

        assert_eq!(records.len(), 2);
        let bob = &records[0].fields;
        assert_eq!(bob.get_str("user"), Some("bob"));
        assert_eq!(bob.get_str("email"), Some("bob@x.io"));
        assert_eq!(bob.get_str("cc"), Some("62"));
        assert!(!bob.contains("contact"));
        assert_eq!(records[1].fields.get_str("user"), Some("eve"));
    }

    #[test]
    fn test_content_is_key_order_independent() {
        let (a, _) = extract(r#"[{"b": 1, "a": {"y": 2, "x": 3}}]"#);
        let (b, _) = extract(r#"[{"a": {"x": 3, "y": 2}, "b": 1}]"#);

        assert_eq!(a[0].content, b[0].content);
        assert_eq!(a[0].content, r#"{"a":{"x":3,"y":2},"b":1}"#);
        assert_eq!(a[0].full_text.as_deref(), Some(a[0].content.as_str()));
        assert!(a[0].raw_content.is_none());
    }

    #[test]
    fn test_non_array_input_yields_nothing() {
        let (records, stats) = extract(r#"{"user": "bob"}"#);
        assert!(records.is_empty());
        assert_eq!(stats.skipped, 0);
    }

    #[test]
    fn test_non_object_elements_are_skipped() {
        let (records, stats) = extract(r#"[1, {"a": 1}, "x", true, {"b": 2.5}, null]"#);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fields.get("a"), Some(&FieldValue::from(1i64)));
        assert_eq!(records[1].fields.get("b").map(|v| v.to_string()), Some("2.5".to_string()));
        assert_eq!(stats.skipped, 4);
    }

    #[test]
    fn test_trailing_number_element() {
        let (records, stats) = extract(r#"[{"a": 1}, 42]"#);
        assert_eq!(records.len(), 1);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_empty_array_and_empty_input() {
        let (records, _) = extract("  [ ]  ");
        assert!(records.is_empty());

        let (records, _) = extract("");
        assert!(records.is_empty());
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let (records, _) = extract("\u{FEFF}[{\"a\": \"b\"}]");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_truncated_input_keeps_earlier_elements() {
        let (records, stats) = extract(r#"[{"a": 1}, {"b": "#);
        assert_eq!(records.len(), 1);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_syntax_error_ends_stream() {
        let (records, stats) = extract(r#"[{"a": 1}, {"b" 2}, {"c": 3}]"#);
        assert_eq!(records.len(), 1);
        assert_eq!(stats.skipped, 1);
    }
}
