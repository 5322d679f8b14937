//! Header-plus-rows extractor for delimited files.

use super::{ExtractStats, Extracted, RecordExtractor};
use csv::{ByteRecord, ReaderBuilder};
use leakdex_core::Record;
use std::io::Read;
use tracing::{debug, warn};

/// Yields one record per data row, keyed by the trimmed header names.
///
/// Rows whose width differs from the header are skipped. Cells are decoded
/// lossily, so stray non-UTF-8 bytes never drop a row.
pub struct TabularExtractor<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    row: ByteRecord,
    stats: ExtractStats,
    done: bool,
}

impl<R: Read> TabularExtractor<R> {
    pub fn new(reader: R, delimiter: u8) -> Self {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);

        let (headers, done) = match reader.byte_headers() {
            Ok(headers) => (
                headers
                    .iter()
                    .map(|h| String::from_utf8_lossy(h).trim().to_string())
                    .collect(),
                false,
            ),
            Err(e) => {
                warn!("Failed to read header row: {}", e);
                (Vec::new(), true)
            }
        };

        Self {
            reader,
            headers,
            row: ByteRecord::new(),
            stats: ExtractStats::default(),
            done,
        }
    }

    /// Header names in column order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn build(&self) -> Extracted {
        let mut fields = Record::new();
        let mut values = Vec::with_capacity(self.headers.len());

        for (header, cell) in self.headers.iter().zip(self.row.iter()) {
            let value = String::from_utf8_lossy(cell).into_owned();
            if !header.is_empty() {
                fields.insert(header.as_str(), value.as_str());
            }
            values.push(value);
        }

        let content = values.join(" ");
        Extracted {
            fields,
            full_text: Some(content.clone()),
            content,
            raw_content: None,
        }
    }
}

impl<R: Read> Iterator for TabularExtractor<R> {
    type Item = Extracted;

    fn next(&mut self) -> Option<Extracted> {
        while !self.done {
            match self.reader.read_byte_record(&mut self.row) {
                Ok(true) => return Some(self.build()),
                Ok(false) => self.done = true,
                Err(e) if e.is_io_error() => {
                    warn!("Stopped reading rows: {}", e);
                    self.done = true;
                }
                Err(e) => {
                    self.stats.skipped += 1;
                    debug!("Skipping malformed row: {}", e);
                }
            }
        }
        None
    }
}

impl<R: Read + Send> RecordExtractor for TabularExtractor<R> {
    fn stats(&self) -> ExtractStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn extract(input: &str) -> (Vec<Extracted>, ExtractStats) {
        let mut extractor = TabularExtractor::new(Cursor::new(input.as_bytes().to_vec()), b',');
        let records: Vec<_> = extractor.by_ref().collect();
        (records, extractor.stats())
    }

    #[test]
    fn test_header_zip() {
        let (records, _) = extract("user,pass\nbob,1234\n");

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.fields.get_str("user"), Some("bob"));
        assert_eq!(r.fields.get_str("pass"), Some("1234"));
        assert_eq!(r.full_text.as_deref(), Some("bob 1234"));
        assert_eq!(r.content, "bob 1234");
        assert!(r.raw_content.is_none());
    }

    #[test]
    fn test_header_names_trimmed() {
        let (records, _) = extract(" email , password \na@b.co,pw\n");
        assert_eq!(records[0].fields.get_str("email"), Some("a@b.co"));
        assert_eq!(records[0].fields.get_str("password"), Some("pw"));
    }

    #[test]
    fn test_ragged_rows_are_skipped() {
        let (records, stats) = extract("user,pass\nbob,1234\nbroken\ncarol,abcd,extra\ndave,5678\n");

        let users: Vec<_> = records.iter().filter_map(|r| r.fields.get_str("user")).collect();
        assert_eq!(users, vec!["bob", "dave"]);
        assert_eq!(stats.skipped, 2);
    }

    #[test]
    fn test_quoted_cells_and_blank_header() {
        let (records, _) = extract("name,,note\n\"Doe, John\",x,\"said \"\"hi\"\"\"\n");

        let r = &records[0];
        assert_eq!(r.fields.get_str("name"), Some("Doe, John"));
        assert_eq!(r.fields.get_str("note"), Some("said \"hi\""));
        assert_eq!(r.fields.len(), 2);
        assert_eq!(r.content, "Doe, John x said \"hi\"");
    }

    #[test]
    fn test_non_utf8_cell_is_kept() {
        let mut input = b"user,pass\n".to_vec();
        input.extend_from_slice(b"j\xf6rg,pw\n");
        let mut extractor = TabularExtractor::new(Cursor::new(input), b',');

        let r = extractor.next().unwrap();
        assert_eq!(r.fields.get_str("user"), Some("j\u{FFFD}rg"));
    }

    #[test]
    fn test_custom_delimiter() {
        let mut extractor =
            TabularExtractor::new(Cursor::new(b"user;pass\nbob;1234\n".to_vec()), b';');
        assert_eq!(extractor.headers(), &["user".to_string(), "pass".to_string()]);
        assert_eq!(extractor.next().unwrap().fields.get_str("pass"), Some("1234"));
    }

    #[test]
    fn test_empty_input() {
        let (records, stats) = extract("");
        assert!(records.is_empty());
        assert_eq!(stats, ExtractStats::default());
    }
}
