//! Turns extracted fields into storable documents.

use crate::extractors::Extracted;
use chrono::Utc;
use leakdex_config::IngestConfig;
use leakdex_core::{
    fingerprint, Document, Record, FIELD_FULL_TEXT, FIELD_LEAK_SOURCE, FIELD_RAW_CONTENT,
    FIELD_UPLOAD_DATE,
};

/// Adds the reserved fields and the idempotency key to extracted records.
///
/// Reserved fields are written last, so they replace any extracted field of
/// the same name.
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
    upload_date: Option<String>,
}

impl DocumentAssembler {
    /// Create an assembler, optionally stamping today's date (UTC).
    pub fn new(stamp_upload_date: bool) -> Self {
        let upload_date = stamp_upload_date.then(|| Utc::now().format("%Y-%m-%d").to_string());
        Self { upload_date }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.stamp_upload_date)
    }

    /// Use a fixed date stamp.
    pub fn with_upload_date(mut self, date: impl Into<String>) -> Self {
        self.upload_date = Some(date.into());
        self
    }

    pub fn assemble(&self, extracted: Extracted, source: &str) -> Document {
        let Extracted {
            mut fields,
            content,
            full_text,
            raw_content,
        } = extracted;

        let full_text = full_text.unwrap_or_else(|| synthesize_full_text(&fields, &content));

        fields.insert(FIELD_LEAK_SOURCE, source);
        if let Some(raw) = raw_content {
            fields.insert(FIELD_RAW_CONTENT, raw);
        }
        fields.insert(FIELD_FULL_TEXT, full_text);
        if let Some(date) = &self.upload_date {
            fields.insert(FIELD_UPLOAD_DATE, date.as_str());
        }

        Document::new(fingerprint(&content, source), fields)
    }
}

fn synthesize_full_text(fields: &Record, content: &str) -> String {
    let text = fields
        .iter()
        .filter_map(|(_, value)| value.as_str())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        content.to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leakdex_core::FieldValue;

    fn extracted(fields: Record, content: &str) -> Extracted {
        Extracted {
            fields,
            content: content.to_string(),
            full_text: None,
            raw_content: None,
        }
    }

    #[test]
    fn test_reserved_fields_and_id() {
        let assembler = DocumentAssembler::new(false);
        let doc = assembler.assemble(
            Extracted {
                fields: Record::new().with("user", "bob").with("pass", "1234"),
                content: "bob 1234".to_string(),
                full_text: Some("bob 1234".to_string()),
                raw_content: None,
            },
            "dump.csv",
        );

        assert_eq!(doc.id, fingerprint("bob 1234", "dump.csv"));
        assert_eq!(doc.leak_source(), Some("dump.csv"));
        assert_eq!(doc.full_text(), Some("bob 1234"));
        assert!(!doc.fields.contains(FIELD_RAW_CONTENT));
        assert!(!doc.fields.contains(FIELD_UPLOAD_DATE));
    }

    #[test]
    fn test_reserved_fields_override_extracted() {
        let assembler = DocumentAssembler::new(false);
        let doc = assembler.assemble(
            Extracted {
                fields: Record::new().with(FIELD_LEAK_SOURCE, "spoofed"),
                content: "line".to_string(),
                full_text: Some("line".to_string()),
                raw_content: Some("line".to_string()),
            },
            "real.txt",
        );

        assert_eq!(doc.leak_source(), Some("real.txt"));
        assert_eq!(doc.fields.get_str(FIELD_RAW_CONTENT), Some("line"));
    }

    #[test]
    fn test_full_text_synthesized_from_strings() {
        let assembler = DocumentAssembler::new(false);
        let fields = Record::new()
            .with("a", "alpha")
            .with("b", 7i64)
            .with("c", "gamma");

        let doc = assembler.assemble(extracted(fields, "{}"), "s");
        assert_eq!(doc.full_text(), Some("alpha gamma"));

        let doc = assembler.assemble(extracted(Record::new().with("n", 1i64), "raw"), "s");
        assert_eq!(doc.full_text(), Some("raw"));
    }

    #[test]
    fn test_upload_date_stamp() {
        let doc = DocumentAssembler::new(false)
            .with_upload_date("2024-01-31")
            .assemble(extracted(Record::new(), "x"), "s");
        assert_eq!(doc.fields.get_str(FIELD_UPLOAD_DATE), Some("2024-01-31"));

        let doc = DocumentAssembler::new(true).assemble(extracted(Record::new(), "x"), "s");
        let date = doc.fields.get_str(FIELD_UPLOAD_DATE).unwrap();
        assert_eq!(date.len(), 10);
        assert_eq!(&date[4..5], "-");
    }

    #[test]
    fn test_same_content_different_source() {
        let assembler = DocumentAssembler::default();
        let a = assembler.assemble(extracted(Record::new(), "same"), "one.txt");
        let b = assembler.assemble(extracted(Record::new(), "same"), "two.txt");
        assert_ne!(a.id, b.id);
        assert!(matches!(a.fields.get(FIELD_LEAK_SOURCE), Some(FieldValue::String(_))));
    }
}
