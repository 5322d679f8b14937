//! Core domain types for Leakdex.

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Name of the origin upload, always present on a stored document.
pub const FIELD_LEAK_SOURCE: &str = "leak_source";

/// Denormalized text used for free-text search.
pub const FIELD_FULL_TEXT: &str = "full_text";

/// The untouched trimmed line (line-oriented sources only).
pub const FIELD_RAW_CONTENT: &str = "raw_content";

/// Ingestion date stamp, `YYYY-MM-DD`.
pub const FIELD_UPLOAD_DATE: &str = "upload_date";

/// A scalar field value.
///
/// Serialized untagged, so a document body is a plain JSON object of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl FieldValue {
    /// Borrow the value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::String(s) => f.write_str(s),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n.into())
    }
}

/// Converts a decoded JSON value into a scalar.
///
/// Arrays and objects become their compact JSON text; `null` has no scalar
/// form and is rejected.
impl TryFrom<&serde_json::Value> for FieldValue {
    type Error = Error;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Err(Error::InvalidValue("null".to_string())),
            serde_json::Value::Bool(b) => Ok(FieldValue::Bool(*b)),
            serde_json::Value::Number(n) => Ok(FieldValue::Number(n.clone())),
            serde_json::Value::String(s) => Ok(FieldValue::String(s.clone())),
            other => Ok(FieldValue::String(serde_json::to_string(other)?)),
        }
    }
}

/// A flat mapping from field name to scalar value.
///
/// Keys are kept sorted so that serialization is deterministic. Inserting an
/// existing name replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the value it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.fields.insert(name.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Shortcut for string-valued fields.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.fields.iter()
    }

    /// Copy every field of `other` into this record, overwriting on collision.
    pub fn extend(&mut self, other: Record) {
        self.fields.extend(other.fields);
    }
}

impl IntoIterator for Record {
    type Item = (String, FieldValue);
    type IntoIter = btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = btree_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// A storable document: the assembled record plus its idempotency key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Fingerprint,
    pub fields: Record,
}

impl Document {
    pub fn new(id: Fingerprint, fields: Record) -> Self {
        Self { id, fields }
    }

    /// The origin upload name.
    pub fn leak_source(&self) -> Option<&str> {
        self.fields.get_str(FIELD_LEAK_SOURCE)
    }

    pub fn full_text(&self) -> Option<&str> {
        self.fields.get_str(FIELD_FULL_TEXT)
    }

    /// Serialize the fields as the JSON body sent to storage.
    pub fn body_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.fields)?)
    }
}

/// Parsing strategy for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Header row plus delimited rows.
    Tabular,
    /// A top-level JSON array of objects.
    Structured,
    /// One record candidate per line.
    LineHeuristic,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Tabular => "tabular",
            SourceFormat::Structured => "structured",
            SourceFormat::LineHeuristic => "line_heuristic",
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
