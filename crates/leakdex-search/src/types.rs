//! Types for search engine API responses.

use serde::{Deserialize, Serialize};

/// Version block of the root endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterVersion {
    pub number: String,
}

/// Response from `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cluster_name: String,
    pub version: ClusterVersion,
}

/// Outcome reported for a single document write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteResult {
    Created,
    Updated,
    Noop,
    #[serde(other)]
    Unknown,
}

/// Response from `PUT /{index}/_doc/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version", default)]
    pub version: u64,
    pub result: WriteResult,
}

/// Error body returned by the engine on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ErrorDetail {
    Structured {
        #[serde(rename = "type")]
        kind: String,
        reason: Option<String>,
    },
    Plain(String),
}

impl ErrorDetail {
    pub(crate) fn describe(&self) -> String {
        match self {
            ErrorDetail::Structured { kind, reason: Some(reason) } => format!("{}: {}", kind, reason),
            ErrorDetail::Structured { kind, reason: None } => kind.clone(),
            ErrorDetail::Plain(s) => s.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_response_parse() {
        let body = r#"{"_index":"breach_data","_id":"abc","_version":2,"result":"updated","_shards":{"total":1}}"#;
        let resp: IndexResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.id, "abc");
        assert_eq!(resp.version, 2);
        assert_eq!(resp.result, WriteResult::Updated);
    }

    #[test]
    fn test_unknown_write_result() {
        let body = r#"{"_index":"i","_id":"x","result":"not_found"}"#;
        let resp: IndexResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.result, WriteResult::Unknown);
    }

    #[test]
    fn test_error_body_describe() {
        let body = r#"{"error":{"type":"mapper_parsing_exception","reason":"failed to parse field [age]"},"status":400}"#;
        let err: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            err.error.describe(),
            "mapper_parsing_exception: failed to parse field [age]"
        );

        let plain: ErrorResponse = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert_eq!(plain.error.describe(), "boom");
    }
}
