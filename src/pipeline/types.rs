use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::DEFAULT_TOP_K;

/// One file to index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub filename: String,
    /// Usually a string; other JSON values are indexed as their JSON text.
    #[serde(default)]
    pub content: Value,
}

impl SourceFile {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: Value::String(content.into()),
        }
    }

    /// File content as text.
    pub fn content_text(&self) -> String {
        value_to_attribute(&self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRequest {
    pub repo_id: String,
    #[serde(default)]
    pub files: Vec<SourceFile>,
    /// Merged into every chunk's attributes.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Exact counts from one indexing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexResult {
    pub repo_id: String,
    pub file_count: usize,
    pub chunk_count: usize,
    /// New chunks whose id already existed in the namespace.
    pub upserts: usize,
    /// Records written back (existing plus new, by id).
    pub merged_total: usize,
    /// Records in the namespace before the merge.
    pub existing_before: usize,
}

fn default_top_k() -> u64 {
    DEFAULT_TOP_K
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub repo_id: String,
    pub prompt: String,
    #[serde(default = "default_top_k", alias = "top_k")]
    pub top_k: u64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub suggestions: Vec<String>,
    pub insights: Vec<String>,
    pub guidance: String,
    pub raw_output: String,
}

/// Renders a JSON value as an attribute string: strings verbatim, null as empty,
/// everything else as JSON text.
pub fn value_to_attribute(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_request_defaults_top_k() {
        let req: QueryRequest =
            serde_json::from_value(json!({"repoId": "r1", "prompt": "why?"})).expect("parse");
        assert_eq!(req.top_k, 6);
        assert!(req.metadata.is_empty());

        let req: QueryRequest =
            serde_json::from_value(json!({"repoId": "r1", "prompt": "why?", "top_k": 5}))
                .expect("parse");
        assert_eq!(req.top_k, 5);
    }

    #[test]
    fn test_non_string_content_stringified() {
        let file: SourceFile =
            serde_json::from_value(json!({"filename": "data.json", "content": {"k": [1, 2]}}))
                .expect("parse");
        assert_eq!(file.content_text(), r#"{"k":[1,2]}"#);

        let file: SourceFile = serde_json::from_value(json!({"filename": "n"})).expect("parse");
        assert_eq!(file.content_text(), "");
    }

    #[test]
    fn test_response_field_names() {
        let value = serde_json::to_value(QueryResponse {
            suggestions: vec![],
            insights: vec![],
            guidance: "g".into(),
            raw_output: "raw".into(),
        })
        .expect("serialize");
        assert_eq!(value["rawOutput"], "raw");

        let value = serde_json::to_value(IndexResult {
            repo_id: "r1".into(),
            file_count: 1,
            chunk_count: 1,
            upserts: 0,
            merged_total: 1,
            existing_before: 0,
        })
        .expect("serialize");
        assert_eq!(value["mergedTotal"], 1);
        assert_eq!(value["existingBefore"], 0);
    }
}
