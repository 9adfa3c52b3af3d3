use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::generation::Advice;
use crate::jobs::JobStatus;

/// Per-repository indexing summary, replaced on every successful index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub file_count: usize,
    pub chunk_count: usize,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    pub repo_id: String,
    pub data: IndexSummary,
}

/// One answered query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLog {
    pub prompt: String,
    pub result: Advice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryLogDocument {
    pub repo_id: String,
    pub log: QueryLog,
}

/// Durable mirror of an indexing job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDocument {
    pub job_id: String,
    pub repo_id: String,
    #[serde(default)]
    pub meta: Value,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
