use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::metadata::JobDocument;
use crate::pipeline::IndexResult;

/// Lifecycle of one background indexing job.
///
/// `Queued -> Running -> Completed | Failed`. Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory status of one job, as returned by the status route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: String,
    pub repo_id: String,
    pub status: JobStatus,
    /// Present once the job completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<IndexResult>,
    /// Present once the job failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn queued(job_id: impl Into<String>, repo_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            repo_id: repo_id.into(),
            status: JobStatus::Queued,
            result: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Durable mirror of this record, carrying the submitted request metadata.
    pub fn to_document(&self, meta: &Value) -> JobDocument {
        JobDocument {
            job_id: self.job_id.clone(),
            repo_id: self.repo_id.clone(),
            meta: meta.clone(),
            status: self.status,
            result: self
                .result
                .as_ref()
                .and_then(|r| serde_json::to_value(r).ok()),
            error: self.error.clone(),
        }
    }
}
