//! Durable documents: index summaries, query logs, job records.
//!
//! The hot path only writes through [`BestEffort`], so a slow or broken store never
//! fails an index or query.

use async_trait::async_trait;

mod best_effort;
mod error;
/// JSON-file store.
pub mod file;
#[cfg(any(test, feature = "mock"))]
mod mock;
/// Document types.
pub mod model;

#[cfg(test)]
mod tests;

pub use best_effort::BestEffort;
pub use error::MetadataError;
pub use file::FileMetadataStore;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockMetadataStore;
pub use model::{IndexDocument, IndexSummary, JobDocument, QueryLog, QueryLogDocument};

/// Document store for service metadata.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Inserts or replaces the summary for `doc.repo_id`.
    async fn save_index_summary(&self, doc: &IndexDocument) -> Result<(), MetadataError>;

    async fn load_index_summary(&self, repo_id: &str) -> Result<Option<IndexDocument>, MetadataError>;

    /// Appends a query log entry.
    async fn append_query_log(&self, doc: &QueryLogDocument) -> Result<(), MetadataError>;

    /// Query logs for `repo_id`, oldest first.
    async fn query_logs(&self, repo_id: &str) -> Result<Vec<QueryLogDocument>, MetadataError>;

    /// Inserts or replaces the job document for `doc.job_id`.
    async fn save_job(&self, doc: &JobDocument) -> Result<(), MetadataError>;

    async fn load_job(&self, job_id: &str) -> Result<Option<JobDocument>, MetadataError>;
}
