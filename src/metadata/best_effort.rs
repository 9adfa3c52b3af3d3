use std::sync::Arc;

use tracing::warn;

use super::MetadataStore;
use super::model::{IndexDocument, JobDocument, QueryLogDocument};

/// Fire-and-forget view of a [`MetadataStore`].
///
/// Every method returns `()`: failures are logged at `warn` and dropped. Use this for
/// writes whose failure must never change the outcome of the calling operation.
#[derive(Clone)]
pub struct BestEffort {
    store: Arc<dyn MetadataStore>,
}

impl std::fmt::Debug for BestEffort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BestEffort").finish_non_exhaustive()
    }
}

impl BestEffort {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// The wrapped store, for callers that need failures reported.
    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    pub async fn record_index_summary(&self, doc: &IndexDocument) {
        if let Err(e) = self.store.save_index_summary(doc).await {
            warn!(repo_id = %doc.repo_id, error = %e, "failed to persist index summary");
        }
    }

    pub async fn record_query_log(&self, doc: &QueryLogDocument) {
        if let Err(e) = self.store.append_query_log(doc).await {
            warn!(repo_id = %doc.repo_id, error = %e, "failed to persist query log");
        }
    }

    pub async fn record_job(&self, doc: &JobDocument) {
        if let Err(e) = self.store.save_job(doc).await {
            warn!(job_id = %doc.job_id, status = ?doc.status, error = %e, "failed to persist job record");
        }
    }

    /// Reads a job document, treating store errors as absence.
    pub async fn load_job(&self, job_id: &str) -> Option<JobDocument> {
        match self.store.load_job(job_id).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(job_id, error = %e, "failed to read job record");
                None
            }
        }
    }
}
