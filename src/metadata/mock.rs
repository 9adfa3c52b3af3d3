use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::MetadataStore;
use super::error::MetadataError;
use super::model::{IndexDocument, JobDocument, QueryLogDocument};

/// In-memory [`MetadataStore`] that can be switched to fail every call.
#[derive(Default)]
pub struct MockMetadataStore {
    indexes: Mutex<HashMap<String, IndexDocument>>,
    query_logs: Mutex<Vec<QueryLogDocument>>,
    jobs: Mutex<HashMap<String, JobDocument>>,
    job_writes: AtomicUsize,
    fail: AtomicBool,
    job_hold: Mutex<Option<Arc<Notify>>>,
}

impl MockMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails.
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_fail(true);
        store
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Parks the next `save_job` call until the returned handle is notified.
    pub fn hold_job_writes(&self) -> Arc<Notify> {
        let hold = Arc::new(Notify::new());
        *self.job_hold.lock() = Some(Arc::clone(&hold));
        hold
    }

    /// Every persisted job document.
    pub fn job_documents(&self) -> Vec<JobDocument> {
        self.jobs.lock().values().cloned().collect()
    }

    /// Number of `save_job` calls that succeeded.
    pub fn job_writes(&self) -> usize {
        self.job_writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), MetadataError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MetadataError::Unavailable {
                reason: "mock metadata failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for MockMetadataStore {
    async fn save_index_summary(&self, doc: &IndexDocument) -> Result<(), MetadataError> {
        self.check()?;
        self.indexes.lock().insert(doc.repo_id.clone(), doc.clone());
        Ok(())
    }

    async fn load_index_summary(&self, repo_id: &str) -> Result<Option<IndexDocument>, MetadataError> {
        self.check()?;
        Ok(self.indexes.lock().get(repo_id).cloned())
    }

    async fn append_query_log(&self, doc: &QueryLogDocument) -> Result<(), MetadataError> {
        self.check()?;
        self.query_logs.lock().push(doc.clone());
        Ok(())
    }

    async fn query_logs(&self, repo_id: &str) -> Result<Vec<QueryLogDocument>, MetadataError> {
        self.check()?;
        Ok(self
            .query_logs
            .lock()
            .iter()
            .filter(|d| d.repo_id == repo_id)
            .cloned()
            .collect())
    }

    async fn save_job(&self, doc: &JobDocument) -> Result<(), MetadataError> {
        let hold = self.job_hold.lock().take();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        self.check()?;
        self.jobs.lock().insert(doc.job_id.clone(), doc.clone());
        self.job_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_job(&self, job_id: &str) -> Result<Option<JobDocument>, MetadataError> {
        self.check()?;
        Ok(self.jobs.lock().get(job_id).cloned())
    }
}
