use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::error::JobError;
use super::types::{JobRecord, JobStatus};
use crate::constants::WORKER_STOP_TIMEOUT_SECS;
use crate::metadata::BestEffort;
use crate::pipeline::{IndexRequest, IndexResult, RagPipeline};

enum QueueMessage {
    Job(QueuedJob),
    /// One per worker; the receiving worker exits.
    Shutdown,
}

struct QueuedJob {
    job_id: String,
    request: IndexRequest,
}

type JobTable = Arc<RwLock<HashMap<String, JobRecord>>>;

/// FIFO of background indexing jobs served by a fixed pool of workers.
///
/// Records live in memory for the life of the process. Every transition that
/// the durable mirror tracks (queued, completed, failed) is also written through
/// [`BestEffort`], so a broken metadata store never affects job execution.
pub struct IndexJobQueue {
    pipeline: Arc<RagPipeline>,
    metadata: BestEffort,
    records: JobTable,
    sender: flume::Sender<QueueMessage>,
    receiver: flume::Receiver<QueueMessage>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
    /// Whether new jobs are accepted. Held while enqueueing so a job can never
    /// land behind the shutdown sentinels.
    accepting: Mutex<bool>,
    stop_timeout: Duration,
}

impl std::fmt::Debug for IndexJobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexJobQueue")
            .field("jobs", &self.records.read().len())
            .field("pending", &self.receiver.len())
            .field("workers", &self.workers.lock().len())
            .finish_non_exhaustive()
    }
}

impl IndexJobQueue {
    pub fn new(pipeline: Arc<RagPipeline>) -> Self {
        let (sender, receiver) = flume::unbounded();
        let metadata = pipeline.metadata().clone();
        Self {
            pipeline,
            metadata,
            records: Arc::new(RwLock::new(HashMap::new())),
            sender,
            receiver,
            workers: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
            accepting: Mutex::new(true),
            stop_timeout: Duration::from_secs(WORKER_STOP_TIMEOUT_SECS),
        }
    }

    /// Overrides how long [`stop`](Self::stop) waits for each worker.
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Records a queued job, persists it, enqueues it and returns its id.
    ///
    /// Does not wait for execution. Jobs submitted before [`start`](Self::start)
    /// wait in the queue.
    pub async fn submit(&self, request: IndexRequest) -> Result<String, JobError> {
        if !*self.accepting.lock() {
            return Err(JobError::ShutDown);
        }
        if request.repo_id.trim().is_empty() {
            return Err(JobError::InvalidRequest("repoId is required".to_string()));
        }

        let job_id = Uuid::new_v4().to_string();
        let record = JobRecord::queued(&job_id, &request.repo_id);
        let meta = Value::Object(request.metadata.clone());

        self.records.write().insert(job_id.clone(), record.clone());

        // Persisted before enqueueing so a fast worker's terminal write cannot be
        // overwritten by this one.
        self.metadata.record_job(&record.to_document(&meta)).await;

        let message = QueueMessage::Job(QueuedJob {
            job_id: job_id.clone(),
            request,
        });
        let enqueued = {
            let accepting = self.accepting.lock();
            if *accepting {
                self.sender.send(message).is_ok()
            } else {
                false
            }
        };

        if !enqueued {
            // stop() ran while the queued document was being written.
            let error = JobError::ShutDown;
            let failed = self.fail_unqueued(&job_id, error.to_string());
            if let Some(failed) = failed {
                self.metadata.record_job(&failed.to_document(&meta)).await;
            }
            warn!(job_id = %job_id, "index job rejected: queue stopped during submit");
            return Err(error);
        }

        info!(job_id = %job_id, repo_id = %record.repo_id, "index job queued");
        Ok(job_id)
    }

    fn fail_unqueued(&self, job_id: &str, error: String) -> Option<JobRecord> {
        let mut records = self.records.write();
        let record = records.get_mut(job_id)?;
        record.status = JobStatus::Failed;
        record.error = Some(error);
        Some(record.clone())
    }

    pub fn get_status(&self, job_id: &str) -> Option<JobRecord> {
        self.records.read().get(job_id).cloned()
    }

    /// Jobs waiting to be picked up by a worker.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// Launches `worker_count` workers sharing the queue. Zero is raised to one.
    pub fn start(&self, worker_count: usize) -> Result<(), JobError> {
        if !*self.accepting.lock() {
            return Err(JobError::ShutDown);
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(JobError::AlreadyStarted);
        }

        let worker_count = worker_count.max(1);
        let mut workers = self.workers.lock();
        for worker_id in 0..worker_count {
            let worker = Worker {
                id: worker_id,
                receiver: self.receiver.clone(),
                pipeline: Arc::clone(&self.pipeline),
                metadata: self.metadata.clone(),
                records: Arc::clone(&self.records),
            };
            workers.push(tokio::spawn(worker.run()));
        }
        info!(workers = worker_count, "index workers started");
        Ok(())
    }

    /// Stops accepting jobs and shuts the workers down.
    ///
    /// One shutdown sentinel is enqueued per worker behind any pending jobs, so
    /// queued work is drained and an in-flight job finishes. Each worker is waited
    /// on for at most the stop timeout. Calling this more than once is a no-op.
    pub async fn stop(&self) {
        let workers: Vec<JoinHandle<()>> = {
            let mut accepting = self.accepting.lock();
            *accepting = false;

            let workers = std::mem::take(&mut *self.workers.lock());
            for _ in &workers {
                if self.sender.send(QueueMessage::Shutdown).is_err() {
                    break;
                }
            }
            workers
        };
        if workers.is_empty() {
            return;
        }

        for (worker_id, handle) in workers.into_iter().enumerate() {
            match tokio::time::timeout(self.stop_timeout, handle).await {
                Ok(Ok(())) => debug!(worker_id, "index worker stopped"),
                Ok(Err(e)) => warn!(worker_id, error = %e, "index worker terminated abnormally"),
                Err(_) => warn!(
                    worker_id,
                    timeout_secs = self.stop_timeout.as_secs(),
                    "index worker did not stop in time"
                ),
            }
        }
        info!("index workers stopped");
    }
}

struct Worker {
    id: usize,
    receiver: flume::Receiver<QueueMessage>,
    pipeline: Arc<RagPipeline>,
    metadata: BestEffort,
    records: JobTable,
}

impl Worker {
    async fn run(self) {
        debug!(worker_id = self.id, "index worker running");
        while let Ok(message) = self.receiver.recv_async().await {
            match message {
                QueueMessage::Shutdown => break,
                QueueMessage::Job(job) => self.process(job).await,
            }
        }
        debug!(worker_id = self.id, "index worker exiting");
    }

    async fn process(&self, job: QueuedJob) {
        let QueuedJob { job_id, request } = job;
        let meta = Value::Object(request.metadata.clone());

        self.transition(&job_id, JobStatus::Running, None, None);
        debug!(worker_id = self.id, job_id = %job_id, "index job running");

        // Run on its own task so a panic inside the pipeline fails the job, not the worker.
        let pipeline = Arc::clone(&self.pipeline);
        let outcome = tokio::spawn(async move { pipeline.index_repo(&request).await }).await;

        let record = match outcome {
            Ok(Ok(result)) => {
                info!(
                    job_id = %job_id,
                    chunks = result.chunk_count,
                    merged_total = result.merged_total,
                    "index job completed"
                );
                self.transition(&job_id, JobStatus::Completed, Some(result), None)
            }
            Ok(Err(e)) => {
                error!(job_id = %job_id, error = %e, "index job failed");
                self.transition(&job_id, JobStatus::Failed, None, Some(e.to_string()))
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "index job aborted");
                self.transition(&job_id, JobStatus::Failed, None, Some(e.to_string()))
            }
        };

        if let Some(record) = record {
            self.metadata.record_job(&record.to_document(&meta)).await;
        }
    }

    /// Applies a transition to the in-memory record and returns the updated copy.
    ///
    /// Terminal records are left untouched.
    fn transition(
        &self,
        job_id: &str,
        status: JobStatus,
        result: Option<IndexResult>,
        error: Option<String>,
    ) -> Option<JobRecord> {
        let mut records = self.records.write();
        let record = records.get_mut(job_id)?;
        if record.status.is_terminal() {
            warn!(job_id, from = %record.status, to = %status, "ignoring transition out of terminal state");
            return None;
        }
        record.status = status;
        record.result = result;
        record.error = error;
        Some(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataStore;
    use crate::pipeline::{MockServices, SourceFile};

    const DIM: usize = 8;

    fn queue(mocks: &MockServices) -> IndexJobQueue {
        IndexJobQueue::new(Arc::new(mocks.pipeline(Duration::from_secs(60))))
            .with_stop_timeout(Duration::from_secs(5))
    }

    fn request(repo_id: &str) -> IndexRequest {
        IndexRequest {
            repo_id: repo_id.to_string(),
            files: vec![SourceFile::new("a.py", "x".repeat(50))],
            metadata: Default::default(),
        }
    }

    async fn wait_terminal(queue: &IndexJobQueue, job_id: &str) -> JobRecord {
        for _ in 0..200 {
            if let Some(record) = queue.get_status(job_id)
                && record.status.is_terminal()
            {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {job_id} never reached a terminal state");
    }

    async fn wait_status(queue: &IndexJobQueue, job_id: &str, status: JobStatus) -> JobRecord {
        for _ in 0..200 {
            if let Some(record) = queue.get_status(job_id)
                && record.status == status
            {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {job_id} never reached {status}");
    }

    #[tokio::test]
    async fn test_submit_before_start_stays_queued() {
        let mocks = MockServices::new(DIM);
        let queue = queue(&mocks);

        let job_id = queue.submit(request("r1")).await.expect("submit");

        let record = queue.get_status(&job_id).expect("record");
        assert_eq!(record.status, JobStatus::Queued);
        assert_eq!(record.repo_id, "r1");
        assert_eq!(queue.pending(), 1);

        let doc = mocks.store.load_job(&job_id).await.expect("load").expect("doc");
        assert_eq!(doc.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn test_distinct_job_ids() {
        let mocks = MockServices::new(DIM);
        let queue = queue(&mocks);

        let a = queue.submit(request("r1")).await.expect("submit");
        let b = queue.submit(request("r1")).await.expect("submit");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_successful_job_completes_with_result() {
        let mocks = MockServices::new(DIM);
        let queue = queue(&mocks);
        queue.start(1).expect("start");

        let job_id = queue.submit(request("r1")).await.expect("submit");
        let record = wait_terminal(&queue, &job_id).await;

        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.result.as_ref().map(|r| r.chunk_count), Some(1));
        assert!(record.error.is_none());
        assert_eq!(mocks.index.record_count("r1"), 1);

        queue.stop().await;
        let doc = mocks.store.load_job(&job_id).await.expect("load").expect("doc");
        assert_eq!(doc.status, JobStatus::Completed);
        assert!(doc.result.is_some());
    }

    #[tokio::test]
    async fn test_failing_job_records_error() {
        let mocks = MockServices::new(DIM);
        mocks.index.set_fail_upserts(true);
        let queue = queue(&mocks);
        queue.start(1).expect("start");

        let job_id = queue.submit(request("r1")).await.expect("submit");
        let record = wait_terminal(&queue, &job_id).await;

        assert_eq!(record.status, JobStatus::Failed);
        assert!(record.result.is_none());
        assert!(record.error.as_deref().is_some_and(|e| e.contains("mock upsert failure")));

        queue.stop().await;
    }

    #[tokio::test]
    async fn test_status_observed_running_then_completed() {
        let mocks = MockServices::new(DIM);
        let release = mocks.index.hold_upserts();
        let queue = queue(&mocks);
        queue.start(1).expect("start");

        let job_id = queue.submit(request("r1")).await.expect("submit");
        let running = wait_status(&queue, &job_id, JobStatus::Running).await;
        assert!(running.result.is_none());
        assert!(running.error.is_none());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(queue.get_status(&job_id).unwrap().status, JobStatus::Running);

        release.notify_one();
        let record = wait_terminal(&queue, &job_id).await;
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.result.expect("result").chunk_count, 1);

        queue.stop().await;
    }

    #[tokio::test]
    async fn test_status_observed_running_then_failed() {
        let mocks = MockServices::new(DIM);
        let release = mocks.index.hold_upserts();
        let queue = queue(&mocks);
        queue.start(1).expect("start");

        let job_id = queue.submit(request("r1")).await.expect("submit");
        wait_status(&queue, &job_id, JobStatus::Running).await;

        mocks.index.set_fail_upserts(true);
        release.notify_one();
        let record = wait_terminal(&queue, &job_id).await;
        assert_eq!(record.status, JobStatus::Failed);
        assert!(record.error.is_some());

        queue.stop().await;
        assert_eq!(queue.get_status(&job_id).unwrap().status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_stop_during_submit_persistence_rejects_job() {
        let mocks = MockServices::new(DIM);
        let queue = Arc::new(queue(&mocks));
        queue.start(1).expect("start");

        let release = mocks.store.hold_job_writes();
        let submitting = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.submit(request("r1")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        queue.stop().await;
        release.notify_one();

        let outcome = submitting.await.expect("join");
        assert_eq!(outcome, Err(JobError::ShutDown));
        assert_eq!(queue.pending(), 0);

        let records: Vec<JobRecord> = queue.records.read().values().cloned().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, JobStatus::Failed);

        let docs = mocks.store.job_documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_metadata_failure_does_not_affect_jobs() {
        let mocks = MockServices::new(DIM);
        mocks.store.set_fail(true);
        let queue = queue(&mocks);
        queue.start(2).expect("start");

        let job_id = queue.submit(request("r1")).await.expect("submit");
        let record = wait_terminal(&queue, &job_id).await;

        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(mocks.store.job_writes(), 0);
        queue.stop().await;
    }

    #[tokio::test]
    async fn test_blank_repo_rejected() {
        let mocks = MockServices::new(DIM);
        let queue = queue(&mocks);

        let err = queue.submit(request(" ")).await.unwrap_err();
        assert!(matches!(err, JobError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_start_twice_rejected() {
        let mocks = MockServices::new(DIM);
        let queue = queue(&mocks);

        queue.start(2).expect("start");
        assert_eq!(queue.worker_count(), 2);
        assert_eq!(queue.start(1), Err(JobError::AlreadyStarted));
        queue.stop().await;
    }

    #[tokio::test]
    async fn test_stop_drains_queue_and_rejects_new_jobs() {
        let mocks = MockServices::new(DIM);
        let queue = queue(&mocks);

        let ids = [
            queue.submit(request("r1")).await.expect("submit"),
            queue.submit(request("r2")).await.expect("submit"),
            queue.submit(request("r3")).await.expect("submit"),
        ];
        queue.start(2).expect("start");
        queue.stop().await;

        assert_eq!(queue.worker_count(), 0);
        for id in &ids {
            let record = queue.get_status(id).expect("record");
            assert_eq!(record.status, JobStatus::Completed);
        }
        assert_eq!(queue.submit(request("r4")).await, Err(JobError::ShutDown));
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let mocks = MockServices::new(DIM);
        let queue = queue(&mocks);
        queue.stop().await;
        queue.stop().await;
        assert_eq!(queue.worker_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_job_absent() {
        let mocks = MockServices::new(DIM);
        assert!(queue(&mocks).get_status("nope").is_none());
    }
}
