use std::sync::Arc;
use std::time::Duration;

use crate::gate::ConcurrencyGate;
use crate::jobs::IndexJobQueue;
use crate::lifecycle::LifecycleManager;
use crate::pipeline::RagPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,

    /// Admission control for query and inline index requests.
    pub gate: ConcurrencyGate,

    pub jobs: Arc<IndexJobQueue>,

    /// Longest wait for a gate permit before answering 429.
    pub acquire_timeout: Duration,

    /// Index requests are queued instead of run inline.
    pub background_indexing: bool,
}

impl AppState {
    pub fn new(
        pipeline: Arc<RagPipeline>,
        gate: ConcurrencyGate,
        jobs: Arc<IndexJobQueue>,
        acquire_timeout: Duration,
        background_indexing: bool,
    ) -> Self {
        Self {
            pipeline,
            gate,
            jobs,
            acquire_timeout,
            background_indexing,
        }
    }

    pub fn from_lifecycle(lifecycle: &LifecycleManager) -> Self {
        let config = lifecycle.config();
        Self::new(
            Arc::clone(lifecycle.pipeline()),
            lifecycle.gate().clone(),
            Arc::clone(lifecycle.jobs()),
            config.acquire_timeout,
            config.background_indexing,
        )
    }
}
