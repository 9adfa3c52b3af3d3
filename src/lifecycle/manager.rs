use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use super::error::LifecycleResult;
use crate::cache::EmbeddingCache;
use crate::config::Config;
use crate::constants::DEFAULT_MAX_SEQ_LEN;
use crate::embedding::{BertEmbedder, CachedEmbedder, Embedder, StubEmbedder};
use crate::gate::ConcurrencyGate;
use crate::generation::GenaiGenerator;
use crate::jobs::IndexJobQueue;
use crate::metadata::{BestEffort, FileMetadataStore};
use crate::pipeline::{PipelineSettings, QueryCache, RagPipeline};
use crate::vectordb::QdrantIndex;

/// Owns the process-wide services: pipeline (with its caches), gate and job queue.
///
/// Created once at startup; [`shutdown`](Self::shutdown) tears them down in order.
pub struct LifecycleManager {
    config: Config,
    pipeline: Arc<RagPipeline>,
    gate: ConcurrencyGate,
    jobs: Arc<IndexJobQueue>,
    shutdown_initiated: AtomicBool,
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("gate", &self.gate)
            .field("jobs", &self.jobs)
            .field("shutdown_initiated", &self.is_shutdown_initiated())
            .finish_non_exhaustive()
    }
}

impl LifecycleManager {
    /// Builds every service from `config` and connects to the vector backend.
    ///
    /// Without a model path the deterministic stub embedder is used. Without a disk
    /// cache path the embedding cache is memory-only.
    pub async fn from_config(config: Config) -> LifecycleResult<Self> {
        let embedder: Arc<dyn Embedder> = match &config.model_path {
            Some(path) => {
                info!(model_path = %path.display(), "loading embedding model");
                Arc::new(BertEmbedder::load(
                    path,
                    config.embedding_dim,
                    DEFAULT_MAX_SEQ_LEN,
                )?)
            }
            None => {
                warn!("No PRODO_MODEL_PATH configured, running embedder in stub mode");
                Arc::new(StubEmbedder::new(config.embedding_dim))
            }
        };

        let cache = match &config.disk_cache_path {
            Some(path) => EmbeddingCache::with_disk(config.memory_cache_capacity, path.clone())?,
            None => EmbeddingCache::in_memory(config.memory_cache_capacity),
        };

        let index =
            QdrantIndex::connect(&config.qdrant_url, &config.collection, config.embedding_dim)
                .await?;
        let metadata = FileMetadataStore::open(&config.data_path).await?;

        let pipeline = RagPipeline::new(
            CachedEmbedder::new(embedder, Arc::new(cache), config.retry),
            Arc::new(index),
            Arc::new(GenaiGenerator::new(&config.generator_model)),
            BestEffort::new(Arc::new(metadata)),
            Arc::new(QueryCache::new(
                config.query_cache_ttl,
                config.query_cache_capacity,
            )),
            PipelineSettings::from_config(&config),
        );

        info!(
            qdrant_url = %config.qdrant_url,
            collection = %config.collection,
            data_path = %config.data_path.display(),
            "services initialized"
        );
        Ok(Self::from_pipeline(config, Arc::new(pipeline)))
    }

    /// Wraps an already-built pipeline, sizing the gate and job queue from `config`.
    pub fn from_pipeline(config: Config, pipeline: Arc<RagPipeline>) -> Self {
        let gate = ConcurrencyGate::new(config.max_concurrent);
        let jobs = Arc::new(IndexJobQueue::new(Arc::clone(&pipeline)));
        Self {
            config,
            pipeline,
            gate,
            jobs,
            shutdown_initiated: AtomicBool::new(false),
        }
    }

    /// Starts the job workers when background indexing is enabled.
    pub fn start(&self) -> LifecycleResult<()> {
        if self.config.background_indexing {
            self.jobs.start(self.config.worker_count)?;
        } else {
            info!("background indexing disabled, index requests run inline");
        }
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pipeline(&self) -> &Arc<RagPipeline> {
        &self.pipeline
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn jobs(&self) -> &Arc<IndexJobQueue> {
        &self.jobs
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::Acquire)
    }

    /// Stops the workers, then clears the in-memory caches. Idempotent.
    ///
    /// The vector-index client is released when the last handle to the pipeline drops.
    pub async fn shutdown(&self) {
        if self.shutdown_initiated.swap(true, Ordering::AcqRel) {
            return;
        }
        self.jobs.stop().await;
        self.pipeline.clear_caches();
        info!("lifecycle shutdown complete");
    }
}
