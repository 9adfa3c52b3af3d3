//! Indexing and query pipelines.
//!
//! [`RagPipeline`] is constructed once with its collaborators and shared by the HTTP
//! layer and the job workers.

/// Character chunker.
pub mod chunk;
mod error;
/// Merge-upsert indexing.
pub mod index;
#[cfg(any(test, feature = "mock"))]
mod mock;
/// Cached query answering.
pub mod query;
/// Request and response types.
pub mod types;


use std::sync::Arc;

use tracing::{info, instrument};

pub use chunk::{Chunk, chunk_text};
pub use error::PipelineError;
pub use index::{MergeOutcome, flatten_metadata, merge_records};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockServices;
pub use types::{
    IndexRequest, IndexResult, QueryRequest, QueryResponse, SourceFile, value_to_attribute,
};

use crate::cache::TtlCache;
use crate::config::Config;
use crate::embedding::CachedEmbedder;
use crate::generation::Generator;
use crate::metadata::BestEffort;
use crate::vectordb::VectorIndex;

/// Query-cache key: namespace plus digest of `(namespace, prompt, top_k)`.
///
/// The namespace is kept in clear so a reset can drop that repo's entries.
pub type QueryCacheKey = (String, [u8; 32]);

/// Time-boxed cache of full query responses.
pub type QueryCache = TtlCache<QueryCacheKey, QueryResponse>;

/// Sizes used by the pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub embedding_dim: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            embedding_dim: config.embedding_dim,
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            embedding_dim: crate::constants::DEFAULT_EMBEDDING_DIM,
            chunk_size: crate::constants::DEFAULT_CHUNK_SIZE,
            chunk_overlap: crate::constants::DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Indexing and query entry points over shared caches and collaborators.
pub struct RagPipeline {
    embedder: CachedEmbedder,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn Generator>,
    metadata: BestEffort,
    query_cache: Arc<QueryCache>,
    settings: PipelineSettings,
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("embedder", &self.embedder)
            .field("query_cache", &self.query_cache)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl RagPipeline {
    pub fn new(
        embedder: CachedEmbedder,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn Generator>,
        metadata: BestEffort,
        query_cache: Arc<QueryCache>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            metadata,
            query_cache,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn embedder(&self) -> &CachedEmbedder {
        &self.embedder
    }

    pub fn query_cache(&self) -> &Arc<QueryCache> {
        &self.query_cache
    }

    pub fn metadata(&self) -> &BestEffort {
        &self.metadata
    }

    /// Deletes every vector in the `repo_id` namespace and drops its cached answers.
    ///
    /// Succeeds when the namespace never existed.
    #[instrument(skip(self))]
    pub async fn reset_repo(&self, repo_id: &str) -> Result<(), PipelineError> {
        if repo_id.trim().is_empty() {
            return Err(PipelineError::InvalidRequest("repoId is required".to_string()));
        }
        self.index.delete_namespace(repo_id).await?;
        self.invalidate_queries(repo_id);
        info!("namespace reset");
        Ok(())
    }

    /// Clears the embedding memory tier and the query cache.
    pub fn clear_caches(&self) {
        self.embedder.cache().clear_memory();
        self.query_cache.clear();
    }

    fn invalidate_queries(&self, repo_id: &str) {
        self.query_cache.retain(|(namespace, _)| namespace != repo_id);
    }
}
