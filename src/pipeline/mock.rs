use std::sync::Arc;
use std::time::Duration;

use super::{PipelineSettings, QueryCache, RagPipeline};
use crate::cache::EmbeddingCache;
use crate::embedding::{CachedEmbedder, MockEmbedder};
use crate::generation::MockGenerator;
use crate::metadata::{BestEffort, MockMetadataStore};
use crate::retry::RetryPolicy;
use crate::vectordb::MockVectorIndex;

/// Mock collaborators for a [`RagPipeline`], kept around so tests can inspect them.
#[derive(Clone)]
pub struct MockServices {
    pub embedder: MockEmbedder,
    pub index: Arc<MockVectorIndex>,
    pub generator: Arc<MockGenerator>,
    pub store: Arc<MockMetadataStore>,
    pub settings: PipelineSettings,
}

impl MockServices {
    pub fn new(dim: usize) -> Self {
        Self {
            embedder: MockEmbedder::new(dim),
            index: Arc::new(MockVectorIndex::new(dim)),
            generator: Arc::new(MockGenerator::default()),
            store: Arc::new(MockMetadataStore::new()),
            settings: PipelineSettings {
                embedding_dim: dim,
                ..PipelineSettings::default()
            },
        }
    }

    /// A pipeline over these mocks with a fresh memory-only embedding cache.
    pub fn pipeline(&self, query_ttl: Duration) -> RagPipeline {
        RagPipeline::new(
            CachedEmbedder::new(
                Arc::new(self.embedder.clone()),
                Arc::new(EmbeddingCache::in_memory(1024)),
                RetryPolicy::no_retry(),
            ),
            self.index.clone(),
            self.generator.clone(),
            BestEffort::new(self.store.clone()),
            Arc::new(QueryCache::new(query_ttl, 64)),
            self.settings,
        )
    }
}
