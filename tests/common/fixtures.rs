//! Test fixtures for integration tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use prodo::cache::EmbeddingCache;
use prodo::embedding::{CachedEmbedder, MockEmbedder};
use prodo::generation::MockGenerator;
use prodo::metadata::{BestEffort, FileMetadataStore};
use prodo::pipeline::{IndexRequest, PipelineSettings, QueryCache, QueryRequest, RagPipeline, SourceFile};
use prodo::retry::RetryPolicy;
use prodo::vectordb::MockVectorIndex;

pub const TEST_DIM: usize = 16;

pub const TEST_REPO: &str = "r1";

#[derive(Default)]
pub struct IndexRequestBuilder {
    repo_id: Option<String>,
    files: Vec<SourceFile>,
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl IndexRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repo_id(mut self, repo_id: &str) -> Self {
        self.repo_id = Some(repo_id.to_string());
        self
    }

    pub fn file(mut self, filename: &str, content: impl Into<String>) -> Self {
        self.files.push(SourceFile::new(filename, content));
        self
    }

    pub fn meta(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> IndexRequest {
        IndexRequest {
            repo_id: self.repo_id.unwrap_or_else(|| TEST_REPO.to_string()),
            files: self.files,
            metadata: self.metadata,
        }
    }
}

pub fn query(repo_id: &str, prompt: &str, top_k: u64) -> QueryRequest {
    QueryRequest {
        repo_id: repo_id.to_string(),
        prompt: prompt.to_string(),
        top_k,
        metadata: Default::default(),
    }
}

/// Collaborators for a pipeline backed by on-disk caches and metadata.
pub struct DiskBackedServices {
    pub embedder: MockEmbedder,
    pub index: Arc<MockVectorIndex>,
    pub generator: Arc<MockGenerator>,
}

impl DiskBackedServices {
    pub fn new() -> Self {
        Self {
            embedder: MockEmbedder::new(TEST_DIM),
            index: Arc::new(MockVectorIndex::new(TEST_DIM)),
            generator: Arc::new(MockGenerator::default()),
        }
    }

    /// Builds a pipeline whose embedding disk tier and metadata documents live under `root`.
    ///
    /// Calling this twice with the same `root` models a process restart.
    pub async fn pipeline(&self, root: &Path, memory_capacity: usize) -> RagPipeline {
        let cache = EmbeddingCache::with_disk(memory_capacity, root.join("embeddings"))
            .expect("disk tier");
        let store = FileMetadataStore::open(root.join("metadata"))
            .await
            .expect("metadata store");

        RagPipeline::new(
            CachedEmbedder::new(
                Arc::new(self.embedder.clone()),
                Arc::new(cache),
                RetryPolicy::no_retry(),
            ),
            self.index.clone(),
            self.generator.clone(),
            BestEffort::new(Arc::new(store)),
            Arc::new(QueryCache::new(Duration::from_secs(60), 32)),
            PipelineSettings {
                embedding_dim: TEST_DIM,
                ..PipelineSettings::default()
            },
        )
    }
}
