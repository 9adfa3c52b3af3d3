use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::Embedder;
use super::error::EmbeddingError;
use super::stub::StubEmbedder;

/// Test embedder that records every batch it receives and can fail on demand.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    stub: StubEmbedder,
    reported_dim: usize,
    batches: Arc<Mutex<Vec<Vec<String>>>>,
    failures_remaining: Arc<AtomicUsize>,
}

impl MockEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            stub: StubEmbedder::new(dim),
            reported_dim: dim,
            batches: Arc::new(Mutex::new(Vec::new())),
            failures_remaining: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Reports `dim` but returns vectors of `returned_dim`.
    pub fn with_wrong_dimension(dim: usize, returned_dim: usize) -> Self {
        Self {
            stub: StubEmbedder::new(returned_dim),
            ..Self::new(dim)
        }
    }

    /// Makes the next `count` calls fail with an inference error.
    pub fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Batches received so far, in call order.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.batches.lock().len()
    }

    /// Total texts embedded across all calls.
    pub fn embedded_count(&self) -> usize {
        self.batches.lock().iter().map(Vec::len).sum()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn dimension(&self) -> usize {
        self.reported_dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.batches.lock().push(texts.to_vec());

        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(EmbeddingError::InferenceFailed {
                reason: "mock inference failure".to_string(),
            });
        }

        self.stub.embed_batch(texts).await
    }
}
