//! Embedding through the shared content cache.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::Embedder;
use super::error::EmbeddingError;
use crate::cache::EmbeddingCache;
use crate::retry::RetryPolicy;

/// Wraps an [`Embedder`] with the two-tier cache and a retry policy.
///
/// For a batch, each text is looked up in the cache; the distinct misses go to the
/// embedder in one call (retried per policy) and are written back to the cache.
/// Output order matches input order.
#[derive(Clone)]
pub struct CachedEmbedder {
    embedder: Arc<dyn Embedder>,
    cache: Arc<EmbeddingCache>,
    retry: RetryPolicy,
    dim: usize,
}

impl std::fmt::Debug for CachedEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedEmbedder")
            .field("dim", &self.dim)
            .field("retry", &self.retry)
            .field("cache", &self.cache)
            .finish()
    }
}

impl CachedEmbedder {
    pub fn new(embedder: Arc<dyn Embedder>, cache: Arc<EmbeddingCache>, retry: RetryPolicy) -> Self {
        let dim = embedder.dimension();
        Self {
            embedder,
            cache,
            retry,
            dim,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }

    /// Embeds `texts`, consulting the cache first.
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let cache = Arc::clone(&self.cache);
        let lookup = texts.to_vec();
        let dim = self.dim;
        // Cached vectors of another dimension (e.g. a reused disk tier) count as misses.
        let mut slots: Vec<Option<Vec<f32>>> = tokio::task::spawn_blocking(move || {
            lookup
                .iter()
                .map(|t| cache.get(t).filter(|v| v.len() == dim))
                .collect()
        })
        .await?;

        let mut miss_texts: Vec<String> = Vec::new();
        let mut miss_index: HashMap<&str, usize> = HashMap::new();
        for (text, slot) in texts.iter().zip(&slots) {
            if slot.is_none() && !miss_index.contains_key(text.as_str()) {
                miss_index.insert(text.as_str(), miss_texts.len());
                miss_texts.push(text.clone());
            }
        }

        debug!(
            total = texts.len(),
            hits = slots.iter().filter(|s| s.is_some()).count(),
            distinct_misses = miss_texts.len(),
            "embedding cache lookup"
        );

        if miss_texts.is_empty() {
            return Ok(slots.into_iter().flatten().collect());
        }

        let embedder = &self.embedder;
        let fresh = self
            .retry
            .execute("embed_batch", || embedder.embed_batch(&miss_texts))
            .await?;

        if fresh.len() != miss_texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: miss_texts.len(),
                actual: fresh.len(),
            });
        }
        if let Some(bad) = fresh.iter().find(|v| v.len() != self.dim) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dim,
                actual: bad.len(),
            });
        }

        let cache = Arc::clone(&self.cache);
        let write_back: Vec<(String, Vec<f32>)> = miss_texts
            .iter()
            .cloned()
            .zip(fresh.iter().cloned())
            .collect();
        tokio::task::spawn_blocking(move || {
            for (text, embedding) in &write_back {
                cache.set(text, embedding);
            }
        })
        .await?;

        for (text, slot) in texts.iter().zip(slots.iter_mut()) {
            if slot.is_none()
                && let Some(&j) = miss_index.get(text.as_str())
            {
                *slot = Some(fresh[j].clone());
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Embeds a single text through the cache.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut out = self.embed_texts(&[text.to_string()]).await?;
        out.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }
}
