use async_trait::async_trait;
use tracing::debug;

use super::Embedder;
use super::error::EmbeddingError;
use crate::hashing::hash_to_u64;

/// Deterministic, model-free embedder.
///
/// Each vector is drawn from an LCG seeded by the BLAKE3 hash of the text and then
/// L2-normalised, so identical text always yields the identical vector. Used when no
/// model directory is configured.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dim: usize,
}

impl StubEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    /// Synchronous form of [`Embedder::embed_batch`] for a single text.
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut state = hash_to_u64(text.as_bytes());
        let mut embedding: Vec<f32> = (0..self.dim)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0
            })
            .collect();

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }
        embedding
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        debug!(count = texts.len(), "generating stub embeddings");
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_is_deterministic_and_normalised() {
        let embedder = StubEmbedder::new(384);
        let a = embedder.embed_one("fn main() {}");
        let b = embedder.embed_one("fn main() {}");

        assert_eq!(a, b);
        assert_eq!(a.len(), 384);

        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_stub_distinguishes_texts() {
        let embedder = StubEmbedder::new(16);
        assert_ne!(embedder.embed_one("a"), embedder.embed_one("b"));
    }

    #[tokio::test]
    async fn test_stub_batch_matches_inputs() {
        let embedder = StubEmbedder::new(8);
        let texts = vec!["x".to_string(), "y".to_string()];

        let out = embedder.embed_batch(&texts).await.expect("embed");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], embedder.embed_one("x"));
    }
}
