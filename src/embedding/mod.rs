//! Text embedding.
//!
//! - [`Embedder`] is the model seam: batch of texts in, one fixed-dimension vector out per text.
//! - [`BertEmbedder`] runs a local sentence encoder with candle.
//! - [`StubEmbedder`] is the deterministic fallback when no model is configured.
//! - [`CachedEmbedder`] puts the shared [`EmbeddingCache`](crate::cache::EmbeddingCache)
//!   and retry policy in front of any embedder.

use async_trait::async_trait;

/// BERT sentence encoder.
pub mod bert;
/// Cache-aware batching wrapper.
pub mod cached;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
/// Hash-seeded stub embedder.
pub mod stub;
/// Tokenizer loading helpers.
pub mod utils;

pub use bert::BertEmbedder;
pub use cached::CachedEmbedder;
pub use error::EmbeddingError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
pub use stub::StubEmbedder;

/// Produces one embedding per input text.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Length of every returned vector.
    fn dimension(&self) -> usize;

    /// Embeds `texts`, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}
