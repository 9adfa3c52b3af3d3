//! Embedding and query-result caches.
//!
//! - [`EmbeddingCache`]: exact text to vector, bounded LRU memory tier over an
//!   optional unbounded rkyv disk tier.
//! - [`TtlCache`]: bounded time-to-live map used for query results.

/// Disk tier.
pub mod disk;
/// Two-tier embedding cache.
pub mod embedding;
/// Cache error types.
pub mod error;
/// Memory tier.
pub mod memory;
/// TTL cache.
pub mod ttl;

pub use disk::{DiskTier, StoredEmbedding};
pub use embedding::{CacheStats, EmbeddingCache};
pub use error::{CacheError, CacheResult};
pub use memory::MemoryTier;
pub use ttl::TtlCache;
