use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors raised by the disk tier.
///
/// [`EmbeddingCache`](super::EmbeddingCache) never surfaces these to callers; they are
/// logged and the operation degrades to a miss or a memory-only write.
pub enum CacheError {
    /// Cache directory could not be created or is unusable.
    #[error("cache directory unavailable: {path}")]
    DirectoryUnavailable {
        /// Path that failed.
        path: PathBuf,
    },

    /// Entry could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Entry bytes on disk failed validation.
    #[error("corrupt cache entry {key}: {reason}")]
    CorruptEntry {
        /// Hex key of the entry.
        key: String,
        /// Validation error message.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
