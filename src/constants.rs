//! Cross-cutting, shared constants.
//!
//! Prefer deriving secondary constants from primary ones to avoid drift.
//!
//! # Dimension Invariants
//!
//! Every vector written to the index must have exactly the configured embedding dimension.
//! Use [`validate_embedding_dim`] at module boundaries (embedder output, merge-upsert input)
//! to catch mismatches before they reach the vector backend.

/// Default embedding dimension (all-MiniLM-L6-v2).
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

pub const DEFAULT_CHUNK_SIZE: usize = 2000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

pub const DEFAULT_TOP_K: u64 = 6;

/// Upper bound on records read back by the merge-upsert bulk read.
pub const MAX_NAMESPACE_RECORDS: usize = 10_000;

pub const DEFAULT_MEMORY_CACHE_CAPACITY: usize = 4096;

pub const DEFAULT_QUERY_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_QUERY_CACHE_CAPACITY: usize = 1024;

pub const DEFAULT_MAX_CONCURRENT: usize = 2;
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 500;

pub const DEFAULT_WORKER_COUNT: usize = 1;
/// How long `stop()` waits for each worker before giving up on it.
pub const WORKER_STOP_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
pub const DEFAULT_RETRY_BACKOFF: f64 = 2.0;

pub const DEFAULT_MAX_SEQ_LEN: usize = 256;

/// Error returned when a vector does not have the configured dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Embedding dimension cannot be zero.
    ZeroDimension,
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "embedding dimension cannot be zero"),
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a runtime embedding dimension matches the expected dimension.
#[inline]
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if expected == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
