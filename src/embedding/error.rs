use std::path::PathBuf;
use thiserror::Error;

/// Failures from loading an embedder or turning text into vectors.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// A required model file (`config.json`, `model.safetensors`) is absent.
    #[error("model file missing: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("could not read model files: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("forward pass failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenizer error: {reason}")]
    TokenizationFailed { reason: String },

    /// `config.json` is unreadable or its hidden size disagrees with the configured dimension.
    #[error("unusable model config: {reason}")]
    InvalidConfig { reason: String },

    #[error("embedder returned {actual}-dim vector, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedder returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },

    /// The blocking inference task panicked or was cancelled.
    #[error("embedding task aborted: {reason}")]
    TaskFailed { reason: String },
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        Self::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for EmbeddingError {
    fn from(err: std::io::Error) -> Self {
        Self::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for EmbeddingError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskFailed {
            reason: err.to_string(),
        }
    }
}
