use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::generation::GenerationError;
use crate::vectordb::VectorDbError;

#[derive(Debug, Error)]
/// Failures that abort an index, query or reset.
pub enum PipelineError {
    /// A required field is missing or out of range.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    VectorDb(#[from] VectorDbError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A record about to be written has the wrong vector length.
    #[error("record '{id}' has {actual}-dim vector, expected {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },
}
