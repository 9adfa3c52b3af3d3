use thiserror::Error;

use crate::cache::CacheError;
use crate::embedding::EmbeddingError;
use crate::jobs::JobError;
use crate::metadata::MetadataError;
use crate::vectordb::VectorDbError;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("embedder initialization failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("embedding cache initialization failed: {0}")]
    Cache(#[from] CacheError),

    #[error("vector index initialization failed: {0}")]
    VectorDb(#[from] VectorDbError),

    #[error("metadata store initialization failed: {0}")]
    Metadata(#[from] MetadataError),

    #[error("job workers failed to start: {0}")]
    Jobs(#[from] JobError),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
