use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by vector index operations.
pub enum VectorDbError {
    /// Could not connect to the Qdrant endpoint.
    #[error("failed to connect to Qdrant at '{url}': {message}")]
    ConnectionFailed {
        /// Endpoint URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// Collection creation failed.
    #[error("failed to create collection '{collection}': {message}")]
    CreateCollectionFailed {
        /// Collection name.
        collection: String,
        /// Error message.
        message: String,
    },

    /// Upsert failed.
    #[error("failed to upsert into namespace '{namespace}': {message}")]
    UpsertFailed {
        /// Namespace (repo id).
        namespace: String,
        /// Error message.
        message: String,
    },

    /// Similarity search failed.
    #[error("failed to search namespace '{namespace}': {message}")]
    SearchFailed {
        /// Namespace (repo id).
        namespace: String,
        /// Error message.
        message: String,
    },

    /// Bulk read of a namespace failed.
    #[error("failed to read namespace '{namespace}': {message}")]
    FetchFailed {
        /// Namespace (repo id).
        namespace: String,
        /// Error message.
        message: String,
    },

    /// Namespace deletion failed.
    #[error("failed to delete namespace '{namespace}': {message}")]
    DeleteFailed {
        /// Namespace (repo id).
        namespace: String,
        /// Error message.
        message: String,
    },

    /// Vector dimension mismatch.
    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },
}
