use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by a [`MetadataStore`](super::MetadataStore).
pub enum MetadataError {
    /// I/O error.
    #[error("metadata I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document could not be encoded or decoded.
    #[error("metadata serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store is not reachable.
    #[error("metadata store unavailable: {reason}")]
    Unavailable {
        /// Error message.
        reason: String,
    },
}
