use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by a [`Generator`](super::Generator).
pub enum GenerationError {
    /// The model provider rejected or failed the request.
    #[error("generation request to '{model}' failed: {message}")]
    ProviderFailed {
        /// Model name.
        model: String,
        /// Error message.
        message: String,
    },
}
