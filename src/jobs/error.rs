use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("invalid job request: {0}")]
    InvalidRequest(String),

    /// `stop()` was called; no further jobs are accepted.
    #[error("job queue is shut down")]
    ShutDown,

    #[error("workers already started")]
    AlreadyStarted,
}
