//! Background indexing jobs.
//!
//! [`IndexJobQueue`] hands [`IndexRequest`](crate::pipeline::IndexRequest)s to a
//! fixed pool of tokio workers over a shared flume channel. Each job is dequeued by
//! exactly one worker; with more than one worker, jobs may complete out of order.

mod error;
/// Queue and worker loop.
pub mod queue;
/// Job records and status.
pub mod types;

pub use error::JobError;
pub use queue::IndexJobQueue;
pub use types::{JobRecord, JobStatus};
