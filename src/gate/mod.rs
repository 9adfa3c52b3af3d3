//! Bounded admission for heavy operations (indexing, querying).
//!
//! Callers that cannot get a permit within the acquire timeout are rejected with
//! [`GateError::Overloaded`] rather than queued.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors returned by [`ConcurrencyGate::try_acquire`].
pub enum GateError {
    /// No permit became available within the timeout.
    #[error("service overloaded: no capacity within {waited_ms}ms")]
    Overloaded {
        /// How long the caller waited.
        waited_ms: u64,
    },
}

#[derive(Debug, Clone)]
/// Counting semaphore sized by the configured maximum concurrent heavy operations.
///
/// Cloning shares the same permits.
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyGate {
    /// Creates a gate admitting at most `capacity` holders at once.
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits at most `timeout` for a permit.
    ///
    /// The permit is released when the returned [`GatePermit`] is dropped, on every
    /// exit path of the holder.
    pub async fn try_acquire(&self, timeout: Duration) -> Result<GatePermit, GateError> {
        match tokio::time::timeout(timeout, Arc::clone(&self.semaphore).acquire_owned()).await {
            Ok(Ok(permit)) => {
                debug!(available = self.available(), "gate permit acquired");
                Ok(GatePermit { _permit: permit })
            }
            Ok(Err(_)) | Err(_) => {
                let waited_ms = timeout.as_millis() as u64;
                warn!(
                    capacity = self.capacity,
                    waited_ms, "admission denied: gate at capacity"
                );
                Err(GateError::Overloaded { waited_ms })
            }
        }
    }
}

#[derive(Debug)]
#[must_use = "the gate permit is released as soon as it is dropped"]
/// A held gate slot.
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl GatePermit {
    /// Releases the slot now. Equivalent to dropping the permit.
    pub fn release(self) {}
}
