//! Service construction and ordered shutdown.

pub mod error;
pub mod manager;


pub use error::{LifecycleError, LifecycleResult};
pub use manager::LifecycleManager;
