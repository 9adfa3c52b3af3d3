//! Text generation for query answers.

use async_trait::async_trait;

/// Structured advice parsing.
pub mod advice;
/// `genai`-backed generator.
pub mod client;
mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use advice::{Advice, FALLBACK_SUGGESTION, parse_advice};
pub use client::GenaiGenerator;
pub use error::GenerationError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockGenerator;

/// Produces free-form text for a prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
