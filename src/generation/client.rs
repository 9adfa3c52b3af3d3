use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatRequest};
use tracing::debug;

use super::Generator;
use super::error::GenerationError;

/// [`Generator`] backed by a hosted chat model through `genai`.
///
/// Provider credentials are read by `genai` from its usual environment variables
/// (e.g. `GEMINI_API_KEY`).
#[derive(Clone)]
pub struct GenaiGenerator {
    client: Client,
    model: String,
}

impl std::fmt::Debug for GenaiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiGenerator")
            .field("model", &self.model)
            .finish()
    }
}

impl GenaiGenerator {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::default(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generator for GenaiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);

        let response = self
            .client
            .exec_chat(&self.model, request, None)
            .await
            .map_err(|e| GenerationError::ProviderFailed {
                model: self.model.clone(),
                message: e.to_string(),
            })?;

        let text = response.first_text().unwrap_or_default().to_string();
        debug!(model = %self.model, output_len = text.len(), "generation complete");
        Ok(text)
    }
}
