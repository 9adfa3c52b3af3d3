use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::Generator;
use super::error::GenerationError;

/// Returns a canned response and records every prompt.
pub struct MockGenerator {
    response: Mutex<String>,
    prompts: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl MockGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Mutex::new(response.into()),
            prompts: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_response(&self, response: impl Into<String>) {
        *self.response.lock() = response.into();
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new(r#"{"suggestions": ["mock suggestion"], "insights": ["mock insight"], "guidance": "mock guidance"}"#)
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().push(prompt.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(GenerationError::ProviderFailed {
                model: "mock".to_string(),
                message: "mock generation failure".to_string(),
            });
        }
        Ok(self.response.lock().clone())
    }
}
