//! Mock backend returning a fixed reply.
//!
//! Used for local runs without provider credentials and in API tests.

use std::time::Duration;

use oilan_core::generation::backend::GenerationBackend;
use oilan_types::generation::{GenerationError, GenerationRequest};

pub struct MockBackend {
    reply: String,
    delay: Duration,
}

impl MockBackend {
    pub fn new(reply: impl Into<String>, delay: Duration) -> Self {
        Self {
            reply: reply.into(),
            delay,
        }
    }
}

impl GenerationBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        tracing::debug!(history_len = request.history.len(), "Mock generation");
        Ok(self.reply.clone())
    }
}
