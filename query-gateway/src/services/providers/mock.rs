//! Mock provider for testing and local runs.

use super::{
    FinishReason, GenerationRequest, ProviderError, ProviderResponse, RagProvider,
};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum MockBehavior {
    Echo,
    Text(String),
    Empty,
    Fail(String),
}

/// Deterministic [`RagProvider`] that records every request it receives.
#[derive(Debug)]
pub struct MockRagProvider {
    behavior: MockBehavior,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockRagProvider {
    fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers `Mock response for: <prompt>`.
    pub fn echo() -> Self {
        Self::with_behavior(MockBehavior::Echo)
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Text(text.into()))
    }

    /// Succeeds without producing any text.
    pub fn empty() -> Self {
        Self::with_behavior(MockBehavior::Empty)
    }

    /// Fails every call with [`ProviderError::ApiError`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Fail(message.into()))
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RagProvider for MockRagProvider {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request.clone());
        }

        let text = match &self.behavior {
            MockBehavior::Echo => Some(format!("Mock response for: {}", request.prompt)),
            MockBehavior::Text(text) => Some(text.clone()),
            MockBehavior::Empty => None,
            MockBehavior::Fail(message) => return Err(ProviderError::ApiError(message.clone())),
        };

        Ok(ProviderResponse {
            output_tokens: text.as_ref().map(|t| t.len() as i32 / 4).unwrap_or(0),
            text,
            input_tokens: request.prompt.len() as i32 / 4,
            finish_reason: FinishReason::Complete,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
