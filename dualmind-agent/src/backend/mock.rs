//! Mock text generator for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::traits::*;

/// Mock backend for testing.
///
/// Answers with the first scripted response whose marker occurs anywhere in
/// the prompt (system prompt included), falling back to a default response.
/// Marker routing keeps answers deterministic when several requests run
/// concurrently.
pub struct MockBackend {
    model_id: String,
    available: AtomicBool,
    capabilities: ModelCapabilities,
    response_content: String,
    scripted: Vec<(String, String)>,
    call_count: AtomicU32,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            available: AtomicBool::new(true),
            capabilities: ModelCapabilities::default(),
            response_content: "Mock response".to_string(),
            scripted: Vec::new(),
            call_count: AtomicU32::new(0),
        }
    }

    /// Set the default response content.
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.response_content = content.into();
        self
    }

    /// Answer with `content` when the prompt contains `marker`.
    pub fn with_response_for(mut self, marker: impl Into<String>, content: impl Into<String>) -> Self {
        self.scripted.push((marker.into(), content.into()));
        self
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Set capabilities.
    pub fn with_capabilities(mut self, capabilities: ModelCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Get the number of times complete was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    fn response_for(&self, prompt: &str) -> &str {
        self.scripted
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
            .map(|(_, content)| content.as_str())
            .unwrap_or(&self.response_content)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-model")
    }
}

#[async_trait]
impl TextGenerator for MockBackend {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, GenerationError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if !self.available.load(Ordering::SeqCst) {
            return Err(GenerationError::Unavailable("Mock backend disabled".to_string()));
        }

        let prompt = request.prompt_text();
        let content = self.response_for(&prompt).to_string();

        // Estimate token counts
        let prompt_tokens = prompt.len() as u32 / 4;
        let completion_tokens = content.len() as u32 / 4;

        Ok(CompletionResponse {
            content,
            finish_reason: FinishReason::Stop,
            usage: Usage {
                prompt_tokens,
                completion_tokens,
            },
        })
    }

    fn capabilities(&self) -> &ModelCapabilities {
        &self.capabilities
    }
}
