//! Dual-stream generation.
//!
//! Produces the two raw texts every turn starts from: the Valon
//! (moral/affective) response and the Modi (logical/analytical) response.
//! Both requests go to the same backend concurrently with different system
//! prompts.

use std::sync::Arc;
use tracing::{debug, warn};

use baseline::{BaselineAnchorModel, PromptAssembler};

use crate::backend::traits::{CompletionRequest, GenerationError, TextGenerator};

/// Sampling settings for the two streams.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Maximum tokens per stream
    pub max_tokens: Option<u32>,
    /// Temperature for the Valon stream
    pub valon_temperature: f32,
    /// Temperature for the Modi stream
    pub modi_temperature: f32,
    /// Temperature for assessment requests
    pub assessment_temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: Some(512),
            valon_temperature: 0.8,
            modi_temperature: 0.3,
            assessment_temperature: 0.0,
        }
    }
}

/// The two raw responses for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamPair {
    /// Valon (moral/affective) text
    pub moral_text: String,
    /// Modi (logical/analytical) text
    pub logical_text: String,
}

/// Generates Valon and Modi texts from one backend.
pub struct DualStreamGenerator {
    backend: Arc<dyn TextGenerator>,
    valon_system: String,
    modi_system: String,
    model: Arc<BaselineAnchorModel>,
    config: GenerationConfig,
}

impl DualStreamGenerator {
    /// Create a generator whose prompts are derived from `model`.
    pub fn new(backend: Arc<dyn TextGenerator>, model: Arc<BaselineAnchorModel>) -> Self {
        Self {
            valon_system: PromptAssembler::valon_system_prompt(&model),
            modi_system: PromptAssembler::modi_system_prompt(&model),
            backend,
            model,
            config: GenerationConfig::default(),
        }
    }

    /// Set sampling configuration.
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Backend identifier.
    pub fn backend_id(&self) -> &str {
        self.backend.id()
    }

    /// Generate both streams for a user message.
    ///
    /// `recalled` memories are prepended to the user prompt of both streams.
    pub async fn generate(
        &self,
        user_message: &str,
        recalled: &[String],
    ) -> Result<StreamPair, GenerationError> {
        if !self.backend.is_available().await {
            warn!(backend = %self.backend.id(), "Text generator unavailable");
            return Err(GenerationError::Unavailable(self.backend.id().to_string()));
        }

        let user_prompt = format!("{}{}", PromptAssembler::context_block(recalled), user_message);

        let valon_request = self.request(&user_prompt, &self.valon_system, self.config.valon_temperature);
        let modi_request = self.request(&user_prompt, &self.modi_system, self.config.modi_temperature);

        let (valon, modi) = futures::join!(
            self.backend.complete(valon_request),
            self.backend.complete(modi_request)
        );
        let (valon, modi) = (valon?, modi?);

        debug!(
            backend = %self.backend.id(),
            valon_tokens = valon.usage.completion_tokens,
            modi_tokens = modi.usage.completion_tokens,
            "Generated dual streams"
        );

        Ok(StreamPair {
            moral_text: valon.content,
            logical_text: modi.content,
        })
    }

    /// Ask the backend for a JSON behavior assessment of a Valon response.
    ///
    /// Returns the raw text; parsing and validation belong to the caller.
    pub async fn assess(&self, moral_text: &str) -> Result<String, GenerationError> {
        let prompt = PromptAssembler::assessment_prompt(&self.model, moral_text);
        let mut request = CompletionRequest::user(prompt)
            .with_temperature(self.config.assessment_temperature);
        if self.backend.capabilities().supports_json_mode {
            request = request.with_json_output();
        }

        let response = self.backend.complete(request).await?;
        Ok(response.content)
    }

    fn request(&self, user_prompt: &str, system: &str, temperature: f32) -> CompletionRequest {
        let mut request = CompletionRequest::user(user_prompt)
            .with_system(system)
            .with_temperature(temperature);
        if let Some(max) = self.config.max_tokens {
            request = request.with_max_tokens(max);
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;

    fn generator(backend: MockBackend) -> (Arc<MockBackend>, DualStreamGenerator) {
        let backend = Arc::new(backend);
        let generator =
            DualStreamGenerator::new(backend.clone(), Arc::new(BaselineAnchorModel::standard()));
        (backend, generator)
    }

    #[tokio::test]
    async fn test_generate_routes_streams() {
        let (backend, generator) = generator(
            MockBackend::new("mock")
                .with_response_for("VALON PERSPECTIVE", "I feel strong moral clarity about this")
                .with_response_for("MODI PERSPECTIVE", "technical, high_confidence, advanced"),
        );

        let pair = generator.generate("Should I tell my friend?", &[]).await.unwrap();

        assert_eq!(pair.moral_text, "I feel strong moral clarity about this");
        assert_eq!(pair.logical_text, "technical, high_confidence, advanced");
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_generate_includes_recalled_context() {
        let (_, generator) = generator(
            MockBackend::new("mock").with_response_for("RELEVANT MEMORIES", "remembered"),
        );

        let pair = generator
            .generate("hello", &["we talked about consciousness".to_string()])
            .await
            .unwrap();

        assert_eq!(pair.moral_text, "remembered");
        assert_eq!(pair.logical_text, "remembered");
    }

    #[tokio::test]
    async fn test_generate_unavailable() {
        let (backend, generator) = generator(MockBackend::new("mock").with_available(false));

        let result = generator.generate("hello", &[]).await;
        assert!(matches!(result, Err(GenerationError::Unavailable(_))));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_assess_returns_raw_text() {
        let (_, generator) = generator(
            MockBackend::new("mock")
                .with_response_for("BEHAVIOR ASSESSMENT", r#"{"primary_emotion":"care"}"#),
        );

        let raw = generator.assess("I care").await.unwrap();
        assert_eq!(raw, r#"{"primary_emotion":"care"}"#);
    }
}
