//! The text-generation port.
//!
//! The core never talks to a model directly. It hands a [`TextGenerator`] a
//! system prompt and one user prompt and gets plain text back; whether that
//! text comes from an on-device model, a local server or a script is the
//! embedder's business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Why a completion could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Generator unavailable: {0}")]
    Unavailable(String),

    #[error("Generation failed: {0}")]
    RequestFailed(String),
}

/// Prompt-in, text-out generator behind both streams and assessments.
///
/// Implementations own their timeouts.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Identifier used in logs and state snapshots.
    fn id(&self) -> &str;

    async fn is_available(&self) -> bool;

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, GenerationError>;

    fn capabilities(&self) -> &ModelCapabilities;
}

/// One prompt for the generator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct CompletionRequest {
    /// Perspective instructions (Valon, Modi) when present
    pub system_prompt: Option<String>,
    pub user_prompt: String,
    pub max_tokens: Option<u32>,
    /// Sampling temperature, kept within 0.0 - 2.0
    pub temperature: Option<f32>,
    /// Ask for a single JSON object
    pub json_output: bool,
}

impl CompletionRequest {
    pub fn user(prompt: impl Into<String>) -> Self {
        Self {
            user_prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 2.0));
        self
    }

    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// System and user prompt joined by a newline.
    pub fn prompt_text(&self) -> String {
        match &self.system_prompt {
            Some(system) => format!("{system}\n{}", self.user_prompt),
            None => self.user_prompt.clone(),
        }
    }
}

/// Generated text and how generation ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct CompletionResponse {
    pub content: String,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    /// Cut off at `max_tokens`
    Length,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// What a generator can do.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ModelCapabilities {
    pub context_window: u32,
    /// Honors [`CompletionRequest::json_output`]
    pub supports_json_mode: bool,
}

impl Default for ModelCapabilities {
    fn default() -> Self {
        Self {
            context_window: 4096,
            supports_json_mode: false,
        }
    }
}
