//! Dualmind Agent - text-generation port
//!
//! Provides the boundary between the assistant core and whatever model
//! writes its responses:
//! - The [`TextGenerator`] port and a scripted [`MockBackend`]
//! - Dual-stream generation of the Valon and Modi responses
//! - Structured behavior-assessment requests
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         DualStreamGenerator             │
//! │   (Valon + Modi prompts, assessment)    │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┴───────────┐
//!      ▼                       ▼
//! ┌─────────────┐       ┌─────────────┐
//! │TextGenerator│       │  Baseline   │
//! │ (embedder / │       │  Anchor     │
//! │  Mock)      │       │  Model      │
//! └─────────────┘       └─────────────┘
//! ```

pub mod backend;
pub mod streams;

// Re-export main types for convenience
pub use backend::traits::{
    CompletionRequest, CompletionResponse, GenerationError, ModelCapabilities, TextGenerator,
};
pub use backend::MockBackend;
pub use streams::{DualStreamGenerator, GenerationConfig, StreamPair};
