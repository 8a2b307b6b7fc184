//! Text-generation backends.
//!
//! Only the port and a scripted double live here; real generators are
//! supplied by the embedding application.

pub mod mock;
pub mod traits;

pub use mock::MockBackend;
pub use traits::{
    CompletionRequest, CompletionResponse, GenerationError, ModelCapabilities, TextGenerator,
};
