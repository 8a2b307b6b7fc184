//! Baseline Anchor Model for the dual-perspective assistant
//!
//! This crate holds the immutable reference personality that every turn is
//! compared against:
//!
//! - **Principle anchors**: named commitments with weight, stability and variance tolerance
//! - **Emotional pattern**: primary, secondary and prohibited emotions plus an empathy baseline
//! - **Reasoning pattern**: accepted reasoning style and process labels
//!
//! # Key Components
//!
//! - [`BaselineAnchorModel`]: validated, fingerprinted, read-only model
//! - [`BaselineDefinition`]: serializable form for YAML/JSON configuration
//! - [`PromptAssembler`]: builds the Valon, Modi and assessment prompts
//!
//! # Example
//!
//! ```
//! use baseline::{BaselineAnchorModel, PromptAssembler};
//!
//! let model = BaselineAnchorModel::standard();
//! assert!(model.principle("compassion").is_some());
//!
//! let prompt = PromptAssembler::valon_system_prompt(&model);
//! assert!(prompt.contains("compassion"));
//! ```

pub mod defaults;
pub mod model;
pub mod prompt;
pub mod types;

// Re-export main types
pub use model::{BaselineAnchorModel, BaselineDefinition};
pub use prompt::PromptAssembler;
pub use types::*;
