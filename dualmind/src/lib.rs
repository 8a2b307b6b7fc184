//! Dualmind - the core of a dual-perspective conversational assistant
//!
//! Every turn starts from two raw texts: a Valon (moral/affective) response
//! and a Modi (logical/analytical) response. The core then:
//!
//! - **Weights** the two streams into a normalized bias and measures its
//!   drift from a slowly adapting baseline personality
//! - **Classifies** the moral behavior of the Valon stream against the
//!   immutable [`baseline::BaselineAnchorModel`] and proposes a
//!   preservation action
//! - **Remembers** the synthesis in an associative, self-consolidating
//!   memory vault with bounded capacity
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          DualMind                           │
//! │                                                             │
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐          │
//! │  │ Weighting  │──▶│ Classifier │──▶│   Vault    │          │
//! │  │  + drift   │   │ + actions  │   │ + sweep    │          │
//! │  └─────┬──────┘   └────────────┘   └─────┬──────┘          │
//! │        │                                  │                 │
//! │  ┌─────▼──────────────────────────────────▼──────┐         │
//! │  │              Persistence (bias, memories)     │         │
//! │  └───────────────────────────────────────────────┘         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod assessment;
pub mod classifier;
pub mod config;
pub mod mind;
pub mod persistence;
pub mod synthesis;
pub mod types;
pub mod vault;
pub mod weighting;

// Re-export main types
pub use assessment::{BehaviorAssessment, BehaviorSnapshot};
pub use classifier::{
    BalanceDecision, BalanceStrategy, BaselineDriftClassifier, BehaviorDrift, DriftClassification,
    PreservationAction, PreservationKind,
};
pub use config::DualmindConfig;
pub use mind::{DualMind, MindEvent, MindResponse, MindSnapshot};
pub use persistence::{BiasStore, InMemoryStore, JsonFileStore, MemoryStorage, PersistenceError};
pub use synthesis::SynthesisRecord;
pub use types::*;
pub use vault::{MemoryItem, MemoryType, MemoryVault, ScoredMemory, SearchQuery};
pub use weighting::{CognitiveDrift, DriftDirection, DriftLevel, PersonalityWeightingEngine};
