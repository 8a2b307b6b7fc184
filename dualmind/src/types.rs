//! Core types shared across the dualmind engines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance for the bias sum invariant.
pub const BIAS_EPSILON: f64 = 1e-9;

/// Per-stream influence weights. `valon + modi == 1.0` at all times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentBias {
    /// Moral/affective stream share
    pub valon: f64,
    /// Logical/analytical stream share
    pub modi: f64,
}

impl CurrentBias {
    /// The built-in 70/30 personality.
    pub const DEFAULT: CurrentBias = CurrentBias { valon: 0.7, modi: 0.3 };

    /// Even blend.
    pub const NEUTRAL: CurrentBias = CurrentBias { valon: 0.5, modi: 0.5 };

    /// Build a bias from raw shares, normalizing them to sum to 1.0.
    ///
    /// Returns `None` for NaN, infinite or negative shares, or when both are zero.
    pub fn normalized(valon: f64, modi: f64) -> Option<Self> {
        if !valon.is_finite() || !modi.is_finite() || valon < 0.0 || modi < 0.0 {
            return None;
        }

        let total = valon + modi;
        if total <= 0.0 {
            return None;
        }

        Some(Self {
            valon: (valon / total).clamp(0.0, 1.0),
            modi: (modi / total).clamp(0.0, 1.0),
        })
    }

    /// Whether the sum invariant holds.
    pub fn is_normalized(&self) -> bool {
        (self.valon + self.modi - 1.0).abs() <= BIAS_EPSILON
            && (0.0..=1.0).contains(&self.valon)
            && (0.0..=1.0).contains(&self.modi)
    }
}

impl Default for CurrentBias {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for CurrentBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "valon {:.3} / modi {:.3}", self.valon, self.modi)
    }
}

/// Conversation state handed in by the chat layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Session identifier
    pub session_id: String,
    /// Most recent messages, oldest first
    pub recent_history: Vec<String>,
}

impl ConversationContext {
    /// Create a context for a session with no history yet.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            recent_history: Vec::new(),
        }
    }

    /// Builder: append a history entry.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.recent_history.push(message.into());
        self
    }

    /// Compact summary of the last `n` messages.
    pub fn summary(&self, n: usize) -> String {
        let start = self.recent_history.len().saturating_sub(n);
        self.recent_history[start..].join(" | ")
    }
}

/// Error types for the dualmind core.
#[derive(Debug, thiserror::Error)]
pub enum DualmindError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Baseline model error
    #[error("Baseline error: {0}")]
    Baseline(#[from] baseline::BaselineError),

    /// Text generation error
    #[error("Generation error: {0}")]
    Generation(#[from] dualmind_agent::GenerationError),

    /// Persistence error surfaced to a caller that asked for it directly
    #[error("Persistence error: {0}")]
    Persistence(#[from] crate::persistence::PersistenceError),
}

pub type Result<T> = std::result::Result<T, DualmindError>;
