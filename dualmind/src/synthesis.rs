//! Per-turn synthesis record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::classifier::{BalanceDecision, DriftClassification, PreservationKind};
use crate::types::CurrentBias;
use crate::weighting::{AdaptDecision, DriftDirection, DriftLevel};

/// Everything one turn produced. Field names are the persisted/logged form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRecord {
    pub weighted_valon_influence: f64,
    pub weighted_modi_influence: f64,
    pub current_valon_bias: f64,
    pub current_modi_bias: f64,
    pub valon_drift: f64,
    pub modi_drift: f64,
    pub total_drift: f64,
    pub drift_level: DriftLevel,
    pub drift_direction: DriftDirection,
    pub exceeds_tolerance: bool,
    /// Baseline the turn was measured against
    pub baseline_personality: CurrentBias,
    /// Bias measured this turn
    pub current_personality: CurrentBias,
    pub confidence: f64,
    pub adaptation: AdaptDecision,
    /// Baseline after adaptation, when it was adapted
    pub adapted_baseline: Option<CurrentBias>,
    pub classification: DriftClassification,
    pub drift_magnitude: f64,
    pub preservation_action: PreservationKind,
    pub action_strength: f64,
    pub action_rationale: String,
    pub action_parameters: BTreeMap<String, serde_json::Value>,
    pub balance: BalanceDecision,
    /// Id of the stored synthesis memory
    pub memory_id: Option<Uuid>,
    /// Recoverable problems (persistence failures, fallbacks)
    pub warnings: Vec<String>,
}

impl SynthesisRecord {
    /// Whether the turn needs attention from the synthesis layer.
    pub fn requires_correction(&self) -> bool {
        matches!(
            self.classification,
            DriftClassification::CriticalDrift | DriftClassification::MoralDegradation
        )
    }
}
