//! Baseline drift classification.
//!
//! Compares a behavior assessment of the Valon stream against the immutable
//! [`BaselineAnchorModel`], classifies the overall drift and decides whether
//! to preserve, restore or allow growth.
//!
//! # Channels
//!
//! - **Principles**: activation per anchor vs the anchor weight
//! - **Emotion**: observed emotion vs the primary/secondary/prohibited sets
//! - **Reasoning**: observed style and process labels vs the expected ones
//!
//! The drift magnitude is the mean of the three channel scores.

pub mod action;
pub mod activation;
pub mod deviation;
pub mod history;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use baseline::BaselineAnchorModel;

use crate::assessment::{BehaviorAssessment, BehaviorSnapshot};
use crate::config::ClassifierConfig;

pub use action::{
    classify, growth_potential, BalanceDecision, BalanceStrategy, DriftClassification,
    PreservationAction, PreservationKind,
};
pub use deviation::{ConcernLevel, EmotionalDeviation, PrincipleDeviation, ReasoningDeviation};
pub use history::{DriftHistory, DriftRecord, DriftTrend};

/// Full analysis of one turn's behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorDrift {
    pub timestamp: DateTime<Utc>,
    /// Conversation context the behavior occurred in
    pub context: String,
    pub principles: Vec<PrincipleDeviation>,
    pub emotional: EmotionalDeviation,
    pub reasoning: ReasoningDeviation,
    /// Mean of the three channel scores (0.0 - 1.0)
    pub magnitude: f64,
    pub classification: DriftClassification,
}

impl BehaviorDrift {
    /// Mean absolute principle deviation.
    pub fn principle_score(&self) -> f64 {
        mean_abs_deviation(&self.principles)
    }
}

fn mean_abs_deviation(principles: &[PrincipleDeviation]) -> f64 {
    if principles.is_empty() {
        return 0.0;
    }
    principles.iter().map(|p| p.deviation.abs()).sum::<f64>() / principles.len() as f64
}

/// Analyze a snapshot without touching any history.
pub fn analyze(model: &BaselineAnchorModel, snapshot: &BehaviorSnapshot) -> BehaviorDrift {
    let assessment = &snapshot.assessment;
    let pattern = model.emotional_pattern();
    let category = pattern.categorize(&assessment.primary_emotion);

    let principles: Vec<PrincipleDeviation> = model
        .principles()
        .iter()
        .map(|anchor| PrincipleDeviation::measure(anchor, assessment, category))
        .collect();
    let emotional = EmotionalDeviation::measure(pattern, assessment);
    let reasoning = ReasoningDeviation::measure(model.reasoning_pattern(), assessment);

    let channels = mean_abs_deviation(&principles) + emotional.score + reasoning.misalignment;
    let magnitude = (channels / 3.0).clamp(0.0, 1.0);
    let classification = classify(&principles, emotional.prohibited, magnitude);

    BehaviorDrift {
        timestamp: snapshot.timestamp,
        context: snapshot.context.clone(),
        principles,
        emotional,
        reasoning,
        magnitude,
        classification,
    }
}

/// Drift classifier with its history.
pub struct BaselineDriftClassifier {
    model: Arc<BaselineAnchorModel>,
    history: RwLock<DriftHistory>,
}

impl BaselineDriftClassifier {
    pub fn new(model: Arc<BaselineAnchorModel>, config: ClassifierConfig) -> Self {
        Self {
            model,
            history: RwLock::new(DriftHistory::new(
                config.history_capacity,
                config.cumulative_factor,
            )),
        }
    }

    /// Anchor model in use.
    pub fn model(&self) -> &BaselineAnchorModel {
        &self.model
    }

    /// Analyze an assessment and append the result to history.
    pub async fn analyze_moral_behavior(
        &self,
        assessment: &BehaviorAssessment,
        context: &str,
    ) -> BehaviorDrift {
        let snapshot = BehaviorSnapshot::new(assessment.clone(), context);
        let analysis = analyze(&self.model, &snapshot);

        let record = self.history.write().await.record(
            analysis.magnitude,
            analysis.classification,
            analysis.timestamp,
        );

        if analysis.classification == DriftClassification::CriticalDrift {
            warn!(
                magnitude = analysis.magnitude,
                emotion = %analysis.emotional.observed,
                "Critical behavior drift"
            );
        } else {
            debug!(
                magnitude = analysis.magnitude,
                classification = %analysis.classification,
                cumulative_drift = record.cumulative_drift,
                "Analyzed moral behavior"
            );
        }

        analysis
    }

    /// Preservation action for an analysis.
    pub fn generate_preservation_action(&self, analysis: &BehaviorDrift) -> PreservationAction {
        PreservationAction::for_analysis(analysis)
    }

    /// Trade off growth potential against preservation urgency.
    pub fn balance_growth_and_preservation(
        &self,
        analysis: &BehaviorDrift,
        action: &PreservationAction,
    ) -> BalanceDecision {
        BalanceDecision::decide(analysis, action)
    }

    /// Accumulated drift since construction.
    pub async fn cumulative_drift(&self) -> f64 {
        self.history.read().await.cumulative_drift()
    }

    /// Most recent records, newest first.
    pub async fn recent_history(&self, limit: usize) -> Vec<DriftRecord> {
        self.history.read().await.recent(limit)
    }

    /// Number of records held.
    pub async fn history_len(&self) -> usize {
        self.history.read().await.len()
    }

    /// Trend of the last `window` magnitudes against the window before.
    pub async fn drift_trend(&self, window: usize) -> DriftTrend {
        self.history.read().await.trend(window)
    }
}
