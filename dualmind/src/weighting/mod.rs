//! Personality weighting.
//!
//! Turns the two raw stream texts into influence weights, measures how far
//! the resulting bias sits from the stored baseline, and adapts that baseline
//! gradually when the drift is significant but not extreme.

pub mod drift;
pub mod strength;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::WeightingConfig;
use crate::persistence::BiasStore;
use crate::types::CurrentBias;

pub use drift::{AdaptDecision, AdaptReason, CognitiveDrift, DriftDirection, DriftLevel};

/// Per-turn weighting result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weighting {
    /// Valon text strength (0.0 - 1.0)
    pub valon_strength: f64,
    /// Modi text strength (0.0 - 1.0)
    pub modi_strength: f64,
    /// Confidence of the blended answer
    pub confidence: f64,
    /// Token-set similarity of the two texts
    pub similarity: f64,
    /// Weights applied to the strengths
    pub weights: CurrentBias,
    /// valon_strength * weights.valon
    pub weighted_valon_influence: f64,
    /// modi_strength * weights.modi
    pub weighted_modi_influence: f64,
    /// Influences normalized to sum to 1.0
    pub bias: CurrentBias,
}

/// Outcome of a baseline adaptation.
#[derive(Debug, Clone)]
pub struct BaselineUpdate {
    pub previous: CurrentBias,
    pub updated: CurrentBias,
    /// Set when the new baseline could not be persisted
    pub persist_warning: Option<String>,
}

/// Exponential smoothing of `baseline` toward `current`, renormalized.
///
/// Falls back to `baseline` when `current` is unusable.
pub fn smoothed_bias(baseline: CurrentBias, current: CurrentBias, rate: f64) -> CurrentBias {
    let valon = baseline.valon * (1.0 - rate) + current.valon * rate;
    let modi = baseline.modi * (1.0 - rate) + current.modi * rate;
    CurrentBias::normalized(valon, modi).unwrap_or(baseline)
}

/// Compute the weighting for a pair of texts under `bias`.
pub fn weigh(moral_text: &str, logical_text: &str, bias: CurrentBias, adaptive: bool) -> Weighting {
    if moral_text.trim().is_empty() && logical_text.trim().is_empty() {
        let neutral = strength::BASE_STRENGTH;
        return Weighting {
            valon_strength: neutral,
            modi_strength: neutral,
            confidence: neutral,
            similarity: 0.0,
            weights: CurrentBias::NEUTRAL,
            weighted_valon_influence: neutral * CurrentBias::NEUTRAL.valon,
            weighted_modi_influence: neutral * CurrentBias::NEUTRAL.modi,
            bias: CurrentBias::NEUTRAL,
        };
    }

    let valon_strength = strength::valon_strength(moral_text);
    let modi_strength = strength::modi_strength(logical_text);
    let confidence = strength::confidence_marker(logical_text)
        .unwrap_or((valon_strength + modi_strength) / 2.0);

    let similarity = strength::jaccard_similarity(moral_text, logical_text);
    let weights = if adaptive {
        CurrentBias {
            valon: bias.valon + (0.5 - bias.valon) * similarity,
            modi: bias.modi + (0.5 - bias.modi) * similarity,
        }
    } else {
        bias
    };

    let weighted_valon_influence = valon_strength * weights.valon;
    let weighted_modi_influence = modi_strength * weights.modi;
    let bias = CurrentBias::normalized(weighted_valon_influence, weighted_modi_influence)
        .unwrap_or(CurrentBias::NEUTRAL);

    Weighting {
        valon_strength,
        modi_strength,
        confidence,
        similarity,
        weights,
        weighted_valon_influence,
        weighted_modi_influence,
        bias,
    }
}

/// Owns the baseline bias and its persistence.
pub struct PersonalityWeightingEngine {
    config: WeightingConfig,
    baseline: RwLock<CurrentBias>,
    store: Option<Arc<dyn BiasStore>>,
}

impl PersonalityWeightingEngine {
    /// Create with the configured default baseline and no persistence.
    pub fn new(config: WeightingConfig) -> Self {
        let baseline = config.default_bias.validated();
        Self {
            config,
            baseline: RwLock::new(baseline),
            store: None,
        }
    }

    /// Builder: persist the baseline through `store`.
    pub fn with_store(mut self, store: Arc<dyn BiasStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the baseline with the persisted one, if any.
    ///
    /// Returns a warning when the store could not be read; the configured
    /// default stays in place.
    pub async fn load_persisted(&self) -> Option<String> {
        let store = self.store.as_ref()?;
        match store.load().await {
            Ok(Some(bias)) if bias.is_normalized() => {
                *self.baseline.write().await = bias;
                info!(baseline = %bias, "Loaded persisted baseline");
                None
            }
            Ok(Some(bias)) => {
                warn!(baseline = %bias, "Persisted baseline is not normalized, keeping default");
                Some(format!("persisted baseline {bias} is invalid"))
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to load baseline, keeping default");
                Some(format!("baseline load failed: {e}"))
            }
        }
    }

    /// Current baseline.
    pub async fn baseline(&self) -> CurrentBias {
        *self.baseline.read().await
    }

    /// Configuration in use.
    pub fn config(&self) -> &WeightingConfig {
        &self.config
    }

    /// Score both texts and blend them under the current baseline.
    pub async fn apply_personality_weighting(&self, moral_text: &str, logical_text: &str) -> Weighting {
        let bias = self.baseline().await;
        let weighting = weigh(moral_text, logical_text, bias, self.config.adaptive_weighting);

        debug!(
            valon_strength = weighting.valon_strength,
            modi_strength = weighting.modi_strength,
            similarity = weighting.similarity,
            valon_bias = weighting.bias.valon,
            modi_bias = weighting.bias.modi,
            "Applied personality weighting"
        );

        weighting
    }

    /// Compare `current` with the baseline.
    pub async fn measure_cognitive_drift(&self, current: CurrentBias) -> CognitiveDrift {
        let drift = CognitiveDrift::measure(
            self.baseline().await,
            current,
            self.config.effective_tolerance(),
        );

        debug!(
            total_drift = drift.total_drift,
            level = %drift.level,
            direction = %drift.direction,
            "Measured cognitive drift"
        );

        drift
    }

    /// Decide whether a drift warrants moving the baseline.
    pub fn should_adapt_baseline(&self, drift: &CognitiveDrift) -> AdaptDecision {
        AdaptDecision::for_drift(drift)
    }

    /// Smooth the baseline toward `current` and persist it.
    pub async fn adapt_baseline(&self, current: CurrentBias) -> BaselineUpdate {
        let rate = self.config.effective_rate();
        let (previous, updated) = {
            let mut baseline = self.baseline.write().await;
            let previous = *baseline;
            *baseline = smoothed_bias(previous, current, rate);
            (previous, *baseline)
        };

        debug_assert!(updated.is_normalized(), "baseline lost normalization: {updated}");
        info!(from = %previous, to = %updated, rate, "Adapted personality baseline");

        let persist_warning = match &self.store {
            Some(store) => match store.save(updated).await {
                Ok(()) => None,
                Err(e) => {
                    warn!(error = %e, "Failed to persist adapted baseline");
                    Some(format!("baseline save failed: {e}"))
                }
            },
            None => None,
        };

        BaselineUpdate {
            previous,
            updated,
            persist_warning,
        }
    }
}

impl Default for PersonalityWeightingEngine {
    fn default() -> Self {
        Self::new(WeightingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BiasRatios;
    use crate::persistence::InMemoryStore;

    #[tokio::test]
    async fn test_moral_clarity_weighting() {
        let engine = PersonalityWeightingEngine::default();
        let weighting = engine
            .apply_personality_weighting(
                "I feel strong moral clarity about this",
                "technical, high_confidence, advanced",
            )
            .await;

        assert!(weighting.valon_strength >= 0.8);
        assert!(weighting.modi_strength >= 0.8);
        assert!(weighting.confidence >= 0.8);
        assert!(weighting.bias.is_normalized());
    }

    #[tokio::test]
    async fn test_blank_streams_are_neutral() {
        let engine = PersonalityWeightingEngine::default();
        let weighting = engine.apply_personality_weighting("", "  ").await;

        assert_eq!(weighting.valon_strength, 0.5);
        assert_eq!(weighting.modi_strength, 0.5);
        assert_eq!(weighting.bias, CurrentBias::NEUTRAL);
    }

    #[test]
    fn test_fixed_weighting_uses_baseline() {
        let weighting = weigh("same words", "same words", CurrentBias::DEFAULT, false);
        assert_eq!(weighting.weights, CurrentBias::DEFAULT);
        assert!((weighting.bias.valon - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_adaptive_pull_toward_even() {
        // identical token sets: similarity 1.0, weights fully even
        let weighting = weigh("same words", "same words", CurrentBias::DEFAULT, true);
        assert_eq!(weighting.similarity, 1.0);
        assert!((weighting.weights.valon - 0.5).abs() < 1e-12);
        assert!((weighting.weights.modi - 0.5).abs() < 1e-12);

        // disjoint texts keep the baseline
        let weighting = weigh("kindness", "throughput", CurrentBias::DEFAULT, true);
        assert_eq!(weighting.weights, CurrentBias::DEFAULT);
    }

    #[test]
    fn test_confidence_falls_back_to_mean() {
        let weighting = weigh("a moral view", "plain answer", CurrentBias::DEFAULT, false);
        assert!((weighting.confidence - (0.8 + 0.5) / 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_malformed_default_bias() {
        let engine = PersonalityWeightingEngine::new(WeightingConfig {
            default_bias: BiasRatios { valon: f64::NAN, modi: 0.3 },
            ..Default::default()
        });
        assert_eq!(engine.baseline().await, CurrentBias::DEFAULT);
    }

    #[tokio::test]
    async fn test_drift_and_adaptation() {
        let store = Arc::new(InMemoryStore::new());
        let engine = PersonalityWeightingEngine::default().with_store(store.clone());

        let drift = engine.measure_cognitive_drift(CurrentBias::NEUTRAL).await;
        assert!((drift.total_drift - 0.4).abs() < 1e-9);
        assert_eq!(drift.level, DriftLevel::Significant);

        let decision = engine.should_adapt_baseline(&drift);
        assert!(decision.adapt);

        let update = engine.adapt_baseline(CurrentBias::NEUTRAL).await;
        assert!((update.updated.valon - 0.68).abs() < 1e-9);
        assert!((update.updated.modi - 0.32).abs() < 1e-9);
        assert!(update.updated.is_normalized());
        assert!(update.persist_warning.is_none());
        assert_eq!(store.saved_bias().await, Some(update.updated));
        assert_eq!(engine.baseline().await, update.updated);
    }

    #[tokio::test]
    async fn test_persist_failure_is_warning() {
        let store = Arc::new(InMemoryStore::new());
        store.set_failing(true);
        let engine = PersonalityWeightingEngine::default().with_store(store.clone());

        let update = engine.adapt_baseline(CurrentBias::NEUTRAL).await;
        assert!(update.persist_warning.is_some());
        assert_eq!(engine.baseline().await, update.updated);
    }

    #[tokio::test]
    async fn test_load_persisted_baseline() {
        let store = Arc::new(InMemoryStore::with_bias(CurrentBias::NEUTRAL));
        let engine = PersonalityWeightingEngine::default().with_store(store);

        assert!(engine.load_persisted().await.is_none());
        assert_eq!(engine.baseline().await, CurrentBias::NEUTRAL);

        let invalid = Arc::new(InMemoryStore::with_bias(CurrentBias { valon: 0.9, modi: 0.9 }));
        let engine = PersonalityWeightingEngine::default().with_store(invalid);
        assert!(engine.load_persisted().await.is_some());
        assert_eq!(engine.baseline().await, CurrentBias::DEFAULT);
    }

    #[test]
    fn test_smoothing_ignores_unusable_current() {
        let bias = smoothed_bias(CurrentBias::DEFAULT, CurrentBias { valon: f64::NAN, modi: 0.5 }, 0.1);
        assert_eq!(bias, CurrentBias::DEFAULT);
    }
}
