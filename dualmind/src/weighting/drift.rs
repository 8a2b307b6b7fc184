//! Cognitive drift between a measured bias and the stored baseline.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{CurrentBias, BIAS_EPSILON};

/// How far the measured bias sits from baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftLevel {
    /// At most half the tolerance
    Minimal,
    /// Above half the tolerance
    Moderate,
    /// Above the tolerance
    Significant,
}

impl DriftLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftLevel::Minimal => "minimal",
            DriftLevel::Moderate => "moderate",
            DriftLevel::Significant => "significant",
        }
    }
}

impl fmt::Display for DriftLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dominant stream movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftDirection {
    MoreEmotional,
    LessEmotional,
    MoreLogical,
    LessLogical,
    /// No movement at all
    Stable,
}

impl DriftDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftDirection::MoreEmotional => "more_emotional",
            DriftDirection::LessEmotional => "less_emotional",
            DriftDirection::MoreLogical => "more_logical",
            DriftDirection::LessLogical => "less_logical",
            DriftDirection::Stable => "stable",
        }
    }
}

impl fmt::Display for DriftDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of comparing a bias with the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveDrift {
    /// current.valon - baseline.valon
    pub valon_drift: f64,
    /// current.modi - baseline.modi
    pub modi_drift: f64,
    /// Sum of absolute deltas
    pub total_drift: f64,
    pub level: DriftLevel,
    pub direction: DriftDirection,
    /// total_drift > tolerance
    pub exceeds_tolerance: bool,
    /// Tolerance used for the comparison
    pub tolerance: f64,
    /// Baseline at measurement time
    pub baseline: CurrentBias,
    /// Measured bias
    pub current: CurrentBias,
}

impl CognitiveDrift {
    /// Compare `current` with `baseline` under `tolerance`.
    pub fn measure(baseline: CurrentBias, current: CurrentBias, tolerance: f64) -> Self {
        let valon_drift = current.valon - baseline.valon;
        let modi_drift = current.modi - baseline.modi;
        let total_drift = valon_drift.abs() + modi_drift.abs();

        let level = if total_drift > tolerance {
            DriftLevel::Significant
        } else if total_drift > tolerance / 2.0 {
            DriftLevel::Moderate
        } else {
            DriftLevel::Minimal
        };

        // Valon wins ties, including float noise around a tie
        let direction = if total_drift <= BIAS_EPSILON {
            DriftDirection::Stable
        } else if valon_drift.abs() + BIAS_EPSILON >= modi_drift.abs() {
            if valon_drift > 0.0 {
                DriftDirection::MoreEmotional
            } else {
                DriftDirection::LessEmotional
            }
        } else if modi_drift > 0.0 {
            DriftDirection::MoreLogical
        } else {
            DriftDirection::LessLogical
        };

        Self {
            valon_drift,
            modi_drift,
            total_drift,
            level,
            direction,
            exceeds_tolerance: total_drift > tolerance,
            tolerance,
            baseline,
            current,
        }
    }
}

/// Why the baseline was or was not adapted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptReason {
    GradualPersonalityEvolution,
    DriftTooExtremeInvestigate,
    NoAdaptationNeeded,
}

impl AdaptReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdaptReason::GradualPersonalityEvolution => "gradual_personality_evolution",
            AdaptReason::DriftTooExtremeInvestigate => "drift_too_extreme_investigate",
            AdaptReason::NoAdaptationNeeded => "no_adaptation_needed",
        }
    }
}

/// Whether to move the baseline toward the measured bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptDecision {
    pub adapt: bool,
    pub reason: AdaptReason,
}

impl AdaptDecision {
    /// Significant drift below twice the tolerance adapts; at or beyond twice
    /// the tolerance the drift is flagged for investigation instead.
    pub fn for_drift(drift: &CognitiveDrift) -> Self {
        let ceiling = drift.tolerance * 2.0;
        if drift.total_drift >= ceiling {
            Self {
                adapt: false,
                reason: AdaptReason::DriftTooExtremeInvestigate,
            }
        } else if drift.level == DriftLevel::Significant {
            Self {
                adapt: true,
                reason: AdaptReason::GradualPersonalityEvolution,
            }
        } else {
            Self {
                adapt: false,
                reason: AdaptReason::NoAdaptationNeeded,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_bias_against_default_is_significant() {
        let drift = CognitiveDrift::measure(CurrentBias::DEFAULT, CurrentBias::NEUTRAL, 0.3);

        assert!((drift.total_drift - 0.4).abs() < 1e-9);
        assert_eq!(drift.level, DriftLevel::Significant);
        assert!(drift.exceeds_tolerance);
        assert_eq!(drift.direction, DriftDirection::LessEmotional);
    }

    #[test]
    fn test_levels() {
        let baseline = CurrentBias::DEFAULT;
        let moderate = CognitiveDrift::measure(baseline, CurrentBias { valon: 0.6, modi: 0.4 }, 0.3);
        assert_eq!(moderate.level, DriftLevel::Moderate);

        let minimal = CognitiveDrift::measure(baseline, CurrentBias { valon: 0.66, modi: 0.34 }, 0.3);
        assert_eq!(minimal.level, DriftLevel::Minimal);
        assert!(!minimal.exceeds_tolerance);
    }

    #[test]
    fn test_stable_direction() {
        let drift = CognitiveDrift::measure(CurrentBias::DEFAULT, CurrentBias::DEFAULT, 0.3);
        assert_eq!(drift.direction, DriftDirection::Stable);
        assert_eq!(drift.level, DriftLevel::Minimal);

        let noisy = CurrentBias {
            valon: 0.7 + 1e-12,
            modi: 0.3 - 1e-12,
        };
        let drift = CognitiveDrift::measure(CurrentBias::DEFAULT, noisy, 0.3);
        assert!(drift.total_drift > 0.0);
        assert_eq!(drift.direction, DriftDirection::Stable);
    }

    #[test]
    fn test_logical_direction() {
        let drift = CognitiveDrift::measure(
            CurrentBias { valon: 0.5, modi: 0.5 },
            CurrentBias { valon: 0.5, modi: 0.7 },
            0.3,
        );
        assert_eq!(drift.direction, DriftDirection::MoreLogical);
    }

    #[test]
    fn test_adapt_decisions() {
        let significant = CognitiveDrift::measure(CurrentBias::DEFAULT, CurrentBias::NEUTRAL, 0.3);
        let decision = AdaptDecision::for_drift(&significant);
        assert!(decision.adapt);
        assert_eq!(decision.reason, AdaptReason::GradualPersonalityEvolution);

        let extreme = CognitiveDrift::measure(
            CurrentBias::DEFAULT,
            CurrentBias { valon: 0.3, modi: 0.7 },
            0.3,
        );
        let decision = AdaptDecision::for_drift(&extreme);
        assert!(!decision.adapt);
        assert_eq!(decision.reason, AdaptReason::DriftTooExtremeInvestigate);

        let calm = CognitiveDrift::measure(CurrentBias::DEFAULT, CurrentBias::DEFAULT, 0.3);
        assert_eq!(
            AdaptDecision::for_drift(&calm).reason,
            AdaptReason::NoAdaptationNeeded
        );
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(
            serde_json::to_string(&DriftLevel::Significant).unwrap(),
            "\"significant\""
        );
        assert_eq!(
            serde_json::to_string(&DriftDirection::MoreEmotional).unwrap(),
            "\"more_emotional\""
        );
        assert_eq!(
            AdaptReason::DriftTooExtremeInvestigate.as_str(),
            "drift_too_extreme_investigate"
        );
    }
}
