//! Drift classification, preservation actions and the growth/preservation
//! balance.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

use crate::classifier::deviation::{ConcernLevel, PrincipleDeviation};
use crate::classifier::BehaviorDrift;

/// Overall drift class, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftClassification {
    NormalVariation,
    MoralGrowth,
    FrameworkDrift,
    MoralDegradation,
    CriticalDrift,
}

impl DriftClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftClassification::NormalVariation => "normal_variation",
            DriftClassification::MoralGrowth => "moral_growth",
            DriftClassification::FrameworkDrift => "framework_drift",
            DriftClassification::MoralDegradation => "moral_degradation",
            DriftClassification::CriticalDrift => "critical_drift",
        }
    }

    /// Severity rank, 0 for normal variation.
    pub fn severity(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for DriftClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a turn. First matching rule wins:
///
/// 1. any critical principle or a prohibited emotion
/// 2. magnitude above 0.8 with a principle below -0.5 normalized deviation
/// 3. magnitude in (0.3, 0.7) with a principle in (0.2, 0.8)
/// 4. magnitude above 0.5
pub fn classify(
    principles: &[PrincipleDeviation],
    prohibited_emotion: bool,
    magnitude: f64,
) -> DriftClassification {
    if prohibited_emotion || principles.iter().any(|p| p.concern == ConcernLevel::Critical) {
        DriftClassification::CriticalDrift
    } else if magnitude > 0.8 && principles.iter().any(|p| p.normalized_deviation < -0.5) {
        DriftClassification::MoralDegradation
    } else if magnitude > 0.3
        && magnitude < 0.7
        && principles
            .iter()
            .any(|p| p.normalized_deviation > 0.2 && p.normalized_deviation < 0.8)
    {
        DriftClassification::MoralGrowth
    } else if magnitude > 0.5 {
        DriftClassification::FrameworkDrift
    } else {
        DriftClassification::NormalVariation
    }
}

/// Kind of corrective (or permissive) action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreservationKind {
    ImmediateCorrection,
    GradualRestoration,
    FrameworkRealignment,
    GuidedGrowth,
    Monitoring,
}

impl PreservationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreservationKind::ImmediateCorrection => "immediate_correction",
            PreservationKind::GradualRestoration => "gradual_restoration",
            PreservationKind::FrameworkRealignment => "framework_realignment",
            PreservationKind::GuidedGrowth => "guided_growth",
            PreservationKind::Monitoring => "monitoring",
        }
    }
}

/// Action handed to the response-synthesis layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreservationAction {
    pub kind: PreservationKind,
    /// Correction strength (rate for gradual restoration)
    pub strength: f64,
    pub rationale: String,
    pub parameters: BTreeMap<String, serde_json::Value>,
}

impl PreservationAction {
    /// Action for an analyzed turn.
    pub fn for_analysis(analysis: &BehaviorDrift) -> Self {
        let magnitude = analysis.magnitude;
        let mut parameters = BTreeMap::new();
        parameters.insert("magnitude".to_string(), json!(magnitude));

        let (kind, strength, rationale) = match analysis.classification {
            DriftClassification::CriticalDrift => {
                let domains = domains_where(&analysis.principles, |p| {
                    p.concern == ConcernLevel::Critical
                });
                parameters.insert("target_domains".to_string(), json!(&domains));
                parameters.insert(
                    "prohibited_emotion".to_string(),
                    json!(analysis.emotional.prohibited),
                );
                let rationale = if analysis.emotional.prohibited {
                    format!(
                        "Prohibited emotion '{}' expressed; restore baseline immediately",
                        analysis.emotional.observed
                    )
                } else {
                    format!(
                        "Critical deviation in {}; restore baseline immediately",
                        domains.join(", ")
                    )
                };
                (PreservationKind::ImmediateCorrection, 1.0, rationale)
            }
            DriftClassification::MoralDegradation => {
                let domains = domains_where(&analysis.principles, |p| p.normalized_deviation < -0.5);
                parameters.insert("restoration_rate".to_string(), json!(0.3));
                parameters.insert("degraded_domains".to_string(), json!(&domains));
                (
                    PreservationKind::GradualRestoration,
                    0.3,
                    format!("Principles weakening ({}); restore gradually", domains.join(", ")),
                )
            }
            DriftClassification::FrameworkDrift => {
                let strength = (0.5 * magnitude).min(0.4);
                parameters.insert("realignment_strength".to_string(), json!(strength));
                (
                    PreservationKind::FrameworkRealignment,
                    strength,
                    format!("Overall drift {magnitude:.2} away from the framework; realign"),
                )
            }
            DriftClassification::MoralGrowth => {
                let domains = domains_where(&analysis.principles, |p| {
                    p.normalized_deviation > 0.2 && p.normalized_deviation < 0.8
                });
                parameters.insert("growth_domains".to_string(), json!(&domains));
                (
                    PreservationKind::GuidedGrowth,
                    0.2,
                    format!("Healthy strengthening in {}; guide the growth", domains.join(", ")),
                )
            }
            DriftClassification::NormalVariation => (
                PreservationKind::Monitoring,
                0.0,
                "Behavior within normal variation; keep monitoring".to_string(),
            ),
        };

        parameters.insert("strength".to_string(), json!(strength));

        Self {
            kind,
            strength,
            rationale,
            parameters,
        }
    }
}

fn domains_where(
    principles: &[PrincipleDeviation],
    predicate: impl Fn(&PrincipleDeviation) -> bool,
) -> Vec<String> {
    principles
        .iter()
        .filter(|p| predicate(p))
        .map(|p| p.domain.clone())
        .collect()
}

/// How growth and preservation were traded off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStrategy {
    PreserveFramework,
    GuidedGrowth,
    MonitorAndMaintain,
}

impl BalanceStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceStrategy::PreserveFramework => "preserve_framework",
            BalanceStrategy::GuidedGrowth => "guided_growth",
            BalanceStrategy::MonitorAndMaintain => "monitor_and_maintain",
        }
    }
}

/// Growth suppression applied when preservation is forced.
pub const PRESERVE_SUPPRESSION: f64 = 0.8;

/// Result of weighing growth potential against preservation urgency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceDecision {
    pub strategy: BalanceStrategy,
    /// Equal to the drift magnitude
    pub preservation_urgency: f64,
    pub growth_potential: f64,
    /// Share of the growth potential that may be expressed
    pub growth_allowance: f64,
    pub growth_suppression: f64,
    /// Action the decision was made alongside
    pub action: PreservationKind,
}

impl BalanceDecision {
    /// Urgency always beats growth.
    pub fn decide(analysis: &BehaviorDrift, action: &PreservationAction) -> Self {
        let urgency = analysis.magnitude;
        let potential = growth_potential(analysis);

        let (strategy, allowance, suppression) = if urgency >= 0.8 {
            (
                BalanceStrategy::PreserveFramework,
                potential * (1.0 - PRESERVE_SUPPRESSION),
                PRESERVE_SUPPRESSION,
            )
        } else if potential > 0.6 && urgency < 0.4 {
            (BalanceStrategy::GuidedGrowth, (0.7 * potential).min(0.5), 0.0)
        } else {
            (BalanceStrategy::MonitorAndMaintain, 0.3 * potential, 0.0)
        };

        Self {
            strategy,
            preservation_urgency: urgency,
            growth_potential: potential,
            growth_allowance: allowance,
            growth_suppression: suppression,
            action: action.kind,
        }
    }
}

/// Largest positive normalized deviation (capped at 1), discounted by the
/// emotional deviation score.
pub fn growth_potential(analysis: &BehaviorDrift) -> f64 {
    let strongest = analysis
        .principles
        .iter()
        .map(|p| p.normalized_deviation)
        .filter(|d| *d > 0.0)
        .fold(0.0_f64, f64::max)
        .min(1.0);
    strongest * (1.0 - analysis.emotional.score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principle(normalized: f64, concern: ConcernLevel) -> PrincipleDeviation {
        PrincipleDeviation {
            domain: "growth".to_string(),
            activation: 0.0,
            weight: 0.0,
            deviation: normalized * 0.3,
            normalized_deviation: normalized,
            concern,
        }
    }

    #[test]
    fn test_priority_order() {
        let critical = [principle(3.0, ConcernLevel::Critical)];
        assert_eq!(classify(&critical, false, 0.1), DriftClassification::CriticalDrift);
        assert_eq!(classify(&[], true, 0.0), DriftClassification::CriticalDrift);

        let weakened = [principle(-0.9, ConcernLevel::None)];
        assert_eq!(classify(&weakened, false, 0.85), DriftClassification::MoralDegradation);
        assert_eq!(classify(&weakened, false, 0.6), DriftClassification::FrameworkDrift);
        assert_eq!(classify(&weakened, false, 0.2), DriftClassification::NormalVariation);

        let growing = [principle(0.5, ConcernLevel::None)];
        assert_eq!(classify(&growing, false, 0.6), DriftClassification::MoralGrowth);
        assert_eq!(classify(&growing, false, 0.75), DriftClassification::FrameworkDrift);
        assert_eq!(classify(&growing, false, 0.3), DriftClassification::NormalVariation);
    }

    #[test]
    fn test_severity_order() {
        assert!(DriftClassification::CriticalDrift > DriftClassification::MoralDegradation);
        assert!(DriftClassification::FrameworkDrift > DriftClassification::MoralGrowth);
        assert_eq!(DriftClassification::NormalVariation.severity(), 0);
        assert_eq!(
            serde_json::to_string(&DriftClassification::MoralGrowth).unwrap(),
            "\"moral_growth\""
        );
    }
}
