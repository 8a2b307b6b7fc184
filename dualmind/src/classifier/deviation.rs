//! Per-channel deviation from the baseline anchor model.

use serde::{Deserialize, Serialize};

use baseline::{EmotionCategory, EmotionalPattern, PrincipleAnchor, ReasoningPattern};

use crate::assessment::BehaviorAssessment;
use crate::classifier::activation::activation_for;

/// How worrying one principle's deviation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcernLevel {
    None,
    Moderate,
    High,
    Critical,
}

impl ConcernLevel {
    /// Level for a stability-scaled normalized deviation.
    pub fn from_scaled(scaled: f64) -> Self {
        if scaled > 2.0 {
            ConcernLevel::Critical
        } else if scaled > 1.5 {
            ConcernLevel::High
        } else if scaled > 1.0 {
            ConcernLevel::Moderate
        } else {
            ConcernLevel::None
        }
    }
}

/// Deviation of one principle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipleDeviation {
    pub domain: String,
    pub activation: f64,
    pub weight: f64,
    /// activation - weight
    pub deviation: f64,
    /// deviation / variance tolerance
    pub normalized_deviation: f64,
    pub concern: ConcernLevel,
}

impl PrincipleDeviation {
    pub fn measure(
        anchor: &PrincipleAnchor,
        assessment: &BehaviorAssessment,
        category: EmotionCategory,
    ) -> Self {
        let activation = activation_for(anchor, assessment, category);
        let deviation = activation - anchor.weight;
        let normalized_deviation = deviation / anchor.variance_tolerance;
        let scaled = if anchor.stability > 0.0 {
            normalized_deviation.abs() / anchor.stability
        } else {
            f64::INFINITY
        };

        Self {
            domain: anchor.domain.clone(),
            activation,
            weight: anchor.weight,
            deviation,
            normalized_deviation,
            concern: ConcernLevel::from_scaled(scaled),
        }
    }
}

/// Observed emotion compared with the expected pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalDeviation {
    pub observed: String,
    pub category: EmotionCategory,
    /// observed empathy - empathy baseline
    pub empathy_delta: f64,
    /// Combined score (0.0 - 1.0)
    pub score: f64,
    pub prohibited: bool,
}

impl EmotionalDeviation {
    pub fn measure(pattern: &EmotionalPattern, assessment: &BehaviorAssessment) -> Self {
        let category = pattern.categorize(&assessment.primary_emotion);
        let empathy_delta = assessment
            .empathy
            .map_or(0.0, |empathy| empathy - pattern.empathy_baseline);

        let prohibited = category == EmotionCategory::Prohibited;
        let score = if prohibited {
            1.0
        } else {
            (0.7 * category_score(category) + 0.3 * empathy_delta.abs()).min(1.0)
        };

        Self {
            observed: assessment.primary_emotion.clone(),
            category,
            empathy_delta,
            score,
            prohibited,
        }
    }
}

fn category_score(category: EmotionCategory) -> f64 {
    match category {
        EmotionCategory::Primary => 0.0,
        EmotionCategory::Secondary => 0.2,
        EmotionCategory::Unlisted => 0.5,
        EmotionCategory::Prohibited => 1.0,
    }
}

/// Observed reasoning compared with the expected labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningDeviation {
    pub style: Option<String>,
    pub process: Option<String>,
    /// 1.0 match, 0.0 miss, 0.5 unknown
    pub style_alignment: f64,
    pub process_alignment: f64,
    /// 1 - mean alignment
    pub misalignment: f64,
}

impl ReasoningDeviation {
    pub fn measure(pattern: &ReasoningPattern, assessment: &BehaviorAssessment) -> Self {
        let style_alignment = alignment(assessment.reasoning_style.as_deref(), |s| {
            pattern.accepts_style(s)
        });
        let process_alignment = alignment(assessment.reasoning_process.as_deref(), |p| {
            pattern.accepts_process(p)
        });

        Self {
            style: assessment.reasoning_style.clone(),
            process: assessment.reasoning_process.clone(),
            style_alignment,
            process_alignment,
            misalignment: 1.0 - (style_alignment + process_alignment) / 2.0,
        }
    }
}

fn alignment(label: Option<&str>, accepts: impl Fn(&str) -> bool) -> f64 {
    match label {
        Some(label) if accepts(label) => 1.0,
        Some(_) => 0.0,
        None => 0.5,
    }
}
