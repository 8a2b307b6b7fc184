//! Structured behavior assessments of the Valon stream.
//!
//! The assessment normally comes back from the text generator as a JSON
//! object. Anything that does not parse falls back to a keyword scan of the
//! raw text against the baseline's emotion vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use baseline::BaselineAnchorModel;

use crate::weighting::strength::tokens;

/// Label used when no emotion can be identified.
pub const NEUTRAL_EMOTION: &str = "neutral";

const CONCERN_TERMS: &[&str] = &[
    "harm", "danger", "safety", "risk", "violence", "abuse", "deception", "lie", "lying",
    "mislead", "truth", "trust", "unfair", "bias", "discrimination", "justice", "consent",
    "privacy", "freedom", "coercion", "suffering", "pain", "wellbeing", "learning", "growth",
];

const URGENCY_TERMS: &[&str] = &[
    "urgent", "urgently", "immediately", "emergency", "now", "critical", "crisis", "danger",
];

/// Signals extracted from one Valon response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorAssessment {
    /// Dominant emotion label (lowercase)
    pub primary_emotion: String,
    /// Concern keywords (lowercase)
    #[serde(default)]
    pub concerns: Vec<String>,
    /// Urgency (0.0 - 1.0)
    #[serde(default)]
    pub urgency: f64,
    /// One-line guidance
    #[serde(default)]
    pub guidance: String,
    /// Observed reasoning style label
    #[serde(default)]
    pub reasoning_style: Option<String>,
    /// Observed reasoning process label
    #[serde(default)]
    pub reasoning_process: Option<String>,
    /// Observed empathy (0.0 - 1.0), baseline assumed when absent
    #[serde(default)]
    pub empathy: Option<f64>,
}

impl BehaviorAssessment {
    /// Create an assessment with only an emotion.
    pub fn new(primary_emotion: impl Into<String>) -> Self {
        Self {
            primary_emotion: primary_emotion.into(),
            concerns: Vec::new(),
            urgency: 0.0,
            guidance: String::new(),
            reasoning_style: None,
            reasoning_process: None,
            empathy: None,
        }
        .sanitized()
    }

    /// Builder: concern keywords.
    pub fn with_concerns<I, S>(mut self, concerns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.concerns = concerns.into_iter().map(Into::into).collect();
        self.sanitized()
    }

    /// Builder: urgency.
    pub fn with_urgency(mut self, urgency: f64) -> Self {
        self.urgency = urgency;
        self.sanitized()
    }

    /// Builder: guidance text.
    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = guidance.into();
        self
    }

    /// Builder: observed reasoning labels.
    pub fn with_reasoning(mut self, style: impl Into<String>, process: impl Into<String>) -> Self {
        self.reasoning_style = Some(style.into());
        self.reasoning_process = Some(process.into());
        self.sanitized()
    }

    /// Builder: observed empathy.
    pub fn with_empathy(mut self, empathy: f64) -> Self {
        self.empathy = Some(empathy);
        self.sanitized()
    }

    /// Parse a JSON assessment. Accepts the object wrapped in prose or a
    /// code fence.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let body = match (raw.find('{'), raw.rfind('}')) {
            (Some(start), Some(end)) if start < end => &raw[start..=end],
            _ => raw,
        };
        serde_json::from_str::<Self>(body).map(Self::sanitized)
    }

    /// Parse `raw` as JSON, falling back to a keyword scan of `fallback_text`.
    pub fn parse_or_infer(raw: &str, fallback_text: &str, model: &BaselineAnchorModel) -> Self {
        match Self::from_json(raw) {
            Ok(assessment) => assessment,
            Err(e) => {
                debug!(error = %e, "Assessment is not valid JSON, inferring from text");
                Self::infer(fallback_text, model)
            }
        }
    }

    /// Keyword scan of a Valon response.
    ///
    /// The emotion is the first baseline emotion present, checking prohibited
    /// emotions before primary and secondary ones.
    pub fn infer(text: &str, model: &BaselineAnchorModel) -> Self {
        let words = tokens(text);
        let pattern = model.emotional_pattern();

        let primary_emotion = pattern
            .prohibited
            .iter()
            .chain(pattern.primary.iter())
            .chain(pattern.secondary.iter())
            .find(|emotion| words.contains(&emotion.to_lowercase()))
            .cloned()
            .unwrap_or_else(|| NEUTRAL_EMOTION.to_string());

        let concerns: Vec<String> = CONCERN_TERMS
            .iter()
            .filter(|term| words.contains(**term))
            .map(|term| term.to_string())
            .collect();

        let urgent_hits = URGENCY_TERMS.iter().filter(|t| words.contains(**t)).count();
        let urgency = 0.2 + 0.2 * urgent_hits as f64;

        let guidance = text
            .split(['.', '!', '?', '\n'])
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string();

        Self {
            primary_emotion,
            concerns,
            urgency,
            guidance,
            reasoning_style: None,
            reasoning_process: None,
            empathy: None,
        }
        .sanitized()
    }

    fn sanitized(mut self) -> Self {
        self.primary_emotion = self.primary_emotion.trim().to_lowercase();
        if self.primary_emotion.is_empty() {
            self.primary_emotion = NEUTRAL_EMOTION.to_string();
        }
        self.concerns = self
            .concerns
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        self.urgency = unit_or(self.urgency, 0.0);
        self.empathy = self.empathy.filter(|e| e.is_finite()).map(|e| e.clamp(0.0, 1.0));
        self.reasoning_style = normalize_label(self.reasoning_style.take());
        self.reasoning_process = normalize_label(self.reasoning_process.take());
        self
    }
}

fn normalize_label(label: Option<String>) -> Option<String> {
    label
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
}

fn unit_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

/// An assessment together with the context it was made in.
#[derive(Debug, Clone)]
pub struct BehaviorSnapshot {
    pub assessment: BehaviorAssessment,
    pub context: String,
    pub timestamp: DateTime<Utc>,
}

impl BehaviorSnapshot {
    /// Snapshot taken now.
    pub fn new(assessment: BehaviorAssessment, context: impl Into<String>) -> Self {
        Self {
            assessment,
            context: context.into(),
            timestamp: Utc::now(),
        }
    }
}
