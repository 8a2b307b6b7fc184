//! Core types for the baseline anchor model.
//!
//! A baseline is a fixed reference personality: named principles with a
//! weight, a stability factor and a variance tolerance, plus the emotional
//! and reasoning patterns the assistant is expected to show.
//!
//! With the `typescript` feature enabled, these types can be exported to TypeScript
//! using ts-rs for the UI layer that renders drift reports.

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Error types for baseline loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum BaselineError {
    /// Model definition could not be parsed
    #[error("Failed to parse baseline definition: {0}")]
    Parse(String),

    /// A principle has an empty or repeated domain
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    /// A numeric field is outside its allowed range
    #[error("Principle '{domain}' has {field} = {value}, expected {expected}")]
    OutOfRange {
        domain: String,
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// The model has no principles at all
    #[error("Baseline model has no principles")]
    Empty,
}

/// One immutable principle of the baseline personality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct PrincipleAnchor {
    /// Domain key, unique within a model
    pub domain: String,
    /// Expected activation of the principle (0.0-1.0)
    pub weight: f64,
    /// How firmly the principle resists change (0.0-1.0)
    pub stability: f64,
    /// Deviation that counts as one unit of normalized drift (0.0 exclusive - 1.0)
    pub variance_tolerance: f64,
    /// Human-readable description
    pub description: String,
}

impl PrincipleAnchor {
    /// Create a new anchor.
    pub fn new(
        domain: impl Into<String>,
        weight: f64,
        stability: f64,
        variance_tolerance: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            weight,
            stability,
            variance_tolerance,
            description: description.into(),
        }
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<(), BaselineError> {
        if self.domain.trim().is_empty() {
            return Err(BaselineError::InvalidDomain("empty domain".to_string()));
        }

        check_unit(&self.domain, "weight", self.weight)?;
        check_unit(&self.domain, "stability", self.stability)?;

        if !(self.variance_tolerance > 0.0 && self.variance_tolerance <= 1.0) {
            return Err(BaselineError::OutOfRange {
                domain: self.domain.clone(),
                field: "variance_tolerance",
                value: self.variance_tolerance,
                expected: "(0, 1]",
            });
        }

        Ok(())
    }
}

fn check_unit(domain: &str, field: &'static str, value: f64) -> Result<(), BaselineError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(BaselineError::OutOfRange {
            domain: domain.to_string(),
            field,
            value,
            expected: "[0, 1]",
        })
    }
}

/// Expected emotional behavior of the baseline personality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct EmotionalPattern {
    /// Emotions the assistant should usually lead with
    pub primary: Vec<String>,
    /// Emotions that are acceptable but less characteristic
    pub secondary: Vec<String>,
    /// Emotions the assistant must never express
    pub prohibited: Vec<String>,
    /// Expected empathy level (0.0-1.0)
    pub empathy_baseline: f64,
    /// Target emotional stability (0.0-1.0)
    pub stability_target: f64,
}

impl EmotionalPattern {
    /// Classify an observed emotion label against the pattern.
    pub fn categorize(&self, emotion: &str) -> EmotionCategory {
        let emotion = emotion.trim().to_lowercase();
        let contains = |set: &[String]| set.iter().any(|e| e.eq_ignore_ascii_case(&emotion));

        if contains(&self.prohibited) {
            EmotionCategory::Prohibited
        } else if contains(&self.primary) {
            EmotionCategory::Primary
        } else if contains(&self.secondary) {
            EmotionCategory::Secondary
        } else {
            EmotionCategory::Unlisted
        }
    }
}

/// Where an observed emotion falls in the [`EmotionalPattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum EmotionCategory {
    Primary,
    Secondary,
    Unlisted,
    Prohibited,
}

/// Expected reasoning behavior of the baseline personality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ReasoningPattern {
    /// Accepted reasoning style labels
    pub expected_styles: Vec<String>,
    /// Accepted reasoning process labels
    pub expected_processes: Vec<String>,
}

impl ReasoningPattern {
    /// Exact-match check for a style label.
    pub fn accepts_style(&self, style: &str) -> bool {
        self.expected_styles.iter().any(|s| s.eq_ignore_ascii_case(style.trim()))
    }

    /// Exact-match check for a process label.
    pub fn accepts_process(&self, process: &str) -> bool {
        self.expected_processes
            .iter()
            .any(|p| p.eq_ignore_ascii_case(process.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_validation() {
        let anchor = PrincipleAnchor::new("honesty", 0.8, 0.9, 0.2, "Tell the truth");
        assert!(anchor.validate().is_ok());

        let bad_tolerance = PrincipleAnchor::new("honesty", 0.8, 0.9, 0.0, "");
        assert!(matches!(
            bad_tolerance.validate(),
            Err(BaselineError::OutOfRange { field: "variance_tolerance", .. })
        ));

        let bad_weight = PrincipleAnchor::new("honesty", 1.2, 0.9, 0.2, "");
        assert!(bad_weight.validate().is_err());

        let blank = PrincipleAnchor::new("  ", 0.5, 0.5, 0.5, "");
        assert!(matches!(blank.validate(), Err(BaselineError::InvalidDomain(_))));
    }

    #[test]
    fn test_emotion_categories() {
        let pattern = EmotionalPattern {
            primary: vec!["compassion".to_string()],
            secondary: vec!["curiosity".to_string()],
            prohibited: vec!["contempt".to_string()],
            empathy_baseline: 0.8,
            stability_target: 0.85,
        };

        assert_eq!(pattern.categorize("Compassion"), EmotionCategory::Primary);
        assert_eq!(pattern.categorize("curiosity"), EmotionCategory::Secondary);
        assert_eq!(pattern.categorize(" contempt "), EmotionCategory::Prohibited);
        assert_eq!(pattern.categorize("boredom"), EmotionCategory::Unlisted);
    }
}
