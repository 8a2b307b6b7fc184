//! Principle activation rules.
//!
//! Each known domain has a fixed rule turning an assessment into an
//! activation score: a base value plus additive bonuses for the emotion
//! category, matching concern keywords and high urgency, capped at 1.0.

use baseline::{EmotionCategory, PrincipleAnchor};

use crate::assessment::BehaviorAssessment;
use crate::weighting::strength::tokens;

/// Fixed feature rule for one principle domain.
#[derive(Debug, Clone, Copy)]
pub struct ActivationRule {
    pub base: f64,
    /// Bonus when the emotion is a primary baseline emotion
    pub primary_bonus: f64,
    /// Bonus when the emotion is a secondary baseline emotion
    pub secondary_bonus: f64,
    pub concern_keywords: &'static [&'static str],
    /// Bonus per concern matching a keyword
    pub concern_bonus: f64,
    pub urgency_threshold: f64,
    pub urgency_bonus: f64,
}

const COMPASSION: ActivationRule = ActivationRule {
    base: 0.6,
    primary_bonus: 0.25,
    secondary_bonus: 0.1,
    concern_keywords: &["suffering", "wellbeing", "pain", "loneliness", "grief", "kindness", "care"],
    concern_bonus: 0.1,
    urgency_threshold: 0.7,
    urgency_bonus: 0.05,
};

const HONESTY: ActivationRule = ActivationRule {
    base: 0.7,
    primary_bonus: 0.1,
    secondary_bonus: 0.0,
    concern_keywords: &["truth", "honesty", "transparency", "deception", "lie", "lying", "mislead", "trust"],
    concern_bonus: 0.1,
    urgency_threshold: 0.8,
    urgency_bonus: 0.05,
};

const HARM_PREVENTION: ActivationRule = ActivationRule {
    base: 0.65,
    primary_bonus: 0.1,
    secondary_bonus: 0.05,
    concern_keywords: &["harm", "danger", "safety", "risk", "injury", "violence", "abuse", "self_harm"],
    concern_bonus: 0.15,
    urgency_threshold: 0.6,
    urgency_bonus: 0.15,
};

const FAIRNESS: ActivationRule = ActivationRule {
    base: 0.6,
    primary_bonus: 0.1,
    secondary_bonus: 0.0,
    concern_keywords: &["fairness", "unfair", "bias", "discrimination", "equality", "equity", "justice"],
    concern_bonus: 0.1,
    urgency_threshold: 1.0,
    urgency_bonus: 0.0,
};

const AUTONOMY: ActivationRule = ActivationRule {
    base: 0.55,
    primary_bonus: 0.1,
    secondary_bonus: 0.1,
    concern_keywords: &["consent", "choice", "freedom", "autonomy", "privacy", "control", "coercion"],
    concern_bonus: 0.1,
    urgency_threshold: 1.0,
    urgency_bonus: 0.0,
};

const GROWTH: ActivationRule = ActivationRule {
    base: 0.45,
    primary_bonus: 0.05,
    secondary_bonus: 0.1,
    concern_keywords: &["learning", "growth", "improvement", "development", "curiosity", "change"],
    concern_bonus: 0.1,
    urgency_threshold: 1.0,
    urgency_bonus: 0.0,
};

/// Rule for a domain, `None` for domains without one.
pub fn rule_for(domain: &str) -> Option<&'static ActivationRule> {
    match domain {
        "compassion" => Some(&COMPASSION),
        "honesty" => Some(&HONESTY),
        "harm_prevention" => Some(&HARM_PREVENTION),
        "fairness" => Some(&FAIRNESS),
        "autonomy" => Some(&AUTONOMY),
        "growth" => Some(&GROWTH),
        _ => None,
    }
}

impl ActivationRule {
    /// Score an assessment under this rule.
    pub fn score(&self, assessment: &BehaviorAssessment, category: EmotionCategory) -> f64 {
        let mut activation = self.base;

        activation += match category {
            EmotionCategory::Primary => self.primary_bonus,
            EmotionCategory::Secondary => self.secondary_bonus,
            EmotionCategory::Unlisted | EmotionCategory::Prohibited => 0.0,
        };

        let matching = assessment
            .concerns
            .iter()
            .filter(|concern| {
                let words = tokens(concern);
                self.concern_keywords.iter().any(|k| words.contains(*k))
            })
            .count();
        activation += self.concern_bonus * matching as f64;

        if assessment.urgency >= self.urgency_threshold {
            activation += self.urgency_bonus;
        }

        activation.clamp(0.0, 1.0)
    }
}

/// Activation of `anchor`. Domains without a rule sit exactly at their weight.
pub fn activation_for(
    anchor: &PrincipleAnchor,
    assessment: &BehaviorAssessment,
    category: EmotionCategory,
) -> f64 {
    match rule_for(&anchor.domain) {
        Some(rule) => rule.score(assessment, category),
        None => anchor.weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baseline::BaselineAnchorModel;

    fn anchor(domain: &str) -> PrincipleAnchor {
        BaselineAnchorModel::standard()
            .principle(domain)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_calm_assessment_matches_weights() {
        let assessment = BehaviorAssessment::new("care").with_urgency(0.2);
        for domain in ["compassion", "honesty", "fairness", "autonomy"] {
            let anchor = anchor(domain);
            let activation = activation_for(&anchor, &assessment, EmotionCategory::Primary);
            assert!(
                (activation - anchor.weight).abs() < 1e-9,
                "{domain}: {activation} vs {}",
                anchor.weight
            );
        }
    }

    #[test]
    fn test_concerns_and_urgency_add_up() {
        let assessment = BehaviorAssessment::new("concern")
            .with_concerns(["risk of harm", "safety", "budget"])
            .with_urgency(0.9);
        let activation = activation_for(
            &anchor("harm_prevention"),
            &assessment,
            EmotionCategory::Secondary,
        );
        // capped: 0.65 + 0.05 + 2 * 0.15 + 0.15
        assert_eq!(activation, 1.0);
    }

    #[test]
    fn test_unknown_domain_is_neutral() {
        let stewardship = PrincipleAnchor::new("stewardship", 0.6, 0.8, 0.3, "Care for shared resources");
        let assessment = BehaviorAssessment::new("contempt").with_urgency(1.0);
        assert_eq!(
            activation_for(&stewardship, &assessment, EmotionCategory::Prohibited),
            0.6
        );
    }
}
