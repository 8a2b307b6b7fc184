//! Baseline anchor model assembly.
//!
//! The model is built once at startup (from the built-in defaults or a YAML
//! definition), validated, fingerprinted and then shared read-only for the
//! lifetime of the process. The model exposes no mutating API.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::defaults::{default_emotional_pattern, default_principles, default_reasoning_pattern};
use crate::types::{BaselineError, EmotionalPattern, PrincipleAnchor, ReasoningPattern};

/// Serializable form of a baseline, as written in configuration files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineDefinition {
    /// Principle anchors in evaluation order
    pub principles: Vec<PrincipleAnchor>,
    /// Expected emotional behavior
    pub emotional_pattern: EmotionalPattern,
    /// Expected reasoning behavior
    pub reasoning_pattern: ReasoningPattern,
}

impl Default for BaselineDefinition {
    fn default() -> Self {
        Self {
            principles: default_principles(),
            emotional_pattern: default_emotional_pattern(),
            reasoning_pattern: default_reasoning_pattern(),
        }
    }
}

/// The immutable reference personality.
#[derive(Debug, Clone)]
pub struct BaselineAnchorModel {
    /// Anchors in evaluation order
    principles: Vec<PrincipleAnchor>,
    /// Expected emotional behavior
    emotional: EmotionalPattern,
    /// Expected reasoning behavior
    reasoning: ReasoningPattern,
    /// SHA-256 over the full definition, hex encoded
    fingerprint: String,
}

impl BaselineAnchorModel {
    /// Build the built-in baseline.
    pub fn standard() -> Self {
        // Built-in definition is validated in tests.
        let definition = BaselineDefinition::default();
        let fingerprint = Self::compute_fingerprint(&definition);
        Self {
            principles: definition.principles,
            emotional: definition.emotional_pattern,
            reasoning: definition.reasoning_pattern,
            fingerprint,
        }
    }

    /// Build from a definition, validating every anchor.
    pub fn from_definition(definition: BaselineDefinition) -> Result<Self, BaselineError> {
        if definition.principles.is_empty() {
            return Err(BaselineError::Empty);
        }

        let mut seen = HashSet::new();
        for anchor in &definition.principles {
            anchor.validate()?;
            if !seen.insert(anchor.domain.clone()) {
                return Err(BaselineError::InvalidDomain(format!(
                    "duplicate domain '{}'",
                    anchor.domain
                )));
            }
        }

        for (field, value) in [
            ("empathy_baseline", definition.emotional_pattern.empathy_baseline),
            ("stability_target", definition.emotional_pattern.stability_target),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BaselineError::OutOfRange {
                    domain: "emotional_pattern".to_string(),
                    field,
                    value,
                    expected: "[0, 1]",
                });
            }
        }

        let fingerprint = Self::compute_fingerprint(&definition);

        info!(
            principles = definition.principles.len(),
            fingerprint = %fingerprint,
            "Baseline anchor model loaded"
        );

        Ok(Self {
            principles: definition.principles,
            emotional: definition.emotional_pattern,
            reasoning: definition.reasoning_pattern,
            fingerprint,
        })
    }

    /// Load from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, BaselineError> {
        let definition: BaselineDefinition =
            serde_yaml::from_str(yaml).map_err(|e| BaselineError::Parse(e.to_string()))?;
        Self::from_definition(definition)
    }

    /// Load from JSON.
    pub fn from_json(json: &str) -> Result<Self, BaselineError> {
        let definition: BaselineDefinition =
            serde_json::from_str(json).map_err(|e| BaselineError::Parse(e.to_string()))?;
        Self::from_definition(definition)
    }

    /// Export the definition (for persistence or display).
    pub fn definition(&self) -> BaselineDefinition {
        BaselineDefinition {
            principles: self.principles.clone(),
            emotional_pattern: self.emotional.clone(),
            reasoning_pattern: self.reasoning.clone(),
        }
    }

    /// All anchors in evaluation order.
    pub fn principles(&self) -> &[PrincipleAnchor] {
        &self.principles
    }

    /// Look up one anchor by domain.
    pub fn principle(&self, domain: &str) -> Option<&PrincipleAnchor> {
        self.principles.iter().find(|p| p.domain == domain)
    }

    /// Expected emotional behavior.
    pub fn emotional_pattern(&self) -> &EmotionalPattern {
        &self.emotional
    }

    /// Expected reasoning behavior.
    pub fn reasoning_pattern(&self) -> &ReasoningPattern {
        &self.reasoning
    }

    /// Hex SHA-256 fingerprint of the model.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn compute_fingerprint(definition: &BaselineDefinition) -> String {
        let mut hasher = Sha256::new();

        for anchor in &definition.principles {
            hasher.update(anchor.domain.as_bytes());
            hasher.update(anchor.weight.to_le_bytes());
            hasher.update(anchor.stability.to_le_bytes());
            hasher.update(anchor.variance_tolerance.to_le_bytes());
            hasher.update(anchor.description.as_bytes());
        }

        let emotional = &definition.emotional_pattern;
        for set in [&emotional.primary, &emotional.secondary, &emotional.prohibited] {
            for emotion in set {
                hasher.update(emotion.as_bytes());
            }
            hasher.update([0u8]);
        }
        hasher.update(emotional.empathy_baseline.to_le_bytes());
        hasher.update(emotional.stability_target.to_le_bytes());

        let reasoning = &definition.reasoning_pattern;
        for label in reasoning
            .expected_styles
            .iter()
            .chain(reasoning.expected_processes.iter())
        {
            hasher.update(label.as_bytes());
        }

        let fingerprint = hex::encode(hasher.finalize());
        debug!(fingerprint = %fingerprint, "Computed baseline fingerprint");
        fingerprint
    }
}

impl Default for BaselineAnchorModel {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_model() {
        let model = BaselineAnchorModel::standard();
        assert_eq!(model.principles().len(), 6);
        assert_eq!(model.principles()[0].domain, "compassion");
        assert!(model.principle("honesty").is_some());
        assert!(model.principle("nonexistent").is_none());
        assert_eq!(model.fingerprint().len(), 64);
    }

    #[test]
    fn test_standard_matches_validated_definition() {
        let validated = BaselineAnchorModel::from_definition(BaselineDefinition::default()).unwrap();
        assert_eq!(validated.fingerprint(), BaselineAnchorModel::standard().fingerprint());
    }

    #[test]
    fn test_yaml_roundtrip_keeps_fingerprint() {
        let model = BaselineAnchorModel::standard();
        let yaml = serde_yaml::to_string(&model.definition()).unwrap();
        let parsed = BaselineAnchorModel::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.fingerprint(), model.fingerprint());
    }

    #[test]
    fn test_fingerprint_changes_with_weight() {
        let mut definition = BaselineDefinition::default();
        definition.principles[0].weight = 0.5;
        let changed = BaselineAnchorModel::from_definition(definition).unwrap();
        assert_ne!(changed.fingerprint(), BaselineAnchorModel::standard().fingerprint());
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        let mut definition = BaselineDefinition::default();
        let duplicate = definition.principles[0].clone();
        definition.principles.push(duplicate);
        assert!(matches!(
            BaselineAnchorModel::from_definition(definition),
            Err(BaselineError::InvalidDomain(_))
        ));

        let empty = BaselineDefinition {
            principles: vec![],
            ..Default::default()
        };
        assert!(matches!(
            BaselineAnchorModel::from_definition(empty),
            Err(BaselineError::Empty)
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = BaselineAnchorModel::from_yaml("principles: [not, a, map");
        assert!(matches!(result, Err(BaselineError::Parse(_))));
    }
}
