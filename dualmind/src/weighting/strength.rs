//! Surface-feature strength heuristics for the two streams.
//!
//! Scores are deterministic and depend only on lower-cased word tokens and
//! segment counts. Every score starts at [`BASE_STRENGTH`] and is clamped to
//! [0, 1].

use std::collections::BTreeSet;

/// Neutral score, also used for blank text.
pub const BASE_STRENGTH: f64 = 0.5;

const MORAL_TERMS: &[&str] = &[
    "moral", "morally", "morality", "ethical", "ethics", "ethically", "values", "integrity",
    "honest", "honesty", "fairness", "justice", "conscience", "dignity", "compassion", "duty",
    "principle", "principles", "virtue",
];

const AFFECTIVE_TERMS: &[&str] = &[
    "feel", "feeling", "feelings", "emotion", "emotional", "heart", "care", "caring", "love",
    "hope", "empathy", "creative", "creativity", "imagine", "imagination", "beautiful", "inspire",
];

const CONVICTION_TERMS: &[&str] = &[
    "strong", "strongly", "clarity", "certain", "certainly", "convinced", "believe", "deeply",
    "must",
];

const ANALYTICAL_TERMS: &[&str] = &[
    "analysis", "analyze", "analytical", "logic", "logical", "data", "evidence", "efficient",
    "efficiency", "systematic", "structured", "algorithm", "probability", "metric", "metrics",
    "optimize", "optimization", "reasoning", "tradeoff",
];

/// Lower-cased word tokens. Underscores stay inside tokens so list tags such
/// as `high_confidence` survive.
pub fn tokens(text: &str) -> BTreeSet<String> {
    token_sequence(text).collect()
}

/// Same tokens as [`tokens`], in order of appearance, repeats included.
pub fn token_sequence(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn contains_any(tokens: &BTreeSet<String>, terms: &[&str]) -> bool {
    terms.iter().any(|term| tokens.contains(*term))
}

fn sentence_count(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}

fn list_segment_count(text: &str) -> usize {
    text.split([',', ';', '|', '\n'])
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// Strength of the Valon (moral/affective) text.
pub fn valon_strength(text: &str) -> f64 {
    if text.trim().is_empty() {
        return BASE_STRENGTH;
    }

    let tokens = tokens(text);
    let mut strength = BASE_STRENGTH;
    if contains_any(&tokens, MORAL_TERMS) {
        strength += 0.3;
    }
    if contains_any(&tokens, AFFECTIVE_TERMS) {
        strength += 0.1;
    }
    if contains_any(&tokens, CONVICTION_TERMS) {
        strength += 0.1;
    }
    if sentence_count(text) >= 3 {
        strength += 0.1;
    }
    strength.clamp(0.0, 1.0)
}

/// Strength of the Modi (logical/analytical) text.
pub fn modi_strength(text: &str) -> f64 {
    if text.trim().is_empty() {
        return BASE_STRENGTH;
    }

    let tokens = tokens(text);
    let mut strength = BASE_STRENGTH;
    if tokens.contains("technical") {
        strength += 0.2;
    }
    if tokens.contains("advanced") {
        strength += 0.2;
    }
    if contains_any(&tokens, ANALYTICAL_TERMS) {
        strength += 0.1;
    }
    if list_segment_count(text) >= 3 {
        strength += 0.1;
    }
    strength.clamp(0.0, 1.0)
}

/// Explicit confidence tag in the Modi list, highest wins.
pub fn confidence_marker(text: &str) -> Option<f64> {
    let tokens = tokens(text);
    if tokens.contains("high_confidence") {
        Some(0.9)
    } else if tokens.contains("medium_confidence") {
        Some(0.6)
    } else if tokens.contains("low_confidence") {
        Some(0.3)
    } else {
        None
    }
}

/// Jaccard similarity of the two token sets; 0.0 when both are empty.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let a = tokens(a);
    let b = tokens(b);
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_neutral() {
        assert_eq!(valon_strength(""), BASE_STRENGTH);
        assert_eq!(valon_strength("   \n"), BASE_STRENGTH);
        assert_eq!(modi_strength(""), BASE_STRENGTH);
    }

    #[test]
    fn test_moral_clarity_text() {
        let strength = valon_strength("I feel strong moral clarity about this");
        // moral + affective + conviction
        assert!((strength - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_moral_term_alone() {
        let strength = valon_strength("That seems like a moral question");
        assert!((strength - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_sentence_bonus() {
        let strength = valon_strength("One thing. Another thing! A third?");
        assert!((strength - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_technical_list() {
        let strength = modi_strength("technical, high_confidence, advanced");
        assert!((strength - 1.0).abs() < 1e-9);

        let plain = modi_strength("a short answer");
        assert_eq!(plain, BASE_STRENGTH);
    }

    #[test]
    fn test_modi_segments_on_any_delimiter() {
        let strength = modi_strength("step one; step two | step three");
        assert!((strength - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_keywords_match_whole_tokens() {
        // "technicality" is not "technical"
        assert_eq!(modi_strength("a technicality"), BASE_STRENGTH);
        assert!((modi_strength("Technical!") - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_marker() {
        assert_eq!(confidence_marker("technical, high_confidence"), Some(0.9));
        assert_eq!(confidence_marker("medium_confidence"), Some(0.6));
        assert_eq!(confidence_marker("LOW_CONFIDENCE, data"), Some(0.3));
        assert_eq!(confidence_marker("no tag here"), None);
    }

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard_similarity("", ""), 0.0);
        assert_eq!(jaccard_similarity("a b", "a b"), 1.0);
        assert!((jaccard_similarity("a b", "b c") - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(jaccard_similarity("a", "b"), 0.0);
    }
}
