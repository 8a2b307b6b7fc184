//! Prompt assembly from the baseline model.
//!
//! Builds the system prompts for the two generation streams and the
//! structured behavior-assessment request. The text generator only ever sees
//! plain prompts; structure is recovered by parsing its answers.

use crate::model::BaselineAnchorModel;

/// Assembles prompts from a baseline model.
pub struct PromptAssembler;

impl PromptAssembler {
    /// System prompt for the Valon (moral/affective) stream.
    pub fn valon_system_prompt(model: &BaselineAnchorModel) -> String {
        let mut prompt = String::new();

        prompt.push_str("# VALON PERSPECTIVE\n\n");
        prompt.push_str("You speak for the moral and emotional side of the assistant.\n");
        prompt.push_str("Respond with how the situation feels and what matters ethically.\n\n");

        prompt.push_str("## GUIDING PRINCIPLES\n\n");
        for (i, anchor) in model.principles().iter().enumerate() {
            prompt.push_str(&format!(
                "{}. **{}** (weight {:.2}): {}\n",
                i + 1,
                anchor.domain,
                anchor.weight,
                anchor.description
            ));
        }

        let emotional = model.emotional_pattern();
        prompt.push_str("\n## EMOTIONAL REGISTER\n\n");
        prompt.push_str(&format!("Lead with: {}\n", emotional.primary.join(", ")));
        prompt.push_str(&format!("Acceptable: {}\n", emotional.secondary.join(", ")));
        prompt.push_str(&format!("Never express: {}\n", emotional.prohibited.join(", ")));

        prompt
    }

    /// System prompt for the Modi (logical/analytical) stream.
    ///
    /// Modi answers as a short comma-separated list of insight tags so the
    /// weighting engine can count segments.
    pub fn modi_system_prompt(model: &BaselineAnchorModel) -> String {
        let mut prompt = String::new();

        prompt.push_str("# MODI PERSPECTIVE\n\n");
        prompt.push_str("You speak for the logical and analytical side of the assistant.\n");
        prompt.push_str("Answer ONLY with a comma-separated list of short insight tags.\n");
        prompt.push_str("Include exactly one of: high_confidence, medium_confidence, low_confidence.\n");
        prompt.push_str("Use tags such as technical, advanced, evidence, tradeoff where they apply.\n\n");

        let reasoning = model.reasoning_pattern();
        prompt.push_str("## EXPECTED REASONING\n\n");
        prompt.push_str(&format!("Styles: {}\n", reasoning.expected_styles.join(", ")));
        prompt.push_str(&format!("Processes: {}\n", reasoning.expected_processes.join(", ")));

        prompt
    }

    /// Request for a structured assessment of a Valon response.
    ///
    /// The answer is expected as a single JSON object; callers must still
    /// validate it.
    pub fn assessment_prompt(model: &BaselineAnchorModel, moral_text: &str) -> String {
        let emotional = model.emotional_pattern();
        let reasoning = model.reasoning_pattern();

        let mut prompt = String::new();
        prompt.push_str("# BEHAVIOR ASSESSMENT REQUEST\n\n");
        prompt.push_str("Assess the response below and reply with ONE JSON object:\n\n");
        prompt.push_str("```json\n");
        prompt.push_str("{\n");
        prompt.push_str("  \"primary_emotion\": \"<single lowercase emotion>\",\n");
        prompt.push_str("  \"concerns\": [\"<lowercase keyword>\", ...],\n");
        prompt.push_str("  \"urgency\": <number 0.0-1.0>,\n");
        prompt.push_str("  \"guidance\": \"<one sentence>\",\n");
        prompt.push_str("  \"reasoning_style\": \"<style label>\",\n");
        prompt.push_str("  \"reasoning_process\": \"<process label>\"\n");
        prompt.push_str("}\n```\n\n");

        let mut emotions: Vec<&str> = emotional
            .primary
            .iter()
            .chain(emotional.secondary.iter())
            .map(String::as_str)
            .collect();
        emotions.sort_unstable();
        prompt.push_str(&format!("Known emotions: {}\n", emotions.join(", ")));
        prompt.push_str(&format!(
            "Style labels: {}\nProcess labels: {}\n\n",
            reasoning.expected_styles.join(", "),
            reasoning.expected_processes.join(", ")
        ));

        prompt.push_str("## RESPONSE\n\n");
        prompt.push_str(moral_text.trim());
        prompt.push('\n');

        prompt
    }

    /// Render recalled memories as a context block for a user prompt.
    pub fn context_block(recalled: &[String]) -> String {
        if recalled.is_empty() {
            return String::new();
        }

        let mut block = String::from("## RELEVANT MEMORIES\n\n");
        for memory in recalled {
            block.push_str("- ");
            block.push_str(memory.trim());
            block.push('\n');
        }
        block.push('\n');
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valon_prompt_lists_principles() {
        let model = BaselineAnchorModel::standard();
        let prompt = PromptAssembler::valon_system_prompt(&model);

        assert!(prompt.contains("VALON PERSPECTIVE"));
        for anchor in model.principles() {
            assert!(prompt.contains(&anchor.domain));
        }
        assert!(prompt.contains("Never express: contempt"));
    }

    #[test]
    fn test_modi_prompt_requests_tags() {
        let model = BaselineAnchorModel::standard();
        let prompt = PromptAssembler::modi_system_prompt(&model);

        assert!(prompt.contains("comma-separated"));
        assert!(prompt.contains("high_confidence"));
        assert!(prompt.contains("weigh_perspectives"));
    }

    #[test]
    fn test_assessment_prompt_embeds_response() {
        let model = BaselineAnchorModel::standard();
        let prompt = PromptAssembler::assessment_prompt(&model, "  I care about this.  ");

        assert!(prompt.contains("\"primary_emotion\""));
        assert!(prompt.ends_with("I care about this.\n"));
    }

    #[test]
    fn test_context_block() {
        assert_eq!(PromptAssembler::context_block(&[]), "");

        let block = PromptAssembler::context_block(&["first".to_string(), " second ".to_string()]);
        assert!(block.starts_with("## RELEVANT MEMORIES"));
        assert!(block.contains("- first\n- second\n"));
    }
}
