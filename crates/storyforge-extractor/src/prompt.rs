//! Prompt construction for record extraction

use crate::schema::ExtractionSchema;
use storyforge_domain::RecordKind;

/// Builds the prompt sent to the model for one chunk
///
/// The prompt is a pure function of the chunk text and the schema, so the
/// same chunk always yields the same prompt.
pub struct PromptBuilder<'a> {
    schema: &'a ExtractionSchema,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(schema: &'a ExtractionSchema) -> Self {
        Self { schema }
    }

    /// Build the complete extraction prompt
    pub fn build(&self, text: &str) -> String {
        let mut prompt = String::new();

        // 1. Role and task
        prompt.push_str(match self.schema.kind() {
            RecordKind::Story => STORY_INSTRUCTIONS,
            RecordKind::TestCase => TEST_CASE_INSTRUCTIONS,
        });
        prompt.push_str("\n\n");

        // 2. The text to analyze
        prompt.push_str("Document chunk:\n");
        prompt.push_str("---\n");
        prompt.push_str(text);
        prompt.push_str("\n---\n\n");

        // 3. Output format
        prompt.push_str(&self.schema.format_instructions());
        prompt.push('\n');

        prompt
    }
}

const STORY_INSTRUCTIONS: &str = r#"You are a software analyst. Based on the following requirement text, extract key user stories and define acceptance criteria for each.

Rules:
- One user story per distinct user need
- Write acceptance criteria as a numbered, point-wise list
- Priority must be exactly one of: Low, Medium, High
- Story points are optional; when given they must be a whole number from 1 to 13
- If the text does not contain any user stories, return an empty list"#;

const TEST_CASE_INSTRUCTIONS: &str = r#"You are a QA analyst. Based on the following user story and acceptance criteria, generate detailed test cases as an array.

Rules:
- Cover every acceptance criterion with at least one test case
- Include negative and edge cases where they apply
- Write steps as a numbered list of concrete actions
- If the text does not describe testable behavior, return an empty list"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_prompt_contains_text_and_format() {
        let schema = ExtractionSchema::story();
        let prompt = PromptBuilder::new(&schema).build("Users can reset their password.");

        assert!(prompt.starts_with("You are a software analyst."));
        assert!(prompt.contains("Users can reset their password."));
        assert!(prompt.contains("user_stories"));
        assert!(prompt.contains("acceptance_criteria"));
    }

    #[test]
    fn test_test_case_prompt() {
        let schema = ExtractionSchema::test_case();
        let prompt = PromptBuilder::new(&schema).build("User Story: Login");

        assert!(prompt.starts_with("You are a QA analyst."));
        assert!(prompt.contains("test_cases"));
        assert!(prompt.contains("expected_result"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let schema = ExtractionSchema::story();
        let builder = PromptBuilder::new(&schema);
        assert_eq!(builder.build("same text"), builder.build("same text"));
    }
}
