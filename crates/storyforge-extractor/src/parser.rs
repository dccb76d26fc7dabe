//! Parse model output into validated records

use crate::error::WorkerFailure;
use crate::schema::ExtractionSchema;
use serde_json::Value;
use storyforge_domain::ExtractedRecord;
use tracing::warn;

/// A parsed item that failed schema validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedItem {
    /// 0-based position of the item in the model's list
    pub position: usize,

    /// Why it was rejected
    pub reason: String,
}

/// Result of parsing one model response
#[derive(Debug, Clone, Default)]
pub struct ParsedOutput {
    /// Items that passed validation, in the model's order
    pub records: Vec<ExtractedRecord>,

    /// Items that did not
    pub rejected: Vec<RejectedItem>,
}

/// Parse a model response against a schema
///
/// Accepts either the wrapper object (`{"user_stories": [...]}`) or a bare
/// array, optionally inside a markdown code fence or surrounded by prose.
/// Anything else is a `MalformedOutput` failure for the whole chunk.
/// Individual items that fail validation are dropped and listed in
/// `rejected`, they never reach `records`.
pub fn parse_model_output(
    response: &str,
    schema: &ExtractionSchema,
) -> Result<ParsedOutput, WorkerFailure> {
    let json_str = extract_json(response);
    if json_str.is_empty() {
        return Err(WorkerFailure::malformed("empty response"));
    }

    let json: Value = serde_json::from_str(json_str)
        .map_err(|e| WorkerFailure::malformed(format!("JSON parse error: {}", e)))?;

    let items = match json {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove(schema.wrapper_key()) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(WorkerFailure::malformed(format!(
                    "'{}' is not an array: {}",
                    schema.wrapper_key(),
                    other
                )))
            }
            None => {
                return Err(WorkerFailure::malformed(format!(
                    "expected an object with '{}'",
                    schema.wrapper_key()
                )))
            }
        },
        other => {
            return Err(WorkerFailure::malformed(format!(
                "expected a JSON object or array, got {}",
                other
            )))
        }
    };

    let mut output = ParsedOutput::default();
    for (position, item) in items.iter().enumerate() {
        match schema.validate(item) {
            Ok(record) => output.records.push(record),
            Err(reason) => {
                warn!("{} {} failed validation: {}", schema.kind(), position, reason);
                output.rejected.push(RejectedItem { position, reason });
            }
        }
    }

    Ok(output)
}

/// Extract the JSON payload, handling code fences and surrounding prose
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    // Markdown code block, possibly after some prose
    if let Some(fence) = trimmed.find("```") {
        let after = &trimmed[fence + 3..];
        // Language tag, if any, runs up to the first non-tag character
        let tag_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(after.len());
        let body = &after[tag_len..];
        let end = body.find("```").unwrap_or(body.len());
        let body = body[..end].trim();
        if !body.is_empty() {
            return body;
        }
    }

    let open = trimmed.find(['{', '[']);
    let close = trimmed.rfind(['}', ']']);
    match (open, close) {
        (Some(open), Some(close)) if open < close => &trimmed[open..=close],
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use storyforge_domain::RecordKind;

    const STORY: &str = r#"{
        "title": "Login",
        "description": "As a user I want to log in",
        "acceptance_criteria": "1. Valid credentials succeed",
        "priority": "High",
        "story_points": 3
    }"#;

    #[test]
    fn test_parse_wrapper_object() {
        let response = format!(r#"{{"user_stories": [{}]}}"#, STORY);
        let parsed = parse_model_output(&response, &ExtractionSchema::story()).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].headline(), "Login");
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn test_parse_bare_array() {
        let response = format!("[{}, {}]", STORY, STORY);
        let parsed = parse_model_output(&response, &ExtractionSchema::story()).unwrap();
        assert_eq!(parsed.records.len(), 2);
    }

    #[test]
    fn test_parse_json_with_markdown_wrapper() {
        let response = format!("Here you go:\n```json\n{{\"user_stories\": [{}]}}\n```\nThanks", STORY);
        let parsed = parse_model_output(&response, &ExtractionSchema::story()).unwrap();
        assert_eq!(parsed.records.len(), 1);
    }

    #[test]
    fn test_parse_single_line_fence() {
        let parsed =
            parse_model_output("```json {\"user_stories\": []}```", &ExtractionSchema::story()).unwrap();
        assert!(parsed.records.is_empty());

        let response = format!("```{{\"user_stories\": [{}]}}```", STORY);
        let parsed = parse_model_output(&response, &ExtractionSchema::story()).unwrap();
        assert_eq!(parsed.records.len(), 1);
    }

    #[test]
    fn test_empty_fence_falls_back_to_brace_scan() {
        let response = format!("```json\n```\n{{\"user_stories\": [{}]}}", STORY);
        let parsed = parse_model_output(&response, &ExtractionSchema::story()).unwrap();
        assert_eq!(parsed.records.len(), 1);
    }

    #[test]
    fn test_parse_json_with_prose() {
        let response = format!("Sure! {{\"user_stories\": [{}]}} Hope this helps.", STORY);
        let parsed = parse_model_output(&response, &ExtractionSchema::story()).unwrap();
        assert_eq!(parsed.records.len(), 1);
    }

    #[test]
    fn test_empty_list_is_not_a_failure() {
        let parsed = parse_model_output(r#"{"user_stories": []}"#, &ExtractionSchema::story()).unwrap();
        assert!(parsed.records.is_empty());
    }

    #[test]
    fn test_invalid_item_is_rejected_not_returned() {
        let bad = STORY.replace("\"High\"", "\"Urgent\"");
        let response = format!("[{}, {}]", STORY, bad);
        let parsed = parse_model_output(&response, &ExtractionSchema::story()).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].position, 1);
        assert!(parsed.rejected[0].reason.contains("priority"));
    }

    #[test]
    fn test_malformed_output() {
        let schema = ExtractionSchema::test_case();
        for response in [
            "This is not JSON",
            "",
            r#"{"user_stories": []}"#,
            r#"{"test_cases": "none"}"#,
            "42",
        ] {
            let err = parse_model_output(response, &schema).unwrap_err();
            assert_eq!(err.kind, FailureKind::MalformedOutput, "{:?}", response);
        }
    }

    #[test]
    fn test_parse_test_cases() {
        let response = r#"{"test_cases": [{
            "name": "Valid login",
            "description": "Checks login",
            "preconditions": "User exists",
            "steps": "1. Open page",
            "expected_result": "Dashboard shown"
        }]}"#;
        let parsed = parse_model_output(response, &ExtractionSchema::test_case()).unwrap();
        assert_eq!(parsed.records[0].kind(), RecordKind::TestCase);
    }
}
