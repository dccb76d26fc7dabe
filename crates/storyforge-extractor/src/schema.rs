//! Declared output schema for each record kind
//!
//! The schema is the single source of truth for what a model must emit:
//! the prompt's format instructions are rendered from it, parsed items are
//! validated against it, and the persistence sink re-checks required
//! fields with it before writing.

use serde_json::{json, Map, Value};
use storyforge_domain::{ExtractedRecord, FieldMap, FieldValue, Priority, RecordKind, Status};

/// Value domain of one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Non-blank string
    Text,

    /// Integer within an inclusive range
    Integer {
        /// Smallest accepted value
        min: i64,
        /// Largest accepted value
        max: i64,
    },

    /// One of a fixed set of labels, matched exactly
    Choice(Vec<&'static str>),
}

/// One field of a record schema
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field name, as emitted by the model and stored
    pub name: &'static str,

    /// Description shown to the model
    pub description: &'static str,

    /// Accepted values
    pub field_type: FieldType,

    /// Whether the field must be present and non-null
    pub required: bool,

    /// Value used when an optional field is absent or null
    pub default: Option<&'static str>,
}

impl FieldSpec {
    fn required(name: &'static str, description: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            description,
            field_type,
            required: true,
            default: None,
        }
    }

    fn optional(
        name: &'static str,
        description: &'static str,
        field_type: FieldType,
        default: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            description,
            field_type,
            required: false,
            default,
        }
    }

    /// Check one JSON value against this field
    fn check(&self, value: Option<&Value>) -> Result<FieldValue, String> {
        let value = match value {
            None | Some(Value::Null) if self.required => {
                return Err(format!("missing required field '{}'", self.name));
            }
            None | Some(Value::Null) => {
                return Ok(self.default.map_or(FieldValue::Null, FieldValue::from));
            }
            Some(value) => value,
        };

        match (&self.field_type, value) {
            (FieldType::Text, Value::String(s)) if !s.trim().is_empty() => {
                Ok(FieldValue::Text(s.clone()))
            }
            (FieldType::Text, Value::String(_)) => {
                Err(format!("field '{}' must not be blank", self.name))
            }
            (FieldType::Integer { min, max }, Value::Number(n)) => match n.as_i64() {
                Some(i) if (*min..=*max).contains(&i) => Ok(FieldValue::Integer(i)),
                _ => Err(format!(
                    "field '{}' must be an integer between {} and {}, got {}",
                    self.name, min, max, n
                )),
            },
            (FieldType::Choice(options), Value::String(s)) if options.iter().any(|o| *o == s.as_str()) => {
                Ok(FieldValue::Text(s.clone()))
            }
            (FieldType::Choice(options), Value::String(s)) => Err(format!(
                "field '{}' must be one of {:?}, got '{}'",
                self.name, options, s
            )),
            (_, other) => Err(format!(
                "field '{}' has the wrong type: {}",
                self.name, other
            )),
        }
    }

    fn json_schema(&self) -> Value {
        let mut property = Map::new();
        property.insert("description".into(), json!(self.description));
        match &self.field_type {
            FieldType::Text => {
                property.insert("type".into(), json!("string"));
            }
            FieldType::Integer { min, max } => {
                property.insert("type".into(), json!("integer"));
                property.insert("minimum".into(), json!(min));
                property.insert("maximum".into(), json!(max));
            }
            FieldType::Choice(options) => {
                property.insert("type".into(), json!("string"));
                property.insert("enum".into(), json!(options));
            }
        }
        if let Some(default) = self.default {
            property.insert("default".into(), json!(default));
        }
        Value::Object(property)
    }
}

/// Schema for one record kind
#[derive(Debug, Clone)]
pub struct ExtractionSchema {
    kind: RecordKind,
    wrapper_key: &'static str,
    fields: Vec<FieldSpec>,
}

impl ExtractionSchema {
    /// Schema for user stories
    pub fn story() -> Self {
        Self {
            kind: RecordKind::Story,
            wrapper_key: "user_stories",
            fields: vec![
                FieldSpec::required("title", "A short title for the user story", FieldType::Text),
                FieldSpec::required(
                    "description",
                    "A detailed description of the user story",
                    FieldType::Text,
                ),
                FieldSpec::required(
                    "acceptance_criteria",
                    "Point-wise acceptance criteria for the user story",
                    FieldType::Text,
                ),
                FieldSpec::required(
                    "priority",
                    "Priority level of the user story",
                    FieldType::Choice(Priority::ALL.iter().map(Priority::as_str).collect()),
                ),
                FieldSpec::optional(
                    "story_points",
                    "Estimated effort in story points",
                    FieldType::Integer { min: 1, max: 13 },
                    None,
                ),
                FieldSpec::optional(
                    "status",
                    "Current status of the user story",
                    FieldType::Choice(Status::ALL.iter().map(Status::as_str).collect()),
                    Some(Status::New.as_str()),
                ),
            ],
        }
    }

    /// Schema for test cases
    pub fn test_case() -> Self {
        Self {
            kind: RecordKind::TestCase,
            wrapper_key: "test_cases",
            fields: vec![
                FieldSpec::required("name", "The name of the test case", FieldType::Text),
                FieldSpec::required(
                    "description",
                    "A detailed description of what the test case validates",
                    FieldType::Text,
                ),
                FieldSpec::required(
                    "preconditions",
                    "Any preconditions that must be met before executing the test case",
                    FieldType::Text,
                ),
                FieldSpec::required(
                    "steps",
                    "Step-by-step instructions for executing the test case",
                    FieldType::Text,
                ),
                FieldSpec::required(
                    "expected_result",
                    "The expected outcome of the test case",
                    FieldType::Text,
                ),
            ],
        }
    }

    /// Schema for the given kind
    pub fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Story => Self::story(),
            RecordKind::TestCase => Self::test_case(),
        }
    }

    /// Record kind this schema describes
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Top-level key wrapping the record list
    pub fn wrapper_key(&self) -> &'static str {
        self.wrapper_key
    }

    /// Field declarations, in prompt order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Names of the required fields
    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.required).map(|f| f.name)
    }

    /// Validate one parsed item and build a typed record from it
    ///
    /// Values are never coerced: a number given as a string, a float story
    /// point, or a priority in the wrong case is rejected. Unknown fields are
    /// ignored.
    pub fn validate(&self, item: &Value) -> Result<ExtractedRecord, String> {
        let Value::Object(object) = item else {
            return Err(format!("expected an object, got {}", item));
        };

        let mut fields = FieldMap::new();
        for spec in &self.fields {
            fields.insert(spec.name.to_string(), spec.check(object.get(spec.name))?);
        }

        ExtractedRecord::from_fields(self.kind, &fields)
    }

    /// Check that every required field of a field map is present and non-blank
    pub fn check_required(&self, fields: &FieldMap) -> Result<(), String> {
        for name in self.required_fields() {
            match fields.get(name) {
                Some(FieldValue::Text(s)) if !s.trim().is_empty() => {}
                Some(FieldValue::Integer(_)) => {}
                _ => return Err(format!("missing required field '{}'", name)),
            }
        }
        Ok(())
    }

    /// JSON schema of the wrapper object
    pub fn json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.json_schema()))
            .collect();
        let required: Vec<&str> = self.required_fields().collect();

        json!({
            "type": "object",
            "properties": {
                (self.wrapper_key): {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": properties,
                        "required": required,
                    }
                }
            },
            "required": [self.wrapper_key],
        })
    }

    /// Instructions telling the model how to format its answer
    pub fn format_instructions(&self) -> String {
        format!(
            "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\
             Return only the JSON object, with no commentary and no code fences.\n\
             Use the exact labels listed under \"enum\" and plain integers where an integer is required.\n\n\
             ```\n{}\n```",
            self.json_schema()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyforge_domain::UserStory;

    fn story_json() -> Value {
        json!({
            "title": "Login",
            "description": "As a user I want to log in",
            "acceptance_criteria": "1. Valid credentials succeed",
            "priority": "High",
            "story_points": 5
        })
    }

    #[test]
    fn test_valid_story() {
        let record = ExtractionSchema::story().validate(&story_json()).unwrap();
        let ExtractedRecord::Story(UserStory { priority, story_points, status, .. }) = record else {
            panic!("expected a story");
        };
        assert_eq!(priority, Priority::High);
        assert_eq!(story_points, Some(5));
        assert_eq!(status, Status::New);
    }

    #[test]
    fn test_null_story_points_allowed() {
        let mut item = story_json();
        item["story_points"] = Value::Null;
        let record = ExtractionSchema::story().validate(&item).unwrap();
        assert!(matches!(record, ExtractedRecord::Story(UserStory { story_points: None, .. })));
    }

    #[test]
    fn test_rejects_out_of_range_and_coerced_values() {
        let schema = ExtractionSchema::story();
        for (field, value) in [
            ("story_points", json!(21)),
            ("story_points", json!(0)),
            ("story_points", json!("5")),
            ("story_points", json!(2.5)),
            ("priority", json!("Urgent")),
            ("priority", json!("high")),
            ("status", json!("Blocked")),
            ("title", json!("   ")),
            ("title", json!(42)),
        ] {
            let mut item = story_json();
            item[field] = value;
            assert!(schema.validate(&item).is_err(), "{} should be rejected", field);
        }
    }

    #[test]
    fn test_rejects_missing_required_field() {
        let mut item = story_json();
        item.as_object_mut().unwrap().remove("acceptance_criteria");
        let err = ExtractionSchema::story().validate(&item).unwrap_err();
        assert!(err.contains("acceptance_criteria"));
    }

    #[test]
    fn test_ignores_unknown_fields() {
        let mut item = story_json();
        item["epic"] = json!("Accounts");
        assert!(ExtractionSchema::story().validate(&item).is_ok());
    }

    #[test]
    fn test_test_case_schema() {
        let schema = ExtractionSchema::test_case();
        assert_eq!(schema.wrapper_key(), "test_cases");
        assert_eq!(schema.required_fields().count(), 5);

        let item = json!({
            "name": "Valid login",
            "description": "Checks login",
            "preconditions": "User exists",
            "steps": "1. Open page",
            "expected_result": "Dashboard shown"
        });
        assert_eq!(schema.validate(&item).unwrap().kind(), RecordKind::TestCase);
    }

    #[test]
    fn test_format_instructions_mention_every_field() {
        for schema in [ExtractionSchema::story(), ExtractionSchema::test_case()] {
            let instructions = schema.format_instructions();
            assert!(instructions.contains(schema.wrapper_key()));
            for field in schema.fields() {
                assert!(instructions.contains(field.name));
            }
        }
    }

    #[test]
    fn test_check_required() {
        let schema = ExtractionSchema::story();
        let record = schema.validate(&story_json()).unwrap();
        let mut fields = record.to_fields();
        assert!(schema.check_required(&fields).is_ok());

        fields.insert("title".into(), FieldValue::Text(String::new()));
        assert!(schema.check_required(&fields).is_err());
    }
}
