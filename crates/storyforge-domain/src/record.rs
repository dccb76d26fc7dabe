//! Extracted records - the typed output of the pipeline
//!
//! A record only exists after its fields have passed schema validation,
//! so the types here carry no "unvalidated" state.

use crate::fields::{FieldMap, FieldValue};
use std::fmt;

/// The kinds of record the pipeline can extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// User story with acceptance criteria
    Story,

    /// Test case with steps and expected result
    TestCase,
}

impl RecordKind {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Story => "story",
            RecordKind::TestCase => "test_case",
        }
    }

    /// Backing-store collection this kind is written to
    pub fn collection(&self) -> &'static str {
        match self {
            RecordKind::Story => "user_story",
            RecordKind::TestCase => "test_case",
        }
    }

    /// Parse a kind from user input (`story`, `test-case`, `test_case`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "story" | "stories" | "user_story" | "user-story" => Some(RecordKind::Story),
            "test_case" | "test-case" | "testcase" | "test_cases" => Some(RecordKind::TestCase),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Story priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Low priority
    Low,
    /// Medium priority
    Medium,
    /// High priority
    High,
}

impl Priority {
    /// All variants, in declaration order
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Canonical label, as stored and as the model must emit it
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Exact-match parse; no case folding
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

/// Story workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    /// Not yet started
    #[default]
    New,
    /// Being worked on
    InProgress,
    /// Finished
    Done,
}

impl Status {
    /// All variants, in declaration order
    pub const ALL: [Status; 3] = [Status::New, Status::InProgress, Status::Done];

    /// Canonical label
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::New => "New",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
        }
    }

    /// Exact-match parse; no case folding
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

/// A user story extracted from requirement text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStory {
    /// Short title
    pub title: String,

    /// Detailed description
    pub description: String,

    /// Point-wise acceptance criteria
    pub acceptance_criteria: String,

    /// Priority level
    pub priority: Priority,

    /// Estimate in story points (1..=13)
    pub story_points: Option<i64>,

    /// Workflow status
    pub status: Status,
}

/// A test case derived from requirements or a user story
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Test case name
    pub name: String,

    /// What the test validates
    pub description: String,

    /// Conditions that must hold before execution
    pub preconditions: String,

    /// Step-by-step instructions
    pub steps: String,

    /// Expected outcome
    pub expected_result: String,
}

/// A validated record of either kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedRecord {
    /// A user story
    Story(UserStory),

    /// A test case
    TestCase(TestCase),
}

impl ExtractedRecord {
    /// Kind of this record
    pub fn kind(&self) -> RecordKind {
        match self {
            ExtractedRecord::Story(_) => RecordKind::Story,
            ExtractedRecord::TestCase(_) => RecordKind::TestCase,
        }
    }

    /// Human-readable headline (story title or test case name)
    pub fn headline(&self) -> &str {
        match self {
            ExtractedRecord::Story(s) => &s.title,
            ExtractedRecord::TestCase(t) => &t.name,
        }
    }

    /// Every content field of the record, without ownership tags
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        match self {
            ExtractedRecord::Story(s) => {
                fields.insert("title".into(), s.title.clone().into());
                fields.insert("description".into(), s.description.clone().into());
                fields.insert(
                    "acceptance_criteria".into(),
                    s.acceptance_criteria.clone().into(),
                );
                fields.insert("priority".into(), s.priority.as_str().into());
                fields.insert("story_points".into(), s.story_points.into());
                fields.insert("status".into(), s.status.as_str().into());
            }
            ExtractedRecord::TestCase(t) => {
                fields.insert("name".into(), t.name.clone().into());
                fields.insert("description".into(), t.description.clone().into());
                fields.insert("preconditions".into(), t.preconditions.clone().into());
                fields.insert("steps".into(), t.steps.clone().into());
                fields.insert("expected_result".into(), t.expected_result.clone().into());
            }
        }
        fields
    }
}

impl UserStory {
    /// Rebuild a story from a stored field map
    ///
    /// Used when a persisted story is loaded back, for example to derive
    /// test cases from it. Fails if a required field is missing or holds
    /// a value outside its domain.
    pub fn from_fields(fields: &FieldMap) -> Result<Self, String> {
        let text = |name: &str| -> Result<String, String> {
            fields
                .get(name)
                .and_then(FieldValue::as_text)
                .map(str::to_string)
                .ok_or_else(|| format!("missing text field '{}'", name))
        };

        let priority_label = text("priority")?;
        let priority = Priority::parse(&priority_label)
            .ok_or_else(|| format!("unknown priority '{}'", priority_label))?;

        let status = match fields.get("status").and_then(FieldValue::as_text) {
            Some(label) => Status::parse(label).ok_or_else(|| format!("unknown status '{}'", label))?,
            None => Status::default(),
        };

        Ok(Self {
            title: text("title")?,
            description: text("description")?,
            acceptance_criteria: text("acceptance_criteria")?,
            priority,
            story_points: fields.get("story_points").and_then(FieldValue::as_integer),
            status,
        })
    }
}

impl TestCase {
    /// Rebuild a test case from a field map
    pub fn from_fields(fields: &FieldMap) -> Result<Self, String> {
        let text = |name: &str| -> Result<String, String> {
            fields
                .get(name)
                .and_then(FieldValue::as_text)
                .map(str::to_string)
                .ok_or_else(|| format!("missing text field '{}'", name))
        };

        Ok(Self {
            name: text("name")?,
            description: text("description")?,
            preconditions: text("preconditions")?,
            steps: text("steps")?,
            expected_result: text("expected_result")?,
        })
    }
}

impl ExtractedRecord {
    /// Rebuild a record of the given kind from a field map
    pub fn from_fields(kind: RecordKind, fields: &FieldMap) -> Result<Self, String> {
        match kind {
            RecordKind::Story => UserStory::from_fields(fields).map(ExtractedRecord::Story),
            RecordKind::TestCase => TestCase::from_fields(fields).map(ExtractedRecord::TestCase),
        }
    }
}
