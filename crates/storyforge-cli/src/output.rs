//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use serde_json::{json, Map, Value};
use storyforge_domain::{FieldMap, FieldValue};
use storyforge_extractor::RunResult;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format the outcome of an extraction run.
    pub fn run_report(&self, result: &RunResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.run_report_json(result),
            OutputFormat::Table => Ok(self.run_report_table(result)),
            OutputFormat::Quiet => Ok(self.run_report_quiet(result)),
        }
    }

    fn run_report_json(&self, result: &RunResult) -> Result<String> {
        let persisted: Vec<Value> = result
            .persistence
            .persisted
            .iter()
            .map(|p| {
                json!({
                    "id": p.record_id.to_string(),
                    "collection": p.collection,
                    "chunk_index": p.chunk_index,
                    "headline": p.headline,
                })
            })
            .collect();

        let records: Vec<Value> = result
            .records_in_chunk_order()
            .into_iter()
            .map(|r| {
                json!({
                    "chunk_index": r.chunk_index,
                    "fields": fields_to_json(&r.record.to_fields()),
                })
            })
            .collect();

        let mut failures: Vec<Value> = result
            .failures
            .iter()
            .map(|f| {
                json!({
                    "chunk_index": f.chunk_index,
                    "kind": f.kind.as_str(),
                    "detail": f.detail,
                })
            })
            .collect();
        failures.extend(result.persistence.failures.iter().map(|f| {
            json!({
                "chunk_index": f.chunk_index,
                "kind": f.kind().as_str(),
                "detail": format!("{}: {}", f.headline, f.reason),
            })
        }));

        let rejected: Vec<Value> = result
            .rejected
            .iter()
            .map(|r| {
                json!({
                    "chunk_index": r.chunk_index,
                    "position": r.position,
                    "reason": r.reason,
                })
            })
            .collect();

        let report = json!({
            "run_id": result.run_id.to_string(),
            "source_id": result.metadata.source_id,
            "kind": result.metadata.kind.as_str(),
            "model": result.metadata.model_name,
            "chunk_count": result.metadata.chunk_count,
            "timestamp": result.metadata.timestamp,
            "processing_time_ms": result.metadata.processing_time_ms,
            "complete": result.is_complete(),
            "records": records,
            "persisted": persisted,
            "failures": failures,
            "rejected": rejected,
            "cancelled": result.cancelled,
        });

        Ok(serde_json::to_string_pretty(&report)?)
    }

    fn run_report_table(&self, result: &RunResult) -> String {
        let mut sections = Vec::new();

        if result.persistence.persisted.is_empty() {
            sections.push(self.colorize("No records persisted.", "yellow"));
        } else {
            let mut builder = Builder::default();
            builder.push_record(["ID", "Chunk", "Collection", "Title"]);
            for record in &result.persistence.persisted {
                builder.push_record([
                    record.record_id.to_string(),
                    record.chunk_index.to_string(),
                    record.collection.to_string(),
                    record.headline.clone(),
                ]);
            }
            sections.push(Self::render(builder));
        }

        let failure_count = result.failures.len() + result.persistence.failed_count();
        if failure_count > 0 {
            let mut builder = Builder::default();
            builder.push_record(["Chunk", "Failure", "Detail"]);
            for failure in &result.failures {
                builder.push_record([
                    failure.chunk_index.to_string(),
                    failure.kind.to_string(),
                    failure.detail.clone(),
                ]);
            }
            for failure in &result.persistence.failures {
                builder.push_record([
                    failure.chunk_index.to_string(),
                    failure.kind().to_string(),
                    format!("{}: {}", failure.headline, failure.reason),
                ]);
            }
            sections.push(Self::render(builder));
        }

        let summary = format!(
            "Run {}: {} chunk(s), {} persisted, {} failed, {} rejected, {} cancelled in {}ms",
            result.run_id,
            result.metadata.chunk_count,
            result.persistence.persisted_count(),
            failure_count,
            result.rejected.len(),
            result.cancelled.len(),
            result.metadata.processing_time_ms
        );
        if result.is_complete() && result.persistence.failed_count() == 0 {
            sections.push(self.success(&summary));
        } else {
            sections.push(self.warning(&summary));
        }

        sections.join("\n")
    }

    /// Persisted record IDs, one per line.
    fn run_report_quiet(&self, result: &RunResult) -> String {
        result
            .persistence
            .record_ids()
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render(builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Convert a field map to a JSON object.
pub fn fields_to_json(fields: &FieldMap) -> Value {
    let object: Map<String, Value> = fields
        .iter()
        .map(|(name, value)| {
            let value = match value {
                FieldValue::Text(s) => Value::String(s.clone()),
                FieldValue::Integer(n) => Value::from(*n),
                FieldValue::Null => Value::Null,
            };
            (name.clone(), value)
        })
        .collect();
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyforge_domain::{
        ExtractedRecord, Priority, RecordId, RecordKind, RunId, Status, UserStory,
    };
    use storyforge_extractor::{
        ChunkFailure, FailureKind, PersistReport, PersistedRecord, RunMetadata, SourcedRecord,
    };

    fn create_test_result() -> RunResult {
        RunResult {
            run_id: RunId::new(),
            records: vec![SourcedRecord {
                chunk_index: 0,
                record: ExtractedRecord::Story(UserStory {
                    title: "Reset password".to_string(),
                    description: "As a user I want to reset my password".to_string(),
                    acceptance_criteria: "1. A link is emailed".to_string(),
                    priority: Priority::High,
                    story_points: Some(3),
                    status: Status::New,
                }),
            }],
            failures: vec![ChunkFailure {
                chunk_index: 1,
                kind: FailureKind::MalformedOutput,
                detail: "no JSON found".to_string(),
            }],
            rejected: Vec::new(),
            cancelled: Vec::new(),
            persistence: PersistReport {
                persisted: vec![PersistedRecord {
                    chunk_index: 0,
                    collection: "user_story",
                    record_id: RecordId::new("rec-1"),
                    headline: "Reset password".to_string(),
                }],
                failures: Vec::new(),
            },
            metadata: RunMetadata {
                source_id: "requirements.txt".to_string(),
                kind: RecordKind::Story,
                model_name: "mock".to_string(),
                chunk_count: 2,
                timestamp: 0,
                processing_time_ms: 12,
            },
        }
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.run_report(&create_test_result()).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["persisted"][0]["id"], "rec-1");
        assert_eq!(value["records"][0]["fields"]["story_points"], 3);
        assert_eq!(value["failures"][0]["kind"], FailureKind::MalformedOutput.as_str());
        assert_eq!(value["complete"], false);
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.run_report(&create_test_result()).unwrap();
        assert!(output.contains("Reset password"));
        assert!(output.contains("no JSON found"));
        assert!(output.contains("1 persisted"));
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.run_report(&create_test_result()).unwrap();
        assert_eq!(output, "rec-1");
    }

    #[test]
    fn test_messages_without_color() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("done"), "✓ done");
        assert_eq!(formatter.error("failed"), "✗ failed");
        assert_eq!(formatter.info("note"), "ℹ note");
        assert_eq!(formatter.warning("careful"), "⚠ careful");
    }
}
