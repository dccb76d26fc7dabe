//! Per-chunk extraction worker

use crate::error::WorkerFailure;
use crate::parser::{parse_model_output, ParsedOutput};
use crate::prompt::PromptBuilder;
use crate::schema::ExtractionSchema;
use std::sync::Arc;
use std::time::Duration;
use storyforge_domain::{Chunk, ModelClient};
use tracing::{debug, warn};

/// Turns one chunk into validated records
///
/// A worker holds no per-chunk state, so one instance is shared by every
/// task of a run. `process` blocks on the model call and must run on a
/// blocking thread.
pub struct ExtractionWorker {
    client: Arc<dyn ModelClient>,
    schema: ExtractionSchema,
    max_retries: u32,
    retry_backoff: Duration,
}

impl ExtractionWorker {
    /// Create a worker that never retries
    pub fn new(client: Arc<dyn ModelClient>, schema: ExtractionSchema) -> Self {
        Self {
            client,
            schema,
            max_retries: 0,
            retry_backoff: Duration::ZERO,
        }
    }

    /// Retry transient model errors up to `max_retries` times
    ///
    /// The delay starts at `backoff` and doubles after every attempt.
    pub fn with_retry(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }

    /// Schema this worker validates against
    pub fn schema(&self) -> &ExtractionSchema {
        &self.schema
    }

    /// Name of the model this worker calls
    pub fn model_name(&self) -> &str {
        self.client.name()
    }

    /// Prompt sent for the given chunk
    pub fn prompt_for(&self, chunk: &Chunk) -> String {
        PromptBuilder::new(&self.schema).build(&chunk.text)
    }

    /// Process one chunk: prompt, invoke, parse
    pub fn process(&self, chunk: &Chunk) -> Result<ParsedOutput, WorkerFailure> {
        let prompt = self.prompt_for(chunk);
        debug!("Chunk {}: prompt length {} chars", chunk.index, prompt.len());

        let response = self.invoke_with_retry(chunk.index, &prompt)?;
        debug!("Chunk {}: response length {} chars", chunk.index, response.len());

        parse_model_output(&response, &self.schema)
    }

    fn invoke_with_retry(&self, index: usize, prompt: &str) -> Result<String, WorkerFailure> {
        let mut attempt = 0;
        loop {
            match self.client.invoke(prompt) {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.retry_backoff.saturating_mul(1 << attempt.min(16));
                    attempt += 1;
                    warn!(
                        "Chunk {}: transient model error ({}), retry {}/{} in {:?}",
                        index, e, attempt, self.max_retries, delay
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use storyforge_llm::MockProvider;

    const STORIES: &str = r#"{"user_stories": [{
        "title": "Reset password",
        "description": "As a user I want to reset my password",
        "acceptance_criteria": "1. A reset link is emailed",
        "priority": "Medium"
    }]}"#;

    fn chunk(text: &str) -> Chunk {
        Chunk {
            index: 0,
            start: 0,
            overlap: 0,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_process_success() {
        let mock = MockProvider::new(STORIES);
        let worker = ExtractionWorker::new(Arc::new(mock.clone()), ExtractionSchema::story());

        let output = worker.process(&chunk("Users forget passwords.")).unwrap();
        assert_eq!(output.records.len(), 1);
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_permanent_error_is_not_retried() {
        let mut mock = MockProvider::new(STORIES);
        mock.add_error("FAIL");
        let worker = ExtractionWorker::new(Arc::new(mock.clone()), ExtractionSchema::story())
            .with_retry(3, Duration::ZERO);

        let err = worker.process(&chunk("FAIL")).unwrap_err();
        assert_eq!(err.kind, FailureKind::ModelCallFailure);
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_transient_error_retried() {
        let mut mock = MockProvider::default();
        mock.add_transient_failures("FLAKY", 2, STORIES);
        let worker = ExtractionWorker::new(Arc::new(mock.clone()), ExtractionSchema::story())
            .with_retry(2, Duration::from_millis(1));

        let output = worker.process(&chunk("FLAKY")).unwrap();
        assert_eq!(output.records.len(), 1);
        assert_eq!(mock.call_count(), 3);
    }

    #[test]
    fn test_retries_exhausted() {
        let mut mock = MockProvider::default();
        mock.add_transient_failures("FLAKY", 5, STORIES);
        let worker = ExtractionWorker::new(Arc::new(mock.clone()), ExtractionSchema::story())
            .with_retry(1, Duration::from_millis(1));

        let err = worker.process(&chunk("FLAKY")).unwrap_err();
        assert_eq!(err.kind, FailureKind::ModelCallFailure);
        assert_eq!(mock.call_count(), 2);
    }

    #[test]
    fn test_malformed_response() {
        let worker = ExtractionWorker::new(
            Arc::new(MockProvider::new("I could not find any stories.")),
            ExtractionSchema::story(),
        );
        let err = worker.process(&chunk("text")).unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedOutput);
    }
}
