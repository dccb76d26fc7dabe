//! Core Extractor implementation

use crate::chunking::TextChunker;
use crate::config::ExtractorConfig;
use crate::coordinator::FanOutCoordinator;
use crate::error::ExtractorError;
use crate::schema::ExtractionSchema;
use crate::sink::PersistenceSink;
use crate::types::{ExtractionRequest, RunMetadata, RunResult};
use crate::worker::ExtractionWorker;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use storyforge_domain::{
    FieldMap, FieldValue, ModelClient, OwnerMetadata, RecordId, RecordKind, RecordStore, RunId,
};
use storyforge_llm::ModelRegistry;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The Extractor turns requirement text into persisted stories or test cases
///
/// One instance can serve many runs. The model client and store are
/// shared by every run; nothing else carries over between runs.
pub struct Extractor<S>
where
    S: RecordStore,
{
    client: Arc<dyn ModelClient>,
    store: Arc<S>,
    config: ExtractorConfig,
    cancel: CancellationToken,
}

impl<S> Extractor<S>
where
    S: RecordStore + 'static,
{
    /// Create a new Extractor
    ///
    /// Fails if the configuration is invalid.
    pub fn new(
        client: Arc<dyn ModelClient>,
        store: S,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        Self::with_shared_store(client, Arc::new(store), config)
    }

    /// Create an Extractor over a store the caller keeps a handle to
    pub fn with_shared_store(
        client: Arc<dyn ModelClient>,
        store: Arc<S>,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            client,
            store,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Create an Extractor using the registry's default model
    pub fn from_registry(
        registry: &ModelRegistry,
        store: S,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        Self::new(registry.default_client(), store, config)
    }

    /// Configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// The backing store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Stop dispatching chunks in current and future runs
    ///
    /// Chunks already handed to a worker still finish.
    pub fn cancel(&self) {
        info!("Cancellation requested");
        self.cancel.cancel();
    }

    /// Token cancelled by [`Extractor::cancel`]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Extract records of one kind from a document and persist them
    pub async fn run(
        &self,
        document_text: &str,
        kind: RecordKind,
        owner: &OwnerMetadata,
    ) -> Result<RunResult, ExtractorError> {
        self.extract(ExtractionRequest::new(document_text, kind, owner.clone()))
            .await
    }

    /// Extract records as described by the request and persist them
    pub async fn extract(&self, request: ExtractionRequest) -> Result<RunResult, ExtractorError> {
        let started = Instant::now();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        // Split first: nothing is dispatched for a document that can not be chunked
        let chunker = TextChunker::from_config(&self.config)?;
        let chunks = chunker.split(&request.text)?;
        let chunk_count = chunks.len();

        let run_id = RunId::new();
        info!(
            "Run {}: extracting {} from '{}' ({} chars, {} chunks, model {})",
            run_id,
            request.kind,
            request.source_id,
            request.text.chars().count(),
            chunk_count,
            self.client.name()
        );

        let worker = Arc::new(
            ExtractionWorker::new(
                Arc::clone(&self.client),
                ExtractionSchema::for_kind(request.kind),
            )
            .with_retry(self.config.max_retries, self.config.retry_backoff()),
        );
        let coordinator = FanOutCoordinator::new(
            self.config.max_concurrency,
            self.config.worker_timeout(),
            self.cancel.child_token(),
        );
        let collected = coordinator.run(chunks, worker).await?;

        let sink = PersistenceSink::new(Arc::clone(&self.store), self.config.max_concurrency);
        let persistence = sink.persist(&collected.records, &request.owner, run_id).await;

        let processing_time_ms = started.elapsed().as_millis() as u64;
        info!(
            "Run {} complete: {} records, {} persisted, {} chunk failures, {} rejected, {} cancelled in {}ms",
            run_id,
            collected.records.len(),
            persistence.persisted_count(),
            collected.failures.len(),
            collected.rejected.len(),
            collected.cancelled.len(),
            processing_time_ms
        );

        Ok(RunResult {
            run_id,
            records: collected.records,
            failures: collected.failures,
            rejected: collected.rejected,
            cancelled: collected.cancelled,
            persistence,
            metadata: RunMetadata {
                source_id: request.source_id,
                kind: request.kind,
                model_name: self.client.name().to_string(),
                chunk_count,
                timestamp,
                processing_time_ms,
            },
        })
    }

    /// Generate test cases for a persisted user story
    ///
    /// The story's title, description and acceptance criteria become the
    /// requirement text, and every generated test case is linked back to
    /// the story. Only the title and acceptance criteria must be present.
    pub async fn generate_test_cases(
        &self,
        user_story_id: &RecordId,
        owner: &OwnerMetadata,
    ) -> Result<RunResult, ExtractorError> {
        let story = self.load_story(user_story_id).await?;
        let text = story.requirement_text();
        let owner = owner.clone().with_user_story(user_story_id.as_str());
        let request = ExtractionRequest::new(text, RecordKind::TestCase, owner)
            .with_source_id(format!("user_story:{}", user_story_id));

        self.extract(request).await
    }

    async fn load_story(&self, id: &RecordId) -> Result<StorySource, ExtractorError> {
        let store = Arc::clone(&self.store);
        let lookup_id = id.clone();
        let fields = tokio::task::spawn_blocking(move || {
            store
                .get_by_id(RecordKind::Story.collection(), &lookup_id)
                .map_err(|e| ExtractorError::Store(e.to_string()))
        })
        .await
        .map_err(|e| ExtractorError::Store(format!("Task join error: {}", e)))??
        .ok_or_else(|| ExtractorError::StoryNotFound(id.to_string()))?;

        StorySource::from_fields(&fields).map_err(|e| {
            warn!("Stored user story {} is unusable: {}", id, e);
            ExtractorError::InvalidInput(format!("user story {}: {}", id, e))
        })
    }
}

/// The parts of a stored story that test cases are derived from
///
/// Only the title and acceptance criteria are required, so stories written
/// outside the pipeline can be used too.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StorySource {
    title: String,
    description: String,
    acceptance_criteria: String,
}

impl StorySource {
    fn from_fields(fields: &FieldMap) -> Result<Self, String> {
        let required = |name: &str| -> Result<String, String> {
            let value = text_field(fields, name);
            if value.trim().is_empty() {
                Err(format!("missing or blank '{}'", name))
            } else {
                Ok(value.to_string())
            }
        };

        Ok(Self {
            title: required("title")?,
            description: text_field(fields, "description").to_string(),
            acceptance_criteria: required("acceptance_criteria")?,
        })
    }

    fn requirement_text(&self) -> String {
        let mut text = format!("User Story: {}\n\n", self.title);
        if !self.description.trim().is_empty() {
            text.push_str(&format!("Description:\n{}\n\n", self.description));
        }
        text.push_str(&format!("Acceptance Criteria:\n{}\n", self.acceptance_criteria));
        text
    }
}

fn text_field<'a>(fields: &'a FieldMap, name: &str) -> &'a str {
    fields.get(name).and_then(FieldValue::as_text).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyforge_llm::{MockProvider, ModelConfig};
    use storyforge_store::MemoryStore;

    fn create_test_extractor(response: &str) -> Extractor<MemoryStore> {
        Extractor::new(
            Arc::new(MockProvider::new(response)),
            MemoryStore::new(),
            ExtractorConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ExtractorConfig {
            chunk_overlap: 5_000,
            ..ExtractorConfig::default()
        };
        let result = Extractor::new(Arc::new(MockProvider::default()), MemoryStore::new(), config);
        assert!(matches!(result, Err(ExtractorError::Config(_))));
    }

    #[test]
    fn test_from_registry() {
        let registry = ModelRegistry::from_config(&ModelConfig::mock("[]")).unwrap();
        let extractor =
            Extractor::from_registry(&registry, MemoryStore::new(), ExtractorConfig::default());
        assert!(extractor.is_ok());
    }

    #[tokio::test]
    async fn test_extract_empty_response() {
        let extractor = create_test_extractor(r#"{"user_stories": []}"#);
        let owner = OwnerMetadata::new("p", "u");

        let result = extractor
            .run("Some text", RecordKind::Story, &owner)
            .await
            .unwrap();
        assert!(result.records.is_empty());
        assert!(result.is_complete());
        assert_eq!(result.metadata.chunk_count, 1);
        assert_eq!(result.metadata.model_name, "mock");
    }

    #[tokio::test]
    async fn test_extract_text_too_long() {
        let config = ExtractorConfig {
            max_text_length: 100,
            ..ExtractorConfig::default()
        };
        let extractor =
            Extractor::new(Arc::new(MockProvider::default()), MemoryStore::new(), config).unwrap();

        let result = extractor
            .run(&"a".repeat(101), RecordKind::Story, &OwnerMetadata::new("p", "u"))
            .await;
        assert!(matches!(result, Err(ExtractorError::Chunking(_))));
    }

    #[test]
    fn test_missing_story() {
        let extractor = create_test_extractor("[]");
        let result = tokio_test::block_on(
            extractor.generate_test_cases(&RecordId::new("nope"), &OwnerMetadata::new("p", "u")),
        );
        assert!(matches!(result, Err(ExtractorError::StoryNotFound(_))));
    }

    #[test]
    fn test_story_source_needs_title_and_criteria_only() {
        let mut fields = FieldMap::new();
        fields.insert("title".into(), "Export report".into());
        fields.insert("acceptance_criteria".into(), "1. CSV downloaded".into());

        let story = StorySource::from_fields(&fields).unwrap();
        assert_eq!(
            story.requirement_text(),
            "User Story: Export report\n\nAcceptance Criteria:\n1. CSV downloaded\n"
        );

        fields.insert("description".into(), "As an admin".into());
        let story = StorySource::from_fields(&fields).unwrap();
        assert!(story.requirement_text().contains("Description:\nAs an admin\n"));
    }

    #[test]
    fn test_story_source_rejects_blank_criteria() {
        let mut fields = FieldMap::new();
        fields.insert("title".into(), "Export report".into());
        fields.insert("acceptance_criteria".into(), " ".into());

        let err = StorySource::from_fields(&fields).unwrap_err();
        assert!(err.contains("acceptance_criteria"));
    }
}
