//! Request and response types for extraction

use crate::error::FailureKind;
use storyforge_domain::{ExtractedRecord, OwnerMetadata, RecordId, RecordKind, RunId};

/// Request to extract records from text
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Text to extract records from
    pub text: String,

    /// Which kind of record to extract
    pub kind: RecordKind,

    /// Project and user the records are filed under
    pub owner: OwnerMetadata,

    /// Source identifier (file name or user-provided)
    pub source_id: String,
}

impl ExtractionRequest {
    /// Create a request with a generic source identifier
    pub fn new(text: impl Into<String>, kind: RecordKind, owner: OwnerMetadata) -> Self {
        Self {
            text: text.into(),
            kind,
            owner,
            source_id: "inline".to_string(),
        }
    }

    /// Set the source identifier
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self
    }
}

/// A validated record tagged with the chunk it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedRecord {
    /// Index of the originating chunk
    pub chunk_index: usize,

    /// The record
    pub record: ExtractedRecord,
}

/// A chunk that produced no usable output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    /// Index of the failed chunk
    pub chunk_index: usize,

    /// `ModelCallFailure` or `MalformedOutput`
    pub kind: FailureKind,

    /// Human-readable detail
    pub detail: String,
}

/// A parsed item dropped for violating the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRejection {
    /// Index of the originating chunk
    pub chunk_index: usize,

    /// Position of the item within that chunk's output
    pub position: usize,

    /// Why it was rejected
    pub reason: String,
}

/// A record that was written to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecord {
    /// Index of the originating chunk
    pub chunk_index: usize,

    /// Collection it was written to
    pub collection: &'static str,

    /// Id assigned by the store
    pub record_id: RecordId,

    /// Story title or test case name
    pub headline: String,
}

/// A record the store refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistFailure {
    /// Index of the originating chunk
    pub chunk_index: usize,

    /// Story title or test case name
    pub headline: String,

    /// Error reported by the store or the pre-write check
    pub reason: String,
}

impl PersistFailure {
    /// Failure classification, always `RecordPersistFailure`
    pub fn kind(&self) -> FailureKind {
        FailureKind::RecordPersistFailure
    }
}

/// Outcome of writing a run's records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistReport {
    /// Records written, in the order they were submitted
    pub persisted: Vec<PersistedRecord>,

    /// Records that could not be written
    pub failures: Vec<PersistFailure>,
}

impl PersistReport {
    /// Number of records written
    pub fn persisted_count(&self) -> usize {
        self.persisted.len()
    }

    /// Number of records that failed to write
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Ids of every written record
    pub fn record_ids(&self) -> Vec<&RecordId> {
        self.persisted.iter().map(|p| &p.record_id).collect()
    }
}

/// Metadata about an extraction run
#[derive(Debug, Clone)]
pub struct RunMetadata {
    /// Source identifier
    pub source_id: String,

    /// Kind of record extracted
    pub kind: RecordKind,

    /// Name of the model used
    pub model_name: String,

    /// Number of chunks the document was split into
    pub chunk_count: usize,

    /// Unix timestamp (seconds) when the run started
    pub timestamp: u64,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Result of one extraction run
///
/// Every chunk ends up in exactly one place: it contributed to `records`
/// (possibly with zero records), it is listed in `failures`, or it was never
/// dispatched and is listed in `cancelled`.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Identifier of this run, also stamped on every persisted record
    pub run_id: RunId,

    /// Validated records, in completion order
    pub records: Vec<SourcedRecord>,

    /// Chunks that failed as a whole
    pub failures: Vec<ChunkFailure>,

    /// Individual items dropped by validation
    pub rejected: Vec<RecordRejection>,

    /// Indices of chunks never dispatched because the run was cancelled
    pub cancelled: Vec<usize>,

    /// Outcome of writing `records` to the store
    pub persistence: PersistReport,

    /// Run metadata
    pub metadata: RunMetadata,
}

impl RunResult {
    /// Whether every chunk was processed without a failure
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.cancelled.is_empty()
    }

    /// Records sorted by originating chunk, stable within a chunk
    pub fn records_in_chunk_order(&self) -> Vec<&SourcedRecord> {
        let mut records: Vec<&SourcedRecord> = self.records.iter().collect();
        records.sort_by_key(|r| r.chunk_index);
        records
    }

    /// Failures of the given kind
    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &ChunkFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }
}
