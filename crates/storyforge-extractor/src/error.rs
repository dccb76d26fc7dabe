//! Error types for the Extractor

use std::fmt;
use storyforge_domain::ModelError;
use thiserror::Error;

/// Run-fatal errors
///
/// Anything that only affects one chunk or one record is reported inside
/// the `RunResult` instead.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Document could not be split (empty text, bad chunk parameters)
    #[error("Chunking error: {0}")]
    Chunking(String),

    /// A worker slot could not be allocated
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The user story to derive test cases from does not exist
    #[error("User story not found: {0}")]
    StoryNotFound(String),

    /// Caller input cannot be processed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Backing store error outside per-record persistence
    #[error("Store error: {0}")]
    Store(String),
}

/// Classification of a per-chunk or per-record failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The model call failed, panicked, or timed out
    ModelCallFailure,

    /// The model answered but not in the declared shape
    MalformedOutput,

    /// A parsed record violated a field constraint
    InvalidRecord,

    /// Writing a validated record to the store failed
    RecordPersistFailure,
}

impl FailureKind {
    /// Stable name used in logs and output
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ModelCallFailure => "ModelCallFailure",
            FailureKind::MalformedOutput => "MalformedOutput",
            FailureKind::InvalidRecord => "InvalidRecord",
            FailureKind::RecordPersistFailure => "RecordPersistFailure",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure returned by a worker for one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFailure {
    /// Failure classification
    pub kind: FailureKind,

    /// Human-readable detail
    pub message: String,
}

impl WorkerFailure {
    /// Create a failure of the given kind
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Model call failure
    pub fn model_call(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ModelCallFailure, message)
    }

    /// Malformed output failure
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedOutput, message)
    }
}

impl From<ModelError> for WorkerFailure {
    fn from(e: ModelError) -> Self {
        Self::model_call(e.to_string())
    }
}

impl fmt::Display for WorkerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
