//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{FieldMap, RecordId};
use std::fmt;

/// Failure of a single model invocation
///
/// Providers classify every failure so callers can decide whether a retry
/// could help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Temporary condition (network error, overload, rate limit)
    Transient(String),

    /// Will not succeed on retry (bad request, unknown model, auth)
    Permanent(String),
}

impl ModelError {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ModelError::Transient(_))
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Transient(msg) => write!(f, "transient model error: {}", msg),
            ModelError::Permanent(msg) => write!(f, "permanent model error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

/// Capability to turn a prompt into a completion
///
/// Implemented by the infrastructure layer (storyforge-llm). Calls are
/// synchronous; async callers run them on a blocking thread.
pub trait ModelClient: Send + Sync {
    /// Name of the underlying model, for run metadata
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`
    fn invoke(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Trait for writing records to and reading them from a backing store
///
/// Implemented by the infrastructure layer (storyforge-store). A single
/// instance is shared by concurrent writers, so implementations must be
/// safe for concurrent use.
pub trait RecordStore: Send + Sync {
    /// Error type for store operations
    type Error: fmt::Display + Send;

    /// Create a record in `collection` holding exactly `fields`
    ///
    /// Either every field is written or nothing is.
    fn create(&self, collection: &str, fields: &FieldMap) -> Result<RecordId, Self::Error>;

    /// Fetch a record by id
    fn get_by_id(&self, collection: &str, id: &RecordId) -> Result<Option<FieldMap>, Self::Error>;
}
