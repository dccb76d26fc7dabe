//! Storyforge Domain Layer
//!
//! This crate contains the domain model shared by every other Storyforge
//! crate. Apart from `uuid` it has no external dependencies, and it defines
//! the value types and trait interfaces that infrastructure plugs into.
//!
//! ## Key Concepts
//!
//! - **Chunk**: a bounded, ordered segment of a source document
//! - **Record**: a validated user story or test case extracted from one chunk
//! - **Run**: one pipeline invocation over one document, identified by a `RunId`
//! - **Ownership**: project and user a run's records are filed under
//!
//! ## Architecture
//!
//! - Pure data and trait definitions only
//! - `ModelClient` and `RecordStore` are the seams to the outside world
//! - Implementations live in `storyforge-llm` and `storyforge-store`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod fields;
pub mod id;
pub mod owner;
pub mod record;
pub mod traits;

// Re-exports for convenience
pub use chunk::{reassemble, Chunk};
pub use fields::{FieldMap, FieldValue};
pub use id::{RecordId, RunId};
pub use owner::OwnerMetadata;
pub use record::{ExtractedRecord, Priority, RecordKind, Status, TestCase, UserStory};
pub use traits::{ModelClient, ModelError, RecordStore};
