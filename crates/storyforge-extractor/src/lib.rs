//! Storyforge Extractor
//!
//! Turns requirement documents into user stories or test cases using a
//! language model, and files the results in a record store.
//!
//! # Overview
//!
//! A document is split into overlapping chunks, every chunk is sent to the
//! model in parallel with a bounded number of calls in flight, and each
//! answer is parsed and validated against the schema of the requested
//! record kind. Valid records are persisted with their project, user and
//! run tags. A chunk that fails, times out or returns garbage is reported
//! and never stops its siblings.
//!
//! # Architecture
//!
//! ```text
//! Text → TextChunker → FanOutCoordinator → ExtractionWorker (× N) → PersistenceSink → RecordStore
//!                                            │
//!                                            └→ ModelClient → parse_model_output
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use storyforge_domain::{OwnerMetadata, RecordKind};
//! use storyforge_extractor::{Extractor, ExtractorConfig};
//! use storyforge_llm::OllamaProvider;
//! use storyforge_store::SqliteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let model = OllamaProvider::new("http://localhost:11434", "llama3.1")?;
//! let store = SqliteStore::new("storyforge.db")?;
//! let extractor = Extractor::new(Arc::new(model), store, ExtractorConfig::default())?;
//!
//! let owner = OwnerMetadata::new("project-1", "user-1");
//! let result = extractor
//!     .run("Users must be able to reset their password.", RecordKind::Story, &owner)
//!     .await?;
//!
//! println!("Extracted: {} stories", result.records.len());
//! println!("Persisted: {}", result.persistence.persisted_count());
//! println!("Failed chunks: {}", result.failures.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod coordinator;
mod error;
mod extractor;
mod parser;
mod prompt;
mod schema;
mod sink;
mod types;
mod worker;


pub use chunking::{Chunks, TextChunker};
pub use config::ExtractorConfig;
pub use coordinator::{CollectedResults, CoordinatorState, FanOutCoordinator};
pub use error::{ExtractorError, FailureKind, WorkerFailure};
pub use extractor::Extractor;
pub use parser::{parse_model_output, ParsedOutput, RejectedItem};
pub use prompt::PromptBuilder;
pub use schema::{ExtractionSchema, FieldSpec, FieldType};
pub use sink::PersistenceSink;
pub use types::{
    ChunkFailure, ExtractionRequest, PersistFailure, PersistReport, PersistedRecord,
    RecordRejection, RunMetadata, RunResult, SourcedRecord,
};
pub use worker::ExtractionWorker;
