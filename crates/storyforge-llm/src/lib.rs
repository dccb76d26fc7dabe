//! Storyforge Model Client Layer
//!
//! Pluggable implementations of the `ModelClient` capability from
//! `storyforge-domain`, plus the registry that selects one from configuration.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic scripted responses for testing
//! - `OllamaProvider`: Local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use storyforge_llm::MockProvider;
//! use storyforge_domain::ModelClient;
//!
//! let provider = MockProvider::new("Hello from the model!");
//! let result = provider.invoke("test prompt").unwrap();
//! assert_eq!(result, "Hello from the model!");
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod mock;
pub mod ollama;
pub mod registry;

use storyforge_domain::ModelError;
use thiserror::Error;

pub use config::{ModelConfig, ProviderKind};
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use registry::ModelRegistry;

/// Errors that can occur during model operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The API refused the request (4xx other than 404/429)
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Invalid response envelope from the API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider could not be constructed or looked up
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<LlmError> for ModelError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Communication(_) | LlmError::RateLimitExceeded => {
                ModelError::Transient(e.to_string())
            }
            LlmError::Rejected(_)
            | LlmError::InvalidResponse(_)
            | LlmError::ModelNotAvailable(_)
            | LlmError::Config(_) => ModelError::Permanent(e.to_string()),
        }
    }
}
