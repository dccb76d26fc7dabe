//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Target chunk size (characters)
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,

    /// Preferred split point; empty means hard cuts only
    pub separator: String,

    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Maximum chunks processed at once
    pub max_concurrency: usize,

    /// Maximum time for a single worker invocation (milliseconds)
    pub worker_timeout_ms: u64,

    /// Extra attempts after a transient model error
    pub max_retries: u32,

    /// Delay before the first retry, doubled on each further retry (milliseconds)
    pub retry_backoff_ms: u64,
}

impl ExtractorConfig {
    /// Get the worker timeout as a Duration
    pub fn worker_timeout(&self) -> Duration {
        Duration::from_millis(self.worker_timeout_ms)
    }

    /// Get the initial retry backoff as a Duration
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            ));
        }
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".to_string());
        }
        if self.worker_timeout_ms == 0 {
            return Err("worker_timeout_ms must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            chunk_size: 1_000,
            chunk_overlap: 10,
            separator: "\n".to_string(),
            max_text_length: 500_000,
            max_concurrency: 4,
            worker_timeout_ms: 120_000,
            max_retries: 0,
            retry_backoff_ms: 500,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: more parallelism, smaller chunks, shorter timeouts
    pub fn aggressive() -> Self {
        Self {
            chunk_size: 600,
            chunk_overlap: 10,
            max_concurrency: 8,
            worker_timeout_ms: 60_000,
            ..Self::default()
        }
    }

    /// Lenient preset: larger chunks with more context, longer timeouts, one retry
    pub fn lenient() -> Self {
        Self {
            chunk_size: 2_000,
            chunk_overlap: 200,
            separator: "\n\n".to_string(),
            max_concurrency: 2,
            worker_timeout_ms: 300_000,
            max_retries: 1,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
