//! Model provider configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which provider implementation to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Scripted mock, no network
    Mock,
    /// Local Ollama server
    #[default]
    Ollama,
}

/// Settings for the model client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider implementation
    #[serde(default)]
    pub provider: ProviderKind,

    /// API endpoint (ignored by the mock)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Fixed completion returned by the mock provider
    #[serde(default = "default_mock_response")]
    pub mock_response: String,
}

impl ModelConfig {
    /// HTTP request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Mock configuration answering every prompt with `response`
    pub fn mock(response: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::Mock,
            mock_response: response.into(),
            ..Self::default()
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout(),
            mock_response: default_mock_response(),
        }
    }
}

fn default_endpoint() -> String {
    crate::ollama::DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    "llama3.1".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout() -> u64 {
    crate::ollama::DEFAULT_TIMEOUT_SECS
}

fn default_mock_response() -> String {
    "[]".to_string()
}
