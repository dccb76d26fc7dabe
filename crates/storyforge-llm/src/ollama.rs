//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local model API.
//!
//! # Features
//!
//! - Async HTTP communication with the `/api/generate` endpoint
//! - Configurable endpoint, model, temperature and request timeout
//! - JSON output mode, so completions arrive as parseable JSON
//! - Failures classified as transient or permanent for the caller's retry policy
//!
//! # Examples
//!
//! ```no_run
//! use storyforge_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1").unwrap();
//! ```

use crate::{LlmError, ModelConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use storyforge_domain::{ModelClient, ModelError};
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for model requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Ollama API provider for local model inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    temperature: f32,
    json_mode: bool,
    timeout: Duration,
    client: reqwest::Client,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3.1", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider with an explicit HTTP request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: 0.7,
            json_mode: true,
            timeout,
            client: build_client(timeout)?,
        })
    }

    /// Build a provider from model configuration
    pub fn from_config(config: &ModelConfig) -> Result<Self, LlmError> {
        Ok(Self::with_timeout(&config.endpoint, &config.model, config.request_timeout())?
            .with_temperature(config.temperature))
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Toggle Ollama's JSON output mode
    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    /// Generate text using the Ollama API
    ///
    /// # Errors
    ///
    /// - `Communication` when the server is unreachable or answers 5xx
    /// - `RateLimitExceeded` on HTTP 429
    /// - `ModelNotAvailable` on HTTP 404
    /// - `Rejected` on any other 4xx
    /// - `InvalidResponse` when the response envelope cannot be decoded
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.generate_with(&self.client, prompt).await
    }

    async fn generate_with(&self, client: &reqwest::Client, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);

        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: self.json_mode.then_some("json"),
            options: OllamaOptions {
                temperature: self.temperature,
            },
        };

        debug!("POST {} (model {}, prompt {} chars)", url, self.model, prompt.len());

        let response = client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<OllamaGenerateResponse>()
                .await
                .map(|r| r.response)
                .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)));
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(match status {
            reqwest::StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(self.model.clone()),
            reqwest::StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded,
            s if s.is_server_error() => {
                LlmError::Communication(format!("HTTP {}: {}", s, error_text))
            }
            s => LlmError::Rejected(format!("HTTP {}: {}", s, error_text)),
        })
    }
}

impl ModelClient for OllamaProvider {
    fn name(&self) -> &str {
        &self.model
    }

    /// Blocking wrapper around [`OllamaProvider::generate`]
    ///
    /// Must be called off the async executor (e.g. inside
    /// `tokio::task::spawn_blocking`). Outside any runtime the call runs on
    /// a private current-thread runtime with its own HTTP client: pooled
    /// connections must not outlive the runtime that opened them.
    fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
        let result = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle.block_on(self.generate(prompt)),
            Err(_) => {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| LlmError::Config(format!("Failed to start runtime: {}", e)))?;
                let client = build_client(self.timeout)?;
                runtime.block_on(self.generate_with(&client, prompt))
            }
        };
        result.map_err(ModelError::from)
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))
}
