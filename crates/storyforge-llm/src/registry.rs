//! Explicit registry of model clients
//!
//! Built once at process start and passed by reference to whatever needs a
//! client. Lookups hand out `Arc` clones, so every worker shares the same
//! underlying client and connection pool.

use crate::{LlmError, MockProvider, ModelConfig, OllamaProvider, ProviderKind};
use std::collections::HashMap;
use std::sync::Arc;
use storyforge_domain::ModelClient;
use tracing::info;

/// Named collection of model clients with a default entry
pub struct ModelRegistry {
    clients: HashMap<String, Arc<dyn ModelClient>>,
    default_name: String,
}

impl ModelRegistry {
    /// Registry whose default client is `client`, registered as `name`
    pub fn new(name: impl Into<String>, client: Arc<dyn ModelClient>) -> Self {
        let name = name.into();
        let mut clients = HashMap::new();
        clients.insert(name.clone(), client);
        Self {
            clients,
            default_name: name,
        }
    }

    /// Construct the provider selected by `config` and register it as default
    pub fn from_config(config: &ModelConfig) -> Result<Self, LlmError> {
        let client: Arc<dyn ModelClient> = match config.provider {
            ProviderKind::Mock => Arc::new(MockProvider::new(config.mock_response.clone())),
            ProviderKind::Ollama => Arc::new(OllamaProvider::from_config(config)?),
        };
        info!("Model client ready: {:?} ({})", config.provider, client.name());
        Ok(Self::new(config.model.clone(), client))
    }

    /// Add or replace a named client
    pub fn register(&mut self, name: impl Into<String>, client: Arc<dyn ModelClient>) {
        self.clients.insert(name.into(), client);
    }

    /// Make an already registered client the default
    pub fn set_default(&mut self, name: &str) -> Result<(), LlmError> {
        if !self.clients.contains_key(name) {
            return Err(LlmError::Config(format!("No model client named '{}'", name)));
        }
        self.default_name = name.to_string();
        Ok(())
    }

    /// The default client
    pub fn default_client(&self) -> Arc<dyn ModelClient> {
        // The default name is only ever set to a registered key
        Arc::clone(&self.clients[&self.default_name])
    }

    /// Look up a client by name
    pub fn get(&self, name: &str) -> Result<Arc<dyn ModelClient>, LlmError> {
        self.clients
            .get(name)
            .cloned()
            .ok_or_else(|| LlmError::Config(format!("No model client named '{}'", name)))
    }

    /// Registered client names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clients.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mock_config() {
        let registry = ModelRegistry::from_config(&ModelConfig::mock("[]")).unwrap();
        let client = registry.default_client();
        assert_eq!(client.name(), "mock");
        assert_eq!(client.invoke("anything").unwrap(), "[]");
    }

    #[test]
    fn test_from_ollama_config() {
        let registry = ModelRegistry::from_config(&ModelConfig::default()).unwrap();
        assert_eq!(registry.default_client().name(), "llama3.1");
    }

    #[test]
    fn test_register_and_switch_default() {
        let mut registry = ModelRegistry::new("a", Arc::new(MockProvider::new("from a")));
        registry.register("b", Arc::new(MockProvider::new("from b")));
        assert_eq!(registry.names(), vec!["a", "b"]);

        registry.set_default("b").unwrap();
        assert_eq!(registry.default_client().invoke("x").unwrap(), "from b");
        assert!(registry.set_default("c").is_err());
    }

    #[test]
    fn test_clients_are_shared() {
        let mock = MockProvider::new("ok");
        let registry = ModelRegistry::new("m", Arc::new(mock.clone()));
        registry.get("m").unwrap().invoke("1").unwrap();
        registry.default_client().invoke("2").unwrap();
        assert_eq!(mock.call_count(), 2);
        assert!(registry.get("missing").is_err());
    }
}
