//! Server configuration
//!
//! Settings come from an optional TOML file, then environment variables
//! override individual values. The result is split into the component
//! configurations handed to the store, the capability and the pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use triage_llm::CapabilityConfig;
use triage_pipeline::PipelineConfig;
use triage_store::StoreConfig;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// An environment variable holds an unusable value
    #[error("Invalid value '{value}' for {var}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },

    /// A section failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Full server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port
    pub bind_port: u16,

    /// Context store settings
    pub store: StoreConfig,

    /// Language capability settings
    pub capability: CapabilityConfig,

    /// Pipeline, classifier and agent settings
    pub pipeline: PipelineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8000,
            store: StoreConfig::default(),
            capability: CapabilityConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load the file when given, then apply the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override values from environment variables
    ///
    /// `lookup` returns the value of a variable if it is set.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("TRIAGE_BIND") {
            let (host, port) = bind
                .rsplit_once(':')
                .and_then(|(host, port)| Some((host, port.parse::<u16>().ok()?)))
                .ok_or_else(|| ConfigError::InvalidEnv {
                    var: "TRIAGE_BIND",
                    value: bind.clone(),
                })?;
            self.bind_address = host.to_string();
            self.bind_port = port;
        }
        if let Some(url) = lookup("TRIAGE_REDIS_URL") {
            self.store.redis_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(ttl) = lookup("TRIAGE_STORE_TTL_SECS") {
            self.store.ttl_secs = parse_number("TRIAGE_STORE_TTL_SECS", &ttl)?;
        }
        if let Some(max) = lookup("TRIAGE_MAX_INPUT_BYTES") {
            self.pipeline.max_input_bytes = parse_number("TRIAGE_MAX_INPUT_BYTES", &max)?;
        }
        if let Some(timeout) = lookup("TRIAGE_CAPABILITY_TIMEOUT_SECS") {
            self.capability.timeout_secs = parse_number("TRIAGE_CAPABILITY_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(provider) = lookup("TRIAGE_LLM_PROVIDER") {
            self.capability.provider = provider.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "TRIAGE_LLM_PROVIDER",
                value: provider.clone(),
            })?;
        }
        if let Some(endpoint) = lookup("TRIAGE_LLM_ENDPOINT") {
            self.capability.endpoint = Some(endpoint);
        }
        if let Some(model) = lookup("TRIAGE_LLM_MODEL") {
            self.capability.model = Some(model);
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.capability.api_key = Some(key);
        }
        Ok(())
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid("bind_address must not be empty".to_string()));
        }
        self.store
            .validate()
            .and_then(|_| self.capability.validate())
            .and_then(|_| self.pipeline.validate())
            .map_err(ConfigError::Invalid)
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use triage_llm::ProviderKind;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
        assert!(config.store.redis_url.is_none());
        assert_eq!(config.capability.provider, ProviderKind::None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_sections() {
        let config = ServerConfig::from_toml(
            r#"
            bind_port = 9090

            [store]
            redis_url = "redis://cache:6379/0"
            ttl_secs = 600

            [capability]
            provider = "ollama"
            model = "mistral"

            [pipeline]
            max_input_bytes = 4096
            "#,
        )
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
        assert_eq!(config.store.redis_url.as_deref(), Some("redis://cache:6379/0"));
        assert_eq!(config.store.ttl_secs, 600);
        assert_eq!(config.capability.provider, ProviderKind::Ollama);
        assert_eq!(config.pipeline.max_input_bytes, 4096);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServerConfig::default();
        config
            .apply_env(env(&[
                ("TRIAGE_BIND", "0.0.0.0:8080"),
                ("TRIAGE_REDIS_URL", "redis://localhost:6379"),
                ("TRIAGE_STORE_TTL_SECS", "120"),
                ("TRIAGE_MAX_INPUT_BYTES", "1024"),
                ("TRIAGE_CAPABILITY_TIMEOUT_SECS", "5"),
                ("TRIAGE_LLM_PROVIDER", "gemini"),
                ("GEMINI_API_KEY", "secret"),
            ]))
            .unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.store.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.store.ttl_secs, 120);
        assert_eq!(config.pipeline.max_input_bytes, 1024);
        assert_eq!(config.capability.timeout_secs, 5);
        assert_eq!(config.capability.provider, ProviderKind::Gemini);
        assert_eq!(config.capability.api_key.as_deref(), Some("secret"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_env_values() {
        let mut config = ServerConfig::default();
        assert!(matches!(
            config.apply_env(env(&[("TRIAGE_STORE_TTL_SECS", "soon")])),
            Err(ConfigError::InvalidEnv { var: "TRIAGE_STORE_TTL_SECS", .. })
        ));
        assert!(config.apply_env(env(&[("TRIAGE_BIND", "localhost")])).is_err());
        assert!(config.apply_env(env(&[("TRIAGE_LLM_PROVIDER", "gpt")])).is_err());
    }

    #[test]
    fn test_gemini_without_key_is_invalid() {
        let mut config = ServerConfig::default();
        config
            .apply_env(env(&[("TRIAGE_LLM_PROVIDER", "gemini")]))
            .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
