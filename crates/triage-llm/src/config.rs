//! Configuration for the language capability

use crate::capability::{BoundedCapability, OfflineCapability, PromptedCapability};
use crate::prompt::{PromptBuilder, DEFAULT_MAX_PROMPT_CHARS};
use crate::{gemini, ollama, GeminiProvider, LlmError, OllamaProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use triage_domain::LanguageCapability;

/// Which backend serves the capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// No capability; every stage uses its fallback
    None,
    /// Local Ollama server
    Ollama,
    /// Google Gemini API
    Gemini,
}

impl Default for ProviderKind {
    fn default() -> Self {
        ProviderKind::None
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" | "" => Ok(ProviderKind::None),
            "ollama" => Ok(ProviderKind::Ollama),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(format!("Invalid LLM provider: {}", other)),
        }
    }
}

/// Configuration for the language capability
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityConfig {
    /// Backend selection
    pub provider: ProviderKind,

    /// API endpoint; provider default when absent
    pub endpoint: Option<String>,

    /// Model name; provider default when absent
    pub model: Option<String>,

    /// Credential for hosted providers
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Hard limit for one capability call, retries included (seconds)
    pub timeout_secs: u64,

    /// HTTP attempts per call (Ollama)
    pub max_retries: u32,

    /// Maximum document characters placed in a prompt
    pub max_prompt_chars: usize,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::None,
            endpoint: None,
            model: None,
            api_key: None,
            timeout_secs: 20,
            max_retries: 2,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
        }
    }
}

impl CapabilityConfig {
    /// Get the call timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.max_prompt_chars == 0 {
            return Err("max_prompt_chars must be greater than 0".to_string());
        }
        if self.provider == ProviderKind::Gemini
            && self.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err("the gemini provider requires an api_key".to_string());
        }
        Ok(())
    }

    /// Build the capability described by this configuration
    ///
    /// Every provider-backed capability is wrapped in a
    /// [`BoundedCapability`] so no call can outlive `timeout_secs`.
    pub fn build(&self) -> Result<Arc<dyn LanguageCapability>, LlmError> {
        self.validate().map_err(LlmError::Config)?;

        let prompts = PromptBuilder::new(self.max_prompt_chars);
        let inner: Arc<dyn LanguageCapability> = match self.provider {
            ProviderKind::None => {
                info!("No LLM provider configured, all stages will use fallbacks");
                return Ok(Arc::new(OfflineCapability));
            }
            ProviderKind::Ollama => {
                let endpoint = self.endpoint.as_deref().unwrap_or(ollama::DEFAULT_ENDPOINT);
                let model = self.model.as_deref().unwrap_or("llama3");
                info!("Using Ollama model '{}' at {}", model, endpoint);
                let provider = OllamaProvider::with_timeout(endpoint, model, self.timeout())?
                    .with_max_retries(self.max_retries);
                Arc::new(PromptedCapability::new(provider, prompts))
            }
            ProviderKind::Gemini => {
                let endpoint = self.endpoint.as_deref().unwrap_or(gemini::DEFAULT_ENDPOINT);
                let model = self.model.as_deref().unwrap_or(gemini::DEFAULT_MODEL);
                let key = self.api_key.clone().unwrap_or_default();
                info!("Using Gemini model '{}'", model);
                let provider = GeminiProvider::new(endpoint, model, key, self.timeout())?;
                Arc::new(PromptedCapability::new(provider, prompts))
            }
        };

        Ok(Arc::new(BoundedCapability::new(inner, self.timeout())))
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CapabilityConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider, ProviderKind::None);
    }

    #[test]
    fn test_gemini_requires_key() {
        let config = CapabilityConfig {
            provider: ProviderKind::Gemini,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(matches!(config.build(), Err(LlmError::Config(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = CapabilityConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_none_is_offline() {
        let capability = CapabilityConfig::default().build().unwrap();
        assert_eq!(capability.name(), "offline");
    }

    #[test]
    fn test_build_ollama_is_bounded() {
        let config = CapabilityConfig {
            provider: ProviderKind::Ollama,
            model: Some("mistral".to_string()),
            ..Default::default()
        };
        let capability = config.build().unwrap();
        assert_eq!(capability.name(), "mistral");
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("none".parse::<ProviderKind>().unwrap(), ProviderKind::None);
        assert!("openai".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = CapabilityConfig::from_toml(
            r#"
            provider = "ollama"
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.provider, ProviderKind::Ollama);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.max_prompt_chars, DEFAULT_MAX_PROMPT_CHARS);
    }
}
