//! Pipeline configuration

use serde::{Deserialize, Serialize};
use triage_agents::AgentConfig;
use triage_classifier::ClassifierConfig;

/// Configuration for the submission pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Largest accepted submission (bytes); larger input is rejected
    pub max_input_bytes: usize,

    /// Source tag used when the caller gives none
    pub default_source: String,

    /// Intent classification settings
    pub classifier: ClassifierConfig,

    /// Format agent settings
    pub agents: AgentConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: 10 * 1024 * 1024,
            default_source: "api_call".to_string(),
            classifier: ClassifierConfig::default(),
            agents: AgentConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_input_bytes == 0 {
            return Err("max_input_bytes must be greater than 0".to_string());
        }
        if self.default_source.trim().is_empty() {
            return Err("default_source must not be empty".to_string());
        }
        self.classifier.validate()?;
        self.agents.validate()
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize TOML: {}", e))
    }
}
