//! Configuration for the format agents

use serde::{Deserialize, Serialize};

/// Configuration shared by every format agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Longest text kept in `ExtractionResult::content` (characters)
    pub max_content_chars: usize,

    /// Most key entities reported per document
    pub max_entities: usize,

    /// Ask the language capability for structured fields
    pub capability_fields: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_content_chars: 20_000,
            max_entities: 50,
            capability_fields: true,
        }
    }
}

impl AgentConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_content_chars == 0 {
            return Err("max_content_chars must be greater than 0".to_string());
        }
        if self.max_entities == 0 {
            return Err("max_entities must be greater than 0".to_string());
        }
        Ok(())
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

/// Truncate on a char boundary
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
