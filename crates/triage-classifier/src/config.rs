//! Configuration for the intent classifier

use serde::{Deserialize, Serialize};

/// Configuration for the intent classifier
///
/// # Examples
///
/// ```
/// use triage_classifier::ClassifierConfig;
///
/// let config = ClassifierConfig::from_toml("min_confidence = 0.7").unwrap();
/// assert_eq!(config.min_confidence, 0.7);
/// assert_eq!(config.heuristic_ceiling, 0.6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Capability verdicts below this confidence consult the heuristic
    pub min_confidence: f64,

    /// Highest confidence the keyword heuristic may report
    pub heuristic_ceiling: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            heuristic_ceiling: 0.6,
        }
    }
}

impl ClassifierConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err("min_confidence must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.heuristic_ceiling) {
            return Err("heuristic_ceiling must be between 0.0 and 1.0".to_string());
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
