//! Configuration for the context store

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the context store
///
/// # Examples
///
/// ```
/// use triage_store::StoreConfig;
///
/// let config = StoreConfig::default();
/// assert_eq!(config.ttl_secs, 3600);
/// assert!(config.redis_url.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Networked backend target, e.g. `redis://localhost:6379/0`
    ///
    /// When absent the store runs on the in-process backend only.
    pub redis_url: Option<String>,

    /// Entry time-to-live, refreshed on every write (seconds)
    pub ttl_secs: u64,

    /// Time allowed to establish the primary connection (milliseconds)
    pub connect_timeout_ms: u64,

    /// Time allowed for one primary operation (milliseconds)
    pub op_timeout_ms: u64,

    /// Upper bound for `list_all`
    pub list_limit: usize,

    /// How often the expiry sweeper runs (seconds)
    pub sweep_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            ttl_secs: 3600,
            connect_timeout_ms: 2000,
            op_timeout_ms: 1000,
            list_limit: 100,
            sweep_interval_secs: 300,
        }
    }
}

impl StoreConfig {
    /// Get the TTL as a Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Get the connect timeout as a Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Get the per-operation timeout as a Duration
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }

    /// Get the sweep interval as a Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.ttl_secs == 0 {
            return Err("ttl_secs must be greater than 0".to_string());
        }
        if self.op_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err("store timeouts must be greater than 0".to_string());
        }
        if self.list_limit == 0 {
            return Err("list_limit must be greater than 0".to_string());
        }
        if self.sweep_interval_secs == 0 {
            return Err("sweep_interval_secs must be greater than 0".to_string());
        }
        if let Some(url) = &self.redis_url {
            if !(url.starts_with("redis://") || url.starts_with("rediss://")) {
                return Err(format!("redis_url must use redis:// or rediss://, got '{}'", url));
            }
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
