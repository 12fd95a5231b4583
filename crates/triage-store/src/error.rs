//! Error types for the context store

use thiserror::Error;
use triage_domain::ThreadId;

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Neither backend could serve the request
    #[error("Context store unavailable: {0}")]
    Unavailable(String),

    /// Backend operation failed
    #[error("Backend error: {0}")]
    Backend(String),

    /// Backend operation exceeded its time limit
    #[error("Backend operation timed out")]
    Timeout,

    /// Unknown or expired thread
    #[error("Context not found: {0}")]
    NotFound(ThreadId),

    /// Refused to overwrite an existing extraction result
    #[error("Context {0} already has an extraction result")]
    Conflict(ThreadId),

    /// Stored data could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether this error means the backend itself is broken
    ///
    /// Backend failures trigger failover; logical errors are returned
    /// to the caller as-is.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_) | StoreError::Backend(_) | StoreError::Timeout
        )
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Backend(e.to_string())
    }
}
