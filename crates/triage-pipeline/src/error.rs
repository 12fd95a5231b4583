//! Error types for the pipeline

use thiserror::Error;
use triage_domain::ThreadId;
use triage_store::StoreError;

/// Failures visible to callers of the pipeline
///
/// Capability failures and validation anomalies never appear here; they
/// are absorbed by the stages and recorded in the context chain.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Input rejected before any stage ran
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// Input larger than the configured limit
    #[error("Input too large: {size} bytes exceeds the {limit} byte limit")]
    InputTooLarge {
        /// Submitted size
        size: usize,
        /// Configured maximum
        limit: usize,
    },

    /// Unknown or expired thread
    #[error("Context not found: {0}")]
    NotFound(ThreadId),

    /// Neither store backend could serve the request
    #[error("Context store unavailable: {0}")]
    StoreUnavailable(String),
}

impl PipelineError {
    /// Whether the input itself was rejected
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PipelineError::UnsupportedInput(_) | PipelineError::InputTooLarge { .. }
        )
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => PipelineError::NotFound(id),
            other => PipelineError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_convert() {
        let id = ThreadId::new();
        assert_eq!(
            PipelineError::from(StoreError::NotFound(id)),
            PipelineError::NotFound(id)
        );
        assert!(matches!(
            PipelineError::from(StoreError::Timeout),
            PipelineError::StoreUnavailable(_)
        ));
    }

    #[test]
    fn test_rejections() {
        assert!(PipelineError::UnsupportedInput("empty".into()).is_rejection());
        assert!(PipelineError::InputTooLarge { size: 10, limit: 5 }.is_rejection());
        assert!(!PipelineError::NotFound(ThreadId::new()).is_rejection());
    }

    #[test]
    fn test_display() {
        let e = PipelineError::InputTooLarge { size: 10, limit: 5 };
        assert_eq!(e.to_string(), "Input too large: 10 bytes exceeds the 5 byte limit");
    }
}
