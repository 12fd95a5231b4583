//! Trait definitions for external interactions
//!
//! The language capability is the only external dependency the pipeline
//! core talks to directly. Implementations live in `triage-llm`.

use crate::labels::{Format, Intent};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

/// Structured fields returned by a capability
pub type FieldMap = Map<String, Value>;

/// Failure of a capability call
///
/// Every variant is absorbed by a fallback path; none is fatal to a request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CapabilityError {
    /// No capability configured or the service is down
    #[error("capability unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete in time
    #[error("capability call timed out after {0:?}")]
    Timeout(Duration),

    /// Transport failure
    #[error("capability communication error: {0}")]
    Communication(String),

    /// The response could not be understood
    #[error("invalid capability response: {0}")]
    InvalidResponse(String),
}

/// Raw answer to an intent question
///
/// The label is kept as returned so the caller can detect answers outside
/// the known set.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityVerdict {
    /// Label as returned by the capability
    pub label: String,
    /// Self-reported confidence (not yet clamped)
    pub confidence: f64,
    /// Optional explanation
    pub reasoning: Option<String>,
}

/// External language-understanding service
///
/// Implemented by the infrastructure layer (triage-llm)
#[async_trait]
pub trait LanguageCapability: Send + Sync {
    /// Short name for logs and chain details
    fn name(&self) -> &str;

    /// Pick one of `labels` for the text
    async fn classify_intent(
        &self,
        text: &str,
        labels: &[Intent],
    ) -> Result<CapabilityVerdict, CapabilityError>;

    /// Pull structured fields relevant to the intent
    async fn extract_fields(
        &self,
        text: &str,
        intent: Intent,
        format: Format,
    ) -> Result<FieldMap, CapabilityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCapability;

    #[async_trait]
    impl LanguageCapability for FixedCapability {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn classify_intent(
            &self,
            _text: &str,
            labels: &[Intent],
        ) -> Result<CapabilityVerdict, CapabilityError> {
            Ok(CapabilityVerdict {
                label: labels[0].as_str().to_string(),
                confidence: 0.9,
                reasoning: None,
            })
        }

        async fn extract_fields(
            &self,
            _text: &str,
            _intent: Intent,
            _format: Format,
        ) -> Result<FieldMap, CapabilityError> {
            Err(CapabilityError::Unavailable("no fields".to_string()))
        }
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let capability: Box<dyn LanguageCapability> = Box::new(FixedCapability);
        let verdict = capability
            .classify_intent("text", &Intent::ALL)
            .await
            .unwrap();
        assert_eq!(verdict.label, "Invoice");
        assert!(capability
            .extract_fields("text", Intent::Invoice, Format::Pdf)
            .await
            .is_err());
    }

    #[test]
    fn test_error_display() {
        let err = CapabilityError::Timeout(Duration::from_secs(5));
        assert!(err.to_string().contains("5s"));
    }
}
