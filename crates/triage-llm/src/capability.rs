//! Adapters from LLM providers to the pipeline's language capability

use crate::parser::{parse_fields, parse_verdict};
use crate::prompt::PromptBuilder;
use crate::LlmProvider;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use triage_domain::{
    CapabilityError, CapabilityVerdict, FieldMap, Format, Intent, LanguageCapability,
};

/// Drives an [`LlmProvider`] with constrained prompts and parses the replies
pub struct PromptedCapability<P> {
    provider: P,
    prompts: PromptBuilder,
}

impl<P: LlmProvider> PromptedCapability<P> {
    /// Wrap a provider
    pub fn new(provider: P, prompts: PromptBuilder) -> Self {
        Self { provider, prompts }
    }

    /// Access the wrapped provider
    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: LlmProvider> LanguageCapability for PromptedCapability<P> {
    fn name(&self) -> &str {
        self.provider.model_name()
    }

    async fn classify_intent(
        &self,
        text: &str,
        labels: &[Intent],
    ) -> Result<CapabilityVerdict, CapabilityError> {
        let prompt = self.prompts.intent(text, labels);
        debug!("Intent prompt length: {} chars", prompt.len());

        let response = self.provider.generate(&prompt).await?;
        Ok(parse_verdict(&response)?)
    }

    async fn extract_fields(
        &self,
        text: &str,
        intent: Intent,
        format: Format,
    ) -> Result<FieldMap, CapabilityError> {
        let prompt = self.prompts.fields(text, intent, format);
        debug!("Field prompt length: {} chars", prompt.len());

        let response = self.provider.generate(&prompt).await?;
        Ok(parse_fields(&response)?)
    }
}

/// Capability used when no provider is configured; every call fails fast
#[derive(Debug, Clone, Default)]
pub struct OfflineCapability;

#[async_trait]
impl LanguageCapability for OfflineCapability {
    fn name(&self) -> &str {
        "offline"
    }

    async fn classify_intent(
        &self,
        _text: &str,
        _labels: &[Intent],
    ) -> Result<CapabilityVerdict, CapabilityError> {
        Err(CapabilityError::Unavailable(
            "no language capability configured".to_string(),
        ))
    }

    async fn extract_fields(
        &self,
        _text: &str,
        _intent: Intent,
        _format: Format,
    ) -> Result<FieldMap, CapabilityError> {
        Err(CapabilityError::Unavailable(
            "no language capability configured".to_string(),
        ))
    }
}

/// Bounds every call of an inner capability with a timeout
///
/// A call that exceeds the limit is dropped and reported as
/// [`CapabilityError::Timeout`].
pub struct BoundedCapability {
    inner: Arc<dyn LanguageCapability>,
    limit: Duration,
}

impl BoundedCapability {
    /// Wrap a capability with a per-call time limit
    pub fn new(inner: Arc<dyn LanguageCapability>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl LanguageCapability for BoundedCapability {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn classify_intent(
        &self,
        text: &str,
        labels: &[Intent],
    ) -> Result<CapabilityVerdict, CapabilityError> {
        match timeout(self.limit, self.inner.classify_intent(text, labels)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Intent classification via '{}' timed out", self.inner.name());
                Err(CapabilityError::Timeout(self.limit))
            }
        }
    }

    async fn extract_fields(
        &self,
        text: &str,
        intent: Intent,
        format: Format,
    ) -> Result<FieldMap, CapabilityError> {
        match timeout(self.limit, self.inner.extract_fields(text, intent, format)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Field extraction via '{}' timed out", self.inner.name());
                Err(CapabilityError::Timeout(self.limit))
            }
        }
    }
}
