//! Triage LLM Provider Layer
//!
//! Pluggable LLM providers and the adapters that turn them into the
//! pipeline's [`LanguageCapability`](triage_domain::LanguageCapability).
//!
//! # Architecture
//!
//! ```text
//! LlmProvider (Ollama | Gemini | Mock)
//!     → PromptedCapability (prompt + parse)
//!     → BoundedCapability (timeout)
//!     → IntentClassifier / agents
//! ```
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//! - `GeminiProvider`: Google Generative Language API
//!
//! # Examples
//!
//! ```
//! use triage_llm::{LlmProvider, MockProvider};
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt").await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # });
//! ```

#![warn(missing_docs)]

pub mod capability;
pub mod config;
pub mod gemini;
pub mod ollama;
pub mod parser;
pub mod prompt;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use triage_domain::CapabilityError;

pub use capability::{BoundedCapability, OfflineCapability, PromptedCapability};
pub use config::{CapabilityConfig, ProviderKind};
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider misconfigured (missing key, bad endpoint)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<LlmError> for CapabilityError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Communication(msg) => CapabilityError::Communication(msg),
            LlmError::InvalidResponse(msg) => CapabilityError::InvalidResponse(msg),
            other => CapabilityError::Unavailable(other.to_string()),
        }
    }
}

/// Text-generation backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier, for logs
    fn model_name(&self) -> &str;

    /// Generate a completion for the prompt
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without any network calls. Specific
/// responses are matched by substring against the prompt, first match in
/// insertion order wins.
///
/// # Examples
///
/// ```
/// use triage_llm::{LlmProvider, MockProvider};
///
/// # tokio_test::block_on(async {
/// let mut provider = MockProvider::default();
/// provider.add_response("Classify", r#"{"intent": "Invoice", "confidence": 0.9}"#);
/// provider.add_error("Extract");
///
/// assert!(provider.generate("Classify this").await.unwrap().contains("Invoice"));
/// assert!(provider.generate("Extract fields").await.is_err());
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: Option<String>,
    responses: Arc<Mutex<Vec<(String, MockReply)>>>,
    call_count: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: Some(response.into()),
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    /// Create a provider that fails every call, as if the service were down
    pub fn unavailable() -> Self {
        Self {
            default_response: None,
            ..Self::new("")
        }
    }

    /// Sleep before answering (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a response for prompts containing `needle`
    pub fn add_response(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).push((needle.into(), MockReply::Text(response.into())));
    }

    /// Fail prompts containing `needle`
    pub fn add_error(&mut self, needle: impl Into<String>) {
        lock(&self.responses).push((needle.into(), MockReply::Error));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn model_name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = lock(&self.responses)
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error) => Err(LlmError::Communication("Mock error".to_string())),
            None => self
                .default_response
                .clone()
                .ok_or_else(|| LlmError::Communication("Mock provider unavailable".to_string())),
        }
    }
}
