//! The uniform agent contract

use crate::email::EmailAgent;
use crate::json::JsonAgent;
use crate::noop::NoOpAgent;
use crate::pdf::PdfAgent;
use triage_domain::{ExtractionResult, Format, Intent, RawInput, StageMarker, ThreadId};

/// Everything an agent needs to process one submission
#[derive(Debug, Clone, Copy)]
pub struct AgentRequest<'a> {
    /// Raw submitted bytes
    pub input: &'a RawInput,
    /// Thread the result belongs to
    pub thread_id: ThreadId,
    /// Detected format; copied into the result unchanged
    pub format: Format,
    /// Classified intent
    pub intent: Intent,
    /// Text already extracted for classification
    pub text: &'a str,
}

/// Agent output: the result plus chain annotations for the extract stage
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutcome {
    /// Extraction result
    pub result: ExtractionResult,
    /// Markers for the extract stage record
    pub markers: Vec<StageMarker>,
    /// Short human-readable summary
    pub detail: Option<String>,
}

impl AgentOutcome {
    /// Outcome without markers
    pub fn new(result: ExtractionResult) -> Self {
        Self {
            result,
            markers: Vec::new(),
            detail: None,
        }
    }

    /// Add a marker (deduplicated)
    pub fn mark(&mut self, marker: StageMarker) {
        if !self.markers.contains(&marker) {
            self.markers.push(marker);
        }
    }

    /// Set the summary
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// A format agent
///
/// Closed set: one variant per supported format plus the no-op agent for
/// unrecognised input. Agents never fail; problems are reported through
/// markers and anomalies inside the outcome.
pub enum Agent {
    /// PDF documents
    Pdf(PdfAgent),
    /// JSON payloads
    Json(JsonAgent),
    /// RFC-822 messages
    Email(EmailAgent),
    /// Anything unrecognised
    NoOp(NoOpAgent),
}

impl Agent {
    /// Agent name for logs and chain details
    pub fn name(&self) -> &'static str {
        match self {
            Agent::Pdf(_) => "pdf",
            Agent::Json(_) => "json",
            Agent::Email(_) => "email",
            Agent::NoOp(_) => "noop",
        }
    }

    /// Minimal text extraction used for intent classification
    pub fn preview(&self, input: &RawInput) -> String {
        match self {
            Agent::Pdf(agent) => agent.preview(input),
            Agent::Json(agent) => agent.preview(input),
            Agent::Email(agent) => agent.preview(input),
            Agent::NoOp(agent) => agent.preview(input),
        }
    }

    /// Process one submission
    pub async fn process(&self, request: &AgentRequest<'_>) -> AgentOutcome {
        match self {
            Agent::Pdf(agent) => agent.process(request).await,
            Agent::Json(agent) => agent.process(request),
            Agent::Email(agent) => agent.process(request).await,
            Agent::NoOp(agent) => agent.process(request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_deduplicates() {
        let mut outcome = AgentOutcome::new(ExtractionResult::empty(Format::Json));
        outcome.mark(StageMarker::FallbackUsed);
        outcome.mark(StageMarker::FallbackUsed);
        assert_eq!(outcome.markers, vec![StageMarker::FallbackUsed]);
    }
}
