//! Agent for unrecognised input

use crate::agent::{AgentOutcome, AgentRequest};
use tracing::debug;
use triage_domain::{ExtractionResult, RawInput, StageMarker};

/// Produces an empty result marked as unknown format
#[derive(Debug, Clone, Default)]
pub struct NoOpAgent;

impl NoOpAgent {
    /// Create the no-op agent
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn preview(&self, input: &RawInput) -> String {
        input.text_lossy()
    }

    pub(crate) fn process(&self, request: &AgentRequest<'_>) -> AgentOutcome {
        debug!("No agent for thread {}; recording empty result", request.thread_id);
        let mut outcome = AgentOutcome::new(ExtractionResult::empty(request.format))
            .with_detail("format not recognised; nothing extracted");
        outcome.mark(StageMarker::UnknownFormat);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_domain::{Format, Intent, ThreadId};

    #[test]
    fn test_empty_result() {
        let input = RawInput::from("???");
        let request = AgentRequest {
            input: &input,
            thread_id: ThreadId::new(),
            format: Format::Unknown,
            intent: Intent::Unknown,
            text: "???",
        };
        let outcome = NoOpAgent::new().process(&request);
        assert_eq!(outcome.result, ExtractionResult::empty(Format::Unknown));
        assert_eq!(outcome.markers, vec![StageMarker::UnknownFormat]);
    }
}
