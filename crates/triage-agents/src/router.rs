//! Format-based agent selection

use crate::agent::Agent;
use crate::config::AgentConfig;
use crate::email::EmailAgent;
use crate::json::JsonAgent;
use crate::noop::NoOpAgent;
use crate::pdf::PdfAgent;
use std::sync::Arc;
use tracing::debug;
use triage_domain::{Format, Intent, LanguageCapability};

/// Holds one agent per format
///
/// Routing is by format only; the intent is passed along to the agent so it
/// can pick schemas and fallback patterns.
pub struct Router {
    pdf: Agent,
    json: Agent,
    email: Agent,
    noop: Agent,
}

impl Router {
    /// Build every agent over a shared capability
    pub fn new(capability: Arc<dyn LanguageCapability>, config: AgentConfig) -> Self {
        Self {
            pdf: Agent::Pdf(PdfAgent::new(Arc::clone(&capability), config.clone())),
            json: Agent::Json(JsonAgent::new(config.clone())),
            email: Agent::Email(EmailAgent::new(capability, config)),
            noop: Agent::NoOp(NoOpAgent::new()),
        }
    }

    /// Agent responsible for a format
    pub fn agent_for(&self, format: Format) -> &Agent {
        match format {
            Format::Pdf => &self.pdf,
            Format::Json => &self.json,
            Format::Email => &self.email,
            Format::Unknown => &self.noop,
        }
    }

    /// Select the agent for a classified document
    pub fn route(&self, format: Format, intent: Intent) -> &Agent {
        let agent = self.agent_for(format);
        debug!("Routing {} document with intent {} to {} agent", format, intent, agent.name());
        agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_llm::OfflineCapability;

    #[test]
    fn test_routing_is_by_format() {
        let router = Router::new(Arc::new(OfflineCapability), AgentConfig::default());
        assert_eq!(router.route(Format::Pdf, Intent::Invoice).name(), "pdf");
        assert_eq!(router.route(Format::Json, Intent::Complaint).name(), "json");
        assert_eq!(router.route(Format::Email, Intent::Order).name(), "email");
        assert_eq!(router.route(Format::Unknown, Intent::Order).name(), "noop");
    }
}
