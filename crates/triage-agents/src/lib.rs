//! Triage Agents
//!
//! Format-specific extraction. The router selects one agent per detected
//! format and each agent turns raw input into an `ExtractionResult`:
//!
//! - `PdfAgent`: page text via lopdf, capability fields with regex fallback,
//!   base64 preservation when the document has no text layer
//! - `JsonAgent`: target schema selection, canonical field mapping and
//!   non-fatal validation anomalies
//! - `EmailAgent`: MIME parsing, keyword urgency, lexicon sentiment and
//!   attachment listing
//! - `NoOpAgent`: empty result for unrecognised input
//!
//! Agents never fail. Problems surface as stage markers and anomalies.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use triage_agents::{AgentConfig, AgentRequest, Router};
//! use triage_domain::{Format, Intent, RawInput, ThreadId};
//! use triage_llm::OfflineCapability;
//!
//! # tokio_test::block_on(async {
//! let router = Router::new(Arc::new(OfflineCapability), AgentConfig::default());
//! let input = RawInput::from(r#"{"order_id": 7, "customer": "Acme", "items": []}"#);
//! let text = input.text_lossy();
//! let request = AgentRequest {
//!     input: &input,
//!     thread_id: ThreadId::new(),
//!     format: Format::Json,
//!     intent: Intent::Order,
//!     text: &text,
//! };
//!
//! let outcome = router.route(Format::Json, Intent::Order).process(&request).await;
//! assert!(outcome.result.anomalies.is_empty());
//! assert_eq!(outcome.result.field("customer").unwrap(), "Acme");
//! # });
//! ```

#![warn(missing_docs)]

pub mod agent;
pub mod config;
pub mod email;
pub mod entities;
pub mod json;
pub mod mime;
pub mod noop;
pub mod pdf;
pub mod router;
pub mod schema;
pub mod signals;

pub use agent::{Agent, AgentOutcome, AgentRequest};
pub use config::AgentConfig;
pub use email::EmailAgent;
pub use entities::extract_entities;
pub use json::JsonAgent;
pub use mime::{parse_message, ParsedMessage};
pub use noop::NoOpAgent;
pub use pdf::PdfAgent;
pub use router::Router;
pub use schema::TargetSchema;
