//! Triage Pipeline
//!
//! Ties the stages together. A submission gets a fresh thread, then runs
//! format detection, intent classification, agent routing and extraction
//! in that order, with every stage recorded in the context chain.
//!
//! Capability trouble never fails a submission. Only rejected input
//! (`UnsupportedInput`, `InputTooLarge`) and an unavailable store reach
//! the caller.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use triage_domain::{Format, RawInput, StageName};
//! use triage_llm::OfflineCapability;
//! use triage_pipeline::{Pipeline, PipelineConfig};
//! use triage_store::{ContextStore, StoreConfig};
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(ContextStore::in_memory(&StoreConfig::default()));
//! let pipeline = Pipeline::new(store, Arc::new(OfflineCapability), PipelineConfig::default());
//!
//! let submission = pipeline
//!     .submit(RawInput::from(r#"{"sku": "A-1", "qty": 4}"#), Some("api_call"))
//!     .await
//!     .unwrap();
//! assert_eq!(submission.format, Format::Json);
//!
//! let ctx = pipeline.fetch(submission.thread_id).await.unwrap();
//! assert_eq!(ctx.chain.len(), 5);
//! assert_eq!(ctx.chain[0].stage, StageName::Ingress);
//! # });
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, Submission};
