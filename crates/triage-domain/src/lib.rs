//! Triage Domain Layer
//!
//! Core vocabulary shared by every stage of the document triage pipeline.
//! This crate holds value types and trait seams only; infrastructure lives
//! in the other crates.
//!
//! ## Key Concepts
//!
//! - **Thread**: one submitted document, addressed by a [`ThreadId`]
//! - **Format**: the structural kind of input (PDF, JSON, Email, Unknown)
//! - **Intent**: the semantic purpose of the content (Invoice, RFQ, ...)
//! - **Chain**: the append-only audit log of stages run for a thread
//! - **Capability**: an external language service that may fail at any time
//!
//! # Examples
//!
//! ```
//! use triage_domain::{Format, Intent, ProcessingContext, ThreadId};
//!
//! let ctx = ProcessingContext::new(ThreadId::new(), "file_upload");
//! assert_eq!(ctx.format, Format::Unknown);
//! assert_eq!(ctx.intent, Intent::Unknown);
//! assert!(ctx.chain.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod extraction;
pub mod input;
pub mod labels;
pub mod stage;
pub mod thread;
pub mod traits;

// Re-exports for convenience
pub use context::{ContextPatch, ProcessingContext};
pub use extraction::{
    AnomalyKind, AttachmentInfo, EntityKind, ExtractionResult, KeyEntity, ValidationAnomaly,
};
pub use input::{RawInput, PDF_SIGNATURE, PDF_WINDOW};
pub use labels::{Format, Intent, Sentiment, Urgency};
pub use stage::{StageMarker, StageName, StageOutcome, StageRecord};
pub use thread::ThreadId;
pub use traits::{CapabilityError, CapabilityVerdict, FieldMap, LanguageCapability};
