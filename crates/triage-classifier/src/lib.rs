//! Triage Classifier
//!
//! The two classification stages of the pipeline:
//!
//! - `FormatDetector`: structural sniffing of raw bytes into PDF, JSON,
//!   Email or Unknown, with a confidence score
//! - `IntentClassifier`: asks the language capability for an intent label
//!   and falls back to a keyword heuristic when it cannot answer
//!
//! Neither stage fails; the worst outcome is `Unknown` with confidence 0.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use triage_classifier::{ClassifierConfig, FormatDetector, IntentClassifier};
//! use triage_domain::{Format, Intent, RawInput};
//! use triage_llm::OfflineCapability;
//!
//! # tokio_test::block_on(async {
//! let input = RawInput::from("From: a@example.com\nSubject: invoice overdue\n\nPayment due.");
//! let detection = FormatDetector::new().detect(&input);
//! assert_eq!(detection.format, Format::Email);
//!
//! let classifier = IntentClassifier::new(Arc::new(OfflineCapability), ClassifierConfig::default());
//! let classification = classifier.classify(detection.format, &input.text_lossy()).await;
//! assert_eq!(classification.intent, Intent::Invoice);
//! assert!(classification.fallback_used);
//! # });
//! ```

#![warn(missing_docs)]

pub mod classifier;
pub mod config;
pub mod detector;
pub mod keywords;

pub use classifier::{Classification, ClassificationMethod, IntentClassifier};
pub use config::ClassifierConfig;
pub use detector::{Detection, DetectionSignal, FormatDetector};
pub use keywords::{HeuristicMatch, KeywordHeuristic};
