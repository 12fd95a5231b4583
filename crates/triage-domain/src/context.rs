//! Per-request processing state

use crate::extraction::ExtractionResult;
use crate::labels::{Format, Intent};
use crate::stage::StageRecord;
use crate::thread::ThreadId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the pipeline knows about one submission
///
/// Created at ingress, then mutated by the detector, classifier and the
/// selected agent in that order. Never deleted explicitly; it disappears
/// when the store's TTL lapses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingContext {
    /// Sole lookup key, immutable
    pub thread_id: ThreadId,

    /// Origin tag such as "file_upload" or "api_call"
    pub source: String,

    /// Detected format
    pub format: Format,

    /// Classified intent
    pub intent: Intent,

    /// Classification confidence in [0, 1]
    pub confidence: f64,

    /// Result written by exactly one agent
    pub extracted: Option<ExtractionResult>,

    /// Append-only stage log
    pub chain: Vec<StageRecord>,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl ProcessingContext {
    /// Fresh context with nothing detected yet
    pub fn new(thread_id: ThreadId, source: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            thread_id,
            source: source.into(),
            format: Format::Unknown,
            intent: Intent::Unknown,
            confidence: 0.0,
            extracted: None,
            chain: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update merged into an existing context
///
/// Absent fields are left untouched. `extracted` is write-once unless
/// `reprocess` is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextPatch {
    /// New format
    pub format: Option<Format>,
    /// New intent
    pub intent: Option<Intent>,
    /// New confidence (clamped to [0, 1] by the store)
    pub confidence: Option<f64>,
    /// Agent result
    pub extracted: Option<ExtractionResult>,
    /// Allow replacing an existing `extracted`
    pub reprocess: bool,
}

impl ContextPatch {
    /// Empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the format
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Set intent and confidence together
    pub fn classification(mut self, intent: Intent, confidence: f64) -> Self {
        self.intent = Some(intent);
        self.confidence = Some(confidence);
        self
    }

    /// Set the confidence alone
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Set the agent result
    pub fn extracted(mut self, result: ExtractionResult) -> Self {
        self.extracted = Some(result);
        self
    }

    /// Mark this patch as an explicit re-process
    pub fn reprocess(mut self) -> Self {
        self.reprocess = true;
        self
    }

    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.format.is_none()
            && self.intent.is_none()
            && self.confidence.is_none()
            && self.extracted.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_defaults() {
        let id = ThreadId::new();
        let ctx = ProcessingContext::new(id, "api_call");
        assert_eq!(ctx.thread_id, id);
        assert_eq!(ctx.source, "api_call");
        assert_eq!(ctx.confidence, 0.0);
        assert!(ctx.extracted.is_none());
        assert_eq!(ctx.created_at, ctx.updated_at);
    }

    #[test]
    fn test_patch_builder() {
        let patch = ContextPatch::new()
            .format(Format::Pdf)
            .classification(Intent::Invoice, 0.8);
        assert!(!patch.is_empty());
        assert_eq!(patch.format, Some(Format::Pdf));
        assert_eq!(patch.intent, Some(Intent::Invoice));
        assert!(!patch.reprocess);
        assert!(ContextPatch::new().reprocess().is_empty());
    }

    #[test]
    fn test_context_json_round_trip() {
        let ctx = ProcessingContext::new(ThreadId::new(), "file_upload");
        let json = serde_json::to_string(&ctx).unwrap();
        let back: ProcessingContext = serde_json::from_str(&json).unwrap();
        assert_eq!(ctx, back);
    }
}
