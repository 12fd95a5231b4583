//! Chain records: the audit log of stages run for a thread

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage names, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Thread allocated and context created
    Ingress,
    /// Format detection
    Detect,
    /// Intent classification
    Classify,
    /// Agent selection
    Route,
    /// Agent extraction and result write
    Extract,
}

impl StageName {
    /// Stage name as stored in the chain
    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Ingress => "ingress",
            StageName::Detect => "detect",
            StageName::Classify => "classify",
            StageName::Route => "route",
            StageName::Extract => "extract",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Annotation recording an absorbed failure or notable condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageMarker {
    /// A deterministic fallback replaced the capability
    FallbackUsed,
    /// PDF text could not be extracted; raw bytes passed through
    TextExtractionDegraded,
    /// Result confidence is below the configured minimum
    LowConfidence,
    /// JSON validation reported anomalies
    ValidationAnomalies,
    /// Input format was not recognized
    UnknownFormat,
    /// The capability returned something outside its contract
    CapabilityAnomaly,
}

impl StageMarker {
    /// Whether this marker means the stage ran in a degraded mode
    pub fn is_degradation(&self) -> bool {
        !matches!(self, StageMarker::ValidationAnomalies)
    }
}

/// Overall outcome of one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// Stage ran normally
    Completed,
    /// Stage produced a result through a fallback path
    Degraded,
}

/// One entry of a context's chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage that ran
    pub stage: StageName,
    /// When the stage finished
    pub timestamp: DateTime<Utc>,
    /// Derived from the markers
    pub outcome: StageOutcome,
    /// Annotations, possibly empty
    pub markers: Vec<StageMarker>,
    /// Free-form note (chosen agent, detected format, ...)
    pub detail: Option<String>,
}

impl StageRecord {
    /// Start a record for a stage, timestamped now
    ///
    /// # Examples
    ///
    /// ```
    /// use triage_domain::{StageMarker, StageName, StageOutcome, StageRecord};
    ///
    /// let record = StageRecord::new(StageName::Classify)
    ///     .with_marker(StageMarker::FallbackUsed)
    ///     .with_detail("keyword heuristic");
    /// assert_eq!(record.outcome, StageOutcome::Degraded);
    /// ```
    pub fn new(stage: StageName) -> Self {
        Self {
            stage,
            timestamp: Utc::now(),
            outcome: StageOutcome::Completed,
            markers: Vec::new(),
            detail: None,
        }
    }

    /// Add a marker (duplicates are ignored)
    pub fn with_marker(mut self, marker: StageMarker) -> Self {
        if !self.markers.contains(&marker) {
            self.markers.push(marker);
        }
        if marker.is_degradation() {
            self.outcome = StageOutcome::Degraded;
        }
        self
    }

    /// Add several markers
    pub fn with_markers(self, markers: impl IntoIterator<Item = StageMarker>) -> Self {
        markers.into_iter().fold(self, Self::with_marker)
    }

    /// Attach a detail note
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Check for a marker
    pub fn has_marker(&self, marker: StageMarker) -> bool {
        self.markers.contains(&marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_record_is_completed() {
        let record = StageRecord::new(StageName::Detect);
        assert_eq!(record.outcome, StageOutcome::Completed);
        assert!(record.markers.is_empty());
    }

    #[test]
    fn test_anomalies_do_not_degrade() {
        let record = StageRecord::new(StageName::Extract)
            .with_marker(StageMarker::ValidationAnomalies);
        assert_eq!(record.outcome, StageOutcome::Completed);
    }

    #[test]
    fn test_duplicate_markers_collapse() {
        let record = StageRecord::new(StageName::Extract).with_markers([
            StageMarker::FallbackUsed,
            StageMarker::FallbackUsed,
        ]);
        assert_eq!(record.markers, vec![StageMarker::FallbackUsed]);
    }

    #[test]
    fn test_marker_wire_names() {
        let json = serde_json::to_string(&StageMarker::TextExtractionDegraded).unwrap();
        assert_eq!(json, "\"text-extraction-degraded\"");
        let json = serde_json::to_string(&StageMarker::FallbackUsed).unwrap();
        assert_eq!(json, "\"fallback-used\"");
    }

    #[test]
    fn test_stage_order() {
        assert!(StageName::Ingress < StageName::Detect);
        assert!(StageName::Route < StageName::Extract);
    }
}
