//! Intent classification with deterministic fallback

use crate::config::ClassifierConfig;
use crate::keywords::{HeuristicMatch, KeywordHeuristic};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use triage_domain::{Format, Intent, LanguageCapability, StageMarker};

/// Which path produced the final label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    /// Capability verdict accepted as-is
    Capability,
    /// Keyword heuristic decided
    Heuristic,
    /// Neither path produced a label
    None,
}

/// Classifier output
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Assigned intent
    pub intent: Intent,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Path that produced the label
    pub method: ClassificationMethod,
    /// Whether the heuristic was consulted
    pub fallback_used: bool,
    /// Explanation from the capability or the heuristic
    pub reasoning: Option<String>,
    /// Chain markers for the classify stage
    pub markers: Vec<StageMarker>,
}

impl Classification {
    fn from_heuristic(m: HeuristicMatch) -> Self {
        Self {
            intent: m.intent,
            confidence: m.confidence,
            method: ClassificationMethod::Heuristic,
            fallback_used: true,
            reasoning: Some(format!("keyword match: {}", m.matched.join(", "))),
            markers: vec![StageMarker::FallbackUsed],
        }
    }

    fn unclassified(reasoning: String) -> Self {
        Self {
            intent: Intent::Unknown,
            confidence: 0.0,
            method: ClassificationMethod::None,
            fallback_used: true,
            reasoning: Some(reasoning),
            markers: vec![StageMarker::FallbackUsed],
        }
    }

    /// One-line description for the chain record
    pub fn describe(&self) -> String {
        let mut line = format!(
            "{} ({:.2}) via {:?}",
            self.intent, self.confidence, self.method
        );
        if let Some(reasoning) = &self.reasoning {
            line.push_str(": ");
            line.push_str(reasoning);
        }
        line
    }
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Assigns an intent label to pre-extracted document text
///
/// The capability is asked first. A failed, timed-out or malformed call
/// falls back to the keyword heuristic. A label outside the known set
/// yields `Unknown` with a `capability-anomaly` marker. A known label
/// below the configured minimum confidence is replaced by a heuristic
/// match when there is one.
pub struct IntentClassifier {
    capability: Arc<dyn LanguageCapability>,
    heuristic: KeywordHeuristic,
    config: ClassifierConfig,
    labels: Vec<Intent>,
}

impl IntentClassifier {
    /// Create a classifier over an already time-bounded capability
    pub fn new(capability: Arc<dyn LanguageCapability>, config: ClassifierConfig) -> Self {
        Self {
            capability,
            heuristic: KeywordHeuristic::new(config.heuristic_ceiling),
            labels: Intent::ALL
                .iter()
                .copied()
                .filter(|i| *i != Intent::Unknown)
                .collect(),
            config,
        }
    }

    /// Labels offered to the capability
    pub fn labels(&self) -> &[Intent] {
        &self.labels
    }

    /// Classify `text`; the format only feeds logging, the policy is the same for all
    pub async fn classify(&self, format: Format, text: &str) -> Classification {
        debug!("Classifying {} text ({} chars)", format, text.len());

        let verdict = match self.capability.classify_intent(text, &self.labels).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(
                    "Capability '{}' failed during classification, using keywords: {}",
                    self.capability.name(),
                    e
                );
                return match self.heuristic.classify(text) {
                    Some(m) => Classification::from_heuristic(m),
                    None => Classification::unclassified(format!("capability failed: {}", e)),
                };
            }
        };

        let Some(intent) = Intent::from_label(&verdict.label) else {
            warn!(
                "Capability '{}' returned unknown intent label '{}'",
                self.capability.name(),
                verdict.label
            );
            return Classification {
                intent: Intent::Unknown,
                confidence: 0.0,
                method: ClassificationMethod::Capability,
                fallback_used: false,
                reasoning: Some(format!("unrecognised label '{}'", verdict.label)),
                markers: vec![StageMarker::CapabilityAnomaly],
            };
        };

        let confidence = clamp_confidence(verdict.confidence);
        if confidence >= self.config.min_confidence {
            return Classification {
                intent,
                confidence,
                method: ClassificationMethod::Capability,
                fallback_used: false,
                reasoning: verdict.reasoning,
                markers: Vec::new(),
            };
        }

        debug!(
            "Capability confidence {:.2} below minimum {:.2}, consulting keywords",
            confidence, self.config.min_confidence
        );
        let mut classification = match self.heuristic.classify(text) {
            Some(m) => Classification::from_heuristic(m),
            None => Classification {
                intent,
                confidence,
                method: ClassificationMethod::Capability,
                fallback_used: true,
                reasoning: verdict.reasoning,
                markers: vec![StageMarker::FallbackUsed],
            },
        };
        classification.markers.push(StageMarker::LowConfidence);
        classification
    }
}
