//! Submission pipeline
//!
//! Runs the stages of one submission strictly in order:
//! ingress, detect, classify, route, extract. Each stage appends one
//! record to the context chain after its write lands in the store.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use triage_agents::{AgentRequest, Router};
use triage_classifier::{FormatDetector, IntentClassifier};
use triage_domain::{
    ContextPatch, ExtractionResult, Format, Intent, LanguageCapability, ProcessingContext,
    RawInput, StageMarker, StageName, StageRecord, ThreadId,
};
use triage_store::{ContextStore, StoreError, StoreHealth};

/// What a successful submission returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Thread allocated for the submission
    pub thread_id: ThreadId,
    /// Detected format
    pub format: Format,
    /// Classified intent
    pub intent: Intent,
    /// Classification confidence
    pub confidence: f64,
    /// Agent result
    pub extracted: ExtractionResult,
}

/// Detector, classifier and agents wired to a context store
pub struct Pipeline {
    store: Arc<ContextStore>,
    detector: FormatDetector,
    classifier: IntentClassifier,
    router: Router,
    config: PipelineConfig,
}

impl Pipeline {
    /// Build every stage over a shared store and capability
    pub fn new(
        store: Arc<ContextStore>,
        capability: Arc<dyn LanguageCapability>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            detector: FormatDetector::new(),
            classifier: IntentClassifier::new(Arc::clone(&capability), config.classifier.clone()),
            router: Router::new(capability, config.agents.clone()),
            config,
        }
    }

    /// The context store this pipeline writes to
    pub fn store(&self) -> &Arc<ContextStore> {
        &self.store
    }

    /// Pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Reject input the stages cannot take
    ///
    /// Input must be non-empty, within the size limit, and either a PDF or
    /// valid UTF-8 text.
    pub fn check_input(&self, input: &RawInput) -> Result<()> {
        if input.is_empty() {
            return Err(PipelineError::UnsupportedInput("input is empty".to_string()));
        }
        if input.len() > self.config.max_input_bytes {
            return Err(PipelineError::InputTooLarge {
                size: input.len(),
                limit: self.config.max_input_bytes,
            });
        }
        if input.pdf_offset().is_none() && input.as_text().is_none() {
            return Err(PipelineError::UnsupportedInput(
                "input is neither a PDF nor UTF-8 text".to_string(),
            ));
        }
        Ok(())
    }

    /// Run one submission through every stage
    ///
    /// Capability failures are absorbed by the stages. Only rejected input
    /// and an unavailable store surface as errors.
    pub async fn submit(&self, input: RawInput, source: Option<&str>) -> Result<Submission> {
        self.check_input(&input)?;

        let source = source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.config.default_source.as_str());
        let ctx = ProcessingContext::new(ThreadId::new(), source);
        let id = ctx.thread_id;

        // Ingress
        self.store.create(&ctx).await.map_err(lost)?;
        let mut ingress = format!("source {}, {} bytes", source, input.len());
        if let Some(filename) = &input.filename {
            ingress.push_str(&format!(", filename {}", filename));
        }
        self.record(id, StageRecord::new(StageName::Ingress).with_detail(ingress))
            .await?;
        info!("Thread {} created for {} byte submission from {}", id, input.len(), source);

        // Detect
        let detection = self.detector.detect(&input);
        let format = detection.format;
        self.store
            .update(id, &ContextPatch::new().format(format))
            .await
            .map_err(lost)?;
        let mut detect = StageRecord::new(StageName::Detect).with_detail(detection.describe());
        if format == Format::Unknown {
            detect = detect.with_marker(StageMarker::UnknownFormat);
        }
        self.record(id, detect).await?;

        // Classify
        let text = self.router.agent_for(format).preview(&input);
        let classification = self.classifier.classify(format, &text).await;
        self.store
            .update(
                id,
                &ContextPatch::new()
                    .classification(classification.intent, classification.confidence),
            )
            .await
            .map_err(lost)?;
        self.record(
            id,
            StageRecord::new(StageName::Classify)
                .with_markers(classification.markers.iter().copied())
                .with_detail(classification.describe()),
        )
        .await?;

        // Route
        let agent = self.router.route(format, classification.intent);
        self.record(
            id,
            StageRecord::new(StageName::Route).with_detail(format!("{} agent", agent.name())),
        )
        .await?;

        // Extract
        let request = AgentRequest {
            input: &input,
            thread_id: id,
            format,
            intent: classification.intent,
            text: &text,
        };
        let outcome = agent.process(&request).await;
        self.store
            .update(id, &ContextPatch::new().extracted(outcome.result.clone()))
            .await
            .map_err(lost)?;
        let mut extract = StageRecord::new(StageName::Extract).with_markers(outcome.markers);
        if let Some(detail) = outcome.detail {
            extract = extract.with_detail(detail);
        }
        self.record(id, extract).await?;

        if classification.fallback_used {
            debug!("Thread {} classified through fallback", id);
        }
        info!(
            "Thread {} processed: {} / {} ({:.2})",
            id, format, classification.intent, classification.confidence
        );

        Ok(Submission {
            thread_id: id,
            format,
            intent: classification.intent,
            confidence: classification.confidence,
            extracted: outcome.result,
        })
    }

    /// Full context of a thread
    pub async fn fetch(&self, id: ThreadId) -> Result<ProcessingContext> {
        self.store
            .get(id)
            .await?
            .ok_or(PipelineError::NotFound(id))
    }

    /// Stored contexts, oldest first, bounded by the store's list limit
    pub async fn list(&self, limit: Option<usize>) -> Result<Vec<ProcessingContext>> {
        Ok(self.store.list_all(limit).await?)
    }

    /// Store reachability; never affects `submit`
    pub async fn health(&self) -> StoreHealth {
        self.store.health().await
    }

    async fn record(&self, id: ThreadId, record: StageRecord) -> Result<()> {
        self.store.append_chain(id, &record).await.map_err(lost)
    }
}

/// Store errors during a submission
///
/// A context that disappears mid-submission was lost in a failover, so
/// not-found is reported as an unavailable store.
fn lost(e: StoreError) -> PipelineError {
    match e {
        StoreError::NotFound(id) => {
            warn!("Thread {} vanished during processing", id);
            PipelineError::StoreUnavailable(format!("context {} was lost during processing", id))
        }
        other => PipelineError::StoreUnavailable(other.to_string()),
    }
}
