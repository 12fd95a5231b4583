//! End-to-end submissions against an in-process store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use triage_domain::{
    Format, Intent, LanguageCapability, RawInput, StageMarker, StageName, ThreadId, Urgency,
};
use triage_llm::prompt::PromptBuilder;
use triage_llm::{MockProvider, OfflineCapability, PromptedCapability};
use triage_pipeline::{Pipeline, PipelineConfig, PipelineError};
use triage_store::{ContextBackend, ContextStore, FieldEntries, StoreConfig, StoreError};

const ORDER_JSON: &str = r#"{"order_id": "PO-7", "customer": "Acme", "items": [{"sku": "A", "qty": 2}]}"#;

const URGENT_EMAIL: &str = "From: ops@example.com\n\
To: support@example.com\n\
Subject: URGENT outage\n\
\n\
Our checkout is failing, please fix this immediately.";

fn offline_pipeline() -> Pipeline {
    Pipeline::new(
        Arc::new(ContextStore::in_memory(&StoreConfig::default())),
        Arc::new(OfflineCapability),
        PipelineConfig::default(),
    )
}

fn mock_pipeline(provider: MockProvider) -> Pipeline {
    let capability: Arc<dyn LanguageCapability> =
        Arc::new(PromptedCapability::new(provider, PromptBuilder::default()));
    Pipeline::new(
        Arc::new(ContextStore::in_memory(&StoreConfig::default())),
        capability,
        PipelineConfig::default(),
    )
}

fn stages(ctx: &triage_domain::ProcessingContext) -> Vec<StageName> {
    ctx.chain.iter().map(|r| r.stage).collect()
}

#[tokio::test]
async fn test_chain_has_one_record_per_stage_in_order() {
    let pipeline = offline_pipeline();
    let submission = pipeline
        .submit(RawInput::from(ORDER_JSON), Some("api_call"))
        .await
        .unwrap();

    let ctx = pipeline.fetch(submission.thread_id).await.unwrap();
    assert_eq!(
        stages(&ctx),
        vec![
            StageName::Ingress,
            StageName::Detect,
            StageName::Classify,
            StageName::Route,
            StageName::Extract,
        ]
    );
    assert_eq!(ctx.format, Format::Json);
    assert_eq!(ctx.intent, submission.intent);
    assert_eq!(ctx.extracted.as_ref(), Some(&submission.extracted));
    assert_eq!(ctx.chain[3].detail.as_deref(), Some("json agent"));
}

#[tokio::test]
async fn test_unavailable_capability_degrades_every_format() {
    let pipeline = mock_pipeline(MockProvider::unavailable());

    for raw in [ORDER_JSON, URGENT_EMAIL, "plain words with no structure"] {
        let submission = pipeline.submit(RawInput::from(raw), None).await.unwrap();
        assert!(submission.confidence <= 0.6);

        let ctx = pipeline.fetch(submission.thread_id).await.unwrap();
        let classify = &ctx.chain[2];
        assert_eq!(classify.stage, StageName::Classify);
        assert!(classify.has_marker(StageMarker::FallbackUsed));
    }
}

#[tokio::test]
async fn test_capability_verdict_used_when_available() {
    let mut provider = MockProvider::new("{}");
    provider.add_response("Allowed labels", r#"{"intent": "Order", "confidence": 0.92}"#);
    provider.add_response("Extract structured fields", r#"{"note": "ignored for json"}"#);
    let pipeline = mock_pipeline(provider);

    let submission = pipeline.submit(RawInput::from(ORDER_JSON), None).await.unwrap();
    assert_eq!(submission.intent, Intent::Order);
    assert!((submission.confidence - 0.92).abs() < 1e-9);
    assert!(submission.extracted.anomalies.is_empty());
    assert_eq!(submission.extracted.field("order_id").unwrap(), "PO-7");

    let ctx = pipeline.fetch(submission.thread_id).await.unwrap();
    assert!(ctx.chain[2].markers.is_empty());
}

#[tokio::test]
async fn test_email_submission() {
    let pipeline = offline_pipeline();
    let submission = pipeline
        .submit(RawInput::from(URGENT_EMAIL), Some("file_upload"))
        .await
        .unwrap();

    assert_eq!(submission.format, Format::Email);
    assert!(submission.extracted.urgency >= Urgency::High);
    assert_eq!(submission.extracted.subject.as_deref(), Some("URGENT outage"));
}

#[tokio::test]
async fn test_unknown_format_marked() {
    let pipeline = offline_pipeline();
    let submission = pipeline
        .submit(RawInput::from("lorem ipsum dolor"), None)
        .await
        .unwrap();
    assert_eq!(submission.format, Format::Unknown);

    let ctx = pipeline.fetch(submission.thread_id).await.unwrap();
    assert!(ctx.chain[1].has_marker(StageMarker::UnknownFormat));
    assert!(ctx.chain[4].has_marker(StageMarker::UnknownFormat));
}

#[tokio::test]
async fn test_refetch_is_byte_identical() {
    let pipeline = offline_pipeline();
    let submission = pipeline.submit(RawInput::from(URGENT_EMAIL), None).await.unwrap();

    let first = pipeline.fetch(submission.thread_id).await.unwrap();
    let second = pipeline.fetch(submission.thread_id).await.unwrap();
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[tokio::test]
async fn test_oversized_input_rejected() {
    let config = PipelineConfig {
        max_input_bytes: 8,
        ..Default::default()
    };
    let pipeline = Pipeline::new(
        Arc::new(ContextStore::in_memory(&StoreConfig::default())),
        Arc::new(OfflineCapability),
        config,
    );

    let err = pipeline
        .submit(RawInput::from("far more than eight bytes"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InputTooLarge { limit: 8, .. }));
    assert!(pipeline.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_and_not_found() {
    let pipeline = offline_pipeline();
    let a = pipeline.submit(RawInput::from(ORDER_JSON), None).await.unwrap();
    let b = pipeline.submit(RawInput::from(URGENT_EMAIL), None).await.unwrap();

    let ids: Vec<ThreadId> = pipeline
        .list(None)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.thread_id)
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&a.thread_id) && ids.contains(&b.thread_id));

    let missing = ThreadId::new();
    assert_eq!(
        pipeline.fetch(missing).await.unwrap_err(),
        PipelineError::NotFound(missing)
    );
}

#[tokio::test]
async fn test_concurrent_submissions() {
    let pipeline = Arc::new(offline_pipeline());
    let mut handles = Vec::new();
    for i in 0..8 {
        let pipeline = Arc::clone(&pipeline);
        handles.push(tokio::spawn(async move {
            let raw = format!(r#"{{"sku": "S-{}", "qty": {}}}"#, i, i);
            pipeline.submit(RawInput::from(raw), None).await
        }));
    }

    for handle in handles {
        let submission = handle.await.unwrap().unwrap();
        let ctx = pipeline.fetch(submission.thread_id).await.unwrap();
        assert_eq!(ctx.chain.len(), 5);
    }
}

/// Primary that refuses every call
struct DeadBackend;

#[async_trait]
impl ContextBackend for DeadBackend {
    fn name(&self) -> &'static str {
        "dead"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn write_fields(&self, _: ThreadId, _: FieldEntries, _: Duration) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn read_fields(&self, _: ThreadId) -> Result<Option<HashMap<String, String>>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn push_chain(&self, _: ThreadId, _: String, _: Duration) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn read_chain(&self, _: ThreadId) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn exists(&self, _: ThreadId) -> Result<bool, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn index_created(&self, _: ThreadId, _: DateTime<Utc>) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn list_ids(&self, _: usize) -> Result<Vec<ThreadId>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_submit_succeeds_with_dead_primary() {
    let store = Arc::new(ContextStore::with_backend(
        Arc::new(DeadBackend),
        &StoreConfig::default(),
    ));
    let pipeline = Pipeline::new(
        Arc::clone(&store),
        Arc::new(OfflineCapability),
        PipelineConfig::default(),
    );

    let submission = pipeline.submit(RawInput::from(ORDER_JSON), None).await.unwrap();
    assert!(store.is_degraded());

    let ctx = pipeline.fetch(submission.thread_id).await.unwrap();
    assert_eq!(ctx.chain.len(), 5);

    let health = pipeline.health().await;
    assert!(health.degraded);
    assert!(!health.primary_reachable);
}
