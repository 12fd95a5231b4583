//! Failover behaviour of the context store
//!
//! A switchable backend stands in for a primary that goes away mid-run.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use triage_domain::{ContextPatch, Format, Intent, ProcessingContext, StageName, StageRecord, ThreadId};
use triage_store::{ContextBackend, ContextStore, FieldEntries, MemoryBackend, StoreConfig, StoreError};

/// Memory backend that fails every call once `broken` is set
#[derive(Default)]
struct FlakyBackend {
    inner: MemoryBackend,
    broken: AtomicBool,
    calls: AtomicUsize,
}

impl FlakyBackend {
    fn break_now(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken.load(Ordering::SeqCst) {
            Err(StoreError::Backend("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContextBackend for FlakyBackend {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }

    async fn write_fields(&self, id: ThreadId, fields: FieldEntries, ttl: Duration) -> Result<(), StoreError> {
        self.check()?;
        self.inner.write_fields(id, fields, ttl).await
    }

    async fn read_fields(&self, id: ThreadId) -> Result<Option<HashMap<String, String>>, StoreError> {
        self.check()?;
        self.inner.read_fields(id).await
    }

    async fn push_chain(&self, id: ThreadId, record: String, ttl: Duration) -> Result<(), StoreError> {
        self.check()?;
        self.inner.push_chain(id, record, ttl).await
    }

    async fn read_chain(&self, id: ThreadId) -> Result<Vec<String>, StoreError> {
        self.check()?;
        self.inner.read_chain(id).await
    }

    async fn exists(&self, id: ThreadId) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.exists(id).await
    }

    async fn index_created(&self, id: ThreadId, created_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.check()?;
        self.inner.index_created(id, created_at).await
    }

    async fn list_ids(&self, limit: usize) -> Result<Vec<ThreadId>, StoreError> {
        self.check()?;
        self.inner.list_ids(limit).await
    }
}

fn flaky_store() -> (Arc<FlakyBackend>, ContextStore) {
    let primary = Arc::new(FlakyBackend::default());
    let store = ContextStore::with_backend(primary.clone(), &StoreConfig::default());
    (primary, store)
}

#[tokio::test]
async fn test_primary_serves_while_healthy() {
    let (primary, store) = flaky_store();
    let ctx = ProcessingContext::new(ThreadId::new(), "file_upload");
    store.create(&ctx).await.unwrap();

    assert!(!store.is_degraded());
    assert!(primary.inner.exists(ctx.thread_id).await.unwrap());
    assert!(store.local_backend().is_empty().await);

    let health = store.health().await;
    assert_eq!(health.active_backend, "flaky");
    assert!(health.primary_reachable);
    assert!(!health.degraded);
}

#[tokio::test]
async fn test_failure_mid_run_degrades_and_retries_locally() {
    let (primary, store) = flaky_store();
    let before = ProcessingContext::new(ThreadId::new(), "api_call");
    store.create(&before).await.unwrap();

    primary.break_now();

    // The failing call itself succeeds on the local backend
    let after = ProcessingContext::new(ThreadId::new(), "api_call");
    store.create(&after).await.unwrap();
    assert!(store.is_degraded());

    store
        .update(after.thread_id, &ContextPatch::new().classification(Intent::Order, 0.9))
        .await
        .unwrap();
    store
        .append_chain(after.thread_id, &StageRecord::new(StageName::Classify))
        .await
        .unwrap();

    let fetched = store.get(after.thread_id).await.unwrap().unwrap();
    assert_eq!(fetched.intent, Intent::Order);
    assert_eq!(fetched.chain.len(), 1);

    // Contexts written before the switch stay on the primary
    assert!(store.get(before.thread_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_no_repromotion_after_recovery() {
    let (primary, store) = flaky_store();
    primary.break_now();

    let ctx = ProcessingContext::new(ThreadId::new(), "x");
    store.create(&ctx).await.unwrap();
    assert!(store.is_degraded());

    primary.broken.store(false, Ordering::SeqCst);
    let calls = primary.calls.load(Ordering::SeqCst);

    store
        .update(ctx.thread_id, &ContextPatch::new().format(Format::Pdf))
        .await
        .unwrap();
    assert!(store.is_degraded());
    assert_eq!(primary.calls.load(Ordering::SeqCst), calls);

    let health = store.health().await;
    assert_eq!(health.active_backend, "memory");
    assert!(health.primary_reachable);
    assert!(health.degraded);
}

#[tokio::test]
async fn test_logical_errors_do_not_degrade() {
    let (_primary, store) = flaky_store();
    let id = ThreadId::new();

    let result = store.update(id, &ContextPatch::new().format(Format::Json)).await;
    assert_eq!(result, Err(StoreError::NotFound(id)));
    assert!(!store.is_degraded());
}

#[tokio::test]
async fn test_health_probe_does_not_degrade() {
    let (primary, store) = flaky_store();
    primary.break_now();

    let health = store.health().await;
    assert!(!health.primary_reachable);
    assert!(!health.degraded);
    assert!(!store.is_degraded());
}

#[tokio::test]
async fn test_list_after_failover_sees_local_contexts() {
    let (primary, store) = flaky_store();
    primary.break_now();

    for _ in 0..3 {
        store
            .create(&ProcessingContext::new(ThreadId::new(), "x"))
            .await
            .unwrap();
    }
    let listed = store.list_all(None).await.unwrap();
    assert_eq!(listed.len(), 3);
    assert!(listed.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}
