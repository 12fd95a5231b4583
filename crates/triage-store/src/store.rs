//! Context store with one-way failover to the in-process backend

use crate::backend::ContextBackend;
use crate::codec;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::memory::MemoryBackend;
use crate::redis_backend::RedisBackend;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use triage_domain::{ContextPatch, ProcessingContext, StageRecord, ThreadId};

/// Backend state reported by [`ContextStore::health`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHealth {
    /// Backend currently serving requests ("redis" or "memory")
    pub active_backend: String,
    /// Whether a networked backend was configured
    pub primary_configured: bool,
    /// Whether the networked backend answered just now
    pub primary_reachable: bool,
    /// Whether the store has fallen back to the in-process backend
    pub degraded: bool,
}

/// Thread-addressable store for processing contexts
///
/// Serves every call from the networked primary while it works. The first
/// primary failure (at construction or later) switches the store to the
/// in-process backend for the rest of the process lifetime; the failed
/// operation is retried there. Contexts written to the primary before the
/// switch are not carried over.
pub struct ContextStore {
    primary: Option<Arc<dyn ContextBackend>>,
    local: Arc<MemoryBackend>,
    degraded: AtomicBool,
    primary_configured: bool,
    ttl: Duration,
    list_limit: usize,
}

impl ContextStore {
    /// Build a store from configuration, probing the primary if configured
    ///
    /// Never fails because of the primary: an unreachable target means
    /// the store starts degraded.
    pub async fn connect(config: &StoreConfig) -> Self {
        let Some(url) = config.redis_url.as_deref() else {
            info!("No redis_url configured, using in-process context store");
            return Self::build(None, false, config);
        };

        let probe = async {
            let backend = RedisBackend::connect(url, config.connect_timeout(), config.op_timeout()).await?;
            backend.ping().await?;
            Ok::<_, StoreError>(backend)
        };

        match probe.await {
            Ok(backend) => {
                info!("Context store using redis primary");
                Self::build(Some(Arc::new(backend)), true, config)
            }
            Err(e) => {
                warn!(
                    "Redis primary unreachable ({}), context store degraded to in-process backend",
                    e
                );
                let store = Self::build(None, true, config);
                store.degraded.store(true, Ordering::SeqCst);
                store
            }
        }
    }

    /// Build a store around an explicit primary backend
    pub fn with_backend(primary: Arc<dyn ContextBackend>, config: &StoreConfig) -> Self {
        Self::build(Some(primary), true, config)
    }

    /// Build a store on the in-process backend only
    pub fn in_memory(config: &StoreConfig) -> Self {
        Self::build(None, false, config)
    }

    fn build(
        primary: Option<Arc<dyn ContextBackend>>,
        primary_configured: bool,
        config: &StoreConfig,
    ) -> Self {
        Self {
            primary,
            local: Arc::new(MemoryBackend::new()),
            degraded: AtomicBool::new(false),
            primary_configured,
            ttl: config.ttl(),
            list_limit: config.list_limit,
        }
    }

    /// Override the entry TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Whether the store has switched to the in-process backend
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    /// The in-process backend (used by the expiry sweeper)
    pub fn local_backend(&self) -> Arc<MemoryBackend> {
        Arc::clone(&self.local)
    }

    fn active_primary(&self) -> Option<Arc<dyn ContextBackend>> {
        if self.is_degraded() {
            None
        } else {
            self.primary.clone()
        }
    }

    fn demote(&self, cause: &StoreError) {
        if !self.degraded.swap(true, Ordering::SeqCst) {
            warn!(
                "Context store primary failed ({}), degrading to in-process backend",
                cause
            );
        }
    }

    /// Run a logical operation on the active backend, failing over once
    async fn execute<T, F, Fut>(&self, op: F) -> Result<T, StoreError>
    where
        F: Fn(Arc<dyn ContextBackend>) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        if let Some(primary) = self.active_primary() {
            match op(primary).await {
                Err(e) if e.is_backend_failure() => self.demote(&e),
                other => return other,
            }
        }

        let local: Arc<dyn ContextBackend> = self.local.clone();
        op(local).await.map_err(|e| {
            if e.is_backend_failure() {
                StoreError::Unavailable(e.to_string())
            } else {
                e
            }
        })
    }

    /// Store a new context
    pub async fn create(&self, ctx: &ProcessingContext) -> Result<(), StoreError> {
        let fields = codec::encode_context(ctx)?;
        let records = ctx
            .chain
            .iter()
            .map(codec::encode_record)
            .collect::<Result<Vec<_>, _>>()?;
        let id = ctx.thread_id;
        let created_at = ctx.created_at;
        let ttl = self.ttl;

        self.execute(|backend| {
            let fields = fields.clone();
            let records = records.clone();
            async move {
                backend.write_fields(id, fields, ttl).await?;
                backend.index_created(id, created_at).await?;
                for record in records {
                    backend.push_chain(id, record, ttl).await?;
                }
                Ok(())
            }
        })
        .await?;

        debug!("Created context {}", id);
        Ok(())
    }

    /// Fetch a context; `None` when unknown or expired
    pub async fn get(&self, id: ThreadId) -> Result<Option<ProcessingContext>, StoreError> {
        self.execute(|backend| async move { Self::load(backend.as_ref(), id).await })
            .await
    }

    async fn load(
        backend: &dyn ContextBackend,
        id: ThreadId,
    ) -> Result<Option<ProcessingContext>, StoreError> {
        let Some(fields) = backend.read_fields(id).await? else {
            return Ok(None);
        };
        let chain = backend.read_chain(id).await?;
        codec::decode_context(&fields, &chain).map(Some)
    }

    /// Merge a patch into an existing context
    ///
    /// # Errors
    ///
    /// - `NotFound` if the thread is unknown or expired
    /// - `Conflict` if the patch would replace an existing extraction
    ///   result without being flagged as a re-process
    pub async fn update(&self, id: ThreadId, patch: &ContextPatch) -> Result<(), StoreError> {
        let ttl = self.ttl;
        let fields = codec::encode_patch(patch, Utc::now())?;
        let writes_extracted = patch.extracted.is_some();
        let reprocess = patch.reprocess;

        self.execute(|backend| {
            let fields = fields.clone();
            async move {
                let Some(current) = backend.read_fields(id).await? else {
                    return Err(StoreError::NotFound(id));
                };
                if writes_extracted && !reprocess && current.contains_key(codec::EXTRACTED) {
                    return Err(StoreError::Conflict(id));
                }
                backend.write_fields(id, fields, ttl).await
            }
        })
        .await
    }

    /// Append a stage record to a context's chain
    pub async fn append_chain(&self, id: ThreadId, record: &StageRecord) -> Result<(), StoreError> {
        let ttl = self.ttl;
        let encoded = codec::encode_record(record)?;
        let touch = codec::encode_touch(Utc::now())?;

        self.execute(|backend| {
            let encoded = encoded.clone();
            let touch = touch.clone();
            async move {
                if !backend.exists(id).await? {
                    return Err(StoreError::NotFound(id));
                }
                backend.push_chain(id, encoded, ttl).await?;
                backend.write_fields(id, touch, ttl).await
            }
        })
        .await
    }

    /// List live contexts, oldest first, bounded by the configured limit
    pub async fn list_all(&self, limit: Option<usize>) -> Result<Vec<ProcessingContext>, StoreError> {
        let limit = limit.unwrap_or(self.list_limit).min(self.list_limit);

        let mut contexts = self
            .execute(|backend| async move {
                let ids = backend.list_ids(limit).await?;
                let mut found = Vec::with_capacity(ids.len());
                for id in ids {
                    // Entries may expire between listing and loading
                    if let Some(ctx) = Self::load(backend.as_ref(), id).await? {
                        found.push(ctx);
                    }
                }
                Ok(found)
            })
            .await?;

        contexts.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.thread_id.cmp(&b.thread_id))
        });
        Ok(contexts)
    }

    /// Report backend state; probing the primary never changes it
    pub async fn health(&self) -> StoreHealth {
        // Reachability is reported even after a failover
        let primary_reachable = match &self.primary {
            Some(primary) => primary.ping().await.is_ok(),
            None => false,
        };

        let active_backend = match self.active_primary() {
            Some(primary) => primary.name(),
            None => self.local.name(),
        };

        StoreHealth {
            active_backend: active_backend.to_string(),
            primary_configured: self.primary_configured,
            primary_reachable,
            degraded: self.is_degraded(),
        }
    }

    /// Drop expired in-process entries
    pub async fn sweep_expired(&self) -> usize {
        self.local.sweep_expired().await
    }
}
