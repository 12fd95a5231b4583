//! In-process backend with lazy and swept expiry

use crate::backend::{ContextBackend, FieldEntries};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use triage_domain::ThreadId;

#[derive(Debug)]
struct Entry {
    fields: HashMap<String, String>,
    chain: Vec<String>,
    created_at: DateTime<Utc>,
    expires_at: Instant,
}

impl Entry {
    fn new(ttl: Duration) -> Self {
        Self {
            fields: HashMap::new(),
            chain: Vec::new(),
            created_at: Utc::now(),
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-process map backend
///
/// Expired entries are invisible to reads immediately and are removed
/// by [`MemoryBackend::sweep_expired`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<ThreadId, Entry>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired entry, returning how many were dropped
    pub async fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Number of entries held, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no entries are held
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Get the live entry for `id`, replacing an expired one with a fresh entry
    fn live_entry<'a>(
        entries: &'a mut HashMap<ThreadId, Entry>,
        id: ThreadId,
        ttl: Duration,
    ) -> &'a mut Entry {
        let now = Instant::now();
        let entry = entries.entry(id).or_insert_with(|| Entry::new(ttl));
        if !entry.is_live(now) {
            *entry = Entry::new(ttl);
        }
        entry.expires_at = now + ttl;
        entry
    }
}

#[async_trait]
impl ContextBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn write_fields(
        &self,
        id: ThreadId,
        fields: FieldEntries,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let entry = Self::live_entry(&mut entries, id, ttl);
        entry.fields.extend(fields);
        Ok(())
    }

    async fn read_fields(&self, id: ThreadId) -> Result<Option<HashMap<String, String>>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(&id)
            .filter(|entry| entry.is_live(now) && !entry.fields.is_empty())
            .map(|entry| entry.fields.clone()))
    }

    async fn push_chain(&self, id: ThreadId, record: String, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let entry = Self::live_entry(&mut entries, id, ttl);
        entry.chain.push(record);
        Ok(())
    }

    async fn read_chain(&self, id: ThreadId) -> Result<Vec<String>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(&id)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.chain.clone())
            .unwrap_or_default())
    }

    async fn exists(&self, id: ThreadId) -> Result<bool, StoreError> {
        Ok(self.read_fields(id).await?.is_some())
    }

    async fn index_created(&self, id: ThreadId, created_at: DateTime<Utc>) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(&id).filter(|entry| entry.is_live(now)) {
            entry.created_at = created_at;
        }
        Ok(())
    }

    async fn list_ids(&self, limit: usize) -> Result<Vec<ThreadId>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let mut live: Vec<(DateTime<Utc>, ThreadId)> = entries
            .iter()
            .filter(|(_, entry)| entry.is_live(now) && !entry.fields.is_empty())
            .map(|(id, entry)| (entry.created_at, *id))
            .collect();
        live.sort();
        Ok(live.into_iter().take(limit).map(|(_, id)| id).collect())
    }
}
