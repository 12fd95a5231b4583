//! Storage backend seam
//!
//! A context is stored as two pieces: a field map (one entry per context
//! field, values JSON-encoded) and an append-only list of chain records.
//! Writing individual fields gives last-writer-wins per field; pushing to
//! the list keeps chain appends atomic. A creation index orders contexts
//! for listing.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use triage_domain::ThreadId;

/// Encoded context fields
pub type FieldEntries = Vec<(String, String)>;

/// Key-value backend holding contexts
#[async_trait]
pub trait ContextBackend: Send + Sync {
    /// Short backend name for logs and health
    fn name(&self) -> &'static str;

    /// Check that the backend answers
    async fn ping(&self) -> Result<(), StoreError>;

    /// Set fields of a context and refresh its TTL
    async fn write_fields(
        &self,
        id: ThreadId,
        fields: FieldEntries,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Read every field of a context; `None` when absent or expired
    async fn read_fields(&self, id: ThreadId) -> Result<Option<HashMap<String, String>>, StoreError>;

    /// Append one encoded chain record and refresh the TTL
    async fn push_chain(&self, id: ThreadId, record: String, ttl: Duration) -> Result<(), StoreError>;

    /// Read all chain records in append order
    async fn read_chain(&self, id: ThreadId) -> Result<Vec<String>, StoreError>;

    /// Whether a live context exists
    async fn exists(&self, id: ThreadId) -> Result<bool, StoreError>;

    /// Record when a context was created, for ordered listing
    async fn index_created(&self, id: ThreadId, created_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Up to `limit` live context ids, oldest creation first
    ///
    /// Ties on creation time are broken by thread id. The bound applies
    /// after ordering, so the result is always the oldest `limit` contexts.
    async fn list_ids(&self, limit: usize) -> Result<Vec<ThreadId>, StoreError>;
}
