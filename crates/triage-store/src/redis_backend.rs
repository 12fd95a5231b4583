//! Redis backend
//!
//! Layout per thread:
//! - `triage:ctx:{id}`: hash of JSON-encoded context fields
//! - `triage:chain:{id}`: list of JSON-encoded chain records
//! - `triage:index`: sorted set of thread ids scored by creation time
//!
//! The per-thread keys carry the native Redis expiry, refreshed on every
//! write. Index members outlive their contexts and are pruned while listing.

use crate::backend::{ContextBackend, FieldEntries};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};
use triage_domain::ThreadId;

const CONTEXT_PREFIX: &str = "triage:ctx:";
const CHAIN_PREFIX: &str = "triage:chain:";
const INDEX_KEY: &str = "triage:index";
const LIST_BATCH: isize = 64;

fn context_key(id: ThreadId) -> String {
    format!("{}{}", CONTEXT_PREFIX, id)
}

fn chain_key(id: ThreadId) -> String {
    format!("{}{}", CHAIN_PREFIX, id)
}

/// Index score: creation time in microseconds, exact in an f64 for centuries
fn index_score(created_at: DateTime<Utc>) -> f64 {
    created_at.timestamp_micros() as f64
}

/// Redis expiry works in whole seconds
fn ttl_secs(ttl: Duration) -> i64 {
    ttl.as_secs().max(1) as i64
}

/// Redis-backed context storage
pub struct RedisBackend {
    manager: ConnectionManager,
    op_timeout: Duration,
}

impl RedisBackend {
    /// Connect to Redis, giving up after `connect_timeout`
    pub async fn connect(
        url: &str,
        connect_timeout: Duration,
        op_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)
            .map_err(|e| StoreError::Unavailable(format!("invalid redis url: {}", e)))?;

        let manager = timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Unavailable(format!("timed out connecting to {}", url)))?
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        info!("Connected to Redis at {}", url);
        Ok(Self {
            manager,
            op_timeout,
        })
    }

    /// Run one operation on a cloned connection handle under the op timeout
    async fn run<T, F, Fut>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = Result<T, RedisError>>,
    {
        match timeout(self.op_timeout, op(self.manager.clone())).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(StoreError::from(e)),
            Err(_) => {
                debug!("Redis operation exceeded {:?}", self.op_timeout);
                Err(StoreError::Timeout)
            }
        }
    }
}

#[async_trait]
impl ContextBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.run(|mut con| async move {
            let _: bool = con.exists("triage:ping").await?;
            Ok::<_, RedisError>(())
        })
        .await
    }

    async fn write_fields(
        &self,
        id: ThreadId,
        fields: FieldEntries,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let key = context_key(id);
        let chain = chain_key(id);
        let secs = ttl_secs(ttl);

        self.run(move |mut con| async move {
            let _: () = con.hset_multiple(&key, fields.as_slice()).await?;
            let _: () = con.expire(&key, secs).await?;
            let _: () = con.expire(&chain, secs).await?;
            Ok::<_, RedisError>(())
        })
        .await
    }

    async fn read_fields(&self, id: ThreadId) -> Result<Option<HashMap<String, String>>, StoreError> {
        let key = context_key(id);
        let map: HashMap<String, String> = self
            .run(move |mut con| async move { con.hgetall(&key).await })
            .await?;

        // HGETALL on a missing or expired key yields an empty hash
        Ok(if map.is_empty() { None } else { Some(map) })
    }

    async fn push_chain(&self, id: ThreadId, record: String, ttl: Duration) -> Result<(), StoreError> {
        let key = context_key(id);
        let chain = chain_key(id);
        let secs = ttl_secs(ttl);

        self.run(move |mut con| async move {
            let _: () = con.rpush(&chain, record).await?;
            let _: () = con.expire(&chain, secs).await?;
            let _: () = con.expire(&key, secs).await?;
            Ok::<_, RedisError>(())
        })
        .await
    }

    async fn read_chain(&self, id: ThreadId) -> Result<Vec<String>, StoreError> {
        let chain = chain_key(id);
        self.run(move |mut con| async move { con.lrange(&chain, 0, -1).await })
            .await
    }

    async fn exists(&self, id: ThreadId) -> Result<bool, StoreError> {
        let key = context_key(id);
        self.run(move |mut con| async move { con.exists(&key).await })
            .await
    }

    async fn index_created(&self, id: ThreadId, created_at: DateTime<Utc>) -> Result<(), StoreError> {
        let member = id.to_string();
        let score = index_score(created_at);
        self.run(move |mut con| async move {
            let _: () = con.zadd(INDEX_KEY, member, score).await?;
            Ok::<_, RedisError>(())
        })
        .await
    }

    async fn list_ids(&self, limit: usize) -> Result<Vec<ThreadId>, StoreError> {
        let mut ids = Vec::with_capacity(limit);
        let mut start: isize = 0;

        while ids.len() < limit {
            let stop = start + LIST_BATCH - 1;
            let members: Vec<String> = self
                .run(move |mut con| async move { con.zrange(INDEX_KEY, start, stop).await })
                .await?;
            if members.is_empty() {
                break;
            }

            let keys: Vec<String> = members
                .iter()
                .map(|m| format!("{}{}", CONTEXT_PREFIX, m))
                .collect();
            let live: Vec<bool> = self
                .run(move |mut con| async move {
                    let mut pipe = redis::pipe();
                    for key in &keys {
                        pipe.exists(key);
                    }
                    pipe.query_async(&mut con).await
                })
                .await?;

            let mut stale = Vec::new();
            for (member, is_live) in members.iter().zip(live) {
                match member.parse::<ThreadId>() {
                    Ok(id) if is_live => {
                        if ids.len() < limit {
                            ids.push(id);
                        }
                    }
                    _ => stale.push(member.clone()),
                }
            }

            start += members.len() as isize - stale.len() as isize;
            if !stale.is_empty() {
                debug!("Pruning {} expired ids from the context index", stale.len());
                self.run(move |mut con| async move {
                    let _: () = con.zrem(INDEX_KEY, stale).await?;
                    Ok::<_, RedisError>(())
                })
                .await?;
            }
        }

        Ok(ids)
    }
}
