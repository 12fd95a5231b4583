//! Triage Context Store
//!
//! Thread-addressable, expiring storage for processing contexts.
//!
//! # Architecture
//!
//! - `RedisBackend`: networked primary (hash per context, list per chain)
//! - `MemoryBackend`: in-process map used when no primary is configured,
//!   or after the primary fails
//! - `ContextStore`: field-level merge, write-once extraction result,
//!   append-only chain, one-way failover
//!
//! # Examples
//!
//! ```
//! use triage_domain::{ContextPatch, Format, ProcessingContext, ThreadId};
//! use triage_store::{ContextStore, StoreConfig};
//!
//! # tokio_test::block_on(async {
//! let store = ContextStore::in_memory(&StoreConfig::default());
//! let ctx = ProcessingContext::new(ThreadId::new(), "api_call");
//! store.create(&ctx).await.unwrap();
//!
//! store
//!     .update(ctx.thread_id, &ContextPatch::new().format(Format::Json))
//!     .await
//!     .unwrap();
//! let fetched = store.get(ctx.thread_id).await.unwrap().unwrap();
//! assert_eq!(fetched.format, Format::Json);
//! # });
//! ```

#![warn(missing_docs)]

pub mod backend;
mod codec;
pub mod config;
pub mod error;
pub mod memory;
pub mod redis_backend;
pub mod store;
pub mod sweeper;

pub use backend::{ContextBackend, FieldEntries};
pub use config::StoreConfig;
pub use error::StoreError;
pub use memory::MemoryBackend;
pub use redis_backend::RedisBackend;
pub use store::{ContextStore, StoreHealth};
pub use sweeper::{ExpirySweeper, SweepMetrics};
