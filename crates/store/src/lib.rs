//! Lockup Store - KV persistence for the lockup engine
//!
//! The engine reads and writes through a [`Context`] that wraps a
//! [`KvStore`]. Handlers run inside a [`CacheStore`] branch so a failed
//! handler leaves no partial writes behind.
//!
//! Snapshots export the whole store as JSON lines.

pub mod cache;
pub mod context;
pub mod error;
pub mod event;
pub mod kv;
pub mod snapshot;

pub use cache::CacheStore;
pub use context::Context;
pub use error::{StoreError, StoreResult};
pub use event::Event;
pub use kv::{prefix_end, KvStore, MemStore};
pub use snapshot::{SnapshotEntry, SnapshotReader, SnapshotWriter};
