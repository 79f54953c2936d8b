//! PM-AJAY Storage Layer
//!
//! Per-origin key-value storage with storage-change events, modelled on the
//! browser storage area the dashboards share between open tabs. Two backends:
//! an in-process map for a single server (and tests) and Redis for sharing
//! one origin across processes.

pub mod client;
pub mod event;
pub mod memory;
pub mod redis_store;
pub mod storage;

pub use client::{RedisPool, StoreError, StoreResult};
pub use event::{ContextId, EventReceiver, EventSender, StorageEvent, create_event_channel};
pub use memory::{MemoryOrigin, MemoryStorage};
pub use redis_store::{RedisOrigin, RedisStorage};
pub use storage::{Storage, StorageEvents, StorageOrigin};

/// Key holding the single active broadcast record.
pub const ACTIVE_BROADCAST_KEY: &str = "broadcast:active";

/// Key holding the broadcast history list, newest first.
pub const BROADCAST_HISTORY_KEY: &str = "broadcast:history";
