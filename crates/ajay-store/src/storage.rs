//! The storage-area abstraction shared by both backends.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::client::StoreResult;
use crate::event::{ContextId, EventReceiver, StorageEvent};

/// A per-origin key-value storage area as seen from one context.
///
/// Handles are cheap; every handle carries its own [`ContextId`] and writes
/// made through it are never reported back to its own [`StorageEvents`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`.
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete `key`. Removing an absent key is not an error and emits no event.
    async fn remove_item(&self, key: &str) -> StoreResult<()>;

    /// The context this handle writes as.
    fn context_id(&self) -> ContextId;

    /// Subscribe to changes made by other contexts.
    fn subscribe(&self) -> StorageEvents;
}

/// Something contexts can be opened on: one shared storage area.
pub trait StorageOrigin: Send + Sync {
    /// Open a new context with its own [`ContextId`].
    fn open(&self) -> Arc<dyn Storage>;
}

/// Stream of storage events from other contexts.
pub struct StorageEvents {
    rx: EventReceiver,
    own: ContextId,
}

impl StorageEvents {
    pub fn new(rx: EventReceiver, own: ContextId) -> Self {
        Self { rx, own }
    }

    /// Wait for the next change made by another context.
    ///
    /// Returns `None` once the origin is gone. Events dropped because this
    /// receiver fell behind are skipped.
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.source == self.own => {
                    debug!(key = %event.key, "Skipping storage event from own context");
                }
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, context = %self.own, "Storage event receiver lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
