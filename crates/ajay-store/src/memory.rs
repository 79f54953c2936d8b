//! In-process storage origin.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::StoreResult;
use crate::event::{ContextId, EventSender, StorageEvent, create_event_channel};
use crate::storage::{Storage, StorageEvents, StorageOrigin};

/// One storage origin held in memory. Clone to share.
#[derive(Clone)]
pub struct MemoryOrigin {
    items: Arc<RwLock<HashMap<String, String>>>,
    tx: EventSender,
}

impl MemoryOrigin {
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
            tx: create_event_channel(),
        }
    }

    /// Open a new context (tab) on this origin.
    pub fn open_context(&self) -> MemoryStorage {
        let context = ContextId::new();
        debug!(%context, "Opened in-memory storage context");
        MemoryStorage {
            origin: self.clone(),
            context,
        }
    }
}

impl Default for MemoryOrigin {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageOrigin for MemoryOrigin {
    fn open(&self) -> Arc<dyn Storage> {
        Arc::new(self.open_context())
    }
}

/// A context handle on a [`MemoryOrigin`].
#[derive(Clone)]
pub struct MemoryStorage {
    origin: MemoryOrigin,
    context: ContextId,
}

impl MemoryStorage {
    fn notify(&self, key: &str, old_value: Option<String>, new_value: Option<String>) {
        let event = StorageEvent {
            key: key.to_string(),
            old_value,
            new_value,
            source: self.context,
        };
        // No receivers is fine: nobody else has the origin open.
        let _ = self.origin.tx.send(event);
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.origin.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let old_value = self
            .origin
            .items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        if old_value.as_deref() != Some(value) {
            self.notify(key, old_value, Some(value.to_string()));
        }
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StoreResult<()> {
        let old_value = self.origin.items.write().await.remove(key);
        if old_value.is_some() {
            self.notify(key, old_value, None);
        }
        Ok(())
    }

    fn context_id(&self) -> ContextId {
        self.context
    }

    fn subscribe(&self) -> StorageEvents {
        StorageEvents::new(self.origin.tx.subscribe(), self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_contexts_share_items() {
        let origin = MemoryOrigin::new();
        let a = origin.open_context();
        let b = origin.open_context();

        a.set_item("k", "v1").await.unwrap();
        assert_eq!(b.get_item("k").await.unwrap(), Some("v1".to_string()));

        b.remove_item("k").await.unwrap();
        assert_eq!(a.get_item("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_event_reaches_other_context_only() {
        let origin = MemoryOrigin::new();
        let writer = origin.open_context();
        let reader = origin.open_context();
        let mut own_events = writer.subscribe();
        let mut other_events = reader.subscribe();

        writer.set_item("k", "v1").await.unwrap();

        let event = other_events.recv().await.unwrap();
        assert_eq!(event.key, "k");
        assert_eq!(event.old_value, None);
        assert_eq!(event.new_value, Some("v1".to_string()));
        assert_eq!(event.source, writer.context_id());

        let own = tokio::time::timeout(Duration::from_millis(50), own_events.recv()).await;
        assert!(own.is_err(), "writer must not see its own event");
    }

    #[tokio::test]
    async fn test_unchanged_value_is_silent() {
        let origin = MemoryOrigin::new();
        let writer = origin.open_context();
        let reader = origin.open_context();
        writer.set_item("k", "same").await.unwrap();
        let mut events = reader.subscribe();

        writer.set_item("k", "same").await.unwrap();
        writer.set_item("k", "changed").await.unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.old_value, Some("same".to_string()));
        assert_eq!(event.new_value, Some("changed".to_string()));
    }

    #[tokio::test]
    async fn test_remove_absent_key_is_silent() {
        let origin = MemoryOrigin::new();
        let writer = origin.open_context();
        let reader = origin.open_context();
        let mut events = reader.subscribe();

        writer.remove_item("missing").await.unwrap();
        writer.set_item("k", "v").await.unwrap();

        // The first event observed is the set, not a phantom removal.
        let event = events.recv().await.unwrap();
        assert_eq!(event.new_value, Some("v".to_string()));
    }
}
