//! Persisted broadcast store.
//!
//! The active message and the history list live as JSON text under two
//! well-known keys. The two keys are written independently; a reader may see
//! a new active message before its history entry lands.

use ajay_store::{ACTIVE_BROADCAST_KEY, BROADCAST_HISTORY_KEY, Storage, StorageEvents};
use std::sync::Arc;
use tracing::{debug, warn};

use super::model::BroadcastMessage;
use crate::error::AjayResult;

/// Typed access to the broadcast keys of one storage context.
#[derive(Clone)]
pub struct BroadcastStore {
    storage: Arc<dyn Storage>,
    /// `None` keeps every entry.
    history_limit: Option<usize>,
}

impl BroadcastStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            history_limit: None,
        }
    }

    /// Cap the history at `limit` entries (at least one). The history grows
    /// without bound unless a cap is set.
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit.map(|l| l.max(1));
        self
    }

    /// Changes to this origin made by other contexts.
    pub fn subscribe(&self) -> StorageEvents {
        self.storage.subscribe()
    }

    /// Replace the active message.
    pub async fn set_active(&self, message: &BroadcastMessage) -> AjayResult<()> {
        let json = serde_json::to_string(message)?;
        self.storage.set_item(ACTIVE_BROADCAST_KEY, &json).await?;
        debug!(id = message.id, "Active broadcast set");
        Ok(())
    }

    /// Read the active message. Absent or unreadable values yield `None`.
    pub async fn get_active(&self) -> AjayResult<Option<BroadcastMessage>> {
        let Some(raw) = self.storage.get_item(ACTIVE_BROADCAST_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(message) => Ok(Some(message)),
            Err(e) => {
                warn!(error = %e, key = ACTIVE_BROADCAST_KEY, "Ignoring malformed active broadcast");
                Ok(None)
            }
        }
    }

    /// Remove the active message. History is untouched.
    pub async fn clear_active(&self) -> AjayResult<()> {
        self.storage.remove_item(ACTIVE_BROADCAST_KEY).await?;
        debug!("Active broadcast cleared");
        Ok(())
    }

    /// Prepend `message` to the history, dropping the oldest entries beyond
    /// the limit if one is set.
    pub async fn append_history(&self, message: &BroadcastMessage) -> AjayResult<()> {
        let mut history = self.get_history().await?;
        history.insert(0, message.clone());
        if let Some(limit) = self.history_limit.filter(|&limit| history.len() > limit) {
            let dropped = history.len() - limit;
            history.truncate(limit);
            debug!(dropped, limit, "Trimmed broadcast history");
        }
        let json = serde_json::to_string(&history)?;
        self.storage.set_item(BROADCAST_HISTORY_KEY, &json).await?;
        Ok(())
    }

    /// Read the history, newest first. Absent or unreadable values yield an
    /// empty list.
    pub async fn get_history(&self) -> AjayResult<Vec<BroadcastMessage>> {
        let Some(raw) = self.storage.get_item(BROADCAST_HISTORY_KEY).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(history) => Ok(history),
            Err(e) => {
                warn!(error = %e, key = BROADCAST_HISTORY_KEY, "Ignoring malformed broadcast history");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::model::Priority;
    use crate::role::Role;
    use ajay_store::MemoryOrigin;

    fn store_on(origin: &MemoryOrigin) -> BroadcastStore {
        BroadcastStore::new(Arc::new(origin.open_context()))
    }

    fn message(id: i64, text: &str) -> BroadcastMessage {
        BroadcastMessage {
            id,
            message: text.to_string(),
            priority: Priority::Warning,
            timestamp: "2026-10-19T09:30:00+00:00".to_string(),
            sender: "Central Ministry".to_string(),
            recipients: vec![Role::State.into(), Role::FieldOfficer.into()],
        }
    }

    #[tokio::test]
    async fn test_active_round_trip_across_contexts() {
        let origin = MemoryOrigin::new();
        let writer = store_on(&origin);
        let reader = store_on(&origin);

        let msg = message(1, "Site inspections start Monday");
        writer.set_active(&msg).await.unwrap();

        assert_eq!(reader.get_active().await.unwrap(), Some(msg));
    }

    #[tokio::test]
    async fn test_overwrite_keeps_only_latest() {
        let origin = MemoryOrigin::new();
        let store = store_on(&origin);

        store.set_active(&message(1, "first")).await.unwrap();
        store.set_active(&message(2, "second")).await.unwrap();

        let active = store.get_active().await.unwrap().unwrap();
        assert_eq!(active.id, 2);
        assert_eq!(active.message, "second");
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let origin = MemoryOrigin::new();
        let store = store_on(&origin);

        for id in 1..=5 {
            store.append_history(&message(id, &format!("notice {}", id))).await.unwrap();
        }

        let history = store.get_history().await.unwrap();
        assert_eq!(history.len(), 5);
        let ids: Vec<i64> = history.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![5, 4, 3, 2, 1]);
        assert_eq!(history[0].message, "notice 5");
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let origin = MemoryOrigin::new();
        let store = store_on(&origin).with_history_limit(Some(3));

        for id in 1..=5 {
            store.append_history(&message(id, "n")).await.unwrap();
        }

        let ids: Vec<i64> = store.get_history().await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![5, 4, 3]);
    }

    #[tokio::test]
    async fn test_history_unbounded_by_default() {
        let origin = MemoryOrigin::new();
        let store = store_on(&origin);

        for id in 1..=150 {
            store.append_history(&message(id, "n")).await.unwrap();
        }

        let history = store.get_history().await.unwrap();
        assert_eq!(history.len(), 150);
        assert_eq!(history[0].id, 150);
        assert_eq!(history[149].id, 1);
    }

    #[tokio::test]
    async fn test_clear_leaves_history() {
        let origin = MemoryOrigin::new();
        let store = store_on(&origin);
        let msg = message(7, "stop me");

        store.set_active(&msg).await.unwrap();
        store.append_history(&msg).await.unwrap();
        store.clear_active().await.unwrap();

        assert_eq!(store_on(&origin).get_active().await.unwrap(), None);
        assert_eq!(store.get_history().await.unwrap(), vec![msg]);
    }

    #[tokio::test]
    async fn test_corrupt_active_reads_as_none() {
        let origin = MemoryOrigin::new();
        let raw = origin.open_context();
        raw.set_item(ACTIVE_BROADCAST_KEY, "{not json").await.unwrap();

        let store = store_on(&origin);
        assert_eq!(store.get_active().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_history_reads_as_empty_and_recovers() {
        let origin = MemoryOrigin::new();
        let raw = origin.open_context();
        raw.set_item(BROADCAST_HISTORY_KEY, "[{\"id\":").await.unwrap();

        let store = store_on(&origin);
        assert!(store.get_history().await.unwrap().is_empty());

        store.append_history(&message(1, "fresh start")).await.unwrap();
        assert_eq!(store.get_history().await.unwrap().len(), 1);
    }
}
