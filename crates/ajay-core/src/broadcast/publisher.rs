//! Broadcast publisher.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, info, warn};

use super::model::{BroadcastMessage, Priority};
use super::store::BroadcastStore;
use crate::error::AjayResult;
use crate::notifier::ApiNotifier;
use crate::role::{Recipient, RecipientSelection};

/// Composer state: the text being typed plus the sticky priority and
/// recipient choices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastDraft {
    pub message: String,
    pub priority: Priority,
    pub recipients: RecipientSelection,
}

impl BroadcastDraft {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Writes broadcasts on behalf of one issuing role.
pub struct Publisher {
    store: BroadcastStore,
    sender: String,
    notifier: Option<ApiNotifier>,
    last_id: AtomicI64,
    /// The composer. Only its text is cleared after a successful submit.
    pub draft: BroadcastDraft,
}

impl Publisher {
    pub fn new(store: BroadcastStore, sender: impl Into<String>) -> Self {
        Self {
            store,
            sender: sender.into(),
            notifier: None,
            last_id: AtomicI64::new(0),
            draft: BroadcastDraft::default(),
        }
    }

    /// Also forward every published broadcast to the REST backend.
    pub fn with_notifier(mut self, notifier: ApiNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn store(&self) -> &BroadcastStore {
        &self.store
    }

    /// Publish the current draft and clear its text on success.
    pub async fn submit(&mut self) -> AjayResult<Option<BroadcastMessage>> {
        let published = self.publish(&self.draft).await?;
        if published.is_some() {
            self.draft.message.clear();
        }
        Ok(published)
    }

    /// Publish `draft` as the new active broadcast and record it in history.
    ///
    /// A draft whose text is blank after trimming is ignored: `Ok(None)` and
    /// nothing is written.
    pub async fn publish(&self, draft: &BroadcastDraft) -> AjayResult<Option<BroadcastMessage>> {
        let text = draft.message.trim();
        if text.is_empty() {
            debug!("Ignoring blank broadcast submission");
            return Ok(None);
        }

        let recipients: Vec<Recipient> = draft
            .recipients
            .roles()
            .into_iter()
            .map(Recipient::from)
            .collect();
        if recipients.is_empty() {
            warn!("No recipients selected, broadcast will reach every role");
        }

        let now = Utc::now();
        let floor = self
            .store
            .get_active()
            .await?
            .map(|active| active.id)
            .unwrap_or(0);
        let message = BroadcastMessage {
            id: self.next_id(now.timestamp_millis(), floor),
            message: text.to_string(),
            priority: draft.priority,
            timestamp: now.to_rfc3339(),
            sender: self.sender.clone(),
            recipients,
        };

        self.store.set_active(&message).await?;
        self.store.append_history(&message).await?;
        info!(
            id = message.id,
            priority = %message.priority,
            recipients = message.recipients.len(),
            "Broadcast published"
        );

        if let Some(notifier) = &self.notifier {
            notifier.forward_broadcast(&message).await;
        }

        Ok(Some(message))
    }

    /// Take down the active broadcast. History keeps its entry.
    pub async fn stop_broadcasting(&self) -> AjayResult<()> {
        self.store.clear_active().await?;
        info!("Broadcast stopped");
        Ok(())
    }

    /// Strictly increasing id: the clock, unless an earlier id (ours or the
    /// one currently active) is already at or past it.
    fn next_id(&self, now_ms: i64, floor: i64) -> i64 {
        let candidate = |prev: i64| now_ms.max(prev + 1).max(floor + 1);
        let prev = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| Some(candidate(prev)))
            .unwrap_or_else(|prev| prev);
        candidate(prev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use ajay_store::{ACTIVE_BROADCAST_KEY, BROADCAST_HISTORY_KEY, MemoryOrigin, Storage};
    use std::sync::Arc;

    fn publisher_on(origin: &MemoryOrigin) -> Publisher {
        let store = BroadcastStore::new(Arc::new(origin.open_context()));
        Publisher::new(store, "Central Ministry")
    }

    #[tokio::test]
    async fn test_submit_writes_active_and_history() {
        let origin = MemoryOrigin::new();
        let mut publisher = publisher_on(&origin);
        publisher.draft.message = "  Fund release approved for Phase II  ".to_string();
        publisher.draft.priority = Priority::Joy;
        publisher.draft.recipients = RecipientSelection::only(&[Role::State, Role::Block]);

        let published = publisher.submit().await.unwrap().unwrap();

        assert_eq!(published.message, "Fund release approved for Phase II");
        assert_eq!(published.priority, Priority::Joy);
        assert_eq!(published.sender, "Central Ministry");
        assert_eq!(published.recipients, vec![Role::State, Role::Block]);
        assert!(chrono::DateTime::parse_from_rfc3339(&published.timestamp).is_ok());

        let reader = BroadcastStore::new(Arc::new(origin.open_context()));
        assert_eq!(reader.get_active().await.unwrap(), Some(published.clone()));
        assert_eq!(reader.get_history().await.unwrap(), vec![published]);
    }

    #[tokio::test]
    async fn test_submit_clears_text_but_keeps_selections() {
        let origin = MemoryOrigin::new();
        let mut publisher = publisher_on(&origin);
        publisher.draft.message = "Review meeting at 3 PM".to_string();
        publisher.draft.priority = Priority::Warning;
        publisher.draft.recipients = RecipientSelection::only(&[Role::Agency]);

        publisher.submit().await.unwrap();

        assert!(publisher.draft.message.is_empty());
        assert_eq!(publisher.draft.priority, Priority::Warning);
        assert_eq!(publisher.draft.recipients.roles(), vec![Role::Agency]);
    }

    #[tokio::test]
    async fn test_blank_submission_writes_nothing() {
        let origin = MemoryOrigin::new();
        let mut publisher = publisher_on(&origin);
        publisher.draft.message = "Existing notice".to_string();
        let existing = publisher.submit().await.unwrap().unwrap();

        for blank in ["", "   ", "\n\t"] {
            publisher.draft.message = blank.to_string();
            assert_eq!(publisher.submit().await.unwrap(), None);
        }

        let raw = origin.open_context();
        let store = BroadcastStore::new(Arc::new(raw.clone()));
        assert_eq!(store.get_active().await.unwrap(), Some(existing));
        assert_eq!(store.get_history().await.unwrap().len(), 1);
        assert!(raw.get_item(ACTIVE_BROADCAST_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_blank_submission_on_empty_store_creates_no_keys() {
        let origin = MemoryOrigin::new();
        let publisher = publisher_on(&origin);

        assert_eq!(publisher.publish(&BroadcastDraft::new("   ")).await.unwrap(), None);

        let raw = origin.open_context();
        assert_eq!(raw.get_item(ACTIVE_BROADCAST_KEY).await.unwrap(), None);
        assert_eq!(raw.get_item(BROADCAST_HISTORY_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_successive_broadcasts_have_increasing_ids() {
        let origin = MemoryOrigin::new();
        let publisher = publisher_on(&origin);

        let mut ids = Vec::new();
        for n in 0..5 {
            let msg = publisher
                .publish(&BroadcastDraft::new(format!("notice {}", n)))
                .await
                .unwrap()
                .unwrap();
            ids.push(msg.id);
        }

        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        let history = publisher.store().get_history().await.unwrap();
        let history_ids: Vec<i64> = history.iter().map(|m| m.id).collect();
        let mut expected = ids.clone();
        expected.reverse();
        assert_eq!(history_ids, expected);
        assert_eq!(history[0].message, "notice 4");
    }

    #[tokio::test]
    async fn test_id_passes_active_from_another_publisher() {
        let origin = MemoryOrigin::new();
        let store = BroadcastStore::new(Arc::new(origin.open_context()));
        let future_id = Utc::now().timestamp_millis() + 60_000;
        store
            .set_active(&BroadcastMessage {
                id: future_id,
                message: "from another desk".to_string(),
                priority: Priority::Info,
                timestamp: Utc::now().to_rfc3339(),
                sender: "Central Ministry".to_string(),
                recipients: vec![],
            })
            .await
            .unwrap();

        let publisher = publisher_on(&origin);
        let msg = publisher.publish(&BroadcastDraft::new("next")).await.unwrap().unwrap();
        assert!(msg.id > future_id);
    }

    #[tokio::test]
    async fn test_stop_broadcasting_keeps_history() {
        let origin = MemoryOrigin::new();
        let publisher = publisher_on(&origin);
        publisher.publish(&BroadcastDraft::new("Temporary outage")).await.unwrap();

        publisher.stop_broadcasting().await.unwrap();

        assert_eq!(publisher.store().get_active().await.unwrap(), None);
        assert_eq!(publisher.store().get_history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_recipients_selected_targets_everyone() {
        let origin = MemoryOrigin::new();
        let publisher = publisher_on(&origin);
        let draft = BroadcastDraft {
            message: "All hands".to_string(),
            priority: Priority::Info,
            recipients: RecipientSelection::none(),
        };

        let msg = publisher.publish(&draft).await.unwrap().unwrap();
        assert!(msg.recipients.is_empty());
        assert!(msg.is_visible_to(Some(Role::Agency)));
    }
}
