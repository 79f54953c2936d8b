//! Storage-change events.
//!
//! Every write to a storage area produces a [`StorageEvent`] tagged with the
//! context that performed it. Events travel over a tokio broadcast channel;
//! filtering out a context's own writes happens in [`crate::StorageEvents`].

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Identifies one browsing context (a tab, a WebSocket client, a CLI run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(Uuid);

impl ContextId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A change to one key of a storage area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
    pub source: ContextId,
}

/// Type alias for the event sender.
pub type EventSender = broadcast::Sender<StorageEvent>;

/// Type alias for the event receiver.
pub type EventReceiver = broadcast::Receiver<StorageEvent>;

/// Create a new event channel with default capacity.
pub fn create_event_channel() -> EventSender {
    let (tx, _rx) = broadcast::channel(100);
    tx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let source = ContextId::new();
        let event = StorageEvent {
            key: "broadcast:active".to_string(),
            old_value: None,
            new_value: Some("{}".to_string()),
            source,
        };

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["key"], "broadcast:active");
        assert_eq!(json["old_value"], serde_json::Value::Null);
        assert_eq!(json["source"], source.to_string());

        let back: StorageEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
