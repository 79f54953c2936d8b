//! Application state.

use ajay_core::broadcast::{BroadcastStore, Publisher};
use ajay_core::notifier::ApiNotifier;
use ajay_core::BroadcastConfig;
use ajay_store::StorageOrigin;
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub origin: Arc<dyn StorageOrigin>,
    /// Publishes through the server's own context, so every WebSocket
    /// context is notified of its writes.
    pub publisher: Arc<Publisher>,
    pub history_limit: Option<usize>,
}

impl AppState {
    pub fn new(origin: Arc<dyn StorageOrigin>, config: &BroadcastConfig) -> Self {
        let store = BroadcastStore::new(origin.open()).with_history_limit(config.history_limit);
        let mut publisher = Publisher::new(store, config.sender.clone());
        if let Some(url) = &config.api_url {
            publisher = publisher.with_notifier(ApiNotifier::with_url(url));
        }
        Self {
            origin,
            publisher: Arc::new(publisher),
            history_limit: config.history_limit,
        }
    }

    /// A store on a fresh context of the origin.
    pub fn open_store(&self) -> BroadcastStore {
        BroadcastStore::new(self.origin.open()).with_history_limit(self.history_limit)
    }
}
