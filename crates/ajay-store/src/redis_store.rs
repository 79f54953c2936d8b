//! Redis-backed storage origin.
//!
//! Items live under `<namespace>:<key>`. Each change is published as JSON on
//! the `<namespace>:events` Pub/Sub channel; a listener task forwards those
//! messages into the local event channel so contexts in every process that
//! opened the same namespace are notified. The listener resubscribes with a
//! backoff when the Pub/Sub connection drops.

use async_trait::async_trait;
use futures::StreamExt;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::client::{RedisPool, StoreResult};
use crate::event::{ContextId, EventSender, StorageEvent, create_event_channel};
use crate::storage::{Storage, StorageEvents, StorageOrigin};

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// A storage origin shared through Redis. Clone to share.
#[derive(Clone)]
pub struct RedisOrigin {
    pool: RedisPool,
    namespace: String,
    tx: EventSender,
}

impl RedisOrigin {
    /// Connect to Redis and start forwarding change notifications.
    pub async fn connect(redis_url: &str, namespace: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let pool = redis::aio::ConnectionManager::new(client.clone()).await?;
        let tx = create_event_channel();
        let channel = events_channel(namespace);

        let pubsub = subscribe(&client, &channel).await?;
        tokio::spawn(listen(client, channel, pubsub, tx.clone()));

        Ok(Self {
            pool,
            namespace: namespace.to_string(),
            tx,
        })
    }

    /// Open a new context on this origin.
    pub fn open_context(&self) -> RedisStorage {
        let context = ContextId::new();
        debug!(%context, namespace = %self.namespace, "Opened Redis storage context");
        RedisStorage {
            origin: self.clone(),
            context,
        }
    }
}

impl StorageOrigin for RedisOrigin {
    fn open(&self) -> Arc<dyn Storage> {
        Arc::new(self.open_context())
    }
}

fn item_key(namespace: &str, key: &str) -> String {
    format!("{}:{}", namespace, key)
}

fn events_channel(namespace: &str) -> String {
    format!("{}:events", namespace)
}

/// Doubled delay after a failed reconnect, capped at [`MAX_BACKOFF`].
fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

async fn subscribe(client: &redis::Client, channel: &str) -> StoreResult<redis::aio::PubSub> {
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.subscribe(channel).await?;
    info!(channel = %channel, "Subscribed to storage events");
    Ok(pubsub)
}

/// Forward Pub/Sub messages to local contexts, resubscribing whenever the
/// connection is lost. Changes published while disconnected are not replayed.
async fn listen(
    client: redis::Client,
    channel: String,
    mut pubsub: redis::aio::PubSub,
    forward: EventSender,
) {
    loop {
        {
            let mut messages = pubsub.on_message();
            while let Some(msg) = messages.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(error = %e, "Unreadable storage event payload");
                        continue;
                    }
                };
                match serde_json::from_str::<StorageEvent>(&payload) {
                    Ok(event) => {
                        let _ = forward.send(event);
                    }
                    Err(e) => warn!(error = %e, "Ignoring malformed storage event"),
                }
            }
        }
        warn!(channel = %channel, "Storage event stream ended, reconnecting");

        let mut backoff = INITIAL_BACKOFF;
        pubsub = loop {
            tokio::time::sleep(backoff).await;
            match subscribe(&client, &channel).await {
                Ok(pubsub) => break pubsub,
                Err(e) => {
                    backoff = next_backoff(backoff);
                    warn!(
                        error = %e,
                        retry_in_ms = backoff.as_millis() as u64,
                        "Failed to resubscribe to storage events"
                    );
                }
            }
        };
    }
}

/// A context handle on a [`RedisOrigin`].
#[derive(Clone)]
pub struct RedisStorage {
    origin: RedisOrigin,
    context: ContextId,
}

impl RedisStorage {
    fn key(&self, key: &str) -> String {
        item_key(&self.origin.namespace, key)
    }

    async fn publish(
        &self,
        key: &str,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> StoreResult<()> {
        let event = StorageEvent {
            key: key.to_string(),
            old_value,
            new_value,
            source: self.context,
        };
        let json = serde_json::to_string(&event)?;
        let mut conn = self.origin.pool.clone();
        conn.publish::<_, _, ()>(events_channel(&self.origin.namespace), json)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for RedisStorage {
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.origin.pool.clone();
        let value: Option<String> = conn.get(self.key(key)).await?;
        Ok(value)
    }

    async fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.origin.pool.clone();
        let old_value: Option<String> = conn.getset(self.key(key), value).await?;
        if old_value.as_deref() == Some(value) {
            return Ok(());
        }
        self.publish(key, old_value, Some(value.to_string())).await
    }

    async fn remove_item(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.origin.pool.clone();
        let item_key = self.key(key);
        let old_value: Option<String> = conn.get(&item_key).await?;
        if old_value.is_none() {
            return Ok(());
        }
        conn.del::<_, ()>(&item_key).await?;
        self.publish(key, old_value, None).await
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
    use crate::ACTIVE_BROADCAST_KEY;

    #[test]
    fn test_key_layout() {
        assert_eq!(item_key("pmajay", ACTIVE_BROADCAST_KEY), "pmajay:broadcast:active");
        assert_eq!(events_channel("pmajay"), "pmajay:events");
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(next_backoff(INITIAL_BACKOFF), Duration::from_secs(1));
        assert_eq!(next_backoff(Duration::from_secs(20)), MAX_BACKOFF);
        assert_eq!(next_backoff(MAX_BACKOFF), MAX_BACKOFF);
    }

    /// Runs against a live server when `AJAY_REDIS_URL` is set.
    #[tokio::test]
    async fn test_cross_process_delivery() {
        let Ok(url) = std::env::var("AJAY_REDIS_URL") else {
            eprintln!("AJAY_REDIS_URL not set, skipping Redis test");
            return;
        };
        let namespace = format!("ajay-test-{}", ContextId::new());

        let first = RedisOrigin::connect(&url, &namespace).await.unwrap();
        let second = RedisOrigin::connect(&url, &namespace).await.unwrap();
        let writer = first.open_context();
        let same_process = first.open_context();
        let other_process = second.open_context();
        let mut writer_events = writer.subscribe();
        let mut local_events = same_process.subscribe();
        let mut remote_events = other_process.subscribe();

        writer.set_item("k", "v1").await.unwrap();

        let wait = Duration::from_secs(2);
        for events in [&mut local_events, &mut remote_events] {
            let event = tokio::time::timeout(wait, events.recv()).await.unwrap().unwrap();
            assert_eq!(event.key, "k");
            assert_eq!(event.new_value.as_deref(), Some("v1"));
            assert_eq!(event.source, writer.context_id());
        }
        let own = tokio::time::timeout(Duration::from_millis(200), writer_events.recv()).await;
        assert!(own.is_err(), "writer must not see its own event");

        assert_eq!(other_process.get_item("k").await.unwrap().as_deref(), Some("v1"));

        // Rewriting the same value is silent.
        writer.set_item("k", "v1").await.unwrap();
        writer.remove_item("k").await.unwrap();
        let event = tokio::time::timeout(wait, remote_events.recv()).await.unwrap().unwrap();
        assert_eq!(event.new_value, None);
        assert_eq!(event.old_value.as_deref(), Some("v1"));
        assert_eq!(other_process.get_item("k").await.unwrap(), None);
    }
}
