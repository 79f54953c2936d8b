//! Per-dashboard broadcast banner.
//!
//! A subscriber reads the active message once when mounted and again for
//! every storage event on the active key. Storage events only arrive from
//! other contexts; a subscriber sharing a context with the publisher must
//! call [`Subscriber::refresh`] itself.
//!
//! [`Subscriber::next_change`] may be dropped at any await point, as a
//! `tokio::select!` branch is; an event it already took is remembered and
//! the reload happens on the next call.

use ajay_store::{ACTIVE_BROADCAST_KEY, StorageEvent, StorageEvents};
use tracing::debug;

use super::model::{Banner, BroadcastMessage};
use super::store::BroadcastStore;
use crate::error::AjayResult;
use crate::role::Role;

pub struct Subscriber {
    store: BroadcastStore,
    role: Option<Role>,
    current: Option<BroadcastMessage>,
    visible: bool,
    /// Id of the message closed in this instance. Not persisted.
    dismissed_id: Option<i64>,
    /// Set when the active key changed and the reload has not finished yet.
    stale: bool,
}

impl Subscriber {
    /// Mount for a dashboard of `role` and load the active message.
    pub async fn mount(store: BroadcastStore, role: Option<Role>) -> AjayResult<Self> {
        let mut subscriber = Self {
            store,
            role,
            current: None,
            visible: false,
            dismissed_id: None,
            stale: false,
        };
        subscriber.refresh().await?;
        Ok(subscriber)
    }

    /// Whether the banner is showing.
    pub fn is_visible(&self) -> bool {
        self.visible && self.current.is_some()
    }

    /// The banner to render, if any.
    pub fn banner(&self) -> Option<Banner> {
        if !self.visible {
            return None;
        }
        self.current.clone().map(Banner::new)
    }

    /// Close the banner in this instance only. The store is not touched, so
    /// other dashboards and a remounted one still show the message.
    pub fn dismiss(&mut self) {
        self.visible = false;
        self.dismissed_id = self.current.as_ref().map(|m| m.id);
        debug!(role = ?self.role, id = ?self.dismissed_id, "Broadcast banner dismissed");
    }

    /// Reload the active message. Returns whether the rendered banner changed.
    ///
    /// A message already dismissed here stays hidden; a newer one is shown.
    pub async fn refresh(&mut self) -> AjayResult<bool> {
        let before = self.banner();

        let active = self.store.get_active().await?;
        self.stale = false;
        match active.filter(|m| m.is_visible_to(self.role)) {
            Some(message) => {
                self.visible = self.dismissed_id != Some(message.id);
                self.current = Some(message);
            }
            None => {
                self.visible = false;
                self.current = None;
            }
        }

        let after = self.banner();
        Ok(before != after)
    }

    /// React to a storage event. Only changes to the active key matter.
    pub async fn handle_event(&mut self, event: &StorageEvent) -> AjayResult<bool> {
        if event.key != ACTIVE_BROADCAST_KEY {
            return Ok(false);
        }
        debug!(role = ?self.role, source = %event.source, "Active broadcast changed elsewhere");
        self.stale = true;
        self.refresh().await
    }

    /// Wait until another context changes what this banner shows.
    ///
    /// Returns `false` when the event stream has closed. Cancel safe.
    pub async fn next_change(&mut self, events: &mut StorageEvents) -> AjayResult<bool> {
        loop {
            if self.stale {
                if self.refresh().await? {
                    return Ok(true);
                }
                continue;
            }
            match events.recv().await {
                Some(event) if event.key == ACTIVE_BROADCAST_KEY => {
                    debug!(role = ?self.role, source = %event.source, "Active broadcast changed elsewhere");
                    self.stale = true;
                }
                Some(_) => {}
                None => return Ok(false),
            }
        }
    }
}
