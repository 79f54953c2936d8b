//! REST backend notifier.
//!
//! Forwards published broadcasts to `POST <base_url>/broadcasts` so a backend
//! can keep its own record. The portal works without one: failures are logged
//! and never fail the publish.

use std::time::Duration;
use tracing::{debug, warn};

use crate::broadcast::model::BroadcastMessage;

/// Posts broadcasts to the REST backend.
#[derive(Clone)]
pub struct ApiNotifier {
    client: reqwest::Client,
    base_url: String,
}

impl ApiNotifier {
    /// Create a notifier for the given backend base URL.
    pub fn with_url(base_url: &str) -> Self {
        debug!(base_url = %base_url, "ApiNotifier initialized");
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL the broadcasts are posted to.
    pub fn endpoint(&self) -> String {
        format!("{}/broadcasts", self.base_url)
    }

    /// Send a published broadcast to the backend.
    pub async fn forward_broadcast(&self, message: &BroadcastMessage) {
        let url = self.endpoint();
        debug!(url = %url, id = message.id, "Forwarding broadcast to backend");

        match self.client.post(&url).json(message).send().await {
            Ok(response) => {
                if response.status().is_success() {
                    debug!(id = message.id, "Broadcast forwarded successfully");
                } else {
                    warn!(
                        id = message.id,
                        status_code = %response.status(),
                        "Backend rejected broadcast"
                    );
                }
            }
            Err(e) => {
                debug!(
                    id = message.id,
                    error = %e,
                    url = %url,
                    "Failed to forward broadcast (backend may not be running)"
                );
            }
        }
    }
}
