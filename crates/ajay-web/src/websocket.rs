//! WebSocket handler for live broadcast banners.
//!
//! Every connection is its own storage context with a mounted subscriber, so
//! it hears about every change made by the API or by other processes.

use ajay_core::broadcast::{Banner, Subscriber};
use ajay_core::Role;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::routes::RoleQuery;
use crate::state::AppState;

/// Messages pushed to WebSocket clients.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    /// The banner to show.
    BannerChanged(Banner),
    /// Nothing to show.
    BannerCleared,
}

impl ServerMessage {
    fn for_subscriber(subscriber: &Subscriber) -> Self {
        match subscriber.banner() {
            Some(banner) => Self::BannerChanged(banner),
            None => Self::BannerCleared,
        }
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<RoleQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let role = query.parse()?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, role)))
}

/// Handle individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState, role: Option<Role>) {
    let (mut sender, mut receiver) = socket.split();

    let store = state.open_store();
    let mut events = store.subscribe();
    let mut subscriber = match Subscriber::mount(store, role).await {
        Ok(subscriber) => subscriber,
        Err(e) => {
            warn!(error = %e, "Failed to load active broadcast for WebSocket client");
            return;
        }
    };
    info!(?role, "WebSocket client connected");

    if push(&mut sender, &subscriber).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            changed = subscriber.next_change(&mut events) => match changed {
                Ok(true) => {
                    if push(&mut sender, &subscriber).await.is_err() {
                        break;
                    }
                }
                Ok(false) => {
                    debug!("Storage events closed");
                    break;
                }
                Err(e) => warn!(error = %e, "Failed to refresh broadcast banner"),
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if text.as_str().trim() == "dismiss" {
                        subscriber.dismiss();
                        if push(&mut sender, &subscriber).await.is_err() {
                            break;
                        }
                    } else {
                        debug!("Ignoring WebSocket text: {}", text.as_str());
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("WebSocket client sent close frame");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(error = %e, "WebSocket receive failed");
                    break;
                }
            },
        }
    }

    info!(?role, "WebSocket client disconnected");
}

async fn push(
    sender: &mut SplitSink<WebSocket, Message>,
    subscriber: &Subscriber,
) -> Result<(), ()> {
    let json = match serde_json::to_string(&ServerMessage::for_subscriber(subscriber)) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to encode banner");
            return Ok(());
        }
    };
    debug!(message = %json, "Sending banner to WebSocket client");
    sender.send(Message::Text(json.into())).await.map_err(|_| {
        debug!("WebSocket send failed, client disconnected");
    })
}
