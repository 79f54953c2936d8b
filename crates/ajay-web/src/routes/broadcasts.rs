//! Broadcast route handlers.

use ajay_core::broadcast::{Banner, BroadcastDraft, BroadcastMessage, Priority, Subscriber};
use ajay_core::{RecipientSelection, Role};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::RoleQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub message: String,
    #[serde(default)]
    pub priority: Priority,
    /// Omitted means all four recipient roles.
    pub recipients: Option<Vec<Role>>,
}

impl PublishRequest {
    fn into_draft(self) -> BroadcastDraft {
        BroadcastDraft {
            message: self.message,
            priority: self.priority,
            recipients: match self.recipients {
                Some(roles) => RecipientSelection::only(&roles),
                None => RecipientSelection::default(),
            },
        }
    }
}

pub async fn publish(
    State(state): State<AppState>,
    Json(req): Json<PublishRequest>,
) -> Result<(StatusCode, Json<BroadcastMessage>), (StatusCode, String)> {
    let published = state
        .publisher
        .publish(&req.into_draft())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "Broadcast message must not be empty".to_string(),
            )
        })?;

    Ok((StatusCode::CREATED, Json(published)))
}

pub async fn get_active(
    State(state): State<AppState>,
    Query(query): Query<RoleQuery>,
) -> Result<Response, (StatusCode, String)> {
    let role = query.parse()?;
    let subscriber = Subscriber::mount(state.publisher.store().clone(), role)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(match subscriber.banner() {
        Some(banner) => Json::<Banner>(banner).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

pub async fn stop(State(state): State<AppState>) -> Result<StatusCode, (StatusCode, String)> {
    state
        .publisher
        .stop_broadcasting()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    info!("Broadcast stopped via API");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn history(
    State(state): State<AppState>,
) -> Result<Json<Vec<BroadcastMessage>>, (StatusCode, String)> {
    let history = state
        .publisher
        .store()
        .get_history()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(history))
}
