//! Route handlers.

pub mod broadcasts;

use ajay_core::Role;
use axum::http::StatusCode;
use serde::Deserialize;

/// `?role=` query accepted by the banner endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct RoleQuery {
    pub role: Option<String>,
}

impl RoleQuery {
    /// Parse the role; an empty value means no role.
    pub fn parse(&self) -> Result<Option<Role>, (StatusCode, String)> {
        match self.role.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e: ajay_core::AjayError| (StatusCode::BAD_REQUEST, e.to_string())),
        }
    }
}
