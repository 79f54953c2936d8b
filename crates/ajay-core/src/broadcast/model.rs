//! Broadcast domain models.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::AjayError;
use crate::role::{Recipient, Role};

/// Broadcast priority. Stored values other than the three known ones render
/// as [`Priority::Info`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Informational.
    #[default]
    Info,
    /// Urgent.
    Warning,
    /// Good news.
    Joy,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Joy => "joy",
        }
    }

    /// Banner styling for this priority.
    pub fn style(&self) -> BannerStyle {
        match self {
            Self::Warning => BannerStyle {
                tone: "red",
                icon: "alert-triangle",
                title: "Urgent Notice",
            },
            Self::Joy => BannerStyle {
                tone: "green",
                icon: "check-circle",
                title: "Good News",
            },
            Self::Info => BannerStyle {
                tone: "blue",
                icon: "info",
                title: "Information",
            },
        }
    }
}

impl FromStr for Priority {
    type Err = AjayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "joy" => Ok(Self::Joy),
            _ => Err(AjayError::UnknownPriority(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_else(|_| {
            warn!(priority = %raw, "Unknown broadcast priority, showing as info");
            Self::Info
        }))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual treatment of a banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BannerStyle {
    pub tone: &'static str,
    pub icon: &'static str,
    pub title: &'static str,
}

/// A persisted broadcast record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    /// Creation time in milliseconds; strictly increasing per publisher.
    pub id: i64,
    pub message: String,
    pub priority: Priority,
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub sender: String,
    /// Empty means every role.
    #[serde(default)]
    pub recipients: Vec<Recipient>,
}

impl BroadcastMessage {
    /// Whether a dashboard for `role` shows this message. A viewer without a
    /// role sees everything.
    pub fn is_visible_to(&self, role: Option<Role>) -> bool {
        match role {
            Some(role) if !self.recipients.is_empty() => {
                self.recipients.iter().any(|recipient| *recipient == role)
            }
            _ => true,
        }
    }
}

/// A message ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub message: BroadcastMessage,
    pub style: BannerStyle,
}

impl Banner {
    pub fn new(message: BroadcastMessage) -> Self {
        let style = message.priority.style();
        Self { message, style }
    }
}
