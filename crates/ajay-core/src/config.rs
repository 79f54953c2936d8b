//! Environment-driven configuration.

use tracing::debug;

use crate::error::{AjayError, AjayResult};

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_NAMESPACE: &str = "pmajay";
pub const DEFAULT_SENDER: &str = "Central Ministry";

/// Settings for the broadcast service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastConfig {
    pub redis_url: String,
    pub namespace: String,
    /// Maximum number of history entries kept, newest first. Unset keeps
    /// the whole history.
    pub history_limit: Option<usize>,
    /// Label stamped on every published message.
    pub sender: String,
    /// Base URL of the REST backend. Forwarding is disabled when unset.
    pub api_url: Option<String>,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            history_limit: None,
            sender: DEFAULT_SENDER.to_string(),
            api_url: None,
        }
    }
}

impl BroadcastConfig {
    /// Load from `AJAY_*` environment variables, falling back to defaults.
    pub fn from_env() -> AjayResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AjayResult<Self> {
        let defaults = Self::default();

        let history_limit = match lookup("AJAY_HISTORY_LIMIT") {
            Some(raw) => {
                let limit: usize = raw.trim().parse().map_err(|_| {
                    AjayError::Config(format!("AJAY_HISTORY_LIMIT is not a number: {}", raw))
                })?;
                if limit == 0 {
                    return Err(AjayError::Config(
                        "AJAY_HISTORY_LIMIT must be at least 1".to_string(),
                    ));
                }
                Some(limit)
            }
            None => defaults.history_limit,
        };

        let config = Self {
            redis_url: lookup("AJAY_REDIS_URL").unwrap_or(defaults.redis_url),
            namespace: lookup("AJAY_NAMESPACE").unwrap_or(defaults.namespace),
            history_limit,
            sender: lookup("AJAY_SENDER").unwrap_or(defaults.sender),
            api_url: lookup("AJAY_API_URL").filter(|url| !url.trim().is_empty()),
        };
        debug!(?config, "Broadcast configuration loaded");
        Ok(config)
    }
}
