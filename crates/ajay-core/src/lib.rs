//! PM-AJAY Core Library
//!
//! Portal roles and the broadcast notification model: the persisted active
//! message and history, the publisher that writes them and the subscriber
//! that renders them per role.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod notifier;
pub mod role;

pub use config::BroadcastConfig;
pub use error::{AjayError, AjayResult};
pub use role::{Recipient, RecipientSelection, Role};
