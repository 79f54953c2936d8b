//! System-wide broadcast notifications.
//!
//! One active message per origin plus a bounded history, both stored as JSON
//! under well-known keys. The [`Publisher`] writes them; each dashboard mounts
//! a [`Subscriber`] that filters by role and follows changes made elsewhere.

pub mod model;
pub mod publisher;
pub mod store;
pub mod subscriber;

pub use model::{Banner, BannerStyle, BroadcastMessage, Priority};
pub use publisher::{BroadcastDraft, Publisher};
pub use store::BroadcastStore;
pub use subscriber::Subscriber;
