//! # Events
//!
//! Fire-and-forget lifecycle notifications for external consumers.

pub mod publisher;

pub use publisher::{EventPublisher, PublishError, PublishedEvent, SlotCompletedNotification};
