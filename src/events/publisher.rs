use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

use crate::constants::events;
use crate::models::Platform;
use crate::state_machine::SlotState;

/// Best-effort publisher for lifecycle events.
///
/// Sending never blocks and never fails for lack of subscribers; slow
/// subscribers lag and lose the oldest events rather than stall the engine.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub context: Value,
    pub published_at: DateTime<Utc>,
}

/// Payload of [`events::SLOT_COMPLETED`], sent when a slot reaches a terminal state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCompletedNotification {
    pub job_id: String,
    pub content_id: i64,
    pub platform: Platform,
    pub status: SlotState,
    pub post_id: Option<String>,
    pub error: Option<String>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event with the given name and context
    pub fn publish(&self, event_name: impl Into<String>, context: Value) {
        let event = PublishedEvent {
            name: event_name.into(),
            context,
            published_at: Utc::now(),
        };

        // No subscribers is acceptable; delivery is best-effort
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            trace!(event = %event.name, "No subscribers for event");
        }
    }

    pub fn publish_slot_completed(
        &self,
        notification: &SlotCompletedNotification,
    ) -> Result<(), PublishError> {
        let context = serde_json::to_value(notification)?;
        self.publish(events::SLOT_COMPLETED, context);
        Ok(())
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl PublishedEvent {
    /// Decode a slot completion payload, if this event carries one
    pub fn slot_completed(&self) -> Option<SlotCompletedNotification> {
        if self.name != events::SLOT_COMPLETED {
            return None;
        }
        serde_json::from_value(self.context.clone()).ok()
    }
}

/// Error types for event publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}
