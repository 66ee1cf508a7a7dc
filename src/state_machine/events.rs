use serde::{Deserialize, Serialize};

use crate::models::PublishReceipt;

/// Events that can trigger slot state transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SlotEvent {
    /// Effective time reached for a scheduled slot
    Activate,
    /// Dispatch begins; adapter call is about to be made
    Start,
    /// Platform accepted the post
    Succeed(PublishReceipt),
    /// Publish attempt failed with the given reason
    Fail(String),
    /// Job cancelled before dispatch
    Cancel,
}

impl SlotEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Start => "start",
            Self::Succeed(_) => "succeed",
            Self::Fail(_) => "fail",
            Self::Cancel => "cancel",
        }
    }

    /// Create a failure event with the given error message
    pub fn fail_with_error(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }
}
