use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-platform slot states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    /// Job has a future effective time
    Scheduled,
    /// Effective time reached, not yet dispatched
    Pending,
    /// Adapter call in flight
    Publishing,
    /// Platform accepted the post
    Success,
    /// Publish attempt failed; terminal, never retried
    Failed,
    /// Job was cancelled before dispatch
    Cancelled,
}

impl SlotState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }

    /// Check if dispatch has not begun for this slot
    pub fn is_awaiting_dispatch(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Pending)
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Pending => write!(f, "pending"),
            Self::Publishing => write!(f, "publishing"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for SlotState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "pending" => Ok(Self::Pending),
            "publishing" => Ok(Self::Publishing),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid slot state: {s}")),
        }
    }
}

/// Overall job status, always derived from the slot map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Scheduled,
    Pending,
    Publishing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Pending => write!(f, "pending"),
            Self::Publishing => write!(f, "publishing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Default state for slots of an immediate job
impl Default for SlotState {
    fn default() -> Self {
        Self::Pending
    }
}
