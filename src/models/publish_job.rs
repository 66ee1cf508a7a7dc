//! # Publish Job Model
//!
//! A publish job fans one content item out to a set of platforms. Each platform
//! owns exactly one [`Slot`]; the job's overall status and completion
//! percentage are never stored and are recomputed from the slot map on every
//! read through [`crate::orchestration::status_aggregator`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::platform::Platform;
use crate::orchestration::status_aggregator;
use crate::state_machine::{JobStatus, SlotState};

/// Result returned by a platform adapter for an accepted post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub post_id: String,
    pub url: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// One entry in a slot's audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTransition {
    pub from: SlotState,
    pub to: SlotState,
    pub at: DateTime<Utc>,
}

/// Per-platform sub-unit of a publish job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub platform: Platform,
    pub status: SlotState,
    pub platform_post_id: Option<String>,
    pub published_url: Option<String>,
    pub error_message: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// Entered `publishing`
    pub started_at: Option<DateTime<Utc>>,
    /// Entered a terminal state
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub history: Vec<SlotTransition>,
}

impl Slot {
    pub fn new(platform: Platform, status: SlotState, at: DateTime<Utc>) -> Self {
        Self {
            platform,
            status,
            platform_post_id: None,
            published_url: None,
            error_message: None,
            updated_at: at,
            started_at: None,
            completed_at: None,
            history: Vec::new(),
        }
    }
}

/// A publish job and its per-platform slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishJob {
    pub id: String,
    pub content_id: i64,
    pub owner_id: i64,
    pub platforms: Vec<Platform>,
    pub captions: Option<HashMap<Platform, String>>,
    pub tags: Option<Vec<String>>,
    /// Effective time when dispatch is deferred to the future
    pub scheduled_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub slots: HashMap<Platform, Slot>,
}

/// Creation input for a single job
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPublishJob {
    pub content_id: i64,
    /// Raw platform names; validated against the known platform set
    pub platforms: Vec<String>,
    pub captions: Option<HashMap<String, String>>,
    pub tags: Option<Vec<String>>,
    pub scheduled_time: Option<DateTime<Utc>>,
}

impl PublishJob {
    /// Build a job with one slot per platform.
    ///
    /// Slots start `scheduled` when `effective_time` lies after `now`, otherwise
    /// `pending`.
    pub fn new(
        content_id: i64,
        owner_id: i64,
        platforms: Vec<Platform>,
        captions: Option<HashMap<Platform, String>>,
        tags: Option<Vec<String>>,
        effective_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let deferred = effective_time > now;
        let initial = if deferred {
            SlotState::Scheduled
        } else {
            SlotState::Pending
        };
        let slots = platforms
            .iter()
            .map(|platform| (*platform, Slot::new(*platform, initial, now)))
            .collect();

        Self {
            id: generate_job_id(),
            content_id,
            owner_id,
            platforms,
            captions,
            tags,
            scheduled_time: deferred.then_some(effective_time),
            created_at: now,
            updated_at: now,
            slots,
        }
    }

    /// Instant at which dispatch becomes eligible
    pub fn effective_time(&self) -> DateTime<Utc> {
        self.scheduled_time.unwrap_or(self.created_at)
    }

    pub fn overall_status(&self) -> JobStatus {
        status_aggregator::overall_status(self.slots.values().map(|slot| slot.status))
    }

    pub fn completion_percentage(&self) -> u8 {
        status_aggregator::completion_percentage(self.slots.values().map(|slot| slot.status))
    }

    pub fn caption_override(&self, platform: Platform) -> Option<&str> {
        self.captions
            .as_ref()
            .and_then(|captions| captions.get(&platform))
            .map(String::as_str)
    }

    /// Slots in the job's platform order
    pub fn ordered_slots(&self) -> impl Iterator<Item = &Slot> {
        self.platforms
            .iter()
            .filter_map(|platform| self.slots.get(platform))
    }
}

/// 128-bit random token rendered as 32 lowercase hex characters
pub fn generate_job_id() -> String {
    Uuid::new_v4().simple().to_string()
}
