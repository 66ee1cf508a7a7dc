//! # Status Aggregator
//!
//! Pure functions from a job's slot states to its overall status and
//! completion percentage. Nothing here is stored: every read recomputes from
//! the current slot snapshot, so the aggregate can never drift from the slots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{PublishJob, Slot};
use crate::state_machine::{JobStatus, SlotState};

/// Slot counts per state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCounts {
    pub total: usize,
    pub scheduled: usize,
    pub pending: usize,
    pub publishing: usize,
    pub success: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl SlotCounts {
    pub fn from_states(states: impl IntoIterator<Item = SlotState>) -> Self {
        states.into_iter().fold(Self::default(), |mut counts, state| {
            counts.total += 1;
            match state {
                SlotState::Scheduled => counts.scheduled += 1,
                SlotState::Pending => counts.pending += 1,
                SlotState::Publishing => counts.publishing += 1,
                SlotState::Success => counts.success += 1,
                SlotState::Failed => counts.failed += 1,
                SlotState::Cancelled => counts.cancelled += 1,
            }
            counts
        })
    }

    /// Slots that finished publishing, successfully or not
    pub fn resolved(&self) -> usize {
        self.success + self.failed
    }

    pub fn terminal(&self) -> usize {
        self.success + self.failed + self.cancelled
    }

    pub fn awaiting_dispatch(&self) -> usize {
        self.scheduled + self.pending
    }
}

/// Overall status for a slot map
pub fn overall_status(states: impl IntoIterator<Item = SlotState>) -> JobStatus {
    status_from_counts(&SlotCounts::from_states(states))
}

pub fn status_from_counts(counts: &SlotCounts) -> JobStatus {
    if counts.cancelled > 0 {
        return JobStatus::Cancelled;
    }
    if counts.total > 0 && counts.resolved() == counts.total {
        return if counts.success > 0 {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };
    }
    if counts.total > 0 && counts.scheduled == counts.total {
        return JobStatus::Scheduled;
    }
    if counts.awaiting_dispatch() == counts.total {
        return JobStatus::Pending;
    }
    JobStatus::Publishing
}

/// floor(100 * terminal / total); 0 for an empty slot map
pub fn completion_percentage(states: impl IntoIterator<Item = SlotState>) -> u8 {
    percentage_from_counts(&SlotCounts::from_states(states))
}

pub fn percentage_from_counts(counts: &SlotCounts) -> u8 {
    if counts.total == 0 {
        return 0;
    }
    // terminal <= total, so the quotient is at most 100
    u8::try_from(counts.terminal() * 100 / counts.total).unwrap_or(100)
}

/// Status view of a job as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishStatus {
    pub job_id: String,
    pub content_id: i64,
    pub overall_status: JobStatus,
    pub completion_percentage: u8,
    pub counts: SlotCounts,
    /// Slots in the job's platform order
    pub slots: Vec<Slot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub scheduled_time: Option<DateTime<Utc>>,
    /// Effective time plus the completion window; `None` past the representable range
    pub estimated_completion: Option<DateTime<Utc>>,
}

impl PublishStatus {
    /// Summarize `job`'s current snapshot
    pub fn from_job(job: &PublishJob, completion_window: chrono::Duration) -> Self {
        let counts = SlotCounts::from_states(job.slots.values().map(|slot| slot.status));

        Self {
            job_id: job.id.clone(),
            content_id: job.content_id,
            overall_status: status_from_counts(&counts),
            completion_percentage: percentage_from_counts(&counts),
            counts,
            slots: job.ordered_slots().cloned().collect(),
            created_at: job.created_at,
            updated_at: job.updated_at,
            scheduled_time: job.scheduled_time,
            estimated_completion: job.effective_time().checked_add_signed(completion_window),
        }
    }
}
