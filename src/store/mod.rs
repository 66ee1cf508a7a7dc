//! # Job Store
//!
//! Single source of truth for publish jobs and their slot state. The store
//! validates every slot write against the slot state machine but never derives
//! aggregate status; that is recomputed from the returned snapshot by callers.
//!
//! Two implementations ship with the crate:
//!
//! - [`InMemoryJobStore`]: `DashMap`-backed, used by tests and single-process
//!   deployments.
//! - [`PgJobStore`] (feature `postgres`): row-locked PostgreSQL persistence.

use async_trait::async_trait;

use crate::models::{Pagination, Platform, PublishJob};
use crate::state_machine::{SlotEvent, StateMachineError};

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryJobStore;
#[cfg(feature = "postgres")]
pub use postgres::PgJobStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Publish job not found: {0}")]
    NotFound(String),

    #[error("Publish job already exists: {0}")]
    DuplicateId(String),

    #[error("Platform {platform} is not part of job {job_id}")]
    UnknownSlot { job_id: String, platform: Platform },

    #[error("Rejected slot write: {0}")]
    InvalidTransition(#[from] StateMachineError),

    #[error("Job {job_id} cannot be cancelled: {reason}")]
    NotCancellable { job_id: String, reason: String },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for publish jobs
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new job with all of its slots
    async fn create(&self, job: PublishJob) -> StoreResult<PublishJob>;

    /// Persist several jobs; either all are stored or none are
    async fn create_many(&self, jobs: Vec<PublishJob>) -> StoreResult<Vec<PublishJob>>;

    async fn get(&self, id: &str) -> StoreResult<PublishJob>;

    /// Apply `event` to one slot, atomically for the `(job_id, platform)` key.
    ///
    /// Returns the full job snapshot after the write.
    async fn update_slot(
        &self,
        job_id: &str,
        platform: Platform,
        event: SlotEvent,
    ) -> StoreResult<PublishJob>;

    /// Cancel every slot, provided none has left `pending`/`scheduled`.
    ///
    /// The check and the write happen atomically; on rejection nothing changes.
    async fn cancel(&self, job_id: &str) -> StoreResult<PublishJob>;

    /// Owner's jobs newest first, with the owner's total job count
    async fn list(
        &self,
        owner_id: i64,
        pagination: Pagination,
    ) -> StoreResult<(usize, Vec<PublishJob>)>;
}

/// Reason a job cannot be cancelled, if any
pub(crate) fn cancellation_blocker(job: &PublishJob) -> Option<String> {
    job.ordered_slots()
        .find(|slot| !slot.status.is_awaiting_dispatch())
        .map(|slot| format!("slot {} is already {}", slot.platform, slot.status))
}
