use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{cancellation_blocker, JobStore, StoreError, StoreResult};
use crate::models::{Pagination, Platform, PublishJob};
use crate::state_machine::{apply_event, SlotEvent};

#[derive(Debug, Clone)]
struct StoredJob {
    /// Insertion order, breaks ties between jobs created in the same instant
    sequence: u64,
    job: PublishJob,
}

/// In-memory job store.
///
/// Each job lives in its own `DashMap` entry; slot writes hold the entry's
/// shard lock for the duration of the read-modify-write, so concurrent writes
/// to sibling platforms of the same job serialize instead of overwriting each
/// other.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: DashMap<String, StoredJob>,
    sequence: AtomicU64,
    /// Serializes batch inserts against each other. Single creates do not take
    /// it; a batch that collides with one is removed again before returning.
    batch_lock: Mutex<()>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: PublishJob) -> StoreResult<PublishJob> {
        match self.jobs.entry(job.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateId(job.id)),
            Entry::Vacant(vacant) => {
                let sequence = self.next_sequence();
                vacant.insert(StoredJob {
                    sequence,
                    job: job.clone(),
                });
                Ok(job)
            }
        }
    }

    async fn create_many(&self, jobs: Vec<PublishJob>) -> StoreResult<Vec<PublishJob>> {
        let _guard = self.batch_lock.lock();

        let mut seen = std::collections::HashSet::new();
        for job in &jobs {
            if self.jobs.contains_key(&job.id) || !seen.insert(job.id.as_str()) {
                return Err(StoreError::DuplicateId(job.id.clone()));
            }
        }

        let mut inserted: Vec<&str> = Vec::with_capacity(jobs.len());
        for job in &jobs {
            let claimed = match self.jobs.entry(job.id.clone()) {
                Entry::Vacant(vacant) => {
                    let sequence = self.next_sequence();
                    vacant.insert(StoredJob {
                        sequence,
                        job: job.clone(),
                    });
                    true
                }
                Entry::Occupied(_) => false,
            };

            if !claimed {
                // A single create took the id after the duplicate check
                for id in inserted {
                    self.jobs.remove(id);
                }
                return Err(StoreError::DuplicateId(job.id.clone()));
            }
            inserted.push(&job.id);
        }

        Ok(jobs)
    }

    async fn get(&self, id: &str) -> StoreResult<PublishJob> {
        self.jobs
            .get(id)
            .map(|stored| stored.job.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_slot(
        &self,
        job_id: &str,
        platform: Platform,
        event: SlotEvent,
    ) -> StoreResult<PublishJob> {
        let mut stored = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))?;

        let job = &mut stored.job;
        let slot = job
            .slots
            .get_mut(&platform)
            .ok_or_else(|| StoreError::UnknownSlot {
                job_id: job_id.to_string(),
                platform,
            })?;

        let now = Utc::now();
        apply_event(slot, &event, now)?;
        job.updated_at = now;

        Ok(job.clone())
    }

    async fn cancel(&self, job_id: &str) -> StoreResult<PublishJob> {
        let mut stored = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))?;

        let job = &mut stored.job;
        if let Some(reason) = cancellation_blocker(job) {
            return Err(StoreError::NotCancellable {
                job_id: job_id.to_string(),
                reason,
            });
        }

        let now = Utc::now();
        for slot in job.slots.values_mut() {
            apply_event(slot, &SlotEvent::Cancel, now)?;
        }
        job.updated_at = now;

        Ok(job.clone())
    }

    async fn list(
        &self,
        owner_id: i64,
        pagination: Pagination,
    ) -> StoreResult<(usize, Vec<PublishJob>)> {
        let mut owned: Vec<StoredJob> = self
            .jobs
            .iter()
            .filter(|entry| entry.job.owner_id == owner_id)
            .map(|entry| entry.value().clone())
            .collect();

        owned.sort_by(|a, b| {
            b.job
                .created_at
                .cmp(&a.job.created_at)
                .then(b.sequence.cmp(&a.sequence))
        });

        let total = owned.len();
        let jobs = pagination
            .apply(&owned)
            .into_iter()
            .map(|stored| stored.job)
            .collect();

        Ok((total, jobs))
    }
}
