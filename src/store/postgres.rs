//! # PostgreSQL Job Store
//!
//! Jobs live in `publish_jobs`, one row per slot in `publish_job_slots`
//! (see `migrations/`). Slot writes lock the single `(job_id, platform)` row
//! with `SELECT ... FOR UPDATE`, so sibling platforms of the same job never
//! contend and never overwrite each other. Cancellation locks every slot row of
//! the job before checking and writing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnection, PgPool, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use std::collections::HashMap;
use tracing::debug;

use super::{cancellation_blocker, JobStore, StoreError, StoreResult};
use crate::models::{Pagination, Platform, PublishJob, Slot, SlotTransition};
use crate::state_machine::{apply_event, SlotEvent, StateMachineError};

const SLOT_COLUMNS: &str = "job_id, platform, status, platform_post_id, published_url, \
     error_message, history, started_at, completed_at, updated_at";

const JOB_COLUMNS: &str =
    "id, content_id, owner_id, platforms, captions, tags, scheduled_time, created_at, updated_at";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Job store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode_platform(raw: &str) -> StoreResult<Platform> {
    raw.parse()
        .map_err(|_| StoreError::Backend(format!("Invalid platform in database: {raw}")))
}

fn slot_from_row(row: &PgRow) -> StoreResult<Slot> {
    let platform: String = row.try_get("platform")?;
    let status: String = row.try_get("status")?;
    let history: Json<Vec<SlotTransition>> = row.try_get("history")?;

    Ok(Slot {
        platform: decode_platform(&platform)?,
        status: status
            .parse()
            .map_err(|_| StateMachineError::InvalidStoredState(status.clone()))?,
        platform_post_id: row.try_get("platform_post_id")?,
        published_url: row.try_get("published_url")?,
        error_message: row.try_get("error_message")?,
        updated_at: row.try_get("updated_at")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        history: history.0,
    })
}

fn job_from_row(row: &PgRow, slots: HashMap<Platform, Slot>) -> StoreResult<PublishJob> {
    let platforms: Json<Vec<Platform>> = row.try_get("platforms")?;
    let captions: Option<Json<HashMap<Platform, String>>> = row.try_get("captions")?;
    let tags: Option<Json<Vec<String>>> = row.try_get("tags")?;

    Ok(PublishJob {
        id: row.try_get("id")?,
        content_id: row.try_get("content_id")?,
        owner_id: row.try_get("owner_id")?,
        platforms: platforms.0,
        captions: captions.map(|c| c.0),
        tags: tags.map(|t| t.0),
        scheduled_time: row.try_get("scheduled_time")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        slots,
    })
}

async fn fetch_job(conn: &mut PgConnection, id: &str) -> StoreResult<PublishJob> {
    let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM publish_jobs WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

    let slot_rows = sqlx::query(&format!(
        "SELECT {SLOT_COLUMNS} FROM publish_job_slots WHERE job_id = $1"
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let mut slots = HashMap::with_capacity(slot_rows.len());
    for slot_row in &slot_rows {
        let slot = slot_from_row(slot_row)?;
        slots.insert(slot.platform, slot);
    }

    job_from_row(&row, slots)
}

async fn insert_job(conn: &mut PgConnection, job: &PublishJob) -> StoreResult<()> {
    let inserted = sqlx::query(
        "INSERT INTO publish_jobs \
         (id, content_id, owner_id, platforms, captions, tags, scheduled_time, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(&job.id)
    .bind(job.content_id)
    .bind(job.owner_id)
    .bind(Json(&job.platforms))
    .bind(job.captions.as_ref().map(Json))
    .bind(job.tags.as_ref().map(Json))
    .bind(job.scheduled_time)
    .bind(job.created_at)
    .bind(job.updated_at)
    .execute(&mut *conn)
    .await?;

    if inserted.rows_affected() == 0 {
        return Err(StoreError::DuplicateId(job.id.clone()));
    }

    for slot in job.ordered_slots() {
        sqlx::query(
            "INSERT INTO publish_job_slots \
             (job_id, platform, status, platform_post_id, published_url, error_message, \
              history, started_at, completed_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&job.id)
        .bind(slot.platform.as_str())
        .bind(slot.status.to_string())
        .bind(&slot.platform_post_id)
        .bind(&slot.published_url)
        .bind(&slot.error_message)
        .bind(Json(&slot.history))
        .bind(slot.started_at)
        .bind(slot.completed_at)
        .bind(slot.updated_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn write_slot(
    conn: &mut PgConnection,
    job_id: &str,
    slot: &Slot,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    sqlx::query(
        "UPDATE publish_job_slots SET status = $3, platform_post_id = $4, published_url = $5, \
         error_message = $6, history = $7, started_at = $8, completed_at = $9, updated_at = $10 \
         WHERE job_id = $1 AND platform = $2",
    )
    .bind(job_id)
    .bind(slot.platform.as_str())
    .bind(slot.status.to_string())
    .bind(&slot.platform_post_id)
    .bind(&slot.published_url)
    .bind(&slot.error_message)
    .bind(Json(&slot.history))
    .bind(slot.started_at)
    .bind(slot.completed_at)
    .bind(slot.updated_at)
    .execute(&mut *conn)
    .await?;

    sqlx::query("UPDATE publish_jobs SET updated_at = GREATEST(updated_at, $2) WHERE id = $1")
        .bind(job_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, job: PublishJob) -> StoreResult<PublishJob> {
        let mut tx = self.pool.begin().await?;
        insert_job(&mut tx, &job).await?;
        tx.commit().await?;

        debug!(job_id = %job.id, slots = job.slots.len(), "Persisted publish job");
        Ok(job)
    }

    async fn create_many(&self, jobs: Vec<PublishJob>) -> StoreResult<Vec<PublishJob>> {
        let mut tx = self.pool.begin().await?;
        for job in &jobs {
            // Dropping the transaction on error rolls back earlier inserts
            insert_job(&mut tx, job).await?;
        }
        tx.commit().await?;

        debug!(jobs = jobs.len(), "Persisted publish job batch");
        Ok(jobs)
    }

    async fn get(&self, id: &str) -> StoreResult<PublishJob> {
        let mut conn = self.pool.acquire().await?;
        fetch_job(&mut conn, id).await
    }

    async fn update_slot(
        &self,
        job_id: &str,
        platform: Platform,
        event: SlotEvent,
    ) -> StoreResult<PublishJob> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {SLOT_COLUMNS} FROM publish_job_slots \
             WHERE job_id = $1 AND platform = $2 FOR UPDATE"
        ))
        .bind(job_id)
        .bind(platform.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            // Distinguish a missing job from a platform the job never targeted
            fetch_job(&mut tx, job_id).await?;
            return Err(StoreError::UnknownSlot {
                job_id: job_id.to_string(),
                platform,
            });
        };

        let mut slot = slot_from_row(&row)?;
        let now = Utc::now();
        apply_event(&mut slot, &event, now)?;
        write_slot(&mut tx, job_id, &slot, now).await?;

        let job = fetch_job(&mut tx, job_id).await?;
        tx.commit().await?;
        Ok(job)
    }

    async fn cancel(&self, job_id: &str) -> StoreResult<PublishJob> {
        let mut tx = self.pool.begin().await?;

        // Locks every slot row of the job for the check-then-write below
        sqlx::query("SELECT platform FROM publish_job_slots WHERE job_id = $1 FOR UPDATE")
            .bind(job_id)
            .fetch_all(&mut *tx)
            .await?;

        let mut job = fetch_job(&mut tx, job_id).await?;
        if let Some(reason) = cancellation_blocker(&job) {
            return Err(StoreError::NotCancellable {
                job_id: job_id.to_string(),
                reason,
            });
        }

        let now = Utc::now();
        for platform in job.platforms.clone() {
            if let Some(slot) = job.slots.get_mut(&platform) {
                apply_event(slot, &SlotEvent::Cancel, now)?;
                write_slot(&mut tx, job_id, slot, now).await?;
            }
        }
        job.updated_at = now;

        tx.commit().await?;
        Ok(job)
    }

    async fn list(
        &self,
        owner_id: i64,
        pagination: Pagination,
    ) -> StoreResult<(usize, Vec<PublishJob>)> {
        let mut conn = self.pool.acquire().await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM publish_jobs WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&mut *conn)
            .await?;

        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM publish_jobs WHERE owner_id = $1 \
             ORDER BY created_at DESC, seq DESC LIMIT $2 OFFSET $3",
        )
        .bind(owner_id)
        .bind(i64::try_from(pagination.limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(pagination.skip).unwrap_or(i64::MAX))
        .fetch_all(&mut *conn)
        .await?;

        let mut jobs = Vec::with_capacity(ids.len());
        for id in &ids {
            jobs.push(fetch_job(&mut conn, id).await?);
        }

        Ok((usize::try_from(total).unwrap_or_default(), jobs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PublishReceipt;
    use crate::state_machine::SlotState;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, hour, 0, 0).unwrap()
    }

    fn pending_job(owner_id: i64, created_at: DateTime<Utc>) -> PublishJob {
        PublishJob::new(
            11,
            owner_id,
            vec![Platform::Twitter, Platform::Instagram],
            None,
            None,
            created_at,
            created_at,
        )
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_and_get_round_trip(pool: PgPool) {
        let store = PgJobStore::new(pool);
        let captions = HashMap::from([(Platform::Twitter, "short caption".to_string())]);
        let job = PublishJob::new(
            42,
            7,
            vec![Platform::Twitter, Platform::Tiktok],
            Some(captions),
            Some(vec!["launch".to_string()]),
            at(12) + Duration::hours(1),
            at(12),
        );

        store.create(job.clone()).await.unwrap();
        let fetched = store.get(&job.id).await.unwrap();
        assert_eq!(fetched, job);
        assert_eq!(fetched.overall_status(), crate::state_machine::JobStatus::Scheduled);

        let err = store.create(job.clone()).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateId(job.id.clone()));
        assert!(matches!(
            store.get("missing").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_slot_applies_and_rejects(pool: PgPool) {
        let store = PgJobStore::new(pool);
        let job = store.create(pending_job(1, at(9))).await.unwrap();

        let updated = store
            .update_slot(&job.id, Platform::Twitter, SlotEvent::Start)
            .await
            .unwrap();
        let twitter = &updated.slots[&Platform::Twitter];
        assert_eq!(twitter.status, SlotState::Publishing);
        assert!(twitter.started_at.is_some());
        assert_eq!(twitter.history.len(), 1);
        // Sibling slot is untouched
        assert_eq!(updated.slots[&Platform::Instagram].status, SlotState::Pending);

        let receipt = PublishReceipt {
            post_id: "tw-1".to_string(),
            url: Some("https://twitter.example/tw-1".to_string()),
            published_at: at(9),
        };
        let updated = store
            .update_slot(&job.id, Platform::Twitter, SlotEvent::Succeed(receipt))
            .await
            .unwrap();
        let twitter = &updated.slots[&Platform::Twitter];
        assert_eq!(twitter.status, SlotState::Success);
        assert_eq!(twitter.platform_post_id.as_deref(), Some("tw-1"));
        assert!(twitter.completed_at.is_some());

        // Terminal slots reject late writes and keep their stored state
        let err = store
            .update_slot(&job.id, Platform::Twitter, SlotEvent::fail_with_error("late"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition(_)));
        let stored = store.get(&job.id).await.unwrap();
        assert_eq!(stored.slots[&Platform::Twitter].status, SlotState::Success);
        assert!(stored.slots[&Platform::Twitter].error_message.is_none());

        let err = store
            .update_slot(&job.id, Platform::Youtube, SlotEvent::Start)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownSlot { .. }));
        let err = store
            .update_slot("missing", Platform::Twitter, SlotEvent::Start)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_cancel_is_guarded(pool: PgPool) {
        let store = PgJobStore::new(pool);
        let untouched = store.create(pending_job(1, at(10))).await.unwrap();
        let started = store.create(pending_job(1, at(11))).await.unwrap();
        store
            .update_slot(&started.id, Platform::Instagram, SlotEvent::Start)
            .await
            .unwrap();

        let cancelled = store.cancel(&untouched.id).await.unwrap();
        assert!(cancelled
            .slots
            .values()
            .all(|slot| slot.status == SlotState::Cancelled));
        let stored = store.get(&untouched.id).await.unwrap();
        assert_eq!(stored.overall_status(), crate::state_machine::JobStatus::Cancelled);

        let err = store.cancel(&started.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotCancellable { .. }));
        let stored = store.get(&started.id).await.unwrap();
        assert_eq!(stored.slots[&Platform::Twitter].status, SlotState::Pending);
        assert_eq!(stored.slots[&Platform::Instagram].status, SlotState::Publishing);

        assert!(matches!(
            store.cancel("missing").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_many_rolls_back_on_duplicate(pool: PgPool) {
        let store = PgJobStore::new(pool);
        let existing = store.create(pending_job(1, at(8))).await.unwrap();

        let fresh = pending_job(1, at(9));
        let err = store
            .create_many(vec![fresh.clone(), existing.clone()])
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateId(existing.id.clone()));
        assert!(matches!(
            store.get(&fresh.id).await,
            Err(StoreError::NotFound(_))
        ));

        let batch = vec![pending_job(1, at(9)), pending_job(1, at(10))];
        let created = store.create_many(batch.clone()).await.unwrap();
        assert_eq!(created, batch);
        let (total, _) = store.list(1, Pagination::new(0, 10)).await.unwrap();
        assert_eq!(total, 3);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_list_is_newest_first_and_owner_scoped(pool: PgPool) {
        let store = PgJobStore::new(pool);
        let oldest = store.create(pending_job(1, at(8))).await.unwrap();
        let tied_first = store.create(pending_job(1, at(9))).await.unwrap();
        let tied_second = store.create(pending_job(1, at(9))).await.unwrap();
        store.create(pending_job(2, at(12))).await.unwrap();

        let (total, page) = store.list(1, Pagination::new(0, 2)).await.unwrap();
        assert_eq!(total, 3);
        let ids: Vec<&str> = page.iter().map(|job| job.id.as_str()).collect();
        // Same created_at falls back to insertion order, newest first
        assert_eq!(ids, vec![tied_second.id.as_str(), tied_first.id.as_str()]);

        let (_, page) = store.list(1, Pagination::new(2, 2)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, oldest.id);

        let (total, page) = store.list(1, Pagination::new(usize::MAX, 10)).await.unwrap();
        assert_eq!(total, 3);
        assert!(page.is_empty());
    }
}
