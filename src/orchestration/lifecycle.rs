//! # Publishing Lifecycle
//!
//! Caller-facing API: job creation (single and batch), status queries,
//! cancellation and history. Validation and readiness gating happen before
//! anything is persisted, so a rejected request leaves no job behind.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::dispatcher::Dispatcher;
use super::stagger;
use super::status_aggregator::PublishStatus;
use crate::config::PublishingConfig;
use crate::constants::events;
use crate::error::{PublishingError, Result};
use crate::events::EventPublisher;
use crate::integrations::{ContentCatalog, CredentialProvider};
use crate::logging::log_job_operation;
use crate::models::{
    BatchPublishRequest, HistoryPage, NewPublishJob, Pagination, Platform, PublishJob,
};
use crate::registry::AdapterRegistry;
use crate::store::JobStore;

/// Entry point for publishing content to social platforms
pub struct PublishingService {
    store: Arc<dyn JobStore>,
    content: Arc<dyn ContentCatalog>,
    dispatcher: Dispatcher,
    events: EventPublisher,
    config: PublishingConfig,
}

impl PublishingService {
    /// Build the service and start its dispatcher.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        store: Arc<dyn JobStore>,
        content: Arc<dyn ContentCatalog>,
        credentials: Arc<dyn CredentialProvider>,
        adapters: AdapterRegistry,
        config: PublishingConfig,
    ) -> Result<Self> {
        config.validate()?;
        let events = EventPublisher::new(config.event_channel_capacity);
        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            Arc::clone(&content),
            credentials,
            adapters,
            events.clone(),
            &config,
        );

        Ok(Self {
            store,
            content,
            dispatcher,
            events,
            config,
        })
    }

    /// Create a job for one content item and start dispatching it
    #[instrument(skip(self, request), fields(content_id = request.content_id))]
    pub async fn create_job(&self, owner_id: i64, request: NewPublishJob) -> Result<PublishJob> {
        let now = Utc::now();
        let platforms = parse_platforms(&request.platforms)?;
        let captions = parse_captions(request.captions, &platforms)?;
        validate_schedule(request.scheduled_time, now)?;

        if !self.content.is_ready(request.content_id, owner_id).await? {
            return Err(PublishingError::NotReady {
                content_ids: vec![request.content_id],
            });
        }

        let job = PublishJob::new(
            request.content_id,
            owner_id,
            platforms,
            captions,
            request.tags,
            request.scheduled_time.unwrap_or(now),
            now,
        );
        let job = self.store.create(job).await?;

        self.announce_created(&job);
        self.dispatcher.dispatch(&job);
        Ok(job)
    }

    /// Create one job per content item, staggering their effective times.
    ///
    /// Every item must pass the readiness gate; otherwise no job is created and
    /// the error lists every offending content id.
    #[instrument(skip(self, request), fields(items = request.content_ids.len()))]
    pub async fn create_batch(
        &self,
        owner_id: i64,
        request: BatchPublishRequest,
    ) -> Result<Vec<PublishJob>> {
        let now = Utc::now();
        if request.content_ids.is_empty() {
            return Err(PublishingError::validation(
                "Batch must contain at least one content item",
            ));
        }
        let platforms = parse_platforms(&request.platforms)?;
        validate_schedule(request.scheduled_time, now)?;
        let effective_times = stagger::effective_times(
            request.scheduled_time.unwrap_or(now),
            request.content_ids.len(),
            request.stagger_minutes,
        )
        .ok_or_else(|| {
            PublishingError::validation("Staggered schedule runs past the supported time range")
        })?;

        let readiness = futures::future::try_join_all(
            request
                .content_ids
                .iter()
                .map(|content_id| self.content.is_ready(*content_id, owner_id)),
        )
        .await?;
        let not_ready: Vec<i64> = request
            .content_ids
            .iter()
            .zip(readiness)
            .filter_map(|(content_id, ready)| (!ready).then_some(*content_id))
            .collect();
        if !not_ready.is_empty() {
            return Err(PublishingError::NotReady {
                content_ids: not_ready,
            });
        }

        let jobs: Vec<PublishJob> = effective_times
            .into_iter()
            .zip(&request.content_ids)
            .map(|(effective_time, content_id)| {
                PublishJob::new(
                    *content_id,
                    owner_id,
                    platforms.clone(),
                    None,
                    None,
                    effective_time,
                    now,
                )
            })
            .collect();

        let jobs = self.store.create_many(jobs).await?;
        info!(
            owner_id = owner_id,
            jobs = jobs.len(),
            stagger_minutes = ?request.stagger_minutes,
            "Created publish batch"
        );
        for job in &jobs {
            self.announce_created(job);
            self.dispatcher.dispatch(job);
        }
        Ok(jobs)
    }

    /// Aggregate status of a job owned by `caller_id`
    pub async fn get_status(&self, job_id: &str, caller_id: i64) -> Result<PublishStatus> {
        let job = self.owned_job(job_id, caller_id).await?;
        Ok(PublishStatus::from_job(
            &job,
            self.config.estimated_completion_window(),
        ))
    }

    /// Cancel a job whose slots are all still pending or scheduled
    #[instrument(skip(self))]
    pub async fn cancel(&self, job_id: &str, caller_id: i64) -> Result<()> {
        self.owned_job(job_id, caller_id).await?;

        let job = self.store.cancel(job_id).await?;
        self.dispatcher.abort(job_id);

        log_job_operation(
            "cancel",
            job_id,
            caller_id,
            &job.overall_status().to_string(),
            None,
        );
        self.events.publish(
            events::JOB_CANCELLED,
            json!({ "job_id": job.id, "content_id": job.content_id }),
        );
        Ok(())
    }

    /// Page through the caller's jobs, newest first
    pub async fn list_history(&self, caller_id: i64, pagination: Pagination) -> Result<HistoryPage> {
        let pagination = pagination.clamped(self.config.history_max_limit);
        let (total, jobs) = self.store.list(caller_id, pagination).await?;
        debug!(
            owner_id = caller_id,
            total = total,
            returned = jobs.len(),
            "Listed publish history"
        );
        Ok(HistoryPage {
            total,
            skip: pagination.skip,
            limit: pagination.limit,
            jobs,
        })
    }

    /// Paging used when a caller supplies none
    pub fn default_pagination(&self) -> Pagination {
        Pagination::new(0, self.config.history_default_limit)
    }

    /// Wait for every outstanding slot task of `job_id` to finish
    pub async fn wait_for_job(&self, job_id: &str) {
        self.dispatcher.wait_for(job_id).await;
    }

    /// Lifecycle and slot completion notifications
    pub fn events(&self) -> &EventPublisher {
        &self.events
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    pub fn config(&self) -> &PublishingConfig {
        &self.config
    }

    async fn owned_job(&self, job_id: &str, caller_id: i64) -> Result<PublishJob> {
        let job = self.store.get(job_id).await?;
        if job.owner_id != caller_id {
            return Err(PublishingError::Forbidden {
                job_id: job_id.to_string(),
            });
        }
        Ok(job)
    }

    fn announce_created(&self, job: &PublishJob) {
        log_job_operation(
            "create",
            &job.id,
            job.owner_id,
            &job.overall_status().to_string(),
            Some(&format!("platforms={:?}", job.platforms)),
        );
        self.events.publish(
            events::JOB_CREATED,
            json!({
                "job_id": job.id,
                "content_id": job.content_id,
                "owner_id": job.owner_id,
                "platforms": job.platforms,
                "effective_time": job.effective_time(),
            }),
        );
    }
}

fn parse_platforms(raw: &[String]) -> Result<Vec<Platform>> {
    if raw.is_empty() {
        return Err(PublishingError::validation(
            "At least one platform is required",
        ));
    }

    let mut seen = HashSet::new();
    let mut platforms = Vec::with_capacity(raw.len());
    for name in raw {
        let platform: Platform = name.parse().map_err(PublishingError::Validation)?;
        if !seen.insert(platform) {
            return Err(PublishingError::validation(format!(
                "Duplicate platform: {platform}"
            )));
        }
        platforms.push(platform);
    }
    Ok(platforms)
}

fn parse_captions(
    raw: Option<HashMap<String, String>>,
    platforms: &[Platform],
) -> Result<Option<HashMap<Platform, String>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    raw.into_iter()
        .map(|(name, caption)| {
            let platform: Platform = name.parse().map_err(PublishingError::Validation)?;
            if !platforms.contains(&platform) {
                return Err(PublishingError::validation(format!(
                    "Caption given for platform not in job: {platform}"
                )));
            }
            Ok((platform, caption))
        })
        .collect::<Result<HashMap<_, _>>>()
        .map(Some)
}

fn validate_schedule(scheduled_time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<()> {
    match scheduled_time {
        Some(at) if at <= now => Err(PublishingError::validation(
            "Scheduled time must be in the future",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn test_parse_platforms() {
        let platforms = parse_platforms(&names(&["twitter", "instagram"])).unwrap();
        assert_eq!(platforms, vec![Platform::Twitter, Platform::Instagram]);

        assert_eq!(parse_platforms(&[]).unwrap_err().code(), "validation_error");
        assert_eq!(
            parse_platforms(&names(&["twitter", "myspace"]))
                .unwrap_err()
                .code(),
            "validation_error"
        );
        assert_eq!(
            parse_platforms(&names(&["twitter", "twitter"]))
                .unwrap_err()
                .code(),
            "validation_error"
        );
    }

    #[test]
    fn test_parse_captions() {
        let platforms = vec![Platform::Twitter];
        assert!(parse_captions(None, &platforms).unwrap().is_none());

        let captions = HashMap::from([("twitter".to_string(), "hello".to_string())]);
        let parsed = parse_captions(Some(captions), &platforms).unwrap().unwrap();
        assert_eq!(parsed.get(&Platform::Twitter).map(String::as_str), Some("hello"));

        let stray = HashMap::from([("tiktok".to_string(), "hi".to_string())]);
        assert!(parse_captions(Some(stray), &platforms).is_err());
    }

    #[test]
    fn test_validate_schedule() {
        let now = Utc::now();
        assert!(validate_schedule(None, now).is_ok());
        assert!(validate_schedule(Some(now + Duration::minutes(1)), now).is_ok());
        assert!(validate_schedule(Some(now), now).is_err());
        assert!(validate_schedule(Some(now - Duration::minutes(1)), now).is_err());
    }
}
