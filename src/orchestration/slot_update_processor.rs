//! # Slot Update Processor
//!
//! Consumes slot result messages posted by slot tasks, applies them to the job
//! store, recomputes the job aggregate from the post-write snapshot and emits
//! completion notifications. Each message carries a oneshot acknowledgement so
//! the posting slot task only finishes once its write has been applied.

use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::constants::events;
use crate::events::{EventPublisher, SlotCompletedNotification};
use crate::logging::{log_error, log_slot_operation};
use crate::models::{Platform, PublishJob};
use crate::state_machine::SlotEvent;
use crate::store::{JobStore, StoreError, StoreResult};

/// A slot state change requested by a slot task
#[derive(Debug)]
pub struct SlotUpdateMessage {
    pub job_id: String,
    pub platform: Platform,
    pub event: SlotEvent,
    pub ack: oneshot::Sender<StoreResult<PublishJob>>,
}

pub struct SlotUpdateProcessor {
    store: Arc<dyn JobStore>,
    events: EventPublisher,
}

impl SlotUpdateProcessor {
    pub fn new(store: Arc<dyn JobStore>, events: EventPublisher) -> Self {
        Self { store, events }
    }

    /// Process messages until every sender has been dropped
    pub async fn run(self, mut receiver: mpsc::Receiver<SlotUpdateMessage>) {
        debug!("Slot update processor started");
        while let Some(message) = receiver.recv().await {
            let result = self
                .apply(&message.job_id, message.platform, message.event)
                .await;
            // The slot task may have been aborted; nobody is waiting then
            let _ = message.ack.send(result);
        }
        debug!("Slot update processor stopped");
    }

    /// Apply one slot event and publish the resulting notifications
    pub async fn apply(
        &self,
        job_id: &str,
        platform: Platform,
        event: SlotEvent,
    ) -> StoreResult<PublishJob> {
        let event_type = event.event_type();
        let job = match self.store.update_slot(job_id, platform, event).await {
            Ok(job) => job,
            Err(StoreError::InvalidTransition(err)) => {
                warn!(
                    job_id = %job_id,
                    platform = %platform,
                    event = event_type,
                    error = %err,
                    "Rejected late slot write"
                );
                return Err(StoreError::InvalidTransition(err));
            }
            Err(err) => {
                log_error(
                    "slot_update_processor",
                    "update_slot",
                    &err.to_string(),
                    Some(job_id),
                );
                return Err(err);
            }
        };

        let Some(slot) = job.slots.get(&platform) else {
            return Ok(job);
        };

        let overall = job.overall_status();
        let percentage = job.completion_percentage();
        log_slot_operation(
            event_type,
            job_id,
            platform,
            &slot.status.to_string(),
            slot.error_message.as_deref(),
        );
        debug!(
            job_id = %job_id,
            overall_status = %overall,
            completion_percentage = percentage,
            "Recomputed job aggregate"
        );

        if slot.status.is_terminal() {
            let notification = SlotCompletedNotification {
                job_id: job.id.clone(),
                content_id: job.content_id,
                platform,
                status: slot.status,
                post_id: slot.platform_post_id.clone(),
                error: slot.error_message.clone(),
            };
            if let Err(err) = self.events.publish_slot_completed(&notification) {
                warn!(job_id = %job_id, error = %err, "Failed to publish slot completion");
            }
        }

        if overall.is_terminal() {
            self.events.publish(
                events::JOB_FINISHED,
                json!({
                    "job_id": job.id,
                    "content_id": job.content_id,
                    "overall_status": overall,
                    "completion_percentage": percentage,
                }),
            );
        }

        Ok(job)
    }
}
