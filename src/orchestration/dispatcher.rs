//! # Dispatcher
//!
//! Runs one tokio task per (job, platform) slot. A task waits for its slot's
//! effective time, resolves the owner's credential, claims the slot by moving
//! it to `publishing`, and calls the platform adapter. Claims go straight to the
//! store so a concurrent cancellation either wins before the claim or is
//! rejected after it; results are posted to the [`SlotUpdateProcessor`].
//!
//! There is no retry: a failed slot is terminal and a new job is the only way
//! to publish again.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::slot_update_processor::{SlotUpdateMessage, SlotUpdateProcessor};
use crate::config::PublishingConfig;
use crate::constants::failure_reasons;
use crate::events::EventPublisher;
use crate::integrations::{ContentCatalog, CredentialProvider};
use crate::logging::{log_error, log_slot_operation};
use crate::models::{Platform, PublishJob};
use crate::registry::AdapterRegistry;
use crate::state_machine::{SlotEvent, SlotState};
use crate::store::{JobStore, StoreError};

/// Everything a slot task needs to know about its slot
#[derive(Debug, Clone)]
struct SlotAssignment {
    job_id: String,
    owner_id: i64,
    content_id: i64,
    platform: Platform,
    caption_override: Option<String>,
    effective_time: DateTime<Utc>,
    awaiting_activation: bool,
}

/// Bounds concurrent adapter calls per credential when configured
#[derive(Debug, Default)]
struct CredentialLimiter {
    max_in_flight: Option<usize>,
    semaphores: DashMap<String, Arc<Semaphore>>,
}

impl CredentialLimiter {
    fn new(max_in_flight: Option<usize>) -> Self {
        Self {
            max_in_flight,
            semaphores: DashMap::new(),
        }
    }

    async fn acquire(&self, credential_id: &str) -> Option<OwnedSemaphorePermit> {
        let limit = self.max_in_flight?;
        let semaphore = self
            .semaphores
            .entry(credential_id.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(limit)))
            .clone();
        semaphore.acquire_owned().await.ok()
    }
}

struct DispatchContext {
    store: Arc<dyn JobStore>,
    content: Arc<dyn ContentCatalog>,
    credentials: Arc<dyn CredentialProvider>,
    adapters: AdapterRegistry,
    updates: mpsc::Sender<SlotUpdateMessage>,
    limiter: CredentialLimiter,
    adapter_timeout: Duration,
}

/// Spawns and tracks slot tasks
#[derive(Clone)]
pub struct Dispatcher {
    context: Arc<DispatchContext>,
    tasks: Arc<Mutex<HashMap<String, Vec<JoinHandle<()>>>>>,
}

impl Dispatcher {
    /// Create a dispatcher and start its slot update processor.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        store: Arc<dyn JobStore>,
        content: Arc<dyn ContentCatalog>,
        credentials: Arc<dyn CredentialProvider>,
        adapters: AdapterRegistry,
        events: EventPublisher,
        config: &PublishingConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.update_channel_capacity);
        let processor = SlotUpdateProcessor::new(Arc::clone(&store), events);
        tokio::spawn(processor.run(receiver));

        info!(
            adapters = ?adapters.platforms(),
            adapter_timeout_secs = config.adapter_timeout_secs,
            max_in_flight_per_credential = ?config.max_in_flight_per_credential,
            "🚀 Dispatcher started"
        );

        Self {
            context: Arc::new(DispatchContext {
                store,
                content,
                credentials,
                adapters,
                updates: sender,
                limiter: CredentialLimiter::new(config.max_in_flight_per_credential),
                adapter_timeout: config.adapter_timeout(),
            }),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Spawn one task per slot of `job`
    pub fn dispatch(&self, job: &PublishJob) {
        let handles: Vec<JoinHandle<()>> = job
            .ordered_slots()
            .map(|slot| {
                let assignment = SlotAssignment {
                    job_id: job.id.clone(),
                    owner_id: job.owner_id,
                    content_id: job.content_id,
                    platform: slot.platform,
                    caption_override: job.caption_override(slot.platform).map(str::to_string),
                    effective_time: job.effective_time(),
                    awaiting_activation: slot.status == SlotState::Scheduled,
                };
                tokio::spawn(run_slot(Arc::clone(&self.context), assignment))
            })
            .collect();

        debug!(
            job_id = %job.id,
            slots = handles.len(),
            effective_time = %job.effective_time(),
            "Dispatched slot tasks"
        );

        let mut tasks = self.tasks.lock();
        tasks.retain(|_, handles| {
            handles.retain(|handle| !handle.is_finished());
            !handles.is_empty()
        });
        tasks.insert(job.id.clone(), handles);
    }

    /// Wait until every slot task of `job_id` has finished
    pub async fn wait_for(&self, job_id: &str) {
        let handles = self.tasks.lock().remove(job_id).unwrap_or_default();
        for result in futures::future::join_all(handles).await {
            if let Err(err) = result {
                if !err.is_cancelled() {
                    log_error("dispatcher", "wait_for", &err.to_string(), Some(job_id));
                }
            }
        }
    }

    /// Abort the slot tasks of a cancelled job.
    ///
    /// Only called after the store accepted the cancellation, so every task is
    /// still waiting for its effective time or about to find its claim rejected.
    pub fn abort(&self, job_id: &str) {
        if let Some(handles) = self.tasks.lock().remove(job_id) {
            for handle in handles {
                handle.abort();
            }
        }
    }
}

async fn run_slot(context: Arc<DispatchContext>, slot: SlotAssignment) {
    if slot.awaiting_activation {
        let delay = (slot.effective_time - Utc::now())
            .to_std()
            .unwrap_or_default();
        tokio::time::sleep(delay).await;

        match context
            .store
            .update_slot(&slot.job_id, slot.platform, SlotEvent::Activate)
            .await
        {
            Ok(_) => log_slot_operation("activate", &slot.job_id, slot.platform, "pending", None),
            Err(StoreError::InvalidTransition(_)) => {
                debug!(job_id = %slot.job_id, platform = %slot.platform, "Slot cancelled before activation");
                return;
            }
            Err(err) => {
                log_error("dispatcher", "activate", &err.to_string(), Some(&slot.job_id));
                return;
            }
        }
    }

    let Some(event) = context.attempt(&slot).await else {
        return;
    };

    let (ack, acknowledged) = oneshot::channel();
    let message = SlotUpdateMessage {
        job_id: slot.job_id.clone(),
        platform: slot.platform,
        event,
        ack,
    };
    if context.updates.send(message).await.is_err() {
        log_error(
            "dispatcher",
            "post_slot_result",
            "slot update processor is not running",
            Some(&slot.job_id),
        );
        return;
    }
    let _ = acknowledged.await;
}

impl DispatchContext {
    /// Run the publish attempt; `None` when the slot was cancelled under us
    async fn attempt(&self, slot: &SlotAssignment) -> Option<SlotEvent> {
        let credential = match self
            .credentials
            .get_active_credential(slot.owner_id, slot.platform)
            .await
        {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                return Some(SlotEvent::fail_with_error(failure_reasons::NO_CREDENTIALS));
            }
            Err(err) => {
                return Some(SlotEvent::fail_with_error(format!(
                    "{}: {err}",
                    failure_reasons::CREDENTIAL_LOOKUP_FAILED
                )));
            }
        };

        let Some(adapter) = self.adapters.get(slot.platform) else {
            return Some(SlotEvent::fail_with_error(failure_reasons::NO_ADAPTER));
        };

        match self
            .store
            .update_slot(&slot.job_id, slot.platform, SlotEvent::Start)
            .await
        {
            Ok(_) => log_slot_operation("start", &slot.job_id, slot.platform, "publishing", None),
            Err(StoreError::InvalidTransition(_)) => {
                debug!(job_id = %slot.job_id, platform = %slot.platform, "Slot cancelled before dispatch");
                return None;
            }
            Err(err) => {
                log_error("dispatcher", "claim", &err.to_string(), Some(&slot.job_id));
                return Some(SlotEvent::fail_with_error(err.to_string()));
            }
        }

        let content = match self.content.fetch(slot.content_id).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                return Some(SlotEvent::fail_with_error(
                    failure_reasons::CONTENT_UNAVAILABLE,
                ))
            }
            Err(err) => {
                return Some(SlotEvent::fail_with_error(format!(
                    "{}: {err}",
                    failure_reasons::CONTENT_UNAVAILABLE
                )))
            }
        };

        let caption = slot
            .caption_override
            .clone()
            .or_else(|| content.default_caption.clone())
            .unwrap_or_default();

        let _permit = self.limiter.acquire(&credential.id).await;
        let call = AssertUnwindSafe(adapter.publish(&credential, &caption, &content)).catch_unwind();

        let event = match tokio::time::timeout(self.adapter_timeout, call).await {
            Ok(Ok(Ok(receipt))) => SlotEvent::Succeed(receipt),
            Ok(Ok(Err(err))) => SlotEvent::fail_with_error(err.to_string()),
            Ok(Err(panic)) => SlotEvent::fail_with_error(format!(
                "adapter panicked: {}",
                panic_message(panic.as_ref())
            )),
            Err(_) => {
                warn!(
                    job_id = %slot.job_id,
                    platform = %slot.platform,
                    timeout_secs = self.adapter_timeout.as_secs(),
                    "Adapter call timed out"
                );
                SlotEvent::fail_with_error(format!(
                    "adapter timed out after {}s",
                    self.adapter_timeout.as_secs()
                ))
            }
        };

        Some(event)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
