#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Syndicate Core
//!
//! Publishing orchestration engine for social content.
//!
//! ## Overview
//!
//! A publish job fans one content item out to several social platforms. Each
//! (job, platform) pair is a **slot** with its own lifecycle; the engine
//! dispatches slots at their effective time, records each platform's outcome
//! and derives an aggregate job status from the slot map on every read.
//!
//! ## Key Features
//!
//! - **Per-slot state machine**: every slot write is validated against a single
//!   transition table, so late writes after cancellation are rejected
//! - **Staggered batches**: one job per content item, spaced by a fixed interval
//! - **Isolated failures**: a missing credential or failing adapter only fails
//!   its own slot
//! - **Pluggable persistence**: in-memory store and a row-locked PostgreSQL store
//!
//! ## Module Organization
//!
//! - [`models`] - Jobs, slots, platforms, batch requests and history paging
//! - [`state_machine`] - Slot states, events and transitions
//! - [`store`] - Job persistence
//! - [`orchestration`] - Lifecycle API, dispatcher and status aggregation
//! - [`integrations`] - Content catalog, credential and adapter seams
//! - [`registry`] - Platform adapter registry
//! - [`events`] - Completion notifications
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use syndicate_core::config::PublishingConfig;
//! use syndicate_core::integrations::{ContentCatalog, CredentialProvider};
//! use syndicate_core::models::NewPublishJob;
//! use syndicate_core::orchestration::PublishingService;
//! use syndicate_core::registry::AdapterRegistry;
//! use syndicate_core::store::InMemoryJobStore;
//!
//! # async fn example(
//! #     content: Arc<dyn ContentCatalog>,
//! #     credentials: Arc<dyn CredentialProvider>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let service = PublishingService::new(
//!     Arc::new(InMemoryJobStore::new()),
//!     content,
//!     credentials,
//!     AdapterRegistry::new(),
//!     PublishingConfig::default(),
//! )?;
//!
//! let job = service
//!     .create_job(
//!         42,
//!         NewPublishJob {
//!             content_id: 7,
//!             platforms: vec!["twitter".to_string(), "instagram".to_string()],
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//!
//! service.wait_for_job(&job.id).await;
//! let status = service.get_status(&job.id, 42).await?;
//! println!("{} is {}% complete", status.job_id, status.completion_percentage);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod integrations;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod registry;
pub mod state_machine;
pub mod store;

pub use crate::config::PublishingConfig;
pub use error::{PublishingError, Result};
pub use events::{EventPublisher, PublishedEvent, SlotCompletedNotification};
pub use integrations::{
    AdapterError, ContentCatalog, ContentPayload, Credential, CredentialProvider, PlatformAdapter,
};
pub use models::{
    BatchPublishRequest, HistoryPage, NewPublishJob, Pagination, Platform, PublishJob,
    PublishReceipt, Slot,
};
pub use orchestration::{PublishStatus, PublishingService};
pub use registry::AdapterRegistry;
pub use state_machine::{JobStatus, SlotEvent, SlotState};
pub use store::{InMemoryJobStore, JobStore, StoreError};
