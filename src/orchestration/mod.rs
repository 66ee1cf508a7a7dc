//! # Orchestration
//!
//! Coordinates publish jobs from creation to their terminal state.
//!
//! ## Core Components
//!
//! - **PublishingService**: caller-facing lifecycle API (create, batch, status,
//!   cancel, history)
//! - **Stagger**: effective times for batch items
//! - **Dispatcher**: one tokio task per (job, platform) slot
//! - **SlotUpdateProcessor**: applies slot results and emits notifications
//! - **StatusAggregator**: overall status and completion percentage, always
//!   recomputed from the current slot map

pub mod dispatcher;
pub mod lifecycle;
pub mod slot_update_processor;
pub mod stagger;
pub mod status_aggregator;

pub use dispatcher::Dispatcher;
pub use lifecycle::PublishingService;
pub use slot_update_processor::{SlotUpdateMessage, SlotUpdateProcessor};
pub use stagger::{effective_times, stagger_offsets};
pub use status_aggregator::{
    completion_percentage, overall_status, percentage_from_counts, status_from_counts,
    PublishStatus, SlotCounts,
};
