//! # Data Models
//!
//! Publish jobs, their per-platform slots, batch requests and history paging.

pub mod batch;
pub mod pagination;
pub mod platform;
pub mod publish_job;

pub use batch::BatchPublishRequest;
pub use pagination::{HistoryPage, Pagination, DEFAULT_PAGE_LIMIT};
pub use platform::Platform;
pub use publish_job::{
    generate_job_id, NewPublishJob, PublishJob, PublishReceipt, Slot, SlotTransition,
};
