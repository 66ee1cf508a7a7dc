//! # System Constants
//!
//! Event names and slot failure reasons shared across the publishing engine.

/// Lifecycle events published through [`crate::events::EventPublisher`]
pub mod events {
    pub const JOB_CREATED: &str = "publish.job_created";
    pub const JOB_CANCELLED: &str = "publish.job_cancelled";
    pub const JOB_FINISHED: &str = "publish.job_finished";
    pub const SLOT_COMPLETED: &str = "publish.slot_completed";
}

/// Reasons recorded on a failed slot when no adapter error message exists
pub mod failure_reasons {
    /// The owner has no active credential for the platform
    pub const NO_CREDENTIALS: &str = "no_credentials";
    /// No adapter is registered for the platform
    pub const NO_ADAPTER: &str = "no_adapter";
    /// The content payload could not be loaded at dispatch time
    pub const CONTENT_UNAVAILABLE: &str = "content_unavailable";
    pub const CREDENTIAL_LOOKUP_FAILED: &str = "credential_lookup_failed";
}
