//! # Error Types
//!
//! Caller-facing error taxonomy for the publishing lifecycle. Per-slot failures
//! (missing credentials, adapter errors) are never raised through these types;
//! they are recorded on the slot and surface only through status reads.

use crate::state_machine::errors::StateMachineError;
use crate::store::StoreError;

/// Errors returned by the lifecycle API
#[derive(Debug, thiserror::Error)]
pub enum PublishingError {
    /// Bad creation input; the job was never created
    #[error("Validation error: {0}")]
    Validation(String),

    /// One or more content items are not eligible for publishing
    #[error("Content not ready for publishing: {content_ids:?}")]
    NotReady { content_ids: Vec<i64> },

    #[error("Publish job not found: {0}")]
    NotFound(String),

    #[error("Access denied to publish job {job_id}")]
    Forbidden { job_id: String },

    /// Operation is not legal for the job's current slot states
    #[error("Invalid state for job {job_id}: {reason}")]
    InvalidState { job_id: String, reason: String },

    #[error("Store error: {0}")]
    Store(#[source] StoreError),

    /// An external collaborator (readiness gate) failed
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PublishingError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotReady { .. } => "not_ready",
            Self::NotFound(_) => "not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::InvalidState { .. } => "invalid_state",
            Self::Store(_) => "store_error",
            Self::Collaborator(_) => "collaborator_error",
            Self::Configuration(_) => "configuration_error",
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<StoreError> for PublishingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(job_id) => Self::NotFound(job_id),
            StoreError::NotCancellable { job_id, reason } => Self::InvalidState { job_id, reason },
            other => Self::Store(other),
        }
    }
}

impl From<StateMachineError> for PublishingError {
    fn from(err: StateMachineError) -> Self {
        Self::Store(StoreError::from(err))
    }
}

pub type Result<T> = std::result::Result<T, PublishingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            PublishingError::validation("empty platforms").code(),
            "validation_error"
        );
        assert_eq!(
            PublishingError::NotReady {
                content_ids: vec![2]
            }
            .code(),
            "not_ready"
        );
        assert_eq!(PublishingError::NotFound("abc".into()).code(), "not_found");
        assert_eq!(
            PublishingError::Forbidden {
                job_id: "abc".into()
            }
            .code(),
            "forbidden"
        );
    }

    #[test]
    fn test_store_errors_map_to_lifecycle_errors() {
        let err: PublishingError = StoreError::NotFound("job-1".into()).into();
        assert_eq!(err.code(), "not_found");

        let err: PublishingError = StoreError::NotCancellable {
            job_id: "job-1".into(),
            reason: "twitter is publishing".into(),
        }
        .into();
        assert_eq!(err.code(), "invalid_state");

        let err: PublishingError = StoreError::Backend("connection reset".into()).into();
        assert_eq!(err.code(), "store_error");
    }
}
