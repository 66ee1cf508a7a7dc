//! # External Collaborators
//!
//! Seams to the systems this engine coordinates but does not own: the content
//! catalog (readiness gate and payloads), the credential vault, and the
//! per-platform publish adapters. Implementations live in the embedding
//! service; the engine only depends on these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{Platform, PublishReceipt};

/// Content item handed to a platform adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPayload {
    pub content_id: i64,
    pub title: String,
    /// Caption used when the job carries no per-platform override
    pub default_caption: Option<String>,
    /// Location of the processed media file, if any
    pub media_location: Option<String>,
    pub content_type: String,
}

/// Active platform credential of an owner
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    pub owner_id: i64,
    pub platform: Platform,
    pub access_token: String,
    pub platform_username: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("owner_id", &self.owner_id)
            .field("platform", &self.platform)
            .field("access_token", &"[REDACTED]")
            .field("platform_username", &self.platform_username)
            .finish()
    }
}

/// Failure reported by a platform adapter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited by platform{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("Post rejected by platform: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    retry_after
        .map(|delay| format!(" (retry after {}s)", delay.as_secs()))
        .unwrap_or_default()
}

/// Content readiness gate and payload source
#[async_trait]
pub trait ContentCatalog: Send + Sync {
    /// Whether `content_id` is owned by `owner_id` and eligible for publishing
    async fn is_ready(&self, content_id: i64, owner_id: i64) -> anyhow::Result<bool>;

    async fn fetch(&self, content_id: i64) -> anyhow::Result<Option<ContentPayload>>;
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_active_credential(
        &self,
        owner_id: i64,
        platform: Platform,
    ) -> anyhow::Result<Option<Credential>>;
}

/// Publishes content to one platform
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    async fn publish(
        &self,
        credential: &Credential,
        caption: &str,
        content: &ContentPayload,
    ) -> Result<PublishReceipt, AdapterError>;
}
