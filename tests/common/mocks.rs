//! Mock collaborators for lifecycle tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use syndicate_core::integrations::{
    AdapterError, ContentCatalog, ContentPayload, Credential, CredentialProvider, PlatformAdapter,
};
use syndicate_core::models::{Platform, PublishReceipt};

/// Content catalog where every item is ready unless listed otherwise
#[derive(Debug, Default)]
pub struct MockContentCatalog {
    not_ready: Mutex<HashSet<i64>>,
    missing: Mutex<HashSet<i64>>,
    readiness_checks: AtomicUsize,
}

impl MockContentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_not_ready(&self, content_id: i64) {
        self.not_ready.lock().insert(content_id);
    }

    /// Content passes the readiness gate but can no longer be fetched
    pub fn mark_missing(&self, content_id: i64) {
        self.missing.lock().insert(content_id);
    }

    pub fn readiness_checks(&self) -> usize {
        self.readiness_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentCatalog for MockContentCatalog {
    async fn is_ready(&self, content_id: i64, _owner_id: i64) -> anyhow::Result<bool> {
        self.readiness_checks.fetch_add(1, Ordering::SeqCst);
        Ok(!self.not_ready.lock().contains(&content_id))
    }

    async fn fetch(&self, content_id: i64) -> anyhow::Result<Option<ContentPayload>> {
        if self.missing.lock().contains(&content_id) {
            return Ok(None);
        }
        Ok(Some(ContentPayload {
            content_id,
            title: format!("Content {content_id}"),
            default_caption: Some(format!("Default caption {content_id}")),
            media_location: Some(format!("/media/{content_id}.mp4")),
            content_type: "video".to_string(),
        }))
    }
}

/// Credential vault keyed by (owner, platform)
#[derive(Debug, Default)]
pub struct MockCredentialProvider {
    credentials: Mutex<HashMap<(i64, Platform), Credential>>,
    failing: Mutex<HashSet<Platform>>,
}

impl MockCredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, owner_id: i64, platform: Platform) {
        self.credentials.lock().insert(
            (owner_id, platform),
            Credential {
                id: format!("cred-{owner_id}-{platform}"),
                owner_id,
                platform,
                access_token: "token".to_string(),
                platform_username: Some(format!("user{owner_id}")),
            },
        );
    }

    /// Lookups for `platform` return an error
    pub fn fail_lookups(&self, platform: Platform) {
        self.failing.lock().insert(platform);
    }
}

#[async_trait]
impl CredentialProvider for MockCredentialProvider {
    async fn get_active_credential(
        &self,
        owner_id: i64,
        platform: Platform,
    ) -> anyhow::Result<Option<Credential>> {
        if self.failing.lock().contains(&platform) {
            anyhow::bail!("vault unavailable");
        }
        Ok(self.credentials.lock().get(&(owner_id, platform)).cloned())
    }
}

/// How a [`RecordingAdapter`] responds to publish calls
#[derive(Debug, Clone)]
pub enum AdapterBehavior {
    Succeed,
    Fail(AdapterError),
    /// Never completes
    Hang,
    Panic,
    /// Succeeds after the given delay
    Delay(Duration),
}

/// Adapter that records every call it receives
#[derive(Debug)]
pub struct RecordingAdapter {
    platform: Platform,
    behavior: AdapterBehavior,
    calls: AtomicUsize,
    captions: Mutex<Vec<String>>,
}

impl RecordingAdapter {
    pub fn new(platform: Platform, behavior: AdapterBehavior) -> Arc<Self> {
        Arc::new(Self {
            platform,
            behavior,
            calls: AtomicUsize::new(0),
            captions: Mutex::new(Vec::new()),
        })
    }

    pub fn succeeding(platform: Platform) -> Arc<Self> {
        Self::new(platform, AdapterBehavior::Succeed)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn captions(&self) -> Vec<String> {
        self.captions.lock().clone()
    }

    fn receipt(&self, content: &ContentPayload) -> PublishReceipt {
        let post_id = format!("{}-post-{}", self.platform, content.content_id);
        PublishReceipt {
            url: Some(format!("https://{}.example/{post_id}", self.platform)),
            post_id,
            published_at: Utc::now(),
        }
    }
}

#[async_trait]
impl PlatformAdapter for RecordingAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn publish(
        &self,
        _credential: &Credential,
        caption: &str,
        content: &ContentPayload,
    ) -> Result<PublishReceipt, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.captions.lock().push(caption.to_string());

        match &self.behavior {
            AdapterBehavior::Succeed => Ok(self.receipt(content)),
            AdapterBehavior::Fail(err) => Err(err.clone()),
            AdapterBehavior::Hang => std::future::pending().await,
            AdapterBehavior::Panic => panic!("adapter exploded"),
            AdapterBehavior::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(self.receipt(content))
            }
        }
    }
}
