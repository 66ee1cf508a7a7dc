//! Test harness builder wiring a [`PublishingService`] to mock collaborators

#![allow(dead_code)]

use std::sync::Arc;
use syndicate_core::config::PublishingConfig;
use syndicate_core::models::{NewPublishJob, Platform};
use syndicate_core::orchestration::PublishingService;
use syndicate_core::registry::AdapterRegistry;
use syndicate_core::store::InMemoryJobStore;

use super::mocks::{AdapterBehavior, MockContentCatalog, MockCredentialProvider, RecordingAdapter};

pub struct TestHarness {
    pub service: PublishingService,
    pub store: Arc<InMemoryJobStore>,
    pub catalog: Arc<MockContentCatalog>,
    pub credentials: Arc<MockCredentialProvider>,
}

/// Builder pattern for creating a test service
pub struct HarnessBuilder {
    config: PublishingConfig,
    catalog: Arc<MockContentCatalog>,
    credentials: Arc<MockCredentialProvider>,
    adapters: AdapterRegistry,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            config: PublishingConfig::default(),
            catalog: Arc::new(MockContentCatalog::new()),
            credentials: Arc::new(MockCredentialProvider::new()),
            adapters: AdapterRegistry::new(),
        }
    }

    pub fn with_config(mut self, config: PublishingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_adapter(mut self, adapter: Arc<RecordingAdapter>) -> Self {
        self.adapters.register(adapter);
        self
    }

    /// Register an adapter with the given behavior and return it for inspection
    pub fn adapter(&mut self, platform: Platform, behavior: AdapterBehavior) -> Arc<RecordingAdapter> {
        let adapter = RecordingAdapter::new(platform, behavior);
        self.adapters.register(adapter.clone());
        adapter
    }

    pub fn with_credential(self, owner_id: i64, platform: Platform) -> Self {
        self.credentials.grant(owner_id, platform);
        self
    }

    pub fn build(self) -> TestHarness {
        let store = Arc::new(InMemoryJobStore::new());
        let service = PublishingService::new(
            store.clone(),
            self.catalog.clone(),
            self.credentials.clone(),
            self.adapters,
            self.config,
        )
        .expect("Failed to build publishing service");

        TestHarness {
            service,
            store,
            catalog: self.catalog,
            credentials: self.credentials,
        }
    }
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Creation input for `content_id` on the given platform names
pub fn new_job(content_id: i64, platforms: &[&str]) -> NewPublishJob {
    NewPublishJob {
        content_id,
        platforms: platforms.iter().map(|name| name.to_string()).collect(),
        ..Default::default()
    }
}
