//! # Platform Adapter Registry
//!
//! Maps each platform to the adapter that publishes to it. Built once at
//! startup and shared read-only by every slot task.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::integrations::PlatformAdapter;
use crate::models::Platform;

#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under the platform it reports.
    ///
    /// A second registration for the same platform replaces the first.
    pub fn register(&mut self, adapter: Arc<dyn PlatformAdapter>) -> &mut Self {
        let platform = adapter.platform();
        if self.adapters.insert(platform, adapter).is_some() {
            warn!(platform = %platform, "Replacing previously registered platform adapter");
        } else {
            debug!(platform = %platform, "Registered platform adapter");
        }
        self
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn PlatformAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, platform: Platform) -> Option<Arc<dyn PlatformAdapter>> {
        self.adapters.get(&platform).cloned()
    }

    pub fn contains(&self, platform: Platform) -> bool {
        self.adapters.contains_key(&platform)
    }

    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.adapters.keys().copied().collect();
        platforms.sort();
        platforms
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("platforms", &self.platforms())
            .finish()
    }
}
