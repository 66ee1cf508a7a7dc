//! # Configuration
//!
//! Runtime settings for the publishing engine. Values come from defaults,
//! optionally overlaid by a TOML/YAML/JSON file and `SYNDICATE_*` environment
//! variables, and are validated before use.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{PublishingError, Result};

pub const ENV_PREFIX: &str = "SYNDICATE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishingConfig {
    /// Upper bound on a single adapter publish call
    pub adapter_timeout_secs: u64,
    /// Added to a job's effective time to estimate its completion
    pub estimated_completion_minutes: u32,
    pub history_default_limit: usize,
    pub history_max_limit: usize,
    /// Capacity of the lifecycle event broadcast channel
    pub event_channel_capacity: usize,
    /// Capacity of the slot update channel between slot tasks and the processor
    pub update_channel_capacity: usize,
    /// Bound on concurrent adapter calls sharing one credential; unbounded when unset
    pub max_in_flight_per_credential: Option<usize>,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            adapter_timeout_secs: 30,
            estimated_completion_minutes: 5,
            history_default_limit: 50,
            history_max_limit: 200,
            event_channel_capacity: 1000,
            update_channel_capacity: 256,
            max_in_flight_per_credential: None,
        }
    }
}

impl PublishingConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(timeout) = env_value("ADAPTER_TIMEOUT_SECS")? {
            config.adapter_timeout_secs = timeout;
        }
        if let Some(minutes) = env_value("ESTIMATED_COMPLETION_MINUTES")? {
            config.estimated_completion_minutes = minutes;
        }
        if let Some(limit) = env_value("HISTORY_DEFAULT_LIMIT")? {
            config.history_default_limit = limit;
        }
        if let Some(limit) = env_value("HISTORY_MAX_LIMIT")? {
            config.history_max_limit = limit;
        }
        if let Some(capacity) = env_value("EVENT_CHANNEL_CAPACITY")? {
            config.event_channel_capacity = capacity;
        }
        if let Some(capacity) = env_value("UPDATE_CHANNEL_CAPACITY")? {
            config.update_channel_capacity = capacity;
        }
        if let Some(bound) = env_value("MAX_IN_FLIGHT_PER_CREDENTIAL")? {
            config.max_in_flight_per_credential = Some(bound);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a configuration file with the environment layered on top
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|e| {
                PublishingError::Configuration(format!(
                    "Failed to read {}: {e}",
                    path.display()
                ))
            })?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| PublishingError::Configuration(format!("Invalid configuration: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.adapter_timeout_secs == 0 {
            return Err(PublishingError::Configuration(
                "adapter_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.history_max_limit == 0 {
            return Err(PublishingError::Configuration(
                "history_max_limit must be greater than zero".to_string(),
            ));
        }
        if self.history_default_limit == 0 || self.history_default_limit > self.history_max_limit
        {
            return Err(PublishingError::Configuration(format!(
                "history_default_limit must be within 1..={}",
                self.history_max_limit
            )));
        }
        if self.event_channel_capacity == 0 || self.update_channel_capacity == 0 {
            return Err(PublishingError::Configuration(
                "channel capacities must be greater than zero".to_string(),
            ));
        }
        if self.max_in_flight_per_credential == Some(0) {
            return Err(PublishingError::Configuration(
                "max_in_flight_per_credential must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }

    pub fn estimated_completion_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.estimated_completion_minutes))
    }
}

fn env_value<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let name = format!("{ENV_PREFIX}_{key}");
    match std::env::var(&name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| PublishingError::Configuration(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(None),
    }
}
