use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Batch publish request; expands into one job per content id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchPublishRequest {
    pub content_ids: Vec<i64>,
    pub platforms: Vec<String>,
    pub scheduled_time: Option<DateTime<Utc>>,
    /// Minutes between successive items
    pub stagger_minutes: Option<u32>,
}
