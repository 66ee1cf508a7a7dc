use serde::{Deserialize, Serialize};

use super::publish_job::PublishJob;

pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Skip/limit paging for job history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub skip: usize,
    pub limit: usize,
}

impl Pagination {
    pub fn new(skip: usize, limit: usize) -> Self {
        Self { skip, limit }
    }

    /// Clamp the limit into `1..=max_limit`
    pub fn clamped(self, max_limit: usize) -> Self {
        Self {
            skip: self.skip,
            limit: self.limit.clamp(1, max_limit.max(1)),
        }
    }

    /// Apply to an already ordered slice
    pub fn apply<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items.iter().skip(self.skip).take(self.limit).cloned().collect()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// One page of an owner's job history, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
    pub jobs: Vec<PublishJob>,
}
