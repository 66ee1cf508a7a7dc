//! # Stagger Scheduler
//!
//! Computes effective publish times for the items of a batch. Item `i` fires at
//! `base + i * stagger`; item 0 always fires at `base`, and without a stagger
//! interval every item shares `base`.
//!
//! Both functions return `None` when any item falls outside the representable
//! time range.

use chrono::{DateTime, Duration, Utc};

/// Offset of each of `count` items from the batch base time
pub fn stagger_offsets(count: usize, stagger_minutes: Option<u32>) -> Option<Vec<Duration>> {
    let step = Duration::try_minutes(i64::from(stagger_minutes.unwrap_or(0)))?;
    (0..count)
        .map(|index| step.checked_mul(i32::try_from(index).ok()?))
        .collect()
}

/// Effective time of each of `count` items
pub fn effective_times(
    base: DateTime<Utc>,
    count: usize,
    stagger_minutes: Option<u32>,
) -> Option<Vec<DateTime<Utc>>> {
    stagger_offsets(count, stagger_minutes)?
        .into_iter()
        .map(|offset| base.checked_add_signed(offset))
        .collect()
}
