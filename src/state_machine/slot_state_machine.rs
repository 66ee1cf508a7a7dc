//! # Slot State Machine
//!
//! Transition table for a single platform slot. Every store write goes through
//! [`determine_target_state`], so an illegal write (for example a late adapter
//! result landing on a cancelled slot) is rejected instead of applied.

use chrono::{DateTime, Utc};

use super::errors::{StateMachineError, StateMachineResult};
use super::events::SlotEvent;
use super::states::SlotState;
use crate::models::{Slot, SlotTransition};

/// Determine the target state for `event` applied to `current_state`
pub fn determine_target_state(
    current_state: SlotState,
    event: &SlotEvent,
) -> StateMachineResult<SlotState> {
    let target = match (current_state, event) {
        (SlotState::Scheduled, SlotEvent::Activate) => SlotState::Pending,

        (SlotState::Pending, SlotEvent::Start) => SlotState::Publishing,

        (SlotState::Publishing, SlotEvent::Succeed(_)) => SlotState::Success,

        // Credential resolution fails before the slot ever reaches publishing
        (SlotState::Pending, SlotEvent::Fail(_)) => SlotState::Failed,
        (SlotState::Publishing, SlotEvent::Fail(_)) => SlotState::Failed,

        (SlotState::Scheduled, SlotEvent::Cancel) => SlotState::Cancelled,
        (SlotState::Pending, SlotEvent::Cancel) => SlotState::Cancelled,

        (from_state, _) => {
            return Err(StateMachineError::InvalidTransition {
                from: from_state.to_string(),
                event: event.event_type().to_string(),
            })
        }
    };

    Ok(target)
}

/// Apply `event` to `slot` at time `at`, recording results and history.
///
/// The slot is left untouched when the transition is illegal.
pub fn apply_event(slot: &mut Slot, event: &SlotEvent, at: DateTime<Utc>) -> StateMachineResult<SlotState> {
    let from = slot.status;
    let to = determine_target_state(from, event)?;

    match event {
        SlotEvent::Start => slot.started_at = Some(at),
        SlotEvent::Succeed(receipt) => {
            slot.platform_post_id = Some(receipt.post_id.clone());
            slot.published_url = receipt.url.clone();
        }
        SlotEvent::Fail(reason) => slot.error_message = Some(reason.clone()),
        SlotEvent::Activate | SlotEvent::Cancel => {}
    }

    if to.is_terminal() {
        slot.completed_at = Some(at);
    }
    slot.status = to;
    slot.updated_at = at;
    slot.history.push(SlotTransition { from, to, at });

    Ok(to)
}
