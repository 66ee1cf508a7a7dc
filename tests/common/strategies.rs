#![allow(dead_code)]

use proptest::prelude::*;
use syndicate_core::state_machine::{SlotEvent, SlotState};

/// Strategy for generating any slot state
pub fn slot_state_strategy() -> impl Strategy<Value = SlotState> {
    prop_oneof![
        Just(SlotState::Scheduled),
        Just(SlotState::Pending),
        Just(SlotState::Publishing),
        Just(SlotState::Success),
        Just(SlotState::Failed),
        Just(SlotState::Cancelled),
    ]
}

/// Strategy for generating slot maps of realistic size
pub fn slot_states_strategy() -> impl Strategy<Value = Vec<SlotState>> {
    prop::collection::vec(slot_state_strategy(), 0..=7)
}

/// Strategy for generating slot events other than success
pub fn slot_event_strategy() -> impl Strategy<Value = SlotEvent> {
    prop_oneof![
        Just(SlotEvent::Activate),
        Just(SlotEvent::Start),
        Just(SlotEvent::Cancel),
        "[a-z_]{1,20}".prop_map(SlotEvent::Fail),
    ]
}

/// Strategy for generating batch sizes and optional stagger intervals
pub fn stagger_strategy() -> impl Strategy<Value = (usize, Option<u32>)> {
    (0usize..50, prop::option::of(0u32..=240))
}
