// State machine module for per-platform publish slots
//
// Slot states, the events that move them, and the pure transition table that
// every store write is validated against.

pub mod errors;
pub mod events;
pub mod slot_state_machine;
pub mod states;

// Re-export main types for convenient access
pub use errors::{StateMachineError, StateMachineResult};
pub use events::SlotEvent;
pub use slot_state_machine::{apply_event, determine_target_state};
pub use states::{JobStatus, SlotState};
