//! State machine module for the record trigger
//!
//! Provides an explicit state machine with five states:
//! - Idle: waiting for a debounced press
//! - Recording: capture session active until release or exhaustion
//! - NotifyHigh: repeats the ready pulse for a bounded number of ticks
//! - NotifyLow: repeats the reset pulse for a bounded number of ticks
//! - SafetyWait: rearms only after the release is reconfirmed

mod debounce;
mod machine;

pub use debounce::{EdgeDebouncer, DEFAULT_THRESHOLD};
pub use machine::{MachineConfig, PulseSink, RecordState, StateMachine};
