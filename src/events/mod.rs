//! Events module for record trigger transitions
//!
//! Structured events for the recording lifecycle, broadcast by the state
//! machine so observers (logging, tests) see what happened without polling.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Why a recording session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Record button release was confirmed
    Released,
    /// The capture source ran out of room
    Exhausted,
}

/// Events emitted by the record trigger state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordEvent {
    /// Press confirmed, capture session started
    RecordingStarted,

    /// Capture session stopped and persisted
    RecordingStopped {
        reason: StopReason,
        /// Duration in milliseconds the session was active
        duration_ms: u64,
        /// Frames written to the artifact
        frames: u64,
        path: PathBuf,
    },

    /// Persisting the artifact failed; the ready pulse is sent anyway
    PersistFailed {
        reason: StopReason,
        message: String,
    },

    /// Ready and reset pulses have been sent
    NotifyComplete {
        /// Ready pulses attempted
        ready_pulses: u32,
        /// Reset pulses attempted
        reset_pulses: u32,
    },

    /// Release reconfirmed, back to Idle
    Rearmed,
}

impl std::fmt::Display for RecordEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordEvent::RecordingStarted => write!(f, "RECORDING_STARTED"),
            RecordEvent::RecordingStopped {
                duration_ms,
                frames,
                ..
            } => write!(f, "RECORDING_STOPPED ({}ms, {} frames)", duration_ms, frames),
            RecordEvent::PersistFailed { message, .. } => {
                write!(f, "PERSIST_FAILED ({})", message)
            }
            RecordEvent::NotifyComplete {
                ready_pulses,
                reset_pulses,
            } => write!(f, "NOTIFY_COMPLETE ({} ready, {} reset)", ready_pulses, reset_pulses),
            RecordEvent::Rearmed => write!(f, "REARMED"),
        }
    }
}
