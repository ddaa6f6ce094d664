//! Core record trigger state machine
//!
//! Debounces the record bit, drives the capture session through
//! start/stop/reset and emits the bounded trigger pulse sequence. Advances at
//! most one transition per tick.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::capture::{CaptureSession, PollStatus};
use crate::events::{RecordEvent, StopReason};
use crate::transport::{FrameSender, TransportError, TriggerPulse};

use super::debounce::EdgeDebouncer;

/// Where trigger pulses go
pub trait PulseSink {
    fn send_pulse(&mut self, pulse: TriggerPulse) -> Result<(), TransportError>;
}

impl PulseSink for FrameSender {
    fn send_pulse(&mut self, pulse: TriggerPulse) -> Result<(), TransportError> {
        self.send(pulse.flag())
    }
}

/// The five states of the record trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RecordState {
    /// Waiting for a confirmed press
    #[default]
    Idle = 0,
    /// Capture session active
    Recording = 1,
    /// Repeating the ready pulse
    NotifyHigh = 2,
    /// Repeating the reset pulse
    NotifyLow = 3,
    /// Waiting for the release to be reconfirmed before rearming
    SafetyWait = 4,
}

impl RecordState {
    /// Numeric value used in logs
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for RecordState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordState::Idle => write!(f, "Idle"),
            RecordState::Recording => write!(f, "Recording"),
            RecordState::NotifyHigh => write!(f, "NotifyHigh"),
            RecordState::NotifyLow => write!(f, "NotifyLow"),
            RecordState::SafetyWait => write!(f, "SafetyWait"),
        }
    }
}

/// Tunables of the state machine
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// Debounce threshold in ticks
    pub threshold: u16,
    /// Extra ticks the ready pulse is repeated (0 = sent once)
    pub ready_hold: u32,
    /// Extra ticks the reset pulse is repeated (0 = sent once)
    pub reset_hold: u32,
    /// Where the recorded artifact is written
    pub artifact_path: PathBuf,
}

/// The record trigger state machine
pub struct StateMachine {
    state: RecordState,
    debounce: EdgeDebouncer,
    /// Ticks spent in the current notify state
    hold_ticks: u32,
    ready_hold: u32,
    reset_hold: u32,
    artifact_path: PathBuf,
    recording_started_at: Option<Instant>,
    ready_pulses: u32,
    reset_pulses: u32,
    event_tx: broadcast::Sender<RecordEvent>,
}

impl StateMachine {
    /// Create a new state machine in Idle
    pub fn new(config: MachineConfig, event_tx: broadcast::Sender<RecordEvent>) -> Self {
        Self {
            state: RecordState::Idle,
            debounce: EdgeDebouncer::new(config.threshold),
            hold_ticks: 0,
            ready_hold: config.ready_hold,
            reset_hold: config.reset_hold,
            artifact_path: config.artifact_path,
            recording_started_at: None,
            ready_pulses: 0,
            reset_pulses: 0,
            event_tx,
        }
    }

    /// Get the current state
    pub fn state(&self) -> RecordState {
        self.state
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Advance the machine by one tick
    ///
    /// `record_held` is this tick's (possibly stale) record bit. Collaborator
    /// failures are logged and never stop the machine from advancing.
    pub fn tick<C, P>(&mut self, record_held: bool, capture: &mut C, pulses: &mut P) -> RecordState
    where
        C: CaptureSession + ?Sized,
        P: PulseSink + ?Sized,
    {
        let next = match self.state {
            RecordState::Idle => self.tick_idle(record_held, capture),
            RecordState::Recording => self.tick_recording(record_held, capture),
            RecordState::NotifyHigh => self.tick_notify_high(capture, pulses),
            RecordState::NotifyLow => self.tick_notify_low(pulses),
            RecordState::SafetyWait => self.tick_safety_wait(record_held),
        };

        if next != self.state {
            self.transition_to(next);
        }
        self.state
    }

    fn tick_idle<C>(&mut self, record_held: bool, capture: &mut C) -> RecordState
    where
        C: CaptureSession + ?Sized,
    {
        if !self.debounce.press(record_held) {
            return RecordState::Idle;
        }

        info!("record button pressed");
        if let Err(e) = capture.start() {
            warn!(%e, "failed to start capture, continuing");
        }
        self.recording_started_at = Some(Instant::now());
        self.emit(RecordEvent::RecordingStarted);
        RecordState::Recording
    }

    fn tick_recording<C>(&mut self, record_held: bool, capture: &mut C) -> RecordState
    where
        C: CaptureSession + ?Sized,
    {
        let reason = if self.debounce.release(record_held) {
            StopReason::Released
        } else if capture.poll() == PollStatus::Exhausted {
            StopReason::Exhausted
        } else {
            return RecordState::Recording;
        };

        info!(?reason, "stopping recording");
        let duration_ms = self
            .recording_started_at
            .take()
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);

        match capture.stop_and_persist(&self.artifact_path) {
            Ok(frames) => self.emit(RecordEvent::RecordingStopped {
                reason,
                duration_ms,
                frames,
                path: self.artifact_path.clone(),
            }),
            Err(e) => {
                warn!(%e, "failed to persist recording, notifying anyway");
                self.emit(RecordEvent::PersistFailed {
                    reason,
                    message: e.to_string(),
                });
            }
        }
        RecordState::NotifyHigh
    }

    fn tick_notify_high<C, P>(&mut self, capture: &mut C, pulses: &mut P) -> RecordState
    where
        C: CaptureSession + ?Sized,
        P: PulseSink + ?Sized,
    {
        if self.hold_ticks == 0 {
            capture.reset();
        }
        self.send_pulse(pulses, TriggerPulse::Ready);
        self.ready_pulses += 1;

        if self.hold_elapsed(self.ready_hold) {
            RecordState::NotifyLow
        } else {
            RecordState::NotifyHigh
        }
    }

    fn tick_notify_low<P>(&mut self, pulses: &mut P) -> RecordState
    where
        P: PulseSink + ?Sized,
    {
        self.send_pulse(pulses, TriggerPulse::Reset);
        self.reset_pulses += 1;

        if !self.hold_elapsed(self.reset_hold) {
            return RecordState::NotifyLow;
        }

        self.emit(RecordEvent::NotifyComplete {
            ready_pulses: self.ready_pulses,
            reset_pulses: self.reset_pulses,
        });
        RecordState::SafetyWait
    }

    fn tick_safety_wait(&mut self, record_held: bool) -> RecordState {
        if !self.debounce.release(record_held) {
            return RecordState::SafetyWait;
        }

        self.emit(RecordEvent::Rearmed);
        RecordState::Idle
    }

    /// Count one tick in a notify state; true once the hold is used up
    fn hold_elapsed(&mut self, hold: u32) -> bool {
        self.hold_ticks += 1;
        self.hold_ticks > hold
    }

    fn send_pulse<P>(&self, pulses: &mut P, pulse: TriggerPulse)
    where
        P: PulseSink + ?Sized,
    {
        match pulses.send_pulse(pulse) {
            Ok(()) => debug!(%pulse, "trigger pulse sent"),
            Err(e) => warn!(%pulse, %e, "failed to send trigger pulse, skipping this tick"),
        }
    }

    /// Perform a state transition
    fn transition_to(&mut self, new_state: RecordState) {
        info!(
            from = %self.state,
            to = %new_state,
            value = new_state.value(),
            "state transition"
        );

        self.state = new_state;
        self.hold_ticks = 0;

        match new_state {
            RecordState::NotifyHigh => {
                self.ready_pulses = 0;
                self.reset_pulses = 0;
            }
            // The release must be seen again after the notify sequence
            RecordState::SafetyWait => self.debounce.rearm_release(),
            _ => {}
        }
    }

    fn emit(&self, event: RecordEvent) {
        debug!(?event, "emitting record event");
        let _ = self.event_tx.send(event);
    }
}
