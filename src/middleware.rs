//! Middleware tick driver
//!
//! Each tick drains Channel A into the button link, then advances the record
//! trigger once with the latest record bit.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::button::{ButtonLink, ButtonState};
use crate::capture::CaptureSession;
use crate::state::{PulseSink, RecordState, StateMachine};
use crate::transport::{FrameReceiver, TransportError};

/// Where the middleware reads button bytes from each tick
pub trait ButtonFeed {
    /// Latest accepted button byte queued since the last call, if any
    fn drain_latest(&mut self) -> Result<Option<u8>, TransportError>;
}

impl ButtonFeed for FrameReceiver {
    fn drain_latest(&mut self) -> Result<Option<u8>, TransportError> {
        FrameReceiver::drain_latest(self)
    }
}

/// Everything the middleware owns, advanced one tick at a time
pub struct Middleware<R, C, P> {
    receiver: R,
    link: ButtonLink,
    machine: StateMachine,
    capture: C,
    pulses: P,
}

impl<R, C, P> Middleware<R, C, P>
where
    R: ButtonFeed,
    C: CaptureSession,
    P: PulseSink,
{
    pub fn new(
        receiver: R,
        link: ButtonLink,
        machine: StateMachine,
        capture: C,
        pulses: P,
    ) -> Self {
        Self {
            receiver,
            link,
            machine,
            capture,
            pulses,
        }
    }

    pub fn state(&self) -> RecordState {
        self.machine.state()
    }

    pub fn button_state(&self) -> ButtonState {
        self.link.state()
    }

    /// Run one tick
    ///
    /// A failed receive keeps the stale button state; the machine still ticks.
    pub fn tick(&mut self) -> RecordState {
        let accepted = match self.receiver.drain_latest() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%e, "receive failed, keeping last button state");
                None
            }
        };
        self.link.on_tick(accepted);

        let record_held = self.link.state().record();
        self.machine
            .tick(record_held, &mut self.capture, &mut self.pulses)
    }

    /// Tick forever at `period`
    ///
    /// A tick that overruns (for example a slow persist) delays the next one
    /// rather than causing a burst.
    pub async fn run(&mut self, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period_ms = period.as_millis() as u64, "tick loop started in Idle state");

        loop {
            ticker.tick().await;
            self.tick();
        }
    }
}
