//! Consumer-side trigger pulse tracking
//!
//! The middleware repeats each level for several ticks and some datagrams may
//! be lost, so the consumer acts on level changes rather than on individual
//! frames.

use tracing::debug;

use crate::transport::TriggerPulse;

/// What a received pulse means to the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseEdge {
    /// A new artifact is ready
    Ready,
    /// The level dropped back to reset
    Cleared,
    /// Repeat of the current level
    Repeat,
}

/// Tracks the last seen pulse level
#[derive(Debug, Default)]
pub struct PulseWatcher {
    last: Option<TriggerPulse>,
    ready_count: u64,
}

impl PulseWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fresh ready edges seen so far
    pub fn ready_count(&self) -> u64 {
        self.ready_count
    }

    /// Feed one received pulse
    ///
    /// A ready level counts as fresh the first time it is seen after a reset
    /// (or ever).
    pub fn observe(&mut self, pulse: TriggerPulse) -> PulseEdge {
        let previous = self.last.replace(pulse);
        let edge = match (previous, pulse) {
            (Some(TriggerPulse::Ready), TriggerPulse::Ready) => PulseEdge::Repeat,
            (_, TriggerPulse::Ready) => {
                self.ready_count += 1;
                PulseEdge::Ready
            }
            (Some(TriggerPulse::Ready), TriggerPulse::Reset) => PulseEdge::Cleared,
            (_, TriggerPulse::Reset) => PulseEdge::Repeat,
        };
        debug!(%pulse, ?edge, "pulse observed");
        edge
    }
}
