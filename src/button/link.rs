//! Inbound button link tracking
//!
//! Holds the last-known [`ButtonState`] received over Channel A and notices
//! when the button source has gone quiet.

use tracing::{debug, info, warn};

use super::state::ButtonState;

/// Freshness of the inbound button link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// A frame was accepted within the stale window
    Fresh,
    /// No frame accepted for at least `stale_after` ticks
    Stale,
}

/// Latest button state plus link freshness bookkeeping
#[derive(Debug)]
pub struct ButtonLink {
    state: ButtonState,
    ticks_since_update: u32,
    stale_after: u32,
    status: LinkStatus,
}

impl ButtonLink {
    /// Create a link that turns stale after `stale_after` quiet ticks
    ///
    /// A value of zero disables staleness reporting.
    pub fn new(stale_after: u32) -> Self {
        Self {
            state: ButtonState::default(),
            ticks_since_update: 0,
            stale_after,
            status: LinkStatus::Fresh,
        }
    }

    /// Current (possibly stale) button state
    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }

    /// Account for one tick, with the payload accepted this tick if any
    ///
    /// Returns the new status when it changed during this tick.
    pub fn on_tick(&mut self, accepted: Option<u8>) -> Option<LinkStatus> {
        match accepted {
            Some(bits) => {
                let new_state = ButtonState::from_byte(bits);
                if new_state != self.state {
                    debug!(old = %self.state, new = %new_state, "button state changed");
                }
                self.state = new_state;
                self.ticks_since_update = 0;
            }
            None => {
                self.ticks_since_update = self.ticks_since_update.saturating_add(1);
            }
        }

        let next = if self.stale_after > 0 && self.ticks_since_update >= self.stale_after {
            LinkStatus::Stale
        } else {
            LinkStatus::Fresh
        };

        if next == self.status {
            return None;
        }

        match next {
            LinkStatus::Stale => warn!(
                quiet_ticks = self.ticks_since_update,
                held = %self.state,
                "button link stale, keeping last known state"
            ),
            LinkStatus::Fresh => info!("button link restored"),
        }
        self.status = next;
        Some(next)
    }
}
