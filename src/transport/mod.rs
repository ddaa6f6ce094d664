//! Transport module for the two point-to-point datagram channels
//!
//! Channel A carries the button byte to the middleware, Channel B carries
//! trigger pulses to the consumer. Both use the same two-byte framing.

mod channel;
mod frame;

pub use channel::{FrameReceiver, FrameSender, TransportError, MAX_DRAIN_PER_TICK};
pub use frame::{
    Frame, FrameError, TriggerPulse, BUTTON_SOURCE_ID, BUTTON_SOURCE_PORT, CONSUMER_PORT,
    FRAME_LEN, MIDDLEWARE_ID, MIDDLEWARE_PORT,
};
