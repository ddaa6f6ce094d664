//! Button module for the wearable's input byte
//!
//! Defines the Channel A state byte, the key-test sampler that produces it,
//! and the middleware-side link that holds the last accepted value.

mod link;
mod sampler;
mod state;

pub use link::{ButtonLink, LinkStatus};
pub use sampler::{apply_key, ButtonSampler, KeyReader, SamplerError};
pub use state::{flags, ButtonState};
