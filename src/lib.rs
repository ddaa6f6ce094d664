//! record-trigger: button-driven audio record trigger for a wearable
//!
//! Three processes share this crate:
//! - `button-source` samples buttons into a state byte and sends it
//! - `record-trigger` debounces the record bit, drives the capture session
//!   and pulses the consumer
//! - `trigger-sink` receives the pulses and reports fresh artifacts
//!
//! All links are two-byte UDP datagrams with no acknowledgement; the trigger
//! relies on bounded repetition instead.

pub mod button;
pub mod capture;
pub mod config;
pub mod events;
pub mod middleware;
pub mod sink;
pub mod state;
pub mod transport;

/// Install the `tracing` subscriber shared by every binary
///
/// Filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
