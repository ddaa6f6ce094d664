//! trigger-sink: consumer endpoint for record trigger pulses
//!
//! Listens for `{0x23, flag}` frames and reports each fresh "artifact ready"
//! edge once, however many times the middleware repeats it.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use record_trigger::config::TriggerSinkConfig;
use record_trigger::sink::{PulseEdge, PulseWatcher};
use record_trigger::transport::{FrameReceiver, TriggerPulse, MIDDLEWARE_ID};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    record_trigger::init_logging();

    let config = TriggerSinkConfig::load()?;
    info!(listen = %config.listen, "trigger-sink starting");

    let mut receiver = FrameReceiver::bind(config.listen, MIDDLEWARE_ID)
        .await
        .context("failed to open trigger channel")?;
    let mut watcher = PulseWatcher::new();

    loop {
        let frame = match receiver.recv().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!(%e, retry_ms = config.retry_ms, "receive failed");
                tokio::time::sleep(config.retry_delay()).await;
                continue;
            }
        };

        let pulse = match TriggerPulse::from_flag(frame.payload) {
            Ok(pulse) => pulse,
            Err(e) => {
                debug!(%e, "ignoring frame");
                continue;
            }
        };

        match watcher.observe(pulse) {
            PulseEdge::Ready => info!(
                artifact = ?config.artifact,
                count = watcher.ready_count(),
                "recording ready"
            ),
            PulseEdge::Cleared => debug!("trigger cleared"),
            PulseEdge::Repeat => {}
        }
    }
}
