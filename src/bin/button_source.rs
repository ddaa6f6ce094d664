//! button-source: key-test stand-in for the wearable's button sampler
//!
//! Reads test keys from stdin, folds them into the button state byte and
//! sends `{0x12, state}` to the middleware every tick. Keys:
//! `1` volume up, `2` volume down, `3` record on, `4` record off,
//! `5` heartbeat high. Type a key and press Enter.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, trace, warn};

use record_trigger::button::{ButtonSampler, KeyReader};
use record_trigger::config::ButtonSourceConfig;
use record_trigger::transport::{FrameSender, BUTTON_SOURCE_ID};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    record_trigger::init_logging();

    let config = ButtonSourceConfig::load()?;
    info!(bind = %config.bind, middleware = %config.middleware, "button-source starting");

    let sender = FrameSender::bind(config.bind, config.middleware, BUTTON_SOURCE_ID)
        .await
        .context("failed to open button channel")?;

    // Key reader thread -> tick loop
    let (key_tx, mut key_rx) = mpsc::channel(32);
    let reader = KeyReader::new(key_tx);
    reader.start().context("failed to start key reader")?;

    info!("keys: 1 vol+, 2 vol-, 3 record on, 4 record off, 5 heartbeat");

    let mut sampler = ButtonSampler::new();
    let mut ticker = interval(config.tick_period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let mut keys = Vec::new();
        while let Ok(key) = key_rx.try_recv() {
            keys.push(key);
        }

        let state = sampler.sample(keys);
        match sender.send(state.bits()) {
            Ok(()) => trace!(%state, "button state sent"),
            Err(e) => warn!(%e, "failed to send button state"),
        }
    }
}
