//! record-trigger: middleware between the wearable's buttons and the consumer
//!
//! Runs a fixed-period tick loop that:
//! - Drains button frames from the button source (Channel A)
//! - Debounces the record bit and drives the capture session
//! - Pulses the consumer (Channel B) once the recording is saved
//!
//! Runs until killed; a restart always begins in Idle.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use record_trigger::button::ButtonLink;
use record_trigger::capture::{CaptureFormat, CaptureSession, SilenceCapture};
use record_trigger::config::{CaptureBackend, Config};
use record_trigger::events::RecordEvent;
use record_trigger::middleware::Middleware;
use record_trigger::state::StateMachine;
use record_trigger::transport::{FrameReceiver, FrameSender, BUTTON_SOURCE_ID, MIDDLEWARE_ID};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    record_trigger::init_logging();

    info!(version = env!("CARGO_PKG_VERSION"), "record-trigger starting");

    // Load configuration
    let config = Config::load()?;
    info!(
        listen = %config.listen,
        consumer = %config.consumer,
        artifact = ?config.artifact,
        tick_ms = config.tick_ms,
        "configuration loaded"
    );
    config.ensure_dirs()?;

    // State machine -> event logger
    let (event_tx, event_rx) = broadcast::channel::<RecordEvent>(64);

    let receiver = FrameReceiver::bind(config.listen, BUTTON_SOURCE_ID)
        .await
        .context("failed to open button channel")?;
    let sender = FrameSender::bind(unspecified_for(config.consumer), config.consumer, MIDDLEWARE_ID)
        .await
        .context("failed to open trigger channel")?;
    let capture = open_capture(&config)?;

    let machine = StateMachine::new(config.machine(), event_tx);
    let mut middleware = Middleware::new(
        receiver,
        ButtonLink::new(config.stale_ticks),
        machine,
        capture,
        sender,
    );

    info!("middleware initialized, entering tick loop");

    tokio::select! {
        _ = middleware.run(config.tick_period()) => {
            info!("tick loop exited");
        }
        _ = log_events(event_rx) => {
            info!("event logger exited");
        }
    }

    Ok(())
}

/// Open the configured capture backend; a missing device is fatal
fn open_capture(config: &Config) -> Result<Box<dyn CaptureSession>> {
    match config.capture {
        CaptureBackend::Silence => {
            info!(max_seconds = config.max_seconds, "using silence capture");
            Ok(Box::new(SilenceCapture::new(
                CaptureFormat::default(),
                config.max_seconds,
            )))
        }
        #[cfg(feature = "audio-io")]
        CaptureBackend::Device => {
            let capture = record_trigger::capture::DeviceCapture::open(config.max_seconds)
                .context("failed to open audio input device")?;
            Ok(Box::new(capture))
        }
        #[cfg(not(feature = "audio-io"))]
        CaptureBackend::Device => {
            anyhow::bail!("device capture needs a build with the audio-io feature")
        }
    }
}

/// Wildcard local address of the same family as `dest`
fn unspecified_for(dest: SocketAddr) -> SocketAddr {
    match dest {
        SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
        SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
    }
}

async fn log_events(mut event_rx: broadcast::Receiver<RecordEvent>) {
    loop {
        match event_rx.recv().await {
            Ok(event) => {
                info!(%event, "record event");
                match serde_json::to_string(&event) {
                    Ok(json) => debug!(%json, "record event detail"),
                    Err(e) => warn!(?e, "failed to encode record event"),
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "record event receiver lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
