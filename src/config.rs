//! Configuration loading and management
//!
//! Every binary takes its settings from command-line flags with environment
//! variable fallbacks.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::capture::DEFAULT_MAX_SECONDS;
use crate::state::{MachineConfig, DEFAULT_THRESHOLD};
use crate::transport::{BUTTON_SOURCE_PORT, CONSUMER_PORT, MIDDLEWARE_PORT};

/// Default tick period of every process loop
pub const DEFAULT_TICK_MS: u64 = 100;
/// Default artifact location
pub const DEFAULT_ARTIFACT: &str = "/tmp/audio_in.wav";

/// Which capture backend the middleware drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CaptureBackend {
    /// Record silence by wall clock (no audio device needed)
    Silence,
    /// Record from the default input device (requires the `audio-io` feature)
    Device,
}

/// Middleware configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "record-trigger", version, about = "Button-driven record trigger middleware")]
pub struct Config {
    /// Address to receive button frames on
    #[arg(long, env = "RECORD_TRIGGER_LISTEN", default_value_t = SocketAddr::from(([0, 0, 0, 0], MIDDLEWARE_PORT)))]
    pub listen: SocketAddr,

    /// Consumer address trigger pulses are sent to
    #[arg(long, env = "RECORD_TRIGGER_CONSUMER", default_value_t = SocketAddr::from(([127, 0, 0, 1], CONSUMER_PORT)))]
    pub consumer: SocketAddr,

    /// Tick period in milliseconds
    #[arg(long, env = "RECORD_TRIGGER_TICK_MS", default_value_t = DEFAULT_TICK_MS)]
    pub tick_ms: u64,

    /// Debounce threshold in ticks
    #[arg(long, env = "RECORD_TRIGGER_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: u16,

    /// Extra ticks the ready pulse is repeated
    #[arg(long, env = "RECORD_TRIGGER_READY_HOLD", default_value_t = 3)]
    pub ready_hold: u32,

    /// Extra ticks the reset pulse is repeated
    #[arg(long, env = "RECORD_TRIGGER_RESET_HOLD", default_value_t = 3)]
    pub reset_hold: u32,

    /// Where the recording is saved
    #[arg(long, env = "RECORD_TRIGGER_ARTIFACT", default_value = DEFAULT_ARTIFACT)]
    pub artifact: PathBuf,

    /// Longest recording before the source reports exhaustion
    #[arg(long, env = "RECORD_TRIGGER_MAX_SECONDS", default_value_t = DEFAULT_MAX_SECONDS)]
    pub max_seconds: u32,

    /// Quiet ticks before the button link is reported stale (0 disables)
    #[arg(long, env = "RECORD_TRIGGER_STALE_TICKS", default_value_t = 10)]
    pub stale_ticks: u32,

    /// Capture backend
    #[arg(long, env = "RECORD_TRIGGER_CAPTURE", value_enum, default_value_t = CaptureBackend::Silence)]
    pub capture: CaptureBackend,
}

impl Config {
    /// Load configuration from arguments and environment
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the tick loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }
        if self.max_seconds == 0 {
            return Err(ConfigError::ZeroMaxSeconds);
        }
        // The debounce counters saturate at u16::MAX and must exceed the threshold
        if self.threshold == u16::MAX {
            return Err(ConfigError::ThresholdTooLarge(self.threshold));
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// State machine settings
    pub fn machine(&self) -> MachineConfig {
        MachineConfig {
            threshold: self.threshold,
            ready_hold: self.ready_hold,
            reset_hold: self.reset_hold,
            artifact_path: self.artifact.clone(),
        }
    }

    /// Ensure the artifact directory exists
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.artifact.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_owned(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Button source configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "button-source", version, about = "Key-test button source")]
pub struct ButtonSourceConfig {
    /// Local address to send from
    #[arg(long, env = "BUTTON_SOURCE_BIND", default_value_t = SocketAddr::from(([0, 0, 0, 0], BUTTON_SOURCE_PORT)))]
    pub bind: SocketAddr,

    /// Middleware address (positional, like the host argument of the device tools)
    #[arg(env = "BUTTON_SOURCE_MIDDLEWARE", default_value_t = SocketAddr::from(([127, 0, 0, 1], MIDDLEWARE_PORT)))]
    pub middleware: SocketAddr,

    /// Tick period in milliseconds
    #[arg(long, env = "BUTTON_SOURCE_TICK_MS", default_value_t = DEFAULT_TICK_MS)]
    pub tick_ms: u64,
}

impl ButtonSourceConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::parse();
        if config.tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }
        Ok(config)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Consumer endpoint configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "trigger-sink", version, about = "Trigger pulse consumer")]
pub struct TriggerSinkConfig {
    /// Address to receive trigger pulses on
    #[arg(long, env = "TRIGGER_SINK_LISTEN", default_value_t = SocketAddr::from(([0, 0, 0, 0], CONSUMER_PORT)))]
    pub listen: SocketAddr,

    /// Artifact the middleware writes, reported on each ready edge
    #[arg(long, env = "RECORD_TRIGGER_ARTIFACT", default_value = DEFAULT_ARTIFACT)]
    pub artifact: PathBuf,

    /// Pause after a failed receive before listening again, in milliseconds
    #[arg(long, env = "TRIGGER_SINK_RETRY_MS", default_value_t = DEFAULT_TICK_MS)]
    pub retry_ms: u64,
}

impl TriggerSinkConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::parse();
        if config.retry_ms == 0 {
            return Err(ConfigError::ZeroRetry);
        }
        Ok(config)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_ms)
    }
}

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("tick period must be greater than zero")]
    ZeroTick,

    #[error("maximum recording length must be greater than zero")]
    ZeroMaxSeconds,

    #[error("debounce threshold {0} can never be exceeded")]
    ThresholdTooLarge(u16),

    #[error("receive retry delay must be greater than zero")]
    ZeroRetry,

    #[error("failed to create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
