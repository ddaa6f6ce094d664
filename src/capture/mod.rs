//! Capture module for the recording session
//!
//! The trigger machine only sees the [`CaptureSession`] trait. Two backends
//! implement it:
//! - `SilenceCapture`: device-less, accumulates silent frames by wall clock
//! - `DeviceCapture`: default input device via cpal (`audio-io` feature)

mod buffer;
#[cfg(feature = "audio-io")]
mod device;
mod silence;

use std::path::{Path, PathBuf};

pub use buffer::{
    CaptureFormat, SampleBuffer, BITS_PER_SAMPLE, CHANNELS, DEFAULT_MAX_SECONDS, SAMPLE_RATE,
};
#[cfg(feature = "audio-io")]
pub use device::DeviceCapture;
pub use silence::SilenceCapture;

/// Result of polling an active session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// Still room for more audio
    Ok,
    /// The frame budget is used up
    Exhausted,
}

/// A capture session driven by the record trigger
pub trait CaptureSession {
    /// Begin capturing into the session buffer
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Report whether the source can keep capturing
    fn poll(&mut self) -> PollStatus;

    /// Stop capturing and write the buffered audio to `path`
    ///
    /// Returns the number of frames persisted.
    fn stop_and_persist(&mut self, path: &Path) -> Result<u64, CaptureError>;

    /// Clear buffered samples for the next session; idempotent
    fn reset(&mut self);
}

impl<C: CaptureSession + ?Sized> CaptureSession for Box<C> {
    fn start(&mut self) -> Result<(), CaptureError> {
        (**self).start()
    }

    fn poll(&mut self) -> PollStatus {
        (**self).poll()
    }

    fn stop_and_persist(&mut self, path: &Path) -> Result<u64, CaptureError> {
        (**self).stop_and_persist(path)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Errors that can occur in a capture session
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("capture session is already running")]
    AlreadyRunning,

    #[error("capture session is not running")]
    NotRunning,

    #[error("audio device error: {0}")]
    Device(String),

    #[error("failed to save audio to {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
}
