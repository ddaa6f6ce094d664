//! Device-less capture backend
//!
//! Produces silent frames at the configured rate for as long as the session
//! runs, so the trigger pipeline can run end to end on hosts without an
//! input device.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::debug;

use super::buffer::{CaptureFormat, SampleBuffer};
use super::{CaptureError, CaptureSession, PollStatus};

/// Session backend that records silence by wall-clock time
#[derive(Debug)]
pub struct SilenceCapture {
    buffer: SampleBuffer,
    started_at: Option<Instant>,
    /// Frames already in the buffer when the session started
    base_frames: u64,
}

impl SilenceCapture {
    pub fn new(format: CaptureFormat, max_seconds: u32) -> Self {
        Self {
            buffer: SampleBuffer::new(format, format.frames_for(max_seconds)),
            started_at: None,
            base_frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.buffer.frames()
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    fn catch_up(&mut self) {
        if let Some(started_at) = self.started_at {
            self.credit(started_at.elapsed());
        }
    }

    /// Bring the buffer up to `elapsed` worth of frames since start
    fn credit(&mut self, elapsed: Duration) {
        let rate = f64::from(self.buffer.format().sample_rate);
        let due = self.base_frames + (elapsed.as_secs_f64() * rate) as u64;
        let missing = due.saturating_sub(self.buffer.frames());
        if missing > 0 {
            self.buffer.push_silence(missing);
        }
    }
}

impl CaptureSession for SilenceCapture {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.started_at.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }
        self.base_frames = self.buffer.frames();
        self.started_at = Some(Instant::now());
        debug!("silence capture started");
        Ok(())
    }

    fn poll(&mut self) -> PollStatus {
        self.catch_up();
        if self.buffer.is_full() {
            PollStatus::Exhausted
        } else {
            PollStatus::Ok
        }
    }

    fn stop_and_persist(&mut self, path: &Path) -> Result<u64, CaptureError> {
        if self.started_at.is_none() {
            return Err(CaptureError::NotRunning);
        }
        self.catch_up();
        self.started_at = None;

        self.buffer.write_wav(path)?;
        Ok(self.buffer.frames())
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.base_frames = 0;
    }
}
