//! Bounded sample buffer and WAV persistence

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::info;

use super::CaptureError;

/// Default capture sample rate in Hz
pub const SAMPLE_RATE: u32 = 44_100;
/// Default capture channel count
pub const CHANNELS: u16 = 2;
/// Bit depth of persisted samples
pub const BITS_PER_SAMPLE: u16 = 16;
/// Default longest session before the source reports exhaustion
pub const DEFAULT_MAX_SECONDS: u32 = 10;

/// Layout of the captured samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for CaptureFormat {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
        }
    }
}

impl CaptureFormat {
    /// Frame budget for a session of `seconds`
    pub fn frames_for(&self, seconds: u32) -> u64 {
        u64::from(self.sample_rate) * u64::from(seconds)
    }
}

/// Interleaved 16-bit samples for one session, capped at `max_frames`
#[derive(Debug)]
pub struct SampleBuffer {
    format: CaptureFormat,
    max_frames: u64,
    samples: Vec<i16>,
}

impl SampleBuffer {
    pub fn new(format: CaptureFormat, max_frames: u64) -> Self {
        Self {
            format,
            max_frames,
            samples: Vec::new(),
        }
    }

    pub fn format(&self) -> CaptureFormat {
        self.format
    }

    pub fn max_frames(&self) -> u64 {
        self.max_frames
    }

    /// Whole frames buffered so far
    pub fn frames(&self) -> u64 {
        (self.samples.len() / usize::from(self.format.channels.max(1))) as u64
    }

    pub fn is_full(&self) -> bool {
        self.frames() >= self.max_frames
    }

    fn remaining_samples(&self) -> usize {
        let channels = usize::from(self.format.channels.max(1));
        let cap = (self.max_frames as usize).saturating_mul(channels);
        cap.saturating_sub(self.samples.len())
    }

    /// Append interleaved samples, dropping whatever exceeds the frame budget
    ///
    /// Returns the number of samples kept.
    pub fn push_interleaved(&mut self, data: &[i16]) -> usize {
        let take = data.len().min(self.remaining_samples());
        self.samples.extend_from_slice(&data[..take]);
        take
    }

    /// Append `frames` frames of silence, within the frame budget
    pub fn push_silence(&mut self, frames: u64) {
        let channels = u64::from(self.format.channels.max(1));
        let wanted = usize::try_from(frames.saturating_mul(channels)).unwrap_or(usize::MAX);
        let take = wanted.min(self.remaining_samples());
        self.samples.resize(self.samples.len() + take, 0);
    }

    /// Drop every buffered sample
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Write the buffered samples as a 16-bit PCM WAV file
    pub fn write_wav(&self, path: &Path) -> Result<(), CaptureError> {
        let spec = WavSpec {
            channels: self.format.channels,
            sample_rate: self.format.sample_rate,
            bits_per_sample: BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        };

        let persist_err = |source: hound::Error| CaptureError::Persist {
            path: path.to_owned(),
            source,
        };

        let mut writer = WavWriter::create(path, spec).map_err(persist_err)?;
        for &sample in &self.samples {
            writer.write_sample(sample).map_err(persist_err)?;
        }
        writer.finalize().map_err(persist_err)?;

        info!(frames = self.frames(), ?path, "audio saved");
        Ok(())
    }
}
