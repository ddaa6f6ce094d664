//! Input device capture backend using cpal

use std::path::Path;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use parking_lot::Mutex;
use tracing::{debug, error, info};

use super::buffer::{CaptureFormat, SampleBuffer};
use super::{CaptureError, CaptureSession, PollStatus};

/// Session backend recording from the default input device
///
/// The stream is opened once at startup and paused between sessions; the
/// device callback appends into a shared bounded buffer.
pub struct DeviceCapture {
    stream: Stream,
    buffer: Arc<Mutex<SampleBuffer>>,
    running: bool,
}

impl DeviceCapture {
    /// Open the default input device
    ///
    /// Fails when no device is available or its format is unsupported.
    pub fn open(max_seconds: u32) -> Result<Self, CaptureError> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::Device("no input device available".into()))?;

        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            "using input device"
        );

        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::Device(format!("failed to get input config: {e}")))?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();

        let format = CaptureFormat {
            sample_rate: config.sample_rate.0,
            channels: config.channels,
        };
        let buffer = Arc::new(Mutex::new(SampleBuffer::new(
            format,
            format.frames_for(max_seconds),
        )));

        let err_fn = |err| error!("audio input stream error: {}", err);

        let stream = match sample_format {
            SampleFormat::I16 => {
                let buffer = Arc::clone(&buffer);
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        buffer.lock().push_interleaved(data);
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::F32 => {
                let buffer = Arc::clone(&buffer);
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let converted: Vec<i16> = data
                            .iter()
                            .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                            .collect();
                        buffer.lock().push_interleaved(&converted);
                    },
                    err_fn,
                    None,
                )
            }
            other => {
                return Err(CaptureError::Device(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        }
        .map_err(|e| CaptureError::Device(format!("failed to build input stream: {e}")))?;

        // Some hosts start streams on creation
        stream
            .pause()
            .map_err(|e| CaptureError::Device(format!("failed to pause stream: {e}")))?;

        info!(
            sample_rate = format.sample_rate,
            channels = format.channels,
            "input stream opened"
        );

        Ok(Self {
            stream,
            buffer,
            running: false,
        })
    }
}

impl CaptureSession for DeviceCapture {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.running {
            return Err(CaptureError::AlreadyRunning);
        }
        self.stream
            .play()
            .map_err(|e| CaptureError::Device(format!("failed to start stream: {e}")))?;
        self.running = true;
        debug!("device capture started");
        Ok(())
    }

    fn poll(&mut self) -> PollStatus {
        if self.buffer.lock().is_full() {
            PollStatus::Exhausted
        } else {
            PollStatus::Ok
        }
    }

    fn stop_and_persist(&mut self, path: &Path) -> Result<u64, CaptureError> {
        if !self.running {
            return Err(CaptureError::NotRunning);
        }
        self.running = false;
        self.stream
            .pause()
            .map_err(|e| CaptureError::Device(format!("failed to stop stream: {e}")))?;

        let buffer = self.buffer.lock();
        buffer.write_wav(path)?;
        Ok(buffer.frames())
    }

    fn reset(&mut self) {
        self.buffer.lock().clear();
    }
}
