//! Key-test button sampler
//!
//! Stands in for the wearable's GPIO sampling: keys typed on stdin raise or
//! clear bits of the state byte. Stdin is read on a dedicated thread and the
//! keys are handed to the tick loop through a channel.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::state::{flags, ButtonState};

/// Reads raw keys from stdin and forwards them to the sampler
pub struct KeyReader {
    key_tx: mpsc::Sender<u8>,
    running: Arc<AtomicBool>,
}

impl KeyReader {
    /// Create a new key reader
    pub fn new(key_tx: mpsc::Sender<u8>) -> Self {
        Self {
            key_tx,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start reading stdin on a dedicated thread
    ///
    /// The thread exits when stdin reaches EOF or the receiving side of the
    /// channel is dropped.
    pub fn start(&self) -> Result<(), SamplerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SamplerError::AlreadyRunning);
        }

        let key_tx = self.key_tx.clone();
        let running = Arc::clone(&self.running);

        thread::Builder::new()
            .name("key-reader".to_string())
            .spawn(move || {
                info!("key reader thread started");

                for byte in std::io::stdin().lock().bytes() {
                    match byte {
                        Ok(key) if key.is_ascii_whitespace() => {}
                        Ok(key) => {
                            if key_tx.blocking_send(key).is_err() {
                                warn!("failed to forward key - channel closed?");
                                break;
                            }
                        }
                        Err(e) => {
                            error!(?e, "stdin read error");
                            break;
                        }
                    }
                }

                running.store(false, Ordering::SeqCst);
                info!("key reader thread stopped");
            })
            .map_err(|e| SamplerError::ThreadSpawn(e.to_string()))?;

        Ok(())
    }

    /// Check if the reader thread is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Errors that can occur while starting the sampler
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    #[error("key reader is already running")]
    AlreadyRunning,

    #[error("failed to spawn key reader thread: {0}")]
    ThreadSpawn(String),
}

/// Builds the state byte sent once per cycle
#[derive(Debug, Default)]
pub struct ButtonSampler {
    state: ButtonState,
}

impl ButtonSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample one cycle: flip the heartbeat, then apply this cycle's keys
    pub fn sample<I>(&mut self, keys: I) -> ButtonState
    where
        I: IntoIterator<Item = u8>,
    {
        self.state.toggle_heartbeat();
        for key in keys {
            if !apply_key(&mut self.state, key) {
                debug!(key, "ignoring unmapped key");
            }
        }
        self.state
    }
}

/// Apply one test key to the state byte
///
/// Returns `false` for keys without a mapping.
pub fn apply_key(state: &mut ButtonState, key: u8) -> bool {
    match key {
        b'1' => state.set(flags::VOLUME_UP, true),
        b'2' => state.set(flags::VOLUME_DOWN, true),
        b'3' => state.set(flags::RECORD, true),
        b'4' => state.set(flags::RECORD, false),
        b'5' => state.set(flags::HEARTBEAT, true),
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_creation() {
        let (tx, _rx) = mpsc::channel(8);
        let reader = KeyReader::new(tx);
        assert!(!reader.is_running());
    }

    #[test]
    fn test_record_keys() {
        let mut state = ButtonState::default();
        assert!(apply_key(&mut state, b'3'));
        assert!(state.record());
        assert!(apply_key(&mut state, b'4'));
        assert!(!state.record());
    }

    #[test]
    fn test_volume_keys_latch() {
        let mut state = ButtonState::default();
        apply_key(&mut state, b'1');
        apply_key(&mut state, b'2');
        assert!(state.volume_up());
        assert!(state.volume_down());
    }

    #[test]
    fn test_unmapped_key_is_ignored() {
        let mut state = ButtonState::from_byte(0x04);
        assert!(!apply_key(&mut state, b'x'));
        assert_eq!(state.bits(), 0x04);
    }

    #[test]
    fn test_heartbeat_alternates_each_cycle() {
        let mut sampler = ButtonSampler::new();
        let beats: Vec<bool> = (0..4)
            .map(|_| sampler.sample(std::iter::empty()).heartbeat())
            .collect();
        assert_eq!(beats, vec![true, false, true, false]);
    }

    #[test]
    fn test_record_survives_cycles_until_cleared() {
        let mut sampler = ButtonSampler::new();
        assert!(sampler.sample([b'3']).record());
        assert!(sampler.sample(std::iter::empty()).record());
        assert!(!sampler.sample([b'4']).record());
    }

    #[test]
    fn test_force_heartbeat_key() {
        let mut sampler = ButtonSampler::new();
        sampler.sample(std::iter::empty());
        // heartbeat would go low this cycle without the key
        assert!(sampler.sample([b'5']).heartbeat());
    }
}
