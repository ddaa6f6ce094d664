//! Datagram frame definitions
//!
//! Every message on both channels is exactly two bytes: the sender's fixed
//! identifier followed by a one-byte payload. There is no length field,
//! sequence number or acknowledgement.

/// Size of every frame on the wire
pub const FRAME_LEN: usize = 2;

/// Identifier of the button source (Channel A sender)
pub const BUTTON_SOURCE_ID: u8 = 0x12;
/// Identifier of the middleware (Channel B sender)
pub const MIDDLEWARE_ID: u8 = 0x23;

/// Default local port of the button source
pub const BUTTON_SOURCE_PORT: u16 = 0x1122;
/// Default port the middleware listens on for button frames
pub const MIDDLEWARE_PORT: u16 = 0x2233;
/// Default port the consumer listens on for trigger pulses
pub const CONSUMER_PORT: u16 = 0x3344;

/// A decoded two-byte frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub sender_id: u8,
    pub payload: u8,
}

impl Frame {
    pub const fn new(sender_id: u8, payload: u8) -> Self {
        Self { sender_id, payload }
    }

    /// Wire representation
    pub const fn encode(self) -> [u8; FRAME_LEN] {
        [self.sender_id, self.payload]
    }

    /// Decode a datagram, accepting it only from `expected_id`
    pub fn decode(datagram: &[u8], expected_id: u8) -> Result<Self, FrameError> {
        if datagram.len() != FRAME_LEN {
            return Err(FrameError::BadLength(datagram.len()));
        }
        if datagram[0] != expected_id {
            return Err(FrameError::UnexpectedSender {
                expected: expected_id,
                got: datagram[0],
            });
        }
        Ok(Self::new(datagram[0], datagram[1]))
    }
}

/// Payload of a Channel B frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPulse {
    /// Explicit low level, so a consumer can tell a fresh pulse from a stuck one
    Reset,
    /// The recorded artifact is ready
    Ready,
}

impl TriggerPulse {
    pub const fn flag(self) -> u8 {
        match self {
            TriggerPulse::Reset => 0x00,
            TriggerPulse::Ready => 0x01,
        }
    }

    /// Interpret a payload byte; anything but 0 or 1 is rejected
    pub fn from_flag(flag: u8) -> Result<Self, FrameError> {
        match flag {
            0x00 => Ok(TriggerPulse::Reset),
            0x01 => Ok(TriggerPulse::Ready),
            other => Err(FrameError::BadFlag(other)),
        }
    }
}

impl std::fmt::Display for TriggerPulse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerPulse::Reset => write!(f, "RESET"),
            TriggerPulse::Ready => write!(f, "READY"),
        }
    }
}

/// Reasons an inbound datagram is discarded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("datagram is {0} bytes, expected 2")]
    BadLength(usize),

    #[error("unexpected sender id {got:#04x}, expected {expected:#04x}")]
    UnexpectedSender { expected: u8, got: u8 },

    #[error("invalid trigger flag {0:#04x}")]
    BadFlag(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_puts_sender_first() {
        for payload in [0x00, 0x01, 0x04, 0xFF] {
            let bytes = Frame::new(MIDDLEWARE_ID, payload).encode();
            assert_eq!(bytes[0], MIDDLEWARE_ID);
            assert_eq!(bytes[1], payload);
        }
    }

    #[test]
    fn test_decode_accepts_expected_sender() {
        let frame = Frame::decode(&[BUTTON_SOURCE_ID, 0x14], BUTTON_SOURCE_ID).unwrap();
        assert_eq!(frame.payload, 0x14);
    }

    #[test]
    fn test_decode_rejects_other_sender() {
        let err = Frame::decode(&[MIDDLEWARE_ID, 0x04], BUTTON_SOURCE_ID).unwrap_err();
        assert_eq!(
            err,
            FrameError::UnexpectedSender {
                expected: BUTTON_SOURCE_ID,
                got: MIDDLEWARE_ID
            }
        );
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert_eq!(
            Frame::decode(&[BUTTON_SOURCE_ID], BUTTON_SOURCE_ID),
            Err(FrameError::BadLength(1))
        );
        assert_eq!(
            Frame::decode(&[BUTTON_SOURCE_ID, 0x04, 0x00], BUTTON_SOURCE_ID),
            Err(FrameError::BadLength(3))
        );
    }

    #[test]
    fn test_trigger_flags() {
        assert_eq!(TriggerPulse::Ready.flag(), 1);
        assert_eq!(TriggerPulse::Reset.flag(), 0);
        assert_eq!(TriggerPulse::from_flag(1), Ok(TriggerPulse::Ready));
        assert_eq!(TriggerPulse::from_flag(2), Err(FrameError::BadFlag(2)));
    }

    #[test]
    fn test_default_ports() {
        assert_eq!(MIDDLEWARE_PORT, 8755);
        assert_eq!(CONSUMER_PORT, 13124);
    }
}
