//! Button bitmask definitions and state tracking
//!
//! Provides the bit layout of the state byte carried on Channel A and a
//! struct wrapping the last-known value.

/// Button flag masks within the state byte
pub mod flags {
    /// Volume up button
    pub const VOLUME_UP: u8 = 0x01;
    /// Volume down button
    pub const VOLUME_DOWN: u8 = 0x02;
    /// Record button (the one the trigger machine debounces)
    pub const RECORD: u8 = 0x04;
    /// Interface / mode select button
    pub const INTERFACE: u8 = 0x08;
    /// Toggles every sampling cycle while the button source is alive
    pub const HEARTBEAT: u8 = 0x10;
}

/// Last-known state of the wearable's buttons
///
/// Refreshed wholesale from each accepted inbound frame. Between frames the
/// previous value is kept, so a reader always sees the latest (possibly stale)
/// byte rather than an absent one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState(u8);

impl ButtonState {
    /// Create a state from a raw byte
    pub const fn from_byte(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw byte as sent on the wire
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check whether every bit of `flag` is raised
    pub const fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    /// Raise or clear the bits of `flag`
    pub fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    /// Flip the heartbeat bit
    pub fn toggle_heartbeat(&mut self) {
        self.0 ^= flags::HEARTBEAT;
    }

    pub const fn record(self) -> bool {
        self.contains(flags::RECORD)
    }

    pub const fn volume_up(self) -> bool {
        self.contains(flags::VOLUME_UP)
    }

    pub const fn volume_down(self) -> bool {
        self.contains(flags::VOLUME_DOWN)
    }

    pub const fn interface(self) -> bool {
        self.contains(flags::INTERFACE)
    }

    pub const fn heartbeat(self) -> bool {
        self.contains(flags::HEARTBEAT)
    }
}

impl std::fmt::Display for ButtonState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state() {
        let state = ButtonState::default();
        assert_eq!(state.bits(), 0);
        assert!(!state.record());
        assert!(!state.heartbeat());
    }

    #[test]
    fn test_record_bit_only() {
        let state = ButtonState::from_byte(0x04);
        assert!(state.record());
        assert!(!state.volume_up());
        assert!(!state.volume_down());
        assert!(!state.interface());
    }

    #[test]
    fn test_reserved_bits_do_not_alias_record() {
        let state = ButtonState::from_byte(0xE0);
        assert!(!state.record());
        assert!(!state.heartbeat());
    }

    #[test]
    fn test_set_and_clear() {
        let mut state = ButtonState::default();
        state.set(flags::RECORD, true);
        state.set(flags::VOLUME_UP, true);
        assert_eq!(state.bits(), 0x05);

        state.set(flags::RECORD, false);
        assert_eq!(state.bits(), 0x01);
    }

    #[test]
    fn test_heartbeat_toggles() {
        let mut state = ButtonState::from_byte(flags::RECORD);
        state.toggle_heartbeat();
        assert!(state.heartbeat());
        assert!(state.record());
        state.toggle_heartbeat();
        assert!(!state.heartbeat());
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(ButtonState::from_byte(0x14).to_string(), "14");
    }
}
