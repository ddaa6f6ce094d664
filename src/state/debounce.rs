//! Debounced edge detection for the record button
//!
//! Two independent hysteresis counters, one per edge. A counter only moves
//! while its own condition holds and is zeroed only when it fires; a
//! momentarily false condition leaves it where it was.

/// Default number of consecutive ticks a condition must exceed
pub const DEFAULT_THRESHOLD: u16 = 3;

/// Press/release hysteresis counters for one boolean input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDebouncer {
    threshold: u16,
    press: u16,
    release: u16,
}

impl EdgeDebouncer {
    /// An edge fires once a counter exceeds `threshold`, so `u16::MAX` never fires
    pub fn new(threshold: u16) -> Self {
        Self {
            threshold,
            press: 0,
            release: 0,
        }
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Feed one reading to the press counter
    ///
    /// Returns `true` on the tick the counter exceeds the threshold.
    pub fn press(&mut self, held: bool) -> bool {
        Self::advance(&mut self.press, held, self.threshold)
    }

    /// Feed one reading to the release counter
    pub fn release(&mut self, held: bool) -> bool {
        Self::advance(&mut self.release, !held, self.threshold)
    }

    /// Zero the release counter so a release has to be observed afresh
    pub fn rearm_release(&mut self) {
        self.release = 0;
    }

    pub fn press_count(&self) -> u16 {
        self.press
    }

    pub fn release_count(&self) -> u16 {
        self.release
    }

    fn advance(counter: &mut u16, condition: bool, threshold: u16) -> bool {
        if condition {
            *counter = counter.saturating_add(1);
        }
        if *counter > threshold {
            *counter = 0;
            return true;
        }
        false
    }
}

impl Default for EdgeDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_fires_on_threshold_plus_one() {
        let mut debouncer = EdgeDebouncer::new(3);
        let fired: Vec<bool> = (0..4).map(|_| debouncer.press(true)).collect();
        assert_eq!(fired, vec![false, false, false, true]);
        assert_eq!(debouncer.press_count(), 0);
    }

    #[test]
    fn test_release_fires_on_threshold_plus_one() {
        let mut debouncer = EdgeDebouncer::new(3);
        let fired: Vec<bool> = (0..4).map(|_| debouncer.release(false)).collect();
        assert_eq!(fired, vec![false, false, false, true]);
    }

    #[test]
    fn test_short_runs_never_fire() {
        let mut debouncer = EdgeDebouncer::new(3);
        // three true, then one false: the press counter holds at 3
        for held in [true, true, true, false] {
            assert!(!debouncer.press(held));
        }
        assert_eq!(debouncer.press_count(), 3);
    }

    #[test]
    fn test_counter_not_reset_by_glitch() {
        let mut debouncer = EdgeDebouncer::new(3);
        let samples = [true, false, true, false, true, false];
        assert!(samples.iter().all(|&held| !debouncer.press(held)));
        assert_eq!(debouncer.press_count(), 3);
        // the fourth true sample fires even though the run was interrupted
        assert!(debouncer.press(true));
    }

    #[test]
    fn test_opposite_counter_untouched() {
        let mut debouncer = EdgeDebouncer::new(3);
        debouncer.press(true);
        debouncer.press(true);
        assert_eq!(debouncer.release_count(), 0);

        debouncer.release(false);
        assert_eq!(debouncer.press_count(), 2);
        assert_eq!(debouncer.release_count(), 1);
    }

    #[test]
    fn test_zero_threshold_fires_immediately() {
        let mut debouncer = EdgeDebouncer::new(0);
        assert!(!debouncer.press(false));
        assert!(debouncer.press(true));
    }

    #[test]
    fn test_counter_saturates() {
        let mut debouncer = EdgeDebouncer::new(u16::MAX);
        for _ in 0..(u32::from(u16::MAX) + 10) {
            assert!(!debouncer.press(true));
        }
        assert_eq!(debouncer.press_count(), u16::MAX);
    }

    #[test]
    fn test_rearm_release() {
        let mut debouncer = EdgeDebouncer::new(3);
        debouncer.release(false);
        debouncer.release(false);
        debouncer.rearm_release();
        assert_eq!(debouncer.release_count(), 0);
        assert!(!debouncer.release(false));
    }
}
