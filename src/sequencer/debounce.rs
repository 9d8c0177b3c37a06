//! Edge-match debouncer for polled buttons.
//!
//! A new raw state is accepted only after it has been seen on
//! `threshold` consecutive polls. Never blocks the loop.

#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    stable: u8,
    candidate: u8,
    count: u16,
    threshold: u16,
}

impl Debouncer {
    /// Start from `initial` (usually 0 = nothing pressed).
    pub const fn new(initial: u8, threshold: u16) -> Self {
        Self {
            stable: initial,
            candidate: initial,
            count: 0,
            threshold,
        }
    }

    /// Feed one raw sample, get the accepted state.
    #[inline]
    pub fn update(&mut self, raw: u8) -> u8 {
        if raw == self.stable {
            self.candidate = raw;
            self.count = 0;
            return self.stable;
        }

        if raw != self.candidate {
            self.candidate = raw;
            self.count = 0;
        }

        self.count = self.count.saturating_add(1);
        if self.count >= self.threshold {
            self.stable = raw;
            self.count = 0;
        }
        self.stable
    }

    /// Accepted state.
    #[inline]
    pub fn state(&self) -> u8 {
        self.stable
    }

    /// Force a state (e.g., on reset).
    pub fn reset(&mut self, state: u8) {
        self.stable = state;
        self.candidate = state;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_after_threshold() {
        let mut d = Debouncer::new(0, 3);
        assert_eq!(d.update(0b01), 0);
        assert_eq!(d.update(0b01), 0);
        assert_eq!(d.update(0b01), 0b01);
    }

    #[test]
    fn test_bounce_restarts_count() {
        let mut d = Debouncer::new(0, 3);
        d.update(0b01);
        d.update(0b01);
        // contact bounce back to released
        assert_eq!(d.update(0), 0);
        assert_eq!(d.update(0b01), 0);
        assert_eq!(d.update(0b01), 0);
        assert_eq!(d.update(0b01), 0b01);
    }

    #[test]
    fn test_zero_threshold_is_immediate() {
        let mut d = Debouncer::new(0, 0);
        assert_eq!(d.update(0b11), 0b11);
        assert_eq!(d.update(0), 0);
    }
}
