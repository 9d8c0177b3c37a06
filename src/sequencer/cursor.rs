//! Step cursor: 1-based position inside a fixed-length program.

/// Step position. Step 0 is reserved; the cursor wraps from `len` to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepCursor {
    step: u16,
    len: u16,
}

impl StepCursor {
    /// Cursor at step 1 of a `len`-step program (`len` of 0 is treated as 1).
    pub const fn new(len: u16) -> Self {
        Self {
            step: 1,
            len: if len == 0 { 1 } else { len },
        }
    }

    /// Back to step 1.
    #[inline]
    pub fn restart(&mut self) {
        self.step = 1;
    }

    /// Move one step forward, wrapping past the end to 1.
    #[inline]
    pub fn advance(&mut self) -> u16 {
        self.step += 1;
        if self.step > self.len {
            self.step = 1;
        }
        self.step
    }

    /// Move `n` steps forward (several clock pulses between two polls).
    #[inline]
    pub fn advance_by(&mut self, n: u16) -> u16 {
        let zero_based = (self.step as u32 - 1 + n as u32) % self.len as u32;
        self.step = zero_based as u16 + 1;
        self.step
    }

    /// Current 1-based step.
    #[inline]
    pub fn step(&self) -> u16 {
        self.step
    }

    /// Zero-based table index, always inside `0..len`.
    #[inline]
    pub fn index(&self) -> usize {
        (self.step.max(1) as usize - 1).min(self.len as usize - 1)
    }

    /// Program length.
    #[inline]
    pub fn len(&self) -> u16 {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_to_one() {
        let mut c = StepCursor::new(3);
        assert_eq!(c.step(), 1);
        assert_eq!(c.advance(), 2);
        assert_eq!(c.advance(), 3);
        assert_eq!(c.advance(), 1);
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn test_advance_by_matches_repeated_advance() {
        let mut a = StepCursor::new(7);
        let mut b = StepCursor::new(7);
        for n in 0..40u16 {
            for _ in 0..n {
                a.advance();
            }
            b.advance_by(n);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_zero_len_is_one_step() {
        let mut c = StepCursor::new(0);
        assert_eq!(c.len(), 1);
        assert_eq!(c.advance(), 1);
        assert_eq!(c.index(), 0);
    }
}
