//! Sawtooth generator with fixed-point phase accumulator
//!
//! Runs inside the audio-rate interrupt. Each call produces the next
//! 8-bit PWM compare value. O(1), no division, no floating point.

use crate::mailbox::SynthParams;

use super::notes::FRAC_BITS;

/// Compare value for silence and for the start of every cycle.
pub const PEAK_LOW: u8 = 0x00;

/// Highest compare value.
pub const PEAK_HIGH: u8 = 0xFF;

/// Convert a 9.7 fixed point accumulator to a compare value.
///
/// Integer part, rounded half-up on fraction bit 6, saturated at [`PEAK_HIGH`].
#[inline]
pub fn quantize(acc: u16) -> u8 {
    let whole = acc >> FRAC_BITS;
    let half = (acc >> (FRAC_BITS - 1)) & 1;
    (whole + half).min(PEAK_HIGH as u16) as u8
}

/// Sawtooth generator state (owned by the audio interrupt).
///
/// One cycle is `period + 1` samples: sample 0 forces the low peak,
/// samples `1..=period` add `phase_inc` to the accumulator.
pub struct Sawtooth {
    /// Accumulator, 9.7 fixed point
    acc: u16,
    /// Position inside the current cycle (0..=period)
    sample_count: u16,
    /// Generation of the parameters last seen
    generation: u8,
    /// Last emitted compare value
    level: u8,
}

impl Sawtooth {
    /// Create a silent generator.
    pub const fn new() -> Self {
        Self {
            acc: 0,
            sample_count: 0,
            generation: 0,
            level: PEAK_LOW,
        }
    }

    /// Produce the next compare value.
    ///
    /// A parameter generation change restarts the cycle, matching a fresh
    /// note decode in the main loop.
    #[inline]
    pub fn tick(&mut self, params: &SynthParams) -> u8 {
        if params.generation != self.generation {
            self.generation = params.generation;
            self.sample_count = 0;
        }

        if !params.active {
            self.level = PEAK_LOW;
            return self.level;
        }

        if self.sample_count == 0 {
            self.acc = (PEAK_LOW as u16) << FRAC_BITS;
            self.level = PEAK_LOW;
        } else if self.sample_count <= params.period {
            self.acc = self.acc.wrapping_add(params.phase_inc);
            self.level = quantize(self.acc);
        }

        self.sample_count += 1;
        if self.sample_count > params.period {
            self.sample_count = 0;
        }

        self.level
    }

    /// Last emitted compare value
    #[inline]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Raw accumulator (for diagnostics and tests)
    #[inline]
    pub fn accumulator(&self) -> u16 {
        self.acc
    }

    /// Reset generator state (e.g., after a hard stop)
    pub fn reset(&mut self) {
        self.acc = 0;
        self.sample_count = 0;
        self.level = PEAK_LOW;
    }
}

impl Default for Sawtooth {
    fn default() -> Self {
        Self::new()
    }
}
