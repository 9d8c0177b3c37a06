//! Oscillator calibration.
//!
//! Module: calibration
//! Purpose: combine factory trim, board offset, per-note trim and runtime
//!          fine tune into one trim register value.
//! Architecture: owned by the poll loop; writes go through [`ClockTrim`].
//!
//! ```text
//! factory ─┐
//! offset  ─┼─▶ baseline ─┐
//!          │             ├─▶ clamp(0..=255) ─▶ ClockTrim::write (on change)
//! note trim ─────────────┤
//! fine tune ─────────────┘
//! ```
//!
//! The sum saturates at the register bounds instead of wrapping, so an
//! extreme offset pins the clock at an edge rather than jumping across
//! the whole trim range.

use crate::hal::ClockTrim;

/// Fine tune range reachable from a calibration step (223..=255 → -16..=16).
pub const FINE_TUNE_LIMIT: i8 = 16;

/// Calibration state for one trim register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibrator {
    baseline: u8,
    note_trim: i8,
    fine_tune: i8,
    written: Option<u8>,
}

impl Calibrator {
    /// Baseline = factory value + board offset, clamped.
    pub const fn new(factory: u8, offset: i8) -> Self {
        Self {
            baseline: clamp_sum(factory, offset as i16),
            note_trim: 0,
            fine_tune: 0,
            written: None,
        }
    }

    /// Build from the register's factory value.
    pub fn from_trim<T: ClockTrim>(trim: &T, offset: i8) -> Self {
        Self::new(trim.factory(), offset)
    }

    #[inline]
    pub fn baseline(&self) -> u8 {
        self.baseline
    }

    #[inline]
    pub fn note_trim(&self) -> i8 {
        self.note_trim
    }

    #[inline]
    pub fn fine_tune(&self) -> i8 {
        self.fine_tune
    }

    /// Trim for the note currently playing.
    #[inline]
    pub fn set_note_trim(&mut self, trim: i8) {
        self.note_trim = trim;
    }

    #[inline]
    pub fn clear_note_trim(&mut self) {
        self.note_trim = 0;
    }

    /// Runtime fine tune, limited to ±[`FINE_TUNE_LIMIT`].
    #[inline]
    pub fn set_fine_tune(&mut self, delta: i8) {
        self.fine_tune = delta.clamp(-FINE_TUNE_LIMIT, FINE_TUNE_LIMIT);
    }

    /// Register value for the current state.
    #[inline]
    pub fn combined(&self) -> u8 {
        clamp_sum(self.baseline, self.note_trim as i16 + self.fine_tune as i16)
    }

    /// Write the combined value if it differs from the last write.
    ///
    /// Returns `true` when the register was written.
    pub fn apply<T: ClockTrim>(&mut self, trim: &mut T) -> bool {
        let value = self.combined();
        if self.written == Some(value) {
            return false;
        }
        trim.write(value);
        self.written = Some(value);
        true
    }
}

const fn clamp_sum(base: u8, delta: i16) -> u8 {
    let sum = base as i16 + delta;
    if sum < 0 {
        0
    } else if sum > u8::MAX as i16 {
        u8::MAX
    } else {
        sum as u8
    }
}
