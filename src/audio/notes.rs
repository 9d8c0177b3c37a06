//! Note table for the sawtooth synthesizer
//!
//! Heptatonic scale G4..C6 at a 37 500 Hz sample rate.
//! Phase increments are 9.7 fixed point (`integer << 7 | fraction`).

/// Bit position of the integer part in a phase increment.
pub const FRAC_BITS: u32 = 7;

/// Number of notes addressable by step values `1..=NOTE_COUNT`.
pub const NOTE_COUNT: usize = 11;

/// One compiled-in note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEntry {
    /// Scientific pitch name
    pub name: &'static str,
    /// Samples per cycle minus one (`count_per_2pi`)
    pub period: u16,
    /// Accumulator increment per sample, 9.7 fixed point
    pub phase_inc: u16,
    /// Static clock trim for this note's pitch error
    pub trim: i8,
}

impl NoteEntry {
    const fn new(name: &'static str, period: u16, integer: u16, fraction: u16, trim: i8) -> Self {
        Self {
            name,
            period,
            phase_inc: integer << FRAC_BITS | fraction,
            trim,
        }
    }

    /// Output frequency in Hz at the given sample rate.
    ///
    /// One cycle is `period + 1` samples.
    #[inline]
    pub fn frequency_hz(&self, sample_rate: u32) -> f32 {
        sample_rate as f32 / (self.period as f32 + 1.0)
    }

    /// Peak accumulator value reached at the end of one ramp.
    #[inline]
    pub const fn peak(&self) -> u32 {
        self.period as u32 * self.phase_inc as u32
    }
}

/// Notes indexed by step value minus one.
pub static NOTE_TABLE: [NoteEntry; NOTE_COUNT] = [
    NoteEntry::new("G4", 95, 2, 0b1010111, 1),  // 392.00 Hz
    NoteEntry::new("A4", 84, 3, 0b0000100, 0),  // 440.00 Hz
    NoteEntry::new("B4", 75, 3, 0b0110011, 0),  // 493.88 Hz
    NoteEntry::new("C5", 70, 3, 0b1010010, 0),  // 523.25 Hz
    NoteEntry::new("D5", 63, 4, 0b0000110, 1),  // 587.33 Hz
    NoteEntry::new("E5", 56, 4, 0b1000110, 1),  // 659.26 Hz
    NoteEntry::new("F5", 52, 4, 0b1110011, 1),  // 698.46 Hz
    NoteEntry::new("G5", 47, 5, 0b0110110, 1),  // 783.99 Hz
    NoteEntry::new("A5", 41, 6, 0b0011100, -1), // 880.00 Hz
    NoteEntry::new("B5", 37, 6, 0b1110010, 0),  // 987.77 Hz
    NoteEntry::new("C6", 35, 7, 0b0100100, 1),  // 1046.50 Hz
];

/// Look up the note for a step value, `None` outside `1..=NOTE_COUNT`.
#[inline]
pub fn note_for_step(value: u8) -> Option<&'static NoteEntry> {
    match value as usize {
        n @ 1..=NOTE_COUNT => Some(&NOTE_TABLE[n - 1]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_inc_packing() {
        // E5: 4 << 7 | 0b1000110
        assert_eq!(NOTE_TABLE[5].phase_inc, 582);
        assert_eq!(NOTE_TABLE[5].name, "E5");
    }

    #[test]
    fn test_ramps_stay_below_overflow() {
        // The accumulator holds 8 integer bits; one ramp must not exceed 255.99
        for note in NOTE_TABLE.iter() {
            assert!(note.peak() < 256 << FRAC_BITS, "{} overflows", note.name);
            assert!(note.peak() >= 240 << FRAC_BITS, "{} ramp too short", note.name);
        }
    }

    #[test]
    fn test_note_for_step_bounds() {
        assert!(note_for_step(0).is_none());
        assert_eq!(note_for_step(1).map(|n| n.name), Some("G4"));
        assert_eq!(note_for_step(11).map(|n| n.name), Some("C6"));
        assert!(note_for_step(12).is_none());
    }
}
