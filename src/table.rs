//! Program tables and step value decoding.
//!
//! A program is a fixed-length row of step bytes stored as compiled-in
//! constant data. A step byte is overloaded:
//!
//! ```text
//!   0          silence
//!   1..=11     note index into NOTE_TABLE
//!   12..=222   unassigned, treated as silence
//!   223..=255  calibration delta (value - 239, -16..=+16)
//! ```

use crate::audio::notes::{note_for_step, NoteEntry};

/// First step value of the calibration band.
pub const CALIBRATION_FLOOR: u8 = 223;

/// Step value meaning "no calibration offset".
pub const CALIBRATION_CENTER: u8 = 239;

/// Programs per bank in the local variant.
pub const LOCAL_PROGRAM_COUNT: usize = 3;

/// Steps per program in the local variant.
pub const LOCAL_PROGRAM_LEN: usize = 64;

/// Programs per bank in the remote variant.
pub const REMOTE_PROGRAM_COUNT: usize = 2;

/// Steps per program in the remote variant.
pub const REMOTE_PROGRAM_LEN: usize = 32;

/// What a step value asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    /// Stop the tone
    Silence,
    /// Play a note
    Note(&'static NoteEntry),
    /// Adjust the runtime fine tune, keep the current note
    Calibrate(i8),
}

impl StepAction {
    /// Total decode of a step byte.
    #[inline]
    pub fn decode(value: u8) -> Self {
        match value {
            0 => StepAction::Silence,
            CALIBRATION_FLOOR..=u8::MAX => {
                StepAction::Calibrate((value as i16 - CALIBRATION_CENTER as i16) as i8)
            }
            _ => match note_for_step(value) {
                Some(note) => StepAction::Note(note),
                None => StepAction::Silence,
            },
        }
    }
}

/// A bank of fixed-length programs.
#[derive(Debug, Clone, Copy)]
pub struct ProgramTable<const LEN: usize> {
    programs: &'static [[u8; LEN]],
}

impl<const LEN: usize> ProgramTable<LEN> {
    /// Wrap a static bank.
    ///
    /// # Panics
    ///
    /// Panics at compile time (in const context) if the bank or rows are empty.
    pub const fn new(programs: &'static [[u8; LEN]]) -> Self {
        assert!(!programs.is_empty(), "program bank must not be empty");
        assert!(LEN > 0, "programs must have at least one step");
        Self { programs }
    }

    /// Number of programs in the bank.
    #[inline]
    pub const fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Steps per program.
    #[inline]
    pub const fn program_len(&self) -> usize {
        LEN
    }

    /// Clamp a program selector to the last valid program.
    #[inline]
    pub fn clamp_program(&self, program: usize) -> usize {
        program.min(self.programs.len() - 1)
    }

    /// Clamp a zero-based step index to the last valid step.
    #[inline]
    pub fn clamp_step(&self, index: usize) -> usize {
        index.min(LEN - 1)
    }

    /// Fetch a step value, clamping both indices.
    #[inline]
    pub fn step_value(&self, program: usize, index: usize) -> u8 {
        self.programs[self.clamp_program(program)][self.clamp_step(index)]
    }

    /// Borrow a full program row (clamped).
    #[inline]
    pub fn program(&self, program: usize) -> &'static [u8; LEN] {
        &self.programs[self.clamp_program(program)]
    }
}

static LOCAL_BANK: [[u8; LOCAL_PROGRAM_LEN]; LOCAL_PROGRAM_COUNT] = [
    // Jingle Bells
    [
        6, 0, 6, 0, 6, 0, 6, 0, 6, 8, 4, 5, 6, 6, 0, 6, //
        7, 0, 7, 0, 7, 6, 0, 6, 6, 5, 5, 6, 5, 5, 8, 8, //
        6, 0, 6, 0, 6, 0, 6, 0, 6, 8, 4, 5, 6, 6, 0, 6, //
        7, 0, 7, 0, 7, 6, 0, 6, 8, 8, 7, 5, 4, 4, 0, 4, //
    ],
    // Scale runs
    [
        0, 4, 4, 6, 6, 8, 8, 10, 10, 11, 11, 11, 6, 6, 4, 4, //
        0, 2, 2, 4, 4, 6, 6, 8, 8, 9, 9, 9, 4, 4, 2, 2, //
        0, 2, 2, 2, 6, 6, 6, 6, 8, 8, 8, 8, 9, 9, 9, 9, //
        0, 2, 2, 4, 4, 6, 6, 8, 8, 9, 9, 9, 4, 4, 2, 2, //
    ],
    // Pitch sweep through the calibration band
    [
        8, 238, 237, 236, 235, 234, 233, 232, 231, 232, 233, 234, 235, 236, 237, 238, //
        239, 240, 241, 242, 243, 244, 245, 246, 247, 246, 245, 244, 243, 242, 241, 240, //
        2, 238, 237, 236, 235, 234, 233, 232, 231, 232, 233, 234, 235, 236, 237, 238, //
        239, 240, 241, 242, 243, 244, 245, 246, 247, 246, 245, 244, 243, 242, 241, 240, //
    ],
];

static REMOTE_BANK: [[u8; REMOTE_PROGRAM_LEN]; REMOTE_PROGRAM_COUNT] = [
    *b"Type X / Y to Get Transmission\r\n",
    *b"Type P to Reset Transmission--\r\n",
];

/// Note programs for the locally clocked audio sequencer.
pub static LOCAL_PROGRAMS: ProgramTable<LOCAL_PROGRAM_LEN> = ProgramTable::new(&LOCAL_BANK);

/// Byte programs forwarded by the remotely clocked sequencer.
pub static REMOTE_PROGRAMS: ProgramTable<REMOTE_PROGRAM_LEN> = ProgramTable::new(&REMOTE_BANK);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bands() {
        assert_eq!(StepAction::decode(0), StepAction::Silence);
        assert!(matches!(StepAction::decode(6), StepAction::Note(n) if n.name == "E5"));
        assert_eq!(StepAction::decode(12), StepAction::Silence);
        assert_eq!(StepAction::decode(222), StepAction::Silence);
        assert_eq!(StepAction::decode(223), StepAction::Calibrate(-16));
        assert_eq!(StepAction::decode(239), StepAction::Calibrate(0));
        assert_eq!(StepAction::decode(255), StepAction::Calibrate(16));
    }

    #[test]
    fn test_bank_shapes() {
        assert_eq!(LOCAL_PROGRAMS.program_count(), 3);
        assert_eq!(LOCAL_PROGRAMS.program_len(), 64);
        assert_eq!(REMOTE_PROGRAMS.program_count(), 2);
        assert_eq!(REMOTE_PROGRAMS.program(0)[5], b'X');
    }

    #[test]
    fn test_step_value_clamps() {
        assert_eq!(REMOTE_PROGRAMS.step_value(7, 0), b'T');
        assert_eq!(REMOTE_PROGRAMS.step_value(1, 1000), b'\n');
        assert_eq!(LOCAL_PROGRAMS.step_value(0, 63), 4);
    }
}
