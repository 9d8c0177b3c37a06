//! Audio subsystem for the locally clocked sequencer
//!
//! Architecture:
//! - Note table: precomputed 9.7 fixed point increments and cycle lengths
//! - Sawtooth generator: phase accumulator, one PWM compare value per sample
//! - Parameters arrive through [`crate::mailbox::ParamMailbox`], never raw globals

pub mod notes;
pub mod sawtooth;

pub use notes::{note_for_step, NoteEntry, NOTE_COUNT, NOTE_TABLE};
pub use sawtooth::{quantize, Sawtooth, PEAK_HIGH, PEAK_LOW};
