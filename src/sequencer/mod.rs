//! Step sequencer engines.
//!
//! Two variants share the table, cursor and decode rules:
//!
//! - [`remote`]: clocked by framed command bytes on the serial link,
//!   forwards each step value back out over the same link
//! - [`local`]: clocked by the audio interrupt, selected by two buttons,
//!   drives the sawtooth synthesizer
//!
//! Both poll loops are the only writers of cross-context parameters.

pub mod clock;
pub mod cursor;
pub mod debounce;
pub mod local;
pub mod remote;

pub use clock::{
    interval_for, tempo_table, StepClock, TempoSelect, MAX_STEPS_PER_SEC, MIN_STEPS_PER_SEC,
    TEMPO_COUNT,
};
pub use cursor::StepCursor;
pub use debounce::Debouncer;
pub use local::{selector_program, AudioIsr, LocalSequencer, LocalShared, TEMPO_BUTTON};
pub use remote::{CommandFrame, RemoteSequencer, RemoteShared};

use crate::table::StepAction;

/// Whether the sequencer is stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

/// One decoded step, reported by `poll()` when the cursor moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEvent {
    /// Effective (clamped) program index
    pub program: usize,
    /// 1-based step
    pub step: u16,
    /// Raw step value from the table
    pub value: u8,
}

impl StepEvent {
    /// Decoded meaning of the step value.
    #[inline]
    pub fn action(&self) -> StepAction {
        StepAction::decode(self.value)
    }
}
