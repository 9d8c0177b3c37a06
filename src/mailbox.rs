//! Shared synthesis parameter block.
//!
//! The main loop is the only writer, the audio interrupt the only reader.
//! Increment and period must always come from the same step decode, so
//! every swap happens inside one critical section and is stamped with a
//! generation number in the same write.
//!
//! ```text
//! poll loop                  ParamMailbox                 audio ISR
//! ─────────                  ────────────                 ─────────
//! publish_note() ──cs──▶ [inc|period|active|gen] ──cs──▶ snapshot()
//! ```

use core::cell::Cell;

use critical_section::Mutex;

use crate::audio::notes::NoteEntry;

/// Parameters consumed by the sawtooth generator every sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SynthParams {
    /// Accumulator increment, 9.7 fixed point
    pub phase_inc: u16,
    /// Cycle length minus one
    pub period: u16,
    /// False = hold the output at the low peak
    pub active: bool,
    /// Bumped on every publish; a change restarts the waveform cycle
    pub generation: u8,
}

impl SynthParams {
    /// Silent parameters (initial state).
    pub const SILENT: Self = Self {
        phase_inc: 0,
        period: 0,
        active: false,
        generation: 0,
    };
}

/// Single-slot mailbox for [`SynthParams`].
pub struct ParamMailbox {
    slot: Mutex<Cell<SynthParams>>,
}

impl ParamMailbox {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(SynthParams::SILENT)),
        }
    }

    /// Publish a note. Returns the new generation.
    #[inline]
    pub fn publish_note(&self, note: &NoteEntry) -> u8 {
        self.publish(note.phase_inc, note.period, true)
    }

    /// Publish silence. Returns the new generation.
    #[inline]
    pub fn publish_silence(&self) -> u8 {
        self.publish(0, 0, false)
    }

    /// Swap all fields at once.
    pub fn publish(&self, phase_inc: u16, period: u16, active: bool) -> u8 {
        critical_section::with(|cs| {
            let cell = self.slot.borrow(cs);
            let next = SynthParams {
                phase_inc,
                period,
                active,
                generation: cell.get().generation.wrapping_add(1),
            };
            cell.set(next);
            next.generation
        })
    }

    /// Consistent copy of the current parameters.
    #[inline]
    pub fn snapshot(&self) -> SynthParams {
        critical_section::with(|cs| self.slot.borrow(cs).get())
    }

    /// Period of the current note, 0 when silent.
    #[inline]
    pub fn current_period(&self) -> u16 {
        let params = self.snapshot();
        if params.active {
            params.period
        } else {
            0
        }
    }
}

impl Default for ParamMailbox {
    fn default() -> Self {
        Self::new()
    }
}
