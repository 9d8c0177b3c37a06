//! Locally clocked sequencer with sawtooth synthesis.
//!
//! Module: sequencer::local
//! Purpose: two buttons pick a program, an optional third steps the tempo,
//!          the audio interrupt counts
//!          samples into step pulses, the poll loop decodes each step into
//!          synthesis parameters and calibration.
//! Architecture:
//!
//! ```text
//! audio ISR (every sample)             poll loop
//! ────────────────────────             ─────────
//! StepClock::tick ──pulses──────────▶  cursor.advance_by(delta)
//! Sawtooth::tick ◀──ParamMailbox──────  publish_note / publish_silence
//! PWM compare ◀── level                Calibrator::apply ──▶ ClockTrim
//! ```
//!
//! Safety: the ISR never touches the cursor; the poll loop never touches
//! the accumulator. Everything crossing the boundary goes through
//! [`ParamMailbox`] or [`StepClock`].

use core::sync::atomic::{AtomicU32, Ordering};

use crate::audio::Sawtooth;
use crate::calibration::Calibrator;
use crate::config::RuntimeConfig;
use crate::hal::ClockTrim;
use crate::log_globals::POLL_LOG_STREAM;
use crate::mailbox::ParamMailbox;
use crate::table::{ProgramTable, StepAction};

use super::{Debouncer, RunState, StepClock, StepCursor, StepEvent, TempoSelect};

/// Input bit of the tempo button in the raw button byte.
pub const TEMPO_BUTTON: u8 = 0b100;

/// Program index for a 2-bit selector: 0 = stop, 1..=3 = program, clamped.
#[inline]
pub fn selector_program(selector: u8, program_count: usize) -> Option<usize> {
    match selector & 0b11 {
        0 => None,
        n => Some((n as usize).min(program_count) - 1),
    }
}

/// State shared between the audio interrupt and the poll loop.
pub struct LocalShared {
    pub params: ParamMailbox,
    pub clock: StepClock,
    ticks: AtomicU32,
}

impl LocalShared {
    pub const fn new(step_interval: u16) -> Self {
        Self {
            params: ParamMailbox::new(),
            clock: StepClock::new(step_interval),
            ticks: AtomicU32::new(0),
        }
    }

    /// Audio samples since reset (log timestamps).
    #[inline]
    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }
}

/// Audio-rate interrupt state.
pub struct AudioIsr {
    saw: Sawtooth,
}

impl AudioIsr {
    pub const fn new() -> Self {
        Self {
            saw: Sawtooth::new(),
        }
    }

    /// One sample: next PWM compare value.
    #[inline]
    pub fn tick(&mut self, shared: &LocalShared) -> u8 {
        shared.ticks.fetch_add(1, Ordering::Relaxed);
        shared.clock.tick();
        let params = shared.params.snapshot();
        self.saw.tick(&params)
    }
}

impl Default for AudioIsr {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll-loop state for the local variant.
pub struct LocalSequencer<const LEN: usize> {
    table: &'static ProgramTable<LEN>,
    state: RunState,
    cursor: StepCursor,
    debouncer: Debouncer,
    selector: u8,
    program: usize,
    last_pulses: u16,
    calibrator: Calibrator,
    fine_tune_enabled: bool,
    config_generation: Option<u16>,
    tempo: Option<TempoSelect>,
    /// Next note is published even if its period is already sounding
    restarted: bool,
}

impl<const LEN: usize> LocalSequencer<LEN> {
    pub const fn new(
        table: &'static ProgramTable<LEN>,
        calibrator: Calibrator,
        debounce_polls: u16,
    ) -> Self {
        Self {
            table,
            state: RunState::Idle,
            cursor: StepCursor::new(LEN as u16),
            debouncer: Debouncer::new(0, debounce_polls),
            selector: 0,
            program: 0,
            last_pulses: 0,
            calibrator,
            fine_tune_enabled: true,
            config_generation: None,
            tempo: None,
            restarted: false,
        }
    }

    /// Enable the tempo button.
    pub const fn with_tempo(mut self, tempo: TempoSelect) -> Self {
        self.tempo = Some(tempo);
        self
    }

    /// Steps per second of the tempo button, if enabled.
    #[inline]
    pub fn tempo(&self) -> Option<u16> {
        self.tempo.as_ref().map(TempoSelect::steps_per_sec)
    }

    #[inline]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Current 1-based step.
    #[inline]
    pub fn step(&self) -> u16 {
        self.cursor.step()
    }

    #[inline]
    pub fn program(&self) -> usize {
        self.program
    }

    #[inline]
    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    /// Pick up tempo and fine-tune changes from the runtime config.
    pub fn sync_config(&mut self, shared: &LocalShared, config: &RuntimeConfig) {
        let generation = config.generation();
        if self.config_generation == Some(generation) {
            return;
        }
        self.config_generation = Some(generation);
        shared.clock.set_interval(config.step_interval());
        self.fine_tune_enabled = config.fine_tune_enabled();
        if !self.fine_tune_enabled {
            self.calibrator.set_fine_tune(0);
        }
    }

    /// One pass of the main loop.
    ///
    /// `buttons` holds the undebounced inputs (bit set = pressed): the
    /// 2-bit program selector in bits 1:0 and [`TEMPO_BUTTON`]. Returns the
    /// step decoded on this pass, if any.
    pub fn poll<T: ClockTrim>(
        &mut self,
        shared: &LocalShared,
        buttons: u8,
        trim: &mut T,
    ) -> Option<StepEvent> {
        if let Some(tempo) = self.tempo.as_mut() {
            if let Some(interval) = tempo.update(buttons & TEMPO_BUTTON != 0) {
                shared.clock.set_interval(interval);
                crate::rt_info!(POLL_LOG_STREAM, shared.ticks(), "tempo {} steps/s", tempo.steps_per_sec());
            }
        }

        let selector = self.debouncer.update(buttons & 0b11);

        if selector != self.selector {
            self.selector = selector;
            match selector_program(selector, self.table.program_count()) {
                Some(program) => self.start(shared, program),
                None => {
                    self.hard_stop(shared);
                    return None;
                }
            }
        } else if self.state == RunState::Idle {
            return None;
        } else {
            let pulses = shared.clock.pulses();
            let delta = pulses.wrapping_sub(self.last_pulses);
            if delta == 0 {
                return None;
            }
            self.last_pulses = pulses;
            self.cursor.advance_by(delta);
        }

        let value = self.table.step_value(self.program, self.cursor.index());
        self.apply(shared, value);
        if self.calibrator.apply(trim) {
            crate::rt_trace!(POLL_LOG_STREAM, shared.ticks(), "trim {}", self.calibrator.combined());
        }

        let step = self.cursor.step();
        crate::rt_debug!(POLL_LOG_STREAM, shared.ticks(), "step {} value {}", step, value);

        Some(StepEvent {
            program: self.program,
            step,
            value,
        })
    }

    fn start(&mut self, shared: &LocalShared, program: usize) {
        self.program = program;
        self.state = RunState::Running;
        self.cursor.restart();
        self.last_pulses = 0;
        self.restarted = true;
        shared.clock.start();
        crate::rt_info!(POLL_LOG_STREAM, shared.ticks(), "start program {}", program);
    }

    /// Buttons released: cursor, interval counter and tone all reset now.
    fn hard_stop(&mut self, shared: &LocalShared) {
        if self.state == RunState::Idle {
            return;
        }
        self.state = RunState::Idle;
        self.cursor.restart();
        self.last_pulses = 0;
        shared.clock.stop();
        shared.params.publish_silence();
        self.calibrator.clear_note_trim();
        crate::rt_info!(POLL_LOG_STREAM, shared.ticks(), "stop");
    }

    fn apply(&mut self, shared: &LocalShared, value: u8) {
        match StepAction::decode(value) {
            StepAction::Note(note) => {
                self.calibrator.set_note_trim(note.trim);
                // Same note again keeps its phase, except on a fresh start
                if self.restarted || shared.params.current_period() != note.period {
                    shared.params.publish_note(note);
                }
            }
            StepAction::Silence => {
                self.calibrator.clear_note_trim();
                if shared.params.current_period() != 0 {
                    shared.params.publish_silence();
                }
            }
            StepAction::Calibrate(delta) => {
                if self.fine_tune_enabled {
                    self.calibrator.set_fine_tune(delta);
                }
            }
        }
        self.restarted = false;
    }
}
