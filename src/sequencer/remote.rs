//! Remote-clocked sequencer.
//!
//! Module: sequencer::remote
//! Purpose: advance one step per framed command byte and forward the
//!          step value over the serial link.
//! Architecture:
//!
//! ```text
//! serial ISR ──commit──▶ RxChannel ──read_byte──▶ RemoteSequencer::poll
//!                                                   │
//!          TxSlot ◀──────────── send(value) ────────┤
//!          level  ◀──────────── store(value) ───────┘  (PWM mirror)
//! ```
//!
//! Command byte layout:
//!
//! ```text
//!  bit 7..4   3      2..0
//!  [group ] [start] [program]
//! ```
//!
//! A byte whose group bits match and whose start flag is set is a start
//! (or a clock, while running). Group match with start clear is stop.
//! Anything else belongs to another device and is ignored.
//!
//! Safety: a stop does not cancel a frame already being shifted out; it
//! only drops the PWM mirror to 0.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::config::{RuntimeConfig, PROGRAM_MASK, START_BIT};
use crate::log_globals::POLL_LOG_STREAM;
use crate::serial::{SerialIsr, SerialLink};
use crate::table::ProgramTable;

use super::{RunState, StepCursor, StepEvent};

/// Meaning of one received byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFrame {
    /// Group match, start flag set
    Start { program: u8 },
    /// Group match, start flag clear
    Stop,
    /// Addressed to another group
    Foreign,
}

impl CommandFrame {
    /// Classify `byte` for the device group `group_bits`.
    #[inline]
    pub fn parse(byte: u8, group_bits: u8) -> Self {
        let mask = group_bits | START_BIT;
        let masked = byte & mask;
        if masked == mask {
            CommandFrame::Start {
                program: byte & PROGRAM_MASK,
            }
        } else if masked == group_bits {
            CommandFrame::Stop
        } else {
            CommandFrame::Foreign
        }
    }
}

/// State shared between the serial ISR, the PWM mirror and the poll loop.
pub struct RemoteShared {
    pub link: SerialLink,
    level: AtomicU8,
    ticks: AtomicU32,
}

impl RemoteShared {
    pub const fn new() -> Self {
        Self {
            link: SerialLink::new(),
            level: AtomicU8::new(0),
            ticks: AtomicU32::new(0),
        }
    }

    /// Serial-rate interrupt body. Returns the transmit line level.
    #[inline]
    pub fn serial_tick(&self, isr: &mut SerialIsr, rx_high: bool) -> bool {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        isr.tick(&self.link, rx_high)
    }

    /// Level for the PWM mirror output.
    #[inline]
    pub fn pwm_level(&self) -> u8 {
        self.level.load(Ordering::Relaxed)
    }

    /// Serial ticks since reset (log timestamps).
    #[inline]
    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    fn set_level(&self, level: u8) {
        self.level.store(level, Ordering::Relaxed);
    }
}

impl Default for RemoteShared {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll-loop state for the remote variant.
pub struct RemoteSequencer<const LEN: usize> {
    table: &'static ProgramTable<LEN>,
    state: RunState,
    cursor: StepCursor,
    pending: bool,
    last_byte: u8,
    group_bits: u8,
    zero_on_stop: bool,
    config_generation: Option<u16>,
}

impl<const LEN: usize> RemoteSequencer<LEN> {
    pub const fn new(table: &'static ProgramTable<LEN>, group_bits: u8) -> Self {
        Self {
            table,
            state: RunState::Idle,
            cursor: StepCursor::new(LEN as u16),
            pending: false,
            last_byte: 0,
            group_bits,
            zero_on_stop: true,
            config_generation: None,
        }
    }

    /// Keep the PWM mirror at the last forwarded value on stop
    /// (serial-only boards). The default drives it to 0.
    pub const fn holding_level_on_stop(mut self) -> Self {
        self.zero_on_stop = false;
        self
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
    pub fn group_bits(&self) -> u8 {
        self.group_bits
    }

    /// Pick up a new device group from the runtime config.
    pub fn sync_config(&mut self, config: &RuntimeConfig) {
        let generation = config.generation();
        if self.config_generation == Some(generation) {
            return;
        }
        self.config_generation = Some(generation);
        self.group_bits = config.group_bits();
    }

    /// One pass of the main loop.
    ///
    /// Returns the step that was decoded and forwarded, if any.
    pub fn poll(&mut self, shared: &RemoteShared) -> Option<StepEvent> {
        let link = &shared.link;

        if link.has_new_data() {
            self.last_byte = link.read_byte();
            if self.state == RunState::Running
                && matches!(self.frame(), CommandFrame::Start { .. })
            {
                self.cursor.advance();
                self.pending = true;
            }
        }

        match (self.frame(), self.state) {
            (CommandFrame::Start { program }, RunState::Idle) => {
                self.state = RunState::Running;
                self.cursor.restart();
                self.pending = true;
                crate::rt_info!(POLL_LOG_STREAM, shared.ticks(), "start program {}", program);
            }
            (CommandFrame::Stop, RunState::Running) => {
                self.state = RunState::Idle;
                self.pending = false;
                if self.zero_on_stop {
                    shared.set_level(0);
                }
                crate::rt_info!(POLL_LOG_STREAM, shared.ticks(), "stop at step {}", self.cursor.step());
            }
            _ => {}
        }

        if !self.pending {
            return None;
        }
        self.pending = false;

        let selector = (self.last_byte & PROGRAM_MASK) as usize;
        let program = self.table.clamp_program(selector);
        if program != selector {
            link.diagnostics.record_program_clamped();
            crate::rt_warn!(POLL_LOG_STREAM, shared.ticks(), "program {} clamped to {}", selector, program);
        }

        let value = self.table.step_value(program, self.cursor.index());
        link.send(value);
        shared.set_level(value);

        let step = self.cursor.step();
        crate::rt_debug!(POLL_LOG_STREAM, shared.ticks(), "step {} value {}", step, value);

        Some(StepEvent { program, step, value })
    }

    #[inline]
    fn frame(&self) -> CommandFrame {
        CommandFrame::parse(self.last_byte, self.group_bits)
    }
}
