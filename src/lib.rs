//! # RtStepSequencer
//!
//! Interrupt-driven step sequencer with two clocking variants.
//!
//! ## Architecture
//!
//! ```text
//! ProgramTable ──▶ Sequencer (poll loop) ──▶ ParamMailbox ──▶ Sawtooth (audio ISR) ──▶ PWM
//!                        ▲        │
//!     RxChannel ─────────┘        └──▶ TxSlot ──▶ SerialIsr (serial ISR) ──▶ TX pin
//! ```
//!
//! - Interrupt contexts own the accumulator and the shift registers
//! - The poll loop owns the cursor and is the only writer of shared parameters
//! - Every multi-field handoff goes through a `critical_section::Mutex`
//! - Single-byte handoffs are atomics with release/acquire ordering

#![cfg_attr(not(test), no_std)]

pub mod audio;
pub mod calibration;
pub mod config;
pub mod diagnostics;
pub mod hal;
pub mod log_drain;
pub mod log_globals;
pub mod logging;
pub mod mailbox;
pub mod sequencer;
pub mod serial;
pub mod table;

pub use calibration::Calibrator;
pub use config::{ConfigError, EngineConfig, RuntimeConfig, CONFIG};
pub use diagnostics::{DiagnosticsSnapshot, LinkDiagnostics};
pub use log_globals::{ISR_LOG_STREAM, POLL_LOG_STREAM};
pub use mailbox::{ParamMailbox, SynthParams};
pub use sequencer::{LocalSequencer, RemoteSequencer, RunState, StepEvent};
pub use serial::{SerialIsr, SerialLink};
pub use table::{ProgramTable, StepAction, LOCAL_PROGRAMS, REMOTE_PROGRAMS};
