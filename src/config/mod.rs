//! Module: config
//!
//! Purpose: Configuration system for RtStepSequencer.
//!
//! Architecture:
//! - `EngineConfig`: compile-time board presets (clock, rates, intervals, trim)
//! - `RuntimeConfig`: lock-free knobs the main loop may change while running
//! - `CONFIG`: global runtime instance, generation-stamped like a register bank
//!
//! Safety: RT-safe. Runtime access via atomics, no locks.

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};

use crate::serial::timing::{oversample_error_ppm, BitTiming, DEFAULT_TOLERANCE_PPM};

/// Start flag inside a command byte (bit 3).
pub const START_BIT: u8 = 0x08;

/// Program select field inside a command byte (bits 2:0).
pub const PROGRAM_MASK: u8 = 0x07;

/// Default device group bits ('P' = 0x50 stops, 'X'/'Y' start).
pub const DEFAULT_GROUP_BITS: u8 = 0x50;

/// Configuration errors detected by [`EngineConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Clock or sample rate is zero
    ZeroRate,
    /// Baud rate is zero
    ZeroBaud,
    /// Oversampling below 4 cannot find the bit center
    OversampleTooLow(u8),
    /// At least one stop bit is required
    NoStopBit,
    /// Step interval of zero samples
    ZeroInterval,
    /// Bit timing error above tolerance (ppm)
    BaudError(u32),
}

impl ConfigError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ZeroRate => "C01",
            Self::ZeroBaud => "C02",
            Self::OversampleTooLow(_) => "C03",
            Self::NoStopBit => "C04",
            Self::ZeroInterval => "C05",
            Self::BaudError(_) => "C06",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::ZeroRate => "clock and sample rate must be non-zero",
            Self::ZeroBaud => "baud rate must be non-zero",
            Self::OversampleTooLow(_) => "oversampling must be at least 4",
            Self::NoStopBit => "at least one stop bit required",
            Self::ZeroInterval => "step interval must be non-zero",
            Self::BaudError(_) => "bit timing outside tolerance",
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OversampleTooLow(n) => write!(f, "{}: {} (got {})", self.code(), self.message(), n),
            Self::BaudError(ppm) => write!(f, "{}: {} ({} ppm)", self.code(), self.message(), ppm),
            _ => write!(f, "{}: {}", self.code(), self.message()),
        }
    }
}

/// Static board configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Instruction clock in Hz.
    pub clock_hz: u32,
    /// Audio/PWM interrupt rate in Hz.
    pub sample_rate_hz: u32,
    /// Serial sampling interrupt rate in Hz (0 = no interrupt-driven serial).
    pub serial_tick_hz: u32,
    /// Serial baud rate.
    pub baud: u32,
    /// Serial ticks per bit.
    pub oversample: u8,
    /// Stop bits per frame.
    pub stop_bits: u8,
    /// Audio samples per sequencer step.
    pub step_interval: u16,
    /// Consecutive equal polls before a selector change is accepted.
    pub debounce_polls: u16,
    /// Polls the tempo button must stay pressed per tempo step.
    pub tempo_debounce_polls: u16,
    /// Device group bits matched in command bytes.
    pub group_bits: u8,
    /// Compile-time clock trim offset for this board.
    pub trim_offset: i8,
}

impl EngineConfig {
    /// Locally clocked audio sequencer: 9.6 MHz, 37 500 Hz PWM, ~8 steps/s.
    pub const LOCAL_ATTINY13: Self = Self {
        clock_hz: 9_600_000,
        sample_rate_hz: 37_500,
        serial_tick_hz: 0,
        baud: 38_400,
        oversample: 8,
        stop_bits: 1,
        step_interval: 4687,
        debounce_polls: 250,
        tempo_debounce_polls: 2500,
        group_bits: DEFAULT_GROUP_BITS,
        trim_offset: 3,
    };

    /// Remotely clocked serial sequencer: 16 MHz, 9615 Hz serial tick, 1200 baud.
    pub const REMOTE_ATTINY85: Self = Self {
        clock_hz: 16_000_000,
        sample_rate_hz: 31_372,
        serial_tick_hz: 9615,
        baud: 1200,
        oversample: 8,
        stop_bits: 1,
        step_interval: 3906,
        debounce_polls: 250,
        tempo_debounce_polls: 2500,
        group_bits: DEFAULT_GROUP_BITS,
        trim_offset: -4,
    };

    /// Check rates and serial timing against the receiver tolerance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock_hz == 0 || self.sample_rate_hz == 0 {
            return Err(ConfigError::ZeroRate);
        }
        if self.baud == 0 {
            return Err(ConfigError::ZeroBaud);
        }
        if self.oversample < 4 {
            return Err(ConfigError::OversampleTooLow(self.oversample));
        }
        if self.stop_bits == 0 {
            return Err(ConfigError::NoStopBit);
        }
        if self.step_interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        let timing = BitTiming::new(self.clock_hz, self.baud);
        if !timing.within_tolerance(DEFAULT_TOLERANCE_PPM) {
            return Err(ConfigError::BaudError(timing.error_ppm));
        }

        if self.serial_tick_hz != 0 {
            let ppm = oversample_error_ppm(self.serial_tick_hz, self.baud, self.oversample);
            if ppm > DEFAULT_TOLERANCE_PPM {
                return Err(ConfigError::BaudError(ppm));
            }
        }

        Ok(())
    }

    /// Bit timing for the blocking transmitter.
    pub fn bit_timing(&self) -> BitTiming {
        BitTiming::new(self.clock_hz, self.baud)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::LOCAL_ATTINY13
    }
}

/// Runtime-adjustable parameters.
///
/// Written by the main loop (console, buttons), read by the poll loop.
/// Every setter bumps `generation` so readers can cheaply detect changes.
pub struct RuntimeConfig {
    step_interval: AtomicU16,
    group_bits: AtomicU8,
    fine_tune_enabled: AtomicBool,
    generation: AtomicU16,
}

impl RuntimeConfig {
    /// Create runtime config from a board preset.
    pub const fn new(base: &EngineConfig) -> Self {
        Self {
            step_interval: AtomicU16::new(base.step_interval),
            group_bits: AtomicU8::new(base.group_bits),
            fine_tune_enabled: AtomicBool::new(true),
            generation: AtomicU16::new(0),
        }
    }

    /// Reload all fields from a preset.
    pub fn apply(&self, base: &EngineConfig) {
        self.step_interval.store(base.step_interval, Ordering::Relaxed);
        self.group_bits.store(base.group_bits, Ordering::Relaxed);
        self.bump();
    }

    #[inline]
    pub fn step_interval(&self) -> u16 {
        self.step_interval.load(Ordering::Relaxed)
    }

    /// Set samples per step. Zero is ignored.
    pub fn set_step_interval(&self, samples: u16) {
        if samples == 0 {
            return;
        }
        self.step_interval.store(samples, Ordering::Relaxed);
        self.bump();
    }

    #[inline]
    pub fn group_bits(&self) -> u8 {
        self.group_bits.load(Ordering::Relaxed)
    }

    pub fn set_group_bits(&self, bits: u8) {
        // Start flag and program field are not group bits
        self.group_bits.store(bits & !(START_BIT | PROGRAM_MASK), Ordering::Relaxed);
        self.bump();
    }

    #[inline]
    pub fn fine_tune_enabled(&self) -> bool {
        self.fine_tune_enabled.load(Ordering::Relaxed)
    }

    pub fn set_fine_tune_enabled(&self, enabled: bool) {
        self.fine_tune_enabled.store(enabled, Ordering::Relaxed);
        self.bump();
    }

    /// Current generation number.
    #[inline]
    pub fn generation(&self) -> u16 {
        self.generation.load(Ordering::Acquire)
    }

    #[inline]
    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::Release);
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(&EngineConfig::LOCAL_ATTINY13)
    }
}

/// Global runtime configuration.
pub static CONFIG: RuntimeConfig = RuntimeConfig::new(&EngineConfig::LOCAL_ATTINY13);
