//! Hardware Abstraction Layer for the step sequencer.
//!
//! Thin seams between sequencing logic and the chip.
//! Business logic stays in core modules, HAL is just I/O.
//!
//! - Pin levels and bit delays go through `embedded-hal` traits
//! - The oscillator trim goes through [`ClockTrim`]

pub mod audio;
pub mod gpio;

pub use audio::PwmConfig;
pub use gpio::PinMap;

/// Writable oscillator trim register.
///
/// Every timer on the chip derives from this clock, so a write moves
/// audio pitch, step tempo and serial bit timing together.
pub trait ClockTrim {
    /// Factory calibration value read at reset.
    fn factory(&self) -> u8;

    /// Current register value.
    fn read(&self) -> u8;

    /// Write a new register value.
    fn write(&mut self, value: u8);
}

/// Host-side trim register.
///
/// Models the trim as a linear clock offset of `step_ppm` per count
/// away from the factory value. Both simulated timers read
/// [`SimTrim::scaled_hz`], so they drift together like on silicon.
#[derive(Debug, Clone)]
pub struct SimTrim {
    factory: u8,
    value: u8,
    step_ppm: i32,
    writes: u32,
}

impl SimTrim {
    /// Default trim slope: roughly 0.4% per count.
    pub const DEFAULT_STEP_PPM: i32 = 4_000;

    pub const fn new(factory: u8) -> Self {
        Self {
            factory,
            value: factory,
            step_ppm: Self::DEFAULT_STEP_PPM,
            writes: 0,
        }
    }

    /// Number of register writes so far.
    pub fn writes(&self) -> u32 {
        self.writes
    }

    /// Clock offset from nominal in ppm.
    pub fn offset_ppm(&self) -> i32 {
        (self.value as i32 - self.factory as i32) * self.step_ppm
    }

    /// `nominal_hz` after the trim offset.
    pub fn scaled_hz(&self, nominal_hz: u32) -> u32 {
        let scaled = nominal_hz as i64 * (1_000_000 + self.offset_ppm() as i64) / 1_000_000;
        scaled.max(1) as u32
    }
}

impl ClockTrim for SimTrim {
    fn factory(&self) -> u8 {
        self.factory
    }

    fn read(&self) -> u8 {
        self.value
    }

    fn write(&mut self, value: u8) {
        self.value = value;
        self.writes += 1;
    }
}
