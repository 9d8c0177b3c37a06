//! Bit timing math for the software serial channel.
//!
//! The transmit contract is "each bit is held for `bit_ns` within tolerance".
//! How the platform meets that (spin loop, timer compare, DMA) is up to the
//! [`embedded_hal::delay::DelayNs`] implementation handed to the transmitter.

/// Default receiver tolerance: 2% (20 000 ppm).
pub const DEFAULT_TOLERANCE_PPM: u32 = 20_000;

/// Bits per frame on the wire: start + 8 data + 1 stop.
pub const FRAME_BITS: u32 = 10;

/// Bit period derived from a clock and a target baud.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitTiming {
    /// Target baud rate
    pub baud: u32,
    /// Whole clock cycles per bit (rounded)
    pub cycles_per_bit: u32,
    /// Bit period in nanoseconds (rounded)
    pub bit_ns: u32,
    /// Relative error of the achieved baud rate, ppm
    pub error_ppm: u32,
}

impl BitTiming {
    /// Compute timing for `baud` on a `clock_hz` instruction clock.
    ///
    /// 38 400 baud at 9.6 MHz gives 250 cycles/bit, 0 ppm.
    pub const fn new(clock_hz: u32, baud: u32) -> Self {
        if baud == 0 || clock_hz == 0 {
            return Self {
                baud,
                cycles_per_bit: 0,
                bit_ns: 0,
                error_ppm: u32::MAX,
            };
        }

        let cycles = (clock_hz as u64 + baud as u64 / 2) / baud as u64;
        let cycles = if cycles == 0 { 1 } else { cycles };

        // achieved bit time vs ideal, both in clock cycles scaled by baud
        let ideal = clock_hz as u64;
        let actual = cycles * baud as u64;
        let diff = if actual > ideal { actual - ideal } else { ideal - actual };
        let error_ppm = (diff * 1_000_000 / ideal) as u32;

        let bit_ns = ((1_000_000_000u64 + baud as u64 / 2) / baud as u64) as u32;

        Self {
            baud,
            cycles_per_bit: cycles as u32,
            bit_ns,
            error_ppm,
        }
    }

    /// Full frame duration in nanoseconds.
    #[inline]
    pub const fn frame_ns(&self) -> u32 {
        self.bit_ns * FRAME_BITS
    }

    /// Check against a receiver tolerance in ppm.
    #[inline]
    pub const fn within_tolerance(&self, tolerance_ppm: u32) -> bool {
        self.error_ppm <= tolerance_ppm
    }
}

/// Error between an oversampling interrupt rate and `baud * oversample`, ppm.
pub const fn oversample_error_ppm(tick_hz: u32, baud: u32, oversample: u8) -> u32 {
    let target = baud as u64 * oversample as u64;
    if target == 0 {
        return u32::MAX;
    }
    let tick = tick_hz as u64;
    let diff = if tick > target { tick - target } else { target - tick };
    (diff * 1_000_000 / target) as u32
}
