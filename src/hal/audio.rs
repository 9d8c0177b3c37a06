//! PWM output configuration for the sawtooth DAC and the level mirror.

/// PWM output configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmConfig {
    /// Carrier frequency in Hz.
    pub carrier_hz: u32,
    /// Duty resolution in bits. Levels are 8-bit.
    pub resolution_bits: u8,
    /// Sample update rate in Hz (audio timer).
    pub update_hz: u32,
}

impl PwmConfig {
    /// Audio DAC: carrier well above the sample rate.
    pub const fn audio(sample_rate_hz: u32) -> Self {
        Self {
            carrier_hz: 150_000,
            resolution_bits: 8,
            update_hz: sample_rate_hz,
        }
    }

    /// Level mirror: updated only when a byte is forwarded.
    pub const fn mirror() -> Self {
        Self {
            carrier_hz: 31_250,
            resolution_bits: 8,
            update_hz: 0,
        }
    }

    /// Duty register value for an 8-bit level.
    #[inline]
    pub fn duty_for(&self, level: u8) -> u32 {
        if self.resolution_bits >= 8 {
            (level as u32) << (self.resolution_bits - 8)
        } else {
            (level as u32) >> (8 - self.resolution_bits)
        }
    }
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self::audio(37_500)
    }
}
