//! Blocking, transmit-only software serial.
//!
//! The caller is blocked for the whole frame (~260 µs at 38 400 baud).
//! Interrupts keep firing meanwhile; only the bit edges on this line are
//! owned by the caller.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use super::link::DATA_BITS;
use super::timing::BitTiming;

/// Bit-banged transmitter on a single output line.
pub struct BlockingTx<P, D> {
    pin: P,
    delay: D,
    bit_ns: u32,
}

impl<P: OutputPin, D: DelayNs> BlockingTx<P, D> {
    /// Create a transmitter holding each bit for `timing.bit_ns`.
    pub fn new(pin: P, delay: D, timing: BitTiming) -> Self {
        Self {
            pin,
            delay,
            bit_ns: timing.bit_ns,
        }
    }

    /// Drive the line to its idle (high) level.
    pub fn initialize(&mut self) -> Result<(), P::Error> {
        self.pin.set_high()
    }

    /// Send one frame: start bit, 8 data bits LSB first, stop bit.
    pub fn send(&mut self, byte: u8) -> Result<(), P::Error> {
        self.pin.set_low()?;
        self.delay.delay_ns(self.bit_ns);

        for bit in 0..DATA_BITS {
            if byte & (1 << bit) != 0 {
                self.pin.set_high()?;
            } else {
                self.pin.set_low()?;
            }
            self.delay.delay_ns(self.bit_ns);
        }

        self.pin.set_high()?;
        self.delay.delay_ns(self.bit_ns);
        Ok(())
    }

    /// Send a run of bytes back to back.
    pub fn send_all(&mut self, bytes: &[u8]) -> Result<(), P::Error> {
        for &byte in bytes {
            self.send(byte)?;
        }
        Ok(())
    }

    /// Bit period in nanoseconds.
    #[inline]
    pub fn bit_ns(&self) -> u32 {
        self.bit_ns
    }

    /// Give the pin and delay back.
    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }
}
