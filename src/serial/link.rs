//! Interrupt-driven serial transceiver.
//!
//! ```text
//! serial ISR (every 1/oversample bit)          poll loop
//! ───────────────────────────────────          ─────────
//! SerialIsr::tick(rx_level) ─▶ RxChannel ────▶ has_new_data() / read_byte()
//!                  ▲
//!                  └──────────── TxSlot ◀───── send(byte)
//! ```
//!
//! The receive side publishes with a single rule: data byte first, then the
//! toggle flip (`Release`). The poller observes the toggle (`Acquire`) before
//! reading the byte, so it never sees a half-updated value.

use core::cell::Cell;
use core::sync::atomic::{AtomicU8, Ordering};

use critical_section::Mutex;

use crate::diagnostics::LinkDiagnostics;
use crate::log_globals::ISR_LOG_STREAM;

/// Data bits per frame.
pub const DATA_BITS: u8 = 8;

/// Transmit units clocked per frame: start bit plus eight data bits.
/// The idle level after the last data bit forms the stop bit.
pub const TX_FRAME_UNITS: u8 = DATA_BITS + 1;

/// Toggle bit flipped on every received byte.
pub const RX_TOGGLE_BIT: u8 = 0x10;

/// Single-slot receive channel.
pub struct RxChannel {
    /// Last complete byte
    byte: AtomicU8,
    /// Toggle bit, flipped by the ISR after `byte` is written
    status: AtomicU8,
    /// Toggle value the poller last acknowledged
    read_toggle: AtomicU8,
}

impl RxChannel {
    pub const fn new() -> Self {
        Self {
            byte: AtomicU8::new(0),
            status: AtomicU8::new(0),
            read_toggle: AtomicU8::new(0),
        }
    }

    /// Publish a received byte (ISR only).
    ///
    /// Returns `true` if the previous byte was never read.
    #[inline]
    pub fn commit(&self, byte: u8) -> bool {
        let status = self.status.load(Ordering::Relaxed);
        let unread = status != self.read_toggle.load(Ordering::Relaxed);
        self.byte.store(byte, Ordering::Relaxed);
        self.status.store(status ^ RX_TOGGLE_BIT, Ordering::Release);
        unread
    }

    /// Current toggle bit.
    #[inline]
    pub fn toggle(&self) -> u8 {
        self.status.load(Ordering::Acquire) & RX_TOGGLE_BIT
    }

    /// True if a byte landed since the last [`read_byte`](Self::read_byte).
    #[inline]
    pub fn has_new_data(&self) -> bool {
        self.toggle() != self.read_toggle.load(Ordering::Relaxed)
    }

    /// Read and acknowledge the latest byte.
    #[inline]
    pub fn read_byte(&self) -> u8 {
        loop {
            let before = self.status.load(Ordering::Acquire);
            let byte = self.byte.load(Ordering::Acquire);
            // A frame is hundreds of ticks long; a second flip cannot land here
            if self.status.load(Ordering::Acquire) == before {
                self.read_toggle.store(before, Ordering::Relaxed);
                return byte;
            }
        }
    }

    /// Latest byte without acknowledging it.
    #[inline]
    pub fn peek(&self) -> u8 {
        self.byte.load(Ordering::Acquire)
    }

    /// Forget everything (both sides idle).
    pub fn reset(&self) {
        self.byte.store(0, Ordering::Relaxed);
        self.status.store(0, Ordering::Relaxed);
        self.read_toggle.store(0, Ordering::Relaxed);
    }
}

impl Default for RxChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Pending transmit request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TxFrame {
    byte: u8,
    remaining: u8,
}

/// Transmit handoff: byte and unit count always change together.
pub struct TxSlot {
    frame: Mutex<Cell<TxFrame>>,
}

impl TxSlot {
    pub const fn new() -> Self {
        Self {
            frame: Mutex::new(Cell::new(TxFrame {
                byte: 0,
                remaining: 0,
            })),
        }
    }

    /// Queue a byte. Replaces any frame still being shifted out.
    #[inline]
    pub fn send(&self, byte: u8) {
        critical_section::with(|cs| {
            self.frame.borrow(cs).set(TxFrame {
                byte,
                remaining: TX_FRAME_UNITS,
            })
        });
    }

    /// True while start or data bits remain.
    #[inline]
    pub fn is_busy(&self) -> bool {
        critical_section::with(|cs| self.frame.borrow(cs).get().remaining > 0)
    }

    /// Byte of the current or last frame.
    #[inline]
    pub fn byte(&self) -> u8 {
        critical_section::with(|cs| self.frame.borrow(cs).get().byte)
    }

    /// Advance one bit slot (ISR only).
    ///
    /// Returns the line level for this slot and whether the last data bit
    /// was just emitted. `None` means idle (line high).
    #[inline]
    fn shift(&self) -> Option<(bool, bool)> {
        critical_section::with(|cs| {
            let cell = self.frame.borrow(cs);
            let mut frame = cell.get();
            let level = match frame.remaining {
                0 => return None,
                n if n > DATA_BITS => false,
                n => frame.byte & (1 << (DATA_BITS - n)) != 0,
            };
            frame.remaining -= 1;
            cell.set(frame);
            Some((level, frame.remaining == 0))
        })
    }

    fn clear(&self) {
        critical_section::with(|cs| {
            self.frame.borrow(cs).set(TxFrame {
                byte: 0,
                remaining: 0,
            })
        });
    }
}

impl Default for TxSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything both contexts of the serial channel share.
pub struct SerialLink {
    pub rx: RxChannel,
    pub tx: TxSlot,
    pub diagnostics: LinkDiagnostics,
}

impl SerialLink {
    pub const fn new() -> Self {
        Self {
            rx: RxChannel::new(),
            tx: TxSlot::new(),
            diagnostics: LinkDiagnostics::new(),
        }
    }

    /// Reset both directions to idle.
    pub fn initialize(&self) {
        self.rx.reset();
        self.tx.clear();
        self.diagnostics.clear();
    }

    /// Queue a byte for the interrupt-driven transmitter.
    #[inline]
    pub fn send(&self, byte: u8) {
        self.tx.send(byte);
    }

    #[inline]
    pub fn has_new_data(&self) -> bool {
        self.rx.has_new_data()
    }

    #[inline]
    pub fn read_byte(&self) -> u8 {
        self.rx.read_byte()
    }
}

impl Default for SerialLink {
    fn default() -> Self {
        Self::new()
    }
}

/// Serial interrupt state (owned by the serial-rate timer interrupt).
///
/// Receiver: idle until a low sample, then waits `oversample * 3 / 2` ticks
/// to land mid-way into data bit 0, then samples every `oversample` ticks.
/// A low stop bit is re-sampled every bit period until the line goes high.
pub struct SerialIsr {
    oversample: u8,
    first_interval: u16,
    stop_bits: u8,
    loopback: bool,

    /// 0 = idle, 1..=8 = next data bit, 9.. = stop bits
    rx_counter: u8,
    rx_interval: u16,
    rx_shift: u8,

    tx_interval: u16,
    tx_level: bool,

    /// Ticks since reset, used as log timestamp
    ticks: u32,
}

impl SerialIsr {
    /// Create transceiver state for `oversample` ticks per bit.
    ///
    /// Oversampling below 4 is raised to 4, stop bits below 1 to 1.
    pub const fn new(oversample: u8, stop_bits: u8) -> Self {
        let oversample = if oversample < 4 { 4 } else { oversample };
        let stop_bits = if stop_bits == 0 { 1 } else { stop_bits };
        Self {
            oversample,
            first_interval: oversample as u16 + (oversample / 2) as u16,
            stop_bits,
            loopback: false,
            rx_counter: 0,
            rx_interval: 0,
            rx_shift: 0,
            tx_interval: oversample as u16,
            tx_level: true,
            ticks: 0,
        }
    }

    /// Echo every received byte back out (wiring test mode).
    pub const fn with_loopback(mut self) -> Self {
        self.loopback = true;
        self
    }

    /// Ticks per bit.
    #[inline]
    pub fn oversample(&self) -> u8 {
        self.oversample
    }

    /// True while a receive frame is in progress.
    #[inline]
    pub fn is_receiving(&self) -> bool {
        self.rx_counter != 0
    }

    /// Current transmit line level.
    #[inline]
    pub fn tx_level(&self) -> bool {
        self.tx_level
    }

    /// One timer tick: sample `rx_high`, return the transmit line level.
    #[inline]
    pub fn tick(&mut self, link: &SerialLink, rx_high: bool) -> bool {
        self.ticks = self.ticks.wrapping_add(1);
        self.tick_rx(link, rx_high);
        self.tick_tx(link);
        self.tx_level
    }

    fn tick_rx(&mut self, link: &SerialLink, rx_high: bool) {
        if self.rx_counter == 0 {
            if !rx_high {
                self.rx_counter = 1;
                self.rx_interval = self.first_interval;
                self.rx_shift = 0;
            }
            return;
        }

        self.rx_interval -= 1;
        if self.rx_interval != 0 {
            return;
        }
        self.rx_interval = self.oversample as u16;

        if self.rx_counter <= DATA_BITS {
            self.rx_shift |= (rx_high as u8) << (self.rx_counter - 1);
            self.rx_counter += 1;
        } else if rx_high {
            if self.rx_counter - DATA_BITS >= self.stop_bits {
                if link.rx.commit(self.rx_shift) {
                    link.diagnostics.record_rx_overwritten();
                    crate::rt_warn!(ISR_LOG_STREAM, self.ticks, "rx overwrite {:#04x}", self.rx_shift);
                }
                link.diagnostics.record_frame_received();
                self.rx_counter = 0;
                if self.loopback {
                    link.tx.send(self.rx_shift);
                }
            } else {
                self.rx_counter += 1;
            }
        } else {
            link.diagnostics.record_stop_bit_stretch();
            crate::rt_trace!(ISR_LOG_STREAM, self.ticks, "stop bit low");
        }
    }

    fn tick_tx(&mut self, link: &SerialLink) {
        self.tx_interval -= 1;
        if self.tx_interval != 0 {
            return;
        }
        self.tx_interval = self.oversample as u16;

        match link.tx.shift() {
            Some((level, last)) => {
                self.tx_level = level;
                if last {
                    link.diagnostics.record_frame_sent();
                }
            }
            None => {
                self.tx_level = true;
                self.tx_interval += (self.stop_bits as u16 - 1) * self.oversample as u16;
            }
        }
    }
}
