//! Software serial channel tests: blocking transmitter into the
//! oversampling receiver, ISR-to-ISR links, framing edge cases.

use std::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use rt_step_sequencer::serial::{BitTiming, BlockingTx, SerialIsr, SerialLink, TX_FRAME_UNITS};

const OVERSAMPLE: u8 = 8;

/// Records every level change with its time.
#[derive(Default)]
struct Wire {
    now_ns: u64,
    edges: Vec<(u64, bool)>,
}

impl Wire {
    /// Line level at `t` (idle high before the first edge).
    fn level_at(&self, t: u64) -> bool {
        self.edges
            .iter()
            .rev()
            .find(|(at, _)| *at <= t)
            .map(|(_, level)| *level)
            .unwrap_or(true)
    }
}

struct FakePin<'a>(&'a std::cell::RefCell<Wire>);

impl ErrorType for FakePin<'_> {
    type Error = Infallible;
}

impl OutputPin for FakePin<'_> {
    fn set_low(&mut self) -> Result<(), Infallible> {
        let mut w = self.0.borrow_mut();
        let now = w.now_ns;
        w.edges.push((now, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut w = self.0.borrow_mut();
        let now = w.now_ns;
        w.edges.push((now, true));
        Ok(())
    }
}

struct FakeDelay<'a>(&'a std::cell::RefCell<Wire>);

impl DelayNs for FakeDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().now_ns += ns as u64;
    }
}

/// Sample `wire` at `OVERSAMPLE` ticks per bit into a receiver.
fn receive(wire: &Wire, bit_ns: u32, corrupt: impl Fn(u64, bool) -> bool) -> (SerialLink, Vec<u8>) {
    let link = SerialLink::new();
    let mut isr = SerialIsr::new(OVERSAMPLE, 1);
    let mut bytes = Vec::new();

    let end = wire.now_ns + 4 * bit_ns as u64;
    let mut k = 0u64;
    loop {
        let t = k * bit_ns as u64 / OVERSAMPLE as u64;
        if t > end {
            break;
        }
        isr.tick(&link, corrupt(t, wire.level_at(t)));
        if link.has_new_data() {
            bytes.push(link.read_byte());
        }
        k += 1;
    }
    (link, bytes)
}

fn transmit(bytes: &[u8], timing: BitTiming) -> Wire {
    let wire = std::cell::RefCell::new(Wire::default());
    {
        let mut tx = BlockingTx::new(FakePin(&wire), FakeDelay(&wire), timing);
        tx.initialize().unwrap();
        // idle before the first start bit
        FakeDelay(&wire).delay_ns(3 * timing.bit_ns);
        tx.send_all(bytes).unwrap();
    }
    wire.into_inner()
}

#[test]
fn test_blocking_frame_shape() {
    let timing = BitTiming::new(9_600_000, 38_400);
    let wire = transmit(&[0xA5], timing);

    // initialize, start, 8 data bits, stop
    assert_eq!(wire.edges.len(), 1 + 1 + 8 + 1);
    assert!(!wire.edges[1].1, "start bit is low");
    let data: Vec<bool> = wire.edges[2..10].iter().map(|e| e.1).collect();
    // 0xA5 LSB first
    assert_eq!(data, [true, false, true, false, false, true, false, true]);
    assert!(wire.edges[10].1, "stop bit is high");
    assert_eq!(wire.now_ns, 13 * timing.bit_ns as u64);
}

#[test]
fn test_blocking_into_oversampled_receiver() {
    let timing = BitTiming::new(9_600_000, 38_400);
    let wire = transmit(&[0xA5], timing);

    let (link, bytes) = receive(&wire, timing.bit_ns, |_, level| level);
    assert_eq!(bytes, [0xA5]);
    assert_eq!(link.diagnostics.snapshot().frames_received, 1);
}

#[test]
fn test_back_to_back_frames() {
    let timing = BitTiming::new(16_000_000, 1_200);
    let message = b"Type X";
    let wire = transmit(message, timing);

    let (_, bytes) = receive(&wire, timing.bit_ns, |_, level| level);
    assert_eq!(bytes, message);
}

#[test]
fn test_single_bit_corruption_is_delivered() {
    let timing = BitTiming::new(9_600_000, 38_400);
    let wire = transmit(&[0xA5], timing);

    // start bit begins after 3 idle bits; invert data bit 3
    let bit = timing.bit_ns as u64;
    let start = 3 * bit;
    let (lo, hi) = (start + 4 * bit, start + 5 * bit);
    let (link, bytes) = receive(&wire, timing.bit_ns, |t, level| {
        if t >= lo && t < hi {
            !level
        } else {
            level
        }
    });

    // no parity, no CRC: the wrong byte arrives as a normal frame
    assert_eq!(bytes, [0xA5 ^ 0x08]);
    assert_eq!(link.diagnostics.snapshot().frames_received, 1);
}

#[test]
fn test_isr_to_isr_link() {
    let a = SerialLink::new();
    let b = SerialLink::new();
    let mut isr_a = SerialIsr::new(OVERSAMPLE, 1);
    let mut isr_b = SerialIsr::new(OVERSAMPLE, 1);
    a.initialize();
    b.initialize();

    a.send(0x3C);
    assert!(a.tx.is_busy());

    let mut line_a = true;
    let mut line_b = true;
    let mut got = None;
    for _ in 0..OVERSAMPLE as usize * 16 {
        line_a = isr_a.tick(&a, line_b);
        line_b = isr_b.tick(&b, line_a);
        if b.has_new_data() {
            got = Some(b.read_byte());
        }
    }

    assert_eq!(got, Some(0x3C));
    assert!(!a.tx.is_busy());
    assert_eq!(a.diagnostics.snapshot().frames_sent, 1);
    assert_eq!(b.diagnostics.snapshot().frames_received, 1);
}

#[test]
fn test_transmit_unit_count() {
    let link = SerialLink::new();
    let mut isr = SerialIsr::new(OVERSAMPLE, 1);
    link.send(0xFF);

    // count low units: only the start bit for 0xFF
    let mut lows = 0;
    let mut units = 0;
    for tick in 1..=(OVERSAMPLE as usize * 12) {
        let level = isr.tick(&link, true);
        if tick % OVERSAMPLE as usize == 0 {
            units += 1;
            if !level {
                lows += 1;
            }
        }
    }
    assert_eq!(TX_FRAME_UNITS, 9);
    assert_eq!(lows, 1);
    assert!(units >= TX_FRAME_UNITS as usize);
    assert!(isr.tx_level(), "line idles high after the frame");
}

#[test]
fn test_low_stop_bit_stretches() {
    let link = SerialLink::new();
    let mut isr = SerialIsr::new(OVERSAMPLE, 1);
    let n = OVERSAMPLE as usize;

    // start + 8 zero bits + 3 more low bits, then high
    for _ in 0..12 * n {
        isr.tick(&link, false);
    }
    assert!(!link.has_new_data(), "frame held while stop bit is low");
    assert!(isr.is_receiving());

    for _ in 0..2 * n {
        isr.tick(&link, true);
    }
    assert!(link.has_new_data());
    assert_eq!(link.read_byte(), 0x00);
    assert!(link.diagnostics.snapshot().stop_bit_stretch >= 2);
}

#[test]
fn test_unread_byte_overwritten() {
    let a = SerialLink::new();
    let b = SerialLink::new();
    let mut isr_a = SerialIsr::new(OVERSAMPLE, 1);
    let mut isr_b = SerialIsr::new(OVERSAMPLE, 1);

    let mut line = true;
    for byte in [0x11u8, 0x22] {
        a.send(byte);
        for _ in 0..OVERSAMPLE as usize * 14 {
            line = isr_a.tick(&a, true);
            isr_b.tick(&b, line);
        }
    }

    // two flips cancel: the poller sees nothing new, the byte is the last one
    assert!(!b.has_new_data());
    assert_eq!(b.rx.peek(), 0x22);
    assert_eq!(b.diagnostics.snapshot().rx_overwritten, 1);
    assert!(line);
}

#[test]
fn test_loopback_echoes() {
    let host = SerialLink::new();
    let dut = SerialLink::new();
    let mut host_isr = SerialIsr::new(OVERSAMPLE, 1);
    let mut dut_isr = SerialIsr::new(OVERSAMPLE, 1).with_loopback();

    host.send(0x5A);
    let mut host_line = true;
    let mut dut_line = true;
    let mut echoed = None;
    for _ in 0..OVERSAMPLE as usize * 30 {
        host_line = host_isr.tick(&host, dut_line);
        dut_line = dut_isr.tick(&dut, host_line);
        if host.has_new_data() {
            echoed = Some(host.read_byte());
        }
    }
    assert_eq!(echoed, Some(0x5A));
}
