//! Software-defined serial channel.
//!
//! Two operating modes:
//! - **Blocking transmit** ([`blocking::BlockingTx`]): start bit, 8 data bits
//!   LSB first, stop bit, each held by a deadline-bounded delay. No receive.
//! - **Interrupt-driven half duplex** ([`link::SerialIsr`] + [`link::SerialLink`]):
//!   a periodic timer at `oversample × baud` shifts the transmitter and samples
//!   the receiver. Received bytes land in a single-slot channel with a toggle
//!   bit; there is no queue, a byte arriving before the previous one is read
//!   overwrites it.
//!
//! No parity, no CRC. Corrupted frames are delivered as-is.

pub mod blocking;
pub mod link;
pub mod timing;

pub use blocking::BlockingTx;
pub use link::{RxChannel, SerialIsr, SerialLink, TxSlot, DATA_BITS, TX_FRAME_UNITS};
pub use timing::{BitTiming, DEFAULT_TOLERANCE_PPM};
