//! Link and sequencer diagnostics.
//!
//! Nothing in this engine is fatal: bad bytes propagate, out-of-range
//! selectors clamp, late bytes overwrite. These counters make those
//! silent paths observable without changing them.
//!
//! Writers are the serial interrupt and the poll loop; readers take a
//! [`DiagnosticsSnapshot`] from any context.

use core::sync::atomic::{AtomicU32, Ordering};

/// Counter set shared between interrupt and poll contexts.
pub struct LinkDiagnostics {
    /// Complete frames received.
    frames_received: AtomicU32,
    /// Bytes that landed before the previous one was read.
    rx_overwritten: AtomicU32,
    /// Stop-bit samples that read low and were re-sampled.
    stop_bit_stretch: AtomicU32,
    /// Frames transmitted.
    frames_sent: AtomicU32,
    /// Program selectors clamped to the bank size.
    program_clamped: AtomicU32,
}

impl LinkDiagnostics {
    pub const fn new() -> Self {
        Self {
            frames_received: AtomicU32::new(0),
            rx_overwritten: AtomicU32::new(0),
            stop_bit_stretch: AtomicU32::new(0),
            frames_sent: AtomicU32::new(0),
            program_clamped: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn record_frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rx_overwritten(&self) {
        self.rx_overwritten.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_stop_bit_stretch(&self) {
        self.stop_bit_stretch.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_frame_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_program_clamped(&self) {
        self.program_clamped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            rx_overwritten: self.rx_overwritten.load(Ordering::Relaxed),
            stop_bit_stretch: self.stop_bit_stretch.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            program_clamped: self.program_clamped.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters (e.g., after reporting).
    pub fn clear(&self) {
        self.frames_received.store(0, Ordering::Relaxed);
        self.rx_overwritten.store(0, Ordering::Relaxed);
        self.stop_bit_stretch.store(0, Ordering::Relaxed);
        self.frames_sent.store(0, Ordering::Relaxed);
        self.program_clamped.store(0, Ordering::Relaxed);
    }
}

impl Default for LinkDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

/// Diagnostics at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub frames_received: u32,
    pub rx_overwritten: u32,
    pub stop_bit_stretch: u32,
    pub frames_sent: u32,
    pub program_clamped: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let diag = LinkDiagnostics::new();
        assert_eq!(diag.snapshot(), DiagnosticsSnapshot::default());

        diag.record_frame_received();
        diag.record_frame_received();
        diag.record_rx_overwritten();
        diag.record_program_clamped();

        let snap = diag.snapshot();
        assert_eq!(snap.frames_received, 2);
        assert_eq!(snap.rx_overwritten, 1);
        assert_eq!(snap.program_clamped, 1);
        assert_eq!(snap.stop_bit_stretch, 0);

        diag.clear();
        assert_eq!(diag.snapshot(), DiagnosticsSnapshot::default());
    }
}
