//! Log drain: formats queued entries onto any `core::fmt::Write` sink.
//!
//! On the host the sink is stdout; on target it is the console UART.
//! The interrupt stream is drained first, then the poll stream, then a
//! dropped-message report if either ring overflowed.

use core::fmt::Write;

use crate::logging::{BufWriter, LogEntry, LogStream};

/// Formatted line length upper bound.
pub const LINE_LEN: usize = 96;

/// Format log entry as `[timestamp] LEVEL: message\n`.
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let mut writer = BufWriter { buf, pos: 0 };
    let _ = write!(
        writer,
        "[{:10}] {}: {}\n",
        entry.timestamp,
        entry.level.as_str(),
        entry.message()
    );
    writer.pos
}

/// Drain both streams into `out`. Returns the number of entries written.
pub fn drain_to<W: Write, const N: usize>(
    isr: &LogStream<N>,
    poll: &LogStream<N>,
    out: &mut W,
) -> Result<usize, core::fmt::Error> {
    let mut line = [0u8; LINE_LEN];
    let mut written = 0;

    for stream in [isr, poll] {
        while let Some(entry) = stream.drain() {
            let len = format_log_entry(&entry, &mut line);
            out.write_str(core::str::from_utf8(&line[..len]).map_err(|_| core::fmt::Error)?)?;
            written += 1;
        }
    }

    let isr_dropped = isr.dropped();
    let poll_dropped = poll.dropped();
    if isr_dropped > 0 || poll_dropped > 0 {
        writeln!(out, "[WARN] Dropped: ISR={}, POLL={}", isr_dropped, poll_dropped)?;
        isr.reset_dropped();
        poll.reset_dropped();
    }

    Ok(written)
}

/// Drain the global streams.
pub fn drain_globals<W: Write>(out: &mut W) -> Result<usize, core::fmt::Error> {
    drain_to(&crate::ISR_LOG_STREAM, &crate::POLL_LOG_STREAM, out)
}
