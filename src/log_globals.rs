//! Global log stream instances.
//!
//! One stream per execution context: interrupt handlers push to
//! [`ISR_LOG_STREAM`], the poll loop pushes to [`POLL_LOG_STREAM`].

use crate::logging::LogStream;

/// Interrupt-context log stream (serial/audio ISR).
pub static ISR_LOG_STREAM: LogStream = LogStream::new();

/// Poll-loop log stream (sequencer decisions, config changes).
pub static POLL_LOG_STREAM: LogStream = LogStream::new();
