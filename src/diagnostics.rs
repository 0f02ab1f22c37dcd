//! Diagnostic events emitted by the demuxer.
//!
//! Every open, close, stream discovery, seek, end of stream and failure is
//! reported as a one-line [`DiagnosticEvent`] to a [`DiagnosticSink`]. The
//! default sink, [`LogSink`], forwards to the [`log`] crate so any standard
//! subscriber (`env_logger`, `tracing-log`, ...) picks the events up.
//! Inject your own sink through
//! [`DemuxOptions::with_diagnostics`](crate::DemuxOptions::with_diagnostics)
//! to capture events in tests or route them elsewhere.
//!
//! Sinks observe only. Nothing they do can change what the demuxer returns.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use streamdemux::{DemuxOptions, DiagnosticEvent, DiagnosticSink, Level};
//!
//! struct StderrSink;
//!
//! impl DiagnosticSink for StderrSink {
//!     fn on_event(&self, event: &DiagnosticEvent) {
//!         if event.level >= Level::Warn {
//!             eprintln!("{event}");
//!         }
//!     }
//! }
//!
//! let options = DemuxOptions::new().with_diagnostics(Arc::new(StderrSink));
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Fine-grained tracing.
    Debug,
    /// Lifecycle milestones.
    Info,
    /// Something unusual that is not a failure (e.g. a missing stream kind).
    Warn,
    /// An operation failed.
    Error,
    /// An unrecoverable condition.
    Fatal,
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        };
        f.write_str(name)
    }
}

/// A single diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    /// Severity.
    pub level: Level,
    /// Human-readable message, without a trailing newline.
    pub message: String,
}

impl Display for DiagnosticEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Receiver for diagnostic events.
///
/// Implementations must be [`Send`] and [`Sync`] so a sink can be shared
/// between demuxers running on different threads.
pub trait DiagnosticSink: Send + Sync {
    /// Called once per event, synchronously, on the demuxer's thread.
    fn on_event(&self, event: &DiagnosticEvent);
}

/// Forwards events to the [`log`] crate under the `streamdemux` target.
///
/// This is the default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn on_event(&self, event: &DiagnosticEvent) {
        match event.level {
            Level::Debug => log::debug!("{}", event.message),
            Level::Info => log::info!("{}", event.message),
            Level::Warn => log::warn!("{}", event.message),
            Level::Error => log::error!("{}", event.message),
            Level::Fatal => log::error!("FATAL: {}", event.message),
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl DiagnosticSink for NoOpSink {
    fn on_event(&self, _event: &DiagnosticEvent) {}
}
