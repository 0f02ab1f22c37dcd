//! Demuxer configuration.
//!
//! [`DemuxOptions`] is a builder that threads the diagnostic sink and
//! operational defaults into a [`StreamDemuxer`](crate::StreamDemuxer)
//! without widening every constructor.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use streamdemux::{DemuxOptions, NoOpSink, SeekFlags};
//!
//! let options = DemuxOptions::new()
//!     .with_diagnostics(Arc::new(NoOpSink))
//!     .with_default_seek_flags(SeekFlags::BACKWARD | SeekFlags::ANY)
//!     .with_channel_capacity(16);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, Level, LogSink};
use crate::engine::SeekFlags;

/// Default bounded-channel capacity for the async packet stream.
pub(crate) const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Configuration for a [`StreamDemuxer`](crate::StreamDemuxer).
///
/// A default-constructed value logs through [`LogSink`] and seeks backward
/// to the nearest keyframe.
#[derive(Clone)]
pub struct DemuxOptions {
    /// Where diagnostic events go. Defaults to [`LogSink`].
    pub(crate) diagnostics: Arc<dyn DiagnosticSink>,
    /// Flags used by [`seek_to`](crate::StreamDemuxer::seek_to).
    pub(crate) default_seek_flags: SeekFlags,
    /// Bounded channel size for [`PacketStream`](crate::PacketStream).
    pub(crate) channel_capacity: usize,
}

impl Debug for DemuxOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DemuxOptions")
            .field("has_diagnostics", &true)
            .field("default_seek_flags", &self.default_seek_flags)
            .field("channel_capacity", &self.channel_capacity)
            .finish()
    }
}

impl Default for DemuxOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DemuxOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            diagnostics: Arc::new(LogSink),
            default_seek_flags: SeekFlags::BACKWARD,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Route diagnostic events to `sink`.
    #[must_use]
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Set the flags [`seek_to`](crate::StreamDemuxer::seek_to) passes to
    /// the engine.
    #[must_use]
    pub fn with_default_seek_flags(mut self, flags: SeekFlags) -> Self {
        self.default_seek_flags = flags;
        self
    }

    /// Set the bounded channel size used by the async packet stream.
    ///
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Flags [`seek_to`](crate::StreamDemuxer::seek_to) will use.
    pub fn default_seek_flags(&self) -> SeekFlags {
        self.default_seek_flags
    }

    pub(crate) fn emit(&self, level: Level, message: impl Into<String>) {
        self.diagnostics.on_event(&DiagnosticEvent {
            level,
            message: message.into(),
        });
    }
}
