//! The container engine capability.
//!
//! [`StreamDemuxer`](crate::StreamDemuxer) owns the stream-selection, packet
//! filtering, seek and duration policy. The actual container parsing is
//! delegated to a [`ContainerEngine`], which opens files into
//! [`ContainerSession`]s. The production engine is
//! [`FfmpegEngine`](crate::FfmpegEngine); tests drive the demuxer with a
//! scripted in-memory engine instead.
//!
//! Closing a session is dropping it. Implementations must release every
//! engine resource in `Drop`.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::{BitOr, BitOrAssign};
use std::path::Path;

use crate::error::DemuxError;
use crate::time::TimeBase;

/// The kind of elementary stream a demuxer targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// A video track.
    Video,
    /// An audio track.
    Audio,
    /// Any other track (subtitles, data, attachments). Never selected as a
    /// demuxer target.
    Other,
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// A snapshot of one entry in a session's stream table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Position of the stream in the container's stream table.
    pub index: usize,
    /// What the stream carries.
    pub kind: MediaKind,
    /// Tick length of every timestamp in this stream.
    pub time_base: TimeBase,
    /// Stream duration in `time_base` ticks, if the container records one.
    pub duration: Option<i64>,
    /// Codec short name as reported by the engine (e.g. `"h264"`).
    pub codec: String,
}

/// One coded-data unit read from a container.
///
/// Owned by the caller once returned; nothing in the demuxer retains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Stream this packet belongs to.
    pub stream_index: usize,
    /// Presentation timestamp in the stream's time base.
    pub pts: Option<i64>,
    /// Decoding timestamp in the stream's time base.
    pub dts: Option<i64>,
    /// Packet duration in the stream's time base (`0` when unknown).
    pub duration: i64,
    /// Whether this packet starts a keyframe.
    pub is_keyframe: bool,
    /// Coded payload.
    pub data: Vec<u8>,
}

impl Packet {
    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Direction and precision hints for [`ContainerSession::seek`].
///
/// The demuxer passes these through untouched. Values mirror FFmpeg's
/// `AVSEEK_FLAG_*` constants so they can be handed to the engine verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SeekFlags(i32);

impl SeekFlags {
    /// Seek to the nearest keyframe at or after the target.
    pub const NONE: SeekFlags = SeekFlags(0);
    /// Seek to the nearest keyframe at or before the target.
    pub const BACKWARD: SeekFlags = SeekFlags(1);
    /// The target is a byte offset rather than a timestamp.
    pub const BYTE: SeekFlags = SeekFlags(2);
    /// Allow landing on non-keyframes.
    pub const ANY: SeekFlags = SeekFlags(4);
    /// The target is a frame number.
    pub const FRAME: SeekFlags = SeekFlags(8);

    /// Wrap raw engine flag bits.
    pub const fn from_bits(bits: i32) -> Self {
        SeekFlags(bits)
    }

    /// The raw flag bits.
    pub const fn bits(self) -> i32 {
        self.0
    }

    /// Whether every bit of `other` is set in `self`.
    pub const fn contains(self, other: SeekFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SeekFlags {
    type Output = SeekFlags;

    fn bitor(self, rhs: SeekFlags) -> SeekFlags {
        SeekFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for SeekFlags {
    fn bitor_assign(&mut self, rhs: SeekFlags) {
        self.0 |= rhs.0;
    }
}

/// Opens containers.
pub trait ContainerEngine {
    /// The live session produced by a successful open.
    type Session: ContainerSession;

    /// Open `path` without probing its streams yet.
    ///
    /// # Errors
    ///
    /// Returns [`DemuxError::FileOpen`] if the container cannot be opened.
    fn open(&self, path: &Path) -> Result<Self::Session, DemuxError>;
}

/// An open container. Dropping it closes the container.
pub trait ContainerSession {
    /// Read enough of the container to populate the stream table, time
    /// bases and durations.
    ///
    /// # Errors
    ///
    /// Returns [`DemuxError::Probe`] if the stream table cannot be determined.
    fn probe(&mut self) -> Result<(), DemuxError>;

    /// The stream table. Empty until [`probe`](ContainerSession::probe) succeeds.
    fn streams(&self) -> &[StreamInfo];

    /// Container-level duration in microseconds, if the container reports one.
    fn duration_micros(&self) -> Option<i64>;

    /// Index of the best stream of `kind`, by the engine's own heuristic.
    fn best_stream(&self, kind: MediaKind) -> Option<usize>;

    /// Pull the next packet in container order.
    ///
    /// Returns `Ok(None)` at end of file.
    ///
    /// # Errors
    ///
    /// Returns [`DemuxError::Read`] for any read failure other than end of file.
    fn read_packet(&mut self) -> Result<Option<Packet>, DemuxError>;

    /// Reposition so that the next read starts near `target`, expressed in
    /// the time base of `stream_index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot reposition the container.
    fn seek(&mut self, stream_index: usize, target: i64, flags: SeekFlags)
    -> Result<(), DemuxError>;
}
