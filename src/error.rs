//! Error types for the `streamdemux` crate.
//!
//! This module defines [`DemuxError`], the unified error type returned by all
//! fallible operations in the crate. Variants fall into two groups: usage
//! errors (calling an operation in a state that cannot serve it) and engine
//! errors (the container engine failed to open, probe, read or seek).
//!
//! Reaching the end of the target stream is **not** an error. It is reported
//! as `Ok(None)` by [`StreamDemuxer::read_packet`](crate::StreamDemuxer::read_packet)
//! together with [`is_eof`](crate::StreamDemuxer::is_eof) turning `true`.

use std::path::PathBuf;

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

use crate::engine::MediaKind;

/// The unified error type for all `streamdemux` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DemuxError {
    /// An empty path was passed to [`open`](crate::StreamDemuxer::open).
    #[error("Media path is empty")]
    EmptyPath,

    /// The demuxer has no open container session.
    #[error("Demuxer is not open")]
    NotOpen,

    /// The container was opened but holds no stream of the declared kind.
    #[error("No {0} stream found in container")]
    NoTargetStream(MediaKind),

    /// The container could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::StreamDemuxer::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The container opened but its stream table could not be determined.
    #[error("Could not find stream information in {path}: {reason}")]
    Probe {
        /// Path of the container being probed.
        path: PathBuf,
        /// Underlying reason the probe failed.
        reason: String,
    },

    /// Reading the next packet failed for a reason other than end of file.
    #[error("Error reading packet: {0}")]
    Read(String),

    /// The engine refused to reposition the container.
    #[error("Error seeking to {timestamp_us}us: {reason}")]
    Seek {
        /// Requested position in microseconds.
        timestamp_us: i64,
        /// Underlying reason the seek failed.
        reason: String,
    },

    /// A time base with a zero term, or a rescale that overflows `i64`.
    #[error("Invalid time base for rescaling")]
    InvalidTimeBase,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),
}

impl From<FfmpegError> for DemuxError {
    fn from(error: FfmpegError) -> Self {
        DemuxError::FfmpegError(error.to_string())
    }
}
