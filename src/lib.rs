//! # streamdemux
//!
//! Single-stream demultiplexing over container media files.
//!
//! A [`StreamDemuxer`] is created for one [`MediaKind`] (video or audio),
//! opens a container, picks the best stream of that kind, and hands back
//! only that stream's coded packets, in container order. It seeks by
//! microsecond timestamp (rescaled exactly into the stream's own time base)
//! and reports the stream duration from the best source available.
//! Container parsing is delegated to a [`ContainerEngine`]; the default is
//! FFmpeg via [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next).
//!
//! ## Quick Start
//!
//! ```no_run
//! use streamdemux::{MediaKind, SeekFlags, StreamDemuxer};
//!
//! let mut demuxer = StreamDemuxer::new(MediaKind::Video);
//! demuxer.open("input.mp4")?;
//!
//! // `open` succeeds for a file without a video stream, too.
//! let Some(index) = demuxer.stream_index() else {
//!     return Ok(());
//! };
//! println!("video stream {index}, {:?}", demuxer.duration());
//!
//! for packet in demuxer.packets().take(10) {
//!     let packet = packet?;
//!     assert_eq!(packet.stream_index, index);
//! }
//!
//! demuxer.seek(2_500_000, SeekFlags::BACKWARD)?;
//! assert!(!demuxer.is_eof());
//! # Ok::<(), streamdemux::DemuxError>(())
//! ```
//!
//! ## Diagnostics
//!
//! Lifecycle and failure events go to a [`DiagnosticSink`]. The default
//! forwards to the [`log`](https://crates.io/crates/log) crate; swap it via
//! [`DemuxOptions::with_diagnostics`].
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | [`PacketStream`]: target packets from a blocking worker via Tokio |
//! | `rayon` | [`parallel::probe_many`]: probe many files on rayon threads |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod configuration;
pub mod demuxer;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod ffmpeg;
pub mod packet_iterator;
#[cfg(feature = "rayon")]
pub mod parallel;
#[cfg(feature = "async")]
pub mod stream;
pub mod time;

pub use configuration::DemuxOptions;
pub use demuxer::{DurationSource, StreamDemuxer};
pub use diagnostics::{DiagnosticEvent, DiagnosticSink, Level, LogSink, NoOpSink};
pub use engine::{ContainerEngine, ContainerSession, MediaKind, Packet, SeekFlags, StreamInfo};
pub use error::DemuxError;
pub use ffmpeg::{
    FfmpegEngine, FfmpegLogLevel, FfmpegSession, get_ffmpeg_log_level, set_ffmpeg_log_level,
};
pub use packet_iterator::PacketIterator;
#[cfg(feature = "rayon")]
pub use parallel::StreamSummary;
#[cfg(feature = "async")]
pub use stream::PacketStream;
pub use time::TimeBase;
