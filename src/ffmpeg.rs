//! The FFmpeg-backed container engine.
//!
//! [`FfmpegEngine`] implements [`ContainerEngine`] on top of `libavformat`
//! through [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next). Opening and
//! probing are kept as two separate steps (`avformat_open_input` then
//! `avformat_find_stream_info`) so the demuxer can tell an unreadable file
//! from a file whose stream table cannot be determined. Seeking goes through
//! `av_seek_frame` on the target stream so timestamps stay in that stream's
//! own time base.
//!
//! This module also exposes FFmpeg's own console verbosity. That is
//! separate from the Rust-side diagnostics emitted via
//! [`DiagnosticSink`](crate::DiagnosticSink).
//!
//! # Example
//!
//! ```no_run
//! use streamdemux::{FfmpegEngine, FfmpegLogLevel, MediaKind, StreamDemuxer};
//!
//! let engine = FfmpegEngine::new().with_log_level(FfmpegLogLevel::Error);
//! let mut demuxer = StreamDemuxer::with_engine(MediaKind::Video, engine);
//! demuxer.open("input.mp4")?;
//! # Ok::<(), streamdemux::DemuxError>(())
//! ```

use std::ffi::CString;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::ptr;

use ffmpeg_next::util::log::Level;
use ffmpeg_next::{Error as FfmpegError, Packet as FfmpegPacket, format::context::Input, media::Type};

use crate::engine::{ContainerEngine, ContainerSession, MediaKind, Packet, SeekFlags, StreamInfo};
use crate::error::DemuxError;
use crate::time::TimeBase;

/// FFmpeg's "no timestamp" sentinel (`AV_NOPTS_VALUE`).
const NO_TIMESTAMP: i64 = i64::MIN;

/// FFmpeg internal log verbosity, most quiet first.
///
/// Setting a level makes FFmpeg suppress everything below that severity on
/// stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// No output at all.
    Quiet,
    /// Conditions that abort the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
    /// Everything.
    Trace,
}

impl FfmpegLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }

    fn from_ffmpeg_level(level: Level) -> Self {
        match level {
            Level::Quiet => FfmpegLogLevel::Quiet,
            Level::Panic => FfmpegLogLevel::Panic,
            Level::Fatal => FfmpegLogLevel::Fatal,
            Level::Error => FfmpegLogLevel::Error,
            Level::Warning => FfmpegLogLevel::Warning,
            Level::Info => FfmpegLogLevel::Info,
            Level::Verbose => FfmpegLogLevel::Verbose,
            Level::Debug => FfmpegLogLevel::Debug,
            Level::Trace => FfmpegLogLevel::Trace,
        }
    }
}

/// Set FFmpeg's own stderr verbosity for the whole process.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Current FFmpeg stderr verbosity, if it maps to a known level.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    ffmpeg_next::util::log::get_level()
        .ok()
        .map(FfmpegLogLevel::from_ffmpeg_level)
}

/// Container engine backed by `libavformat`.
///
/// Stateless apart from the optional log level, so one engine value can be
/// cloned into as many demuxers as needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegEngine {
    log_level: Option<FfmpegLogLevel>,
}

impl FfmpegEngine {
    /// Create an engine that leaves FFmpeg's log level untouched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `level` to FFmpeg's console output every time a container is
    /// opened through this engine.
    #[must_use]
    pub fn with_log_level(mut self, level: FfmpegLogLevel) -> Self {
        self.log_level = Some(level);
        self
    }
}

impl ContainerEngine for FfmpegEngine {
    type Session = FfmpegSession;

    fn open(&self, path: &Path) -> Result<FfmpegSession, DemuxError> {
        let path_buf = path.to_path_buf();
        let open_error = |reason: String| DemuxError::FileOpen {
            path: path_buf.clone(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;
        if let Some(level) = self.log_level {
            set_ffmpeg_log_level(level);
        }

        let location = path
            .to_str()
            .ok_or_else(|| open_error("path is not valid UTF-8".to_string()))?;
        let location = CString::new(location)
            .map_err(|_| open_error("path contains an interior NUL byte".to_string()))?;

        let mut context = ptr::null_mut();
        // SAFETY: `context` starts null as avformat_open_input requires. On
        // failure FFmpeg frees whatever it allocated and leaves it null.
        let result = unsafe {
            ffmpeg_sys_next::avformat_open_input(
                &mut context,
                location.as_ptr(),
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        if result < 0 || context.is_null() {
            return Err(open_error(FfmpegError::from(result).to_string()));
        }

        log::debug!("avformat_open_input succeeded for {}", path.display());

        // SAFETY: `context` is a live, exclusively owned input context. Input
        // takes ownership and calls avformat_close_input on drop.
        let input = unsafe { Input::wrap(context) };

        Ok(FfmpegSession {
            input,
            path: path_buf,
            streams: Vec::new(),
        })
    }
}

/// An open `libavformat` input. Dropping it closes the container.
pub struct FfmpegSession {
    input: Input,
    path: PathBuf,
    streams: Vec<StreamInfo>,
}

impl Debug for FfmpegSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FfmpegSession")
            .field("path", &self.path)
            .field("streams", &self.streams)
            .finish_non_exhaustive()
    }
}

impl FfmpegSession {
    /// The underlying FFmpeg input context.
    pub fn input(&self) -> &Input {
        &self.input
    }

    /// Container format short name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub fn format_name(&self) -> String {
        self.input.format().name().to_string()
    }

    fn snapshot_streams(&self) -> Vec<StreamInfo> {
        self.input
            .streams()
            .map(|stream| {
                let parameters = stream.parameters();
                let kind = match parameters.medium() {
                    Type::Video => MediaKind::Video,
                    Type::Audio => MediaKind::Audio,
                    _ => MediaKind::Other,
                };
                let duration = stream.duration();
                StreamInfo {
                    index: stream.index(),
                    kind,
                    time_base: TimeBase::from(stream.time_base()),
                    duration: (duration != NO_TIMESTAMP).then_some(duration),
                    codec: parameters.id().name().to_string(),
                }
            })
            .collect()
    }
}

impl ContainerSession for FfmpegSession {
    fn probe(&mut self) -> Result<(), DemuxError> {
        // SAFETY: the context is owned by `self.input` and outlives the call.
        let result = unsafe {
            ffmpeg_sys_next::avformat_find_stream_info(self.input.as_mut_ptr(), ptr::null_mut())
        };
        if result < 0 {
            return Err(DemuxError::Probe {
                path: self.path.clone(),
                reason: FfmpegError::from(result).to_string(),
            });
        }

        self.streams = self.snapshot_streams();
        log::debug!(
            "Probed {} ({} streams, format={})",
            self.path.display(),
            self.streams.len(),
            self.format_name(),
        );
        Ok(())
    }

    fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    fn duration_micros(&self) -> Option<i64> {
        let duration = self.input.duration();
        (duration != NO_TIMESTAMP).then_some(duration)
    }

    fn best_stream(&self, kind: MediaKind) -> Option<usize> {
        let medium = match kind {
            MediaKind::Video => Type::Video,
            MediaKind::Audio => Type::Audio,
            MediaKind::Other => return None,
        };
        self.input.streams().best(medium).map(|stream| stream.index())
    }

    fn read_packet(&mut self) -> Result<Option<Packet>, DemuxError> {
        let mut packet = FfmpegPacket::empty();
        match packet.read(&mut self.input) {
            Ok(()) => Ok(Some(Packet {
                stream_index: packet.stream(),
                pts: packet.pts(),
                dts: packet.dts(),
                duration: packet.duration(),
                is_keyframe: packet.is_key(),
                data: packet.data().map(<[u8]>::to_vec).unwrap_or_default(),
            })),
            Err(FfmpegError::Eof) => Ok(None),
            Err(error) => Err(DemuxError::Read(error.to_string())),
        }
    }

    fn seek(
        &mut self,
        stream_index: usize,
        target: i64,
        flags: SeekFlags,
    ) -> Result<(), DemuxError> {
        let stream_index = i32::try_from(stream_index)
            .map_err(|_| DemuxError::FfmpegError(format!("stream index {stream_index} out of range")))?;

        // SAFETY: the context is owned by `self.input` and outlives the call.
        let result = unsafe {
            ffmpeg_sys_next::av_seek_frame(
                self.input.as_mut_ptr(),
                stream_index,
                target,
                flags.bits(),
            )
        };
        if result < 0 {
            return Err(FfmpegError::from(result).into());
        }
        Ok(())
    }
}
