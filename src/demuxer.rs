//! Core [`StreamDemuxer`] implementation.
//!
//! A `StreamDemuxer` is bound to one [`MediaKind`] for its whole life. After
//! [`open`](StreamDemuxer::open) it tracks the engine's best video stream and
//! best audio stream, and treats the one matching its kind as the *target
//! stream*: [`read_packet`](StreamDemuxer::read_packet) returns only target
//! packets, [`seek`](StreamDemuxer::seek) positions in the target's time
//! base, and [`duration_micros`](StreamDemuxer::duration_micros) prefers the
//! target's own duration when the container does not report one.
//!
//! # Missing target stream
//!
//! `open` succeeds as soon as the container is opened and probed, **even if
//! it holds no stream of the declared kind**. Opening a video-only file with
//! [`MediaKind::Audio`] returns `Ok(())`. Always check
//! [`stream_index`](StreamDemuxer::stream_index) after opening; while it is
//! `None`, reads and seeks fail with [`DemuxError::NoTargetStream`].
//!
//! # Threading
//!
//! Every call blocks the calling thread for as long as the engine's I/O
//! takes. One instance must not be driven from several threads at once
//! (the API takes `&mut self`), but independent instances may run on
//! independent threads.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;
use std::time::Duration;

use crate::configuration::DemuxOptions;
use crate::diagnostics::Level;
use crate::engine::{ContainerEngine, ContainerSession, MediaKind, Packet, SeekFlags, StreamInfo};
use crate::error::DemuxError;
use crate::ffmpeg::FfmpegEngine;
use crate::packet_iterator::PacketIterator;
use crate::time::{self, TimeBase};

/// Which source answered a duration query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DurationSource {
    /// The container header.
    Container,
    /// The target stream's own duration.
    TargetStream,
    /// The video stream, used because the target had no duration.
    VideoStream,
    /// The audio stream, used because neither target nor video had one.
    AudioStream,
    /// Nothing reported a duration.
    Unknown,
}

/// Single-stream demultiplexer over a container file.
///
/// # Example
///
/// ```no_run
/// use streamdemux::{MediaKind, SeekFlags, StreamDemuxer};
///
/// let mut demuxer = StreamDemuxer::new(MediaKind::Video);
/// demuxer.open("input.mp4")?;
///
/// if demuxer.stream_index().is_some() {
///     println!("duration: {} us", demuxer.duration_micros());
///     while let Some(packet) = demuxer.read_packet()? {
///         println!("pts={:?} size={}", packet.pts, packet.size());
///     }
///     assert!(demuxer.is_eof());
///     demuxer.seek(2_500_000, SeekFlags::BACKWARD)?;
/// }
/// demuxer.close();
/// # Ok::<(), streamdemux::DemuxError>(())
/// ```
pub struct StreamDemuxer<E: ContainerEngine = FfmpegEngine> {
    engine: E,
    kind: MediaKind,
    options: DemuxOptions,
    session: Option<E::Session>,
    video_stream: Option<StreamInfo>,
    audio_stream: Option<StreamInfo>,
    end_of_stream: bool,
}

impl<E: ContainerEngine> Debug for StreamDemuxer<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("StreamDemuxer")
            .field("kind", &self.kind)
            .field("is_open", &self.session.is_some())
            .field("video_stream", &self.video_stream)
            .field("audio_stream", &self.audio_stream)
            .field("end_of_stream", &self.end_of_stream)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl StreamDemuxer<FfmpegEngine> {
    /// Create a closed demuxer for `kind` backed by FFmpeg.
    pub fn new(kind: MediaKind) -> Self {
        Self::with_engine(kind, FfmpegEngine::new())
    }
}

impl<E: ContainerEngine> StreamDemuxer<E> {
    /// Create a closed demuxer for `kind` over a custom engine.
    pub fn with_engine(kind: MediaKind, engine: E) -> Self {
        Self::with_options(kind, engine, DemuxOptions::new())
    }

    /// Create a closed demuxer with explicit options.
    pub fn with_options(kind: MediaKind, engine: E, options: DemuxOptions) -> Self {
        options.emit(Level::Info, format!("Demuxer initialized for type: {kind}"));
        Self {
            engine,
            kind,
            options,
            session: None,
            video_stream: None,
            audio_stream: None,
            end_of_stream: false,
        }
    }

    /// Open and probe `path`, then locate the best video and audio streams.
    ///
    /// Any session already open is closed first (with a warning). Finding no
    /// stream of the declared kind is **not** an error; see the module docs.
    ///
    /// # Errors
    ///
    /// - [`DemuxError::EmptyPath`] if `path` is empty. Nothing changes.
    /// - [`DemuxError::FileOpen`] if the engine cannot open the container.
    /// - [`DemuxError::Probe`] if the stream table cannot be determined. The
    ///   half-opened session is released before returning.
    ///
    /// In both engine failure cases the demuxer is left closed.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<(), DemuxError> {
        let path = path.as_ref();
        self.emit(Level::Info, format!("Opening demuxer for file: {}", path.display()));

        if path.as_os_str().is_empty() {
            self.emit(Level::Error, "Filename is empty.");
            return Err(DemuxError::EmptyPath);
        }

        if self.session.is_some() {
            self.emit(
                Level::Warn,
                "Demuxer already initialized. Closing previous context.",
            );
            self.close();
        }

        let mut session = self.engine.open(path).inspect_err(|error| {
            self.emit(Level::Error, format!("Failed to open media file: {error}"));
        })?;

        // A failed probe drops `session` here, closing the container.
        session.probe().inspect_err(|error| {
            self.emit(Level::Error, format!("Could not find stream information: {error}"));
        })?;

        self.video_stream = self.locate_stream(&session, MediaKind::Video, path);
        self.audio_stream = self.locate_stream(&session, MediaKind::Audio, path);
        self.session = Some(session);
        self.end_of_stream = false;
        Ok(())
    }

    /// Ask the engine for the best stream of `kind` and snapshot its entry.
    fn locate_stream(
        &self,
        session: &E::Session,
        kind: MediaKind,
        path: &Path,
    ) -> Option<StreamInfo> {
        let found = session
            .best_stream(kind)
            .and_then(|index| session.streams().iter().find(|s| s.index == index))
            .cloned();

        match &found {
            Some(stream) => self.emit(
                Level::Info,
                format!(
                    "{kind} stream found at index: {} (codec={}, time_base={})",
                    stream.index, stream.codec, stream.time_base
                ),
            ),
            None => self.emit(
                Level::Warn,
                format!("No {kind} stream found in file: {}", path.display()),
            ),
        }
        found
    }

    /// Index of the target stream, or `None` if the container has none.
    pub fn stream_index(&self) -> Option<usize> {
        self.target_stream().map(|stream| stream.index)
    }

    /// Stream-table entry of the target stream.
    pub fn target_stream(&self) -> Option<&StreamInfo> {
        match self.kind {
            MediaKind::Video => self.video_stream.as_ref(),
            MediaKind::Audio => self.audio_stream.as_ref(),
            MediaKind::Other => None,
        }
    }

    /// The best video stream, whatever the target kind.
    pub fn video_stream(&self) -> Option<&StreamInfo> {
        self.video_stream.as_ref()
    }

    /// The best audio stream, whatever the target kind.
    pub fn audio_stream(&self) -> Option<&StreamInfo> {
        self.audio_stream.as_ref()
    }

    /// The kind this demuxer was created for.
    pub fn media_kind(&self) -> MediaKind {
        self.kind
    }

    /// Whether a container session is live.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// The live container session, if any.
    pub fn session(&self) -> Option<&E::Session> {
        self.session.as_ref()
    }

    /// The full stream table of the open container (empty when closed).
    pub fn streams(&self) -> &[StreamInfo] {
        self.session
            .as_ref()
            .map(|session| session.streams())
            .unwrap_or_default()
    }

    /// Whether the last read hit end of file. Cleared by a successful seek.
    pub fn is_eof(&self) -> bool {
        self.end_of_stream
    }

    /// Options this demuxer was built with.
    pub fn options(&self) -> &DemuxOptions {
        &self.options
    }

    /// Read the next packet of the target stream.
    ///
    /// Packets of every other stream are dropped as they are read, one at a
    /// time, so memory use does not depend on how densely streams are
    /// interleaved. Packets come back in container read order.
    ///
    /// Returns `Ok(None)` at end of file and sets [`is_eof`](Self::is_eof).
    ///
    /// # Errors
    ///
    /// - [`DemuxError::NotOpen`] if no container is open.
    /// - [`DemuxError::NoTargetStream`] if the container has no stream of
    ///   the declared kind.
    /// - [`DemuxError::Read`] (or another engine error) if reading fails.
    ///   The EOF flag is left unchanged.
    pub fn read_packet(&mut self) -> Result<Option<Packet>, DemuxError> {
        let target_index = self.require_target()?;
        let Some(session) = self.session.as_mut() else {
            return Err(DemuxError::NotOpen);
        };

        loop {
            match session.read_packet() {
                Ok(Some(packet)) if packet.stream_index == target_index => {
                    return Ok(Some(packet));
                }
                Ok(Some(_other)) => continue,
                Ok(None) => {
                    self.end_of_stream = true;
                    self.options.emit(Level::Info, "End of file reached.");
                    return Ok(None);
                }
                Err(error) => {
                    self.options
                        .emit(Level::Error, format!("Error reading frame: {error}"));
                    return Err(error);
                }
            }
        }
    }

    /// Iterate over the remaining target packets until end of file.
    pub fn packets(&mut self) -> PacketIterator<'_, E> {
        PacketIterator::new(self)
    }

    /// Reposition to `timestamp_us` microseconds on the target stream.
    ///
    /// The timestamp is rescaled exactly into the target stream's time base
    /// and handed to the engine together with `flags`. A successful seek
    /// always clears the EOF flag; a failed one leaves it as it was.
    ///
    /// # Errors
    ///
    /// - [`DemuxError::NotOpen`] / [`DemuxError::NoTargetStream`] as for
    ///   [`read_packet`](Self::read_packet).
    /// - [`DemuxError::InvalidTimeBase`] if the target's time base cannot
    ///   represent the timestamp.
    /// - [`DemuxError::Seek`] if the engine refuses.
    pub fn seek(&mut self, timestamp_us: i64, flags: SeekFlags) -> Result<(), DemuxError> {
        let target_index = self.require_target()?;
        let time_base = self
            .target_stream()
            .map(|stream| stream.time_base)
            .ok_or(DemuxError::NoTargetStream(self.kind))?;

        let Some(seek_target) = time::from_micros(timestamp_us, time_base) else {
            self.emit(
                Level::Error,
                format!("Cannot rescale {timestamp_us}us into time base {time_base}"),
            );
            return Err(DemuxError::InvalidTimeBase);
        };

        self.emit(
            Level::Info,
            format!(
                "Seeking to {timestamp_us}us (stream timebase: {time_base}, target: {seek_target})"
            ),
        );

        let Some(session) = self.session.as_mut() else {
            return Err(DemuxError::NotOpen);
        };
        if let Err(error) = session.seek(target_index, seek_target, flags) {
            self.emit(
                Level::Error,
                format!("Error seeking to {timestamp_us}us: {error}"),
            );
            return Err(DemuxError::Seek {
                timestamp_us,
                reason: error.to_string(),
            });
        }

        self.end_of_stream = false;
        self.emit(Level::Info, format!("Seeked to {timestamp_us}us successfully."));
        Ok(())
    }

    /// Seek to `position` using the configured default flags.
    ///
    /// # Errors
    ///
    /// Same as [`seek`](Self::seek).
    pub fn seek_to(&mut self, position: Duration) -> Result<(), DemuxError> {
        let flags = self.options.default_seek_flags();
        self.seek(time::duration_to_micros(position), flags)
    }

    /// Total duration in microseconds, never negative.
    ///
    /// Sources are tried in order: container header, target stream, video
    /// stream, audio stream. Returns `0` when none reports a duration, or
    /// when the demuxer is closed.
    pub fn duration_micros(&self) -> i64 {
        self.resolve_duration().0
    }

    /// Total duration as a [`Duration`].
    pub fn duration(&self) -> Duration {
        time::micros_to_duration(self.duration_micros())
    }

    /// Resolve the duration and report which source answered.
    pub fn resolve_duration(&self) -> (i64, DurationSource) {
        let Some(session) = self.session.as_ref() else {
            self.emit(Level::Error, "Demuxer not initialized.");
            return (0, DurationSource::Unknown);
        };

        if let Some(duration) = session.duration_micros() {
            return (duration.max(0), DurationSource::Container);
        }

        let candidates = [
            (self.target_stream(), DurationSource::TargetStream),
            (self.video_stream.as_ref(), DurationSource::VideoStream),
            (self.audio_stream.as_ref(), DurationSource::AudioStream),
        ];
        candidates
            .into_iter()
            .find_map(|(stream, source)| {
                stream
                    .and_then(stream_duration_micros)
                    .map(|duration| (duration.max(0), source))
            })
            .unwrap_or((0, DurationSource::Unknown))
    }

    /// Release the container session and reset every derived field.
    ///
    /// Safe to call any number of times. Also runs on drop.
    pub fn close(&mut self) {
        self.emit(Level::Info, "Closing demuxer...");
        if let Some(session) = self.session.take() {
            drop(session);
            self.emit(Level::Info, "Format context closed.");
        }
        self.video_stream = None;
        self.audio_stream = None;
        self.end_of_stream = false;
        self.emit(Level::Info, "Demuxer closed successfully.");
    }

    /// The target stream index, or the usage error explaining its absence.
    fn require_target(&self) -> Result<usize, DemuxError> {
        if self.session.is_none() {
            self.emit(Level::Error, "Demuxer not initialized.");
            return Err(DemuxError::NotOpen);
        }
        self.stream_index().ok_or_else(|| {
            self.emit(Level::Error, "No valid stream index found.");
            DemuxError::NoTargetStream(self.kind)
        })
    }

    fn emit(&self, level: Level, message: impl Into<String>) {
        self.options.emit(level, message);
    }
}

impl<E: ContainerEngine> Drop for StreamDemuxer<E> {
    fn drop(&mut self) {
        self.close();
    }
}

/// A stream's own duration rescaled to microseconds.
fn stream_duration_micros(stream: &StreamInfo) -> Option<i64> {
    stream
        .duration
        .and_then(|duration| time::rescale(duration, stream.time_base, TimeBase::MICROSECONDS))
}
