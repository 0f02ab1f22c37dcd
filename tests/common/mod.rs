//! Scripted in-memory container engine shared by the integration tests.
//!
//! A [`ScriptedEngine`] serves a fixed stream table and packet list, records
//! every seek it receives, and counts live sessions so tests can check that
//! sessions are released on every path.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use streamdemux::{
    ContainerEngine, ContainerSession, DemuxError, DemuxOptions, DiagnosticEvent, DiagnosticSink,
    Level, MediaKind, Packet, SeekFlags, StreamDemuxer, StreamInfo, TimeBase,
};

pub const VIDEO_TIME_BASE: TimeBase = TimeBase::new(1, 15_360);
pub const AUDIO_TIME_BASE: TimeBase = TimeBase::new(1, 44_100);

/// Video ticks per frame at 30 fps in a 1/15360 time base.
pub const VIDEO_FRAME_TICKS: i64 = 512;
/// Audio ticks per AAC frame.
pub const AUDIO_FRAME_TICKS: i64 = 1_024;

/// What a scripted container holds.
#[derive(Debug, Clone, Default)]
pub struct ScriptedContainer {
    pub streams: Vec<StreamInfo>,
    pub duration_us: Option<i64>,
    pub best_video: Option<usize>,
    pub best_audio: Option<usize>,
    pub packets: Vec<Packet>,
    /// Position in `packets` at which a read fails instead of returning.
    pub read_error_at: Option<usize>,
    pub seek_fails: bool,
}

/// One seek the engine received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekCall {
    pub stream_index: usize,
    pub target: i64,
    pub flags: SeekFlags,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    pub container: ScriptedContainer,
    pub fail_open: bool,
    pub fail_probe: bool,
    pub live_sessions: Arc<AtomicUsize>,
    pub opened: Arc<AtomicUsize>,
    pub seeks: Arc<Mutex<Vec<SeekCall>>>,
}

impl ScriptedEngine {
    pub fn new(container: ScriptedContainer) -> Self {
        Self {
            container,
            ..Self::default()
        }
    }

    pub fn live_sessions(&self) -> usize {
        self.live_sessions.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn seeks(&self) -> Vec<SeekCall> {
        self.seeks.lock().unwrap().clone()
    }
}

impl ContainerEngine for ScriptedEngine {
    type Session = ScriptedSession;

    fn open(&self, path: &Path) -> Result<ScriptedSession, DemuxError> {
        if self.fail_open {
            return Err(DemuxError::FileOpen {
                path: path.to_path_buf(),
                reason: "No such file or directory".to_string(),
            });
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        self.live_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedSession {
            container: self.container.clone(),
            fail_probe: self.fail_probe,
            probed: false,
            cursor: 0,
            live_sessions: Arc::clone(&self.live_sessions),
            seeks: Arc::clone(&self.seeks),
            path: path.display().to_string(),
        })
    }
}

#[derive(Debug)]
pub struct ScriptedSession {
    container: ScriptedContainer,
    fail_probe: bool,
    probed: bool,
    cursor: usize,
    live_sessions: Arc<AtomicUsize>,
    seeks: Arc<Mutex<Vec<SeekCall>>>,
    path: String,
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.live_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ContainerSession for ScriptedSession {
    fn probe(&mut self) -> Result<(), DemuxError> {
        if self.fail_probe {
            return Err(DemuxError::Probe {
                path: self.path.clone().into(),
                reason: "Invalid data found when processing input".to_string(),
            });
        }
        self.probed = true;
        Ok(())
    }

    fn streams(&self) -> &[StreamInfo] {
        if self.probed {
            &self.container.streams[..]
        } else {
            &[]
        }
    }

    fn duration_micros(&self) -> Option<i64> {
        self.container.duration_us
    }

    fn best_stream(&self, kind: MediaKind) -> Option<usize> {
        match kind {
            MediaKind::Video => self.container.best_video,
            MediaKind::Audio => self.container.best_audio,
            MediaKind::Other => None,
        }
    }

    fn read_packet(&mut self) -> Result<Option<Packet>, DemuxError> {
        if self.container.read_error_at == Some(self.cursor) {
            return Err(DemuxError::Read("Invalid data found when processing input".into()));
        }
        let packet = self.container.packets.get(self.cursor).cloned();
        if packet.is_some() {
            self.cursor += 1;
        }
        Ok(packet)
    }

    fn seek(
        &mut self,
        stream_index: usize,
        target: i64,
        flags: SeekFlags,
    ) -> Result<(), DemuxError> {
        self.seeks.lock().unwrap().push(SeekCall {
            stream_index,
            target,
            flags,
        });
        if self.container.seek_fails {
            return Err(DemuxError::FfmpegError("Operation not permitted".to_string()));
        }

        self.cursor = self
            .container
            .packets
            .iter()
            .position(|p| p.stream_index == stream_index && p.pts.is_some_and(|pts| pts >= target))
            .unwrap_or(self.container.packets.len());
        Ok(())
    }
}

pub fn stream(index: usize, kind: MediaKind, time_base: TimeBase, duration: Option<i64>) -> StreamInfo {
    let codec = match kind {
        MediaKind::Video => "h264",
        MediaKind::Audio => "aac",
        MediaKind::Other => "mov_text",
    };
    StreamInfo {
        index,
        kind,
        time_base,
        duration,
        codec: codec.to_string(),
    }
}

pub fn packet(stream_index: usize, pts: i64, is_keyframe: bool) -> Packet {
    Packet {
        stream_index,
        pts: Some(pts),
        dts: Some(pts),
        duration: 0,
        is_keyframe,
        data: vec![stream_index as u8; 16],
    }
}

/// Five seconds of 30 fps video (stream 0) interleaved with AAC audio
/// (stream 1), one audio packet after every video packet.
pub fn audio_video_container() -> ScriptedContainer {
    let mut packets = Vec::new();
    for frame in 0..150_i64 {
        packets.push(packet(0, frame * VIDEO_FRAME_TICKS, frame % 30 == 0));
        packets.push(packet(1, frame * AUDIO_FRAME_TICKS, true));
    }

    ScriptedContainer {
        streams: vec![
            stream(0, MediaKind::Video, VIDEO_TIME_BASE, Some(150 * VIDEO_FRAME_TICKS)),
            stream(1, MediaKind::Audio, AUDIO_TIME_BASE, Some(220_500)),
        ],
        duration_us: Some(5_000_000),
        best_video: Some(0),
        best_audio: Some(1),
        packets,
        ..ScriptedContainer::default()
    }
}

/// The video half of [`audio_video_container`] only.
pub fn video_only_container() -> ScriptedContainer {
    let mut container = audio_video_container();
    container.streams.truncate(1);
    container.best_audio = None;
    container.packets.retain(|p| p.stream_index == 0);
    container
}

/// Collects every diagnostic event.
#[derive(Debug, Default)]
pub struct CapturingSink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl CapturingSink {
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, level: Level) -> usize {
        self.events().iter().filter(|e| e.level == level).count()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.events()
            .iter()
            .any(|e| e.level == level && e.message.contains(needle))
    }
}

impl DiagnosticSink for CapturingSink {
    fn on_event(&self, event: &DiagnosticEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// A demuxer over `engine` whose events land in the returned sink.
pub fn capturing_demuxer(
    kind: MediaKind,
    engine: ScriptedEngine,
) -> (StreamDemuxer<ScriptedEngine>, Arc<CapturingSink>) {
    let sink = Arc::new(CapturingSink::default());
    let options = DemuxOptions::new().with_diagnostics(sink.clone());
    (StreamDemuxer::with_options(kind, engine, options), sink)
}
