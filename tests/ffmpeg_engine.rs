//! FFmpeg-backed integration tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`
//! and return early when they are missing.

use std::path::Path;
use std::time::Duration;

use streamdemux::{
    DemuxError, DurationSource, FfmpegEngine, FfmpegLogLevel, MediaKind, SeekFlags, StreamDemuxer,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn sample_video_only_path() -> &'static str {
    "tests/fixtures/sample_video_only.mp4"
}

fn quiet_demuxer(kind: MediaKind) -> StreamDemuxer {
    StreamDemuxer::with_engine(kind, FfmpegEngine::new().with_log_level(FfmpegLogLevel::Quiet))
}

// ── open failures ────────────────────────────────────────────────

#[test]
fn open_nonexistent_file() {
    let mut demuxer = quiet_demuxer(MediaKind::Video);
    let result = demuxer.open("this_file_does_not_exist.mp4");

    let error = result.unwrap_err();
    assert!(matches!(error, DemuxError::FileOpen { .. }));
    assert!(
        error.to_string().contains("Failed to open media file"),
        "Error message should mention file open failure: {error}",
    );
    assert!(!demuxer.is_open());
}

#[test]
fn open_empty_path() {
    let mut demuxer = quiet_demuxer(MediaKind::Audio);
    assert!(matches!(demuxer.open(""), Err(DemuxError::EmptyPath)));
    assert!(!demuxer.is_open());
}

#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    let mut demuxer = quiet_demuxer(MediaKind::Video);
    assert!(demuxer.open(&invalid_file_path).is_err());
    assert!(!demuxer.is_open());
    assert_eq!(demuxer.stream_index(), None);
}

// ── audio + video fixture ────────────────────────────────────────

#[test]
fn open_audio_video_fixture_as_video() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut demuxer = quiet_demuxer(MediaKind::Video);
    demuxer.open(path).expect("Failed to open fixture");

    let index = demuxer.stream_index().expect("video stream");
    assert_eq!(demuxer.target_stream().map(|s| s.kind), Some(MediaKind::Video));
    assert!(demuxer.audio_stream().is_some());
    assert!(demuxer.streams().iter().any(|s| s.index == index));
    let format = demuxer.session().map(|session| session.format_name());
    assert!(
        format.as_deref().is_some_and(|name| name.contains("mp4")),
        "unexpected container format: {format:?}"
    );
}

#[test]
fn fixture_duration_is_about_five_seconds() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut demuxer = quiet_demuxer(MediaKind::Video);
    demuxer.open(path).expect("Failed to open fixture");

    let duration = demuxer.duration_micros();
    assert!(
        (4_000_000..=6_000_000).contains(&duration),
        "Duration should be approximately 5 seconds, got {duration}us"
    );
    assert_eq!(demuxer.resolve_duration().1, DurationSource::Container);
}

#[test]
fn first_packets_belong_to_target_stream() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    for kind in [MediaKind::Video, MediaKind::Audio] {
        let mut demuxer = quiet_demuxer(kind);
        demuxer.open(path).expect("Failed to open fixture");
        let index = demuxer.stream_index().expect("target stream");

        let mut read = 0;
        for _ in 0..10 {
            let packet = demuxer.read_packet().expect("read").expect("packet");
            assert_eq!(packet.stream_index, index);
            assert!(packet.size() > 0);
            read += 1;
        }
        assert_eq!(read, 10);
    }
}

#[test]
fn reading_to_the_end_sets_eof() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut demuxer = quiet_demuxer(MediaKind::Video);
    demuxer.open(path).expect("Failed to open fixture");
    assert!(!demuxer.is_eof());

    let packets: Vec<_> = demuxer
        .packets()
        .collect::<Result<_, _>>()
        .expect("all packets readable");
    assert!(!packets.is_empty());
    assert!(packets.iter().any(|p| p.is_keyframe));
    assert!(demuxer.is_eof());
}

#[test]
fn seek_to_middle_clears_eof() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut demuxer = quiet_demuxer(MediaKind::Video);
    demuxer.open(path).expect("Failed to open fixture");
    while demuxer.read_packet().expect("read").is_some() {}
    assert!(demuxer.is_eof());

    demuxer
        .seek(2_500_000, SeekFlags::BACKWARD)
        .expect("seek to the middle");
    assert!(!demuxer.is_eof());

    let packet = demuxer.read_packet().expect("read").expect("packet after seek");
    assert_eq!(Some(packet.stream_index), demuxer.stream_index());
}

#[test]
fn seek_to_duration_uses_default_flags() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut demuxer = quiet_demuxer(MediaKind::Audio);
    demuxer.open(path).expect("Failed to open fixture");
    demuxer.seek_to(Duration::from_secs(1)).expect("seek");
    assert!(demuxer.read_packet().expect("read").is_some());
}

#[test]
fn repeated_open_close_on_fixture() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut demuxer = quiet_demuxer(MediaKind::Video);
    let mut seen = Vec::new();
    for _ in 0..3 {
        demuxer.open(path).expect("open");
        seen.push((demuxer.stream_index(), demuxer.duration_micros()));
        demuxer.close();
        demuxer.close();
        assert!(!demuxer.is_open());
    }
    assert!(seen.windows(2).all(|pair| pair[0] == pair[1]));
}

// ── video-only fixture ───────────────────────────────────────────

#[test]
fn video_only_fixture_as_audio() {
    let path = sample_video_only_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut demuxer = quiet_demuxer(MediaKind::Audio);
    demuxer.open(path).expect("open succeeds without audio");

    assert_eq!(demuxer.stream_index(), None);
    assert!(matches!(
        demuxer.read_packet(),
        Err(DemuxError::NoTargetStream(MediaKind::Audio))
    ));
    assert!(!demuxer.is_eof());
    assert!(demuxer.seek(0, SeekFlags::BACKWARD).is_err());
    assert!(demuxer.duration_micros() > 0, "falls back to the video stream");
}
