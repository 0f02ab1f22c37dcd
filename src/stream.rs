//! Async packet streaming.
//!
//! Every [`StreamDemuxer`] call blocks on container I/O. [`PacketStream`]
//! moves a demuxer onto a `tokio::task::spawn_blocking` worker and streams
//! its target packets back through a bounded channel, so async callers never
//! stall the runtime.
//!
//! # Example
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//!
//! use streamdemux::{DemuxError, MediaKind, PacketStream};
//!
//! # async fn example() -> Result<(), DemuxError> {
//! let mut stream = PacketStream::open("input.mp4", MediaKind::Video);
//! while let Some(packet) = stream.next().await {
//!     let packet = packet?;
//!     println!("pts={:?} size={}", packet.pts, packet.size());
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_core::Stream;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;

use crate::configuration::DemuxOptions;
use crate::demuxer::StreamDemuxer;
use crate::engine::{ContainerEngine, MediaKind, Packet};
use crate::error::DemuxError;
use crate::ffmpeg::FfmpegEngine;

/// Target-stream packets produced by a background demuxer.
///
/// Dropping the stream closes the channel; the worker notices on its next
/// send and closes its demuxer.
pub struct PacketStream {
    receiver: Receiver<Result<Packet, DemuxError>>,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl PacketStream {
    /// Stream `kind` packets of `path` through FFmpeg with default options.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(path: impl Into<PathBuf>, kind: MediaKind) -> Self {
        Self::spawn(path, kind, FfmpegEngine::new(), DemuxOptions::new(), None)
    }

    /// Stream `kind` packets of `path` through `engine`, optionally seeking
    /// to `start` (with the options' default seek flags) before the first
    /// read.
    ///
    /// Open, seek and read failures are delivered as the stream's last item.
    pub fn spawn<E>(
        path: impl Into<PathBuf>,
        kind: MediaKind,
        engine: E,
        options: DemuxOptions,
        start: Option<Duration>,
    ) -> Self
    where
        E: ContainerEngine + Send + 'static,
    {
        let path = path.into();
        let (sender, receiver) = tokio::sync::mpsc::channel(options.channel_capacity);

        let handle = tokio::task::spawn_blocking(move || {
            let mut demuxer = StreamDemuxer::with_options(kind, engine, options);
            if let Err(error) = demux_blocking(&mut demuxer, &path, start, &sender) {
                // The receiver may already be gone.
                let _ = sender.blocking_send(Err(error));
            }
        });

        PacketStream { receiver, handle }
    }
}

impl Stream for PacketStream {
    type Item = Result<Packet, DemuxError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Background read loop. Returns early and quietly once the receiver is
/// dropped.
fn demux_blocking<E: ContainerEngine>(
    demuxer: &mut StreamDemuxer<E>,
    path: &PathBuf,
    start: Option<Duration>,
    sender: &Sender<Result<Packet, DemuxError>>,
) -> Result<(), DemuxError> {
    demuxer.open(path)?;
    if demuxer.stream_index().is_none() {
        return Err(DemuxError::NoTargetStream(demuxer.media_kind()));
    }
    if let Some(start) = start {
        demuxer.seek_to(start)?;
    }

    while let Some(packet) = demuxer.read_packet()? {
        if sender.blocking_send(Ok(packet)).is_err() {
            log::debug!("PacketStream receiver dropped; stopping worker");
            break;
        }
    }
    Ok(())
}
