//! Pull-based iteration over target-stream packets.
//!
//! [`PacketIterator`] wraps repeated calls to
//! [`StreamDemuxer::read_packet`](crate::StreamDemuxer::read_packet) in a
//! standard [`Iterator`]. It ends at end of file and after the first error.
//!
//! # Example
//!
//! ```no_run
//! use streamdemux::{DemuxError, MediaKind, StreamDemuxer};
//!
//! let mut demuxer = StreamDemuxer::new(MediaKind::Audio);
//! demuxer.open("input.mp4")?;
//! let keyframes = demuxer
//!     .packets()
//!     .filter_map(Result::ok)
//!     .filter(|packet| packet.is_keyframe)
//!     .count();
//! println!("{keyframes} keyframes");
//! # Ok::<(), DemuxError>(())
//! ```

use std::iter::FusedIterator;

use crate::demuxer::StreamDemuxer;
use crate::engine::{ContainerEngine, Packet};
use crate::error::DemuxError;

/// A lazy iterator over the target stream's remaining packets.
///
/// Borrows the demuxer mutably; the demuxer's EOF flag is updated exactly as
/// if `read_packet` had been called by hand.
pub struct PacketIterator<'a, E: ContainerEngine> {
    demuxer: &'a mut StreamDemuxer<E>,
    done: bool,
}

impl<'a, E: ContainerEngine> PacketIterator<'a, E> {
    pub(crate) fn new(demuxer: &'a mut StreamDemuxer<E>) -> Self {
        log::debug!("Creating PacketIterator for {} stream", demuxer.media_kind());
        Self {
            demuxer,
            done: false,
        }
    }
}

impl<E: ContainerEngine> Iterator for PacketIterator<'_, E> {
    type Item = Result<Packet, DemuxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.demuxer.read_packet() {
            Ok(Some(packet)) => Some(Ok(packet)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}

impl<E: ContainerEngine> FusedIterator for PacketIterator<'_, E> {}
