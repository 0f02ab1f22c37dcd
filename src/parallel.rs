//! Parallel probing of many containers.
//!
//! [`probe_many`] opens one independent [`StreamDemuxer`] per path on the
//! rayon thread pool. Workers share nothing mutable: each owns its demuxer
//! and container session from open to drop.
//!
//! # Example
//!
//! ```no_run
//! use streamdemux::{DemuxOptions, FfmpegEngine, MediaKind};
//! use streamdemux::parallel::probe_many;
//!
//! let results = probe_many(
//!     &["a.mp4", "b.mkv"],
//!     MediaKind::Audio,
//!     &FfmpegEngine::new(),
//!     &DemuxOptions::new(),
//! );
//! for result in results {
//!     match result {
//!         Ok(summary) => println!("{:?}: {} us", summary.stream_index, summary.duration_us),
//!         Err(error) => eprintln!("error: {error}"),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};

use ::rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::configuration::DemuxOptions;
use crate::demuxer::{DurationSource, StreamDemuxer};
use crate::engine::{ContainerEngine, MediaKind};
use crate::error::DemuxError;

/// What a single probe found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    /// The probed path.
    pub path: PathBuf,
    /// Target stream index, if the container has one of the requested kind.
    pub stream_index: Option<usize>,
    /// Number of entries in the stream table.
    pub stream_count: usize,
    /// Resolved duration in microseconds.
    pub duration_us: i64,
    /// Which source answered the duration query.
    pub duration_source: DurationSource,
}

/// Probe every path in parallel. Results keep the order of `paths`; a
/// failure for one file does not affect the others.
pub fn probe_many<P, E>(
    paths: &[P],
    kind: MediaKind,
    engine: &E,
    options: &DemuxOptions,
) -> Vec<Result<StreamSummary, DemuxError>>
where
    P: AsRef<Path> + Sync,
    E: ContainerEngine + Clone + Sync,
{
    log::debug!("Probing {} containers in parallel", paths.len());
    paths
        .par_iter()
        .map(|path| probe_one(path.as_ref(), kind, engine.clone(), options.clone()))
        .collect()
}

fn probe_one<E: ContainerEngine>(
    path: &Path,
    kind: MediaKind,
    engine: E,
    options: DemuxOptions,
) -> Result<StreamSummary, DemuxError> {
    let mut demuxer = StreamDemuxer::with_options(kind, engine, options);
    demuxer.open(path)?;
    let (duration_us, duration_source) = demuxer.resolve_duration();

    Ok(StreamSummary {
        path: path.to_path_buf(),
        stream_index: demuxer.stream_index(),
        stream_count: demuxer.streams().len(),
        duration_us,
        duration_source,
    })
}
