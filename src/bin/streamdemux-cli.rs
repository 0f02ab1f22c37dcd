use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use streamdemux::{
    DurationSource, FfmpegEngine, FfmpegLogLevel, MediaKind, StreamDemuxer, StreamInfo,
};

const CLI_AFTER_HELP: &str = "Examples:\n  streamdemux probe input.mp4 --json\n  streamdemux packets input.mp4 --kind audio --limit 20\n  streamdemux packets input.mp4 --seek 00:00:02.5 --progress\n  streamdemux duration input.mkv\n  streamdemux completions zsh > _streamdemux";

#[derive(Debug, Parser)]
#[command(
    name = "streamdemux",
    version,
    about = "Inspect the streams and packets of container media files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional output.
    #[arg(long)]
    verbose: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Video,
    Audio,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Video => MediaKind::Video,
            KindArg::Audio => MediaKind::Audio,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the stream table and selected streams.
    #[command(about = "Print stream table", visible_alias = "info")]
    Probe {
        /// Input media path or URL.
        input: String,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the packets of the selected stream.
    #[command(about = "List target-stream packets")]
    Packets {
        /// Input media path or URL.
        input: String,
        /// Which stream kind to follow.
        #[arg(long, value_enum, default_value = "video")]
        kind: KindArg,
        /// Stop after this many packets.
        #[arg(long)]
        limit: Option<u64>,
        /// Seek here first (seconds, MM:SS or HH:MM:SS).
        #[arg(long)]
        seek: Option<String>,
        /// Show a spinner and count instead of one line per packet.
        #[arg(long)]
        progress: bool,
    },

    /// Print the resolved duration.
    #[command(about = "Print duration")]
    Duration {
        /// Input media path or URL.
        input: String,
        /// Which stream kind to treat as the target.
        #[arg(long, value_enum, default_value = "video")]
        kind: KindArg,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_timecode(value: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return seconds_to_duration(seconds, trimmed);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [minutes, seconds] => (0_u64, minutes.parse::<u64>()?, *seconds),
        [hours, minutes, seconds] => (hours.parse::<u64>()?, minutes.parse::<u64>()?, *seconds),
        _ => return Err(format!("invalid time format: {trimmed}").into()),
    };

    let seconds = seconds.parse::<f64>()?;
    let total_seconds = (hours as f64 * 3600.0) + (minutes as f64 * 60.0) + seconds;
    seconds_to_duration(total_seconds, trimmed)
}

fn seconds_to_duration(seconds: f64, input: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    Duration::try_from_secs_f64(seconds.max(0.0))
        .map_err(|error| format!("time value out of range: {input} ({error})").into())
}

fn parse_log_level(value: &str) -> Option<FfmpegLogLevel> {
    match value.to_ascii_lowercase().as_str() {
        "quiet" => Some(FfmpegLogLevel::Quiet),
        "panic" => Some(FfmpegLogLevel::Panic),
        "fatal" => Some(FfmpegLogLevel::Fatal),
        "error" => Some(FfmpegLogLevel::Error),
        "warning" | "warn" => Some(FfmpegLogLevel::Warning),
        "info" => Some(FfmpegLogLevel::Info),
        "verbose" => Some(FfmpegLogLevel::Verbose),
        "debug" => Some(FfmpegLogLevel::Debug),
        "trace" => Some(FfmpegLogLevel::Trace),
        _ => None,
    }
}

fn duration_source_label(source: DurationSource) -> &'static str {
    match source {
        DurationSource::Container => "container",
        DurationSource::TargetStream => "target stream",
        DurationSource::VideoStream => "video stream",
        DurationSource::AudioStream => "audio stream",
        DurationSource::Unknown => "unknown",
    }
}

fn engine_for(global: &GlobalOptions) -> Result<FfmpegEngine, Box<dyn std::error::Error>> {
    let engine = FfmpegEngine::new();
    match &global.log_level {
        Some(level) => {
            let parsed =
                parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?;
            Ok(engine.with_log_level(parsed))
        }
        None => Ok(engine),
    }
}

fn open_demuxer(
    input: &str,
    kind: MediaKind,
    global: &GlobalOptions,
) -> Result<StreamDemuxer, Box<dyn std::error::Error>> {
    let mut demuxer = StreamDemuxer::with_engine(kind, engine_for(global)?);
    demuxer.open(input)?;
    if demuxer.stream_index().is_none() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("no {kind} stream in {input}").yellow()
        );
    }
    Ok(demuxer)
}

fn stream_json(stream: &StreamInfo) -> serde_json::Value {
    json!({
        "index": stream.index,
        "kind": stream.kind.to_string(),
        "codec": stream.codec,
        "time_base": stream.time_base.to_string(),
        "duration": stream.duration,
    })
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Probe { input, json } => {
            let demuxer = open_demuxer(&input, MediaKind::Video, &cli.global)?;
            let (duration_us, source) = demuxer.resolve_duration();
            let format = demuxer
                .session()
                .map(|session| session.format_name())
                .unwrap_or_default();

            if json {
                let payload = json!({
                    "format": format,
                    "duration_us": duration_us,
                    "duration_source": duration_source_label(source),
                    "streams": demuxer.streams().iter().map(stream_json).collect::<Vec<_>>(),
                    "best_video": demuxer.video_stream().map(|stream| stream.index),
                    "best_audio": demuxer.audio_stream().map(|stream| stream.index),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {format}");
                println!(
                    "Duration: {:.3}s ({})",
                    duration_us as f64 / 1_000_000.0,
                    duration_source_label(source)
                );
                for stream in demuxer.streams() {
                    let marker = if Some(stream.index) == demuxer.video_stream().map(|s| s.index)
                        || Some(stream.index) == demuxer.audio_stream().map(|s| s.index)
                    {
                        "*".green().bold()
                    } else {
                        " ".normal()
                    };
                    println!(
                        "{marker} #{} {} codec={} time_base={} duration={}",
                        stream.index,
                        stream.kind,
                        stream.codec,
                        stream.time_base,
                        stream
                            .duration
                            .map(|ticks| ticks.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    );
                }
            }
        }
        Commands::Packets {
            input,
            kind,
            limit,
            seek,
            progress,
        } => {
            let mut demuxer = open_demuxer(&input, kind.into(), &cli.global)?;
            if demuxer.stream_index().is_none() {
                return Ok(());
            }

            if let Some(seek) = seek {
                let position = parse_timecode(&seek)?;
                demuxer.seek_to(position)?;
                if cli.global.verbose {
                    eprintln!("seeked to {:.3}s", position.as_secs_f64());
                }
            }

            let progress_bar = if progress {
                let pb = ProgressBar::new_spinner();
                pb.set_style(ProgressStyle::with_template(
                    "{spinner:.green} {pos} packets {msg}",
                )?);
                Some(pb)
            } else {
                None
            };

            let mut count = 0_u64;
            let mut bytes = 0_usize;
            for packet in demuxer.packets() {
                if limit.is_some_and(|limit| count >= limit) {
                    break;
                }
                let packet = packet?;
                count += 1;
                bytes += packet.size();

                match &progress_bar {
                    Some(pb) => pb.inc(1),
                    None => println!(
                        "stream={} pts={} dts={} size={} key={}",
                        packet.stream_index,
                        packet.pts.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
                        packet.dts.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
                        packet.size(),
                        packet.is_keyframe,
                    ),
                }
            }

            if let Some(pb) = progress_bar {
                pb.finish_with_message("done");
            }

            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "{count} packet(s), {bytes} byte(s){}",
                    if demuxer.is_eof() { ", end of stream" } else { "" }
                )
                .green()
            );
        }
        Commands::Duration { input, kind } => {
            let demuxer = open_demuxer(&input, kind.into(), &cli.global)?;
            let (duration_us, source) = demuxer.resolve_duration();
            println!(
                "{duration_us} us ({:.3}s, from {})",
                duration_us as f64 / 1_000_000.0,
                duration_source_label(source)
            );
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "streamdemux", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
