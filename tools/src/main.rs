use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glob::Pattern;
use log::{debug, info, warn};
use serde::Serialize;
use stream::{Gap, ReceiveError, Received, StreamConfig, StreamReceiver, StreamSender};
use tools::{
    format_pretty, generate_capture, sine_chunk, InspectReport, Inspector, ReceiverReport,
};
use wire::{decode_header, SampleFormat, HEADER_FRAME_SIZE};

#[derive(Parser)]
#[command(
    name = "netpcm-tools",
    version,
    about = "netpcm inspection, capture and streaming tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log verbosity.
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect frame files.
    Inspect {
        /// Frame file, or a directory of frame files.
        path: PathBuf,
        /// Header frame used to decode audio frames.
        #[arg(long)]
        header: Option<PathBuf>,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
    /// Write a deterministic capture of a sine tone.
    Generate {
        /// Directory receiving the frame files and summary.json.
        #[arg(long)]
        out_dir: PathBuf,
        /// Number of audio chunks.
        #[arg(long, default_value_t = 100)]
        chunks: usize,
        /// Tone frequency in Hz.
        #[arg(long, default_value_t = 440.0)]
        frequency: f32,
        #[command(flatten)]
        stream: StreamArgs,
    },
    /// Stream a sine tone over UDP at real-time pace.
    Send {
        /// Destination address.
        #[arg(long)]
        dest: SocketAddr,
        /// Local address to bind.
        #[arg(long, default_value = "0.0.0.0:0")]
        bind: SocketAddr,
        /// Stop after this many chunks. Streams forever when absent.
        #[arg(long)]
        chunks: Option<u64>,
        /// Tone frequency in Hz.
        #[arg(long, default_value_t = 440.0)]
        frequency: f32,
        #[command(flatten)]
        stream: StreamArgs,
    },
    /// Receive a stream over UDP and report what arrived.
    Listen {
        /// Local address to bind.
        #[arg(long)]
        bind: SocketAddr,
        /// Stop after this many datagrams.
        #[arg(long)]
        max_frames: Option<u64>,
        /// Stop when nothing arrives for this many milliseconds.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        idle_timeout_ms: Option<u64>,
    },
}

#[derive(Args, Debug, Clone)]
struct StreamArgs {
    /// Sample rate in Hz.
    #[arg(long, default_value_t = 48_000.0)]
    sample_rate: f32,
    /// PCM encoding of audio frames.
    #[arg(long, value_enum, default_value_t = FormatArg::Pcm16)]
    format: FormatArg,
    /// Interleaved channels.
    #[arg(long, default_value_t = 2)]
    channels: u16,
    /// Sample-frames per chunk.
    #[arg(long, default_value_t = 64)]
    frame_size: u16,
    /// Chunks between header frames (default: about one per second).
    #[arg(long)]
    header_interval: Option<u32>,
}

impl StreamArgs {
    fn config(&self) -> StreamConfig {
        StreamConfig {
            sample_rate: self.sample_rate,
            format: self.format.into(),
            channels: self.channels,
            frame_size: self.frame_size,
            header_interval: self.header_interval,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Pcm16,
    Float,
}

impl From<FormatArg> for SampleFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pcm16 => Self::Pcm16,
            FormatArg::Float => Self::PcmFloat,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut env_builder = env_logger::Builder::from_default_env();
    env_builder
        .filter_level(cli.log_level.to_level_filter())
        .format_timestamp_millis()
        .try_init()
        .context("init logger")?;

    match cli.command {
        Command::Inspect {
            path,
            header,
            glob,
            format,
        } => inspect(&path, header.as_deref(), glob.as_deref(), format),
        Command::Generate {
            out_dir,
            chunks,
            frequency,
            stream,
        } => generate(&out_dir, chunks, frequency, &stream.config()),
        Command::Send {
            dest,
            bind,
            chunks,
            frequency,
            stream,
        } => send(dest, bind, chunks, frequency, &stream.config()),
        Command::Listen {
            bind,
            max_frames,
            idle_timeout_ms,
        } => listen(bind, max_frames, idle_timeout_ms.map(Duration::from_millis)),
    }
}

#[derive(Serialize)]
struct PathReport {
    path: String,
    #[serde(flatten)]
    report: InspectReport,
}

fn inspect(
    path: &Path,
    header: Option<&Path>,
    glob: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let descriptor = match header {
        Some(header) => {
            let bytes =
                fs::read(header).with_context(|| format!("read header {}", header.display()))?;
            let decoded = decode_header(&bytes)
                .with_context(|| format!("decode header {}", header.display()))?;
            Some(decoded.descriptor)
        }
        None => None,
    };
    let mut inspector = Inspector::new(descriptor);

    let paths = if path.is_dir() {
        collect_frame_paths(path, glob)?
    } else {
        vec![path.to_path_buf()]
    };

    let mut reports = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = fs::read(&path).with_context(|| format!("read frame {}", path.display()))?;
        reports.push(PathReport {
            path: path.display().to_string(),
            report: inspector.inspect(&bytes),
        });
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&reports).context("serialize json")?;
            println!("{json}");
        }
        OutputFormat::Pretty => {
            for entry in &reports {
                println!("== {} ==", entry.path);
                println!("{}", format_pretty(&entry.report));
            }
        }
    }
    Ok(())
}

/// Files in `dir` matching `glob`, sorted by name so capture order is kept.
fn collect_frame_paths(dir: &Path, glob: Option<&str>) -> Result<Vec<PathBuf>> {
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

fn generate(out_dir: &Path, chunks: usize, frequency: f32, config: &StreamConfig) -> Result<()> {
    let (frames, summary) =
        generate_capture(config, chunks, frequency).context("encode capture")?;
    fs::create_dir_all(out_dir).with_context(|| format!("create dir {}", out_dir.display()))?;
    for frame in &frames {
        let path = out_dir.join(&frame.name);
        fs::write(&path, &frame.bytes).with_context(|| format!("write {}", path.display()))?;
    }
    let summary_path = out_dir.join("summary.json");
    let json = serde_json::to_string_pretty(&summary).context("serialize summary")?;
    fs::write(&summary_path, json)
        .with_context(|| format!("write {}", summary_path.display()))?;
    info!(
        "wrote {} frames ({} headers) to {}",
        frames.len(),
        summary.header_frames,
        out_dir.display()
    );
    Ok(())
}

fn send(
    dest: SocketAddr,
    bind: SocketAddr,
    chunks: Option<u64>,
    frequency: f32,
    config: &StreamConfig,
) -> Result<()> {
    if !(config.sample_rate.is_finite() && config.sample_rate > 0.0) {
        bail!("sample rate must be positive, got {}", config.sample_rate);
    }
    let socket = UdpSocket::bind(bind).with_context(|| format!("bind {bind}"))?;
    socket
        .connect(dest)
        .with_context(|| format!("connect {dest}"))?;

    let mut sender = StreamSender::new(config);
    let descriptor = *sender.descriptor();
    let mut header = vec![0u8; HEADER_FRAME_SIZE];
    let mut audio = vec![0u8; sender.buffer_len()];
    let chunk_duration =
        Duration::from_secs_f64(f64::from(config.frame_size) / f64::from(config.sample_rate));
    info!(
        "sending {frequency} Hz tone to {dest}: {} Hz, {:?}, {} channels, {} frames per chunk",
        descriptor.sample_rate(),
        descriptor.sample_format(),
        descriptor.channel_count(),
        descriptor.frame_size()
    );

    let start = Instant::now();
    let mut first_frame = 0u64;
    let mut sent_chunks = 0u64;
    while chunks.map_or(true, |limit| sent_chunks < limit) {
        let samples = sine_chunk(&descriptor, frequency, first_frame);
        let sent = sender
            .encode_chunk(&samples, &mut header, &mut audio)
            .context("encode chunk")?;
        if let Some(len) = sent.header_len {
            socket.send(&header[..len]).context("send header frame")?;
        }
        socket
            .send(&audio[..sent.audio_len])
            .context("send audio frame")?;

        sent_chunks += 1;
        first_frame += u64::from(config.frame_size);
        #[allow(clippy::cast_precision_loss)]
        let due = chunk_duration.mul_f64(sent_chunks as f64);
        if let Some(wait) = due.checked_sub(start.elapsed()) {
            thread::sleep(wait);
        }
    }
    info!("sent {sent_chunks} chunks in {:.2?}", start.elapsed());
    Ok(())
}

fn listen(bind: SocketAddr, max_frames: Option<u64>, idle_timeout: Option<Duration>) -> Result<()> {
    let socket = UdpSocket::bind(bind).with_context(|| format!("bind {bind}"))?;
    socket
        .set_read_timeout(idle_timeout)
        .context("set read timeout")?;
    info!("listening on {}", socket.local_addr().context("local addr")?);

    let mut receiver = StreamReceiver::new();
    let mut buf = vec![0u8; 65_536];
    let mut frames = 0u64;
    while max_frames.map_or(true, |limit| frames < limit) {
        let (len, peer) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(err) if matches!(err.kind(), IoErrorKind::WouldBlock | IoErrorKind::TimedOut) => {
                info!("idle timeout reached");
                break;
            }
            Err(err) => return Err(err).context("receive datagram"),
        };
        frames += 1;
        match receiver.receive(&buf[..len]) {
            Ok(Received::Header {
                descriptor,
                changed: true,
            }) => info!(
                "{peer}: stream {} Hz, {:?}, {} channels, {} frames per chunk",
                descriptor.sample_rate(),
                descriptor.sample_format(),
                descriptor.channel_count(),
                descriptor.frame_size()
            ),
            Ok(Received::Header { .. }) => debug!("{peer}: header repeated"),
            Ok(Received::Audio {
                sample_index, gap, ..
            }) => match gap {
                Some(Gap::Lost { frames: lost }) => {
                    warn!("{peer}: {lost} sample-frames lost before {sample_index}");
                }
                Some(Gap::Late { frames: late }) => {
                    warn!("{peer}: chunk {sample_index} is {late} sample-frames late");
                }
                None => debug!("{peer}: chunk {sample_index}"),
            },
            Err(ReceiveError::NoDescriptor) => debug!("{peer}: waiting for header"),
            Err(ReceiveError::Wire(err)) => warn!("{peer}: dropped frame: {err}"),
        }
    }

    let report = ReceiverReport::from(receiver.stats());
    let json = serde_json::to_string_pretty(&report).context("serialize stats")?;
    println!("{json}");
    Ok(())
}
