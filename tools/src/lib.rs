//! Inspection and capture tools for netpcm.
//!
//! This crate provides utilities for looking at frames on the wire:
//!
//! - Classify and decode single frames, with or without a known descriptor
//! - Generate deterministic captures of a test tone
//! - Summarize receiver counters for reports
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to understand what the codec is doing.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use stream::{ReceiverStats, StreamConfig, StreamSender};
use wire::{
    audio_frame_size, decode_audio, decode_header, FrameKind, SessionDescriptor, WireError,
    WireResult, AUDIO_PREAMBLE_SIZE, HEADER_FRAME_SIZE,
};

/// Amplitude of generated test tones.
pub const SINE_AMPLITUDE: f32 = 0.5;

/// Result of inspecting one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectReport {
    /// Size of the inspected buffer in bytes.
    pub len: usize,
    pub frame: FrameReport,
    /// Why the frame could not be fully decoded, if it could not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

/// What could be read from a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameReport {
    Header {
        #[serde(skip_serializing_if = "Option::is_none")]
        descriptor: Option<SessionDescriptor>,
        /// Size of the audio frames this descriptor announces.
        #[serde(skip_serializing_if = "Option::is_none")]
        audio_frame_len: Option<usize>,
    },
    Audio {
        /// Preamble fields; absent when the frame is too short to hold them.
        #[serde(skip_serializing_if = "Option::is_none")]
        checksum: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        sample_index: Option<u32>,
        payload_len: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        levels: Option<Levels>,
    },
    Unknown {
        #[serde(skip_serializing_if = "Option::is_none")]
        marker: Option<u8>,
    },
}

/// Signal levels of a decoded audio chunk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Levels {
    pub peak: f32,
    pub rms: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub message: String,
}

impl From<&WireError> for ErrorReport {
    fn from(err: &WireError) -> Self {
        Self {
            kind: err.kind().as_str(),
            message: err.to_string(),
        }
    }
}

/// Inspects one frame.
///
/// Header frames are fully decoded. Audio frames are decoded only when a
/// descriptor is supplied; otherwise only the preamble is reported.
pub fn inspect_frame(bytes: &[u8], descriptor: Option<&SessionDescriptor>) -> InspectReport {
    match FrameKind::classify(bytes) {
        Some(FrameKind::Header) => inspect_header(bytes),
        Some(FrameKind::Audio) => inspect_audio(bytes, descriptor),
        None => InspectReport {
            len: bytes.len(),
            frame: FrameReport::Unknown {
                marker: bytes.first().copied(),
            },
            error: None,
        },
    }
}

fn inspect_header(bytes: &[u8]) -> InspectReport {
    let (descriptor, error) = match decode_header(bytes) {
        Ok(decoded) => (Some(decoded.descriptor), None),
        Err(err) => (None, Some(ErrorReport::from(&err))),
    };
    InspectReport {
        len: bytes.len(),
        frame: FrameReport::Header {
            descriptor,
            audio_frame_len: descriptor.as_ref().map(audio_frame_size),
        },
        error,
    }
}

fn inspect_audio(bytes: &[u8], descriptor: Option<&SessionDescriptor>) -> InspectReport {
    let checksum = read_u32(bytes, 1);
    let sample_index = read_u32(bytes, 5);
    let payload_len = bytes.len().saturating_sub(AUDIO_PREAMBLE_SIZE);

    let mut error = None;
    let levels = descriptor.and_then(|descriptor| {
        // The sample buffer is sized from the descriptor, so a frame too
        // short for it is reported before anything is allocated.
        let needed = audio_frame_size(descriptor);
        if bytes.len() < needed {
            error = Some(ErrorReport::from(&WireError::InsufficientMemory {
                needed,
                available: bytes.len(),
            }));
            return None;
        }
        let mut samples = vec![0f32; descriptor.samples_per_chunk()];
        match decode_audio(descriptor, bytes, &mut samples) {
            Ok(_) => Some(levels(&samples)),
            Err(err) => {
                error = Some(ErrorReport::from(&err));
                None
            }
        }
    });

    InspectReport {
        len: bytes.len(),
        frame: FrameReport::Audio {
            checksum,
            sample_index,
            payload_len,
            levels,
        },
        error,
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let field = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([field[0], field[1], field[2], field[3]]))
}

/// Peak and RMS level of a block of samples.
pub fn levels(samples: &[f32]) -> Levels {
    if samples.is_empty() {
        return Levels { peak: 0.0, rms: 0.0 };
    }
    let peak = samples.iter().fold(0f32, |acc, s| acc.max(s.abs()));
    let energy: f64 = samples.iter().map(|s| f64::from(*s) * f64::from(*s)).sum();
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    let rms = (energy / samples.len() as f64).sqrt() as f32;
    Levels { peak, rms }
}

/// Inspects frames in order, learning the descriptor from header frames.
#[derive(Debug, Default)]
pub struct Inspector {
    descriptor: Option<SessionDescriptor>,
}

impl Inspector {
    pub const fn new(descriptor: Option<SessionDescriptor>) -> Self {
        Self { descriptor }
    }

    pub const fn descriptor(&self) -> Option<&SessionDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn inspect(&mut self, bytes: &[u8]) -> InspectReport {
        let report = inspect_frame(bytes, self.descriptor.as_ref());
        if let FrameReport::Header {
            descriptor: Some(descriptor),
            ..
        } = &report.frame
        {
            self.descriptor = Some(*descriptor);
        }
        report
    }
}

/// Renders a report for terminal output.
pub fn format_pretty(report: &InspectReport) -> String {
    let mut out = String::new();
    match &report.frame {
        FrameReport::Header { descriptor, .. } => {
            let _ = writeln!(out, "header frame ({} bytes)", report.len);
            if let Some(descriptor) = descriptor {
                let _ = writeln!(
                    out,
                    "  protocol: {}  format: {:?}  rate: {} Hz",
                    descriptor.protocol_id(),
                    descriptor.sample_format(),
                    descriptor.sample_rate()
                );
                let _ = writeln!(
                    out,
                    "  channels: {}  frame size: {}  checksum: 0x{:08x}",
                    descriptor.channel_count(),
                    descriptor.frame_size(),
                    descriptor.checksum()
                );
                let _ = writeln!(out, "  audio frames: {} bytes", audio_frame_size(descriptor));
            }
        }
        FrameReport::Audio {
            checksum,
            sample_index,
            payload_len,
            levels,
        } => {
            let _ = writeln!(out, "audio frame ({} bytes)", report.len);
            if let (Some(checksum), Some(sample_index)) = (checksum, sample_index) {
                let _ = writeln!(
                    out,
                    "  checksum: 0x{checksum:08x}  sample index: {sample_index}"
                );
            }
            let _ = writeln!(out, "  payload: {payload_len} bytes");
            if let Some(levels) = levels {
                let _ = writeln!(out, "  peak: {:.4}  rms: {:.4}", levels.peak, levels.rms);
            }
        }
        FrameReport::Unknown { marker } => match marker {
            Some(marker) => {
                let _ = writeln!(
                    out,
                    "unknown frame, marker 0x{marker:02x} ({} bytes)",
                    report.len
                );
            }
            None => {
                let _ = writeln!(out, "empty frame");
            }
        },
    }
    if let Some(error) = &report.error {
        let _ = writeln!(out, "  error: {} ({})", error.message, error.kind);
    }
    out.trim_end().to_string()
}

/// One chunk of a sine tone, interleaved, starting at `first_frame`.
///
/// Every channel carries the same tone. Phase is computed from the absolute
/// frame position so consecutive chunks join without discontinuity.
pub fn sine_chunk(descriptor: &SessionDescriptor, frequency: f32, first_frame: u64) -> Vec<f32> {
    let channels = usize::from(descriptor.channel_count());
    let frames = u64::from(descriptor.frame_size());
    let rate = f64::from(descriptor.sample_rate());
    let mut samples = Vec::with_capacity(descriptor.samples_per_chunk());
    for frame in first_frame..first_frame + frames {
        #[allow(clippy::cast_precision_loss)]
        let t = frame as f64 / rate;
        #[allow(clippy::cast_possible_truncation)]
        let value =
            (f64::from(SINE_AMPLITUDE) * (std::f64::consts::TAU * f64::from(frequency) * t).sin())
                as f32;
        samples.extend(std::iter::repeat(value).take(channels));
    }
    samples
}

/// One encoded frame of a generated capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    /// File name, `header_NNNNNN.bin` or `audio_NNNNNN.bin` by chunk number.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Description of a generated capture, written next to the frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureSummary {
    pub descriptor: SessionDescriptor,
    pub frequency: f32,
    pub chunks: usize,
    pub header_interval: u32,
    pub header_frames: usize,
    pub audio_frames: usize,
    pub header_frame_len: usize,
    pub audio_frame_len: usize,
    pub files: Vec<String>,
}

/// Encodes `chunks` chunks of a sine tone through a [`StreamSender`].
pub fn generate_capture(
    config: &StreamConfig,
    chunks: usize,
    frequency: f32,
) -> WireResult<(Vec<CapturedFrame>, CaptureSummary)> {
    let mut sender = StreamSender::new(config);
    let descriptor = *sender.descriptor();
    let mut header = vec![0u8; HEADER_FRAME_SIZE];
    let mut audio = vec![0u8; sender.buffer_len()];
    let mut frames = Vec::new();
    let mut header_frames = 0;
    let mut first_frame = 0u64;

    for chunk in 0..chunks {
        let samples = sine_chunk(&descriptor, frequency, first_frame);
        let sent = sender.encode_chunk(&samples, &mut header, &mut audio)?;
        if let Some(len) = sent.header_len {
            header_frames += 1;
            frames.push(CapturedFrame {
                name: format!("header_{chunk:06}.bin"),
                bytes: header[..len].to_vec(),
            });
        }
        frames.push(CapturedFrame {
            name: format!("audio_{chunk:06}.bin"),
            bytes: audio[..sent.audio_len].to_vec(),
        });
        first_frame += u64::from(descriptor.frame_size());
    }

    let summary = CaptureSummary {
        descriptor,
        frequency,
        chunks,
        header_interval: sender.header_interval(),
        header_frames,
        audio_frames: chunks,
        header_frame_len: HEADER_FRAME_SIZE,
        audio_frame_len: audio_frame_size(&descriptor),
        files: frames.iter().map(|frame| frame.name.clone()).collect(),
    };
    Ok((frames, summary))
}

/// Receiver counters in report form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiverReport {
    pub headers: u64,
    pub descriptor_changes: u64,
    pub audio_frames: u64,
    pub without_descriptor: u64,
    pub lost_frames: u64,
    pub late_chunks: u64,
    pub rejected: BTreeMap<&'static str, u64>,
}

impl From<&ReceiverStats> for ReceiverReport {
    fn from(stats: &ReceiverStats) -> Self {
        Self {
            headers: stats.headers,
            descriptor_changes: stats.descriptor_changes,
            audio_frames: stats.audio_frames,
            without_descriptor: stats.without_descriptor,
            lost_frames: stats.lost_frames,
            late_chunks: stats.late_chunks,
            rejected: stats
                .rejected
                .iter()
                .map(|(kind, count)| (kind.as_str(), *count))
                .collect(),
        }
    }
}
