//! Incoming stream state: last known descriptor and gap detection.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, trace, warn};
use wire::{
    audio_frame_size, decode_audio, decode_header, ErrorKind, FrameKind, SessionDescriptor,
    WireError,
};

/// Largest UDP payload over IPv4, the default cap on announced audio frames.
pub const DEFAULT_MAX_FRAME_LEN: usize = 65_507;

/// Errors returned by [`StreamReceiver::receive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveError {
    /// An audio frame arrived before any header frame.
    NoDescriptor,

    /// The frame was rejected by the codec.
    Wire(WireError),
}

impl fmt::Display for ReceiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDescriptor => write!(f, "audio frame received before any header"),
            Self::Wire(err) => write!(f, "wire error: {err}"),
        }
    }
}

impl std::error::Error for ReceiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NoDescriptor => None,
            Self::Wire(err) => Some(err),
        }
    }
}

impl From<WireError> for ReceiveError {
    fn from(err: WireError) -> Self {
        Self::Wire(err)
    }
}

/// Discontinuity in the sample index sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gap {
    /// Sample-frames skipped before this chunk (dropped packets).
    Lost { frames: u32 },
    /// Chunk is this many sample-frames behind the expected index
    /// (reordered or duplicated packet).
    Late { frames: u32 },
}

/// Outcome of a successfully received frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Received<'a> {
    Header {
        descriptor: SessionDescriptor,
        /// `true` when this descriptor differs from the previous one.
        changed: bool,
    },
    Audio {
        sample_index: u32,
        /// Interleaved samples, valid until the next call to `receive`.
        samples: &'a [f32],
        gap: Option<Gap>,
    },
}

/// Counters kept by the receiver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub headers: u64,
    pub descriptor_changes: u64,
    pub audio_frames: u64,
    /// Audio frames dropped because no descriptor was known yet.
    pub without_descriptor: u64,
    /// Sample-frames missing between received chunks.
    pub lost_frames: u64,
    /// Chunks that arrived behind the expected sample index.
    pub late_chunks: u64,
    /// Frames rejected by the codec, per error kind.
    pub rejected: BTreeMap<ErrorKind, u64>,
}

impl ReceiverStats {
    /// Total frames rejected for any reason.
    #[must_use]
    pub fn total_rejected(&self) -> u64 {
        self.rejected.values().sum::<u64>() + self.without_descriptor
    }
}

/// Decodes frames from an unreliable transport.
///
/// Keeps the last successfully decoded descriptor so audio frames can be
/// decoded without a handshake. Frames are never reordered or buffered; gaps
/// are only reported.
///
/// Headers announcing audio frames longer than the receiver's maximum frame
/// length are rejected with [`WireError::InsufficientMemory`] and never
/// stored, so a forged header cannot force a huge sample buffer.
#[derive(Debug)]
pub struct StreamReceiver {
    descriptor: Option<SessionDescriptor>,
    next_index: Option<u32>,
    samples: Vec<f32>,
    max_frame_len: usize,
    stats: ReceiverStats,
}

impl Default for StreamReceiver {
    fn default() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }
}

impl StreamReceiver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a receiver accepting audio frames of at most `max_frame_len`
    /// bytes.
    #[must_use]
    pub const fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            descriptor: None,
            next_index: None,
            samples: Vec::new(),
            max_frame_len,
            stats: ReceiverStats {
                headers: 0,
                descriptor_changes: 0,
                audio_frames: 0,
                without_descriptor: 0,
                lost_frames: 0,
                late_chunks: 0,
                rejected: BTreeMap::new(),
            },
        }
    }

    #[must_use]
    pub const fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    /// Last successfully decoded descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> Option<&SessionDescriptor> {
        self.descriptor.as_ref()
    }

    /// Sample index the next in-order chunk should carry.
    #[must_use]
    pub const fn next_sample_index(&self) -> Option<u32> {
        self.next_index
    }

    #[must_use]
    pub const fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    /// Forgets the descriptor and gap tracking. Counters are kept.
    pub fn reset(&mut self) {
        self.descriptor = None;
        self.next_index = None;
        self.samples.clear();
    }

    /// Decodes one frame.
    ///
    /// Header frames replace the known descriptor. Audio frames are decoded
    /// with the known descriptor; frames from another session fail with
    /// [`WireError::InvalidChecksum`]. A rejected frame changes nothing but
    /// the counters.
    pub fn receive(&mut self, frame: &[u8]) -> Result<Received<'_>, ReceiveError> {
        // Audio frames can be shorter than a header frame and would trip the
        // header length check, so the marker is peeked first.
        if FrameKind::classify(frame) == Some(FrameKind::Audio) {
            return self.receive_audio(frame);
        }
        match decode_header(frame) {
            Ok(decoded) => {
                let needed = audio_frame_size(&decoded.descriptor);
                if needed > self.max_frame_len {
                    return Err(self.reject(WireError::InsufficientMemory {
                        needed,
                        available: self.max_frame_len,
                    }));
                }
                Ok(self.accept_header(decoded.descriptor))
            }
            Err(WireError::NotAHeader { .. }) => self.receive_audio(frame),
            Err(err) => Err(self.reject(err)),
        }
    }

    fn accept_header(&mut self, descriptor: SessionDescriptor) -> Received<'static> {
        self.stats.headers += 1;
        let changed = self
            .descriptor
            .map_or(true, |known| known.checksum() != descriptor.checksum());
        if changed {
            debug!(
                "new descriptor: {} Hz, {:?}, {} channels, {} frames (checksum 0x{:08x})",
                descriptor.sample_rate(),
                descriptor.sample_format(),
                descriptor.channel_count(),
                descriptor.frame_size(),
                descriptor.checksum()
            );
            self.stats.descriptor_changes += 1;
            self.samples.clear();
            self.samples.resize(descriptor.samples_per_chunk(), 0.0);
            self.next_index = None;
            self.descriptor = Some(descriptor);
        }
        Received::Header {
            descriptor,
            changed,
        }
    }

    fn receive_audio(&mut self, frame: &[u8]) -> Result<Received<'_>, ReceiveError> {
        let Some(descriptor) = self.descriptor else {
            self.stats.without_descriptor += 1;
            trace!("audio frame dropped: no descriptor yet");
            return Err(ReceiveError::NoDescriptor);
        };
        let decoded = match decode_audio(&descriptor, frame, &mut self.samples) {
            Ok(decoded) => decoded,
            Err(err) => return Err(self.reject(err)),
        };

        let sample_index = decoded.sample_index;
        let gap = self
            .next_index
            .and_then(|expected| classify_gap(expected, sample_index));
        match gap {
            Some(Gap::Lost { frames }) => {
                warn!("lost {frames} sample-frames before index {sample_index}");
                self.stats.lost_frames += u64::from(frames);
            }
            Some(Gap::Late { frames }) => {
                warn!("chunk {sample_index} arrived {frames} sample-frames late");
                self.stats.late_chunks += 1;
            }
            None => {}
        }
        if !matches!(gap, Some(Gap::Late { .. })) {
            self.next_index =
                Some(sample_index.wrapping_add(u32::from(descriptor.frame_size())));
        }
        self.stats.audio_frames += 1;
        trace!("audio frame {sample_index}: {} bytes", decoded.bytes_read);

        Ok(Received::Audio {
            sample_index,
            samples: &self.samples,
            gap,
        })
    }

    fn reject(&mut self, err: WireError) -> ReceiveError {
        trace!("frame rejected: {err}");
        *self.stats.rejected.entry(err.kind()).or_default() += 1;
        ReceiveError::Wire(err)
    }
}

/// Compares a received index against the expected one, modulo 2^32.
///
/// Indices less than half the range ahead count as lost frames; anything
/// else counts as late.
#[must_use]
pub const fn classify_gap(expected: u32, received: u32) -> Option<Gap> {
    let ahead = received.wrapping_sub(expected);
    if ahead == 0 {
        None
    } else if ahead < 1 << 31 {
        Some(Gap::Lost { frames: ahead })
    } else {
        Some(Gap::Late {
            frames: expected.wrapping_sub(received),
        })
    }
}
