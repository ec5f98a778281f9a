//! Audio frame codec.
//!
//! An audio frame carries one chunk of interleaved samples. It does not repeat
//! the descriptor; instead it embeds the descriptor checksum so a receiver can
//! tell which stream configuration the chunk belongs to.

use crate::descriptor::{SampleFormat, SessionDescriptor};
use crate::error::{WireError, WireResult};
use crate::frame::{audio_frame_size, AUDIO_MARKER, AUDIO_PREAMBLE_SIZE};

/// Full-scale value used for 16-bit quantization.
pub const PCM16_SCALE: f32 = 32767.0;

/// A successfully decoded audio frame. The samples are in the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedAudio {
    /// Sample-frame counter assigned by the sender.
    pub sample_index: u32,
    /// Bytes consumed from the input.
    pub bytes_read: usize,
}

/// Encodes one chunk of interleaved samples into `out`.
///
/// `samples.len()` must equal `channel_count * frame_size`; partial chunks are
/// rejected. Returns the bytes written.
pub fn encode_audio(
    descriptor: &SessionDescriptor,
    samples: &[f32],
    sample_index: u32,
    out: &mut [u8],
) -> WireResult<usize> {
    check_dimensions(descriptor, samples.len())?;
    let needed = audio_frame_size(descriptor);
    if out.len() < needed {
        return Err(WireError::InsufficientMemory {
            needed,
            available: out.len(),
        });
    }

    out[0] = AUDIO_MARKER;
    out[1..5].copy_from_slice(&descriptor.checksum().to_le_bytes());
    out[5..9].copy_from_slice(&sample_index.to_le_bytes());

    let payload = &mut out[AUDIO_PREAMBLE_SIZE..needed];
    match descriptor.sample_format() {
        SampleFormat::Pcm16 => {
            for (dst, &sample) in payload.chunks_exact_mut(2).zip(samples) {
                dst.copy_from_slice(&quantize_pcm16(sample).to_le_bytes());
            }
        }
        SampleFormat::PcmFloat => {
            for (dst, &sample) in payload.chunks_exact_mut(4).zip(samples) {
                dst.copy_from_slice(&sample.to_le_bytes());
            }
        }
    }

    Ok(needed)
}

/// Decodes one audio frame into `out`.
///
/// Checks run in a fixed order and the first failure wins: dimensions,
/// length, marker, then the embedded checksum against `descriptor`. The
/// descriptor itself is trusted; it is expected to come from
/// [`decode_header`](crate::decode_header) or [`SessionDescriptor::new`].
/// On error `out` is left untouched.
pub fn decode_audio(
    descriptor: &SessionDescriptor,
    buf: &[u8],
    out: &mut [f32],
) -> WireResult<DecodedAudio> {
    check_dimensions(descriptor, out.len())?;
    let needed = audio_frame_size(descriptor);
    if buf.len() < needed {
        return Err(WireError::InsufficientMemory {
            needed,
            available: buf.len(),
        });
    }
    if buf[0] != AUDIO_MARKER {
        return Err(WireError::NoAudioChunk { found: buf[0] });
    }

    let found = u32::from_le_bytes([buf[1], buf[2], buf[3], buf[4]]);
    if found != descriptor.checksum() {
        return Err(WireError::InvalidChecksum {
            expected: descriptor.checksum(),
            found,
        });
    }
    let sample_index = u32::from_le_bytes([buf[5], buf[6], buf[7], buf[8]]);

    let payload = &buf[AUDIO_PREAMBLE_SIZE..needed];
    match descriptor.sample_format() {
        SampleFormat::Pcm16 => {
            for (dst, src) in out.iter_mut().zip(payload.chunks_exact(2)) {
                *dst = dequantize_pcm16(i16::from_le_bytes([src[0], src[1]]));
            }
        }
        SampleFormat::PcmFloat => {
            for (dst, src) in out.iter_mut().zip(payload.chunks_exact(4)) {
                *dst = f32::from_le_bytes([src[0], src[1], src[2], src[3]]);
            }
        }
    }

    Ok(DecodedAudio {
        sample_index,
        bytes_read: needed,
    })
}

/// Encodes into a destination that may be absent. Absence is reported first.
pub fn encode_audio_into(
    descriptor: &SessionDescriptor,
    samples: Option<&[f32]>,
    sample_index: u32,
    out: Option<&mut [u8]>,
) -> WireResult<usize> {
    let (Some(samples), Some(out)) = (samples, out) else {
        return Err(WireError::InvalidPointer);
    };
    encode_audio(descriptor, samples, sample_index, out)
}

/// Decodes from a source that may be absent. Absence is reported first.
pub fn decode_audio_from(
    descriptor: &SessionDescriptor,
    buf: Option<&[u8]>,
    out: Option<&mut [f32]>,
) -> WireResult<DecodedAudio> {
    let (Some(buf), Some(out)) = (buf, out) else {
        return Err(WireError::InvalidPointer);
    };
    decode_audio(descriptor, buf, out)
}

/// Quantizes an amplitude to 16 bits.
///
/// Input is clamped to `[-1, 1]` before scaling and then truncated toward
/// zero. NaN maps to 0.
#[must_use]
pub fn quantize_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * PCM16_SCALE) as i16
}

/// Inverse of [`quantize_pcm16`], up to quantization error.
#[must_use]
pub fn dequantize_pcm16(value: i16) -> f32 {
    f32::from(value) / PCM16_SCALE
}

fn check_dimensions(descriptor: &SessionDescriptor, actual: usize) -> WireResult<()> {
    let expected = descriptor.samples_per_chunk();
    if actual == expected {
        Ok(())
    } else {
        Err(WireError::InvalidBufferDimensions { expected, actual })
    }
}
