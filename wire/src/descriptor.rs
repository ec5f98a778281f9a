//! Session descriptor: the fixed 16-byte record describing a stream.

use crate::crc::crc32;

/// Protocol revision spoken by this crate.
///
/// Decoders reject every other value.
pub const PROTOCOL_ID: u16 = 1;

/// Encoded descriptor size in bytes (16 total).
pub const DESCRIPTOR_SIZE: usize = 2 + 2 + 4 + 2 + 2 + 4;

/// Byte range of the checksum field inside an encoded descriptor.
pub(crate) const CHECKSUM_RANGE: std::ops::Range<usize> = 12..16;

/// PCM sample encoding carried in audio frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u16)]
pub enum SampleFormat {
    /// Signed 16-bit integers, quantized from `[-1, 1]` amplitudes.
    Pcm16 = 1,
    /// 32-bit IEEE floats, passed through unchanged.
    PcmFloat = 2,
}

impl SampleFormat {
    /// Parses a wire code. Returns `None` for codes revision 1 does not define.
    #[must_use]
    pub const fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            1 => Some(Self::Pcm16),
            2 => Some(Self::PcmFloat),
            _ => None,
        }
    }

    /// Returns the wire code.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self as u16
    }

    /// Bytes per encoded sample.
    #[must_use]
    pub const fn sample_width(self) -> usize {
        match self {
            Self::Pcm16 => 2,
            Self::PcmFloat => 4,
        }
    }
}

/// Stream parameters shared by sender and receiver.
///
/// Built once per stream configuration and immutable afterwards. The protocol
/// id and checksum are derived; callers cannot set them.
///
/// Layout, little-endian:
///
/// | offset | size | field           |
/// |--------|------|-----------------|
/// | 0      | 2    | `protocol_id`   |
/// | 2      | 2    | `sample_format` |
/// | 4      | 4    | `sample_rate`   |
/// | 8      | 2    | `channel_count` |
/// | 10     | 2    | `frame_size`    |
/// | 12     | 4    | `checksum`      |
///
/// Equality compares the encoded bytes, so a NaN sample rate equals itself
/// and `0.0` differs from `-0.0`.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SessionDescriptor {
    protocol_id: u16,
    sample_format: SampleFormat,
    sample_rate: f32,
    channel_count: u16,
    frame_size: u16,
    checksum: u32,
}

impl SessionDescriptor {
    /// Builds a descriptor and computes its checksum.
    ///
    /// No range validation is applied: zero channels or a zero frame size are
    /// accepted and simply describe empty chunks.
    #[must_use]
    pub fn new(
        sample_rate: f32,
        sample_format: SampleFormat,
        channel_count: u16,
        frame_size: u16,
    ) -> Self {
        let mut descriptor = Self {
            protocol_id: PROTOCOL_ID,
            sample_format,
            sample_rate,
            channel_count,
            frame_size,
            checksum: 0,
        };
        descriptor.checksum = descriptor_checksum(&descriptor);
        descriptor
    }

    /// Reassembles a descriptor whose checksum and revision were already
    /// verified by the header decoder.
    pub(crate) fn from_verified_parts(
        sample_format: SampleFormat,
        sample_rate: f32,
        channel_count: u16,
        frame_size: u16,
        checksum: u32,
    ) -> Self {
        Self {
            protocol_id: PROTOCOL_ID,
            sample_format,
            sample_rate,
            channel_count,
            frame_size,
            checksum,
        }
    }

    #[must_use]
    pub const fn protocol_id(&self) -> u16 {
        self.protocol_id
    }

    #[must_use]
    pub const fn sample_format(&self) -> SampleFormat {
        self.sample_format
    }

    /// Nominal sample rate in Hz. Informational; the codec never checks it.
    #[must_use]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    #[must_use]
    pub const fn channel_count(&self) -> u16 {
        self.channel_count
    }

    /// Sample-frames per audio chunk (not bytes, not samples).
    #[must_use]
    pub const fn frame_size(&self) -> u16 {
        self.frame_size
    }

    /// CRC-32 over the encoded descriptor with this field zeroed.
    #[must_use]
    pub const fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Interleaved samples in one audio chunk.
    #[must_use]
    pub const fn samples_per_chunk(&self) -> usize {
        self.channel_count as usize * self.frame_size as usize
    }

    /// Serializes the descriptor field by field.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; DESCRIPTOR_SIZE] {
        let mut out = [0u8; DESCRIPTOR_SIZE];
        out[0..2].copy_from_slice(&self.protocol_id.to_le_bytes());
        out[2..4].copy_from_slice(&self.sample_format.raw().to_le_bytes());
        out[4..8].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[8..10].copy_from_slice(&self.channel_count.to_le_bytes());
        out[10..12].copy_from_slice(&self.frame_size.to_le_bytes());
        out[CHECKSUM_RANGE].copy_from_slice(&self.checksum.to_le_bytes());
        out
    }
}

/// Recomputes the checksum a descriptor with these fields must carry.
#[must_use]
pub fn descriptor_checksum(descriptor: &SessionDescriptor) -> u32 {
    let mut bytes = descriptor.to_bytes();
    raw_checksum(&mut bytes)
}

impl PartialEq for SessionDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for SessionDescriptor {}

/// Zeroes the checksum field in place and hashes the record.
pub(crate) fn raw_checksum(bytes: &mut [u8; DESCRIPTOR_SIZE]) -> u32 {
    bytes[CHECKSUM_RANGE].fill(0);
    crc32(&bytes[..])
}
