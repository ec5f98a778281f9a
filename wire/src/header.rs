//! Header frame codec.
//!
//! A header frame is the marker byte followed by the 16 descriptor bytes. It
//! is sent periodically so receivers can (re)acquire the stream parameters
//! without a handshake.

use crate::descriptor::{
    raw_checksum, SampleFormat, SessionDescriptor, CHECKSUM_RANGE, DESCRIPTOR_SIZE, PROTOCOL_ID,
};
use crate::error::{WireError, WireResult};
use crate::frame::{HEADER_FRAME_SIZE, HEADER_MARKER};

/// A successfully decoded header frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedHeader {
    pub descriptor: SessionDescriptor,
    /// Bytes consumed from the input (always [`HEADER_FRAME_SIZE`]).
    pub bytes_read: usize,
}

/// Encodes a header frame into `out` and returns the bytes written.
pub fn encode_header(descriptor: &SessionDescriptor, out: &mut [u8]) -> WireResult<usize> {
    if out.len() < HEADER_FRAME_SIZE {
        return Err(WireError::InsufficientMemory {
            needed: HEADER_FRAME_SIZE,
            available: out.len(),
        });
    }

    out[0] = HEADER_MARKER;
    out[1..HEADER_FRAME_SIZE].copy_from_slice(&descriptor.to_bytes());
    Ok(HEADER_FRAME_SIZE)
}

/// Decodes and validates a header frame.
///
/// Checks run in a fixed order and the first failure wins: length, marker,
/// checksum, then protocol revision. Trailing bytes are ignored.
pub fn decode_header(buf: &[u8]) -> WireResult<DecodedHeader> {
    if buf.len() < HEADER_FRAME_SIZE {
        return Err(WireError::InsufficientMemory {
            needed: HEADER_FRAME_SIZE,
            available: buf.len(),
        });
    }
    if buf[0] != HEADER_MARKER {
        return Err(WireError::NotAHeader { found: buf[0] });
    }

    let mut raw = [0u8; DESCRIPTOR_SIZE];
    raw.copy_from_slice(&buf[1..HEADER_FRAME_SIZE]);

    let found = read_u32(&raw, CHECKSUM_RANGE.start);
    let expected = raw_checksum(&mut raw);
    if found != expected {
        return Err(WireError::InvalidChecksum { expected, found });
    }

    let protocol_id = read_u16(&raw, 0);
    let format_raw = read_u16(&raw, 2);
    if protocol_id != PROTOCOL_ID {
        return Err(WireError::UnsupportedProtocolVersion {
            protocol_id,
            sample_format: format_raw,
        });
    }
    let sample_format =
        SampleFormat::from_raw(format_raw).ok_or(WireError::UnsupportedProtocolVersion {
            protocol_id,
            sample_format: format_raw,
        })?;

    let sample_rate = f32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
    let channel_count = read_u16(&raw, 8);
    let frame_size = read_u16(&raw, 10);

    Ok(DecodedHeader {
        descriptor: SessionDescriptor::from_verified_parts(
            sample_format,
            sample_rate,
            channel_count,
            frame_size,
            found,
        ),
        bytes_read: HEADER_FRAME_SIZE,
    })
}

/// Encodes a header frame into a buffer that may be absent.
///
/// For callers bridging nullable buffers (FFI, optional scratch space).
/// Absence is reported before any other check.
pub fn encode_header_into(
    descriptor: &SessionDescriptor,
    out: Option<&mut [u8]>,
) -> WireResult<usize> {
    let out = out.ok_or(WireError::InvalidPointer)?;
    encode_header(descriptor, out)
}

/// Decodes a header frame from a buffer that may be absent.
pub fn decode_header_from(buf: Option<&[u8]>) -> WireResult<DecodedHeader> {
    let buf = buf.ok_or(WireError::InvalidPointer)?;
    decode_header(buf)
}

fn read_u16(raw: &[u8; DESCRIPTOR_SIZE], offset: usize) -> u16 {
    u16::from_le_bytes([raw[offset], raw[offset + 1]])
}

fn read_u32(raw: &[u8; DESCRIPTOR_SIZE], offset: usize) -> u32 {
    u32::from_le_bytes([
        raw[offset],
        raw[offset + 1],
        raw[offset + 2],
        raw[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::descriptor_checksum;
    use crate::frame::AUDIO_MARKER;

    fn descriptor() -> SessionDescriptor {
        SessionDescriptor::new(44100.0, SampleFormat::Pcm16, 2, 64)
    }

    /// Rewrites the descriptor bytes of a header frame and fixes up the checksum.
    fn reseal(frame: &mut [u8; HEADER_FRAME_SIZE]) {
        let mut raw = [0u8; DESCRIPTOR_SIZE];
        raw.copy_from_slice(&frame[1..]);
        let checksum = raw_checksum(&mut raw);
        frame[1 + CHECKSUM_RANGE.start..].copy_from_slice(&checksum.to_le_bytes());
    }

    #[test]
    fn encode_header_roundtrip() {
        let descriptor = descriptor();
        let mut buf = [0u8; 128];
        let written = encode_header(&descriptor, &mut buf).unwrap();
        assert_eq!(written, HEADER_FRAME_SIZE);

        let decoded = decode_header(&buf[..written]).unwrap();
        assert_eq!(decoded.descriptor, descriptor);
        assert_eq!(decoded.bytes_read, written);
    }

    #[test]
    fn encode_writes_marker_then_descriptor() {
        let descriptor = descriptor();
        let mut buf = [0u8; HEADER_FRAME_SIZE];
        encode_header(&descriptor, &mut buf).unwrap();
        assert_eq!(buf[0], HEADER_MARKER);
        assert_eq!(&buf[1..], &descriptor.to_bytes());
    }

    #[test]
    fn encode_rejects_small_buffer() {
        let mut buf = [0u8; 1];
        let err = encode_header(&descriptor(), &mut buf).unwrap_err();
        assert_eq!(
            err,
            WireError::InsufficientMemory {
                needed: 17,
                available: 1
            }
        );
        assert_eq!(buf, [0]);
    }

    #[test]
    fn encode_into_absent_buffer() {
        let err = encode_header_into(&descriptor(), None).unwrap_err();
        assert_eq!(err, WireError::InvalidPointer);

        let mut buf = [0u8; 32];
        assert_eq!(
            encode_header_into(&descriptor(), Some(&mut buf[..])).unwrap(),
            HEADER_FRAME_SIZE
        );
    }

    #[test]
    fn decode_from_absent_buffer() {
        assert_eq!(
            decode_header_from(None).unwrap_err(),
            WireError::InvalidPointer
        );
    }

    #[test]
    fn decode_rejects_short_buffer() {
        let err = decode_header(&[HEADER_MARKER]).unwrap_err();
        assert!(matches!(err, WireError::InsufficientMemory { .. }));
    }

    #[test]
    fn decode_rejects_foreign_marker() {
        let err = decode_header(b"012345678901234567890123456789").unwrap_err();
        assert_eq!(err, WireError::NotAHeader { found: b'0' });
    }

    #[test]
    fn decode_rejects_audio_marker() {
        let mut buf = [0u8; HEADER_FRAME_SIZE];
        encode_header(&descriptor(), &mut buf).unwrap();
        buf[0] = AUDIO_MARKER;
        let err = decode_header(&buf).unwrap_err();
        assert_eq!(err, WireError::NotAHeader { found: AUDIO_MARKER });
    }

    #[test]
    fn decode_rejects_corrupted_sample_rate() {
        let mut buf = [0u8; HEADER_FRAME_SIZE];
        encode_header(&descriptor(), &mut buf).unwrap();
        buf[7] = buf[7].wrapping_add(1);
        let err = decode_header(&buf).unwrap_err();
        assert!(matches!(err, WireError::InvalidChecksum { .. }));
    }

    #[test]
    fn decode_rejects_corrupted_protocol_id() {
        let mut buf = [0u8; HEADER_FRAME_SIZE];
        encode_header(&descriptor(), &mut buf).unwrap();
        buf[1] = buf[1].wrapping_add(1);
        let err = decode_header(&buf).unwrap_err();
        assert!(matches!(err, WireError::InvalidChecksum { .. }));
    }

    #[test]
    fn decode_reports_checksums() {
        let descriptor = descriptor();
        let mut buf = [0u8; HEADER_FRAME_SIZE];
        encode_header(&descriptor, &mut buf).unwrap();
        buf[13] ^= 0xFF;
        let err = decode_header(&buf).unwrap_err();
        let WireError::InvalidChecksum { expected, found } = err else {
            panic!("expected checksum error, got {err:?}");
        };
        assert_eq!(expected, descriptor.checksum());
        assert_ne!(found, expected);
    }

    #[test]
    fn decode_rejects_unknown_protocol_id() {
        let mut buf = [0u8; HEADER_FRAME_SIZE];
        encode_header(&descriptor(), &mut buf).unwrap();
        buf[1..3].copy_from_slice(&2u16.to_le_bytes());
        reseal(&mut buf);
        let err = decode_header(&buf).unwrap_err();
        assert_eq!(
            err,
            WireError::UnsupportedProtocolVersion {
                protocol_id: 2,
                sample_format: 1
            }
        );
    }

    #[test]
    fn decode_rejects_unknown_sample_format() {
        let mut buf = [0u8; HEADER_FRAME_SIZE];
        encode_header(&descriptor(), &mut buf).unwrap();
        buf[3..5].copy_from_slice(&7u16.to_le_bytes());
        reseal(&mut buf);
        let err = decode_header(&buf).unwrap_err();
        assert_eq!(
            err,
            WireError::UnsupportedProtocolVersion {
                protocol_id: 1,
                sample_format: 7
            }
        );
    }

    #[test]
    fn checksum_error_wins_over_version_error() {
        let mut buf = [0u8; HEADER_FRAME_SIZE];
        encode_header(&descriptor(), &mut buf).unwrap();
        // Bad version without resealing: the checksum check runs first.
        buf[1..3].copy_from_slice(&9u16.to_le_bytes());
        let err = decode_header(&buf).unwrap_err();
        assert!(matches!(err, WireError::InvalidChecksum { .. }));
    }

    #[test]
    fn marker_error_wins_over_checksum_error() {
        let mut buf = [0u8; HEADER_FRAME_SIZE];
        encode_header(&descriptor(), &mut buf).unwrap();
        buf[0] = 0;
        buf[5] ^= 0x10;
        let err = decode_header(&buf).unwrap_err();
        assert_eq!(err, WireError::NotAHeader { found: 0 });
    }

    #[test]
    fn length_error_wins_over_marker_error() {
        let err = decode_header(&[0u8; HEADER_FRAME_SIZE - 1]).unwrap_err();
        assert!(matches!(err, WireError::InsufficientMemory { .. }));
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let descriptor = descriptor();
        let mut buf = [0xEEu8; 64];
        encode_header(&descriptor, &mut buf).unwrap();
        let decoded = decode_header(&buf).unwrap();
        assert_eq!(decoded.descriptor, descriptor);
        assert_eq!(decoded.bytes_read, HEADER_FRAME_SIZE);
    }

    #[test]
    fn decoded_descriptor_checksum_is_consistent() {
        let descriptor = SessionDescriptor::new(96000.0, SampleFormat::PcmFloat, 8, 32);
        let mut buf = [0u8; HEADER_FRAME_SIZE];
        encode_header(&descriptor, &mut buf).unwrap();
        let decoded = decode_header(&buf).unwrap().descriptor;
        assert_eq!(descriptor_checksum(&decoded), decoded.checksum());
    }

    #[test]
    fn nan_rate_survives_roundtrip() {
        let descriptor = SessionDescriptor::new(f32::NAN, SampleFormat::PcmFloat, 1, 8);
        let mut buf = [0u8; HEADER_FRAME_SIZE];
        encode_header(&descriptor, &mut buf).unwrap();
        let decoded = decode_header(&buf).unwrap();
        assert!(decoded.descriptor.sample_rate().is_nan());
        assert_eq!(decoded.descriptor, descriptor);
    }
}
