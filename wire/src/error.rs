//! Error types for frame encoding and decoding.

use std::fmt;

/// Result type for wire format operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors produced by the frame codecs.
///
/// Every failure leaves output buffers untouched and reports zero bytes
/// written or consumed. None of them are fatal: on an unreliable transport a
/// foreign or damaged frame is routine, and the receiver is expected to drop
/// it and keep listening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Reserved. Never produced by protocol revision 1.
    GenericError,

    /// A required buffer was absent.
    InvalidPointer,

    /// Buffer is too small for the frame.
    InsufficientMemory { needed: usize, available: usize },

    /// First byte is not the header marker.
    NotAHeader { found: u8 },

    /// First byte is not the audio marker.
    NoAudioChunk { found: u8 },

    /// Descriptor does not belong to a revision this crate speaks.
    UnsupportedProtocolVersion { protocol_id: u16, sample_format: u16 },

    /// Sample count does not match `channel_count * frame_size`.
    InvalidBufferDimensions { expected: usize, actual: usize },

    /// Checksum mismatch.
    InvalidChecksum { expected: u32, found: u32 },
}

/// Data-free discriminant of [`WireError`], handy for counters and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    GenericError,
    InvalidPointer,
    InsufficientMemory,
    NotAHeader,
    NoAudioChunk,
    UnsupportedProtocolVersion,
    InvalidBufferDimensions,
    InvalidChecksum,
}

impl WireError {
    /// Returns the kind of this error without its payload.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::GenericError => ErrorKind::GenericError,
            Self::InvalidPointer => ErrorKind::InvalidPointer,
            Self::InsufficientMemory { .. } => ErrorKind::InsufficientMemory,
            Self::NotAHeader { .. } => ErrorKind::NotAHeader,
            Self::NoAudioChunk { .. } => ErrorKind::NoAudioChunk,
            Self::UnsupportedProtocolVersion { .. } => ErrorKind::UnsupportedProtocolVersion,
            Self::InvalidBufferDimensions { .. } => ErrorKind::InvalidBufferDimensions,
            Self::InvalidChecksum { .. } => ErrorKind::InvalidChecksum,
        }
    }
}

impl ErrorKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::GenericError,
        Self::InvalidPointer,
        Self::InsufficientMemory,
        Self::NotAHeader,
        Self::NoAudioChunk,
        Self::UnsupportedProtocolVersion,
        Self::InvalidBufferDimensions,
        Self::InvalidChecksum,
    ];

    /// Stable snake_case name, used as a key in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GenericError => "generic_error",
            Self::InvalidPointer => "invalid_pointer",
            Self::InsufficientMemory => "insufficient_memory",
            Self::NotAHeader => "not_a_header",
            Self::NoAudioChunk => "no_audio_chunk",
            Self::UnsupportedProtocolVersion => "unsupported_protocol_version",
            Self::InvalidBufferDimensions => "invalid_buffer_dimensions",
            Self::InvalidChecksum => "invalid_checksum",
        }
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GenericError => write!(f, "generic error"),
            Self::InvalidPointer => write!(f, "invalid pointer: buffer is absent"),
            Self::InsufficientMemory { needed, available } => {
                write!(
                    f,
                    "insufficient memory: need {needed} bytes, have {available}"
                )
            }
            Self::NotAHeader { found } => {
                write!(f, "not a header frame: marker 0x{found:02X}")
            }
            Self::NoAudioChunk { found } => {
                write!(f, "not an audio frame: marker 0x{found:02X}")
            }
            Self::UnsupportedProtocolVersion {
                protocol_id,
                sample_format,
            } => {
                write!(
                    f,
                    "unsupported protocol: id {protocol_id}, sample format {sample_format}"
                )
            }
            Self::InvalidBufferDimensions { expected, actual } => {
                write!(
                    f,
                    "invalid buffer dimensions: expected {expected} samples, got {actual}"
                )
            }
            Self::InvalidChecksum { expected, found } => {
                write!(
                    f,
                    "invalid checksum: expected 0x{expected:08X}, found 0x{found:08X}"
                )
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for WireError {}
