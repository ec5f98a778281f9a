//! Wire format for the netpcm audio protocol.
//!
//! This crate is the codec layer: the session descriptor, its CRC-32 binding,
//! the header and audio frame encoders/decoders, and the buffer sizing they
//! depend on. It performs no I/O and holds no state; sockets, header cadence
//! and the receiver's "last known descriptor" live in higher layers.
//!
//! # Design Principles
//!
//! - **Byte-exact format** - Every field is written explicitly, little-endian.
//! - **Detect, don't repair** - Foreign, stale or corrupted frames are rejected
//!   with a typed error; the caller drops them and keeps listening.
//! - **Caller-provided buffers** - No allocation on the encode/decode path.
//!
//! # Wire format
//!
//! ```text
//! header frame: ['H'][descriptor: 16 bytes]
//! audio frame:  ['A'][checksum: u32][sample_index: u32][payload]
//! ```

mod audio;
mod crc;
mod descriptor;
mod error;
mod frame;
mod header;

pub use audio::{
    decode_audio, decode_audio_from, dequantize_pcm16, encode_audio, encode_audio_into,
    quantize_pcm16, DecodedAudio, PCM16_SCALE,
};
pub use crc::{crc32, CRC32_POLY};
pub use descriptor::{
    descriptor_checksum, SampleFormat, SessionDescriptor, DESCRIPTOR_SIZE, PROTOCOL_ID,
};
pub use error::{ErrorKind, WireError, WireResult};
pub use frame::{
    audio_frame_size, header_frame_size, max_frame_size, FrameKind, AUDIO_MARKER,
    AUDIO_PREAMBLE_SIZE, HEADER_FRAME_SIZE, HEADER_MARKER,
};
pub use header::{
    decode_header, decode_header_from, encode_header, encode_header_into, DecodedHeader,
};
