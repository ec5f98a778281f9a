//! CRC-32 (reflected IEEE 802.3 polynomial).
//!
//! This is the checksum used by zip, PNG and Ethernet. It is part of the wire
//! format, so independently built peers must compute identical values.

/// Reflected form of the IEEE polynomial 0x04C11DB7.
pub const CRC32_POLY: u32 = 0xEDB8_8320;

/// Computes the CRC-32 of `data`.
///
/// The empty input hashes to 0.
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
