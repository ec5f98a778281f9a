//! Frame markers and buffer sizing.

use crate::descriptor::{SessionDescriptor, DESCRIPTOR_SIZE};

/// First byte of every header frame ("H").
pub const HEADER_MARKER: u8 = b'H';

/// First byte of every audio frame ("A").
pub const AUDIO_MARKER: u8 = b'A';

/// Header frame size in bytes (17 total).
pub const HEADER_FRAME_SIZE: usize = 1 + DESCRIPTOR_SIZE;

/// Bytes preceding the payload of an audio frame: marker, checksum, sample index.
pub const AUDIO_PREAMBLE_SIZE: usize = 1 + 4 + 4;

/// Frame kind announced by the marker byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Header,
    Audio,
}

impl FrameKind {
    /// Classifies a frame by its first byte only. Nothing else is validated.
    #[must_use]
    pub fn classify(buf: &[u8]) -> Option<Self> {
        match buf.first() {
            Some(&HEADER_MARKER) => Some(Self::Header),
            Some(&AUDIO_MARKER) => Some(Self::Audio),
            _ => None,
        }
    }

    /// Marker byte for this kind.
    #[must_use]
    pub const fn marker(self) -> u8 {
        match self {
            Self::Header => HEADER_MARKER,
            Self::Audio => AUDIO_MARKER,
        }
    }
}

/// Bytes needed for a header frame.
#[must_use]
pub const fn header_frame_size() -> usize {
    HEADER_FRAME_SIZE
}

/// Bytes needed for one audio frame of `descriptor`.
#[must_use]
pub const fn audio_frame_size(descriptor: &SessionDescriptor) -> usize {
    descriptor.samples_per_chunk() * descriptor.sample_format().sample_width()
        + AUDIO_PREAMBLE_SIZE
}

/// Bytes needed for a single buffer that can hold either frame kind.
#[must_use]
pub const fn max_frame_size(descriptor: &SessionDescriptor) -> usize {
    let audio = audio_frame_size(descriptor);
    if audio > HEADER_FRAME_SIZE {
        audio
    } else {
        HEADER_FRAME_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::SampleFormat;

    #[test]
    fn markers_are_distinct() {
        assert_ne!(HEADER_MARKER, AUDIO_MARKER);
        assert_eq!(HEADER_MARKER, 0x48);
        assert_eq!(AUDIO_MARKER, 0x41);
    }

    #[test]
    fn header_frame_size_is_seventeen() {
        assert_eq!(header_frame_size(), 17);
    }

    #[test]
    fn audio_frame_size_pcm16_stereo() {
        let descriptor = SessionDescriptor::new(44100.0, SampleFormat::Pcm16, 2, 8);
        assert_eq!(audio_frame_size(&descriptor), 8 * 2 * 2 + 1 + 4 + 4);
        assert_eq!(audio_frame_size(&descriptor), 41);
    }

    #[test]
    fn audio_frame_size_float_stereo() {
        let descriptor = SessionDescriptor::new(44100.0, SampleFormat::PcmFloat, 2, 8);
        assert_eq!(audio_frame_size(&descriptor), 73);
    }

    #[test]
    fn audio_frame_size_pcm16_mono_single() {
        let descriptor = SessionDescriptor::new(44100.0, SampleFormat::Pcm16, 1, 1);
        assert_eq!(audio_frame_size(&descriptor), 11);
    }

    #[test]
    fn audio_frame_size_does_not_overflow() {
        let descriptor =
            SessionDescriptor::new(44100.0, SampleFormat::PcmFloat, u16::MAX, u16::MAX);
        assert_eq!(
            audio_frame_size(&descriptor),
            usize::from(u16::MAX) * usize::from(u16::MAX) * 4 + AUDIO_PREAMBLE_SIZE
        );
    }

    #[test]
    fn max_frame_size_picks_larger() {
        let tiny = SessionDescriptor::new(8000.0, SampleFormat::Pcm16, 1, 1);
        assert_eq!(max_frame_size(&tiny), HEADER_FRAME_SIZE);
        let large = SessionDescriptor::new(8000.0, SampleFormat::Pcm16, 2, 64);
        assert_eq!(max_frame_size(&large), audio_frame_size(&large));
    }

    #[test]
    fn classify_by_marker() {
        assert_eq!(FrameKind::classify(&[HEADER_MARKER]), Some(FrameKind::Header));
        assert_eq!(FrameKind::classify(&[AUDIO_MARKER, 0]), Some(FrameKind::Audio));
        assert_eq!(FrameKind::classify(b"0123"), None);
        assert_eq!(FrameKind::classify(&[]), None);
        assert_eq!(FrameKind::Audio.marker(), AUDIO_MARKER);
    }
}
