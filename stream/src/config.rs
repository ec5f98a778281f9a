//! Stream configuration.

use wire::{SampleFormat, SessionDescriptor};

/// Parameters of an outgoing stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    /// Nominal sample rate in Hz.
    pub sample_rate: f32,

    /// PCM encoding of audio frames.
    pub format: SampleFormat,

    /// Interleaved channels per sample-frame.
    pub channels: u16,

    /// Sample-frames per audio chunk.
    pub frame_size: u16,

    /// Audio chunks between header frames.
    ///
    /// `None` derives roughly one header per second from the sample rate.
    pub header_interval: Option<u32>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            format: SampleFormat::Pcm16,
            channels: 2,
            frame_size: 64,
            header_interval: None,
        }
    }
}

impl StreamConfig {
    /// Creates a small configuration suitable for testing.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            sample_rate: 8_000.0,
            format: SampleFormat::Pcm16,
            channels: 2,
            frame_size: 8,
            header_interval: Some(4),
        }
    }

    /// Builds the session descriptor for this configuration.
    #[must_use]
    pub fn descriptor(&self) -> SessionDescriptor {
        SessionDescriptor::new(self.sample_rate, self.format, self.channels, self.frame_size)
    }

    /// Chunks between header frames, never less than 1.
    #[must_use]
    pub fn effective_header_interval(&self) -> u32 {
        if let Some(interval) = self.header_interval {
            return interval.max(1);
        }
        if self.frame_size == 0 || !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return 1;
        }
        // Saturating float-to-int cast.
        let chunks_per_second = (self.sample_rate / f32::from(self.frame_size)) as u32;
        chunks_per_second.max(1)
    }
}
