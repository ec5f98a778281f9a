//! Outgoing stream state: header cadence and sample index.

use log::{debug, trace};
use wire::{encode_audio, encode_header, max_frame_size, SessionDescriptor, WireResult};

use crate::config::StreamConfig;

/// Frames produced for one audio chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentChunk {
    /// Header frame length, when a header was due. Send it before the audio.
    pub header_len: Option<usize>,
    /// Audio frame length.
    pub audio_len: usize,
    /// Sample index carried by the audio frame.
    pub sample_index: u32,
}

/// Encodes a continuous stream of chunks.
///
/// A header frame is emitted with the first chunk and then every
/// `header_interval` chunks, so receivers that join late can acquire the
/// descriptor. The sample index advances by `frame_size` per chunk and wraps
/// at `u32::MAX`.
#[derive(Debug, Clone)]
pub struct StreamSender {
    descriptor: SessionDescriptor,
    header_interval: u32,
    chunks_until_header: u32,
    sample_index: u32,
}

impl StreamSender {
    #[must_use]
    pub fn new(config: &StreamConfig) -> Self {
        Self::with_descriptor(config.descriptor(), config.effective_header_interval())
    }

    /// Creates a sender for an existing descriptor.
    #[must_use]
    pub fn with_descriptor(descriptor: SessionDescriptor, header_interval: u32) -> Self {
        Self {
            descriptor,
            header_interval: header_interval.max(1),
            chunks_until_header: 0,
            sample_index: 0,
        }
    }

    #[must_use]
    pub const fn descriptor(&self) -> &SessionDescriptor {
        &self.descriptor
    }

    /// Sample index the next audio frame will carry.
    #[must_use]
    pub const fn sample_index(&self) -> u32 {
        self.sample_index
    }

    #[must_use]
    pub const fn header_interval(&self) -> u32 {
        self.header_interval
    }

    /// Buffer size that fits either frame kind.
    #[must_use]
    pub const fn buffer_len(&self) -> usize {
        max_frame_size(&self.descriptor)
    }

    /// Makes the next chunk carry a header frame.
    pub fn force_header(&mut self) {
        self.chunks_until_header = 0;
    }

    /// Encodes one chunk of interleaved samples.
    ///
    /// On error nothing is committed: the sample index and header cadence are
    /// unchanged and the same chunk can be retried.
    pub fn encode_chunk(
        &mut self,
        samples: &[f32],
        header_out: &mut [u8],
        audio_out: &mut [u8],
    ) -> WireResult<SentChunk> {
        let sample_index = self.sample_index;
        let audio_len = encode_audio(&self.descriptor, samples, sample_index, audio_out)?;

        let header_due = self.chunks_until_header == 0;
        let header_len = if header_due {
            Some(encode_header(&self.descriptor, header_out)?)
        } else {
            None
        };

        if header_due {
            debug!(
                "header frame at sample index {sample_index} (checksum 0x{:08x})",
                self.descriptor.checksum()
            );
            self.chunks_until_header = self.header_interval - 1;
        } else {
            self.chunks_until_header -= 1;
        }
        self.sample_index = sample_index.wrapping_add(u32::from(self.descriptor.frame_size()));
        trace!("audio frame {sample_index}: {audio_len} bytes");

        Ok(SentChunk {
            header_len,
            audio_len,
            sample_index,
        })
    }
}
