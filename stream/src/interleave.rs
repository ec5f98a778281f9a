//! Conversion between per-channel buffers and interleaved chunks.

use wire::{WireError, WireResult};

/// Interleaves per-channel samples into `out`.
///
/// Every channel must hold exactly `out.len() / channels.len()` samples and
/// `out.len()` must be a multiple of the channel count.
pub fn interleave(channels: &[&[f32]], out: &mut [f32]) -> WireResult<()> {
    frames_per_channel(channels.iter().map(|c| c.len()), channels.len(), out.len())?;
    for (frame, slot) in out.chunks_exact_mut(channels.len().max(1)).enumerate() {
        for (sample, channel) in slot.iter_mut().zip(channels) {
            *sample = channel[frame];
        }
    }
    Ok(())
}

/// Splits an interleaved chunk into per-channel buffers.
pub fn deinterleave(input: &[f32], channels: &mut [&mut [f32]]) -> WireResult<()> {
    let count = channels.len();
    frames_per_channel(channels.iter().map(|c| c.len()), count, input.len())?;
    for (frame, slot) in input.chunks_exact(count.max(1)).enumerate() {
        for (sample, channel) in slot.iter().zip(channels.iter_mut()) {
            channel[frame] = *sample;
        }
    }
    Ok(())
}

fn frames_per_channel(
    lengths: impl Iterator<Item = usize>,
    channel_count: usize,
    interleaved: usize,
) -> WireResult<usize> {
    if channel_count == 0 {
        return if interleaved == 0 {
            Ok(0)
        } else {
            Err(WireError::InvalidBufferDimensions {
                expected: 0,
                actual: interleaved,
            })
        };
    }
    let frames = interleaved / channel_count;
    if frames * channel_count != interleaved {
        return Err(WireError::InvalidBufferDimensions {
            expected: (frames + 1) * channel_count,
            actual: interleaved,
        });
    }
    for len in lengths {
        if len != frames {
            return Err(WireError::InvalidBufferDimensions {
                expected: frames,
                actual: len,
            });
        }
    }
    Ok(frames)
}
