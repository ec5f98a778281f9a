use wire::{
    audio_frame_size, decode_audio, decode_header, encode_audio, encode_header,
    header_frame_size, FrameKind, SampleFormat, SessionDescriptor, WireError, HEADER_FRAME_SIZE,
};

fn sine(descriptor: &SessionDescriptor, chunk: u32) -> Vec<f32> {
    let channels = usize::from(descriptor.channel_count());
    let frames = usize::from(descriptor.frame_size());
    let mut samples = vec![0f32; channels * frames];
    for frame in 0..frames {
        let t = (chunk as usize * frames + frame) as f32 / descriptor.sample_rate();
        for channel in 0..channels {
            let freq = 440.0 * (channel + 1) as f32;
            samples[frame * channels + channel] = 0.8 * (std::f32::consts::TAU * freq * t).sin();
        }
    }
    samples
}

/// Decodes a frame the way a consumer does: header first, then audio with the
/// last known descriptor.
fn consume(
    known: &mut Option<SessionDescriptor>,
    frame: &[u8],
    out: &mut Vec<f32>,
) -> Result<Option<u32>, WireError> {
    match decode_header(frame) {
        Ok(decoded) => {
            *known = Some(decoded.descriptor);
            out.resize(decoded.descriptor.samples_per_chunk(), 0.0);
            Ok(None)
        }
        Err(WireError::NotAHeader { .. }) => {
            let descriptor = known.as_ref().expect("descriptor before audio");
            let decoded = decode_audio(descriptor, frame, out)?;
            Ok(Some(decoded.sample_index))
        }
        Err(err) => Err(err),
    }
}

#[test]
fn producer_consumer_sequence() {
    let descriptor = SessionDescriptor::new(48000.0, SampleFormat::Pcm16, 2, 32);
    let mut buf = vec![0u8; audio_frame_size(&descriptor).max(header_frame_size())];

    let mut known = None;
    let mut out = Vec::new();

    let len = encode_header(&descriptor, &mut buf).unwrap();
    assert_eq!(consume(&mut known, &buf[..len], &mut out).unwrap(), None);
    assert_eq!(known, Some(descriptor));

    let mut sample_index = 0u32;
    for chunk in 0..10 {
        let samples = sine(&descriptor, chunk);
        let len = encode_audio(&descriptor, &samples, sample_index, &mut buf).unwrap();
        assert_eq!(FrameKind::classify(&buf[..len]), Some(FrameKind::Audio));

        let index = consume(&mut known, &buf[..len], &mut out).unwrap();
        assert_eq!(index, Some(sample_index));
        for (a, b) in samples.iter().zip(&out) {
            assert!((a - b).abs() <= 1.0 / 32767.0);
        }
        sample_index += u32::from(descriptor.frame_size());
    }
}

#[test]
fn audio_from_new_session_is_rejected_until_header() {
    let old = SessionDescriptor::new(44100.0, SampleFormat::Pcm16, 2, 16);
    let reconfigured = SessionDescriptor::new(48000.0, SampleFormat::Pcm16, 2, 16);
    let mut buf = vec![0u8; 256];
    let len = encode_audio(&reconfigured, &sine(&reconfigured, 0), 0, &mut buf).unwrap();

    let mut out = vec![0f32; old.samples_per_chunk()];
    let err = decode_audio(&old, &buf[..len], &mut out).unwrap_err();
    assert!(matches!(err, WireError::InvalidChecksum { .. }));

    let mut header = [0u8; HEADER_FRAME_SIZE];
    encode_header(&reconfigured, &mut header).unwrap();
    let acquired = decode_header(&header).unwrap().descriptor;
    assert!(decode_audio(&acquired, &buf[..len], &mut out).is_ok());
}

#[test]
fn marker_discrimination() {
    let descriptor = SessionDescriptor::new(44100.0, SampleFormat::PcmFloat, 1, 4);
    let mut header = [0u8; 64];
    let header_len = encode_header(&descriptor, &mut header).unwrap();
    let mut audio = [0u8; 64];
    let audio_len = encode_audio(&descriptor, &[0.0; 4], 7, &mut audio).unwrap();

    let err = decode_header(&audio[..audio_len]).unwrap_err();
    assert!(matches!(err, WireError::NotAHeader { .. }));

    // The header buffer is long enough to pass the length check.
    let mut out = [0f32; 4];
    let err = decode_audio(&descriptor, &header, &mut out).unwrap_err();
    assert!(matches!(err, WireError::NoAudioChunk { .. }));
    assert!(header_len < header.len());
}

#[test]
fn every_descriptor_byte_is_protected() {
    let descriptor = SessionDescriptor::new(44100.0, SampleFormat::Pcm16, 2, 64);
    let mut clean = [0u8; HEADER_FRAME_SIZE];
    encode_header(&descriptor, &mut clean).unwrap();

    for index in 1..HEADER_FRAME_SIZE {
        for flip in [0x01u8, 0x80, 0xFF] {
            let mut frame = clean;
            frame[index] ^= flip;
            let err = decode_header(&frame).unwrap_err();
            assert!(
                matches!(err, WireError::InvalidChecksum { .. }),
                "byte {index} flip {flip:#04x}: {err:?}"
            );
        }
    }
}

#[test]
fn embedded_checksum_bytes_are_checked() {
    let descriptor = SessionDescriptor::new(44100.0, SampleFormat::Pcm16, 2, 8);
    let samples = vec![0.25f32; 16];
    let mut clean = [0u8; 41];
    encode_audio(&descriptor, &samples, 3, &mut clean).unwrap();

    for index in 1..5 {
        let mut frame = clean;
        frame[index] ^= 0x5A;
        let mut out = [0f32; 16];
        let err = decode_audio(&descriptor, &frame, &mut out).unwrap_err();
        assert!(matches!(err, WireError::InvalidChecksum { .. }));
    }
}

#[test]
fn dimensions_enforced_regardless_of_buffer_size() {
    let descriptor = SessionDescriptor::new(44100.0, SampleFormat::Pcm16, 2, 8);
    for buf_len in [0usize, 1, 41, 4096] {
        let mut buf = vec![0u8; buf_len];
        for count in [0usize, 1, 15, 17, 32] {
            let samples = vec![0f32; count];
            let err = encode_audio(&descriptor, &samples, 0, &mut buf).unwrap_err();
            assert_eq!(
                err,
                WireError::InvalidBufferDimensions {
                    expected: 16,
                    actual: count
                }
            );

            let mut out = vec![0f32; count];
            let err = decode_audio(&descriptor, &buf, &mut out).unwrap_err();
            assert!(matches!(err, WireError::InvalidBufferDimensions { .. }));
        }
    }
}
