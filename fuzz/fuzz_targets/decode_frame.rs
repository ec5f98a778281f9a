#![no_main]

use libfuzzer_sys::fuzz_target;
use wire::{decode_audio, decode_header, encode_header, SampleFormat, SessionDescriptor};

fuzz_target!(|data: &[u8]| {
    if let Ok(decoded) = decode_header(data) {
        // Anything accepted must re-encode to the same bytes.
        let mut buf = [0u8; wire::HEADER_FRAME_SIZE];
        let written = encode_header(&decoded.descriptor, &mut buf).unwrap();
        assert_eq!(&buf[..written], &data[..written]);
    }

    for descriptor in [
        SessionDescriptor::new(48000.0, SampleFormat::Pcm16, 2, 4),
        SessionDescriptor::new(44100.0, SampleFormat::PcmFloat, 1, 8),
    ] {
        let mut out = vec![0f32; descriptor.samples_per_chunk()];
        if let Ok(decoded) = decode_audio(&descriptor, data, &mut out) {
            assert_eq!(decoded.bytes_read, wire::audio_frame_size(&descriptor));
        }
    }
});
