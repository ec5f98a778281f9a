#![no_main]

use libfuzzer_sys::fuzz_target;
use stream::{Received, StreamConfig, StreamReceiver, StreamSender};

fuzz_target!(|data: &[u8]| {
    let config = StreamConfig::for_testing();
    let mut sender = StreamSender::new(&config);
    let mut header = vec![0u8; wire::HEADER_FRAME_SIZE];
    let mut audio = vec![0u8; sender.buffer_len()];
    let sent = sender
        .encode_chunk(&[0.0; 16], &mut header, &mut audio)
        .unwrap();

    let mut receiver = StreamReceiver::new();
    if let Some(len) = sent.header_len {
        let _ = receiver.receive(&header[..len]);
    }

    // Use input bytes to drive a bounded sequence of frames: some valid audio
    // with fuzzed indices, some raw fuzz input.
    let mut idx = 0usize;
    while idx < data.len() && idx < 4096 {
        let len = (data[idx] as usize % 64).saturating_add(1);
        idx += 1;
        let end = (idx + len).min(data.len());
        let frame = &data[idx..end];
        idx = end;

        if frame.len() >= 4 && frame[0] % 2 == 0 {
            let mut valid = audio.clone();
            valid[5..9].copy_from_slice(&frame[..4]);
            if let Ok(Received::Audio { samples, .. }) = receiver.receive(&valid) {
                assert_eq!(samples.len(), 16);
            }
        } else {
            let _ = receiver.receive(frame);
        }
    }

    let stats = receiver.stats();
    assert!(stats.audio_frames + stats.total_rejected() + stats.headers <= 4097);
});
