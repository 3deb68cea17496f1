#![no_main]

use hibike_packet::{MessageTypeRegistry, PacketFrame, StreamDecoder};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    // Fuzz frame validation and stream reassembly - test for panics and unbounded buffering
    let frame = PacketFrame::new(Arc::new(MessageTypeRegistry::standard()));
    let _ = frame.decode(data);

    let split = data.first().copied().unwrap_or(1).max(1) as usize;
    let mut decoder = StreamDecoder::new(frame);
    for chunk in data.chunks(split) {
        for _ in decoder.feed(chunk) {}
        assert!(decoder.buffered_len() < decoder.frame().max_frame_len());
    }
});
