use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use hibike_packet::core::decoder::StreamDecoder;
use hibike_packet::core::packet::{Packet, PacketFrame};
use hibike_packet::core::registry::MessageTypeRegistry;
use hibike_packet::protocol::MessageKind;
use std::sync::Arc;

#[allow(clippy::unwrap_used)]
fn stream(frame: &PacketFrame, packets: usize, noise: bool) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..packets {
        if noise {
            out.extend_from_slice(&[0x00, 0x13, 0x37]);
        }
        let p = Packet::new(
            (i % 16) as u8,
            MessageKind::DeviceData.code(),
            vec![i as u8; 2 + i % 64],
        )
        .unwrap();
        out.extend_from_slice(&frame.encode(&p).unwrap());
    }
    out
}

fn bench_decoder_feed(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoder_feed");
    let frame = PacketFrame::new(Arc::new(MessageTypeRegistry::standard()));

    for (label, noise) in [("clean", false), ("noisy", true)] {
        let bytes = stream(&frame, 1_000, noise);
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        for chunk in [1usize, 64, 4096] {
            group.bench_function(format!("{label}_chunk_{chunk}"), |b| {
                b.iter(|| {
                    let mut decoder = StreamDecoder::new(frame.clone());
                    let mut count = 0usize;
                    for piece in bytes.chunks(chunk) {
                        count += decoder.feed(piece).count();
                    }
                    assert_eq!(count, 1_000);
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_decoder_feed);
criterion_main!(benches);
