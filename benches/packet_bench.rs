use bytes::BytesMut;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use hibike_packet::core::packet::{Packet, PacketFrame};
use hibike_packet::core::registry::MessageTypeRegistry;
use hibike_packet::protocol::MessageKind;
use std::sync::Arc;

#[allow(clippy::unwrap_used)]
fn bench_packet_encode_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_encode_decode");
    let frame = PacketFrame::new(Arc::new(MessageTypeRegistry::standard()));
    let payload_sizes = [2usize, 16, 64, 255];

    for &size in &payload_sizes {
        let packet = Packet::new(1, MessageKind::DeviceData.code(), vec![0x5Au8; size]).unwrap();
        group.throughput(Throughput::Bytes(packet.frame_len() as u64));

        group.bench_function(format!("encode_{size}b"), |b| {
            b.iter_batched(
                || BytesMut::with_capacity(packet.frame_len()),
                |mut buf| {
                    frame.encode_into(&packet, &mut buf).unwrap();
                    buf
                },
                BatchSize::SmallInput,
            )
        });

        let bytes = frame.encode(&packet).unwrap();
        group.bench_function(format!("decode_{size}b"), |b| {
            b.iter(|| {
                let decoded = frame.decode(&bytes);
                assert!(decoded.is_ok());
            })
        });
        group.bench_function(format!("decode_shared_{size}b"), |b| {
            b.iter(|| {
                let decoded = frame.decode_bytes(bytes.clone());
                assert!(decoded.is_ok());
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_packet_encode_decode);
criterion_main!(benches);
