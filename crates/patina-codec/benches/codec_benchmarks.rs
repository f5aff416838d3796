//! Codec Benchmarks
//!
//! Encode/decode throughput for the text and binary snapshot formats

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use glam::Vec4;

use patina_codec::{decode_binary, decode_text, encode_binary, encode_text};
use patina_state::{MaterialSnapshot, PropertyValue};

fn snapshot_with_properties(count: usize) -> MaterialSnapshot {
    let mut snap = MaterialSnapshot::new("Universal Render Pipeline/Lit");
    for i in 0..count {
        match i % 3 {
            0 => snap.set_number(format!("_Scalar{i}"), i as f32 * 0.25),
            1 => snap.set_property(
                format!("_Color{i}"),
                PropertyValue::Color(Vec4::new(0.1, 0.2, 0.3, 1.0)),
            ),
            _ => snap.set_property(
                format!("_Map{i}"),
                PropertyValue::Texture(Some(format!("tex://bench/{i}"))),
            ),
        }
        snap.enable_keyword(format!("_FEATURE_{i}"));
    }
    snap
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for count in [8, 64, 512].iter() {
        let snap = snapshot_with_properties(*count);
        group.bench_with_input(BenchmarkId::new("text", count), &snap, |b, snap| {
            b.iter(|| black_box(encode_text(snap)));
        });
        group.bench_with_input(BenchmarkId::new("binary", count), &snap, |b, snap| {
            b.iter(|| black_box(encode_binary(snap)));
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for count in [8, 64, 512].iter() {
        let snap = snapshot_with_properties(*count);
        let text = encode_text(&snap);
        let bytes = encode_binary(&snap);
        group.bench_with_input(BenchmarkId::new("text", count), &text, |b, text| {
            b.iter(|| black_box(decode_text(text).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("binary", count), &bytes, |b, bytes| {
            b.iter(|| black_box(decode_binary(bytes).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
