//! Codec benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lw2_core::{codec, Command, Engine, LineFramer};

fn decode_benchmark(c: &mut Criterion) {
    c.bench_function("decode_crosspoint", |b| {
        b.iter(|| black_box(codec::decode_line(black_box("(O12 I7)"))))
    });

    c.bench_function("decode_topology_64", |b| {
        let line = format!(
            "(ALL {} )",
            (1..=64).map(|n| n.to_string()).collect::<Vec<_>>().join(" ")
        );
        b.iter(|| black_box(codec::decode_line(black_box(&line))))
    });
}

fn encode_benchmark(c: &mut Criterion) {
    let cmd = Command::Route { input: 12, output: 7 };
    c.bench_function("encode_route", |b| b.iter(|| black_box(codec::encode(&cmd))));
}

fn framer_benchmark(c: &mut Criterion) {
    let stream: Vec<u8> = (1..=200)
        .flat_map(|n| format!("(O{} I{})\r\n", n % 16 + 1, n % 8 + 1).into_bytes())
        .collect();

    c.bench_function("frame_and_apply_200_lines", |b| {
        b.iter(|| {
            let mut framer = LineFramer::new();
            let mut engine = Engine::new(8);
            for chunk in stream.chunks(37) {
                for line in framer.feed(chunk) {
                    black_box(engine.handle_line(&line));
                }
            }
        })
    });
}

criterion_group!(benches, decode_benchmark, encode_benchmark, framer_benchmark);
criterion_main!(benches);
