//! Benchmarks for NSx/NEV decoder performance.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use nsx_core::{ContinuousDecoder, EventDecoder};
use std::path::Path;

const TEST_FILE: &str = "test_data/sample.ns5";

const NUM_CHANNELS: u16 = 32;
const NUM_PACKETS: u32 = 50;
const SAMPLES_PER_PACKET: u32 = 2000;

fn put_str(buf: &mut Vec<u8>, s: &str, len: usize) {
    let mut field = vec![0u8; len];
    field[..s.len()].copy_from_slice(s.as_bytes());
    buf.extend_from_slice(&field);
}

/// NEURALCD file with `NUM_PACKETS` packets of random-looking samples.
fn synthetic_continuous() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"NEURALCD");
    data.extend_from_slice(&[2, 3]);
    data.extend_from_slice(&(314 + 66 * u32::from(NUM_CHANNELS)).to_le_bytes());
    put_str(&mut data, "bench", 16);
    put_str(&mut data, "", 256);
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&30_000u32.to_le_bytes());
    data.extend_from_slice(&[0u8; 16]);
    data.extend_from_slice(&u32::from(NUM_CHANNELS).to_le_bytes());

    for id in 1..=NUM_CHANNELS {
        data.extend_from_slice(b"CC");
        data.extend_from_slice(&id.to_le_bytes());
        put_str(&mut data, &format!("chan{id}"), 16);
        data.extend_from_slice(&[1, id as u8]);
        for v in [-32764i16, 32764, -8191, 8191] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        put_str(&mut data, "uV", 16);
        data.extend_from_slice(&[0u8; 20]);
    }

    let mut state = 0x1234_5678u32;
    for p in 0..NUM_PACKETS {
        data.push(1);
        data.extend_from_slice(&(p * SAMPLES_PER_PACKET).to_le_bytes());
        data.extend_from_slice(&SAMPLES_PER_PACKET.to_le_bytes());
        for _ in 0..SAMPLES_PER_PACKET * u32::from(NUM_CHANNELS) {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            data.extend_from_slice(&((state >> 16) as i16).to_le_bytes());
        }
    }
    data
}

/// NEURALEV file with 100k digital input packets.
fn synthetic_events() -> Vec<u8> {
    let packet_size = 104u32;
    let mut data = Vec::new();
    data.extend_from_slice(b"NEURALEV");
    data.extend_from_slice(&[3, 0, 0, 0]);
    data.extend_from_slice(&336u32.to_le_bytes());
    data.extend_from_slice(&packet_size.to_le_bytes());
    data.extend_from_slice(&30_000u32.to_le_bytes());
    data.extend_from_slice(&30_000u32.to_le_bytes());
    data.resize(336, 0);

    for i in 0..100_000u32 {
        let start = data.len();
        data.extend_from_slice(&i.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.push(if i % 2 == 0 { 0x01 } else { 0x80 });
        data.push(0);
        data.extend_from_slice(&(i as u16).to_le_bytes());
        data.resize(start + packet_size as usize, 0);
    }
    data
}

fn decode_file_benchmark(c: &mut Criterion) {
    let test_path = Path::new(TEST_FILE);
    if !test_path.exists() {
        eprintln!("Benchmark skipped: test file not found at {}", TEST_FILE);
        return;
    }

    let file_size = std::fs::metadata(test_path).unwrap().len();

    let mut group = c.benchmark_group("decode_file");
    group.throughput(Throughput::Bytes(file_size));

    group.bench_function("full_file", |b| {
        b.iter(|| {
            let recording = ContinuousDecoder::new()
                .decode_file(black_box(test_path))
                .unwrap();
            black_box(recording.total_samples())
        })
    });

    group.finish();
}

fn decode_continuous_benchmark(c: &mut Criterion) {
    let data = synthetic_continuous();

    let mut group = c.benchmark_group("decode_continuous");
    group.throughput(Throughput::Bytes(data.len() as u64));

    for (name, apply_gain) in [("raw", false), ("calibrated", true)] {
        let decoder = ContinuousDecoder::new().with_gain(apply_gain);
        group.bench_function(name, |b| {
            b.iter(|| {
                let recording = decoder.decode_reader(black_box(data.as_slice())).unwrap();
                black_box(recording.total_samples())
            })
        });
    }

    group.finish();
}

fn decode_events_benchmark(c: &mut Criterion) {
    let data = synthetic_events();

    let mut group = c.benchmark_group("decode_events");
    group.throughput(Throughput::Elements(100_000));

    group.bench_function("synthetic_100k_digital", |b| {
        b.iter(|| {
            let file = EventDecoder::new()
                .decode_reader(black_box(data.as_slice()))
                .unwrap();
            black_box(file.packets.len())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    decode_file_benchmark,
    decode_continuous_benchmark,
    decode_events_benchmark
);
criterion_main!(benches);
