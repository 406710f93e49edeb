use std::hint::black_box;
use std::io::{Read, Seek, SeekFrom};

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use zstdseek::Reader;

const FRAME_SIZE: usize = 64 * 1024;
const NUM_FRAMES: usize = 64;

/// Builds a multi-frame Zstandard stream with predictable frame boundaries, so seeks land at
/// known offsets without needing a committed fixture on disk.
fn multiframe_stream() -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..NUM_FRAMES {
        let frame: Vec<u8> = (0..FRAME_SIZE).map(|b| (b ^ i) as u8).collect();
        out.extend(zstd::stream::encode_all(frame.as_slice(), 3).unwrap());
    }
    out
}

fn sequential_read(c: &mut Criterion) {
    let stream = multiframe_stream();
    let total = (FRAME_SIZE * NUM_FRAMES) as u64;

    let mut group = c.benchmark_group("sequential_read");
    group.throughput(Throughput::Bytes(total));
    group.bench_function("whole_stream", |b| {
        b.iter(|| {
            let mut reader = Reader::open_from_buffer(&stream, false).unwrap();
            let mut buf = [0u8; 32 * 1024];
            loop {
                let n = reader.read(black_box(&mut buf)).unwrap();
                if n == 0 {
                    break;
                }
            }
        });
    });
}

fn random_seek(c: &mut Criterion) {
    let stream = multiframe_stream();

    let mut group = c.benchmark_group("random_seek");
    group.bench_function("lazy_jump_to_last_frame", |b| {
        b.iter(|| {
            let mut reader = Reader::open_from_buffer(&stream, true).unwrap();
            let target = ((NUM_FRAMES - 1) * FRAME_SIZE) as u64;
            reader.seek(SeekFrom::Start(black_box(target))).unwrap();
            let mut buf = [0u8; 16];
            reader.read(&mut buf).unwrap();
        });
    });
}

criterion_group!(benches, sequential_read, random_seek);
criterion_main!(benches);
