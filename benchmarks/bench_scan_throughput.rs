use std::fmt::Write as _;
use std::hint::black_box;
use std::io::Cursor;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use visit_tally::{LineScanner, RecordLayout};

fn visits(count: usize, malformed_every: usize) -> Vec<u8> {
    let mut content = String::with_capacity(count * 56);
    for i in 0..count {
        writeln!(
            content,
            "https://example.org/blog/post-{},2024-{:02}-{:02}T09:15:00+00:00",
            i % 257,
            1 + i % 12,
            1 + i % 28
        )
        .unwrap();
        if malformed_every > 0 && i % malformed_every == 0 {
            writeln!(content, "https://example.org/broken-{}", i).unwrap();
        }
    }
    content.into_bytes()
}

fn bench_well_formed_block_sizes(c: &mut Criterion) {
    let data = visits(200_000, 0);
    let mut group = c.benchmark_group("scan_well_formed");
    group.throughput(Throughput::Bytes(data.len() as u64));

    for block_size in [64 * 1024, 1024 * 1024, 8 * 1024 * 1024] {
        let scanner = LineScanner::new(RecordLayout::default()).with_block_size(block_size);
        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &data,
            |b, data| {
                b.iter(|| {
                    let outcome = scanner
                        .scan_reader(Cursor::new(black_box(data)), 0, data.len() as u64)
                        .unwrap();
                    black_box(outcome.table.len());
                });
            },
        );
    }
    group.finish();
}

fn bench_malformed_resync(c: &mut Criterion) {
    let data = visits(200_000, 10);
    let scanner = LineScanner::default();
    let mut group = c.benchmark_group("scan_with_malformed");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("every_10th", |b| {
        b.iter(|| {
            let outcome = scanner
                .scan_reader(Cursor::new(black_box(&data)), 0, data.len() as u64)
                .unwrap();
            black_box(outcome.stats.malformed_lines);
        });
    });
    group.finish();
}

criterion_group!(
    scan_benches,
    bench_well_formed_block_sizes,
    bench_malformed_resync
);
criterion_main!(scan_benches);
