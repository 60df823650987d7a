//! Performance benchmarks for shardkit-files.
//!
//! Run with: `cargo bench -p shardkit-files`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::RngCore;
use shardkit_files::digest::{Algorithm, digest, digest_reader};
use shardkit_files::dispatcher::Dispatcher;
use shardkit_files::executor::ChunkExecutor;
use shardkit_files::planner::{PartitionPolicy, plan};
use shardkit_files::reassembler::concatenate;
use shardkit_files::split::Splitter;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn random_file(size: usize) -> NamedTempFile {
    let mut data = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut data);
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();
    file
}

// ============================================================================
// Planner Benchmarks
// ============================================================================

/// Planning cost grows with chunk count, not file size
fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");
    let file_size = 1u64 << 40;

    for chunks in [16u64, 1_024, 65_536] {
        group.throughput(Throughput::Elements(chunks));
        group.bench_with_input(BenchmarkId::new("chunk_count", chunks), &chunks, |b, &n| {
            b.iter(|| black_box(plan(black_box(file_size), PartitionPolicy::ChunkCount(n))).len());
        });
    }

    group.finish();
}

// ============================================================================
// Digest Benchmarks
// ============================================================================

/// Single-pass MD5 + SHA-256 over in-memory data
fn bench_digest_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest_reader");

    for size in [4_096usize, 1_000_000, 16_000_000] {
        let data = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| digest_reader(black_box(&data[..]), &Algorithm::ALL).unwrap());
        });
    }

    group.finish();
}

/// Digesting a file from disk
fn bench_digest_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest_file");
    let size = 32_000_000usize;
    let file = random_file(size);

    group.throughput(Throughput::Bytes(size as u64));
    group.bench_function("md5_sha256", |b| {
        b.iter(|| digest(file.path(), &Algorithm::ALL).unwrap());
    });

    group.finish();
}

// ============================================================================
// Split / Concatenate Benchmarks
// ============================================================================

/// Parallel split throughput by worker count
fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");
    let size = 64_000_000usize;
    let file = random_file(size);

    group.throughput(Throughput::Bytes(size as u64));
    for workers in [1usize, 2, 4] {
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, &w| {
            let out = TempDir::new().unwrap();
            let splitter = Splitter::new(Dispatcher::new(w), ChunkExecutor::new());
            b.iter(|| {
                let outcome = splitter
                    .split(file.path(), PartitionPolicy::ChunkCount(16), Some(out.path()))
                    .unwrap();
                black_box(outcome.chunk_count())
            });
        });
    }

    group.finish();
}

/// Sequential reassembly throughput
fn bench_concatenate(c: &mut Criterion) {
    let mut group = c.benchmark_group("concatenate");
    let size = 64_000_000usize;
    let file = random_file(size);
    let out = TempDir::new().unwrap();

    let outcome = Splitter::new(Dispatcher::new(4), ChunkExecutor::new())
        .split(file.path(), PartitionPolicy::ChunkCount(16), Some(out.path()))
        .unwrap();
    let parts: Vec<_> = outcome.chunk_paths().map(|p| p.to_path_buf()).collect();
    let joined = out.path().join("joined");

    group.throughput(Throughput::Bytes(size as u64));
    group.bench_function("16_parts", |b| {
        b.iter(|| concatenate(&parts, &joined).unwrap());
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(planner_benches, bench_plan);

criterion_group!(digest_benches, bench_digest_reader, bench_digest_file);

criterion_group!(transfer_benches, bench_split, bench_concatenate);

criterion_main!(planner_benches, digest_benches, transfer_benches);
