//! Manifest, lock file and version parsing performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qpm_benchmarks::{chained_lock_set, criterion_config, manifest_content, version_list};
use qpm_config::{parse_lock_file, parse_manifest, serialize_lock_file};
use qpm_core::types::Version;

/// Benchmark qilletni_info.yml parsing
fn bench_manifest_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("manifest_parsing");

    for dep_count in [10, 100, 500] {
        group.throughput(Throughput::Elements(dep_count as u64));
        let content = manifest_content(dep_count);

        group.bench_with_input(BenchmarkId::new("dependencies", dep_count), &content, |b, content| {
            b.iter(|| black_box(parse_manifest(content).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark qilletni.lock parsing and serialization
fn bench_lock_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("lock_file");

    for count in [10, 100, 1000] {
        group.throughput(Throughput::Elements(count as u64));
        let lock = chained_lock_set(count);
        let content = serialize_lock_file(&lock).unwrap();

        group.bench_with_input(BenchmarkId::new("parse", count), &content, |b, content| {
            b.iter(|| black_box(parse_lock_file(content).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("serialize", count), &lock, |b, lock| {
            b.iter(|| black_box(serialize_lock_file(lock).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark version string parsing
fn bench_version_parsing(c: &mut Criterion) {
    let versions = version_list(1000);
    c.bench_function("version_parse_1000", |b| {
        b.iter(|| {
            for version in &versions {
                black_box(Version::parse(version).unwrap());
            }
        });
    });
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_manifest_parsing, bench_lock_file, bench_version_parsing
}
criterion_main!(benches);
