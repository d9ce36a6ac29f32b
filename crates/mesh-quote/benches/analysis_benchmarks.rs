//! Benchmarks for part analysis throughput.
//!
//! Run with: cargo bench -p mesh-quote
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p mesh-quote -- --save-baseline main
//! 2. After changes: cargo bench -p mesh-quote -- --baseline main

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mesh_quote::cache::{CacheConfig, GeometryCache};
use mesh_quote::cost::{self, Catalog, QuoteConfig};
use mesh_quote::dfm::{self, DfmConfig};
use mesh_quote::pipeline::load_part;
use mesh_quote::progress::ProgressReporter;
use mesh_quote::stl::{self, IngestOptions};
use mesh_quote::{Mesh, geometry, shapes};

/// Sphere tessellations from a few hundred to ~130k triangles.
fn sphere_sizes() -> Vec<(u32, Mesh)> {
    [16, 64, 256]
        .into_iter()
        .map(|segments| (segments, shapes::uv_sphere(25.0, segments, segments / 2)))
        .collect()
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("stl_decode");
    let options = IngestOptions::default();

    for (segments, mesh) in sphere_sizes() {
        let binary = stl::to_binary_bytes(&mesh);
        let ascii = stl::to_ascii_bytes(&mesh, "sphere");
        group.throughput(Throughput::Elements(mesh.face_count() as u64));

        group.bench_with_input(BenchmarkId::new("binary", segments), &binary, |b, bytes| {
            let reporter = ProgressReporter::silent();
            b.iter(|| stl::decode(black_box(bytes), &options, &reporter.stage(0.0, 1.0)))
        });
        group.bench_with_input(BenchmarkId::new("ascii", segments), &ascii, |b, bytes| {
            let reporter = ProgressReporter::silent();
            b.iter(|| stl::decode(black_box(bytes), &options, &reporter.stage(0.0, 1.0)))
        });
    }

    group.finish();
}

fn bench_geometry(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometry_analyze");

    for (segments, mesh) in sphere_sizes() {
        group.throughput(Throughput::Elements(mesh.face_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(segments), &mesh, |b, mesh| {
            b.iter(|| geometry::analyze(black_box(mesh)))
        });
    }

    group.finish();
}

fn bench_dfm(c: &mut Criterion) {
    let mut group = c.benchmark_group("dfm_analyze");
    group.sample_size(20);

    for (segments, mesh) in sphere_sizes() {
        let analysis = geometry::analyze(&mesh).unwrap();
        group.throughput(Throughput::Elements(mesh.face_count() as u64));

        group.bench_with_input(BenchmarkId::new("default", segments), &mesh, |b, mesh| {
            let config = DfmConfig::default();
            b.iter(|| dfm::analyze(black_box(mesh), &analysis, &config))
        });
        group.bench_with_input(BenchmarkId::new("fast", segments), &mesh, |b, mesh| {
            let config = DfmConfig::fast();
            b.iter(|| dfm::analyze(black_box(mesh), &analysis, &config))
        });
    }

    group.finish();
}

fn bench_estimate(c: &mut Criterion) {
    let mesh = shapes::cuboid(80.0, 40.0, 20.0);
    let analysis = geometry::analyze(&mesh).unwrap();
    let result = dfm::analyze(&mesh, &analysis, &DfmConfig::default()).unwrap();
    let catalog = Catalog::standard();
    let config = QuoteConfig::new("aluminum-6061", "anodized", 50);

    c.bench_function("cost_estimate", |b| {
        b.iter(|| cost::estimate(black_box(&analysis), Some(&result), &config, &catalog))
    });
}

fn bench_cached_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_part");
    let bytes = stl::to_binary_bytes(&shapes::uv_sphere(25.0, 128, 64));
    let options = IngestOptions::default();

    group.bench_function("uncached", |b| {
        b.iter(|| load_part(black_box(&bytes), "sphere.stl", None, None, &options, None))
    });

    let cache = GeometryCache::in_memory(CacheConfig::default());
    load_part(&bytes, "sphere.stl", None, Some(&cache), &options, None).unwrap();
    group.bench_function("cache_hit", |b| {
        b.iter(|| load_part(black_box(&bytes), "sphere.stl", None, Some(&cache), &options, None))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_decode,
    bench_geometry,
    bench_dfm,
    bench_estimate,
    bench_cached_load
);
criterion_main!(benches);
