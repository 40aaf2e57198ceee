// extraction.rs - Benchmarks for symbol scanning and require resolution
//
// Run with: cargo bench --bench extraction --features test-support
// Compare baselines: cargo bench --bench extraction --features test-support -- --baseline before

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::Path;

use dasls::symbols::{scan, DiskReader, RequireResolver, SymbolCache, SymbolExtractor};
use dasls::test_utils::fixture_workspace::{
    create_fixture_workspace, generate_file_content, FixtureConfig,
};

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    for (label, config) in [
        ("small", FixtureConfig::small()),
        ("medium", FixtureConfig::medium()),
        ("large", FixtureConfig::large()),
    ] {
        let content = generate_file_content(0, &config);
        group.bench_with_input(BenchmarkId::new("file", label), &content, |b, content| {
            b.iter(|| black_box(scan(Path::new("/bench/file_0.das"), content)));
        });
    }
    group.finish();
}

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    let resolver = RequireResolver::default();
    let reader = DiskReader;

    for (label, config) in [
        ("small", FixtureConfig::small()),
        ("medium", FixtureConfig::medium()),
        ("large", FixtureConfig::large()),
    ] {
        let workspace = create_fixture_workspace(&config);
        let entry = workspace.path().join("file_0.das");
        let text = std::fs::read_to_string(&entry).unwrap();

        group.bench_with_input(BenchmarkId::new("cold", label), &text, |b, text| {
            let extractor = SymbolExtractor::new(&reader, &resolver);
            b.iter(|| {
                let mut cache = SymbolCache::new();
                black_box(extractor.extract(&entry, text, &mut cache))
            });
        });

        group.bench_with_input(BenchmarkId::new("cached", label), &text, |b, text| {
            let extractor = SymbolExtractor::new(&reader, &resolver);
            let mut cache = SymbolCache::new();
            extractor.extract(&entry, text, &mut cache);
            b.iter(|| black_box(extractor.symbols_for(&entry, text, &mut cache, false)));
        });

        // Edit the deepest file of the require chain, then rebuild the entry file
        group.bench_with_input(BenchmarkId::new("refresh_chain", label), &config, |b, config| {
            let extractor = SymbolExtractor::new(&reader, &resolver);
            let mut cache = SymbolCache::new();
            extractor.extract(&entry, &text, &mut cache);
            let leaf_index = config.require_chain_depth.min(config.file_count - 1);
            let leaf = workspace.path().join(format!("file_{}.das", leaf_index));
            let leaf_text = generate_file_content(leaf_index, config);
            b.iter(|| {
                let (_, stale) = extractor.refresh(&leaf, &leaf_text, &mut cache);
                black_box(stale);
                black_box(extractor.symbols_for(&entry, &text, &mut cache, false))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scan, bench_extraction);
criterion_main!(benches);
