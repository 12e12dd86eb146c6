//! Canonical JSON and hashing benchmarks.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use indexmap::IndexMap;
use partitura_core::{ContentHash, to_canonical_json};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct VersionEntry {
    name: String,
    description: String,
    version: String,
    version_normalized: String,
    require: IndexMap<String, String>,
}

fn create_test_data() -> IndexMap<String, VersionEntry> {
    let mut versions = IndexMap::new();
    for v in 0..50 {
        let mut require = IndexMap::new();
        for i in 0..20 {
            require.insert(format!("vendor/package-{i}"), format!("^{i}.0"));
        }
        versions.insert(
            format!("1.{v}.0"),
            VersionEntry {
                name: "test/package".into(),
                description: "A test package for benchmarking".into(),
                version: format!("1.{v}.0"),
                version_normalized: format!("1.{v}.0.0"),
                require,
            },
        );
    }
    versions
}

fn bench_json(c: &mut Criterion) {
    let data = create_test_data();
    let bytes = to_canonical_json(&data).expect("serialize");

    c.bench_function("canonical_serialize", |b| {
        b.iter(|| to_canonical_json(black_box(&data)));
    });

    c.bench_function("sha256_provider", |b| {
        b.iter(|| ContentHash::from_bytes(black_box(&bytes)));
    });
}

criterion_group!(benches, bench_json);
criterion_main!(benches);
