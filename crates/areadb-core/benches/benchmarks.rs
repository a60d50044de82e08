//! areadb-core benchmarks.
//!
//! Measures:
//! - Topology construction on a grid of adjacent polygons
//! - WKT and shapefile encoding of the same grid
//! - Registry lookups (hit and miss)

use areadb_core::codec::{self, TopologyOptions};
use areadb_core::{
    BoundaryRecord, BoundaryRegistry, BoundarySearch, BoundingBox, Feature, FeatureCollection,
    Format, Geometry, Position,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

// ============================================================================
// Test Data Generation
// ============================================================================

/// `side * side` unit squares sharing their edges.
fn grid(side: usize) -> FeatureCollection {
    let mut features = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            let (x, y) = (col as f64, row as f64);
            let ring = vec![
                Position::new(x, y),
                Position::new(x + 1.0, y),
                Position::new(x + 1.0, y + 1.0),
                Position::new(x, y + 1.0),
                Position::new(x, y),
            ];
            features.push(
                Feature::new(Geometry::polygon(vec![ring]))
                    .with_property("name", format!("{row}-{col}")),
            );
        }
    }
    FeatureCollection::from_features(features)
}

fn registry(count: usize) -> BoundaryRegistry {
    let records = (0..count)
        .map(|i| {
            let lat = 52.0 + (i % 100) as f64 * 0.01;
            let lon = 6.0 + (i / 100) as f64 * 0.01;
            let bbox = BoundingBox {
                max_latitude: lat + 0.01,
                max_longitude: lon + 0.01,
                min_latitude: lat,
                min_longitude: lon,
            };
            BoundaryRecord::new(i.to_string(), format!("{i}.kml"), "AREA", bbox)
        })
        .collect();
    BoundaryRegistry::from_records(records)
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_topology(c: &mut Criterion) {
    let mut group = c.benchmark_group("topology_build");
    for side in [5usize, 20] {
        let model = grid(side);
        group.throughput(Throughput::Elements((side * side) as u64));
        group.bench_with_input(BenchmarkId::new("exact", side), &model, |b, m| {
            b.iter(|| codec::topojson::build(black_box(m), &TopologyOptions::default()))
        });
        let quantized = TopologyOptions {
            quantization: Some(10_000),
            ..TopologyOptions::default()
        };
        group.bench_with_input(BenchmarkId::new("quantized", side), &model, |b, m| {
            b.iter(|| codec::topojson::build(black_box(m), &quantized))
        });
    }
    group.finish();
}

fn bench_encoders(c: &mut Criterion) {
    let model = grid(20);
    let mut group = c.benchmark_group("encode");
    for format in [Format::Wkt, Format::Shapefile] {
        group.bench_function(format.name(), |b| {
            b.iter(|| codec::export(format, black_box(&model)))
        });
    }
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let registry = registry(5_000);
    c.bench_function("lookup_hit", |b| b.iter(|| registry.lookup(black_box("2500.kml"))));
    c.bench_function("lookup_miss", |b| b.iter(|| registry.lookup(black_box("nope"))));
}

criterion_group!(benches, bench_topology, bench_encoders, bench_lookup);
criterion_main!(benches);
