//! Benchmarks for vertex-mesh remeshing and division
//!
//! 1. **`VertexMesh::remesh`** on relaxed and jittered honeycombs of increasing size
//! 2. **Short-axis division** of every element in a sheet
//! 3. **Geometry queries**: element areas and second moments across a sheet

#![allow(missing_docs)] // Criterion macros generate undocumented functions

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::OnceLock;
use vertex_mesh::prelude::*;

/// Get the deterministic seed for mesh jitter.
/// Reads `VERTEX_MESH_BENCH_SEED` (decimal or 0x-hex). Defaults to 0xCE11.
fn get_benchmark_seed() -> u64 {
    static SEED: OnceLock<u64> = OnceLock::new();
    *SEED.get_or_init(|| {
        std::env::var("VERTEX_MESH_BENCH_SEED")
            .ok()
            .and_then(|s| {
                let s = s.trim();
                s.strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .map_or_else(|| s.parse().ok(), |hex| u64::from_str_radix(hex, 16).ok())
            })
            .unwrap_or(0xCE11)
    })
}

const SHEET_SIZES: [usize; 4] = [5, 10, 20, 40];

fn benchmark_remesh(c: &mut Criterion) {
    let seed = get_benchmark_seed();
    let mut group = c.benchmark_group("remesh");

    for &size in &SHEET_SIZES {
        group.throughput(Throughput::Elements((size * size) as u64));

        group.bench_with_input(BenchmarkId::new("relaxed", size), &size, |b, &size| {
            b.iter_batched(
                || honeycomb_mesh(size, size, RemeshConfig::default()).unwrap(),
                |mut mesh| black_box(mesh.remesh().unwrap()),
                BatchSize::LargeInput,
            );
        });

        // A rearrangement threshold near the jitter amplitude makes a share of the edges short.
        let config = RemeshConfigBuilder::default()
            .cell_rearrangement_threshold(0.45)
            .cell_rearrangement_ratio(1.1)
            .edge_division_threshold(2.0)
            .build()
            .unwrap();
        group.bench_with_input(BenchmarkId::new("jittered", size), &size, |b, &size| {
            b.iter_batched(
                || jittered_honeycomb_mesh(size, size, 0.1, seed, config.clone()).unwrap(),
                |mut mesh| black_box(mesh.remesh().ok()),
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn benchmark_division(c: &mut Criterion) {
    let mut group = c.benchmark_group("division");

    for &size in &SHEET_SIZES {
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(
            BenchmarkId::new("short_axis_all", size),
            &size,
            |b, &size| {
                b.iter_batched(
                    || honeycomb_mesh(size, size, RemeshConfig::default()).unwrap(),
                    |mut mesh| {
                        for element in 0..size * size {
                            let _ = black_box(mesh.divide_element_along_short_axis(element, false));
                        }
                        mesh
                    },
                    BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

fn benchmark_geometry(c: &mut Criterion) {
    let seed = get_benchmark_seed();
    let mut group = c.benchmark_group("geometry");

    for &size in &SHEET_SIZES {
        let mesh = jittered_honeycomb_mesh(size, size, 0.05, seed, RemeshConfig::default()).unwrap();
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::new("areas_and_moments", size), &mesh, |b, mesh| {
            b.iter(|| {
                for element in mesh.elements() {
                    black_box(mesh.element_area(element.index()));
                    black_box(mesh.element_second_moments(element.index()));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_remesh,
    benchmark_division,
    benchmark_geometry
);
criterion_main!(benches);
