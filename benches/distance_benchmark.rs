//! Benchmark for the lane-parallel distance kernels.
//!
//! Run with: cargo bench --bench distance_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vdb_core::distance::{cosine_distance, dot, euclidean_distance};

fn generate_vectors(n: usize, dim: usize) -> Vec<Vec<f64>> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    (0..n)
        .map(|i| {
            (0..dim)
                .map(|j| {
                    let mut hasher = DefaultHasher::new();
                    (i * dim + j).hash(&mut hasher);
                    (hasher.finish() as f64 / u64::MAX as f64) * 2.0 - 1.0
                })
                .collect()
        })
        .collect()
}

fn bench_kernels_by_dimension(c: &mut Criterion) {
    let mut group = c.benchmark_group("distance_kernels");
    for dim in [16, 128, 768, 1536] {
        let a = generate_vectors(1, dim).remove(0);
        let b = generate_vectors(1, dim).remove(0);

        group.bench_with_input(BenchmarkId::new("dot", dim), &dim, |bencher, _| {
            bencher.iter(|| black_box(dot(&a, &b)));
        });
        group.bench_with_input(BenchmarkId::new("cosine", dim), &dim, |bencher, _| {
            bencher.iter(|| black_box(cosine_distance(&a, &b)));
        });
        group.bench_with_input(BenchmarkId::new("euclidean", dim), &dim, |bencher, _| {
            bencher.iter(|| black_box(euclidean_distance(&a, &b)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_kernels_by_dimension);
criterion_main!(benches);
