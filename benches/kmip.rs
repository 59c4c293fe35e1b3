//! Top-k MIP latency and recall: H2-ALSH against the exact linear scan.
//!
//! Data mixes a dense band of large norms with a sparse tail of small ones,
//! the shape where shell pruning pays off.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use h2alsh::{H2Alsh, H2AlshParams, LinearScan, MipsIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

fn create_dataset(n: usize, dimension: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(n * dimension);
    for _ in 0..n {
        let v: Vec<f32> = (0..dimension).map(|_| rng.random_range(-1.0f32..1.0)).collect();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        let scale = if rng.random_bool(0.3) {
            rng.random_range(0.8f32..1.0)
        } else {
            rng.random_range(0.05f32..0.6)
        };
        data.extend(v.into_iter().map(|x| x * scale / norm));
    }
    data
}

fn recall_at_k(ground_truth: &[(u32, f32)], retrieved: &[(u32, f32)], k: usize) -> f32 {
    let gt_set: HashSet<u32> = ground_truth.iter().take(k).map(|r| r.0).collect();
    let hits = retrieved.iter().take(k).filter(|r| gt_set.contains(&r.0)).count();
    hits as f32 / k as f32
}

fn bench_kmip_vs_k(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmip_vs_k");
    group.sample_size(10);

    let (n, dimension) = (20_000, 64);
    let data = create_dataset(n, dimension, 42);
    let queries = create_dataset(50, dimension, 123);
    let queries: Vec<&[f32]> = queries.chunks_exact(dimension).collect();

    let h2 = H2Alsh::build(&data, n, dimension, H2AlshParams::new(2.0, 0.5).with_seed(7))
        .expect("build H2-ALSH");
    let linear = LinearScan::new(&data, n, dimension).expect("build linear scan");

    for k in [1, 10, 50] {
        let recall: f32 = queries
            .iter()
            .map(|q| {
                let truth = linear.kmip(k, q).expect("exact kmip");
                let found = h2.kmip(k, q).expect("kmip");
                recall_at_k(&truth, &found, k)
            })
            .sum::<f32>()
            / queries.len() as f32;
        eprintln!("k={k}: recall={recall:.3} blocks={}", h2.blocks().len());

        group.bench_with_input(BenchmarkId::new("h2alsh", k), &k, |b, &k| {
            b.iter(|| {
                for q in &queries {
                    black_box(h2.kmip(k, black_box(q)).expect("kmip"));
                }
            })
        });
        group.bench_with_input(BenchmarkId::new("linear", k), &k, |b, &k| {
            b.iter(|| {
                for q in &queries {
                    black_box(linear.kmip(k, black_box(q)).expect("kmip"));
                }
            })
        });
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(10);

    for n in [5_000, 20_000] {
        let data = create_dataset(n, 64, 9);
        group.bench_with_input(BenchmarkId::new("h2alsh", n), &n, |b, &n| {
            b.iter(|| H2Alsh::build(black_box(&data), n, 64, H2AlshParams::default().with_seed(1)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_kmip_vs_k, bench_build);
criterion_main!(benches);
