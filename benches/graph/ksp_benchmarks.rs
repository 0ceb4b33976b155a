use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ksp::graph::state_set;
use ksp::{MatrixFormat, ShortestPathsGenerator, SparseMatrix};

/// A chain with `n` states where each state moves forward by one or two
/// steps or falls back to the start.
fn ladder(n: usize, seed: u64) -> (SparseMatrix<f64>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut entries = Vec::new();
    for s in 0..n - 1 {
        let back: f64 = rng.gen_range(0.05..0.2);
        let one: f64 = rng.gen_range(0.3..0.6);
        if s + 2 < n {
            entries.push((s, s + 1, one));
            entries.push((s, s + 2, 1.0 - one - back));
        } else {
            entries.push((s, s + 1, 1.0 - back));
        }
        entries.push((s, 0, back));
    }
    entries.push((n - 1, n - 1, 1.0));
    let matrix = SparseMatrix::from_triplets(n, n, entries).unwrap();
    let mut targets = vec![0.0; n];
    targets[n - 1] = 1.0;
    (matrix, targets)
}

fn bench_ksp(c: &mut Criterion) {
    let mut group = c.benchmark_group("ksp");
    group.sample_size(20);

    for &(n, k) in &[(50usize, 100usize), (200, 100), (200, 1000)] {
        let (matrix, targets) = ladder(n, 7);
        let initial = state_set(n, [0]);

        group.bench_with_input(
            BenchmarkId::new("fresh", format!("n{n}_k{k}")),
            &(n, k),
            |b, _| {
                b.iter(|| {
                    let mut generator = ShortestPathsGenerator::with_target_vector(
                        &matrix,
                        &targets,
                        &initial,
                        MatrixFormat::Straight,
                    )
                    .unwrap();
                    generator.distance(k).unwrap()
                })
            },
        );

        let mut warm = ShortestPathsGenerator::with_target_vector(
            &matrix,
            &targets,
            &initial,
            MatrixFormat::Straight,
        )
        .unwrap();
        warm.distance(k).unwrap();
        group.bench_with_input(
            BenchmarkId::new("cached", format!("n{n}_k{k}")),
            &(n, k),
            |b, _| b.iter(|| warm.path_as_list(k).unwrap()),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_ksp);
criterion_main!(benches);
