use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use mesh_weave::executor::ExecutorConfig;
use mesh_weave::remesh::{PlanarMesh, RemeshParams};

/// `n x n` unit grid with interior vertices jittered by up to 0.2.
fn jittered_grid(n: usize, seed: u64, params: RemeshParams) -> PlanarMesh {
    let w = n + 1;
    let mut rng = SmallRng::seed_from_u64(seed);
    let points: Vec<[f64; 2]> = (0..w * w)
        .map(|i| {
            let (x, y) = (i % w, i / w);
            let interior = x > 0 && y > 0 && x < n && y < n;
            let (dx, dy) = if interior {
                (rng.gen_range(-0.2..0.2), rng.gen_range(-0.2..0.2))
            } else {
                (0.0, 0.0)
            };
            [x as f64 + dx, y as f64 + dy]
        })
        .collect();
    let mut faces = Vec::with_capacity(2 * n * n);
    for y in 0..n {
        for x in 0..n {
            let v = y * w + x;
            faces.push([v, v + 1, v + w + 1]);
            faces.push([v, v + w + 1, v + w]);
        }
    }
    PlanarMesh::new(&points, &faces, params).expect("valid grid")
}

fn params(target: f64, num_threads: usize) -> RemeshParams {
    RemeshParams {
        executor: ExecutorConfig::parallel(num_threads),
        iterations: 2,
        ..RemeshParams::with_target(target)
    }
}

fn bench_split_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_pass");
    group.sample_size(10);
    for &threads in &[0usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &t| {
            b.iter_with_setup(
                || jittered_grid(32, 7, params(0.25, t)),
                |m| m.split_pass().expect("split pass"),
            )
        });
    }
    group.finish();
}

fn bench_remesh(c: &mut Criterion) {
    let mut group = c.benchmark_group("remesh");
    group.sample_size(10);
    for &threads in &[0usize, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &t| {
            b.iter_with_setup(
                || jittered_grid(24, 11, params(0.5, t)),
                |mut m| m.remesh().expect("remesh"),
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_split_pass, bench_remesh);
criterion_main!(benches);
