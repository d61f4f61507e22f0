use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use hwyla::recognition::{StrokeSample, normalize, top_k_indices};

const SAMPLE_COUNTS: [usize; 3] = [64, 512, 4_096];
const CLASS_COUNT: usize = 1_098;

fn spiral(samples: usize) -> Vec<StrokeSample> {
    (0..samples)
        .map(|i| {
            let angle = i as f64 * 0.05;
            let radius = 10.0 + i as f64 * 0.2;
            StrokeSample::new(i as f64 * 8.0, radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

fn scores() -> Vec<f32> {
    (0..CLASS_COUNT)
        .map(|i| ((i * 7_919) % CLASS_COUNT) as f32 / CLASS_COUNT as f32)
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    for count in SAMPLE_COUNTS {
        let samples = spiral(count);
        c.bench_with_input(BenchmarkId::new("normalize", count), &samples, |b, samples| {
            b.iter(|| normalize(black_box(samples)).expect("normalize"));
        });
    }
}

fn bench_top_k(c: &mut Criterion) {
    let scores = scores();
    c.bench_with_input(
        BenchmarkId::new("top_k_indices", CLASS_COUNT),
        &scores,
        |b, scores| {
            b.iter(|| top_k_indices(black_box(scores), 10));
        },
    );
}

criterion_group!(benches, bench_normalize, bench_top_k);
criterion_main!(benches);
