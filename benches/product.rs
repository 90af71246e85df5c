use criterion::{black_box, criterion_group, criterion_main, Criterion};
use measure_for::{Density, Exponential, For, Measure, Normal};
use ndarray::{ArrayD, IxDyn};
use rand::SeedableRng;

fn criterion_benchmark(c: &mut Criterion) {
    let p = For::grid(&[100, 10], |i: &[usize]| Normal::new(i[0] as f64, i[1] as f64)).unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let x = p.sample(&mut rng).unwrap();
    c.bench_function("grid logdensity 1000", |b| {
        b.iter(|| p.logdensity(black_box(&x)).unwrap())
    });
    c.bench_function("grid sample 1000", |b| b.iter(|| p.sample(&mut rng).unwrap()));

    let xs = ArrayD::from_elem(IxDyn(&[1000]), 0.5);
    let q = For::range(1000, |i| Exponential::new(i as f64)).unwrap();
    c.bench_function("range logdensity 1000", |b| {
        b.iter(|| q.logdensity(black_box(&xs)).unwrap())
    });

    c.bench_function("lazy logdensity 1000", |b| {
        b.iter(|| {
            let mut lazy = For::lazy((1..=1000).map(|i| i as f64), Exponential::new);
            lazy.logdensity(std::iter::repeat(0.5).take(1000)).unwrap()
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
