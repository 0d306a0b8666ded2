/// Calibration hot-path benchmarks
///
/// Measures configuration sampling and the least-squares fit at realistic
/// component counts and trial budgets.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dimcal::regression::SensitivityModel;
use dimcal::sampler::{DirichletSampler, HaltonSampler, Sampler, Scramble, UniformSampler};
use std::time::Duration;

fn bench_halton_precompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("halton_precompute");
    group.measurement_time(Duration::from_secs(5));

    for &trials in &[50usize, 200, 1000] {
        group.throughput(Throughput::Elements(trials as u64));
        group.bench_with_input(BenchmarkId::new("plain", trials), &trials, |b, &n| {
            b.iter(|| black_box(HaltonSampler::new(n, 8, Scramble::None)));
        });
        group.bench_with_input(BenchmarkId::new("owen", trials), &trials, |b, &n| {
            b.iter(|| black_box(HaltonSampler::new(n, 8, Scramble::Owen { seed: 7 })));
        });
    }

    group.finish();
}

fn bench_random_samplers(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_samplers");
    group.measurement_time(Duration::from_secs(5));
    group.throughput(Throughput::Elements(1));

    group.bench_function("uniform_8d", |b| {
        let mut sampler = UniformSampler::with_seed(8, 1);
        b.iter(|| black_box(sampler.sample()));
    });

    group.bench_function("dirichlet_8d", |b| {
        let mut sampler = DirichletSampler::with_seed(8, 1);
        b.iter(|| black_box(sampler.sample()));
    });

    group.finish();
}

fn bench_train(c: &mut Criterion) {
    let mut group = c.benchmark_group("train");
    group.measurement_time(Duration::from_secs(5));

    for &(components, trials) in &[(4usize, 50usize), (8, 200), (16, 1000)] {
        let paths: Vec<String> = (0..components).map(|i| format!("/c{}", i)).collect();
        let mut sampler = UniformSampler::with_seed(components, 42);
        let observations: Vec<(f64, Vec<f64>)> = (0..trials)
            .map(|_| {
                let configuration = sampler.sample();
                let p95 = 0.2
                    + configuration
                        .iter()
                        .enumerate()
                        .map(|(i, p)| p * (i + 1) as f64 * 0.05)
                        .sum::<f64>();
                (p95, configuration)
            })
            .collect();

        group.throughput(Throughput::Elements(trials as u64));
        group.bench_with_input(
            BenchmarkId::new(format!("{}_components", components), trials),
            &observations,
            |b, observations| {
                b.iter(|| {
                    let mut model = SensitivityModel::new(paths.clone());
                    for (p95, configuration) in observations {
                        model.add_observation(*p95, configuration.clone());
                    }
                    model.train().unwrap();
                    black_box(model.normalised_coefficients())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_halton_precompute,
    bench_random_samplers,
    bench_train
);

criterion_main!(benches);
