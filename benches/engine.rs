//! Benchmarks for single-series fits and grouped fan-out.

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fcst_engine::core::TimeSeries;
use fcst_engine::engine::{forecast_groups, forecast_series, EngineConfig};
use fcst_engine::models::params::keys;
use fcst_engine::models::ModelParams;

fn generate_weekly(n: usize, phase: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = (i + phase) as f64;
            100.0
                + 0.2 * t
                + 10.0 * (2.0 * std::f64::consts::PI * t / 7.0).sin()
                + ((i * 37 + phase) % 11) as f64 * 0.4
        })
        .collect()
}

fn make_series(values: Vec<f64>) -> TimeSeries {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let timestamps = (0..values.len())
        .map(|i| base + Duration::days(i as i64))
        .collect();
    TimeSeries::univariate(timestamps, values).unwrap()
}

fn bench_models(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_series");
    let series = make_series(generate_weekly(365, 0));
    let params = ModelParams::new().with(keys::SEASONAL_PERIOD, 7);

    for model in ["Naive", "SES", "HoltWinters", "AutoETS", "AutoARIMA", "Theta", "MSTL", "MFLES"] {
        group.bench_with_input(BenchmarkId::new(model, 365), &series, |b, s| {
            b.iter(|| forecast_series(black_box(s), model, 14, &params))
        });
    }

    group.finish();
}

fn bench_groups(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouped");
    group.sample_size(10);
    let params = ModelParams::new().with(keys::SEASONAL_PERIOD, 7);

    for count in [16, 64, 256].iter() {
        let groups: Vec<(usize, TimeSeries)> = (0..*count)
            .map(|g| (g, make_series(generate_weekly(120, g))))
            .collect();

        group.bench_with_input(BenchmarkId::new("sequential", count), count, |b, _| {
            let config = EngineConfig::sequential();
            b.iter(|| forecast_groups(black_box(&groups), "AutoETS", 14, &params, &config))
        });

        group.bench_with_input(BenchmarkId::new("parallel", count), count, |b, _| {
            let config = EngineConfig::default();
            b.iter(|| forecast_groups(black_box(&groups), "AutoETS", 14, &params, &config))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_models, bench_groups);
criterion_main!(benches);
