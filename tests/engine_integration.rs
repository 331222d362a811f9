//! End-to-end runs through the name-based entry points.

use chrono::{DateTime, Duration, TimeZone, Utc};
use fcst_engine::models::params::keys;
use fcst_engine::prelude::*;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn daily(values: Vec<f64>) -> TimeSeries {
    let timestamps = (0..values.len())
        .map(|i| base() + Duration::days(i as i64))
        .collect();
    TimeSeries::univariate(timestamps, values).unwrap()
}

fn noise(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5
        })
        .collect()
}

fn weekly(n: usize, seed: u64) -> Vec<f64> {
    let profile = [5.0, 9.0, 12.0, 7.0, 2.0, -15.0, -20.0];
    noise(n, seed)
        .iter()
        .enumerate()
        .map(|(i, e)| 200.0 + 0.3 * i as f64 + profile[i % 7] + 2.0 * e)
        .collect()
}

#[test]
fn every_model_forecasts_a_long_seasonal_series() {
    let series = daily(weekly(140, 3));
    let params = ModelParams::new().with(keys::SEASONAL_PERIOD, 7);
    for kind in ModelKind::ALL {
        let result = forecast_series(&series, kind.as_str(), 14, &params)
            .unwrap_or_else(|e| panic!("{kind} failed: {e}"));
        assert_eq!(result.horizon(), 14, "{kind}");
        assert!(
            result.point().iter().all(|p| p.is_finite()),
            "{kind} produced {:?}",
            result.point()
        );
        assert!(!result.model.is_empty());
    }
}

#[test]
fn seasonal_naive_repeats_the_last_cycle() {
    let values = weekly(28, 9);
    let last_week = values[21..].to_vec();
    let params = ModelParams::new().with(keys::SEASONAL_PERIOD, 7);
    let result = forecast_series(&daily(values), "snaive", 14, &params).unwrap();
    assert_eq!(result.model, "SeasonalNaive");
    assert_eq!(&result.point()[..7], last_week.as_slice());
    assert_eq!(&result.point()[7..], last_week.as_slice());
}

#[test]
fn timestamps_continue_the_observed_spacing() {
    let timestamps: Vec<_> = (0..10).map(|i| base() + Duration::hours(6 * i)).collect();
    let series = TimeSeries::univariate(timestamps, (0..10).map(f64::from).collect()).unwrap();
    let result = forecast_series(&series, "Holt", 3, &ModelParams::new()).unwrap();
    let stamps: Vec<_> = result.steps.iter().map(|s| s.timestamp.unwrap()).collect();
    assert_eq!(stamps[0], base() + Duration::hours(60));
    assert_eq!(stamps[2], base() + Duration::hours(72));
}

#[test]
fn search_results_report_the_selected_model() {
    let series = daily(weekly(120, 5));
    let params = ModelParams::new().with(keys::SEASONAL_PERIOD, 7);
    let ets = forecast_series(&series, "AutoETS", 7, &params).unwrap();
    assert!(ets.model.starts_with("ETS("), "{}", ets.model);
    let arima = forecast_series(&series, "auto_arima", 7, &params).unwrap();
    assert!(arima.model.starts_with("ARIMA("), "{}", arima.model);
    let mstl = forecast_series(&series, "AutoMSTL", 7, &params).unwrap();
    assert!(mstl.model.starts_with("MSTL("), "{}", mstl.model);
    let mfles = forecast_series(&series, "AutoMFLES", 7, &params).unwrap();
    assert!(mfles.model.starts_with("MFLES("), "{}", mfles.model);
}

#[test]
fn baselines_tolerate_missing_values_and_others_do_not() {
    let base = base();
    let timestamps: Vec<_> = (0..8).map(|i| base + Duration::days(i)).collect();
    let values = vec![
        Some(1.0),
        Some(2.0),
        None,
        Some(4.0),
        Some(5.0),
        None,
        Some(7.0),
        None,
    ];
    let series = TimeSeries::from_optional(timestamps, values).unwrap();

    let naive = forecast_series(&series, "Naive", 2, &ModelParams::new()).unwrap();
    assert_eq!(naive.point(), vec![7.0, 7.0]);

    let err = forecast_series(&series, "SES", 2, &ModelParams::new()).unwrap_err();
    assert_eq!(err, ForecastError::MissingValues);
}

#[test]
fn intermittent_models_reject_negative_demand() {
    let series = daily(vec![0.0, 3.0, 0.0, -1.0, 2.0, 0.0]);
    for model in ["CrostonClassic", "CrostonSBA", "TSB"] {
        let err = forecast_series(&series, model, 3, &ModelParams::new()).unwrap_err();
        assert!(err.is_validation(), "{model}: {err}");
    }
}

#[test]
fn validation_errors_are_distinguished_from_fit_failures() {
    let series = daily(vec![1.0, 2.0, 3.0]);
    let unknown = forecast_series(&series, "Prophet", 1, &ModelParams::new()).unwrap_err();
    assert!(matches!(unknown, ForecastError::UnknownModel(_)));
    assert!(unknown.is_validation());

    let missing = forecast_series(&series, "HoltWinters", 1, &ModelParams::new()).unwrap_err();
    assert!(matches!(missing, ForecastError::MissingParameter(_)));
}

#[test]
fn groups_fan_out_and_keep_order() {
    let groups: Vec<(String, TimeSeries)> = (0..24)
        .map(|g| {
            let values = if g % 5 == 4 {
                vec![1.0]
            } else {
                weekly(70, g as u64 + 1)
            };
            (format!("store-{g}"), daily(values))
        })
        .collect();
    let params = ModelParams::new().with(keys::SEASONAL_PERIOD, 7);

    let parallel = forecast_groups(&groups, "AutoETS", 7, &params, &EngineConfig::default());
    let sequential = forecast_groups(&groups, "AutoETS", 7, &params, &EngineConfig::sequential());
    assert_eq!(parallel, sequential);

    for (g, out) in parallel.iter().enumerate() {
        assert_eq!(out.key, format!("store-{g}"));
        assert_eq!(out.is_ok(), g % 5 != 4, "group {g}");
    }
    let rows: Vec<_> = parallel.iter().flat_map(|g| g.rows()).collect();
    let ok_groups = parallel.iter().filter(|g| g.is_ok()).count();
    assert_eq!(rows.len(), ok_groups * 7);
}
