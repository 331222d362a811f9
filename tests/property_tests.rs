//! Property-based tests for forecasting models.
//!
//! These tests check invariants that hold for all valid inputs, using randomly
//! generated series.

use chrono::{Duration, TimeZone, Utc};
use fcst_engine::core::TimeSeries;
use fcst_engine::engine::forecast_series;
use fcst_engine::intervals::UncertaintyShape;
use fcst_engine::models::arima::AutoARIMA;
use fcst_engine::models::exponential::{AutoETS, SeasonalType, TrendType};
use fcst_engine::models::params::keys;
use fcst_engine::models::{Forecaster, ModelKind, ModelParams, ModelSpec};
use fcst_engine::ForecastError;
use proptest::prelude::*;

fn make_ts(values: &[f64]) -> TimeSeries {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let timestamps: Vec<_> = (0..values.len())
        .map(|i| base + Duration::hours(i as i64))
        .collect();
    TimeSeries::univariate(timestamps, values.to_vec()).unwrap()
}

/// Positive values with a small drift so that no series is exactly constant.
fn valid_values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(1.0..1000.0_f64, len).prop_map(|mut v| {
            for (i, val) in v.iter_mut().enumerate() {
                *val += (i as f64) * 0.001;
            }
            v
        })
    })
}

/// Seasonal series centred near zero, so some observations are non-positive.
fn signed_seasonal_strategy(period: usize) -> impl Strategy<Value = Vec<f64>> {
    (6usize..12, -5.0..5.0_f64, 5.0..20.0_f64).prop_map(move |(cycles, base, amplitude)| {
        (0..cycles * period)
            .map(|i| {
                base + amplitude * (2.0 * std::f64::consts::PI * i as f64 / period as f64).sin()
                    + ((i * 17) % 5) as f64 * 0.1
            })
            .collect()
    })
}

const WEEK: usize = 7;

/// Positive trending weekly series whose length is never a whole number of cycles.
fn partial_cycle_weekly_strategy() -> impl Strategy<Value = Vec<f64>> {
    (
        4usize..9,
        1usize..7,
        100.0..500.0_f64,
        1.0..30.0_f64,
        -0.5..0.5_f64,
        any::<u64>(),
    )
        .prop_map(|(cycles, extra, level, amplitude, slope, seed)| {
            let profile = [0.6, 1.0, 0.3, -0.4, -0.9, -0.5, -0.1];
            let mut state = seed;
            (0..cycles * WEEK + extra)
                .map(|i| {
                    state = state
                        .wrapping_mul(6364136223846793005)
                        .wrapping_add(1442695040888963407);
                    let noise = (state >> 33) as f64 / (1u64 << 31) as f64 - 0.5;
                    level + slope * i as f64 + amplitude * profile[i % WEEK] + 2.0 * noise
                })
                .collect()
        })
}

/// Models whose interval width may not shrink with the step.
const GROWING: [ModelKind; 15] = [
    ModelKind::RandomWalkDrift,
    ModelKind::SES,
    ModelKind::SESOptimized,
    ModelKind::Holt,
    ModelKind::HoltWinters,
    ModelKind::ETS,
    ModelKind::AutoETS,
    ModelKind::ARIMA,
    ModelKind::AutoARIMA,
    ModelKind::Theta,
    ModelKind::OptimizedTheta,
    ModelKind::MSTL,
    ModelKind::AutoMSTL,
    ModelKind::MFLES,
    ModelKind::AutoMFLES,
];

fn weekly_params(kind: ModelKind) -> ModelParams {
    let params = ModelParams::new().with(keys::SEASONAL_PERIOD, WEEK);
    match kind {
        ModelKind::ETS => params.with(keys::SEASON_TYPE, "A"),
        _ => params,
    }
}

fn random_walk_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-2.0..2.0_f64, 30..60).prop_map(|steps| {
        steps
            .iter()
            .scan(100.0, |acc, s| {
                *acc += s;
                Some(*acc)
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn naive_repeats_last_value(values in valid_values_strategy(2, 50), horizon in 1usize..12) {
        let result = forecast_series(&make_ts(&values), "Naive", horizon, &ModelParams::new()).unwrap();
        let last = *values.last().unwrap();
        prop_assert_eq!(result.horizon(), horizon);
        prop_assert!(result.point().iter().all(|&p| p == last));
    }

    #[test]
    fn intervals_bracket_point(values in valid_values_strategy(12, 60), horizon in 1usize..10) {
        for model in ["Naive", "RandomWalkDrift", "SMA", "SES", "Holt", "Theta"] {
            let result = forecast_series(&make_ts(&values), model, horizon, &ModelParams::new()).unwrap();
            for step in &result.steps {
                prop_assert!(step.lower <= step.point + 1e-9, "{} step {}", model, step.step);
                prop_assert!(step.point <= step.upper + 1e-9, "{} step {}", model, step.step);
            }
        }
    }

    #[test]
    fn wider_level_gives_wider_intervals(values in valid_values_strategy(12, 40)) {
        let series = make_ts(&values);
        let narrow = forecast_series(&series, "SES", 3, &ModelParams::new().with(keys::CONFIDENCE_LEVEL, 0.8)).unwrap();
        let wide = forecast_series(&series, "SES", 3, &ModelParams::new().with(keys::CONFIDENCE_LEVEL, 0.95)).unwrap();
        for (n, w) in narrow.steps.iter().zip(&wide.steps) {
            prop_assert!(w.upper - w.lower + 1e-9 >= n.upper - n.lower);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn growing_widths_never_shrink(values in partial_cycle_weekly_strategy()) {
        let series = make_ts(&values);
        for kind in GROWING {
            let model = ModelSpec::new(kind, weekly_params(kind)).build().unwrap();
            prop_assert_eq!(model.uncertainty_shape(), UncertaintyShape::Growing, "{}", kind);
            let result = forecast_series(&series, kind.as_str(), 2 * WEEK, &weekly_params(kind))
                .unwrap_or_else(|e| panic!("{kind} failed on {} points: {e}", values.len()));
            let widths: Vec<f64> = result.steps.iter().map(|s| s.upper - s.lower).collect();
            for pair in widths.windows(2) {
                prop_assert!(pair[1] + 1e-9 >= pair[0], "{} widths {:?}", kind, widths);
            }
        }
    }

    #[test]
    fn repeated_calls_are_identical(values in partial_cycle_weekly_strategy()) {
        let series = make_ts(&values);
        for kind in ModelKind::ALL {
            let params = weekly_params(kind).with(keys::INCLUDE_FITTED, true);
            let first = forecast_series(&series, kind.as_str(), WEEK, &params)
                .unwrap_or_else(|e| panic!("{kind} failed on {} points: {e}", values.len()));
            let second = forecast_series(&series, kind.as_str(), WEEK, &params).unwrap();
            prop_assert_eq!(&first.steps, &second.steps, "{}", kind);
            prop_assert_eq!(&first.model, &second.model);
            let bits = |fitted: &Option<Vec<f64>>| {
                fitted
                    .as_ref()
                    .map(|v| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>())
            };
            prop_assert_eq!(bits(&first.fitted), bits(&second.fitted), "{}", kind);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn auto_ets_avoids_multiplicative_shapes_on_non_positive_data(values in signed_seasonal_strategy(4)) {
        prop_assume!(values.iter().any(|&v| v <= 0.0));
        let mut model = AutoETS::with_period(4);
        model.fit(&make_ts(&values)).unwrap();
        let spec = model.selected_spec().unwrap();
        prop_assert!(!spec.needs_positive_data(), "selected {:?}", spec);
        prop_assert_ne!(spec.seasonal, SeasonalType::Multiplicative);
        prop_assert!(!matches!(spec.trend, TrendType::Multiplicative | TrendType::MultiplicativeDamped));
    }

    #[test]
    fn auto_arima_differencing_is_bounded(values in random_walk_strategy()) {
        let mut model = AutoARIMA::new();
        model.fit(&make_ts(&values)).unwrap();
        let spec = model.selected_spec().unwrap();
        prop_assert!(spec.d <= 2);
        prop_assert!(spec.cap_d <= 2);
        prop_assert!(model.predict(5).unwrap().point().iter().all(|p| p.is_finite()));
    }
}

#[test]
fn every_model_rejects_series_below_its_minimum() {
    let params = ModelParams::new().with(keys::SEASONAL_PERIOD, 4);
    for kind in ModelKind::ALL {
        let spec = ModelSpec::new(kind, params.clone());
        let needed = spec.min_length().unwrap();
        assert!(needed >= 2, "{kind} accepts a single point");
        let values: Vec<f64> = (0..needed - 1).map(|i| 1.0 + (i % 3) as f64).collect();
        let err = forecast_series(&make_ts(&values), kind.as_str(), 1, &params).unwrap_err();
        assert_eq!(
            err,
            ForecastError::InsufficientData {
                needed,
                got: needed - 1
            },
            "{kind}"
        );
    }
}
