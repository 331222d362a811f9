//! Single-group and per-group forecasting entry points.

use super::result::{ForecastResult, ForecastStep, GroupForecast};
use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::{ModelParams, ModelSpec};
use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use tracing::debug;

/// Execution settings for [`forecast_groups`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fan groups out over worker threads.
    pub parallel: bool,
    /// Size of a dedicated thread pool; `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

impl EngineConfig {
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            threads: None,
        }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
}

/// Forecast one series with the named model.
///
/// # Example
/// ```
/// use fcst_engine::core::TimeSeries;
/// use fcst_engine::engine::forecast_series;
/// use fcst_engine::models::ModelParams;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let timestamps: Vec<_> = (0..3).map(|i| base + Duration::days(i)).collect();
/// let series = TimeSeries::univariate(timestamps, vec![100.0, 102.0, 105.0]).unwrap();
///
/// let result = forecast_series(&series, "Naive", 3, &ModelParams::new()).unwrap();
/// assert_eq!(result.point(), vec![105.0, 105.0, 105.0]);
/// assert_eq!(result.steps[0].timestamp, Some(base + Duration::days(3)));
/// ```
pub fn forecast_series(
    series: &TimeSeries,
    model: &str,
    horizon: usize,
    params: &ModelParams,
) -> Result<ForecastResult> {
    if horizon == 0 {
        return Err(ForecastError::InvalidParameter(
            "horizon must be positive".into(),
        ));
    }
    let spec = ModelSpec::parse(model, params.clone())?;
    let level = params.confidence_level()?;
    let include_fitted = params.include_fitted()?;
    let generate_timestamps = params.generate_timestamps()?;
    spec.validate(series)?;

    let mut forecaster = spec.build()?;
    forecaster.fit(series)?;
    let forecast = forecaster.predict_with_intervals(horizon, level)?;

    let origin = series.last_timestamp().filter(|_| generate_timestamps);
    let interval = series.mean_interval().unwrap_or_else(Duration::zero);
    let (point, lower, upper) = forecast.into_parts();
    let lower = lower.unwrap_or_else(|| point.clone());
    let upper = upper.unwrap_or_else(|| point.clone());
    let steps = point
        .iter()
        .zip(&lower)
        .zip(&upper)
        .enumerate()
        .map(|(i, ((&p, &lo), &hi))| {
            let step = i + 1;
            let timestamp = origin
                .map(|t| step_timestamp(t, interval, step))
                .transpose()?;
            Ok(ForecastStep {
                step,
                timestamp,
                point: p,
                lower: lo,
                upper: hi,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let fitted = include_fitted.then(|| {
        forecaster
            .fitted_values()
            .map(<[f64]>::to_vec)
            .unwrap_or_default()
    });

    Ok(ForecastResult {
        model: forecaster.name().to_string(),
        confidence_level: level,
        steps,
        fitted,
    })
}

/// Timestamp `step` intervals after `origin`.
fn step_timestamp(
    origin: DateTime<Utc>,
    interval: Duration,
    step: usize,
) -> Result<DateTime<Utc>> {
    i32::try_from(step)
        .ok()
        .and_then(|k| interval.checked_mul(k))
        .and_then(|offset| origin.checked_add_signed(offset))
        .ok_or_else(|| {
            ForecastError::InvalidParameter(format!(
                "forecast timestamp for step {step} is out of range"
            ))
        })
}

/// Forecast every group independently; results keep the input order.
///
/// A failing group carries its error and never affects the others.
pub fn forecast_groups<K>(
    groups: &[(K, TimeSeries)],
    model: &str,
    horizon: usize,
    params: &ModelParams,
    config: &EngineConfig,
) -> Vec<GroupForecast<K>>
where
    K: Clone + Send + Sync,
{
    debug!(groups = groups.len(), model, horizon, "forecasting groups");
    let run = |index: usize, key: &K, series: &TimeSeries| {
        let result = forecast_series(series, model, horizon, params);
        if let Err(err) = &result {
            debug!(group = index, %err, "group failed");
        }
        GroupForecast {
            key: key.clone(),
            result,
        }
    };

    if !config.parallel {
        return groups
            .iter()
            .enumerate()
            .map(|(i, (key, series))| run(i, key, series))
            .collect();
    }

    let fan_out = || -> Vec<GroupForecast<K>> {
        groups
            .par_iter()
            .enumerate()
            .map(|(i, (key, series))| run(i, key, series))
            .collect()
    };
    match config.threads {
        Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(fan_out),
            Err(err) => {
                debug!(%err, "dedicated pool unavailable, using the global pool");
                fan_out()
            }
        },
        None => fan_out(),
    }
}
