//! Random walk with drift.

use super::{last_observed, require_observed, residuals_of};
use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::intervals::sqrt_horizon_errors;
use crate::models::Forecaster;
use crate::utils::stats::residual_sigma;

/// Random walk plus a linear drift estimated from the first and last
/// observations. Uncertainty accumulates: the standard error grows with
/// the square root of the step.
#[derive(Debug, Clone, Default)]
pub struct RandomWalkDrift {
    drift: Option<f64>,
    last_value: f64,
    /// Steps between the last observation and the end of the series.
    tail_gap: usize,
    sigma: f64,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl RandomWalkDrift {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drift(&self) -> Option<f64> {
        self.drift
    }
}

impl Forecaster for RandomWalkDrift {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        require_observed(values, 2)?;

        let (first_idx, first) = values
            .iter()
            .enumerate()
            .find(|(_, v)| v.is_finite())
            .map(|(i, &v)| (i, v))
            .ok_or(ForecastError::EmptyData)?;
        let (last_idx, last) = last_observed(values).ok_or(ForecastError::EmptyData)?;
        let drift = (last - first) / (last_idx - first_idx) as f64;

        let mut fitted = Vec::with_capacity(values.len());
        let mut anchor: Option<(usize, f64)> = None;
        for (t, &y) in values.iter().enumerate() {
            fitted.push(match anchor {
                Some((i, v)) => v + (t - i) as f64 * drift,
                None => f64::NAN,
            });
            if y.is_finite() {
                anchor = Some((t, y));
            }
        }
        let residuals = residuals_of(values, &fitted);

        self.drift = Some(drift);
        self.last_value = last;
        self.tail_gap = values.len() - 1 - last_idx;
        self.sigma = residual_sigma(&residuals);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let drift = self.drift.ok_or(ForecastError::FitRequired)?;
        let values = (1..=horizon)
            .map(|h| self.last_value + (h + self.tail_gap) as f64 * drift)
            .collect();
        Ok(Forecast::from_values(values))
    }

    fn standard_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        self.drift.ok_or(ForecastError::FitRequired)?;
        Ok(sqrt_horizon_errors(self.sigma, horizon))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "RandomWalkDrift"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn make_series(values: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| base + Duration::days(i as i64))
            .collect();
        TimeSeries::univariate(timestamps, values).unwrap()
    }

    #[test]
    fn extrapolates_drift() {
        let mut model = RandomWalkDrift::new();
        model.fit(&make_series(vec![10.0, 12.0, 13.0, 16.0])).unwrap();
        assert_relative_eq!(model.drift().unwrap(), 2.0, epsilon = 1e-12);
        let forecast = model.predict(3).unwrap();
        assert_relative_eq!(forecast.point()[0], 18.0, epsilon = 1e-12);
        assert_relative_eq!(forecast.point()[2], 22.0, epsilon = 1e-12);
    }

    #[test]
    fn interval_grows_with_sqrt_step() {
        let mut model = RandomWalkDrift::new();
        model
            .fit(&make_series(vec![10.0, 12.5, 13.0, 16.0, 17.2, 20.1]))
            .unwrap();
        let widths = model.predict_with_intervals(4, 0.9).unwrap().widths().unwrap();
        assert_relative_eq!(widths[3] / widths[0], 2.0, epsilon = 1e-9);
        for pair in widths.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn trailing_gap_is_bridged() {
        let mut model = RandomWalkDrift::new();
        model.fit(&make_series(vec![0.0, 1.0, 2.0, f64::NAN])).unwrap();
        assert_relative_eq!(model.predict(1).unwrap().point()[0], 4.0, epsilon = 1e-12);
    }
}
