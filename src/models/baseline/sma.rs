//! Simple moving average forecaster.

use super::{require_observed, residuals_of};
use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::intervals::UncertaintyShape;
use crate::models::Forecaster;
use crate::utils::stats::residual_sigma;

/// Default trailing window.
pub const DEFAULT_WINDOW: usize = 5;

/// Forecasts the mean of the trailing `window` observed values.
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    window: usize,
    level: Option<f64>,
    sigma: f64,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl SimpleMovingAverage {
    /// Create an SMA with the given window (clamped to at least 1).
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            level: None,
            sigma: f64::NAN,
            fitted: None,
            residuals: None,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    fn trailing_mean(observed: &[f64], window: usize) -> f64 {
        let take = window.min(observed.len());
        let tail = &observed[observed.len() - take..];
        tail.iter().sum::<f64>() / take as f64
    }
}

impl Default for SimpleMovingAverage {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl Forecaster for SimpleMovingAverage {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        require_observed(values, 2)?;

        let mut observed: Vec<f64> = Vec::with_capacity(values.len());
        let mut fitted = Vec::with_capacity(values.len());
        for &y in values {
            fitted.push(if observed.is_empty() {
                f64::NAN
            } else {
                Self::trailing_mean(&observed, self.window)
            });
            if y.is_finite() {
                observed.push(y);
            }
        }
        let residuals = residuals_of(values, &fitted);

        self.level = Some(Self::trailing_mean(&observed, self.window));
        self.sigma = residual_sigma(&residuals);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let level = self.level.ok_or(ForecastError::FitRequired)?;
        Ok(Forecast::from_values(vec![level; horizon]))
    }

    fn standard_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        self.level.ok_or(ForecastError::FitRequired)?;
        Ok(vec![self.sigma; horizon])
    }

    fn uncertainty_shape(&self) -> UncertaintyShape {
        UncertaintyShape::Constant
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "SMA"
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
    fn averages_trailing_window() {
        let mut model = SimpleMovingAverage::new(3);
        model
            .fit(&make_series(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]))
            .unwrap();
        let forecast = model.predict(2).unwrap();
        assert_relative_eq!(forecast.point()[0], 5.0, epsilon = 1e-12);
        assert_relative_eq!(forecast.point()[1], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn short_series_uses_all_values() {
        let mut model = SimpleMovingAverage::default();
        model.fit(&make_series(vec![2.0, 4.0])).unwrap();
        assert_relative_eq!(model.predict(1).unwrap().point()[0], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn fitted_values_are_one_step_ahead() {
        let mut model = SimpleMovingAverage::new(2);
        model.fit(&make_series(vec![1.0, 3.0, 5.0, 7.0])).unwrap();
        let fitted = model.fitted_values().unwrap();
        assert!(fitted[0].is_nan());
        assert_relative_eq!(fitted[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(fitted[3], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn skips_missing_values() {
        let mut model = SimpleMovingAverage::new(2);
        model
            .fit(&make_series(vec![1.0, 3.0, f64::NAN, 5.0]))
            .unwrap();
        assert_relative_eq!(model.predict(1).unwrap().point()[0], 4.0, epsilon = 1e-12);
    }
}
