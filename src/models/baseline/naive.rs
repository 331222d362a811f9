//! Naive forecasting model.
//!
//! The naive method forecasts the last observed value for all future periods.

use super::{last_observed, require_observed, residuals_of};
use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::intervals::UncertaintyShape;
use crate::models::Forecaster;
use crate::utils::stats::residual_sigma;

/// Naive forecaster that repeats the last observed value.
///
/// Interval width is constant across the horizon and derived once from the
/// one-step residual spread.
#[derive(Debug, Clone, Default)]
pub struct Naive {
    last_value: Option<f64>,
    sigma: f64,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl Naive {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Forecaster for Naive {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        require_observed(values, 2)?;

        let mut fitted = Vec::with_capacity(values.len());
        let mut previous = f64::NAN;
        for &y in values {
            fitted.push(previous);
            if y.is_finite() {
                previous = y;
            }
        }
        let residuals = residuals_of(values, &fitted);

        self.last_value = last_observed(values).map(|(_, v)| v);
        self.sigma = residual_sigma(&residuals);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let last = self.last_value.ok_or(ForecastError::FitRequired)?;
        Ok(Forecast::from_values(vec![last; horizon]))
    }

    fn standard_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        self.last_value.ok_or(ForecastError::FitRequired)?;
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
        "Naive"
    }
}
