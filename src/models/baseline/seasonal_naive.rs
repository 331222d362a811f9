//! Seasonal naive forecasting model.

use super::{require_observed, residuals_of};
use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::intervals::UncertaintyShape;
use crate::models::Forecaster;
use crate::utils::stats::residual_sigma;

/// Repeats the value observed at the same position of the previous cycle.
#[derive(Debug, Clone)]
pub struct SeasonalNaive {
    period: usize,
    /// Last observed value at each seasonal position, aligned so that
    /// `last_cycle[0]` is the value for the first forecast step.
    last_cycle: Option<Vec<f64>>,
    sigma: f64,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl SeasonalNaive {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            last_cycle: None,
            sigma: f64::NAN,
            fitted: None,
            residuals: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Most recent observed value at index `t` or `t - k*m`.
    fn observed_at_or_before(values: &[f64], mut t: usize, m: usize) -> f64 {
        loop {
            if values[t].is_finite() {
                return values[t];
            }
            if t < m {
                return f64::NAN;
            }
            t -= m;
        }
    }
}

impl Forecaster for SeasonalNaive {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let m = self.period;
        require_observed(values, 2)?;
        if values.len() < m {
            return Err(ForecastError::InsufficientData {
                needed: m,
                got: values.len(),
            });
        }

        let n = values.len();
        let last_cycle: Vec<f64> = (n - m..n)
            .map(|t| Self::observed_at_or_before(values, t, m))
            .collect();
        if last_cycle.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InsufficientData {
                needed: m,
                got: last_cycle.iter().filter(|v| v.is_finite()).count(),
            });
        }

        let fitted: Vec<f64> = (0..n)
            .map(|t| {
                if t >= m {
                    Self::observed_at_or_before(values, t - m, m)
                } else {
                    f64::NAN
                }
            })
            .collect();
        let residuals = residuals_of(values, &fitted);

        self.sigma = residual_sigma(&residuals);
        self.last_cycle = Some(last_cycle);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let cycle = self.last_cycle.as_ref().ok_or(ForecastError::FitRequired)?;
        let values = (0..horizon).map(|h| cycle[h % self.period]).collect();
        Ok(Forecast::from_values(values))
    }

    fn standard_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        self.last_cycle.as_ref().ok_or(ForecastError::FitRequired)?;
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
        "SeasonalNaive"
    }
}
