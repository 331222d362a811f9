//! Seasonal window average: the mean of the last few cycles at each position.

use super::{require_observed, residuals_of};
use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::intervals::UncertaintyShape;
use crate::models::Forecaster;
use crate::utils::stats::residual_sigma;

/// Default number of cycles averaged.
pub const DEFAULT_CYCLES: usize = 2;

#[derive(Debug, Clone)]
pub struct SeasonalWindowAverage {
    period: usize,
    cycles: usize,
    profile: Option<Vec<f64>>,
    sigma: f64,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl SeasonalWindowAverage {
    pub fn new(period: usize, cycles: usize) -> Self {
        Self {
            period: period.max(1),
            cycles: cycles.max(1),
            profile: None,
            sigma: f64::NAN,
            fitted: None,
            residuals: None,
        }
    }

    /// Mean of up to `cycles` observed values at `t - m, t - 2m, ...`
    /// (starting at `t` itself when `inclusive`).
    fn position_mean(values: &[f64], t: usize, m: usize, cycles: usize, inclusive: bool) -> f64 {
        let mut sum = 0.0;
        let mut count = 0;
        let mut idx = if inclusive { Some(t) } else { t.checked_sub(m) };
        while let Some(i) = idx {
            if count == cycles {
                break;
            }
            if values[i].is_finite() {
                sum += values[i];
                count += 1;
            }
            idx = i.checked_sub(m);
        }
        if count == 0 {
            f64::NAN
        } else {
            sum / count as f64
        }
    }
}

impl Forecaster for SeasonalWindowAverage {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let (m, w) = (self.period, self.cycles);
        require_observed(values, 2)?;
        let n = values.len();
        if n < m {
            return Err(ForecastError::InsufficientData { needed: m, got: n });
        }

        let profile: Vec<f64> = (n - m..n)
            .map(|t| Self::position_mean(values, t, m, w, true))
            .collect();
        if profile.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InsufficientData {
                needed: m,
                got: profile.iter().filter(|v| v.is_finite()).count(),
            });
        }

        let fitted: Vec<f64> = (0..n)
            .map(|t| Self::position_mean(values, t, m, w, false))
            .collect();
        let residuals = residuals_of(values, &fitted);

        self.sigma = residual_sigma(&residuals);
        self.profile = Some(profile);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let profile = self.profile.as_ref().ok_or(ForecastError::FitRequired)?;
        Ok(Forecast::from_values(
            (0..horizon).map(|h| profile[h % self.period]).collect(),
        ))
    }

    fn standard_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        self.profile.as_ref().ok_or(ForecastError::FitRequired)?;
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
        "SeasonalWindowAverage"
    }
}
