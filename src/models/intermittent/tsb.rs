//! TSB (Teunter-Syntetos-Babai) method.
//!
//! Demand size is smoothed on non-zero periods only; the probability of a
//! demand is smoothed every period, so the forecast decays towards zero when
//! demand stops. Forecast = probability * size.

use super::validate_demand;
use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::intervals::UncertaintyShape;
use crate::models::Forecaster;
use crate::utils::stats::residual_sigma;

#[derive(Debug, Clone)]
struct TSBFit {
    size: f64,
    probability: f64,
    sigma: f64,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
}

/// TSB forecaster.
#[derive(Debug, Clone)]
pub struct TSB {
    alpha_d: f64,
    alpha_p: f64,
    fit: Option<TSBFit>,
}

impl TSB {
    /// `alpha_d = alpha_p = 0.1`.
    pub fn new() -> Self {
        Self {
            alpha_d: 0.1,
            alpha_p: 0.1,
            fit: None,
        }
    }

    pub fn with_params(mut self, alpha_d: f64, alpha_p: f64) -> Self {
        self.alpha_d = alpha_d;
        self.alpha_p = alpha_p;
        self
    }

    pub fn alpha_d(&self) -> f64 {
        self.alpha_d
    }

    pub fn alpha_p(&self) -> f64 {
        self.alpha_p
    }

    pub fn demand_size(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.size)
    }

    pub fn probability(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.probability)
    }

    fn fitted_state(&self) -> Result<&TSBFit> {
        self.fit.as_ref().ok_or(ForecastError::FitRequired)
    }
}

impl Default for TSB {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for TSB {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let y = series.values();
        validate_demand(y)?;
        for (name, alpha) in [("alpha_d", self.alpha_d), ("alpha_p", self.alpha_p)] {
            if !(alpha > 0.0 && alpha < 1.0) {
                return Err(ForecastError::InvalidParameter(format!(
                    "{name} must be in (0, 1), got {alpha}"
                )));
            }
        }

        // Initial size is the first demand, initial probability the first
        // occurrence indicator.
        let mut size = y.iter().copied().find(|&v| v > 0.0).unwrap_or(0.0);
        let mut probability = if y[0] > 0.0 { 1.0 } else { 0.0 };
        let mut fitted = Vec::with_capacity(y.len());
        for (t, &value) in y.iter().enumerate() {
            fitted.push(if t == 0 { f64::NAN } else { probability * size });
            let occurred = if value > 0.0 { 1.0 } else { 0.0 };
            if t > 0 {
                probability = self.alpha_p * occurred + (1.0 - self.alpha_p) * probability;
            }
            if value > 0.0 && t > 0 {
                size = self.alpha_d * value + (1.0 - self.alpha_d) * size;
            }
        }
        let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(a, f)| a - f).collect();
        let sigma = residual_sigma(&residuals);

        self.fit = Some(TSBFit {
            size,
            probability,
            sigma,
            fitted,
            residuals,
        });
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let fit = self.fitted_state()?;
        Ok(Forecast::from_values(vec![
            fit.probability * fit.size;
            horizon
        ]))
    }

    fn standard_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        Ok(vec![self.fitted_state()?.sigma; horizon])
    }

    fn uncertainty_shape(&self) -> UncertaintyShape {
        UncertaintyShape::Constant
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|f| f.fitted.as_slice())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|f| f.residuals.as_slice())
    }

    fn name(&self) -> &str {
        "TSB"
    }
}
