//! Baseline forecasting models.
//!
//! Closed-form methods that serve as benchmarks for more complex models.
//! They tolerate missing observations: the last *observed* value is used and
//! residuals are skipped where either side is missing.

mod naive;
mod random_walk;
mod seasonal_naive;
mod seasonal_window;
mod sma;

pub use naive::Naive;
pub use random_walk::RandomWalkDrift;
pub use seasonal_naive::SeasonalNaive;
pub use seasonal_window::{SeasonalWindowAverage, DEFAULT_CYCLES};
pub use sma::{SimpleMovingAverage, DEFAULT_WINDOW};

use crate::error::{ForecastError, Result};

/// Index and value of the last finite observation.
pub(crate) fn last_observed(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .enumerate()
        .rev()
        .find(|(_, v)| v.is_finite())
        .map(|(i, &v)| (i, v))
}

/// Residuals `y - fitted`, `NaN` where either side is missing.
pub(crate) fn residuals_of(values: &[f64], fitted: &[f64]) -> Vec<f64> {
    values
        .iter()
        .zip(fitted)
        .map(|(y, f)| {
            if y.is_finite() && f.is_finite() {
                y - f
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Baselines need at least two observed values.
pub(crate) fn require_observed(values: &[f64], needed: usize) -> Result<()> {
    let got = values.iter().filter(|v| v.is_finite()).count();
    if values.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if got < needed {
        return Err(ForecastError::InsufficientData { needed, got });
    }
    Ok(())
}
