//! Prediction intervals from step-dependent standard errors.
//!
//! Every family reports a standard error per horizon step; this module turns
//! those into a two-sided normal interval at the caller's confidence level.

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::utils::stats::quantile_normal;

/// Confidence level used when the caller does not supply one.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.90;

/// Half-width used when a step has no finite standard error, as a fraction
/// of the absolute point forecast.
pub const FALLBACK_FRACTION: f64 = 0.10;

/// How a model's forecast uncertainty evolves with the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UncertaintyShape {
    /// Width is the same at every step (repeat/average strategies).
    Constant,
    /// Width is non-decreasing in the step.
    Growing,
}

/// Validate a confidence level: strictly inside (0, 1).
pub fn validate_level(level: f64) -> Result<()> {
    if level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(ForecastError::InvalidParameter(format!(
            "confidence_level must be in (0, 1), got {level}"
        )))
    }
}

/// Two-sided normal critical value for `level`.
pub fn critical_value(level: f64) -> Result<f64> {
    validate_level(level)?;
    quantile_normal(0.5 + level / 2.0)
}

/// Interval half-widths for each step.
///
/// Non-finite standard errors fall back to [`FALLBACK_FRACTION`] of the
/// point. For [`UncertaintyShape::Growing`] the half-width is carried as a
/// running maximum so it never shrinks.
pub fn half_widths(
    point: &[f64],
    standard_errors: &[f64],
    level: f64,
    shape: UncertaintyShape,
) -> Result<Vec<f64>> {
    if point.len() != standard_errors.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: point.len(),
            got: standard_errors.len(),
        });
    }
    let z = critical_value(level)?;

    let mut widths: Vec<f64> = point
        .iter()
        .zip(standard_errors)
        .map(|(&p, &se)| {
            let w = z * se.abs();
            if w.is_finite() {
                w
            } else {
                FALLBACK_FRACTION * p.abs()
            }
        })
        .map(|w| if w.is_finite() { w.max(0.0) } else { 0.0 })
        .collect();

    if shape == UncertaintyShape::Growing {
        let mut running = 0.0_f64;
        for w in widths.iter_mut() {
            running = running.max(*w);
            *w = running;
        }
    }
    Ok(widths)
}

/// Build a [`Forecast`] with symmetric bounds around `point`.
pub fn build_forecast(
    point: &[f64],
    standard_errors: &[f64],
    level: f64,
    shape: UncertaintyShape,
) -> Result<Forecast> {
    let widths = half_widths(point, standard_errors, level, shape)?;
    let lower = point.iter().zip(&widths).map(|(p, w)| p - w).collect();
    let upper = point.iter().zip(&widths).map(|(p, w)| p + w).collect();
    Forecast::from_values_with_intervals(point.to_vec(), lower, upper)
}

/// `sigma * sqrt(h)` for `h = 1..=horizon`.
pub fn sqrt_horizon_errors(sigma: f64, horizon: usize) -> Vec<f64> {
    (1..=horizon).map(|h| sigma * (h as f64).sqrt()).collect()
}
