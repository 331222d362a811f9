//! Statistical utility functions and the information criterion shared by
//! every model search.

use crate::error::{ForecastError, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// Relative tolerance under which two information-criterion scores tie.
pub const SCORE_TIE_TOLERANCE: f64 = 1e-9;

/// Floor applied to residual variance before taking logarithms.
pub const VARIANCE_FLOOR: f64 = 1e-10;

/// Quantile function of the standard normal distribution.
///
/// # Example
/// ```
/// use fcst_engine::utils::quantile_normal;
///
/// // 95% two-sided level -> z ≈ 1.96
/// let z = quantile_normal(0.975).unwrap();
/// assert!((z - 1.96).abs() < 0.01);
/// ```
pub fn quantile_normal(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "quantile probability must be in (0, 1), got {p}"
        )));
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| ForecastError::ComputationError(format!("normal distribution: {e}")))?;
    Ok(normal.inverse_cdf(p))
}

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the variance of a slice (sample variance with n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Sum of squares of the finite entries.
pub fn sum_of_squares(values: &[f64]) -> f64 {
    values.iter().filter(|v| v.is_finite()).map(|v| v * v).sum()
}

/// Root mean square of the finite entries, `NaN` when there are none.
///
/// Residual series use `NaN` for positions without a one-step prediction,
/// so those positions are skipped.
pub fn residual_sigma(residuals: &[f64]) -> f64 {
    let finite: Vec<f64> = residuals.iter().copied().filter(|r| r.is_finite()).collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    (sum_of_squares(&finite) / finite.len() as f64).sqrt()
}

/// Check whether all values are (numerically) identical.
pub fn is_constant(values: &[f64]) -> bool {
    match values.first() {
        Some(&first) => {
            let scale = first.abs().max(1.0);
            values.iter().all(|v| (v - first).abs() <= 1e-12 * scale)
        }
        None => true,
    }
}

/// Ordinary least-squares line `y = intercept + slope * x` with `x = 0..n`.
///
/// Returns `(intercept, slope)`.
pub fn linear_fit(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    if n == 1 {
        return (values[0], 0.0);
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    (y_mean - slope * x_mean, slope)
}

/// Gaussian log-likelihood with the variance concentrated out.
pub fn gaussian_log_likelihood(sse: f64, n: usize) -> f64 {
    let n = n as f64;
    let sigma2 = (sse / n).max(VARIANCE_FLOOR);
    -0.5 * n * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0)
}

/// Small-sample corrected Akaike information criterion.
///
/// `AICc = -2 logL + 2k + 2k(k+1)/(n-k-1)`. Returns `None` when the
/// correction is undefined (`n - k - 1 <= 0`) or the likelihood is not finite.
pub fn aicc(log_likelihood: f64, k: usize, n: usize) -> Option<f64> {
    if !log_likelihood.is_finite() || n <= k + 1 {
        return None;
    }
    let kf = k as f64;
    let aic = -2.0 * log_likelihood + 2.0 * kf;
    Some(aic + 2.0 * kf * (kf + 1.0) / (n - k - 1) as f64)
}

/// Whether two scores are equal within [`SCORE_TIE_TOLERANCE`].
pub fn scores_tie(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= SCORE_TIE_TOLERANCE * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quantile_normal_known_values() {
        assert_relative_eq!(quantile_normal(0.5).unwrap(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(quantile_normal(0.975).unwrap(), 1.959964, epsilon = 1e-5);
        assert_relative_eq!(quantile_normal(0.95).unwrap(), 1.644854, epsilon = 1e-5);
        assert_relative_eq!(quantile_normal(0.025).unwrap(), -1.959964, epsilon = 1e-5);
    }

    #[test]
    fn quantile_normal_rejects_boundaries() {
        assert!(quantile_normal(0.0).is_err());
        assert!(quantile_normal(1.0).is_err());
        assert!(quantile_normal(f64::NAN).is_err());
    }

    #[test]
    fn mean_and_variance() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
        assert_relative_eq!(variance(&[1.0, 2.0, 3.0, 4.0, 5.0]), 2.5, epsilon = 1e-10);
        assert!(variance(&[1.0]).is_nan());
    }

    #[test]
    fn residual_sigma_skips_missing() {
        let sigma = residual_sigma(&[f64::NAN, 3.0, -4.0]);
        assert_relative_eq!(sigma, (12.5_f64).sqrt(), epsilon = 1e-12);
        assert!(residual_sigma(&[f64::NAN]).is_nan());
    }

    #[test]
    fn linear_fit_recovers_line() {
        let values: Vec<f64> = (0..10).map(|i| 3.0 + 0.5 * i as f64).collect();
        let (intercept, slope) = linear_fit(&values);
        assert_relative_eq!(intercept, 3.0, epsilon = 1e-10);
        assert_relative_eq!(slope, 0.5, epsilon = 1e-10);
    }

    #[test]
    fn constant_detection() {
        assert!(is_constant(&[2.0, 2.0, 2.0]));
        assert!(!is_constant(&[2.0, 2.0, 2.1]));
    }

    #[test]
    fn aicc_penalizes_parameters() {
        let ll = gaussian_log_likelihood(10.0, 50);
        let small = aicc(ll, 2, 50).unwrap();
        let large = aicc(ll, 5, 50).unwrap();
        assert!(large > small);
        assert_relative_eq!(small, -2.0 * ll + 4.0 + 12.0 / 47.0, epsilon = 1e-10);
    }

    #[test]
    fn aicc_undefined_without_degrees_of_freedom() {
        assert!(aicc(-10.0, 4, 5).is_none());
        assert!(aicc(f64::NAN, 1, 50).is_none());
    }

    #[test]
    fn ties_use_relative_tolerance() {
        assert!(scores_tie(100.0, 100.0 + 1e-8));
        assert!(!scores_tie(100.0, 100.001));
    }
}
