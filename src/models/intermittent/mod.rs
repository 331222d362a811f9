//! Intermittent demand forecasting.
//!
//! Series with many zero periods between occasional demands. The size of a
//! demand and how often one occurs are smoothed separately and combined into
//! a per-period rate, so forecasts are flat.
//!
//! - Croston: classic, SBA (bias corrected) and optimized alpha
//! - TSB: Teunter-Syntetos-Babai, smoothing the demand probability every period

mod croston;
mod tsb;

pub use croston::{Croston, CrostonVariant, DEFAULT_ALPHA, OPTIMIZED_ALPHA_BOUNDS};
pub use tsb::TSB;

use crate::error::{ForecastError, Result};

/// Minimum number of periods for any intermittent model.
pub const MIN_LENGTH: usize = 2;

/// Checks shared by every intermittent model: complete, non-negative, long
/// enough and with at least one non-zero demand.
pub(crate) fn validate_demand(values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::MissingValues);
    }
    if values.iter().any(|&v| v < 0.0) {
        return Err(ForecastError::InvalidParameter(
            "intermittent demand must be non-negative".into(),
        ));
    }
    if values.len() < MIN_LENGTH {
        return Err(ForecastError::InsufficientData {
            needed: MIN_LENGTH,
            got: values.len(),
        });
    }
    if values.iter().all(|&v| v == 0.0) {
        return Err(ForecastError::DegenerateSeries(
            "series has no non-zero demand".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_zero_series_is_refused() {
        let err = validate_demand(&[0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, ForecastError::DegenerateSeries(_)));
        assert!(!err.is_validation());
    }

    #[test]
    fn negative_demand_is_invalid() {
        let err = validate_demand(&[1.0, -2.0, 0.0]).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
    }

    #[test]
    fn single_period_is_too_short() {
        assert_eq!(
            validate_demand(&[3.0]).unwrap_err(),
            ForecastError::InsufficientData { needed: 2, got: 1 }
        );
    }
}
