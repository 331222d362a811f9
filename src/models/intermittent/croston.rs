//! Croston's method for intermittent demand.
//!
//! Demand sizes and inter-demand intervals are each smoothed by SES with the
//! same alpha; the forecast rate is size / interval. The first interval is
//! counted from the start of the series.

use super::validate_demand;
use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::intervals::UncertaintyShape;
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::residual_sigma;

/// Default smoothing constant.
pub const DEFAULT_ALPHA: f64 = 0.1;

/// Range searched by the optimized variant.
pub const OPTIMIZED_ALPHA_BOUNDS: (f64, f64) = (0.05, 0.5);

/// Croston variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrostonVariant {
    #[default]
    Classic,
    /// Syntetos-Boylan approximation: rate scaled by `1 - alpha/2`.
    SBA,
    /// Classic form with alpha minimizing in-sample MSE.
    Optimized,
}

/// Smoothed size and interval after a pass over the series.
#[derive(Debug, Clone, Copy)]
struct Levels {
    size: f64,
    interval: f64,
}

/// One pass of the size/interval recursion; returns the final levels and the
/// rate predicted before each period (`NaN` until the first demand).
fn smooth(values: &[f64], alpha: f64, correction: f64) -> (Option<Levels>, Vec<f64>) {
    let mut levels: Option<Levels> = None;
    let mut since = 0usize;
    let mut predictions = Vec::with_capacity(values.len());
    for &y in values {
        predictions.push(levels.map_or(f64::NAN, |l| correction * l.size / l.interval));
        since += 1;
        if y > 0.0 {
            let interval = since as f64;
            levels = Some(match levels {
                None => Levels { size: y, interval },
                Some(l) => Levels {
                    size: alpha * y + (1.0 - alpha) * l.size,
                    interval: alpha * interval + (1.0 - alpha) * l.interval,
                },
            });
            since = 0;
        }
    }
    (levels, predictions)
}

fn in_sample_mse(values: &[f64], predictions: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .zip(predictions)
        .filter(|(_, p)| p.is_finite())
        .fold((0.0, 0usize), |(s, c), (y, p)| (s + (y - p).powi(2), c + 1));
    if count == 0 {
        f64::INFINITY
    } else {
        sum / count as f64
    }
}

#[derive(Debug, Clone)]
struct CrostonFit {
    alpha: f64,
    levels: Levels,
    sigma: f64,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
}

/// Croston forecaster.
#[derive(Debug, Clone)]
pub struct Croston {
    variant: CrostonVariant,
    alpha: f64,
    fit: Option<CrostonFit>,
}

impl Croston {
    pub fn new(variant: CrostonVariant) -> Self {
        Self {
            variant,
            alpha: DEFAULT_ALPHA,
            fit: None,
        }
    }

    pub fn classic() -> Self {
        Self::new(CrostonVariant::Classic)
    }

    pub fn sba() -> Self {
        Self::new(CrostonVariant::SBA)
    }

    pub fn optimized() -> Self {
        Self::new(CrostonVariant::Optimized)
    }

    /// Smoothing constant for the classic and SBA variants.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn variant(&self) -> CrostonVariant {
        self.variant
    }

    /// Alpha in use: the estimate once an optimized model is fitted.
    pub fn alpha(&self) -> f64 {
        self.fit.as_ref().map_or(self.alpha, |f| f.alpha)
    }

    /// Smoothed demand size.
    pub fn demand_level(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.levels.size)
    }

    /// Smoothed interval between demands.
    pub fn interval_level(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.levels.interval)
    }

    fn correction(&self, alpha: f64) -> f64 {
        match self.variant {
            CrostonVariant::SBA => 1.0 - alpha / 2.0,
            CrostonVariant::Classic | CrostonVariant::Optimized => 1.0,
        }
    }

    fn estimate_alpha(values: &[f64]) -> f64 {
        let (lo, hi) = OPTIMIZED_ALPHA_BOUNDS;
        let result = nelder_mead(
            |p| in_sample_mse(values, &smooth(values, p[0], 1.0).1),
            &[DEFAULT_ALPHA],
            Some(&[OPTIMIZED_ALPHA_BOUNDS]),
            NelderMeadConfig::default()
                .with_max_iter(200)
                .with_tolerance(1e-6)
                .with_initial_step(1.0),
        );
        result.optimal_point[0].clamp(lo, hi)
    }

    fn fitted_state(&self) -> Result<&CrostonFit> {
        self.fit.as_ref().ok_or(ForecastError::FitRequired)
    }
}

impl Default for Croston {
    fn default() -> Self {
        Self::classic()
    }
}

impl Forecaster for Croston {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let y = series.values();
        validate_demand(y)?;
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }

        let alpha = match self.variant {
            CrostonVariant::Optimized => Self::estimate_alpha(y),
            CrostonVariant::Classic | CrostonVariant::SBA => self.alpha,
        };
        let (levels, fitted) = smooth(y, alpha, self.correction(alpha));
        let levels = levels.ok_or_else(|| {
            ForecastError::DegenerateSeries("series has no non-zero demand".into())
        })?;
        let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(a, f)| a - f).collect();
        let sigma = residual_sigma(&residuals);

        self.fit = Some(CrostonFit {
            alpha,
            levels,
            sigma,
            fitted,
            residuals,
        });
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let fit = self.fitted_state()?;
        let rate = self.correction(fit.alpha) * fit.levels.size / fit.levels.interval;
        Ok(Forecast::from_values(vec![rate; horizon]))
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
        match self.variant {
            CrostonVariant::Classic => "CrostonClassic",
            CrostonVariant::SBA => "CrostonSBA",
            CrostonVariant::Optimized => "CrostonOptimized",
        }
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

    fn intermittent() -> Vec<f64> {
        vec![
            0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 2.0, 0.0, 6.0, 0.0, 0.0, 0.0, 0.0, 3.0, 0.0, 5.0,
        ]
    }

    #[test]
    fn first_interval_counts_from_series_start() {
        let mut model = Croston::classic().with_alpha(0.5);
        model.fit(&make_series(vec![0.0, 0.0, 6.0, 0.0])).unwrap();
        assert_relative_eq!(model.demand_level().unwrap(), 6.0);
        assert_relative_eq!(model.interval_level().unwrap(), 3.0);
        assert_relative_eq!(model.predict(1).unwrap().point()[0], 2.0);
    }

    #[test]
    fn classic_levels_follow_ses() {
        let mut model = Croston::classic().with_alpha(0.5);
        model.fit(&make_series(vec![2.0, 0.0, 4.0])).unwrap();
        // sizes 2, 4 -> 3; intervals 1, 2 -> 1.5
        assert_relative_eq!(model.demand_level().unwrap(), 3.0);
        assert_relative_eq!(model.interval_level().unwrap(), 1.5);
        assert_relative_eq!(model.predict(2).unwrap().point()[1], 2.0);
    }

    #[test]
    fn sba_is_scaled_down() {
        let series = make_series(intermittent());
        let mut classic = Croston::classic();
        let mut sba = Croston::sba();
        classic.fit(&series).unwrap();
        sba.fit(&series).unwrap();
        let c = classic.predict(1).unwrap().point()[0];
        let s = sba.predict(1).unwrap().point()[0];
        assert_relative_eq!(s, c * (1.0 - DEFAULT_ALPHA / 2.0), epsilon = 1e-12);
    }

    #[test]
    fn optimized_alpha_is_bounded() {
        let mut model = Croston::optimized();
        model.fit(&make_series(intermittent())).unwrap();
        let alpha = model.alpha();
        assert!((OPTIMIZED_ALPHA_BOUNDS.0..=OPTIMIZED_ALPHA_BOUNDS.1).contains(&alpha));
        assert_eq!(model.name(), "CrostonOptimized");
    }

    #[test]
    fn fitted_values_are_missing_before_first_demand() {
        let mut model = Croston::classic();
        model.fit(&make_series(intermittent())).unwrap();
        let fitted = model.fitted_values().unwrap();
        assert!(fitted[..3].iter().all(|v| v.is_nan()));
        assert!(fitted[3..].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn constant_interval_width() {
        let mut model = Croston::sba();
        model.fit(&make_series(intermittent())).unwrap();
        let widths = model.predict_with_intervals(5, 0.9).unwrap().widths().unwrap();
        assert!(widths.iter().all(|w| (w - widths[0]).abs() < 1e-12));
    }

    #[test]
    fn all_zero_series_is_refused() {
        let mut model = Croston::classic();
        let err = model.fit(&make_series(vec![0.0; 10])).unwrap_err();
        assert!(matches!(err, ForecastError::DegenerateSeries(_)));
    }
}
