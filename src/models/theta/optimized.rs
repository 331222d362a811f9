//! Optimized Theta: the theta coefficient is chosen by AICc.
//!
//! A coarse grid over `[1, 3]` picks a starting point which a bounded
//! Nelder-Mead pass then refines. Alpha is re-estimated for every theta.

use super::model::{DecompositionType, Theta};
use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::scores_tie;
use tracing::debug;

/// Search interval for theta.
pub const THETA_BOUNDS: (f64, f64) = (1.0, 3.0);

const GRID_STEPS: usize = 8;

/// Theta with the coefficient selected from the data.
///
/// # Example
/// ```
/// use fcst_engine::core::TimeSeries;
/// use fcst_engine::models::theta::OptimizedTheta;
/// use fcst_engine::models::Forecaster;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let timestamps: Vec<_> = (0..50).map(|i| base + Duration::days(i)).collect();
/// let values: Vec<f64> = (0..50).map(|i| 10.0 + 0.5 * i as f64 + (i as f64 * 0.3).sin()).collect();
/// let series = TimeSeries::univariate(timestamps, values).unwrap();
///
/// let mut model = OptimizedTheta::new();
/// model.fit(&series).unwrap();
/// let theta = model.selected_theta().unwrap();
/// assert!((1.0..=3.0).contains(&theta));
/// ```
#[derive(Debug, Clone, Default)]
pub struct OptimizedTheta {
    period: usize,
    decomposition: DecompositionType,
    selected: Option<Theta>,
}

impl OptimizedTheta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seasonal(period: usize) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    pub fn with_decomposition(mut self, decomposition: DecompositionType) -> Self {
        self.decomposition = decomposition;
        self
    }

    pub fn selected_theta(&self) -> Option<f64> {
        self.selected.as_ref().map(Theta::theta)
    }

    pub fn selected_model(&self) -> Option<&Theta> {
        self.selected.as_ref()
    }

    fn candidate(&self, theta: f64) -> Theta {
        Theta::seasonal(self.period)
            .with_theta(theta)
            .with_decomposition(self.decomposition)
    }

    /// Fit at `theta` and score it.
    fn evaluate(&self, series: &TimeSeries, theta: f64) -> Option<(Theta, f64)> {
        let mut model = self.candidate(theta);
        match model.fit(series) {
            Ok(()) => {
                let score = model.aicc().filter(|s| s.is_finite())?;
                Some((model, score))
            }
            Err(err) => {
                debug!(theta, %err, "theta candidate failed");
                None
            }
        }
    }

    fn selected(&self) -> Result<&Theta> {
        self.selected.as_ref().ok_or(ForecastError::FitRequired)
    }
}

impl Forecaster for OptimizedTheta {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let y = series.values();
        if y.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        let needed = self.candidate(THETA_BOUNDS.0).min_length();
        if y.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: y.len(),
            });
        }

        let (lo, hi) = THETA_BOUNDS;
        let step = (hi - lo) / GRID_STEPS as f64;
        let mut best: Option<(Theta, f64)> = None;
        for i in 0..=GRID_STEPS {
            let theta = lo + step * i as f64;
            let Some((model, score)) = self.evaluate(series, theta) else {
                continue;
            };
            debug!(theta, aicc = score, "theta grid point");
            let better = best
                .as_ref()
                .map_or(true, |(_, b)| !scores_tie(score, *b) && score < *b);
            if better {
                best = Some((model, score));
            }
        }
        let (grid_model, grid_score) = best.ok_or_else(|| {
            ForecastError::SearchExhausted("no theta in [1, 3] could be fitted".into())
        })?;

        let refined = nelder_mead(
            |p| {
                self.evaluate(series, p[0])
                    .map_or(f64::INFINITY, |(_, score)| score)
            },
            &[grid_model.theta()],
            Some(&[THETA_BOUNDS]),
            NelderMeadConfig::default()
                .with_max_iter(100)
                .with_tolerance(1e-6)
                .with_initial_step(step / grid_model.theta()),
        );
        let refined_theta = refined.optimal_point[0].clamp(lo, hi);

        let mut chosen = (grid_model, grid_score);
        if let Some((model, score)) = self.evaluate(series, refined_theta) {
            if !scores_tie(score, chosen.1) && score < chosen.1 {
                chosen = (model, score);
            }
        }
        debug!(theta = chosen.0.theta(), aicc = chosen.1, "selected theta");
        self.selected = Some(chosen.0);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selected()?.predict(horizon)
    }

    fn standard_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        self.selected()?.standard_errors(horizon)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected.as_ref().and_then(|m| m.fitted_values())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected.as_ref().and_then(|m| m.residuals())
    }

    fn name(&self) -> &str {
        "OptimizedTheta"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_series(values: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| base + Duration::days(i as i64))
            .collect();
        TimeSeries::univariate(timestamps, values).unwrap()
    }

    fn noisy_trend(n: usize) -> Vec<f64> {
        let mut state: u64 = 11;
        (0..n)
            .map(|i| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                let noise = (state >> 33) as f64 / (1u64 << 31) as f64 - 0.5;
                50.0 + 0.8 * i as f64 + 2.0 * noise
            })
            .collect()
    }

    #[test]
    fn theta_stays_in_bounds() {
        let mut model = OptimizedTheta::new();
        model.fit(&make_series(noisy_trend(60))).unwrap();
        let theta = model.selected_theta().unwrap();
        assert!((THETA_BOUNDS.0..=THETA_BOUNDS.1).contains(&theta));
        assert_eq!(model.predict(8).unwrap().horizon(), 8);
    }

    #[test]
    fn selection_is_no_worse_than_standard_theta() {
        let series = make_series(noisy_trend(60));
        let mut optimized = OptimizedTheta::new();
        optimized.fit(&series).unwrap();
        let mut standard = Theta::new();
        standard.fit(&series).unwrap();
        let chosen = optimized.selected_model().unwrap().aicc().unwrap();
        assert!(chosen <= standard.aicc().unwrap() + 1e-6);
    }

    #[test]
    fn flat_series_prefers_smallest_theta() {
        let mut model = OptimizedTheta::new();
        model.fit(&make_series(vec![7.0; 30])).unwrap();
        assert_eq!(model.selected_theta(), Some(THETA_BOUNDS.0));
    }

    #[test]
    fn deterministic_selection() {
        let series = make_series(noisy_trend(45));
        let mut a = OptimizedTheta::new();
        let mut b = OptimizedTheta::new();
        a.fit(&series).unwrap();
        b.fit(&series).unwrap();
        assert_eq!(a.selected_theta(), b.selected_theta());
        assert_eq!(a.predict(4).unwrap(), b.predict(4).unwrap());
    }

    #[test]
    fn requires_fit() {
        assert_eq!(
            OptimizedTheta::new().predict(2).unwrap_err(),
            ForecastError::FitRequired
        );
    }
}
