//! Standard Theta method.
//!
//! SES on the (optionally deseasonalized) series plus a drift of
//! `(1 - 1/theta)` times the slope of the linear trend, following the
//! state-space formulation of Fiorucci et al. (2016):
//! `forecast(h) = level + (1 - 1/theta) * b * (1/alpha + h - 1)`.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{aicc, gaussian_log_likelihood, linear_fit, residual_sigma};

/// Default theta (the standard Theta method).
pub const DEFAULT_THETA: f64 = 2.0;

const ALPHA_BOUNDS: (f64, f64) = (1e-4, 0.9999);

/// Seasonal factors smaller than this force an additive decomposition.
const MIN_MULTIPLICATIVE_FACTOR: f64 = 0.01;

/// Type of seasonal decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecompositionType {
    /// `y = trend + seasonal + remainder`
    Additive,
    /// `y = trend * seasonal * remainder`
    #[default]
    Multiplicative,
}

/// Classical seasonal indices, one per position in the cycle.
#[derive(Debug, Clone)]
pub(super) struct SeasonalIndices {
    period: usize,
    kind: DecompositionType,
    indices: Vec<f64>,
}

impl SeasonalIndices {
    /// Centred moving average detrending, then per-position means normalized
    /// to sum to zero (additive) or average one (multiplicative).
    fn estimate(series: &[f64], period: usize, kind: DecompositionType) -> Self {
        let n = series.len();
        let half = period / 2;
        let mut trend = vec![f64::NAN; n];
        for i in half..n.saturating_sub(half) {
            trend[i] = if period % 2 == 0 {
                let inner: f64 = series[i + 1 - half..i + half].iter().sum();
                (0.5 * series[i - half] + inner + 0.5 * series[i + half]) / period as f64
            } else {
                series[i - half..=i + half].iter().sum::<f64>() / period as f64
            };
        }

        let mut sums = vec![0.0; period];
        let mut counts = vec![0usize; period];
        for (i, (&y, &t)) in series.iter().zip(&trend).enumerate() {
            let ratio = match kind {
                DecompositionType::Additive => y - t,
                DecompositionType::Multiplicative if t.abs() > 1e-10 => y / t,
                DecompositionType::Multiplicative => f64::NAN,
            };
            if ratio.is_finite() {
                sums[i % period] += ratio;
                counts[i % period] += 1;
            }
        }
        let mut indices: Vec<f64> = sums
            .iter()
            .zip(&counts)
            .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
            .collect();
        let mean = indices.iter().sum::<f64>() / period as f64;
        match kind {
            DecompositionType::Additive => indices.iter_mut().for_each(|s| *s -= mean),
            DecompositionType::Multiplicative if mean.abs() > 1e-10 => {
                indices.iter_mut().for_each(|s| *s /= mean)
            }
            DecompositionType::Multiplicative => {}
        }
        Self {
            period,
            kind,
            indices,
        }
    }

    /// Multiplicative indices when the data allow it, additive otherwise.
    pub(super) fn choose(series: &[f64], period: usize, requested: DecompositionType) -> Self {
        if requested == DecompositionType::Multiplicative && series.iter().all(|&y| y > 0.0) {
            let multiplicative = Self::estimate(series, period, DecompositionType::Multiplicative);
            if multiplicative
                .indices
                .iter()
                .all(|&s| s >= MIN_MULTIPLICATIVE_FACTOR)
            {
                return multiplicative;
            }
        }
        Self::estimate(series, period, DecompositionType::Additive)
    }

    fn factor(&self, t: usize) -> f64 {
        self.indices[t % self.period]
    }

    fn remove(&self, series: &[f64]) -> Vec<f64> {
        series
            .iter()
            .enumerate()
            .map(|(t, &y)| match self.kind {
                DecompositionType::Additive => y - self.factor(t),
                DecompositionType::Multiplicative => y / self.factor(t),
            })
            .collect()
    }

    fn apply(&self, value: f64, t: usize) -> f64 {
        match self.kind {
            DecompositionType::Additive => value + self.factor(t),
            DecompositionType::Multiplicative => value * self.factor(t),
        }
    }

    /// Scale for standard errors on the original scale.
    fn scale(&self, t: usize) -> f64 {
        match self.kind {
            DecompositionType::Additive => 1.0,
            DecompositionType::Multiplicative => self.factor(t),
        }
    }
}

/// SES recursion with the theta drift; returns one-step predictions
/// (first position `NaN`), the final level and the SSE.
pub(super) fn theta_recursion(series: &[f64], alpha: f64, drift: f64) -> (Vec<f64>, f64, f64) {
    let mut level = series[0];
    let mut predictions = Vec::with_capacity(series.len());
    predictions.push(f64::NAN);
    let mut sse = 0.0;
    for &y in &series[1..] {
        let prediction = level + drift / alpha;
        let error = y - prediction;
        sse += error * error;
        predictions.push(prediction);
        level = alpha * y + (1.0 - alpha) * level;
    }
    (predictions, level, sse)
}

/// Fitted Theta state.
#[derive(Debug, Clone)]
struct ThetaFit {
    alpha: f64,
    slope: f64,
    level: f64,
    season: Option<SeasonalIndices>,
    sigma: f64,
    sse: f64,
    n: usize,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
}

/// Standard Theta forecaster.
///
/// # Example
/// ```
/// use fcst_engine::core::TimeSeries;
/// use fcst_engine::models::theta::Theta;
/// use fcst_engine::models::Forecaster;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let timestamps: Vec<_> = (0..40).map(|i| base + Duration::days(i)).collect();
/// let values: Vec<f64> = (0..40).map(|i| 10.0 + 0.5 * i as f64).collect();
/// let series = TimeSeries::univariate(timestamps, values).unwrap();
///
/// let mut model = Theta::new();
/// model.fit(&series).unwrap();
/// assert!(model.predict(5).unwrap().point()[0] > 29.0);
/// ```
#[derive(Debug, Clone)]
pub struct Theta {
    theta: f64,
    alpha: Option<f64>,
    period: usize,
    decomposition: DecompositionType,
    fit: Option<ThetaFit>,
}

impl Theta {
    /// Non-seasonal standard Theta (theta = 2, alpha estimated).
    pub fn new() -> Self {
        Self {
            theta: DEFAULT_THETA,
            alpha: None,
            period: 0,
            decomposition: DecompositionType::default(),
            fit: None,
        }
    }

    /// Seasonal Theta; periods <= 1 disable the decomposition.
    pub fn seasonal(period: usize) -> Self {
        Self::new().with_period(period)
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_period(mut self, period: usize) -> Self {
        self.period = period;
        self
    }

    /// Hold alpha fixed instead of estimating it.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha.clamp(ALPHA_BOUNDS.0, ALPHA_BOUNDS.1));
        self
    }

    /// Requested decomposition; multiplicative falls back to additive for
    /// non-positive data.
    pub fn with_decomposition(mut self, decomposition: DecompositionType) -> Self {
        self.decomposition = decomposition;
        self
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn alpha(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.alpha).or(self.alpha)
    }

    /// Slope of the linear trend of the deseasonalized series.
    pub fn slope(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.slope)
    }

    /// Decomposition actually used, once fitted on a seasonal series.
    pub fn decomposition_type(&self) -> Option<DecompositionType> {
        self.fit
            .as_ref()
            .and_then(|f| f.season.as_ref())
            .map(|s| s.kind)
    }

    fn is_seasonal(&self) -> bool {
        self.period > 1
    }

    /// 3 points, or two full cycles when seasonal.
    pub fn min_length(&self) -> usize {
        if self.is_seasonal() {
            (2 * self.period).max(3)
        } else {
            3
        }
    }

    /// Free alpha, the variance and the free seasonal indices.
    pub fn num_params(&self) -> usize {
        let alpha = usize::from(self.alpha.is_none());
        let seasonal = if self.is_seasonal() { self.period - 1 } else { 0 };
        alpha + 1 + seasonal
    }

    /// AICc of the one-step errors; `None` before fitting or when undefined.
    pub fn aicc(&self) -> Option<f64> {
        let fit = self.fit.as_ref()?;
        let n = fit.n.saturating_sub(1);
        aicc(gaussian_log_likelihood(fit.sse, n), self.num_params(), n)
    }

    fn drift(&self, slope: f64) -> f64 {
        (1.0 - 1.0 / self.theta) * slope
    }

    fn estimate_alpha(&self, adjusted: &[f64], drift: f64) -> f64 {
        let result = nelder_mead(
            |p| theta_recursion(adjusted, p[0], drift).2,
            &[0.5],
            Some(&[ALPHA_BOUNDS]),
            NelderMeadConfig::default()
                .with_max_iter(500)
                .with_initial_step(0.2),
        );
        result.optimal_point[0].clamp(ALPHA_BOUNDS.0, ALPHA_BOUNDS.1)
    }

    fn fitted_state(&self) -> Result<&ThetaFit> {
        self.fit.as_ref().ok_or(ForecastError::FitRequired)
    }
}

impl Default for Theta {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for Theta {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let y = series.values();
        if y.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        if !(self.theta.is_finite() && self.theta >= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "theta must be at least 1, got {}",
                self.theta
            )));
        }
        let needed = self.min_length();
        if y.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: y.len(),
            });
        }

        let season = self
            .is_seasonal()
            .then(|| SeasonalIndices::choose(y, self.period, self.decomposition));
        let adjusted = match &season {
            Some(s) => s.remove(y),
            None => y.to_vec(),
        };

        let (_, slope) = linear_fit(&adjusted);
        let drift = self.drift(slope);
        let alpha = match self.alpha {
            Some(alpha) => alpha,
            None => self.estimate_alpha(&adjusted, drift),
        };
        let (predictions, level, sse) = theta_recursion(&adjusted, alpha, drift);
        if !sse.is_finite() || !level.is_finite() {
            return Err(ForecastError::ComputationError(
                "theta recursion diverged".into(),
            ));
        }

        let fitted: Vec<f64> = match &season {
            Some(s) => predictions
                .iter()
                .enumerate()
                .map(|(t, &p)| s.apply(p, t))
                .collect(),
            None => predictions,
        };
        let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(a, f)| a - f).collect();
        let sigma = residual_sigma(&residuals);

        self.fit = Some(ThetaFit {
            alpha,
            slope,
            level,
            season,
            sigma,
            sse,
            n: y.len(),
            fitted,
            residuals,
        });
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let fit = self.fitted_state()?;
        let drift = self.drift(fit.slope);
        let values = (1..=horizon)
            .map(|h| {
                let value = fit.level + drift * (1.0 / fit.alpha + (h - 1) as f64);
                match &fit.season {
                    Some(s) => s.apply(value, fit.n + h - 1),
                    None => value,
                }
            })
            .collect();
        Ok(Forecast::from_values(values))
    }

    /// SES variance `sigma^2 (1 + (h-1) alpha^2)`, scaled by the seasonal
    /// factor for multiplicative decompositions.
    fn standard_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        let fit = self.fitted_state()?;
        Ok((1..=horizon)
            .map(|h| {
                let se = fit.sigma * (1.0 + (h - 1) as f64 * fit.alpha * fit.alpha).sqrt();
                match &fit.season {
                    Some(s) => se * s.scale(fit.n + h - 1).abs(),
                    None => se,
                }
            })
            .collect())
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|f| f.fitted.as_slice())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|f| f.residuals.as_slice())
    }

    fn name(&self) -> &str {
        "Theta"
    }
}
