//! MFLES: gradient-boosted Median, Fourier, Linear trend and Exponential
//! Smoothing decomposition.
//!
//! Each boosting round fits, on the current residuals,
//! 1. a linear trend (OLS, or Siegel repeated medians for volatile series),
//! 2. a Fourier seasonal term per period (least squares on sin/cos pairs),
//! 3. a smoothed level (exponential-smoothing ensemble or moving average),
//!
//! and adds each piece scaled by its learning rate when it lowers the
//! in-sample error. The series starts from its median. Forecasts extend the
//! accumulated trend, repeat each seasonal cycle and hold the level.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::intervals::sqrt_horizon_errors;
use crate::models::Forecaster;
use crate::utils::stats::{linear_fit, mean, residual_sigma, variance};
use std::fmt;
use tracing::{debug, trace};

/// Boosting rounds when none are given.
pub const DEFAULT_ITERATIONS: usize = 3;
pub const DEFAULT_LR_TREND: f64 = 0.3;
pub const DEFAULT_LR_SEASON: f64 = 0.5;
pub const DEFAULT_LR_LEVEL: f64 = 0.8;

/// Shortest series MFLES fits.
pub const MIN_LENGTH: usize = 4;

/// Coefficient of variation above which the trend is fitted robustly.
const COV_THRESHOLD: f64 = 0.7;

/// Relative improvement a level update must bring to be kept.
const ROUND_PENALTY: f64 = 1e-4;

/// Smoother applied to the residuals for the level component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelSmoother {
    /// Average of exponentially weighted means over alphas 0.05..0.95.
    #[default]
    Ensemble,
    /// Trailing moving average; the first `window` points pass through.
    MovingAverage(usize),
}

impl LevelSmoother {
    fn apply(&self, values: &[f64]) -> Vec<f64> {
        match *self {
            LevelSmoother::Ensemble => ses_ensemble(values),
            LevelSmoother::MovingAverage(window) => rolling_mean(values, window.max(1)),
        }
    }
}

impl fmt::Display for LevelSmoother {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelSmoother::Ensemble => f.write_str("ES"),
            LevelSmoother::MovingAverage(window) => write!(f, "MA{window}"),
        }
    }
}

/// State kept after fitting, on the transformed scale.
#[derive(Debug, Clone)]
struct Fitted {
    mean: f64,
    scale: f64,
    multiplicative: bool,
    /// Accumulated trend at `n - 2` and `n - 1`.
    trend: [f64; 2],
    /// Share of the first trend fit explained; damps the projected slope.
    penalty: f64,
    /// Last cycle of each seasonal component, ending at `n - 1`.
    cycles: Vec<Vec<f64>>,
    in_sample: Vec<f64>,
    errors: Vec<f64>,
    sigma: f64,
}

/// MFLES forecaster.
///
/// # Example
/// ```
/// use fcst_engine::core::TimeSeries;
/// use fcst_engine::models::mfles::MFLES;
/// use fcst_engine::models::Forecaster;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let timestamps: Vec<_> = (0..48).map(|i| base + Duration::days(i)).collect();
/// let values: Vec<f64> = (0..48)
///     .map(|i| 20.0 + 0.5 * i as f64 + [0.0, 4.0, 1.0, -5.0][i % 4])
///     .collect();
/// let series = TimeSeries::univariate(timestamps, values).unwrap();
///
/// let mut model = MFLES::new(vec![4]).with_iterations(10);
/// model.fit(&series).unwrap();
/// assert_eq!(model.predict(8).unwrap().horizon(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct MFLES {
    periods: Vec<usize>,
    iterations: usize,
    lr_trend: f64,
    lr_season: f64,
    lr_level: f64,
    smoother: LevelSmoother,
    robust: Option<bool>,
    multiplicative: Option<bool>,
    fitted: Option<Fitted>,
}

impl MFLES {
    /// Periods below 2 are ignored, so an empty list gives a non-seasonal model.
    pub fn new(periods: Vec<usize>) -> Self {
        Self {
            periods: periods.into_iter().filter(|&m| m > 1).collect(),
            iterations: DEFAULT_ITERATIONS,
            lr_trend: DEFAULT_LR_TREND,
            lr_season: DEFAULT_LR_SEASON,
            lr_level: DEFAULT_LR_LEVEL,
            smoother: LevelSmoother::default(),
            robust: None,
            multiplicative: None,
            fitted: None,
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    /// Learning rates for trend, season and level, each clamped to [0, 1].
    pub fn with_learning_rates(mut self, trend: f64, season: f64, level: f64) -> Self {
        self.lr_trend = trend.clamp(0.0, 1.0);
        self.lr_season = season.clamp(0.0, 1.0);
        self.lr_level = level.clamp(0.0, 1.0);
        self
    }

    pub fn with_smoother(mut self, smoother: LevelSmoother) -> Self {
        self.smoother = smoother;
        self
    }

    /// Force (or forbid) Siegel repeated-median trends.
    pub fn robust(mut self, robust: bool) -> Self {
        self.robust = Some(robust);
        self
    }

    /// Force (or forbid) fitting on the log scale.
    pub fn multiplicative(mut self, multiplicative: bool) -> Self {
        self.multiplicative = Some(multiplicative);
        self
    }

    pub fn periods(&self) -> &[usize] {
        &self.periods
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn smoother(&self) -> LevelSmoother {
        self.smoother
    }

    /// Whether the last fit ran on the log scale.
    pub fn is_multiplicative(&self) -> Option<bool> {
        self.fitted.as_ref().map(|f| f.multiplicative)
    }

    /// Median, trend pair, Fourier terms per period, level and variance.
    pub fn num_params(&self) -> usize {
        let seasonal: usize = self.periods.iter().map(|&m| 2 * fourier_order(m)).sum();
        1 + 2 + seasonal + 1 + 1
    }

    /// In-sample errors of the boosted fit, on the original scale.
    pub fn in_sample_errors(&self) -> &[f64] {
        self.fitted.as_ref().map_or(&[], |f| &f.errors)
    }

    /// Boosted in-sample fit on the original scale.
    pub fn in_sample_fit(&self) -> &[f64] {
        self.fitted.as_ref().map_or(&[], |f| &f.in_sample)
    }

    fn state(&self) -> Result<&Fitted> {
        self.fitted.as_ref().ok_or(ForecastError::FitRequired)
    }

    fn use_multiplicative(&self, y: &[f64]) -> bool {
        self.multiplicative.unwrap_or_else(|| {
            !self.periods.is_empty()
                && y.iter().all(|&v| v > 0.0)
                && coefficient_of_variation(y) > COV_THRESHOLD
        })
    }
}

impl Default for MFLES {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Forecaster for MFLES {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let y = series.values();
        if y.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        if y.len() < MIN_LENGTH {
            return Err(ForecastError::InsufficientData {
                needed: MIN_LENGTH,
                got: y.len(),
            });
        }
        let n = y.len();

        let multiplicative = self.use_multiplicative(y);
        if multiplicative && y.iter().any(|&v| v <= 0.0) {
            return Err(ForecastError::InvalidParameter(
                "multiplicative MFLES requires strictly positive data".into(),
            ));
        }
        let base: Vec<f64> = if multiplicative {
            y.iter().map(|v| v.ln()).collect()
        } else {
            y.to_vec()
        };
        let center = mean(&base);
        let spread = (variance(&base) * (n - 1) as f64 / n as f64).sqrt();
        let scale = if spread.is_finite() && spread > 1e-10 {
            spread
        } else {
            1.0
        };
        let z: Vec<f64> = base.iter().map(|v| (v - center) / scale).collect();
        let robust = self
            .robust
            .unwrap_or_else(|| coefficient_of_variation(y) > COV_THRESHOLD);

        let median = median(&z);
        let mut fit = vec![median; n];
        let mut trend = [median, median];
        let mut seasonal: Vec<Vec<f64>> = vec![vec![0.0; n]; self.periods.len()];
        let designs: Vec<Option<Vec<Vec<f64>>>> = self
            .periods
            .iter()
            .map(|&m| (n >= 2 * m).then(|| fourier_terms(n, m, fourier_order(m))))
            .collect();
        let mut penalty: Option<f64> = None;
        let mut mse = mean_square(&remaining(&z, &fit));

        for round in 0..self.iterations {
            if self.lr_trend > 0.0 {
                let resid = remaining(&z, &fit);
                let line = if robust {
                    siegel_repeated_medians(&resid)
                } else {
                    ols_line(&resid)
                };
                let first = *penalty.get_or_insert_with(|| r_squared(&resid, &line));
                let step: Vec<f64> = line.iter().map(|t| t * self.lr_trend).collect();
                let candidate = mean_square(&sub(&resid, &step));
                if candidate < mse {
                    mse = candidate;
                    add_into(&mut fit, &step);
                    trend[0] += step[n - 2];
                    trend[1] += step[n - 1];
                }
                trace!(round, robust, r2 = first, mse, "trend step");
            }

            if self.lr_season > 0.0 {
                for (k, design) in designs.iter().enumerate() {
                    let Some(design) = design else { continue };
                    let resid = remaining(&z, &fit);
                    let Some(season) = least_squares_fit(design, &resid) else {
                        continue;
                    };
                    let step: Vec<f64> = season.iter().map(|s| s * self.lr_season).collect();
                    let candidate = mean_square(&sub(&resid, &step));
                    if candidate < mse {
                        mse = candidate;
                        add_into(&mut fit, &step);
                        add_into(&mut seasonal[k], &step);
                    }
                }
            }

            if self.lr_level > 0.0 {
                let resid = remaining(&z, &fit);
                let step: Vec<f64> = self
                    .smoother
                    .apply(&resid)
                    .iter()
                    .map(|s| s * self.lr_level)
                    .collect();
                let candidate = mean_square(&sub(&resid, &step));
                if candidate + ROUND_PENALTY * mse < mse {
                    mse = candidate;
                    add_into(&mut fit, &step);
                    trend[0] += step[n - 1];
                    trend[1] += step[n - 1];
                }
            }
        }

        let cycles = self
            .periods
            .iter()
            .zip(&seasonal)
            .map(|(&m, component)| component[n.saturating_sub(m)..].to_vec())
            .collect();
        let in_sample: Vec<f64> = fit
            .iter()
            .map(|&v| restore(v, center, scale, multiplicative))
            .collect();
        let errors: Vec<f64> = y.iter().zip(&in_sample).map(|(a, f)| a - f).collect();
        let sigma = residual_sigma(&errors);
        debug!(
            periods = ?self.periods,
            iterations = self.iterations,
            multiplicative,
            robust,
            sigma,
            "fitted MFLES"
        );

        self.fitted = Some(Fitted {
            mean: center,
            scale,
            multiplicative,
            trend,
            penalty: penalty.unwrap_or(0.0).clamp(0.0, 1.0),
            cycles,
            in_sample,
            errors,
            sigma,
        });
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.state()?;
        let slope = (state.trend[1] - state.trend[0]) * state.penalty;
        let values = (1..=horizon)
            .map(|h| {
                let season: f64 = state
                    .cycles
                    .iter()
                    .filter(|cycle| !cycle.is_empty())
                    .map(|cycle| cycle[(h - 1) % cycle.len()])
                    .sum();
                let z = state.trend[1] + slope * h as f64 + season;
                restore(z, state.mean, state.scale, state.multiplicative)
            })
            .collect();
        Ok(Forecast::from_values(values))
    }

    /// In-sample error spread scaled by the square root of the step.
    fn standard_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        Ok(sqrt_horizon_errors(self.state()?.sigma, horizon))
    }

    /// The boosted fit is not a one-step recursion: empty once fitted.
    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|_| &[][..])
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|_| &[][..])
    }

    fn name(&self) -> &str {
        "MFLES"
    }
}

fn restore(z: f64, center: f64, scale: f64, multiplicative: bool) -> f64 {
    let v = z * scale + center;
    if multiplicative {
        v.exp()
    } else {
        v
    }
}

fn remaining(y: &[f64], fit: &[f64]) -> Vec<f64> {
    sub(y, fit)
}

fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

fn add_into(target: &mut [f64], step: &[f64]) {
    for (t, s) in target.iter_mut().zip(step) {
        *t += s;
    }
}

fn mean_square(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>() / values.len().max(1) as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation over absolute mean.
fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if !m.is_finite() || m.abs() < 1e-10 {
        return 0.0;
    }
    let n = values.len() as f64;
    let spread = (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n).sqrt();
    spread / m.abs()
}

/// Fourier order by period length, capped at half the period.
fn fourier_order(period: usize) -> usize {
    let order = if period < 10 {
        5
    } else if period < 70 {
        10
    } else {
        15
    };
    order.min(period / 2).max(1)
}

/// Columns `cos(2πkt/m)`, `sin(2πkt/m)` for `k = 1..=order`, `t = 1..=n`.
fn fourier_terms(n: usize, period: usize, order: usize) -> Vec<Vec<f64>> {
    let mut columns = Vec::with_capacity(2 * order);
    for k in 1..=order {
        let freq = 2.0 * std::f64::consts::PI * k as f64 / period as f64;
        columns.push((1..=n).map(|t| (freq * t as f64).cos()).collect());
        columns.push((1..=n).map(|t| (freq * t as f64).sin()).collect());
    }
    columns
}

/// Least-squares fitted values of `y` on the columns of `x`, through the
/// ridge-stabilised normal equations.
fn least_squares_fit(x: &[Vec<f64>], y: &[f64]) -> Option<Vec<f64>> {
    let k = x.len();
    let mut xtx = vec![vec![0.0; k]; k];
    for i in 0..k {
        for j in 0..=i {
            let dot: f64 = x[i].iter().zip(&x[j]).map(|(a, b)| a * b).sum();
            xtx[i][j] = dot;
            xtx[j][i] = dot;
        }
        xtx[i][i] += 1e-8;
    }
    let xty: Vec<f64> = x
        .iter()
        .map(|col| col.iter().zip(y).map(|(a, b)| a * b).sum())
        .collect();
    let coeffs = solve_symmetric(&xtx, &xty)?;

    let mut fitted = vec![0.0; y.len()];
    for (coef, col) in coeffs.iter().zip(x) {
        for (f, v) in fitted.iter_mut().zip(col) {
            *f += coef * v;
        }
    }
    Some(fitted)
}

/// Cholesky solve of a symmetric positive-definite system.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let sum = a[i][j] - (0..j).map(|k| l[i][k] * l[j][k]).sum::<f64>();
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    let mut forward = vec![0.0; n];
    for i in 0..n {
        let sum = b[i] - (0..i).map(|j| l[i][j] * forward[j]).sum::<f64>();
        forward[i] = sum / l[i][i];
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum = forward[i] - (i + 1..n).map(|j| l[j][i] * x[j]).sum::<f64>();
        x[i] = sum / l[i][i];
    }
    Some(x)
}

fn ols_line(y: &[f64]) -> Vec<f64> {
    let (intercept, slope) = linear_fit(y);
    (0..y.len()).map(|i| intercept + slope * i as f64).collect()
}

/// Siegel repeated-medians line; long series are subsampled to about 100 points.
fn siegel_repeated_medians(y: &[f64]) -> Vec<f64> {
    let n = y.len();
    let step = (n / 100).max(1);
    let slopes: Vec<f64> = (0..n)
        .step_by(step)
        .filter_map(|i| {
            let pairwise: Vec<f64> = (0..n)
                .step_by(step)
                .filter(|&j| j != i)
                .map(|j| (y[j] - y[i]) / (j as f64 - i as f64))
                .filter(|s| s.is_finite())
                .collect();
            (!pairwise.is_empty()).then(|| median(&pairwise))
        })
        .collect();
    let slope = if slopes.is_empty() { 0.0 } else { median(&slopes) };
    let intercepts: Vec<f64> = y
        .iter()
        .enumerate()
        .step_by(step)
        .map(|(i, v)| v - slope * i as f64)
        .collect();
    let intercept = median(&intercepts);
    (0..n).map(|i| intercept + slope * i as f64).collect()
}

/// Share of the variance of `y` explained by `line`, zero for flat `y`.
fn r_squared(y: &[f64], line: &[f64]) -> f64 {
    let m = mean(y);
    let total: f64 = y.iter().map(|v| (v - m).powi(2)).sum();
    if total < 1e-10 {
        return 0.0;
    }
    let unexplained: f64 = y.iter().zip(line).map(|(v, l)| (v - l).powi(2)).sum();
    1.0 - unexplained / total
}

fn ses_ensemble(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut ensemble = vec![0.0; n];
    if n == 0 {
        return ensemble;
    }
    let alphas: Vec<f64> = (1..20).map(|k| 0.05 * k as f64).collect();
    for &alpha in &alphas {
        let mut level = values[0];
        for (i, &v) in values.iter().enumerate() {
            if i > 0 {
                level = alpha * v + (1.0 - alpha) * level;
            }
            ensemble[i] += level;
        }
    }
    let count = alphas.len() as f64;
    ensemble.iter_mut().for_each(|v| *v /= count);
    ensemble
}

fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = values.to_vec();
    for i in window..values.len() {
        out[i] = values[i + 1 - window..=i].iter().sum::<f64>() / window as f64;
    }
    out
}
