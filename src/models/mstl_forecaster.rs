//! Decomposition-based forecasting with one or more seasonal periods.
//!
//! The series is decomposed with MSTL; the seasonally adjusted series
//! (trend + remainder) is forecast with a trend method and each seasonal
//! component is projected forward, then the pieces are added back together.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::intervals::sqrt_horizon_errors;
use crate::models::exponential::{AutoETS, ETS};
use crate::models::Forecaster;
use crate::seasonality::{MSTLResult, MSTL};
use crate::utils::stats::{linear_fit, residual_sigma};

/// Method for forecasting the seasonally adjusted series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendMethod {
    Linear,
    SES,
    Holt,
    Naive,
    #[default]
    AutoETS,
}

impl TrendMethod {
    pub const ALL: [TrendMethod; 5] = [
        TrendMethod::Linear,
        TrendMethod::SES,
        TrendMethod::Holt,
        TrendMethod::Naive,
        TrendMethod::AutoETS,
    ];

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "linear" => Some(TrendMethod::Linear),
            "ses" => Some(TrendMethod::SES),
            "holt" => Some(TrendMethod::Holt),
            "naive" | "none" => Some(TrendMethod::Naive),
            "autoets" | "auto_ets" | "ets" => Some(TrendMethod::AutoETS),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendMethod::Linear => "Linear",
            TrendMethod::SES => "SES",
            TrendMethod::Holt => "Holt",
            TrendMethod::Naive => "Naive",
            TrendMethod::AutoETS => "AutoETS",
        }
    }

    /// Parameters the method estimates.
    pub fn num_params(&self) -> usize {
        match self {
            TrendMethod::Linear | TrendMethod::SES => 2,
            TrendMethod::Holt | TrendMethod::AutoETS => 4,
            TrendMethod::Naive => 0,
        }
    }
}

/// Method for projecting seasonal components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonalMethod {
    /// Repeat the last cycle.
    #[default]
    Naive,
    /// Per-position average over every cycle.
    Average,
}

impl SeasonalMethod {
    pub const ALL: [SeasonalMethod; 2] = [SeasonalMethod::Naive, SeasonalMethod::Average];

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "naive" | "cyclic" => Some(SeasonalMethod::Naive),
            "average" | "mean" => Some(SeasonalMethod::Average),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonalMethod::Naive => "Naive",
            SeasonalMethod::Average => "Average",
        }
    }

    /// Value of `component` at index `t` (possibly past the end) under this method.
    fn project(&self, component: &[f64], period: usize, t: usize) -> f64 {
        let n = component.len();
        match self {
            SeasonalMethod::Naive => {
                let start = n - period;
                component[start + (t % period + period - start % period) % period]
            }
            SeasonalMethod::Average => {
                let position = t % period;
                let (sum, count) = (position..n)
                    .step_by(period)
                    .fold((0.0, 0usize), |(s, c), i| (s + component[i], c + 1));
                sum / count.max(1) as f64
            }
        }
    }

    /// In-sample value that the method would have predicted at `t`.
    fn in_sample(&self, component: &[f64], period: usize, t: usize) -> f64 {
        match self {
            SeasonalMethod::Naive if t >= period => component[t - period],
            SeasonalMethod::Naive => f64::NAN,
            SeasonalMethod::Average => self.project(component, period, t),
        }
    }
}

/// Fitted forecaster for the seasonally adjusted series.
#[derive(Debug, Clone)]
enum TrendModel {
    Linear { intercept: f64, slope: f64, n: usize },
    Naive { last: f64 },
    Smoothing(ETS),
    Auto(AutoETS),
}

impl TrendModel {
    fn fit(method: TrendMethod, series: &TimeSeries) -> Result<Self> {
        let adjusted = series.values();
        match method {
            TrendMethod::Linear => {
                let (intercept, slope) = linear_fit(adjusted);
                Ok(TrendModel::Linear {
                    intercept,
                    slope,
                    n: adjusted.len(),
                })
            }
            TrendMethod::Naive => {
                let last = adjusted.last().copied().ok_or(ForecastError::EmptyData)?;
                Ok(TrendModel::Naive { last })
            }
            TrendMethod::SES | TrendMethod::Holt => {
                let mut model = if method == TrendMethod::SES {
                    ETS::ses()
                } else {
                    ETS::holt()
                };
                model.fit(series)?;
                Ok(TrendModel::Smoothing(model))
            }
            TrendMethod::AutoETS => {
                let mut model = AutoETS::new();
                model.fit(series)?;
                Ok(TrendModel::Auto(model))
            }
        }
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        match self {
            TrendModel::Linear {
                intercept,
                slope,
                n,
            } => Ok((0..horizon)
                .map(|h| intercept + slope * (n + h) as f64)
                .collect()),
            TrendModel::Naive { last } => Ok(vec![*last; horizon]),
            TrendModel::Smoothing(model) => Ok(model.predict(horizon)?.point().to_vec()),
            TrendModel::Auto(model) => Ok(model.predict(horizon)?.point().to_vec()),
        }
    }

    /// One-step in-sample predictions of the adjusted series.
    fn in_sample(&self, adjusted: &[f64]) -> Vec<f64> {
        match self {
            TrendModel::Linear {
                intercept, slope, ..
            } => (0..adjusted.len())
                .map(|t| intercept + slope * t as f64)
                .collect(),
            TrendModel::Naive { .. } => std::iter::once(f64::NAN)
                .chain(adjusted.iter().take(adjusted.len().saturating_sub(1)).copied())
                .collect(),
            TrendModel::Smoothing(model) => model
                .fitted_values()
                .map(<[f64]>::to_vec)
                .unwrap_or_else(|| vec![f64::NAN; adjusted.len()]),
            TrendModel::Auto(model) => model
                .fitted_values()
                .map(<[f64]>::to_vec)
                .unwrap_or_else(|| vec![f64::NAN; adjusted.len()]),
        }
    }
}

/// MSTL forecaster.
///
/// # Example
/// ```
/// use fcst_engine::core::TimeSeries;
/// use fcst_engine::models::mstl_forecaster::{MSTLForecaster, TrendMethod};
/// use fcst_engine::models::Forecaster;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let timestamps: Vec<_> = (0..96).map(|i| base + Duration::hours(i)).collect();
/// let values: Vec<f64> = (0..96)
///     .map(|i| 50.0 + 0.1 * i as f64 + 5.0 * (i as f64 * std::f64::consts::PI / 12.0).sin())
///     .collect();
/// let series = TimeSeries::univariate(timestamps, values).unwrap();
///
/// let mut model = MSTLForecaster::new(vec![24]).with_trend_method(TrendMethod::Linear);
/// model.fit(&series).unwrap();
/// assert_eq!(model.predict(24).unwrap().horizon(), 24);
/// ```
#[derive(Debug, Clone)]
pub struct MSTLForecaster {
    periods: Vec<usize>,
    iterations: usize,
    robust_passes: usize,
    trend_method: TrendMethod,
    seasonal_method: SeasonalMethod,
    decomposition: Option<MSTLResult>,
    trend: Option<TrendModel>,
    sigma: f64,
    in_sample_errors: Vec<f64>,
}

impl MSTLForecaster {
    pub fn new(periods: Vec<usize>) -> Self {
        Self {
            periods,
            iterations: 2,
            robust_passes: 0,
            trend_method: TrendMethod::default(),
            seasonal_method: SeasonalMethod::default(),
            decomposition: None,
            trend: None,
            sigma: f64::NAN,
            in_sample_errors: Vec::new(),
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn robust(mut self, passes: usize) -> Self {
        self.robust_passes = passes;
        self
    }

    pub fn with_trend_method(mut self, method: TrendMethod) -> Self {
        self.trend_method = method;
        self
    }

    pub fn with_seasonal_method(mut self, method: SeasonalMethod) -> Self {
        self.seasonal_method = method;
        self
    }

    pub fn trend_method(&self) -> TrendMethod {
        self.trend_method
    }

    pub fn seasonal_method(&self) -> SeasonalMethod {
        self.seasonal_method
    }

    pub fn periods(&self) -> &[usize] {
        &self.periods
    }

    pub fn decomposition(&self) -> Option<&MSTLResult> {
        self.decomposition.as_ref()
    }

    /// Longest seasonal period, if any.
    pub fn max_period(&self) -> Option<usize> {
        self.periods.iter().copied().max()
    }

    /// Parameters estimated by the trend and seasonal methods plus the variance.
    pub fn num_params(&self) -> usize {
        let seasonal: usize = self.periods.iter().sum();
        self.trend_method.num_params() + seasonal + 1
    }

    /// In-sample errors of the reassembled one-step predictions; `NaN`
    /// where a component has no prediction.
    pub fn in_sample_errors(&self) -> &[f64] {
        &self.in_sample_errors
    }
}

impl Default for MSTLForecaster {
    fn default() -> Self {
        Self::new(vec![12])
    }
}

impl Forecaster for MSTLForecaster {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let y = series.values();
        if y.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        let decomposition = MSTL::new(self.periods.clone())
            .with_iterations(self.iterations)
            .robust(self.robust_passes)
            .decompose(y)?;

        let adjusted = decomposition.seasonally_adjusted();
        let adjusted_series = TimeSeries::univariate(series.timestamps().to_vec(), adjusted)?;
        let trend = TrendModel::fit(self.trend_method, &adjusted_series)?;

        let mut predicted = trend.in_sample(adjusted_series.values());
        for (component, &period) in decomposition.seasonal.iter().zip(&decomposition.periods) {
            for (t, p) in predicted.iter_mut().enumerate() {
                *p += self.seasonal_method.in_sample(component, period, t);
            }
        }
        self.in_sample_errors = y.iter().zip(&predicted).map(|(a, p)| a - p).collect();
        self.sigma = residual_sigma(&decomposition.remainder);
        self.trend = Some(trend);
        self.decomposition = Some(decomposition);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let decomposition = self
            .decomposition
            .as_ref()
            .ok_or(ForecastError::FitRequired)?;
        let trend = self.trend.as_ref().ok_or(ForecastError::FitRequired)?;
        let n = decomposition.trend.len();

        let mut values = trend.predict(horizon)?;
        for (component, &period) in decomposition.seasonal.iter().zip(&decomposition.periods) {
            for (h, v) in values.iter_mut().enumerate() {
                *v += self.seasonal_method.project(component, period, n + h);
            }
        }
        Ok(Forecast::from_values(values))
    }

    /// Remainder standard deviation scaled by the square root of the step.
    fn standard_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        self.decomposition
            .as_ref()
            .ok_or(ForecastError::FitRequired)?;
        Ok(sqrt_horizon_errors(self.sigma, horizon))
    }

    /// Decomposition has no one-step-ahead recursion: empty once fitted.
    fn fitted_values(&self) -> Option<&[f64]> {
        self.decomposition.as_ref().map(|_| &[][..])
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.decomposition.as_ref().map(|_| &[][..])
    }

    fn name(&self) -> &str {
        "MSTL"
    }
}
