//! STL (Seasonal-Trend decomposition using LOESS).
//!
//! Splits a series into trend, seasonal and remainder so that
//! `y = trend + seasonal + remainder` holds exactly at every index.

use crate::error::{ForecastError, Result};
use crate::utils::stats::{variance, VARIANCE_FLOOR};

/// Result of an STL decomposition.
#[derive(Debug, Clone)]
pub struct STLResult {
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub remainder: Vec<f64>,
}

/// `1 - var(remainder) / var(component + remainder)`, clamped to [0, 1].
fn strength(component: &[f64], remainder: &[f64]) -> f64 {
    let combined: Vec<f64> = component
        .iter()
        .zip(remainder)
        .map(|(c, r)| c + r)
        .collect();
    let total = variance(&combined);
    if total < VARIANCE_FLOOR {
        return 0.0;
    }
    (1.0 - variance(remainder) / total).clamp(0.0, 1.0)
}

impl STLResult {
    /// Seasonal strength in [0, 1]; near 1 means the seasonal pattern
    /// dominates the remainder.
    pub fn seasonal_strength(&self) -> f64 {
        strength(&self.seasonal, &self.remainder)
    }

    /// Trend strength in [0, 1].
    pub fn trend_strength(&self) -> f64 {
        strength(&self.trend, &self.remainder)
    }

    /// Trend plus remainder.
    pub fn seasonally_adjusted(&self) -> Vec<f64> {
        self.trend
            .iter()
            .zip(&self.remainder)
            .map(|(t, r)| t + r)
            .collect()
    }
}

fn odd(n: usize) -> usize {
    if n % 2 == 0 {
        n + 1
    } else {
        n
    }
}

/// STL decomposer.
#[derive(Debug, Clone)]
pub struct STL {
    period: usize,
    seasonal_window: usize,
    trend_window: usize,
    low_pass_window: usize,
    inner_iterations: usize,
    /// Robustness passes; zero disables reweighting.
    outer_iterations: usize,
}

impl STL {
    /// Decomposer with the usual defaults for `period`: a seasonal window of
    /// at least 7 and a trend window of `1.5 m / (1 - 1.5 / ns)`.
    pub fn new(period: usize) -> Self {
        let seasonal_window = odd(period.max(7));
        let trend = (1.5 * period as f64 / (1.0 - 1.5 / seasonal_window as f64)).ceil();
        Self {
            period,
            seasonal_window,
            trend_window: odd((trend as usize).max(3)),
            low_pass_window: odd(period.max(3)),
            inner_iterations: 2,
            outer_iterations: 0,
        }
    }

    pub fn with_seasonal_window(mut self, window: usize) -> Self {
        self.seasonal_window = odd(window.max(3));
        self
    }

    pub fn with_trend_window(mut self, window: usize) -> Self {
        self.trend_window = odd(window.max(3));
        self
    }

    pub fn with_inner_iterations(mut self, n: usize) -> Self {
        self.inner_iterations = n.max(1);
        self
    }

    /// Enable bisquare reweighting with the given number of passes.
    pub fn robust(mut self, passes: usize) -> Self {
        self.outer_iterations = passes;
        self
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Decompose `series`; needs a period of at least 2 and two full cycles.
    pub fn decompose(&self, series: &[f64]) -> Result<STLResult> {
        let n = series.len();
        let m = self.period;
        if m < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "STL period must be at least 2, got {m}"
            )));
        }
        if n < 2 * m {
            return Err(ForecastError::InsufficientData {
                needed: 2 * m,
                got: n,
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }

        let mut seasonal = vec![0.0; n];
        let mut trend = vec![0.0; n];
        let mut weights = vec![1.0; n];

        for pass in 0..=self.outer_iterations {
            for _ in 0..self.inner_iterations {
                let detrended: Vec<f64> = series.iter().zip(&trend).map(|(y, t)| y - t).collect();
                let cycles = self.smooth_cycle_subseries(&detrended, &weights);
                let low = self.low_pass(&cycles);
                for i in 0..n {
                    seasonal[i] = cycles[i] - low[i];
                }
                let adjusted: Vec<f64> =
                    series.iter().zip(&seasonal).map(|(y, s)| y - s).collect();
                trend = loess(&adjusted, self.trend_window, &weights);
            }
            if pass < self.outer_iterations {
                let remainder: Vec<f64> =
                    (0..n).map(|i| series[i] - seasonal[i] - trend[i]).collect();
                weights = bisquare_weights(&remainder);
            }
        }

        let remainder = (0..n).map(|i| series[i] - seasonal[i] - trend[i]).collect();
        Ok(STLResult {
            trend,
            seasonal,
            remainder,
        })
    }

    fn smooth_cycle_subseries(&self, detrended: &[f64], weights: &[f64]) -> Vec<f64> {
        let n = detrended.len();
        let m = self.period;
        let mut out = vec![0.0; n];
        for position in 0..m {
            let idx: Vec<usize> = (position..n).step_by(m).collect();
            let values: Vec<f64> = idx.iter().map(|&i| detrended[i]).collect();
            let w: Vec<f64> = idx.iter().map(|&i| weights[i]).collect();
            let smoothed = loess(&values, self.seasonal_window, &w);
            for (&i, v) in idx.iter().zip(smoothed) {
                out[i] = v;
            }
        }
        out
    }

    /// Moving averages of length m, m and 3 followed by a LOESS pass.
    fn low_pass(&self, series: &[f64]) -> Vec<f64> {
        let first = moving_average(series, self.period);
        let smoothed = moving_average(&moving_average(&first, self.period), 3);
        loess(&smoothed, self.low_pass_window, &vec![1.0; series.len()])
    }
}

/// Centred moving average; the window shrinks at the edges.
fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    let half = window / 2;
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(n);
            series[start..end].iter().sum::<f64>() / (end - start) as f64
        })
        .collect()
}

fn tricube(u: f64) -> f64 {
    if u < 1.0 {
        (1.0 - u.powi(3)).powi(3)
    } else {
        0.0
    }
}

/// Locally linear LOESS with a tricube kernel over the `span` nearest points.
fn loess(values: &[f64], span: usize, weights: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 3 {
        return values.to_vec();
    }
    let span = span.clamp(3, n);
    let half = span / 2;
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half).min(n - span);
            let end = start + span;
            let reach = (i - start).max(end - 1 - i) as f64 + 1.0;

            let (mut sw, mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for j in start..end {
                let dx = j as f64 - i as f64;
                let w = tricube(dx.abs() / reach) * weights[j];
                sw += w;
                sx += w * dx;
                sy += w * values[j];
                sxx += w * dx * dx;
                sxy += w * dx * values[j];
            }
            if sw <= 0.0 {
                return values[i];
            }
            let mx = sx / sw;
            let my = sy / sw;
            let spread = sxx / sw - mx * mx;
            if spread > 1e-12 {
                let slope = (sxy / sw - mx * my) / spread;
                my - slope * mx
            } else {
                my
            }
        })
        .collect()
}

/// Bisquare weights from residuals scaled by six times their median magnitude.
fn bisquare_weights(remainder: &[f64]) -> Vec<f64> {
    let mut magnitudes: Vec<f64> = remainder.iter().map(|r| r.abs()).collect();
    magnitudes.sort_by(|a, b| a.total_cmp(b));
    let n = magnitudes.len();
    let median = if n == 0 {
        0.0
    } else if n % 2 == 0 {
        (magnitudes[n / 2 - 1] + magnitudes[n / 2]) / 2.0
    } else {
        magnitudes[n / 2]
    };
    let h = 6.0 * median;
    remainder
        .iter()
        .map(|r| {
            if h < 1e-10 {
                return 1.0;
            }
            let u = r.abs() / h;
            if u < 1.0 {
                (1.0 - u * u).powi(2)
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn seasonal_series(n: usize, period: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 0.1 * i as f64 + 10.0 * (2.0 * PI * i as f64 / period as f64).sin())
            .collect()
    }

    #[test]
    fn components_reconstruct_series() {
        let series = seasonal_series(120, 12);
        let result = STL::new(12).decompose(&series).unwrap();
        for i in 0..series.len() {
            let rebuilt = result.trend[i] + result.seasonal[i] + result.remainder[i];
            assert!((series[i] - rebuilt).abs() < 1e-10);
        }
    }

    #[test]
    fn strong_seasonality_is_detected() {
        let result = STL::new(12).decompose(&seasonal_series(120, 12)).unwrap();
        assert!(result.seasonal_strength() > 0.64, "{}", result.seasonal_strength());
    }

    #[test]
    fn trend_only_series_has_weak_season() {
        let series: Vec<f64> = (0..100).map(|i| 5.0 + 0.5 * i as f64).collect();
        let result = STL::new(10).decompose(&series).unwrap();
        assert!(variance(&result.seasonal) < 0.1 * variance(&series));
        assert!(result.trend_strength() > 0.9);
    }

    #[test]
    fn constant_series_has_flat_components() {
        let result = STL::new(10).decompose(&[5.0; 100]).unwrap();
        assert!(result.seasonal.iter().all(|s| s.abs() < 1e-6));
        assert!(result.remainder.iter().all(|r| r.abs() < 1e-6));
        assert_eq!(result.seasonal_strength(), 0.0);
    }

    #[test]
    fn short_series_is_rejected() {
        let err = STL::new(12).decompose(&[1.0; 10]).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { needed: 24, got: 10 });
    }

    #[test]
    fn robust_pass_downweights_outliers() {
        let mut series = seasonal_series(120, 12);
        series[30] = 100.0;
        series[60] = -100.0;
        let result = STL::new(12).robust(3).decompose(&series).unwrap();
        assert!(result.seasonal_strength() > 0.1);
        assert!(result.remainder[30].abs() > 50.0);
    }
}
