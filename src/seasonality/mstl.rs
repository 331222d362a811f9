//! MSTL: STL extended to several seasonal periods.
//!
//! Each seasonal component is re-estimated in turn by STL on the series with
//! every other seasonal component removed; the trend comes from the last STL
//! pass.

use super::stl::STL;
use crate::error::{ForecastError, Result};
use crate::utils::stats::{variance, VARIANCE_FLOOR};

/// Result of an MSTL decomposition.
#[derive(Debug, Clone)]
pub struct MSTLResult {
    pub trend: Vec<f64>,
    /// One component per period, in the order of `periods`.
    pub seasonal: Vec<Vec<f64>>,
    pub periods: Vec<usize>,
    pub remainder: Vec<f64>,
}

impl MSTLResult {
    /// Sum of all seasonal components.
    pub fn total_seasonal(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.trend.len()];
        for component in &self.seasonal {
            for (t, s) in total.iter_mut().zip(component) {
                *t += s;
            }
        }
        total
    }

    /// Trend plus remainder.
    pub fn seasonally_adjusted(&self) -> Vec<f64> {
        self.trend
            .iter()
            .zip(&self.remainder)
            .map(|(t, r)| t + r)
            .collect()
    }

    /// Seasonal strength of the component at `index`.
    pub fn seasonal_strength(&self, index: usize) -> Option<f64> {
        let component = self.seasonal.get(index)?;
        let combined: Vec<f64> = component
            .iter()
            .zip(&self.remainder)
            .map(|(s, r)| s + r)
            .collect();
        let total = variance(&combined);
        if total < VARIANCE_FLOOR {
            return Some(0.0);
        }
        Some((1.0 - variance(&self.remainder) / total).clamp(0.0, 1.0))
    }
}

/// MSTL decomposer.
#[derive(Debug, Clone)]
pub struct MSTL {
    periods: Vec<usize>,
    iterations: usize,
    robust_passes: usize,
}

impl MSTL {
    /// Periods are sorted ascending and deduplicated.
    pub fn new(periods: Vec<usize>) -> Self {
        let mut periods = periods;
        periods.sort_unstable();
        periods.dedup();
        Self {
            periods,
            iterations: 2,
            robust_passes: 0,
        }
    }

    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n.max(1);
        self
    }

    pub fn robust(mut self, passes: usize) -> Self {
        self.robust_passes = passes;
        self
    }

    pub fn periods(&self) -> &[usize] {
        &self.periods
    }

    /// Longest period, the one that sets the minimum length.
    pub fn max_period(&self) -> Option<usize> {
        self.periods.last().copied()
    }

    pub fn decompose(&self, series: &[f64]) -> Result<MSTLResult> {
        let max_period = self.max_period().ok_or_else(|| {
            ForecastError::InvalidParameter("MSTL needs at least one seasonal period".into())
        })?;
        if let Some(&p) = self.periods.iter().find(|&&p| p < 2) {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal periods must be at least 2, got {p}"
            )));
        }
        let n = series.len();
        if n < 2 * max_period {
            return Err(ForecastError::InsufficientData {
                needed: 2 * max_period,
                got: n,
            });
        }

        let mut seasonal = vec![vec![0.0; n]; self.periods.len()];
        let mut adjusted = series.to_vec();
        let mut trend = vec![0.0; n];

        for _ in 0..self.iterations {
            for (k, &period) in self.periods.iter().enumerate() {
                for (a, s) in adjusted.iter_mut().zip(&seasonal[k]) {
                    *a += s;
                }
                let result = STL::new(period)
                    .robust(self.robust_passes)
                    .decompose(&adjusted)?;
                for (a, s) in adjusted.iter_mut().zip(&result.seasonal) {
                    *a -= s;
                }
                seasonal[k] = result.seasonal;
                trend = result.trend;
            }
        }

        let remainder = adjusted.iter().zip(&trend).map(|(a, t)| a - t).collect();
        Ok(MSTLResult {
            trend,
            seasonal,
            periods: self.periods.clone(),
            remainder,
        })
    }
}
