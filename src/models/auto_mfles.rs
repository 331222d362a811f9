//! Automatic MFLES configuration by corrected AIC.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::mfles::{LevelSmoother, MFLES};
use crate::models::Forecaster;
use crate::utils::stats::{aicc, gaussian_log_likelihood, scores_tie};
use std::fmt;
use tracing::debug;

/// Boosting round counts tried by the search.
pub const SEARCH_ITERATIONS: [usize; 2] = [3, 10];

/// Minimum length for a non-seasonal search.
const MIN_NON_SEASONAL: usize = 10;

/// One point of the search grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MFLESCandidate {
    /// Fit the Fourier seasonal terms.
    pub seasonal: bool,
    pub smoother: LevelSmoother,
    pub iterations: usize,
}

impl fmt::Display for MFLESCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let season = if self.seasonal { "seasonal" } else { "none" };
        write!(f, "MFLES({season},{},{})", self.smoother, self.iterations)
    }
}

/// Searches season on/off, the level smoother and the round count.
///
/// Moving-average windows follow the primary period (the period and half of
/// it), or 5 and 3 without one.
#[derive(Debug, Clone)]
pub struct AutoMFLES {
    periods: Vec<usize>,
    selected: Option<MFLES>,
    name: Option<String>,
    scores: Vec<(MFLESCandidate, f64)>,
}

impl AutoMFLES {
    pub fn new(periods: Vec<usize>) -> Self {
        Self {
            periods: periods.into_iter().filter(|&m| m > 1).collect(),
            selected: None,
            name: None,
            scores: Vec::new(),
        }
    }

    /// Three cycles of the longest period, or ten points without one.
    pub fn min_length(&self) -> usize {
        let longest = self.periods.iter().copied().max().unwrap_or(0);
        (3 * longest).max(MIN_NON_SEASONAL)
    }

    /// Grid in evaluation order.
    pub fn candidates(&self) -> Vec<MFLESCandidate> {
        let seasons: &[bool] = if self.periods.is_empty() {
            &[false]
        } else {
            &[true, false]
        };
        let (wide, narrow) = match self.periods.first() {
            Some(&m) => (m, (m / 2).max(2)),
            None => (5, 3),
        };
        let mut smoothers = vec![
            LevelSmoother::Ensemble,
            LevelSmoother::MovingAverage(wide),
            LevelSmoother::MovingAverage(narrow),
        ];
        smoothers.dedup();

        let mut out = Vec::new();
        for &seasonal in seasons {
            for &smoother in &smoothers {
                for iterations in SEARCH_ITERATIONS {
                    out.push(MFLESCandidate {
                        seasonal,
                        smoother,
                        iterations,
                    });
                }
            }
        }
        out
    }

    pub fn selected_model(&self) -> Option<&MFLES> {
        self.selected.as_ref()
    }

    /// Every successfully scored candidate, in evaluation order.
    pub fn candidate_scores(&self) -> &[(MFLESCandidate, f64)] {
        &self.scores
    }

    fn selected(&self) -> Result<&MFLES> {
        self.selected.as_ref().ok_or(ForecastError::FitRequired)
    }

    fn build(&self, candidate: MFLESCandidate) -> MFLES {
        let periods = if candidate.seasonal {
            self.periods.clone()
        } else {
            Vec::new()
        };
        MFLES::new(periods)
            .with_smoother(candidate.smoother)
            .with_iterations(candidate.iterations)
    }
}

fn score(model: &MFLES) -> Option<f64> {
    let errors = model.in_sample_errors();
    let sse: f64 = errors.iter().map(|e| e * e).sum();
    aicc(
        gaussian_log_likelihood(sse, errors.len()),
        model.num_params(),
        errors.len(),
    )
}

impl Forecaster for AutoMFLES {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let y = series.values();
        if y.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        let needed = self.min_length();
        if y.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: y.len(),
            });
        }

        self.scores.clear();
        let mut best: Option<(MFLESCandidate, MFLES, f64)> = None;
        for candidate in self.candidates() {
            let mut model = self.build(candidate);
            if let Err(err) = model.fit(series) {
                debug!(%candidate, %err, "skipped: fit failed");
                continue;
            }
            let Some(value) = score(&model).filter(|v| v.is_finite()) else {
                debug!(%candidate, k = model.num_params(), "skipped: score undefined");
                continue;
            };
            debug!(%candidate, aicc = value, "candidate scored");
            self.scores.push((candidate, value));
            let better = match &best {
                None => true,
                Some((_, _, incumbent)) => !scores_tie(value, *incumbent) && value < *incumbent,
            };
            if better {
                best = Some((candidate, model, value));
            }
        }

        let (candidate, model, value) = best.ok_or_else(|| {
            ForecastError::SearchExhausted(format!(
                "no MFLES configuration could be scored on {} observations",
                y.len()
            ))
        })?;
        debug!(%candidate, aicc = value, "selected MFLES configuration");
        self.name = Some(candidate.to_string());
        self.selected = Some(model);
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
        self.name.as_deref().unwrap_or("AutoMFLES")
    }
}
