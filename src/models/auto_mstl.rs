//! Automatic selection of the MSTL trend and seasonal projection methods.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::mstl_forecaster::{MSTLForecaster, SeasonalMethod, TrendMethod};
use crate::models::Forecaster;
use crate::utils::stats::{aicc, gaussian_log_likelihood, scores_tie};
use tracing::debug;

/// Tries every trend × seasonal method pair and keeps the lowest AICc.
#[derive(Debug, Clone)]
pub struct AutoMSTL {
    periods: Vec<usize>,
    selected: Option<MSTLForecaster>,
    name: Option<String>,
    scores: Vec<((TrendMethod, SeasonalMethod), f64)>,
}

impl AutoMSTL {
    pub fn new(periods: Vec<usize>) -> Self {
        Self {
            periods,
            selected: None,
            name: None,
            scores: Vec::new(),
        }
    }

    /// Three cycles of the longest period.
    pub fn min_length(&self) -> usize {
        3 * self.periods.iter().copied().max().unwrap_or(0)
    }

    pub fn selected_methods(&self) -> Option<(TrendMethod, SeasonalMethod)> {
        self.selected
            .as_ref()
            .map(|m| (m.trend_method(), m.seasonal_method()))
    }

    pub fn selected_model(&self) -> Option<&MSTLForecaster> {
        self.selected.as_ref()
    }

    pub fn candidate_scores(&self) -> &[((TrendMethod, SeasonalMethod), f64)] {
        &self.scores
    }

    fn selected(&self) -> Result<&MSTLForecaster> {
        self.selected.as_ref().ok_or(ForecastError::FitRequired)
    }
}

/// AICc of a candidate's in-sample errors, skipping positions it cannot predict.
fn score(model: &MSTLForecaster) -> Option<f64> {
    let errors: Vec<f64> = model
        .in_sample_errors()
        .iter()
        .copied()
        .filter(|e| e.is_finite())
        .collect();
    let sse: f64 = errors.iter().map(|e| e * e).sum();
    aicc(
        gaussian_log_likelihood(sse, errors.len()),
        model.num_params(),
        errors.len(),
    )
}

impl Forecaster for AutoMSTL {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let y = series.values();
        if y.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if self.periods.is_empty() {
            return Err(ForecastError::MissingParameter("seasonal_period".into()));
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
        let mut best: Option<(MSTLForecaster, f64)> = None;
        for trend in TrendMethod::ALL {
            for seasonal in SeasonalMethod::ALL {
                let mut candidate = MSTLForecaster::new(self.periods.clone())
                    .with_trend_method(trend)
                    .with_seasonal_method(seasonal);
                if let Err(err) = candidate.fit(series) {
                    debug!(?trend, ?seasonal, %err, "skipped: fit failed");
                    continue;
                }
                let Some(value) = score(&candidate).filter(|v| v.is_finite()) else {
                    debug!(?trend, ?seasonal, "skipped: score undefined");
                    continue;
                };
                debug!(?trend, ?seasonal, aicc = value, "candidate scored");
                self.scores.push(((trend, seasonal), value));
                let better = match &best {
                    None => true,
                    Some((_, incumbent)) => {
                        !scores_tie(value, *incumbent) && value < *incumbent
                    }
                };
                if better {
                    best = Some((candidate, value));
                }
            }
        }

        let (model, value) = best.ok_or_else(|| {
            ForecastError::SearchExhausted("no MSTL method combination could be scored".into())
        })?;
        debug!(
            trend = ?model.trend_method(),
            seasonal = ?model.seasonal_method(),
            aicc = value,
            "selected MSTL methods"
        );
        self.name = Some(format!(
            "MSTL({},{})",
            model.trend_method().as_str(),
            model.seasonal_method().as_str()
        ));
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
        self.name.as_deref().unwrap_or("AutoMSTL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::f64::consts::PI;

    fn make_series(values: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| base + Duration::days(i as i64))
            .collect();
        TimeSeries::univariate(timestamps, values).unwrap()
    }

    fn noisy_weekly(n: usize) -> Vec<f64> {
        let mut state: u64 = 7;
        (0..n)
            .map(|i| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                let noise = (state >> 33) as f64 / (1u64 << 31) as f64 - 0.5;
                100.0 + 0.5 * i as f64 + 8.0 * (2.0 * PI * i as f64 / 7.0).sin() + noise
            })
            .collect()
    }

    #[test]
    fn scores_every_combination() {
        let mut model = AutoMSTL::new(vec![7]);
        model.fit(&make_series(noisy_weekly(84))).unwrap();
        assert_eq!(model.candidate_scores().len(), 10);
        assert!(model.selected_methods().is_some());
        assert_eq!(model.predict(14).unwrap().horizon(), 14);
    }

    #[test]
    fn trending_series_prefers_a_trend_method() {
        let mut model = AutoMSTL::new(vec![7]);
        model.fit(&make_series(noisy_weekly(140))).unwrap();
        let (trend, _) = model.selected_methods().unwrap();
        assert_ne!(trend, TrendMethod::Naive);
    }

    #[test]
    fn selection_is_deterministic() {
        let series = make_series(noisy_weekly(84));
        let mut a = AutoMSTL::new(vec![7]);
        let mut b = AutoMSTL::new(vec![7]);
        a.fit(&series).unwrap();
        b.fit(&series).unwrap();
        assert_eq!(a.selected_methods(), b.selected_methods());
        assert_eq!(a.predict(7).unwrap(), b.predict(7).unwrap());
    }

    #[test]
    fn name_reports_the_selected_methods() {
        let mut model = AutoMSTL::new(vec![7]);
        assert_eq!(model.name(), "AutoMSTL");
        model.fit(&make_series(noisy_weekly(84))).unwrap();
        let (trend, seasonal) = model.selected_methods().unwrap();
        assert_eq!(
            model.name(),
            format!("MSTL({},{})", trend.as_str(), seasonal.as_str())
        );
    }

    #[test]
    fn needs_three_cycles() {
        let mut model = AutoMSTL::new(vec![7]);
        let err = model.fit(&make_series(noisy_weekly(20))).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { needed: 21, got: 20 });
    }

    #[test]
    fn predict_before_fit_fails() {
        assert_eq!(
            AutoMSTL::new(vec![7]).predict(3).unwrap_err(),
            ForecastError::FitRequired
        );
    }
}
