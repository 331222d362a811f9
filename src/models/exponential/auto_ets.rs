//! Automatic ETS model selection.
//!
//! AutoETS fits every admissible ETS shape and keeps the one with the lowest
//! corrected AIC.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::intervals::UncertaintyShape;
use crate::models::exponential::ets::{
    ETSSpec, ErrorType, SeasonalType, SmoothingParams, TrendType, ETS,
};
use crate::models::Forecaster;
use crate::utils::stats::scores_tie;
use tracing::debug;

/// Minimum length for a non-seasonal search.
const MIN_NON_SEASONAL: usize = 10;

/// Configuration for AutoETS.
#[derive(Debug, Clone, Default)]
pub struct AutoETSConfig {
    /// Seasonal period; values <= 1 restrict the search to non-seasonal shapes.
    pub period: usize,
    /// Restrict the error shape.
    pub error: Option<ErrorType>,
    /// Restrict the trend shape.
    pub trend: Option<TrendType>,
    /// Restrict the season shape.
    pub season: Option<SeasonalType>,
    /// Admit multiplicative trends (M, Md) into the search.
    pub allow_multiplicative_trend: bool,
    /// Smoothing constants held fixed in every candidate.
    pub smoothing: SmoothingParams,
}

impl AutoETSConfig {
    pub fn with_period(period: usize) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    pub fn with_error(mut self, error: ErrorType) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_trend(mut self, trend: TrendType) -> Self {
        self.trend = Some(trend);
        self
    }

    pub fn with_season(mut self, season: SeasonalType) -> Self {
        self.season = Some(season);
        self
    }

    pub fn allow_multiplicative_trend(mut self, allow: bool) -> Self {
        self.allow_multiplicative_trend = allow;
        self
    }

    pub fn with_smoothing(mut self, smoothing: SmoothingParams) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Minimum series length for a search: three cycles, or ten points.
    pub fn min_length(&self) -> usize {
        if self.period > 1 {
            3 * self.period
        } else {
            MIN_NON_SEASONAL
        }
    }

    /// Candidate shapes in precedence order.
    fn shapes(&self) -> Vec<ETSSpec> {
        let errors: Vec<ErrorType> = match self.error {
            Some(e) => vec![e],
            None => ErrorType::ALL.to_vec(),
        };
        let trends: Vec<TrendType> = match self.trend {
            Some(t) => vec![t],
            None => TrendType::ALL
                .into_iter()
                .filter(|t| self.allow_multiplicative_trend || !t.is_multiplicative())
                .collect(),
        };
        let seasons: Vec<SeasonalType> = match self.season {
            Some(s) => vec![s],
            None if self.period > 1 => SeasonalType::ALL.to_vec(),
            None => vec![SeasonalType::None],
        };

        let mut out = Vec::with_capacity(errors.len() * trends.len() * seasons.len());
        for &error in &errors {
            for &trend in &trends {
                for &season in &seasons {
                    out.push(ETSSpec::new(error, trend, season, self.period));
                }
            }
        }
        out
    }
}

/// A fitted candidate with its score.
#[derive(Debug, Clone)]
struct Scored {
    model: ETS,
    score: f64,
    k: usize,
}

impl Scored {
    /// Whether `self` should replace `incumbent`. Candidates arrive in
    /// precedence order, so an exact tie on score and size keeps the incumbent.
    fn beats(&self, incumbent: &Scored) -> bool {
        if scores_tie(self.score, incumbent.score) {
            self.k < incumbent.k
        } else {
            self.score < incumbent.score
        }
    }
}

/// Automatic ETS model selection.
#[derive(Debug, Clone, Default)]
pub struct AutoETS {
    config: AutoETSConfig,
    selected: Option<ETS>,
    name: Option<String>,
    scores: Vec<(ETSSpec, f64)>,
}

impl AutoETS {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AutoETSConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn with_period(period: usize) -> Self {
        Self::with_config(AutoETSConfig::with_period(period))
    }

    /// Specification of the selected model.
    pub fn selected_spec(&self) -> Option<ETSSpec> {
        self.selected.as_ref().map(|m| *m.spec())
    }

    pub fn selected_model(&self) -> Option<&ETS> {
        self.selected.as_ref()
    }

    /// Every successfully scored candidate, in evaluation order.
    pub fn candidate_scores(&self) -> &[(ETSSpec, f64)] {
        &self.scores
    }

    fn selected(&self) -> Result<&ETS> {
        self.selected.as_ref().ok_or(ForecastError::FitRequired)
    }
}

impl Forecaster for AutoETS {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let y = series.values();
        if y.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        if self.config.season.is_some_and(|s| s.has_season()) && self.config.period < 2 {
            return Err(ForecastError::MissingParameter("seasonal_period".into()));
        }
        let needed = self.config.min_length();
        if y.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: y.len(),
            });
        }

        let positive = y.iter().all(|&v| v > 0.0);
        let n = y.len();
        let shapes = self.config.shapes();
        let tried = shapes.len();
        self.scores.clear();

        let mut best: Option<Scored> = None;
        for spec in shapes {
            if spec.seasonal.has_season() && spec.period < 2 {
                debug!(%spec, "skipped: seasonal shape without a period");
                continue;
            }
            if spec.needs_positive_data() && !positive {
                debug!(%spec, "skipped: multiplicative component on non-positive data");
                continue;
            }
            if n < spec.min_length() {
                debug!(%spec, n, "skipped: series too short");
                continue;
            }

            let mut model = ETS::new(spec).with_smoothing(self.config.smoothing);
            if let Err(e) = model.fit(series) {
                debug!(%spec, error = %e, "candidate failed to fit");
                continue;
            }
            let Some(score) = model.aicc() else {
                debug!(%spec, k = model.num_params(), n, "inadmissible: too many parameters");
                continue;
            };
            if !score.is_finite() {
                debug!(%spec, "inadmissible: non-finite score");
                continue;
            }
            debug!(%spec, aicc = score, "candidate scored");
            self.scores.push((spec, score));

            let candidate = Scored {
                k: model.num_params(),
                model,
                score,
            };
            match &best {
                Some(incumbent) if !candidate.beats(incumbent) => {}
                _ => best = Some(candidate),
            }
        }

        let best = best.ok_or_else(|| {
            ForecastError::SearchExhausted(format!(
                "no admissible ETS candidate among {tried} shapes for {n} observations"
            ))
        })?;
        debug!(selected = %best.model.spec(), aicc = best.score, "AutoETS selection");
        self.name = Some(best.model.spec().to_string());
        self.selected = Some(best.model);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selected()?.predict(horizon)
    }

    fn standard_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        self.selected()?.standard_errors(horizon)
    }

    fn uncertainty_shape(&self) -> UncertaintyShape {
        UncertaintyShape::Growing
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected.as_ref()?.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected.as_ref()?.residuals()
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("AutoETS")
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

    fn weekly_trending(n: usize) -> Vec<f64> {
        let profile = [8.0, 12.0, 15.0, 10.0, 4.0, -14.0, -20.0];
        (0..n)
            .map(|i| 100.0 + 0.8 * i as f64 + profile[i % 7] + ((i * 31) % 7) as f64 * 0.3)
            .collect()
    }

    #[test]
    fn seasonal_trending_series_selects_trend_and_season() {
        let mut model = AutoETS::with_period(7);
        model.fit(&make_series(weekly_trending(120))).unwrap();
        let spec = model.selected_spec().unwrap();
        assert_ne!(spec.trend, TrendType::None);
        assert_ne!(spec.seasonal, SeasonalType::None);
        assert!(model.name().starts_with("ETS("));
    }

    #[test]
    fn non_seasonal_search_never_proposes_season() {
        let values: Vec<f64> = (0..40).map(|i| 20.0 + (i as f64 * 0.3).sin()).collect();
        let mut model = AutoETS::new();
        model.fit(&make_series(values)).unwrap();
        assert!(model
            .candidate_scores()
            .iter()
            .all(|(spec, _)| spec.seasonal == SeasonalType::None));
    }

    #[test]
    fn multiplicative_trend_excluded_by_default() {
        let values: Vec<f64> = (0..40).map(|i| 10.0 * 1.03_f64.powi(i)).collect();
        let mut model = AutoETS::new();
        model.fit(&make_series(values.clone())).unwrap();
        assert!(model
            .candidate_scores()
            .iter()
            .all(|(spec, _)| !spec.trend.is_multiplicative()));

        let config = AutoETSConfig::default().allow_multiplicative_trend(true);
        let mut model = AutoETS::with_config(config);
        model.fit(&make_series(values)).unwrap();
        assert!(model
            .candidate_scores()
            .iter()
            .any(|(spec, _)| spec.trend.is_multiplicative()));
    }

    #[test]
    fn negative_data_skips_multiplicative_shapes() {
        let values: Vec<f64> = (0..30).map(|i| -5.0 + (i % 4) as f64).collect();
        let mut model = AutoETS::new();
        model.fit(&make_series(values)).unwrap();
        assert!(model
            .candidate_scores()
            .iter()
            .all(|(spec, _)| !spec.needs_positive_data()));
    }

    #[test]
    fn pinned_multiplicative_error_on_negative_data_is_exhausted() {
        let values: Vec<f64> = (0..30).map(|i| -5.0 + (i % 4) as f64).collect();
        let config = AutoETSConfig::default().with_error(ErrorType::Multiplicative);
        let mut model = AutoETS::with_config(config);
        let err = model.fit(&make_series(values)).unwrap_err();
        assert!(matches!(err, ForecastError::SearchExhausted(_)));
    }

    #[test]
    fn pinned_season_without_period_is_missing_a_parameter() {
        let values: Vec<f64> = (0..40).map(|i| 10.0 + (i % 4) as f64).collect();
        let config = AutoETSConfig::default().with_season(SeasonalType::Additive);
        let mut model = AutoETS::with_config(config);
        let err = model.fit(&make_series(values)).unwrap_err();
        assert_eq!(err, ForecastError::MissingParameter("seasonal_period".into()));
    }

    #[test]
    fn short_series_is_rejected() {
        let mut model = AutoETS::with_period(12);
        let err = model.fit(&make_series(vec![1.0; 20])).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { needed: 36, got: 20 });
    }

    #[test]
    fn repeated_fits_select_the_same_model() {
        let values = weekly_trending(84);
        let mut a = AutoETS::with_period(7);
        let mut b = AutoETS::with_period(7);
        a.fit(&make_series(values.clone())).unwrap();
        b.fit(&make_series(values)).unwrap();
        assert_eq!(a.selected_spec(), b.selected_spec());
        assert_eq!(a.predict(5).unwrap().point(), b.predict(5).unwrap().point());
    }

    #[test]
    fn tie_prefers_fewer_parameters() {
        let incumbent = Scored {
            model: ETS::holt(),
            score: 100.0,
            k: 5,
        };
        let challenger = Scored {
            model: ETS::ses(),
            score: 100.0 + 1e-12,
            k: 3,
        };
        assert!(challenger.beats(&incumbent));
        assert!(!incumbent.beats(&challenger));
    }
}
