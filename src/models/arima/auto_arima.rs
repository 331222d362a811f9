//! Automatic ARIMA order selection.
//!
//! Differencing orders come from tests on the data (STL seasonal strength
//! for `D`, KPSS for `d`); AR/MA orders come from a stepwise AICc search
//! that starts from a handful of seed models and moves one order at a time.

use super::diff::seasonal_difference;
use super::model::{ARIMASpec, ARIMA};
use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::seasonality::STL;
use crate::utils::stats::scores_tie;
use crate::validation::ndiffs;
use std::collections::BTreeSet;
use tracing::debug;

/// Seasonal strength above which another seasonal difference is taken.
const SEASONAL_STRENGTH_THRESHOLD: f64 = 0.64;
/// Minimum length for a non-seasonal search.
const MIN_NON_SEASONAL: usize = 10;

/// Configuration for AutoARIMA.
#[derive(Debug, Clone)]
pub struct AutoARIMAConfig {
    /// Seasonal period; values <= 1 disable the seasonal part.
    pub period: usize,
    pub max_p: usize,
    pub max_q: usize,
    pub max_cap_p: usize,
    pub max_cap_q: usize,
    pub max_d: usize,
    pub max_cap_d: usize,
    /// Fixed non-seasonal differencing order instead of the KPSS choice.
    pub d: Option<usize>,
    /// Fixed seasonal differencing order instead of the strength test.
    pub cap_d: Option<usize>,
    /// Force the intercept on or off in every candidate.
    pub include_intercept: Option<bool>,
    /// Upper bound on stepwise improvement rounds.
    pub max_iterations: usize,
}

impl Default for AutoARIMAConfig {
    fn default() -> Self {
        Self {
            period: 1,
            max_p: 5,
            max_q: 5,
            max_cap_p: 2,
            max_cap_q: 2,
            max_d: 2,
            max_cap_d: 2,
            d: None,
            cap_d: None,
            include_intercept: None,
            max_iterations: 50,
        }
    }
}

impl AutoARIMAConfig {
    pub fn with_period(period: usize) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    pub fn with_max_orders(mut self, max_p: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_q = max_q;
        self
    }

    pub fn with_max_seasonal_orders(mut self, max_cap_p: usize, max_cap_q: usize) -> Self {
        self.max_cap_p = max_cap_p;
        self.max_cap_q = max_cap_q;
        self
    }

    pub fn with_max_differencing(mut self, max_d: usize, max_cap_d: usize) -> Self {
        self.max_d = max_d;
        self.max_cap_d = max_cap_d;
        self
    }

    pub fn with_differencing(mut self, d: Option<usize>, cap_d: Option<usize>) -> Self {
        self.d = d;
        self.cap_d = cap_d;
        self
    }

    pub fn with_intercept(mut self, include: Option<bool>) -> Self {
        self.include_intercept = include;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    fn seasonal(&self) -> bool {
        self.period > 1
    }

    /// Minimum series length for a search: three cycles, or ten points.
    pub fn min_length(&self) -> usize {
        if self.seasonal() {
            3 * self.period
        } else {
            MIN_NON_SEASONAL
        }
    }
}

/// Searchable part of an order; differencing is fixed before the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Order {
    p: usize,
    q: usize,
    cap_p: usize,
    cap_q: usize,
    intercept: bool,
}

/// A fitted candidate and its score.
#[derive(Debug, Clone)]
struct Scored {
    order: Order,
    model: ARIMA,
    score: f64,
}

/// Number of seasonal differences suggested by STL seasonal strength.
fn seasonal_differences(y: &[f64], period: usize, max_cap_d: usize) -> usize {
    let mut current = y.to_vec();
    let mut cap_d = 0;
    while cap_d < max_cap_d && current.len() >= 2 * period {
        let strength = STL::new(period)
            .decompose(&current)
            .map(|r| r.seasonal_strength())
            .unwrap_or(0.0);
        debug!(period, cap_d, strength, "seasonal strength");
        if strength <= SEASONAL_STRENGTH_THRESHOLD {
            break;
        }
        current = seasonal_difference(&current, 1, period);
        cap_d += 1;
    }
    cap_d
}

/// Automatic ARIMA model selection.
#[derive(Debug, Clone)]
pub struct AutoARIMA {
    config: AutoARIMAConfig,
    selected: Option<ARIMA>,
    name: Option<String>,
    scores: Vec<(ARIMASpec, f64)>,
}

impl AutoARIMA {
    pub fn new() -> Self {
        Self::with_config(AutoARIMAConfig::default())
    }

    pub fn with_config(config: AutoARIMAConfig) -> Self {
        Self {
            config,
            selected: None,
            name: None,
            scores: Vec::new(),
        }
    }

    pub fn with_period(period: usize) -> Self {
        Self::with_config(AutoARIMAConfig::with_period(period))
    }

    pub fn selected_spec(&self) -> Option<ARIMASpec> {
        self.selected.as_ref().map(|m| *m.spec())
    }

    pub fn selected_model(&self) -> Option<&ARIMA> {
        self.selected.as_ref()
    }

    /// Every successfully scored candidate, in evaluation order.
    pub fn candidate_scores(&self) -> &[(ARIMASpec, f64)] {
        &self.scores
    }

    fn selected(&self) -> Result<&ARIMA> {
        self.selected.as_ref().ok_or(ForecastError::FitRequired)
    }

    fn spec_for(&self, order: Order, d: usize, cap_d: usize) -> ARIMASpec {
        let spec = ARIMASpec::new(order.p, d, order.q).with_intercept(order.intercept);
        if self.config.seasonal() {
            spec.with_seasonal(order.cap_p, cap_d, order.cap_q, self.config.period)
        } else {
            spec
        }
    }

    /// Fit and score one order; `None` when it is not estimable or fails.
    fn evaluate(
        &mut self,
        series: &TimeSeries,
        order: Order,
        d: usize,
        cap_d: usize,
    ) -> Option<Scored> {
        let spec = self.spec_for(order, d, cap_d);
        if series.len() < spec.min_length() {
            debug!(%spec, n = series.len(), "skipped: not estimable");
            return None;
        }
        let mut model = ARIMA::new(spec);
        if let Err(e) = model.fit(series) {
            debug!(%spec, error = %e, "candidate failed to fit");
            return None;
        }
        let Some(score) = model.aicc() else {
            debug!(%spec, "inadmissible: too many parameters");
            return None;
        };
        debug!(%spec, aicc = score, "candidate scored");
        self.scores.push((spec, score));
        Some(Scored {
            order,
            model,
            score,
        })
    }

    fn seeds(&self, intercept: bool) -> Vec<Order> {
        let c = &self.config;
        let seasonal = c.seasonal();
        let raw = [(2, 2, 1, 1), (0, 0, 0, 0), (1, 0, 1, 0), (0, 1, 0, 1)];
        let mut out: Vec<Order> = Vec::with_capacity(raw.len());
        for (p, q, cap_p, cap_q) in raw {
            let order = Order {
                p: p.min(c.max_p),
                q: q.min(c.max_q),
                cap_p: if seasonal { cap_p.min(c.max_cap_p) } else { 0 },
                cap_q: if seasonal { cap_q.min(c.max_cap_q) } else { 0 },
                intercept,
            };
            if !out.contains(&order) {
                out.push(order);
            }
        }
        out
    }

    fn neighbors(&self, order: Order, toggle_intercept: bool) -> Vec<Order> {
        let c = &self.config;
        let mut out = Vec::new();
        let mut push = |o: Order| out.push(o);
        if order.p > 0 {
            push(Order { p: order.p - 1, ..order });
        }
        if order.p < c.max_p {
            push(Order { p: order.p + 1, ..order });
        }
        if order.q > 0 {
            push(Order { q: order.q - 1, ..order });
        }
        if order.q < c.max_q {
            push(Order { q: order.q + 1, ..order });
        }
        if c.seasonal() {
            if order.cap_p > 0 {
                push(Order { cap_p: order.cap_p - 1, ..order });
            }
            if order.cap_p < c.max_cap_p {
                push(Order { cap_p: order.cap_p + 1, ..order });
            }
            if order.cap_q > 0 {
                push(Order { cap_q: order.cap_q - 1, ..order });
            }
            if order.cap_q < c.max_cap_q {
                push(Order { cap_q: order.cap_q + 1, ..order });
            }
        }
        if toggle_intercept {
            push(Order {
                intercept: !order.intercept,
                ..order
            });
        }
        out
    }
}

impl Default for AutoARIMA {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for AutoARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let y = series.values();
        if y.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        if self.config.cap_d.is_some_and(|d| d > 0) && !self.config.seasonal() {
            return Err(ForecastError::MissingParameter("seasonal_period".into()));
        }
        let needed = self.config.min_length();
        if y.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: y.len(),
            });
        }
        self.scores.clear();

        let period = self.config.period;
        let cap_d = match self.config.cap_d {
            Some(cap_d) => cap_d,
            None if self.config.seasonal() => {
                seasonal_differences(y, period, self.config.max_cap_d)
            }
            None => 0,
        };
        let seasonally_differenced = if self.config.seasonal() {
            seasonal_difference(y, cap_d, period)
        } else {
            y.to_vec()
        };
        let d = self
            .config
            .d
            .unwrap_or_else(|| ndiffs(&seasonally_differenced, self.config.max_d));
        debug!(d, cap_d, "differencing orders chosen");

        let toggle_intercept = self.config.include_intercept.is_none() && d + cap_d <= 1;
        let intercept = self.config.include_intercept.unwrap_or(d + cap_d <= 1);

        let mut visited: BTreeSet<Order> = BTreeSet::new();
        let mut best: Option<Scored> = None;
        for seed in self.seeds(intercept) {
            visited.insert(seed);
            let Some(candidate) = self.evaluate(series, seed, d, cap_d) else {
                continue;
            };
            let better = match &best {
                Some(incumbent) => {
                    candidate.score < incumbent.score
                        && !scores_tie(candidate.score, incumbent.score)
                }
                None => true,
            };
            if better {
                best = Some(candidate);
            }
        }

        let mut best = best.ok_or_else(|| {
            ForecastError::SearchExhausted(format!(
                "no estimable ARIMA seed for {} observations with d={d}, D={cap_d}",
                y.len()
            ))
        })?;

        for round in 0..self.config.max_iterations {
            let mut improved = false;
            for order in self.neighbors(best.order, toggle_intercept) {
                if !visited.insert(order) {
                    continue;
                }
                let Some(candidate) = self.evaluate(series, order, d, cap_d) else {
                    continue;
                };
                if candidate.score < best.score && !scores_tie(candidate.score, best.score) {
                    best = candidate;
                    improved = true;
                    break;
                }
            }
            if !improved {
                debug!(rounds = round, "stepwise search converged");
                break;
            }
        }

        debug!(selected = %best.model.spec(), aicc = best.score, "AutoARIMA selection");
        self.name = Some(best.model.name().to_string());
        self.selected = Some(best.model);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selected()?.predict(horizon)
    }

    fn standard_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        self.selected()?.standard_errors(horizon)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected.as_ref()?.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected.as_ref()?.residuals()
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("AutoARIMA")
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

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5
            })
            .collect()
    }

    fn random_walk(n: usize) -> Vec<f64> {
        noise(n, 11)
            .iter()
            .scan(50.0, |acc, e| {
                *acc += 2.0 * e;
                Some(*acc)
            })
            .collect()
    }

    #[test]
    fn random_walk_is_differenced() {
        let mut model = AutoARIMA::new();
        model.fit(&make_series(random_walk(200))).unwrap();
        let spec = model.selected_spec().unwrap();
        assert!(spec.d >= 1, "selected {spec}");
        assert!(model.name().starts_with("ARIMA("));
    }

    #[test]
    fn strong_seasonality_is_seasonally_differenced() {
        let profile = [10.0, 25.0, -5.0, -30.0];
        let e = noise(64, 5);
        let values: Vec<f64> = (0..64).map(|i| 100.0 + profile[i % 4] + e[i]).collect();
        let mut model = AutoARIMA::with_period(4);
        model.fit(&make_series(values)).unwrap();
        let spec = model.selected_spec().unwrap();
        assert!(spec.cap_d >= 1, "selected {spec}");
        assert!(model.name().contains("[4]"));
    }

    #[test]
    fn pinned_differencing_is_used() {
        let config = AutoARIMAConfig::default().with_differencing(Some(0), None);
        let mut model = AutoARIMA::with_config(config);
        model.fit(&make_series(random_walk(80))).unwrap();
        assert_eq!(model.selected_spec().unwrap().d, 0);
    }

    #[test]
    fn pinned_seasonal_differencing_needs_a_period() {
        let config = AutoARIMAConfig::default().with_differencing(None, Some(1));
        let mut model = AutoARIMA::with_config(config);
        let err = model.fit(&make_series(random_walk(60))).unwrap_err();
        assert_eq!(err, ForecastError::MissingParameter("seasonal_period".into()));
    }

    #[test]
    fn zero_iterations_keeps_best_seed() {
        let config = AutoARIMAConfig::default().with_max_iterations(0);
        let mut model = AutoARIMA::with_config(config);
        model.fit(&make_series(random_walk(60))).unwrap();
        // Only seeds were evaluated.
        assert!(model.candidate_scores().len() <= 4);
    }

    #[test]
    fn too_short_series_is_rejected() {
        let mut model = AutoARIMA::with_period(12);
        let err = model.fit(&make_series(vec![1.0; 30])).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { needed: 36, got: 30 });
    }

    #[test]
    fn selection_is_deterministic() {
        let values = random_walk(120);
        let mut a = AutoARIMA::new();
        let mut b = AutoARIMA::new();
        a.fit(&make_series(values.clone())).unwrap();
        b.fit(&make_series(values)).unwrap();
        assert_eq!(a.selected_spec(), b.selected_spec());
        assert_eq!(a.predict(6).unwrap().point(), b.predict(6).unwrap().point());
    }

    #[test]
    fn seeds_respect_order_bounds() {
        let config = AutoARIMAConfig::default().with_max_orders(1, 0);
        let model = AutoARIMA::with_config(config);
        for seed in model.seeds(true) {
            assert!(seed.p <= 1 && seed.q == 0);
            assert_eq!(seed.cap_p + seed.cap_q, 0);
        }
    }
}
