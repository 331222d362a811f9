//! ETS (Error-Trend-Seasonal) state-space forecasting model.
//!
//! A model is the product of an error shape {A, M}, a trend shape
//! {N, A, Ad, M, Md} and a season shape {N, A, M}: 30 combinations.
//! The level, trend and seasonal states are updated once per observation.
//! Smoothing constants, damping and the initial level/trend are estimated by
//! maximum likelihood with a bounded Nelder-Mead search; the initial seasonal
//! indices come from a detrended average of the first cycles.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{aicc, linear_fit, VARIANCE_FLOOR};
use std::fmt;

/// Bounds for optimized smoothing constants.
const SMOOTHING_BOUNDS: (f64, f64) = (1e-4, 0.9999);
/// Bounds for an optimized damping factor.
const DAMPING_BOUNDS: (f64, f64) = (0.8, 0.98);
/// Smallest admissible state for multiplicative components.
const POSITIVE_FLOOR: f64 = 1e-10;

/// Error component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ErrorType {
    #[default]
    Additive,
    Multiplicative,
}

/// Trend component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TrendType {
    #[default]
    None,
    Additive,
    AdditiveDamped,
    Multiplicative,
    MultiplicativeDamped,
}

/// Seasonal component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SeasonalType {
    #[default]
    None,
    Additive,
    Multiplicative,
}

impl ErrorType {
    pub const ALL: [ErrorType; 2] = [ErrorType::Additive, ErrorType::Multiplicative];

    pub fn code(&self) -> &'static str {
        match self {
            ErrorType::Additive => "A",
            ErrorType::Multiplicative => "M",
        }
    }

    /// Parse `"A"`/`"M"` (case-insensitive) or the integer codes 0/1.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "A" | "0" | "ADDITIVE" => Some(ErrorType::Additive),
            "M" | "1" | "MULTIPLICATIVE" => Some(ErrorType::Multiplicative),
            _ => None,
        }
    }
}

impl TrendType {
    pub const ALL: [TrendType; 5] = [
        TrendType::None,
        TrendType::Additive,
        TrendType::AdditiveDamped,
        TrendType::Multiplicative,
        TrendType::MultiplicativeDamped,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            TrendType::None => "N",
            TrendType::Additive => "A",
            TrendType::AdditiveDamped => "Ad",
            TrendType::Multiplicative => "M",
            TrendType::MultiplicativeDamped => "Md",
        }
    }

    /// Parse `N`/`A`/`Ad`/`M`/`Md` (case-insensitive) or the integer codes 0..=4.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "N" | "0" | "NONE" => Some(TrendType::None),
            "A" | "1" | "ADDITIVE" => Some(TrendType::Additive),
            "AD" | "2" => Some(TrendType::AdditiveDamped),
            "M" | "3" | "MULTIPLICATIVE" => Some(TrendType::Multiplicative),
            "MD" | "4" => Some(TrendType::MultiplicativeDamped),
            _ => None,
        }
    }

    pub fn has_trend(&self) -> bool {
        *self != TrendType::None
    }

    pub fn is_damped(&self) -> bool {
        matches!(
            self,
            TrendType::AdditiveDamped | TrendType::MultiplicativeDamped
        )
    }

    pub fn is_multiplicative(&self) -> bool {
        matches!(
            self,
            TrendType::Multiplicative | TrendType::MultiplicativeDamped
        )
    }
}

impl SeasonalType {
    pub const ALL: [SeasonalType; 3] = [
        SeasonalType::None,
        SeasonalType::Additive,
        SeasonalType::Multiplicative,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            SeasonalType::None => "N",
            SeasonalType::Additive => "A",
            SeasonalType::Multiplicative => "M",
        }
    }

    /// Parse `N`/`A`/`M` (case-insensitive) or the integer codes 0..=2.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "N" | "0" | "NONE" => Some(SeasonalType::None),
            "A" | "1" | "ADDITIVE" => Some(SeasonalType::Additive),
            "M" | "2" | "MULTIPLICATIVE" => Some(SeasonalType::Multiplicative),
            _ => None,
        }
    }

    pub fn has_season(&self) -> bool {
        *self != SeasonalType::None
    }
}

/// ETS model specification: the three shapes plus the seasonal period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ETSSpec {
    pub error: ErrorType,
    pub trend: TrendType,
    pub seasonal: SeasonalType,
    /// Seasonal period; ignored when `seasonal` is `None`.
    pub period: usize,
}

impl ETSSpec {
    pub fn new(error: ErrorType, trend: TrendType, seasonal: SeasonalType, period: usize) -> Self {
        Self {
            error,
            trend,
            seasonal,
            period: if seasonal.has_season() { period } else { 1 },
        }
    }

    /// ETS(A,N,N): simple exponential smoothing.
    pub fn ann() -> Self {
        Self::new(ErrorType::Additive, TrendType::None, SeasonalType::None, 1)
    }

    /// ETS(A,A,N): Holt's linear trend.
    pub fn aan() -> Self {
        Self::new(ErrorType::Additive, TrendType::Additive, SeasonalType::None, 1)
    }

    /// Whether any component is multiplicative, which requires positive data.
    pub fn needs_positive_data(&self) -> bool {
        self.error == ErrorType::Multiplicative
            || self.trend.is_multiplicative()
            || self.seasonal == SeasonalType::Multiplicative
    }

    /// Number of seasonal states carried.
    pub fn season_len(&self) -> usize {
        if self.seasonal.has_season() {
            self.period.max(1)
        } else {
            0
        }
    }

    /// Minimum series length for a fit.
    pub fn min_length(&self) -> usize {
        if self.seasonal.has_season() {
            2 * self.period.max(1)
        } else {
            3
        }
    }

    /// Deterministic precedence used to break score ties: additive before
    /// multiplicative, undamped before damped.
    pub fn precedence(&self) -> (ErrorType, TrendType, SeasonalType) {
        (self.error, self.trend, self.seasonal)
    }
}

impl fmt::Display for ETSSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ETS({},{},{})",
            self.error.code(),
            self.trend.code(),
            self.seasonal.code()
        )
    }
}

/// Smoothing constants; `None` means "estimate".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SmoothingParams {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
    pub phi: Option<f64>,
}

impl SmoothingParams {
    /// Pinned `gamma` and `alpha` must leave the seasonal recursion admissible,
    /// `gamma <= 1 - alpha`.
    pub fn check_seasonal(&self) -> Result<()> {
        match (self.alpha, self.gamma) {
            (Some(alpha), Some(gamma)) if gamma > 1.0 - alpha => {
                Err(ForecastError::InvalidParameter(format!(
                    "gamma ({gamma}) must not exceed 1 - alpha ({}) for a seasonal model",
                    1.0 - alpha
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Concrete parameter values used by the recursion.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Params {
    alpha: f64,
    beta: f64,
    gamma: f64,
    phi: f64,
}

/// Level, trend and seasonal state. `season[0]` applies to the next observation.
#[derive(Debug, Clone, PartialEq)]
struct State {
    level: f64,
    trend: f64,
    season: Vec<f64>,
}

/// Output of one pass of the recursion over the training data.
#[derive(Debug, Clone)]
struct Pass {
    sse: f64,
    sum_log_abs_fitted: f64,
    fitted: Vec<f64>,
    state: State,
}

fn positive(x: f64) -> bool {
    x.is_finite() && x > POSITIVE_FLOOR
}

/// Run the state-space recursion. Returns `None` when any state diverges.
fn run_recursion(spec: &ETSSpec, p: &Params, init: &State, y: &[f64]) -> Option<Pass> {
    let mut level = init.level;
    let mut trend = init.trend;
    let mut season = init.season.clone();
    let seasonal = spec.seasonal.has_season();

    let mut sse = 0.0;
    let mut sum_log_abs_fitted = 0.0;
    let mut fitted = Vec::with_capacity(y.len());

    for &obs in y {
        let damped_trend = match spec.trend {
            TrendType::None => 0.0,
            TrendType::Additive => trend,
            TrendType::AdditiveDamped => p.phi * trend,
            TrendType::Multiplicative => trend,
            TrendType::MultiplicativeDamped => trend.powf(p.phi),
        };
        let base = match spec.trend {
            TrendType::None => level,
            TrendType::Additive | TrendType::AdditiveDamped => level + damped_trend,
            TrendType::Multiplicative | TrendType::MultiplicativeDamped => {
                if !positive(level) || !positive(trend) {
                    return None;
                }
                level * damped_trend
            }
        };
        let s = if seasonal { season[0] } else { 0.0 };
        let yhat = match spec.seasonal {
            SeasonalType::None => base,
            SeasonalType::Additive => base + s,
            SeasonalType::Multiplicative => {
                if !positive(s) || !positive(base) {
                    return None;
                }
                base * s
            }
        };
        if !yhat.is_finite() {
            return None;
        }

        let error = match spec.error {
            ErrorType::Additive => obs - yhat,
            ErrorType::Multiplicative => {
                if !positive(yhat) {
                    return None;
                }
                sum_log_abs_fitted += yhat.ln();
                (obs - yhat) / yhat
            }
        };
        sse += error * error;
        fitted.push(yhat);

        let deseasonalized = match spec.seasonal {
            SeasonalType::None => obs,
            SeasonalType::Additive => obs - s,
            SeasonalType::Multiplicative => obs / s,
        };
        let new_level = base + p.alpha * (deseasonalized - base);
        let new_trend = match spec.trend {
            TrendType::None => 0.0,
            TrendType::Additive | TrendType::AdditiveDamped => {
                damped_trend + p.beta * ((new_level - level) - damped_trend)
            }
            TrendType::Multiplicative | TrendType::MultiplicativeDamped => {
                damped_trend + p.beta * (new_level / level - damped_trend)
            }
        };
        if seasonal {
            let target = match spec.seasonal {
                SeasonalType::Additive => obs - base,
                _ => obs / base,
            };
            let new_season = s + p.gamma * (target - s);
            season.remove(0);
            season.push(new_season);
        }
        level = new_level;
        trend = new_trend;
        if !level.is_finite() || !trend.is_finite() || !sse.is_finite() {
            return None;
        }
    }

    Some(Pass {
        sse,
        sum_log_abs_fitted,
        fitted,
        state: State {
            level,
            trend,
            season,
        },
    })
}

/// Log-likelihood of a pass with the variance concentrated out.
fn log_likelihood(pass: &Pass, n: usize) -> f64 {
    let nf = n as f64;
    let sigma2 = (pass.sse / nf).max(VARIANCE_FLOOR);
    -0.5 * nf * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0) - pass.sum_log_abs_fitted
}

/// Heuristic initial state from a linear fit over the first cycles.
fn initial_state(spec: &ETSSpec, y: &[f64]) -> State {
    let m = spec.season_len();
    let window = if m > 1 {
        (y.len() / m).clamp(1, 4) * m
    } else {
        y.len().min(10)
    };
    let head = &y[..window.min(y.len())];
    let (intercept, slope) = linear_fit(head);

    let mut season = Vec::new();
    if m > 0 {
        let cycles = head.len() / m;
        let multiplicative = spec.seasonal == SeasonalType::Multiplicative;
        for j in 0..m {
            let mut acc = 0.0;
            for c in 0..cycles.max(1) {
                let t = c * m + j;
                if t >= head.len() {
                    continue;
                }
                let line = intercept + slope * t as f64;
                acc += if multiplicative {
                    head[t] / line
                } else {
                    head[t] - line
                };
            }
            season.push(acc / cycles.max(1) as f64);
        }
        if multiplicative {
            let mean = season.iter().sum::<f64>() / m as f64;
            if positive(mean) {
                season.iter_mut().for_each(|s| *s /= mean);
            }
        } else {
            let mean = season.iter().sum::<f64>() / m as f64;
            season.iter_mut().for_each(|s| *s -= mean);
        }
    }

    let (level, trend) = match spec.trend {
        TrendType::None => (intercept, 0.0),
        TrendType::Additive | TrendType::AdditiveDamped => (intercept - slope, slope),
        TrendType::Multiplicative | TrendType::MultiplicativeDamped => {
            let growth = if positive(intercept) {
                (1.0 + slope / intercept).clamp(0.5, 2.0)
            } else {
                1.0
            };
            (intercept / growth, growth)
        }
    };

    State {
        level,
        trend,
        season,
    }
}

/// Which parameters the optimizer moves, in vector order.
#[derive(Debug, Clone, Copy)]
struct Layout {
    alpha: bool,
    beta: bool,
    gamma: bool,
    phi: bool,
    trend_state: bool,
}

impl Layout {
    fn new(spec: &ETSSpec, pinned: &SmoothingParams) -> Self {
        Self {
            alpha: pinned.alpha.is_none(),
            beta: spec.trend.has_trend() && pinned.beta.is_none(),
            gamma: spec.seasonal.has_season() && pinned.gamma.is_none(),
            phi: spec.trend.is_damped() && pinned.phi.is_none(),
            trend_state: spec.trend.has_trend(),
        }
    }

    fn free_smoothing(&self) -> usize {
        [self.alpha, self.beta, self.gamma, self.phi]
            .iter()
            .filter(|&&b| b)
            .count()
    }
}

/// Decode an optimizer vector into parameters and initial state.
fn decode(
    x: &[f64],
    layout: &Layout,
    pinned: &SmoothingParams,
    template: &State,
) -> (Params, State) {
    let mut it = x.iter().copied();
    let mut take = |free: bool, fixed: Option<f64>, default: f64| {
        if free {
            it.next().unwrap_or(default)
        } else {
            fixed.unwrap_or(default)
        }
    };
    let alpha = take(layout.alpha, pinned.alpha, 0.3);
    let beta = take(layout.beta, pinned.beta, 0.1);
    let gamma = take(layout.gamma, pinned.gamma, 0.05);
    let phi = take(layout.phi, pinned.phi, 1.0);
    let level = take(true, None, template.level);
    let trend = take(layout.trend_state, None, template.trend);
    (
        Params {
            alpha,
            beta,
            gamma,
            phi,
        },
        State {
            level,
            trend,
            season: template.season.clone(),
        },
    )
}

/// ETS forecasting model.
///
/// # Example
/// ```
/// use fcst_engine::core::TimeSeries;
/// use fcst_engine::models::exponential::ETS;
/// use fcst_engine::models::Forecaster;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let timestamps: Vec<_> = (0..30).map(|i| base + Duration::days(i)).collect();
/// let values: Vec<f64> = (0..30).map(|i| 10.0 + 0.5 * i as f64).collect();
/// let series = TimeSeries::univariate(timestamps, values).unwrap();
///
/// let mut model = ETS::holt();
/// model.fit(&series).unwrap();
/// let forecast = model.predict(3).unwrap();
/// assert!(forecast.point()[0] > 24.0);
/// ```
#[derive(Debug, Clone)]
pub struct ETS {
    spec: ETSSpec,
    pinned: SmoothingParams,
    name: String,
    optimizer: NelderMeadConfig,
    params: Option<Params>,
    state: Option<State>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: f64,
    log_likelihood: f64,
    n: usize,
}

impl ETS {
    pub fn new(spec: ETSSpec) -> Self {
        Self {
            spec,
            pinned: SmoothingParams::default(),
            name: spec.to_string(),
            optimizer: NelderMeadConfig::default().with_max_iter(800),
            params: None,
            state: None,
            fitted: None,
            residuals: None,
            sigma2: f64::NAN,
            log_likelihood: f64::NAN,
            n: 0,
        }
    }

    /// Simple exponential smoothing, ETS(A,N,N).
    pub fn ses() -> Self {
        Self::new(ETSSpec::ann()).with_label("SES")
    }

    /// Holt's linear trend, ETS(A,A,N).
    pub fn holt() -> Self {
        Self::new(ETSSpec::aan()).with_label("Holt")
    }

    /// Holt-Winters with additive trend and the given season shape.
    pub fn holt_winters(period: usize, seasonal: SeasonalType) -> Self {
        Self::new(ETSSpec::new(
            ErrorType::Additive,
            TrendType::Additive,
            seasonal,
            period,
        ))
        .with_label("HoltWinters")
    }

    /// Display name override for presets.
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.name = label.to_string();
        self
    }

    /// Hold the given smoothing constants fixed during estimation.
    pub fn with_smoothing(mut self, pinned: SmoothingParams) -> Self {
        self.pinned = pinned;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.pinned.alpha = Some(alpha);
        self
    }

    pub fn with_optimizer(mut self, config: NelderMeadConfig) -> Self {
        self.optimizer = config;
        self
    }

    pub fn spec(&self) -> &ETSSpec {
        &self.spec
    }

    pub fn alpha(&self) -> Option<f64> {
        self.params.map(|p| p.alpha)
    }

    pub fn beta(&self) -> Option<f64> {
        self.params
            .filter(|_| self.spec.trend.has_trend())
            .map(|p| p.beta)
    }

    pub fn gamma(&self) -> Option<f64> {
        self.params
            .filter(|_| self.spec.seasonal.has_season())
            .map(|p| p.gamma)
    }

    pub fn phi(&self) -> Option<f64> {
        self.params
            .filter(|_| self.spec.trend.is_damped())
            .map(|p| p.phi)
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Number of estimated parameters, including initial states and the variance.
    pub fn num_params(&self) -> usize {
        let layout = Layout::new(&self.spec, &self.pinned);
        let seasonal_states = self.spec.season_len().saturating_sub(1);
        layout.free_smoothing() + 1 + usize::from(layout.trend_state) + seasonal_states + 1
    }

    /// Corrected AIC, `None` before fitting or when undefined for the sample size.
    pub fn aicc(&self) -> Option<f64> {
        self.params?;
        aicc(self.log_likelihood, self.num_params(), self.n)
    }

    fn validate_input(&self, y: &[f64]) -> Result<()> {
        if y.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        if self.spec.seasonal.has_season() && self.spec.period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal ETS requires seasonal_period > 1, got {}",
                self.spec.period
            )));
        }
        if self.spec.seasonal.has_season() {
            self.pinned.check_seasonal()?;
        }
        let needed = self.spec.min_length();
        if y.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: y.len(),
            });
        }
        if self.spec.needs_positive_data() && y.iter().any(|&v| v <= 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "{} has multiplicative components and requires strictly positive data",
                self.spec
            )));
        }
        Ok(())
    }

    fn initial_vector(&self, layout: &Layout, template: &State) -> (Vec<f64>, Vec<(f64, f64)>) {
        let mut x = Vec::new();
        let mut bounds = Vec::new();
        if layout.alpha {
            x.push(0.3);
            bounds.push(SMOOTHING_BOUNDS);
        }
        if layout.beta {
            x.push(0.1);
            bounds.push(SMOOTHING_BOUNDS);
        }
        if layout.gamma {
            x.push(0.05);
            bounds.push(SMOOTHING_BOUNDS);
        }
        if layout.phi {
            x.push(0.95);
            bounds.push(DAMPING_BOUNDS);
        }
        x.push(template.level);
        bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        if layout.trend_state {
            x.push(template.trend);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        (x, bounds)
    }

    /// Cumulative damping `phi + phi^2 + ... + phi^h`.
    fn damped_sum(&self, phi: f64, h: usize) -> f64 {
        if self.spec.trend.is_damped() {
            (1..=h).map(|i| phi.powi(i as i32)).sum()
        } else {
            h as f64
        }
    }
}

impl Forecaster for ETS {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let y = series.values();
        self.validate_input(y)?;

        let spec = self.spec;
        let pinned = self.pinned;
        let layout = Layout::new(&spec, &pinned);
        let template = initial_state(&spec, y);
        let (x0, bounds) = self.initial_vector(&layout, &template);
        let n = y.len();

        let objective = |x: &[f64]| -> f64 {
            let (p, init) = decode(x, &layout, &pinned, &template);
            if spec.seasonal.has_season() && p.gamma > 1.0 - p.alpha {
                return f64::INFINITY;
            }
            match run_recursion(&spec, &p, &init, y) {
                Some(pass) => -log_likelihood(&pass, n),
                None => f64::INFINITY,
            }
        };

        // A restart from the first optimum escapes early simplex collapse.
        let first = nelder_mead(&objective, &x0, Some(&bounds), self.optimizer.clone());
        let second = nelder_mead(
            &objective,
            &first.optimal_point,
            Some(&bounds),
            self.optimizer.clone(),
        );
        let best = if second.optimal_value <= first.optimal_value {
            second
        } else {
            first
        };
        if !best.optimal_value.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "{}: recursion diverged for every parameter candidate",
                spec
            )));
        }

        let (params, init) = decode(&best.optimal_point, &layout, &pinned, &template);
        let pass = run_recursion(&spec, &params, &init, y).ok_or_else(|| {
            ForecastError::ComputationError(format!("{spec}: recursion diverged"))
        })?;

        let residuals: Vec<f64> = y.iter().zip(&pass.fitted).map(|(a, f)| a - f).collect();
        self.sigma2 = (pass.sse / n as f64).max(VARIANCE_FLOOR);
        self.log_likelihood = log_likelihood(&pass, n);
        self.n = n;
        self.params = Some(params);
        self.state = Some(pass.state);
        self.fitted = Some(pass.fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        let p = self.params.ok_or(ForecastError::FitRequired)?;
        let m = self.spec.season_len();

        let values = (1..=horizon)
            .map(|h| {
                let steps = self.damped_sum(p.phi, h);
                let base = match self.spec.trend {
                    TrendType::None => state.level,
                    TrendType::Additive | TrendType::AdditiveDamped => {
                        state.level + steps * state.trend
                    }
                    TrendType::Multiplicative | TrendType::MultiplicativeDamped => {
                        state.level * state.trend.powf(steps)
                    }
                };
                match self.spec.seasonal {
                    SeasonalType::None => base,
                    SeasonalType::Additive => base + state.season[(h - 1) % m],
                    SeasonalType::Multiplicative => base * state.season[(h - 1) % m],
                }
            })
            .collect();
        Ok(Forecast::from_values(values))
    }

    /// Closed-form variance `sigma^2 (1 + sum c_j^2)` with
    /// `c_j = alpha (1 + beta * sum_{i<=j} phi^i) + gamma [j mod m == 0]`.
    /// Multiplicative variants scale the relative error by the point forecast.
    fn standard_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        let p = self.params.ok_or(ForecastError::FitRequired)?;
        let point = self.predict(horizon)?;
        let m = self.spec.season_len();
        let trend = self.spec.trend.has_trend();

        let mut cumulative = 0.0;
        let mut out = Vec::with_capacity(horizon);
        for h in 1..=horizon {
            if h > 1 {
                let j = h - 1;
                let mut c = p.alpha;
                if trend {
                    c += p.alpha * p.beta * self.damped_sum(p.phi, j);
                }
                if m > 0 && j % m == 0 {
                    c += p.gamma;
                }
                cumulative += c * c;
            }
            let var = self.sigma2 * (1.0 + cumulative);
            let se = match self.spec.error {
                ErrorType::Additive => var.sqrt(),
                ErrorType::Multiplicative => var.sqrt() * point.point()[h - 1].abs(),
            };
            out.push(se);
        }
        Ok(out)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
