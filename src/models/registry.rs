//! Model registry: the closed set of model identifiers and their schemas.
//!
//! A [`ModelSpec`] pairs a [`ModelKind`] with a [`ModelParams`] set. It is
//! validated against a series before anything is fitted, in a fixed order:
//! identifier, required keys, ranges, missing values, length.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::arima::{ARIMASpec, AutoARIMA, AutoARIMAConfig, ARIMA};
use crate::models::auto_mfles::AutoMFLES;
use crate::models::auto_mstl::AutoMSTL;
use crate::models::baseline::{
    Naive, RandomWalkDrift, SeasonalNaive, SeasonalWindowAverage, SimpleMovingAverage,
};
use crate::models::exponential::{
    AutoETS, AutoETSConfig, ETSSpec, ErrorType, SeasonalType, SmoothingParams, TrendType, ETS,
};
use crate::models::intermittent::{Croston, CrostonVariant, TSB};
use crate::models::mfles::{self, MFLES};
use crate::models::mstl_forecaster::{MSTLForecaster, SeasonalMethod, TrendMethod};
use crate::models::params::{keys, ModelParams, ParamValue};
use crate::models::theta::{OptimizedTheta, Theta};
use crate::models::BoxedForecaster;
use std::fmt;
use std::str::FromStr;

/// Alpha used by the fixed-constant SES when none is supplied.
pub const DEFAULT_SES_ALPHA: f64 = 0.1;

/// Every supported model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKind {
    Naive,
    RandomWalkDrift,
    SMA,
    SeasonalNaive,
    SeasonalWindowAverage,
    SES,
    SESOptimized,
    Holt,
    HoltWinters,
    ETS,
    AutoETS,
    ARIMA,
    AutoARIMA,
    Theta,
    OptimizedTheta,
    MSTL,
    AutoMSTL,
    MFLES,
    AutoMFLES,
    CrostonClassic,
    CrostonSBA,
    CrostonOptimized,
    TSB,
}

impl ModelKind {
    pub const ALL: [ModelKind; 23] = [
        ModelKind::Naive,
        ModelKind::RandomWalkDrift,
        ModelKind::SMA,
        ModelKind::SeasonalNaive,
        ModelKind::SeasonalWindowAverage,
        ModelKind::SES,
        ModelKind::SESOptimized,
        ModelKind::Holt,
        ModelKind::HoltWinters,
        ModelKind::ETS,
        ModelKind::AutoETS,
        ModelKind::ARIMA,
        ModelKind::AutoARIMA,
        ModelKind::Theta,
        ModelKind::OptimizedTheta,
        ModelKind::MSTL,
        ModelKind::AutoMSTL,
        ModelKind::MFLES,
        ModelKind::AutoMFLES,
        ModelKind::CrostonClassic,
        ModelKind::CrostonSBA,
        ModelKind::CrostonOptimized,
        ModelKind::TSB,
    ];

    /// Canonical identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Naive => "Naive",
            ModelKind::RandomWalkDrift => "RandomWalkDrift",
            ModelKind::SMA => "SMA",
            ModelKind::SeasonalNaive => "SeasonalNaive",
            ModelKind::SeasonalWindowAverage => "SeasonalWindowAverage",
            ModelKind::SES => "SES",
            ModelKind::SESOptimized => "SESOptimized",
            ModelKind::Holt => "Holt",
            ModelKind::HoltWinters => "HoltWinters",
            ModelKind::ETS => "ETS",
            ModelKind::AutoETS => "AutoETS",
            ModelKind::ARIMA => "ARIMA",
            ModelKind::AutoARIMA => "AutoARIMA",
            ModelKind::Theta => "Theta",
            ModelKind::OptimizedTheta => "OptimizedTheta",
            ModelKind::MSTL => "MSTL",
            ModelKind::AutoMSTL => "AutoMSTL",
            ModelKind::MFLES => "MFLES",
            ModelKind::AutoMFLES => "AutoMFLES",
            ModelKind::CrostonClassic => "CrostonClassic",
            ModelKind::CrostonSBA => "CrostonSBA",
            ModelKind::CrostonOptimized => "CrostonOptimized",
            ModelKind::TSB => "TSB",
        }
    }

    /// Baselines skip missing values; every other family rejects them.
    pub fn allows_missing(&self) -> bool {
        matches!(
            self,
            ModelKind::Naive
                | ModelKind::RandomWalkDrift
                | ModelKind::SMA
                | ModelKind::SeasonalNaive
                | ModelKind::SeasonalWindowAverage
        )
    }

    /// Whether a seasonal period must always be supplied.
    pub fn requires_seasonal_period(&self) -> bool {
        matches!(
            self,
            ModelKind::SeasonalNaive
                | ModelKind::SeasonalWindowAverage
                | ModelKind::HoltWinters
                | ModelKind::MSTL
                | ModelKind::AutoMSTL
        )
    }

    fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(ModelKind::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    /// Canonical names match exactly; otherwise the name is compared
    /// case-insensitively with `_`, `-` and spaces removed, and a few short
    /// aliases are accepted.
    fn from_str(name: &str) -> Result<Self> {
        if let Some(kind) = Self::ALL.iter().find(|k| k.as_str() == name) {
            return Ok(*kind);
        }
        let normalized: String = name
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        let alias = match normalized.as_str() {
            "snaive" => Some(ModelKind::SeasonalNaive),
            "hw" => Some(ModelKind::HoltWinters),
            "croston" => Some(ModelKind::CrostonClassic),
            "sba" => Some(ModelKind::CrostonSBA),
            "otm" => Some(ModelKind::OptimizedTheta),
            "auto" => Some(ModelKind::AutoETS),
            "rwd" | "randomwalkwithdrift" => Some(ModelKind::RandomWalkDrift),
            _ => None,
        };
        alias
            .or_else(|| {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|k| k.as_str().to_ascii_lowercase() == normalized)
            })
            .ok_or_else(|| {
                ForecastError::UnknownModel(format!(
                    "{name} (supported: {})",
                    Self::supported_list()
                ))
            })
    }
}

/// An unfitted model together with the shortest series it accepts.
struct Plan {
    model: BoxedForecaster,
    min_length: usize,
}

/// A model identifier with its parameters.
///
/// # Example
/// ```
/// use fcst_engine::models::{ModelParams, ModelSpec};
///
/// let spec = ModelSpec::parse("snaive", ModelParams::new().with("seasonal_period", 7)).unwrap();
/// assert_eq!(spec.kind().as_str(), "SeasonalNaive");
/// assert_eq!(spec.min_length().unwrap(), 14);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    kind: ModelKind,
    params: ModelParams,
}

impl ModelSpec {
    pub fn new(kind: ModelKind, params: ModelParams) -> Self {
        Self { kind, params }
    }

    /// Resolve `name` to a model; unknown names are a validation error.
    pub fn parse(name: &str, params: ModelParams) -> Result<Self> {
        Ok(Self::new(name.parse()?, params))
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    /// Shortest series the configured model accepts.
    pub fn min_length(&self) -> Result<usize> {
        Ok(self.plan()?.min_length)
    }

    /// Check keys, ranges, missing values and length against `series`.
    pub fn validate(&self, series: &TimeSeries) -> Result<()> {
        let plan = self.plan()?;
        if series.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if !self.kind.allows_missing() && series.has_missing_values() {
            return Err(ForecastError::MissingValues);
        }
        let got = if self.kind.allows_missing() {
            series.observed_count()
        } else {
            series.len()
        };
        if got < plan.min_length {
            return Err(ForecastError::InsufficientData {
                needed: plan.min_length,
                got,
            });
        }
        Ok(())
    }

    /// Unfitted model configured from the parameters.
    pub fn build(&self) -> Result<BoxedForecaster> {
        Ok(self.plan()?.model)
    }

    fn plan(&self) -> Result<Plan> {
        let p = &self.params;
        let plan = match self.kind {
            ModelKind::Naive => Plan {
                model: Box::new(Naive::new()),
                min_length: 2,
            },
            ModelKind::RandomWalkDrift => Plan {
                model: Box::new(RandomWalkDrift::new()),
                min_length: 2,
            },
            ModelKind::SMA => {
                let window = p.positive_usize(keys::WINDOW)?;
                Plan {
                    model: Box::new(window.map_or_else(
                        SimpleMovingAverage::default,
                        SimpleMovingAverage::new,
                    )),
                    min_length: 2,
                }
            }
            ModelKind::SeasonalNaive => {
                let m = p.require_seasonal_period()?;
                Plan {
                    model: Box::new(SeasonalNaive::new(m)),
                    min_length: (2 * m).max(2),
                }
            }
            ModelKind::SeasonalWindowAverage => {
                let m = p.require_seasonal_period()?;
                let cycles = p
                    .positive_usize(keys::WINDOW)?
                    .unwrap_or(crate::models::baseline::DEFAULT_CYCLES);
                Plan {
                    model: Box::new(SeasonalWindowAverage::new(m, cycles)),
                    min_length: (2 * m).max(2),
                }
            }
            ModelKind::SES => {
                let alpha = p.unit_interval(keys::ALPHA)?.unwrap_or(DEFAULT_SES_ALPHA);
                ets_plan(ETS::ses().with_alpha(alpha))
            }
            ModelKind::SESOptimized => ets_plan(ETS::ses().with_label("SESOptimized")),
            ModelKind::Holt => ets_plan(ETS::holt().with_smoothing(smoothing(p)?)),
            ModelKind::HoltWinters => {
                let m = seasonal_period_above_one(p)?;
                let season = shape(p, keys::SEASON_TYPE, SeasonalType::parse)?
                    .unwrap_or(SeasonalType::Additive);
                if !season.has_season() {
                    return Err(ForecastError::InvalidParameter(
                        "HoltWinters needs an additive or multiplicative season".into(),
                    ));
                }
                ets_plan(ETS::holt_winters(m, season).with_smoothing(seasonal_smoothing(p)?))
            }
            ModelKind::ETS => {
                let error =
                    shape(p, keys::ERROR_TYPE, ErrorType::parse)?.unwrap_or(ErrorType::Additive);
                let trend = shape(p, keys::TREND_TYPE, TrendType::parse)?.unwrap_or_default();
                let season = shape(p, keys::SEASON_TYPE, SeasonalType::parse)?.unwrap_or_default();
                let (m, pinned) = if season.has_season() {
                    (seasonal_period_above_one(p)?, seasonal_smoothing(p)?)
                } else {
                    (1, smoothing(p)?)
                };
                ets_plan(ETS::new(ETSSpec::new(error, trend, season, m)).with_smoothing(pinned))
            }
            ModelKind::AutoETS => {
                let mut config = AutoETSConfig::with_period(p.seasonal_period()?.unwrap_or(1))
                    .allow_multiplicative_trend(
                        p.bool(keys::ALLOW_MULTIPLICATIVE_TREND)?.unwrap_or(false),
                    )
                    .with_smoothing(smoothing(p)?);
                if let Some(error) = shape(p, keys::ERROR_TYPE, ErrorType::parse)? {
                    config = config.with_error(error);
                }
                if let Some(trend) = shape(p, keys::TREND_TYPE, TrendType::parse)? {
                    config = config.with_trend(trend);
                }
                if let Some(season) = shape(p, keys::SEASON_TYPE, SeasonalType::parse)? {
                    if season.has_season() {
                        seasonal_period_above_one(p)?;
                        seasonal_smoothing(p)?;
                    }
                    config = config.with_season(season);
                }
                Plan {
                    min_length: config.min_length(),
                    model: Box::new(AutoETS::with_config(config)),
                }
            }
            ModelKind::ARIMA => {
                let order = |key| p.usize(key).map(|v| v.unwrap_or(0));
                let mut spec = ARIMASpec::new(order(keys::P)?, order(keys::D)?, order(keys::Q)?);
                let (cap_p, cap_d, cap_q) = (
                    order(keys::SEASONAL_P)?,
                    order(keys::SEASONAL_D)?,
                    order(keys::SEASONAL_Q)?,
                );
                if cap_p + cap_d + cap_q > 0 {
                    let m = seasonal_period_above_one(p)?;
                    spec = spec.with_seasonal(cap_p, cap_d, cap_q, m);
                }
                if let Some(include) = p.bool(keys::INCLUDE_INTERCEPT)? {
                    spec = spec.with_intercept(include);
                }
                Plan {
                    min_length: spec.min_length(),
                    model: Box::new(ARIMA::new(spec)),
                }
            }
            ModelKind::AutoARIMA => {
                let config = auto_arima_config(p)?;
                Plan {
                    min_length: config.min_length(),
                    model: Box::new(AutoARIMA::with_config(config)),
                }
            }
            ModelKind::Theta => {
                let mut model = Theta::seasonal(p.seasonal_period()?.unwrap_or(0));
                if let Some(theta) = p.f64_in(keys::THETA, 1.0, f64::MAX)? {
                    model = model.with_theta(theta);
                }
                if let Some(alpha) = p.unit_interval(keys::ALPHA)? {
                    model = model.with_alpha(alpha);
                }
                Plan {
                    min_length: model.min_length(),
                    model: Box::new(model),
                }
            }
            ModelKind::OptimizedTheta => {
                let m = p.seasonal_period()?.unwrap_or(0);
                Plan {
                    min_length: Theta::seasonal(m).min_length(),
                    model: Box::new(OptimizedTheta::seasonal(m)),
                }
            }
            ModelKind::MSTL => {
                let periods = seasonal_periods(p)?;
                let mut model = MSTLForecaster::new(periods);
                if let Some(code) = p.text(keys::TREND_METHOD)? {
                    model = model.with_trend_method(TrendMethod::parse(code).ok_or_else(|| {
                        ForecastError::InvalidParameter(format!("unknown trend_method {code}"))
                    })?);
                }
                if let Some(code) = p.text(keys::SEASONAL_METHOD)? {
                    model =
                        model.with_seasonal_method(SeasonalMethod::parse(code).ok_or_else(|| {
                            ForecastError::InvalidParameter(format!(
                                "unknown seasonal_method {code}"
                            ))
                        })?);
                }
                Plan {
                    min_length: 2 * model.max_period().unwrap_or(1),
                    model: Box::new(model),
                }
            }
            ModelKind::AutoMSTL => {
                let model = AutoMSTL::new(seasonal_periods(p)?);
                Plan {
                    min_length: model.min_length(),
                    model: Box::new(model),
                }
            }
            ModelKind::MFLES => {
                let rate = |key: &str, default: f64| {
                    p.f64_in(key, 0.0, 1.0).map(|v| v.unwrap_or(default))
                };
                let lr_trend = rate(keys::LR_TREND, mfles::DEFAULT_LR_TREND)?;
                let lr_season = rate(keys::LR_SEASON, mfles::DEFAULT_LR_SEASON)?;
                let lr_level = rate(keys::LR_LEVEL, mfles::DEFAULT_LR_LEVEL)?;
                let iterations = p
                    .positive_usize(keys::N_ITERATIONS)?
                    .unwrap_or(mfles::DEFAULT_ITERATIONS);
                let model = MFLES::new(optional_seasonal_periods(p)?)
                    .with_iterations(iterations)
                    .with_learning_rates(lr_trend, lr_season, lr_level);
                Plan {
                    model: Box::new(model),
                    min_length: mfles::MIN_LENGTH,
                }
            }
            ModelKind::AutoMFLES => {
                let model = AutoMFLES::new(optional_seasonal_periods(p)?);
                Plan {
                    min_length: model.min_length(),
                    model: Box::new(model),
                }
            }
            ModelKind::CrostonClassic | ModelKind::CrostonSBA => {
                let variant = if self.kind == ModelKind::CrostonSBA {
                    CrostonVariant::SBA
                } else {
                    CrostonVariant::Classic
                };
                let mut model = Croston::new(variant);
                if let Some(alpha) = p.unit_interval(keys::ALPHA)? {
                    model = model.with_alpha(alpha);
                }
                intermittent_plan(Box::new(model))
            }
            ModelKind::CrostonOptimized => intermittent_plan(Box::new(Croston::optimized())),
            ModelKind::TSB => {
                let alpha_d = p.unit_interval(keys::ALPHA_D)?.unwrap_or(0.1);
                let alpha_p = p.unit_interval(keys::ALPHA_P)?.unwrap_or(0.1);
                intermittent_plan(Box::new(TSB::new().with_params(alpha_d, alpha_p)))
            }
        };
        Ok(plan)
    }
}

fn ets_plan(model: ETS) -> Plan {
    Plan {
        min_length: model.spec().min_length(),
        model: Box::new(model),
    }
}

fn intermittent_plan(model: BoxedForecaster) -> Plan {
    Plan {
        model,
        min_length: crate::models::intermittent::MIN_LENGTH,
    }
}

/// Caller-pinned smoothing constants, each in (0, 1).
fn smoothing(p: &ModelParams) -> Result<SmoothingParams> {
    Ok(SmoothingParams {
        alpha: p.unit_interval(keys::ALPHA)?,
        beta: p.unit_interval(keys::BETA)?,
        gamma: p.unit_interval(keys::GAMMA)?,
        phi: p.unit_interval(keys::PHI)?,
    })
}

/// Pinned smoothing constants for a model with a seasonal component.
fn seasonal_smoothing(p: &ModelParams) -> Result<SmoothingParams> {
    let pinned = smoothing(p)?;
    pinned.check_seasonal()?;
    Ok(pinned)
}

fn seasonal_period_above_one(p: &ModelParams) -> Result<usize> {
    match p.require_seasonal_period()? {
        1 => Err(ForecastError::InvalidParameter(
            "seasonal_period must be greater than 1 for a seasonal model".into(),
        )),
        m => Ok(m),
    }
}

/// `seasonal_periods` list, falling back to the single `seasonal_period`.
fn seasonal_periods(p: &ModelParams) -> Result<Vec<usize>> {
    let periods = match p.usize_list(keys::SEASONAL_PERIODS)? {
        Some(list) if !list.is_empty() => list,
        _ => vec![p.require_seasonal_period()?],
    };
    if let Some(&m) = periods.iter().find(|&&m| m < 2) {
        return Err(ForecastError::InvalidParameter(format!(
            "seasonal periods must be greater than 1, got {m}"
        )));
    }
    Ok(periods)
}

/// `seasonal_periods` or `seasonal_period` when given, otherwise none.
fn optional_seasonal_periods(p: &ModelParams) -> Result<Vec<usize>> {
    match p.usize_list(keys::SEASONAL_PERIODS)? {
        Some(list) if !list.is_empty() => Ok(list),
        _ => Ok(p.seasonal_period()?.into_iter().collect()),
    }
}

/// Shape code given as text or as its integer code.
fn shape<T>(p: &ModelParams, key: &str, parse: fn(&str) -> Option<T>) -> Result<Option<T>> {
    let code = match p.get(key) {
        None => return Ok(None),
        Some(ParamValue::Text(s)) => s.clone(),
        Some(ParamValue::Int(i)) => i.to_string(),
        Some(other) => {
            return Err(ForecastError::InvalidParameter(format!(
                "{key} must be a shape code, got {other:?}"
            )))
        }
    };
    parse(&code)
        .map(Some)
        .ok_or_else(|| ForecastError::InvalidParameter(format!("unknown {key} {code:?}")))
}

fn auto_arima_config(p: &ModelParams) -> Result<AutoARIMAConfig> {
    let defaults = AutoARIMAConfig::default();
    let bounded = |key: &str, default: usize, cap: usize| -> Result<usize> {
        match p.usize(key)?.unwrap_or(default) {
            v if v <= cap => Ok(v),
            v => Err(ForecastError::InvalidParameter(format!(
                "{key} must be at most {cap}, got {v}"
            ))),
        }
    };
    let max_d = bounded(keys::MAX_D, defaults.max_d, 2)?;
    let max_cap_d = bounded(keys::MAX_SEASONAL_D, defaults.max_cap_d, 2)?;
    let d = match p.usize(keys::D)? {
        Some(d) if d > max_d => {
            return Err(ForecastError::InvalidParameter(format!(
                "d must be at most max_d ({max_d}), got {d}"
            )))
        }
        other => other,
    };
    let cap_d = match p.usize(keys::SEASONAL_D)? {
        Some(d) if d > max_cap_d => {
            return Err(ForecastError::InvalidParameter(format!(
                "D must be at most max_D ({max_cap_d}), got {d}"
            )))
        }
        other => other,
    };
    if cap_d.is_some_and(|d| d > 0) {
        seasonal_period_above_one(p)?;
    }
    Ok(
        AutoARIMAConfig::with_period(p.seasonal_period()?.unwrap_or(1))
            .with_max_orders(
                p.usize(keys::MAX_P)?.unwrap_or(defaults.max_p),
                p.usize(keys::MAX_Q)?.unwrap_or(defaults.max_q),
            )
            .with_max_seasonal_orders(
                p.usize(keys::MAX_SEASONAL_P)?.unwrap_or(defaults.max_cap_p),
                p.usize(keys::MAX_SEASONAL_Q)?.unwrap_or(defaults.max_cap_q),
            )
            .with_max_differencing(max_d, max_cap_d)
            .with_differencing(d, cap_d)
            .with_intercept(p.bool(keys::INCLUDE_INTERCEPT)?)
            .with_max_iterations(
                p.usize(keys::MAX_ITERATIONS)?
                    .unwrap_or(defaults.max_iterations),
            ),
    )
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

    fn seasonal_params() -> ModelParams {
        ModelParams::new().with(keys::SEASONAL_PERIOD, 4)
    }

    #[test]
    fn canonical_names_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse::<ModelKind>().unwrap(), kind);
        }
    }

    #[test]
    fn aliases_are_case_insensitive() {
        assert_eq!("seasonal_naive".parse::<ModelKind>().unwrap(), ModelKind::SeasonalNaive);
        assert_eq!("SNAIVE".parse::<ModelKind>().unwrap(), ModelKind::SeasonalNaive);
        assert_eq!("auto_arima".parse::<ModelKind>().unwrap(), ModelKind::AutoARIMA);
        assert_eq!("hw".parse::<ModelKind>().unwrap(), ModelKind::HoltWinters);
        assert_eq!("croston".parse::<ModelKind>().unwrap(), ModelKind::CrostonClassic);
    }

    #[test]
    fn unknown_model_lists_supported_names() {
        let err = "Prophet".parse::<ModelKind>().unwrap_err();
        match err {
            ForecastError::UnknownModel(msg) => {
                assert!(msg.contains("Prophet"));
                assert!(msg.contains("AutoARIMA"));
                assert!(msg.contains("TSB"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn seasonal_models_require_a_period() {
        let series = make_series((0..60).map(|i| 1.0 + i as f64).collect());
        for kind in ModelKind::ALL.into_iter().filter(|k| k.requires_seasonal_period()) {
            let err = ModelSpec::new(kind, ModelParams::new())
                .validate(&series)
                .unwrap_err();
            assert!(
                matches!(err, ForecastError::MissingParameter(_)),
                "{kind}: {err:?}"
            );
        }
    }

    #[test]
    fn seasonal_naive_needs_two_cycles() {
        let spec = ModelSpec::new(
            ModelKind::SeasonalNaive,
            ModelParams::new().with(keys::SEASONAL_PERIOD, 7),
        );
        let err = spec.validate(&make_series(vec![1.0; 6])).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { needed: 14, got: 6 });
    }

    #[test]
    fn arima_order_needs_enough_observations() {
        let spec = ModelSpec::new(
            ModelKind::ARIMA,
            ModelParams::new()
                .with(keys::P, 1)
                .with(keys::D, 1)
                .with(keys::Q, 1),
        );
        let err = spec.validate(&make_series(vec![1.0, 2.0])).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { .. }));
        assert!(err.is_validation());
    }

    #[test]
    fn smoothing_constants_must_be_inside_unit_interval() {
        let spec = ModelSpec::new(ModelKind::SES, ModelParams::new().with(keys::ALPHA, 1.5));
        let err = spec.validate(&make_series(vec![1.0; 10])).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
    }

    #[test]
    fn ranges_are_checked_before_length() {
        let spec = ModelSpec::new(
            ModelKind::Holt,
            ModelParams::new().with(keys::BETA, 0.0),
        );
        let err = spec.validate(&make_series(vec![1.0])).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
    }

    #[test]
    fn missing_values_only_for_baselines() {
        let series = TimeSeries::from_optional(
            make_series(vec![0.0; 12]).timestamps().to_vec(),
            (0..12)
                .map(|i| if i == 5 { None } else { Some(10.0 + i as f64) })
                .collect(),
        )
        .unwrap();
        ModelSpec::new(ModelKind::Naive, ModelParams::new())
            .validate(&series)
            .unwrap();
        let err = ModelSpec::new(ModelKind::Holt, ModelParams::new())
            .validate(&series)
            .unwrap_err();
        assert_eq!(err, ForecastError::MissingValues);
    }

    #[test]
    fn ets_shape_codes_accept_text_and_integers() {
        let spec = ModelSpec::new(
            ModelKind::ETS,
            seasonal_params()
                .with(keys::ERROR_TYPE, "M")
                .with(keys::TREND_TYPE, 2)
                .with(keys::SEASON_TYPE, "A"),
        );
        let model = spec.build().unwrap();
        assert_eq!(model.name(), "ETS(M,Ad,A)");
        assert_eq!(spec.min_length().unwrap(), 8);
    }

    #[test]
    fn unknown_shape_code_is_invalid() {
        let spec = ModelSpec::new(
            ModelKind::ETS,
            ModelParams::new().with(keys::TREND_TYPE, "X"),
        );
        assert!(matches!(
            spec.build(),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn auto_arima_differencing_is_capped() {
        let spec = ModelSpec::new(
            ModelKind::AutoARIMA,
            ModelParams::new().with(keys::MAX_D, 3),
        );
        assert!(matches!(
            spec.build(),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn pinned_seasonal_search_needs_a_period() {
        let series = make_series((0..40).map(|i| 10.0 + (i % 4) as f64).collect());
        let ets = ModelSpec::new(
            ModelKind::AutoETS,
            ModelParams::new().with(keys::SEASON_TYPE, "A"),
        );
        let err = ets.validate(&series).unwrap_err();
        assert!(matches!(err, ForecastError::MissingParameter(_)), "{err:?}");

        let arima = ModelSpec::new(
            ModelKind::AutoARIMA,
            ModelParams::new().with(keys::SEASONAL_D, 1),
        );
        let err = arima.validate(&series).unwrap_err();
        assert!(matches!(err, ForecastError::MissingParameter(_)), "{err:?}");

        let non_seasonal = ModelSpec::new(
            ModelKind::AutoETS,
            ModelParams::new().with(keys::SEASON_TYPE, "N"),
        );
        non_seasonal.validate(&series).unwrap();
        let no_seasonal_diff = ModelSpec::new(
            ModelKind::AutoARIMA,
            ModelParams::new().with(keys::SEASONAL_D, 0),
        );
        no_seasonal_diff.validate(&series).unwrap();
    }

    #[test]
    fn pinned_alpha_and_gamma_must_admit_a_season() {
        let params = seasonal_params()
            .with(keys::ALPHA, 0.9)
            .with(keys::GAMMA, 0.5);
        let series = make_series((0..40).map(|i| 10.0 + (i % 4) as f64).collect());
        for kind in [ModelKind::HoltWinters, ModelKind::AutoETS, ModelKind::ETS] {
            let params = params.clone().with(keys::SEASON_TYPE, "A");
            let err = ModelSpec::new(kind, params).validate(&series).unwrap_err();
            assert!(matches!(err, ForecastError::InvalidParameter(_)), "{kind}: {err:?}");
            assert!(err.is_validation());
        }
        let holt = ModelSpec::new(ModelKind::Holt, params);
        holt.validate(&series).unwrap();
    }

    #[test]
    fn mstl_accepts_period_lists() {
        let spec = ModelSpec::new(
            ModelKind::MSTL,
            ModelParams::new().with(keys::SEASONAL_PERIODS, vec![7_i64, 30]),
        );
        assert_eq!(spec.min_length().unwrap(), 60);
        let auto = ModelSpec::new(ModelKind::AutoMSTL, spec.params().clone());
        assert_eq!(auto.min_length().unwrap(), 90);
    }

    #[test]
    fn mfles_periods_are_optional_and_rates_checked() {
        let plain = ModelSpec::new(ModelKind::MFLES, ModelParams::new());
        assert_eq!(plain.min_length().unwrap(), 4);
        let auto = ModelSpec::new(
            ModelKind::AutoMFLES,
            ModelParams::new().with(keys::SEASONAL_PERIODS, vec![7_i64, 12]),
        );
        assert_eq!(auto.min_length().unwrap(), 36);
        assert_eq!("auto_mfles".parse::<ModelKind>().unwrap(), ModelKind::AutoMFLES);

        let tuned = ModelSpec::new(
            ModelKind::MFLES,
            seasonal_params()
                .with(keys::N_ITERATIONS, 8)
                .with(keys::LR_TREND, 1.0)
                .with(keys::LR_SEASON, 0.0),
        );
        assert!(tuned.build().is_ok());
        for (key, value) in [(keys::LR_LEVEL, 1.5), (keys::LR_TREND, -0.1)] {
            let spec = ModelSpec::new(ModelKind::MFLES, ModelParams::new().with(key, value));
            assert!(matches!(
                spec.build(),
                Err(ForecastError::InvalidParameter(_))
            ));
        }
        let spec = ModelSpec::new(
            ModelKind::MFLES,
            ModelParams::new().with(keys::N_ITERATIONS, 0),
        );
        assert!(matches!(
            spec.build(),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn every_model_builds_with_a_seasonal_period() {
        for kind in ModelKind::ALL {
            let model = ModelSpec::new(kind, seasonal_params()).build().unwrap();
            assert!(!model.is_fitted(), "{kind}");
        }
    }
}
