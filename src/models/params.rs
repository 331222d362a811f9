//! Key-value model parameters with typed, validating accessors.

use crate::error::{ForecastError, Result};
use crate::intervals::{validate_level, DEFAULT_CONFIDENCE_LEVEL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Recognized parameter keys.
pub mod keys {
    pub const SEASONAL_PERIOD: &str = "seasonal_period";
    pub const SEASON_LENGTH: &str = "season_length";
    pub const SEASONAL_PERIODS: &str = "seasonal_periods";
    pub const ALPHA: &str = "alpha";
    pub const BETA: &str = "beta";
    pub const GAMMA: &str = "gamma";
    pub const PHI: &str = "phi";
    pub const WINDOW: &str = "window";
    pub const THETA: &str = "theta";
    pub const ERROR_TYPE: &str = "error_type";
    pub const TREND_TYPE: &str = "trend_type";
    pub const SEASON_TYPE: &str = "season_type";
    pub const P: &str = "p";
    pub const D: &str = "d";
    pub const Q: &str = "q";
    pub const SEASONAL_P: &str = "P";
    pub const SEASONAL_D: &str = "D";
    pub const SEASONAL_Q: &str = "Q";
    pub const INCLUDE_INTERCEPT: &str = "include_intercept";
    pub const MAX_P: &str = "max_p";
    pub const MAX_Q: &str = "max_q";
    pub const MAX_D: &str = "max_d";
    pub const MAX_SEASONAL_P: &str = "max_P";
    pub const MAX_SEASONAL_Q: &str = "max_Q";
    pub const MAX_SEASONAL_D: &str = "max_D";
    pub const ALPHA_D: &str = "alpha_d";
    pub const ALPHA_P: &str = "alpha_p";
    pub const TREND_METHOD: &str = "trend_method";
    pub const SEASONAL_METHOD: &str = "seasonal_method";
    pub const ALLOW_MULTIPLICATIVE_TREND: &str = "allow_multiplicative_trend";
    pub const MAX_ITERATIONS: &str = "max_iterations";
    pub const N_ITERATIONS: &str = "n_iterations";
    pub const LR_TREND: &str = "lr_trend";
    pub const LR_SEASON: &str = "lr_season";
    pub const LR_LEVEL: &str = "lr_level";
    pub const CONFIDENCE_LEVEL: &str = "confidence_level";
    pub const INCLUDE_FITTED: &str = "include_fitted";
    pub const GENERATE_TIMESTAMPS: &str = "generate_timestamps";
}

/// A single parameter value as supplied by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<i64>),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(i64::from(v))
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<Vec<i64>> for ParamValue {
    fn from(v: Vec<i64>) -> Self {
        ParamValue::List(v)
    }
}

/// Parameter set for one model specification.
///
/// Unknown keys are kept but ignored by every model. Iteration order is
/// sorted by key so that equal parameter sets behave identically.
///
/// # Example
///
/// ```
/// use fcst_engine::models::ModelParams;
///
/// let params = ModelParams::new()
///     .with("seasonal_period", 7)
///     .with("alpha", 0.3);
/// assert_eq!(params.seasonal_period().unwrap(), Some(7));
/// assert_eq!(params.unit_interval("alpha").unwrap(), Some(0.3));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    entries: BTreeMap<String, ParamValue>,
}

impl ModelParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.entries.iter()
    }

    /// Real-valued parameter; integers are widened.
    pub fn f64(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Float(v)) if v.is_finite() => Ok(Some(*v)),
            Some(ParamValue::Int(v)) => Ok(Some(*v as f64)),
            Some(other) => Err(type_error(key, "a finite number", other)),
        }
    }

    /// Non-negative integer parameter; integral floats are accepted.
    pub fn usize(&self, key: &str) -> Result<Option<usize>> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Int(v)) => usize::try_from(*v).map(Some).map_err(|_| {
                ForecastError::InvalidParameter(format!("{key} must be non-negative, got {v}"))
            }),
            Some(ParamValue::Float(v)) if v.fract() == 0.0 && *v >= 0.0 && v.is_finite() => {
                Ok(Some(*v as usize))
            }
            Some(other) => Err(type_error(key, "a non-negative integer", other)),
        }
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Bool(v)) => Ok(Some(*v)),
            Some(ParamValue::Int(0)) => Ok(Some(false)),
            Some(ParamValue::Int(1)) => Ok(Some(true)),
            Some(ParamValue::Text(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(ParamValue::Text(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(other) => Err(type_error(key, "a boolean", other)),
        }
    }

    pub fn text(&self, key: &str) -> Result<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Text(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(type_error(key, "text", other)),
        }
    }

    /// List of positive integers; a single integer is treated as a one-element list.
    pub fn usize_list(&self, key: &str) -> Result<Option<Vec<usize>>> {
        let raw = match self.get(key) {
            None => return Ok(None),
            Some(ParamValue::List(v)) => v.clone(),
            Some(ParamValue::Int(v)) => vec![*v],
            Some(other) => return Err(type_error(key, "a list of integers", other)),
        };
        raw.iter()
            .map(|&v| match usize::try_from(v) {
                Ok(u) if u > 0 => Ok(u),
                _ => Err(ForecastError::InvalidParameter(format!(
                    "{key} entries must be positive, got {v}"
                ))),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Real parameter strictly inside (0, 1).
    pub fn unit_interval(&self, key: &str) -> Result<Option<f64>> {
        match self.f64(key)? {
            Some(v) if v > 0.0 && v < 1.0 => Ok(Some(v)),
            Some(v) => Err(ForecastError::InvalidParameter(format!(
                "{key} must be in (0, 1), got {v}"
            ))),
            None => Ok(None),
        }
    }

    /// Real parameter inside a closed range.
    pub fn f64_in(&self, key: &str, lo: f64, hi: f64) -> Result<Option<f64>> {
        match self.f64(key)? {
            Some(v) if v >= lo && v <= hi => Ok(Some(v)),
            Some(v) => Err(ForecastError::InvalidParameter(format!(
                "{key} must be in [{lo}, {hi}], got {v}"
            ))),
            None => Ok(None),
        }
    }

    /// Positive integer parameter.
    pub fn positive_usize(&self, key: &str) -> Result<Option<usize>> {
        match self.usize(key)? {
            Some(0) => Err(ForecastError::InvalidParameter(format!(
                "{key} must be positive, got 0"
            ))),
            other => Ok(other),
        }
    }

    /// Seasonal period from `seasonal_period` (or its alias `season_length`).
    pub fn seasonal_period(&self) -> Result<Option<usize>> {
        match self.positive_usize(keys::SEASONAL_PERIOD)? {
            Some(m) => Ok(Some(m)),
            None => self.positive_usize(keys::SEASON_LENGTH),
        }
    }

    /// Seasonal period that must be present.
    pub fn require_seasonal_period(&self) -> Result<usize> {
        self.seasonal_period()?
            .ok_or_else(|| ForecastError::MissingParameter(keys::SEASONAL_PERIOD.to_string()))
    }

    /// Confidence level, defaulting to [`DEFAULT_CONFIDENCE_LEVEL`].
    pub fn confidence_level(&self) -> Result<f64> {
        let level = self
            .f64(keys::CONFIDENCE_LEVEL)?
            .unwrap_or(DEFAULT_CONFIDENCE_LEVEL);
        validate_level(level)?;
        Ok(level)
    }

    pub fn include_fitted(&self) -> Result<bool> {
        Ok(self.bool(keys::INCLUDE_FITTED)?.unwrap_or(false))
    }

    pub fn generate_timestamps(&self) -> Result<bool> {
        Ok(self.bool(keys::GENERATE_TIMESTAMPS)?.unwrap_or(true))
    }
}

fn type_error(key: &str, expected: &str, got: &ParamValue) -> ForecastError {
    ForecastError::InvalidParameter(format!("{key} must be {expected}, got {got:?}"))
}
