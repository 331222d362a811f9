//! Exponential smoothing models.
//!
//! - ETS (Error-Trend-Seasonal) state-space framework covering every
//!   combination of error, trend and season shape
//! - SES, Holt and Holt-Winters as ETS presets
//! - AutoETS (automatic model selection)

mod auto_ets;
mod ets;

pub use auto_ets::{AutoETS, AutoETSConfig};
pub use ets::{ETSSpec, ErrorType, SeasonalType, SmoothingParams, TrendType, ETS};
