//! Per-group execution: validate, fit, forecast and attach metadata.
//!
//! [`forecast_series`] runs one group; [`forecast_groups`] fans the same
//! operation out over independent groups, optionally in parallel, keeping
//! each group's failure to itself.

mod orchestrator;
mod result;

pub use orchestrator::{forecast_groups, forecast_series, EngineConfig};
pub use result::{ForecastResult, ForecastRow, ForecastStep, GroupForecast};
