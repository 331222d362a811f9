//! # fcst-engine
//!
//! Embedded forecasting engine for grouped time series.
//!
//! Every model implements [`models::Forecaster`]: fit on a series, produce a
//! point forecast, and add prediction intervals at a chosen confidence level.
//! Models are looked up by name through [`models::ModelSpec`], and
//! [`engine::forecast_groups`] runs one model over many independent groups
//! in parallel.
//!
//! Families:
//! - baselines (Naive, SeasonalNaive, SMA, SeasonalWindowAverage, RandomWalkWithDrift)
//! - exponential smoothing (SES, Holt, Holt-Winters, ETS, AutoETS)
//! - ARIMA and AutoARIMA
//! - MSTL decomposition forecasting and AutoMSTL
//! - MFLES gradient-boosted decomposition and AutoMFLES
//! - Theta and OptimizedTheta
//! - intermittent demand (Croston variants, TSB)

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod engine;
pub mod error;
pub mod intervals;
pub mod models;
pub mod seasonality;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, TimeSeries};
    pub use crate::engine::{
        forecast_groups, forecast_series, EngineConfig, ForecastResult, GroupForecast,
    };
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{Forecaster, ModelKind, ModelParams, ModelSpec};
}
