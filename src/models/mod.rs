//! Forecasting models.
//!
//! Every family implements [`Forecaster`]; the [`registry`] maps model
//! identifiers and parameter sets onto configured, unfitted models.

mod traits;

pub mod arima;
pub mod auto_mfles;
pub mod auto_mstl;
pub mod baseline;
pub mod exponential;
pub mod intermittent;
pub mod mfles;
pub mod mstl_forecaster;
pub mod params;
pub mod registry;
pub mod theta;

pub use auto_mfles::AutoMFLES;
pub use auto_mstl::AutoMSTL;
pub use mfles::{LevelSmoother, MFLES};
pub use mstl_forecaster::{MSTLForecaster, SeasonalMethod, TrendMethod};
pub use params::{ModelParams, ParamValue};
pub use registry::{ModelKind, ModelSpec};
pub use traits::{BoxedForecaster, Forecaster};
