//! Utility functions for forecasting models.

pub mod optimization;
pub mod stats;

pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{aicc, gaussian_log_likelihood, quantile_normal};
