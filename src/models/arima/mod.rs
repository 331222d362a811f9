//! ARIMA and seasonal ARIMA models.
//!
//! - ARIMA(p,d,q)(P,D,Q)\[s\] estimated by conditional sum of squares
//! - AutoARIMA for automatic order selection

mod auto_arima;
pub mod diff;
mod model;
pub mod polynomial;

pub use auto_arima::{AutoARIMA, AutoARIMAConfig};
pub use diff::{difference, seasonal_difference};
pub use model::{ARIMASpec, ARIMA};
