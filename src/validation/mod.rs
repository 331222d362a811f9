//! Statistical tests used when choosing differencing orders.

pub mod stationarity;

pub use stationarity::{kpss_test, ndiffs, KpssResult};
