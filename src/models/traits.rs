//! Forecaster trait defining the lifecycle shared by every model family.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;
use crate::intervals::{self, UncertaintyShape};

/// Common interface for all forecasting models.
///
/// A model is created unfitted from a validated specification, fitted once
/// against a series, and then queried. The trait is object-safe and is used
/// as `Box<dyn Forecaster>` by the registry.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Generate point predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Standard error of the forecast at each step `1..=horizon`.
    ///
    /// Entries may be non-finite when the model has no usable estimate;
    /// the interval layer then falls back to a fixed fraction of the point.
    fn standard_errors(&self, horizon: usize) -> Result<Vec<f64>>;

    /// How the model's documented uncertainty evolves with the step.
    fn uncertainty_shape(&self) -> UncertaintyShape {
        UncertaintyShape::Growing
    }

    /// Generate predictions with a two-sided interval at `level`.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let point = self.predict(horizon)?;
        let se = self.standard_errors(horizon)?;
        intervals::build_forecast(point.point(), &se, level, self.uncertainty_shape())
    }

    /// One-step-ahead in-sample predictions aligned to the training window.
    ///
    /// Positions without a prediction hold `NaN`. A family with no notion of
    /// one-step-ahead fitted values returns an empty slice once fitted.
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Residuals (actual - fitted), aligned like [`Forecaster::fitted_values`].
    fn residuals(&self) -> Option<&[f64]>;

    /// Model name. After fitting a search model this names the selected variant.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use fcst_engine::models::{BoxedForecaster, Forecaster};
/// use fcst_engine::models::baseline::Naive;
///
/// let model: BoxedForecaster = Box::new(Naive::new());
/// assert_eq!(model.name(), "Naive");
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;
