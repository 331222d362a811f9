//! Forecast result structure for holding predictions.

use crate::error::{ForecastError, Result};

/// A forecast containing point predictions and optional interval bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: None,
            upper: None,
        }
    }

    /// Create a forecast with prediction intervals.
    ///
    /// All three vectors must have the same length.
    pub fn from_values_with_intervals(
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self> {
        if lower.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: values.len(),
                got: lower.len(),
            });
        }
        if upper.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: values.len(),
                got: upper.len(),
            });
        }
        Ok(Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
        })
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Check if forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    /// Lower bounds, if intervals were computed.
    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    /// Upper bounds, if intervals were computed.
    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    /// Interval width at every step, if intervals were computed.
    pub fn widths(&self) -> Option<Vec<f64>> {
        let lower = self.lower.as_ref()?;
        let upper = self.upper.as_ref()?;
        Some(upper.iter().zip(lower).map(|(u, l)| u - l).collect())
    }

    /// Consume the forecast into `(point, lower, upper)`.
    pub fn into_parts(self) -> (Vec<f64>, Option<Vec<f64>>, Option<Vec<f64>>) {
        (self.point, self.lower, self.upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_only_forecast() {
        let forecast = Forecast::from_values(vec![1.0, 2.0, 3.0]);
        assert_eq!(forecast.horizon(), 3);
        assert!(!forecast.has_intervals());
        assert!(forecast.widths().is_none());
    }

    #[test]
    fn forecast_with_intervals_reports_widths() {
        let forecast =
            Forecast::from_values_with_intervals(vec![1.0, 2.0], vec![0.5, 1.0], vec![1.5, 3.0])
                .unwrap();
        assert!(forecast.has_intervals());
        assert_eq!(forecast.widths().unwrap(), vec![1.0, 2.0]);
        assert_eq!(forecast.lower().unwrap(), &[0.5, 1.0]);
    }

    #[test]
    fn mismatched_bounds_are_rejected() {
        let result = Forecast::from_values_with_intervals(vec![1.0, 2.0], vec![0.5], vec![1.5, 2.5]);
        assert!(matches!(
            result,
            Err(ForecastError::DimensionMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn empty_forecast() {
        let forecast = Forecast::new();
        assert!(forecast.is_empty());
        assert_eq!(forecast.horizon(), 0);
    }
}
