//! TimeSeries data structure for one group's ordered history.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Utc};

/// An ordered univariate series of `(timestamp, value)` pairs.
///
/// Timestamps are strictly increasing. A missing observation is stored as
/// `f64::NAN`; any non-finite value is treated as missing.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a univariate series, validating lengths and timestamp order.
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        for (i, pair) in timestamps.windows(2).enumerate() {
            if pair[1] == pair[0] {
                return Err(ForecastError::TimestampError(format!(
                    "duplicate timestamp {} at position {}",
                    pair[1],
                    i + 1
                )));
            }
            if pair[1] < pair[0] {
                return Err(ForecastError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        Ok(Self { timestamps, values })
    }

    /// Create a series where `None` marks an explicitly missing value.
    pub fn from_optional(
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<Option<f64>>,
    ) -> Result<Self> {
        let values = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        Self::univariate(timestamps, values)
    }

    /// Get the number of observations (missing ones included).
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get values, with `NaN` marking missing observations.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Last timestamp of the series.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Check if the series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Number of observed (finite) values.
    pub fn observed_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }

    /// Observed values in order, skipping missing ones.
    pub fn observed_values(&self) -> Vec<f64> {
        self.values.iter().copied().filter(|v| v.is_finite()).collect()
    }

    /// Mean spacing between consecutive timestamps.
    ///
    /// Returns `None` for series shorter than two observations.
    pub fn mean_interval(&self) -> Option<Duration> {
        let n = self.timestamps.len();
        if n < 2 {
            return None;
        }
        let span = self.timestamps[n - 1] - self.timestamps[0];
        let millis = span.num_milliseconds() / (n as i64 - 1);
        Some(Duration::milliseconds(millis))
    }

    /// Return the sub-series `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end || end > self.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "slice [{start}, {end}) out of range for series of length {}",
                self.len()
            )));
        }
        Ok(Self {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        })
    }
}
