//! Forecast results as handed back to the host.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One horizon step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastStep {
    /// 1-based step index.
    pub step: usize,
    /// `None` when timestamp generation is disabled.
    pub timestamp: Option<DateTime<Utc>>,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Forecast for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Model actually used; names the selected variant for searches.
    pub model: String,
    pub confidence_level: f64,
    pub steps: Vec<ForecastStep>,
    /// One-step-ahead fitted values over the training window, when requested.
    pub fitted: Option<Vec<f64>>,
}

/// A flattened step carrying the result-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub step: usize,
    pub timestamp: Option<DateTime<Utc>>,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
    pub model: String,
    pub confidence_level: f64,
}

impl ForecastResult {
    pub fn horizon(&self) -> usize {
        self.steps.len()
    }

    pub fn point(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.point).collect()
    }

    pub fn lower(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.lower).collect()
    }

    pub fn upper(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.upper).collect()
    }

    /// One row per step, in step order.
    pub fn rows(&self) -> Vec<ForecastRow> {
        self.steps
            .iter()
            .map(|s| ForecastRow {
                step: s.step,
                timestamp: s.timestamp,
                point: s.point,
                lower: s.lower,
                upper: s.upper,
                model: self.model.clone(),
                confidence_level: self.confidence_level,
            })
            .collect()
    }
}

/// Outcome for one group of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupForecast<K> {
    pub key: K,
    pub result: Result<ForecastResult>,
}

impl<K> GroupForecast<K> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn forecast(&self) -> Option<&ForecastResult> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ForecastError> {
        self.result.as_ref().err()
    }

    /// Rows tagged with the group key; empty for a failed group.
    pub fn rows(&self) -> Vec<(K, ForecastRow)>
    where
        K: Clone,
    {
        self.forecast()
            .map(|f| {
                f.rows()
                    .into_iter()
                    .map(|row| (self.key.clone(), row))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> ForecastResult {
        ForecastResult {
            model: "Naive".into(),
            confidence_level: 0.9,
            steps: (1..=3)
                .map(|step| ForecastStep {
                    step,
                    timestamp: None,
                    point: 10.0,
                    lower: 8.0,
                    upper: 12.0,
                })
                .collect(),
            fitted: None,
        }
    }

    #[test]
    fn rows_carry_metadata() {
        let rows = result().rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].step, 3);
        assert!(rows.iter().all(|r| r.model == "Naive" && r.confidence_level == 0.9));
    }

    #[test]
    fn failed_group_has_no_rows() {
        let group = GroupForecast::<&str> {
            key: "a",
            result: Err(ForecastError::EmptyData),
        };
        assert!(!group.is_ok());
        assert!(group.rows().is_empty());
        assert_eq!(group.error(), Some(&ForecastError::EmptyData));
    }

    #[test]
    fn group_rows_are_keyed() {
        let group = GroupForecast {
            key: 7_u32,
            result: Ok(result()),
        };
        assert!(group.rows().iter().all(|(k, _)| *k == 7));
    }
}
