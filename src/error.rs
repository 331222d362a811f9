//! Error types for the forecasting engine.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Broad class of a [`ForecastError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any numerical work was attempted.
    Validation,
    /// Numerical work was attempted and failed (including exhausted searches).
    FitFailure,
}

/// Errors that can occur during forecasting operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the chosen model.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The model identifier is not registered.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// A required parameter was not supplied.
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Timestamps and values disagree in length.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Computation error (non-convergence, divergent recursion).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Estimated coefficients are non-stationary or non-invertible.
    #[error("non-invertible coefficients: {0}")]
    NonInvertible(String),

    /// The series has no usable variation for the requested model.
    #[error("degenerate series: {0}")]
    DegenerateSeries(String),

    /// An automatic search found no admissible candidate.
    #[error("search exhausted: {0}")]
    SearchExhausted(String),
}

impl ForecastError {
    /// Classify the error as a validation error or a fit failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::EmptyData
            | ForecastError::InsufficientData { .. }
            | ForecastError::UnknownModel(_)
            | ForecastError::MissingParameter(_)
            | ForecastError::InvalidParameter(_)
            | ForecastError::DimensionMismatch { .. }
            | ForecastError::TimestampError(_)
            | ForecastError::MissingValues => ErrorKind::Validation,
            ForecastError::FitRequired
            | ForecastError::ComputationError(_)
            | ForecastError::NonInvertible(_)
            | ForecastError::DegenerateSeries(_)
            | ForecastError::SearchExhausted(_) => ErrorKind::FitFailure,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}
