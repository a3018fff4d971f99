//! Error types for sensor-fusion crate.

use sensor_types::SensorError;
use thiserror::Error;

/// Errors that can occur in alignment operations.
#[derive(Debug, Error)]
pub enum FusionError {
    /// Insufficient data for operation.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Timestamp out of range.
    #[error("timestamp out of range: {timestamp} not in [{min}, {max}]")]
    TimestampOutOfRange {
        /// The requested timestamp.
        timestamp: f64,
        /// Minimum available timestamp.
        min: f64,
        /// Maximum available timestamp.
        max: f64,
    },

    /// A time value that is missing or not finite.
    #[error("invalid timestamp at record {index}: {value}")]
    InvalidTimestamp {
        /// Position of the record in its series.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// Two samples share a time where the kernel needs strictly increasing times.
    #[error("duplicate timestamp {time} not supported by {method} interpolation")]
    DuplicateTimestamp {
        /// The repeated time value.
        time: f64,
        /// Name of the interpolation kernel.
        method: &'static str,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Interpolation method name not recognized.
    #[error("unknown interpolation method: {0}")]
    UnknownMethod(String),

    /// Series layout or column error.
    #[error(transparent)]
    Series(#[from] SensorError),
}

impl FusionError {
    /// Creates an insufficient data error.
    #[must_use]
    pub fn insufficient_data(reason: impl Into<String>) -> Self {
        Self::InsufficientData(reason.into())
    }

    /// Creates a timestamp out of range error.
    #[must_use]
    pub const fn timestamp_out_of_range(timestamp: f64, min: f64, max: f64) -> Self {
        Self::TimestampOutOfRange {
            timestamp,
            min,
            max,
        }
    }

    /// Creates an invalid timestamp error.
    #[must_use]
    pub const fn invalid_timestamp(index: usize, value: f64) -> Self {
        Self::InvalidTimestamp { index, value }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result type for alignment operations.
pub type Result<T> = std::result::Result<T, FusionError>;

/// Fails on the first non-finite time value.
pub(crate) fn check_times(times: &[f64]) -> Result<()> {
    match times.iter().position(|t| !t.is_finite()) {
        Some(index) => Err(FusionError::invalid_timestamp(index, times[index])),
        None => Ok(()),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn error_insufficient_data() {
        let err = FusionError::insufficient_data("need at least 2 samples");
        assert!(err.to_string().contains("insufficient data"));
    }

    #[test]
    fn error_timestamp_out_of_range() {
        let err = FusionError::timestamp_out_of_range(5.0, 0.0, 3.0);
        assert!(err.to_string().contains("timestamp out of range"));
        assert!(err.to_string().contains('5'));
    }

    #[test]
    fn error_invalid_timestamp() {
        let err = FusionError::invalid_timestamp(7, f64::NAN);
        assert!(err.to_string().contains("record 7"));
        assert!(err.to_string().contains("NaN"));
    }

    #[test]
    fn error_invalid_config() {
        let err = FusionError::invalid_config("target frequency must be positive");
        assert!(err.to_string().contains("invalid configuration"));
    }

    #[test]
    fn error_from_series() {
        let err: FusionError = SensorError::column_not_found("gx").into();
        assert!(err.to_string().contains("column not found: gx"));
    }

    #[test]
    fn check_times_finds_first_bad() {
        assert!(check_times(&[0.0, 1.0]).is_ok());
        let err = check_times(&[0.0, f64::INFINITY, f64::NAN]).unwrap_err();
        assert!(matches!(err, FusionError::InvalidTimestamp { index: 1, .. }));
    }
}
