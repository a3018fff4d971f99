//! Error types for sensor file I/O.

use std::path::PathBuf;

use sensor_types::SensorError;
use thiserror::Error;

/// Result type for sensor file I/O.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur while reading or writing sensor files.
#[derive(Debug, Error)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// A directory was given where a file was expected.
    #[error("is a directory: {path}")]
    IsADirectory {
        /// The directory path.
        path: PathBuf,
    },

    /// Malformed delimited text.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The table could not be turned into a series.
    #[error("{path}: {source}")]
    Conversion {
        /// File the table was read from.
        path: PathBuf,
        /// The column or cell problem.
        source: SensorError,
    },
}

impl IoError {
    /// Creates a `FileNotFound` error.
    #[must_use]
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates an `IsADirectory` error.
    #[must_use]
    pub fn is_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::IsADirectory { path: path.into() }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_path() {
        let err = IoError::file_not_found("cases/01/imu.csv");
        assert_eq!(err.to_string(), "file not found: cases/01/imu.csv");

        let err = IoError::is_a_directory("cases");
        assert_eq!(err.to_string(), "is a directory: cases");
    }

    #[test]
    fn conversion_wraps_series_error() {
        let err = IoError::Conversion {
            path: PathBuf::from("cam.csv"),
            source: SensorError::column_not_found("time_ms_loc"),
        };
        let message = err.to_string();
        assert!(message.starts_with("cam.csv: "));
        assert!(message.contains("time_ms_loc"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
