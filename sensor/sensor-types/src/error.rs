//! Error types for series construction and coercion.

use thiserror::Error;

/// Errors that can occur when building or converting sensor series.
#[derive(Debug, Error)]
pub enum SensorError {
    /// A required column is not present in the header.
    #[error("column not found: {column}")]
    ColumnNotFound {
        /// Name of the missing column.
        column: String,
    },

    /// A cell could not be coerced to a number where one is mandatory.
    #[error("non-numeric cell in column '{column}' at row {row}: {value:?}")]
    NonNumericCell {
        /// Column holding the cell.
        column: String,
        /// 1-based data row (the header is not counted).
        row: usize,
        /// The offending text.
        value: String,
    },

    /// A column name appears more than once in a header.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    /// Record width does not match the series' column count.
    #[error("record width mismatch: expected {expected} values, got {actual}")]
    WidthMismatch {
        /// Number of value columns in the series.
        expected: usize,
        /// Number of values in the record.
        actual: usize,
    },
}

impl SensorError {
    /// Creates a column not found error.
    #[must_use]
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Creates a non-numeric cell error.
    #[must_use]
    pub fn non_numeric(column: impl Into<String>, row: usize, value: impl Into<String>) -> Self {
        Self::NonNumericCell {
            column: column.into(),
            row,
            value: value.into(),
        }
    }

    /// Creates a record width mismatch error.
    #[must_use]
    pub const fn width_mismatch(expected: usize, actual: usize) -> Self {
        Self::WidthMismatch { expected, actual }
    }
}

/// Result type for series operations.
pub type Result<T> = std::result::Result<T, SensorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_column_not_found() {
        let err = SensorError::column_not_found("time_ms_loc");
        let msg = format!("{err}");
        assert!(msg.contains("column not found"));
        assert!(msg.contains("time_ms_loc"));
    }

    #[test]
    fn error_non_numeric() {
        let err = SensorError::non_numeric("ax", 12, "n/a");
        let msg = format!("{err}");
        assert!(msg.contains("'ax'"));
        assert!(msg.contains("row 12"));
        assert!(msg.contains("n/a"));
    }

    #[test]
    fn error_width_mismatch() {
        let err = SensorError::width_mismatch(3, 2);
        let msg = format!("{err}");
        assert!(msg.contains('3'));
        assert!(msg.contains('2'));
    }
}
