//! Text tables as read from tabular sources, and numeric coercion.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SensorError};
use crate::series::{Record, Series};
use crate::time::TimeKind;

/// How to treat cells that are not numbers when building a [`Series`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CellPolicy {
    /// Any non-numeric cell is an error naming its column and row.
    Strict,

    /// Non-numeric cells become missing values (`NaN`), including time cells.
    Lenient,
}

/// A table of text cells with a header row.
///
/// This is the shape of a tabular source before numeric coercion. Every row
/// has exactly one cell per header: short rows are padded with empty cells and
/// surplus cells are dropped.
///
/// # Example
///
/// ```
/// use sensor_types::{CellPolicy, TextTable};
///
/// let mut table = TextTable::new(vec!["time_ms_loc".into(), "x".into()]);
/// table.push_row(vec!["0".into(), "1.5".into()]);
/// table.push_row(vec!["33".into(), "2.5".into()]);
///
/// let series = table.to_series("time_ms_loc", None, CellPolicy::Strict).unwrap();
/// assert_eq!(series.columns(), ["x"]);
/// assert_eq!(series.times(), vec![0.0, 33.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    /// Creates an empty table with the given header.
    #[must_use]
    pub const fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Appends a row, normalizing its width to the header width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Returns the header.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Returns the data rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns the number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the position of a column in the header.
    #[must_use]
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Coerces the table into a numeric [`Series`].
    ///
    /// `value_columns` selects and orders the channels to keep; `None` keeps
    /// every non-time column in header order. The time representation is
    /// [`TimeKind::Integer`] when every parsed time cell is an integer literal.
    ///
    /// # Errors
    ///
    /// Returns an error if the time column or a requested value column is
    /// missing, or, under [`CellPolicy::Strict`], if any used cell is not
    /// numeric.
    pub fn to_series(
        &self,
        time_column: &str,
        value_columns: Option<&[&str]>,
        policy: CellPolicy,
    ) -> Result<Series> {
        let time_index = self
            .column_index(time_column)
            .ok_or_else(|| SensorError::column_not_found(time_column))?;

        let selected: Vec<(usize, String)> = match value_columns {
            Some(names) => names
                .iter()
                .map(|name| {
                    self.column_index(name)
                        .map(|i| (i, (*name).to_string()))
                        .ok_or_else(|| SensorError::column_not_found(*name))
                })
                .collect::<Result<_>>()?,
            None => self
                .headers
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != time_index)
                .map(|(i, h)| (i, h.clone()))
                .collect(),
        };

        let columns: Vec<String> = selected.iter().map(|(_, name)| name.clone()).collect();
        let mut integral = !self.rows.is_empty();
        let mut records = Vec::with_capacity(self.rows.len());

        for (row_index, row) in self.rows.iter().enumerate() {
            let row_number = row_index + 1;
            let time_cell = &row[time_index];
            let time = coerce(time_cell, time_column, row_number, policy)?;
            if time.is_finite() && time_cell.trim().parse::<i64>().is_err() {
                integral = false;
            }

            let values = selected
                .iter()
                .map(|(i, name)| coerce(&row[*i], name, row_number, policy))
                .collect::<Result<Vec<f64>>>()?;
            records.push(Record::new(time, values));
        }

        let kind = if integral {
            TimeKind::Integer
        } else {
            TimeKind::Float
        };
        Series::from_records(time_column, columns, kind, records)
    }
}

/// Parses a text cell as a number.
///
/// Surrounding whitespace is ignored. Returns `None` for empty or
/// non-numeric text.
#[must_use]
pub fn parse_cell(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

fn coerce(text: &str, column: &str, row: usize, policy: CellPolicy) -> Result<f64> {
    match (parse_cell(text), policy) {
        (Some(value), _) => Ok(value),
        (None, CellPolicy::Lenient) => Ok(f64::NAN),
        (None, CellPolicy::Strict) => Err(SensorError::non_numeric(column, row, text)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> TextTable {
        let mut table = TextTable::new(vec!["t".into(), "x".into(), "y".into()]);
        for row in rows {
            table.push_row(row.iter().map(|c| (*c).to_string()).collect());
        }
        table
    }

    #[test]
    fn push_row_normalizes_width() {
        let t = table(&[&["1"], &["1", "2", "3", "4"]]);
        assert_eq!(t.rows()[0], ["1", "", ""]);
        assert_eq!(t.rows()[1], ["1", "2", "3"]);
    }

    #[test]
    fn to_series_keeps_all_columns_by_default() {
        let series = table(&[&["0", "1", "2"], &["10", "3", "4"]])
            .to_series("t", None, CellPolicy::Strict)
            .unwrap();
        assert_eq!(series.columns(), ["x", "y"]);
        assert_eq!(series.time_kind(), TimeKind::Integer);
        assert_eq!(series.records()[1].values(), [3.0, 4.0]);
    }

    #[test]
    fn to_series_selects_and_orders_columns() {
        let series = table(&[&["0", "1", "2"]])
            .to_series("t", Some(&["y", "x"]), CellPolicy::Strict)
            .unwrap();
        assert_eq!(series.columns(), ["y", "x"]);
        assert_eq!(series.records()[0].values(), [2.0, 1.0]);
    }

    #[test]
    fn to_series_missing_columns() {
        let t = table(&[&["0", "1", "2"]]);
        assert!(matches!(
            t.to_series("time", None, CellPolicy::Strict),
            Err(SensorError::ColumnNotFound { column }) if column == "time"
        ));
        assert!(t.to_series("t", Some(&["z"]), CellPolicy::Strict).is_err());
    }

    #[test]
    fn strict_reports_row_and_column() {
        let t = table(&[&["0", "1", "2"], &["10", "oops", "4"]]);
        let err = t.to_series("t", None, CellPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            SensorError::NonNumericCell { ref column, row: 2, ref value }
                if column == "x" && value == "oops"
        ));
    }

    #[test]
    fn lenient_yields_missing_values() {
        let t = table(&[&["0", "", "2"], &["bad", "1", "x"]]);
        let series = t.to_series("t", None, CellPolicy::Lenient).unwrap();
        assert!(series.records()[0].values()[0].is_nan());
        assert!(series.records()[1].time().is_nan());
        assert!(series.records()[1].values()[1].is_nan());
    }

    #[test]
    fn float_times_detected() {
        let series = table(&[&["0", "1", "2"], &["16.5", "1", "2"]])
            .to_series("t", None, CellPolicy::Strict)
            .unwrap();
        assert_eq!(series.time_kind(), TimeKind::Float);
    }

    #[test]
    fn parse_cell_trims() {
        assert_eq!(parse_cell(" 4.25 "), Some(4.25));
        assert_eq!(parse_cell("1e3"), Some(1000.0));
        assert_eq!(parse_cell(""), None);
        assert_eq!(parse_cell("abc"), None);
    }
}
