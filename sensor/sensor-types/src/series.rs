//! Ordered timestamped series of numeric records.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SensorError};
use crate::table::TextTable;
use crate::time::{TimeKind, TimeRange};

/// One sample of a stream: a time value plus one value per channel.
///
/// Records are immutable snapshots. Missing channel values are stored as
/// `f64::NAN`.
///
/// # Example
///
/// ```
/// use sensor_types::Record;
///
/// let record = Record::new(10.0, vec![0.1, 9.81]);
/// let shifted = record.with_time(25.0);
///
/// assert_eq!(shifted.time(), 25.0);
/// assert_eq!(shifted.values(), record.values());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Record {
    time: f64,
    values: Vec<f64>,
}

impl Record {
    /// Creates a new record.
    #[must_use]
    pub const fn new(time: f64, values: Vec<f64>) -> Self {
        Self { time, values }
    }

    /// Returns the time value.
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Returns the channel values in series column order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the value of the channel at `index`.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Returns a copy of this record with a different time value.
    #[must_use]
    pub fn with_time(&self, time: f64) -> Self {
        Self {
            time,
            values: self.values.clone(),
        }
    }

    /// Returns the number of channel values.
    #[must_use]
    pub fn width(&self) -> usize {
        self.values.len()
    }
}

/// An ordered sequence of [`Record`]s sharing one designated time column.
///
/// The series owns the column layout: `columns` names the non-time channels
/// and every record carries exactly one value per column. Record order is
/// preserved as given; operations that need sorted input sort internally.
///
/// # Example
///
/// ```
/// use sensor_types::{Record, Series, TimeKind};
///
/// let series = Series::from_records(
///     "time_ms_loc",
///     vec!["ax".to_string()],
///     TimeKind::Integer,
///     vec![Record::new(0.0, vec![1.0]), Record::new(33.0, vec![2.0])],
/// )
/// .unwrap();
///
/// assert_eq!(series.len(), 2);
/// assert_eq!(series.times(), vec![0.0, 33.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Series {
    time_column: String,
    columns: Vec<String>,
    time_kind: TimeKind,
    records: Vec<Record>,
}

impl Series {
    /// Creates an empty series with the given layout.
    ///
    /// # Errors
    ///
    /// Returns an error if a column name is repeated or equals the time column.
    pub fn new(time_column: impl Into<String>, columns: Vec<String>) -> Result<Self> {
        let time_column = time_column.into();
        check_layout(&time_column, &columns)?;
        Ok(Self {
            time_column,
            columns,
            time_kind: TimeKind::default(),
            records: Vec::new(),
        })
    }

    /// Creates a series from existing records.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout is invalid or any record's width differs
    /// from the number of columns.
    pub fn from_records(
        time_column: impl Into<String>,
        columns: Vec<String>,
        time_kind: TimeKind,
        records: Vec<Record>,
    ) -> Result<Self> {
        let time_column = time_column.into();
        check_layout(&time_column, &columns)?;
        if let Some(bad) = records.iter().find(|r| r.width() != columns.len()) {
            return Err(SensorError::width_mismatch(columns.len(), bad.width()));
        }
        Ok(Self {
            time_column,
            columns,
            time_kind,
            records,
        })
    }

    /// Returns a series with the same layout and kind but different records.
    ///
    /// # Errors
    ///
    /// Returns an error if any record's width differs from the column count.
    pub fn with_records(&self, records: Vec<Record>) -> Result<Self> {
        Self::from_records(
            self.time_column.clone(),
            self.columns.clone(),
            self.time_kind,
            records,
        )
    }

    /// Sets the time representation.
    #[must_use]
    pub fn with_time_kind(mut self, time_kind: TimeKind) -> Self {
        self.time_kind = time_kind;
        self
    }

    /// Appends a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record's width differs from the column count.
    pub fn push(&mut self, record: Record) -> Result<()> {
        if record.width() != self.columns.len() {
            return Err(SensorError::width_mismatch(self.columns.len(), record.width()));
        }
        self.records.push(record);
        Ok(())
    }

    /// Returns the name of the time column.
    #[must_use]
    pub fn time_column(&self) -> &str {
        &self.time_column
    }

    /// Returns the non-time column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the time representation.
    #[must_use]
    pub const fn time_kind(&self) -> TimeKind {
        self.time_kind
    }

    /// Returns the records in order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consumes the series and returns its records.
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the series has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Returns the index of a non-time column.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::ColumnNotFound`] if the column does not exist.
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| SensorError::column_not_found(column))
    }

    /// Returns all time values in record order.
    #[must_use]
    pub fn times(&self) -> Vec<f64> {
        self.records.iter().map(Record::time).collect()
    }

    /// Returns all values of one column in record order.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist.
    pub fn column_values(&self, column: &str) -> Result<Vec<f64>> {
        let index = self.column_index(column)?;
        Ok(self.records.iter().map(|r| r.values[index]).collect())
    }

    /// Returns the range spanned by the finite time values.
    ///
    /// Returns `None` if there are no finite time values.
    #[must_use]
    pub fn time_range(&self) -> Option<TimeRange> {
        let mut finite = self.records.iter().map(Record::time).filter(|t| t.is_finite());
        let first = finite.next()?;
        let (min, max) = finite.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
        Some(TimeRange::new(min, max))
    }

    /// Renders the series as a text table.
    ///
    /// The header is the time column followed by the value columns. Missing
    /// values become empty cells.
    #[must_use]
    pub fn to_table(&self) -> TextTable {
        let mut headers = Vec::with_capacity(self.columns.len() + 1);
        headers.push(self.time_column.clone());
        headers.extend(self.columns.iter().cloned());

        let mut table = TextTable::new(headers);
        for record in &self.records {
            let mut row = Vec::with_capacity(record.width() + 1);
            row.push(format_cell(self.time_kind.represent(record.time)));
            row.extend(record.values.iter().map(|v| format_cell(*v)));
            table.push_row(row);
        }
        table
    }
}

fn check_layout(time_column: &str, columns: &[String]) -> Result<()> {
    for (i, column) in columns.iter().enumerate() {
        if column == time_column || columns[..i].contains(column) {
            return Err(SensorError::DuplicateColumn(column.clone()));
        }
    }
    Ok(())
}

/// Formats a numeric cell for text output.
///
/// Whole numbers print without a fractional part; `NaN` prints as an empty cell.
#[must_use]
pub fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn imu() -> Series {
        Series::from_records(
            "timestamp_ns",
            vec!["ax".to_string(), "ay".to_string()],
            TimeKind::Integer,
            vec![
                Record::new(20.0, vec![1.0, 2.0]),
                Record::new(10.0, vec![3.0, f64::NAN]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn series_layout_rejects_duplicates() {
        let err = Series::new("t", vec!["a".to_string(), "a".to_string()]);
        assert!(matches!(err, Err(SensorError::DuplicateColumn(c)) if c == "a"));

        let err = Series::new("t", vec!["t".to_string()]);
        assert!(err.is_err());
    }

    #[test]
    fn series_rejects_wrong_width() {
        let err = Series::from_records(
            "t",
            vec!["a".to_string()],
            TimeKind::Float,
            vec![Record::new(0.0, vec![1.0, 2.0])],
        );
        assert!(matches!(
            err,
            Err(SensorError::WidthMismatch {
                expected: 1,
                actual: 2
            })
        ));

        let mut series = Series::new("t", vec!["a".to_string()]).unwrap();
        assert!(series.push(Record::new(0.0, vec![])).is_err());
        assert!(series.push(Record::new(0.0, vec![1.0])).is_ok());
    }

    #[test]
    fn series_column_access() {
        let series = imu();
        assert_eq!(series.column_index("ay").unwrap(), 1);
        assert!(series.column_index("az").is_err());
        assert_eq!(series.column_values("ax").unwrap(), vec![1.0, 3.0]);
        assert_eq!(series.times(), vec![20.0, 10.0]);
    }

    #[test]
    fn series_time_range_ignores_order_and_nan() {
        let series = imu()
            .with_records(vec![
                Record::new(20.0, vec![0.0, 0.0]),
                Record::new(f64::NAN, vec![0.0, 0.0]),
                Record::new(10.0, vec![0.0, 0.0]),
            ])
            .unwrap();
        let range = series.time_range().unwrap();
        assert_eq!(range.start, 10.0);
        assert_eq!(range.end, 20.0);

        let empty = Series::new("t", vec![]).unwrap();
        assert!(empty.time_range().is_none());
    }

    #[test]
    fn series_to_table() {
        let table = imu().to_table();
        assert_eq!(table.headers(), ["timestamp_ns", "ax", "ay"]);
        assert_eq!(table.rows()[0], ["20", "1", "2"]);
        assert_eq!(table.rows()[1], ["10", "3", ""]);
    }

    #[test]
    fn integer_kind_truncates_on_output() {
        let series = Series::from_records(
            "t",
            vec![],
            TimeKind::Integer,
            vec![Record::new(65.5, vec![])],
        )
        .unwrap();
        assert_eq!(series.to_table().rows()[0], ["65"]);

        let float = series.with_time_kind(TimeKind::Float);
        assert_eq!(float.to_table().rows()[0], ["65.5"]);
    }

    #[test]
    fn format_cell_values() {
        assert_eq!(format_cell(1.5), "1.5");
        assert_eq!(format_cell(-3.0), "-3");
        assert_eq!(format_cell(f64::NAN), "");
    }
}
