//! Timestamp gap detection and midpoint filling for reference streams.
//!
//! Camera frame timestamps occasionally skip a frame. Filling inserts one
//! synthetic record at the midpoint of every gap larger than a threshold,
//! copying the preceding record's channels. A gap spanning several frame
//! periods still receives a single record.
//!
//! [`fill_table_gaps`] does the same on a text table, parsing only the time
//! column so label or file-name columns pass through untouched.

use sensor_types::{CellPolicy, SensorError, Series, TextTable, format_cell};
use tracing::{debug, info};

use crate::error::{FusionError, Result, check_times};

/// A pair of adjacent records whose time delta exceeds the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    /// Index of the earlier record of the pair.
    pub index: usize,
    /// Time of the earlier record.
    pub start: f64,
    /// Time of the later record.
    pub end: f64,
}

impl Gap {
    /// Returns the observed time delta.
    #[must_use]
    pub fn delta(&self) -> f64 {
        self.end - self.start
    }

    /// Returns `start + delta / 2`.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        self.start + self.delta() / 2.0
    }
}

/// Finds every adjacent pair with `curr - prev > gap_threshold`.
///
/// Pairs are taken in record order. A threshold of zero or below makes every
/// strictly increasing pair a gap; with a negative threshold, pairs with equal
/// times count as well.
///
/// # Errors
///
/// Returns an error if the threshold is `NaN` or a time value is not finite.
pub fn detect_gaps(series: &Series, gap_threshold: f64) -> Result<Vec<Gap>> {
    if gap_threshold.is_nan() {
        return Err(FusionError::invalid_config("gap threshold must be a number"));
    }
    let times = series.times();
    check_times(&times)?;

    Ok(times
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[1] - w[0] > gap_threshold)
        .map(|(index, w)| Gap {
            index,
            start: w[0],
            end: w[1],
        })
        .collect())
}

/// Inserts one synthetic record into every gap.
///
/// The synthetic record copies the earlier record of the pair and takes the
/// gap midpoint as its time, truncated toward zero when the series' time
/// column is integral. Series with fewer than two records are returned
/// unchanged.
///
/// # Errors
///
/// Same conditions as [`detect_gaps`].
///
/// # Example
///
/// ```
/// use sensor_fusion::fill_gaps;
/// use sensor_types::{Record, Series, TimeKind};
///
/// let camera = Series::from_records(
///     "time_ms_loc",
///     vec![],
///     TimeKind::Integer,
///     [0.0, 10.0, 100.0].iter().map(|&t| Record::new(t, vec![])).collect(),
/// )
/// .unwrap();
///
/// let filled = fill_gaps(&camera, 40.0).unwrap();
/// assert_eq!(filled.times(), vec![0.0, 10.0, 55.0, 100.0]);
/// ```
pub fn fill_gaps(series: &Series, gap_threshold: f64) -> Result<Series> {
    let gaps = detect_gaps(series, gap_threshold)?;
    if gaps.is_empty() {
        return Ok(series.clone());
    }

    let kind = series.time_kind();
    let records = series.records();
    let mut filled = Vec::with_capacity(records.len() + gaps.len());
    let mut pending = gaps.iter().peekable();

    for (index, record) in records.iter().enumerate() {
        filled.push(record.clone());
        if let Some(gap) = pending.next_if(|g| g.index == index) {
            let time = kind.represent(gap.midpoint());
            debug!(
                start = gap.start,
                end = gap.end,
                delta = gap.delta(),
                inserted = time,
                "Filling timestamp gap"
            );
            filled.push(record.with_time(time));
        }
    }

    info!(
        column = series.time_column(),
        records = records.len(),
        gaps = gaps.len(),
        threshold = gap_threshold,
        "Filled timestamp gaps"
    );

    Ok(series.with_records(filled)?)
}

/// Inserts one synthetic row into every gap of a text table.
///
/// Only the time column is parsed, strictly. Every other cell is copied
/// verbatim from the earlier row of the pair, so text columns and the
/// original spelling of numbers survive. The synthetic time cell is the gap
/// midpoint, truncated toward zero when every time cell is an integer.
///
/// # Errors
///
/// Returns an error if the time column is missing or holds a non-numeric
/// cell, and under the conditions of [`detect_gaps`].
pub fn fill_table_gaps(
    table: &TextTable,
    time_column: &str,
    gap_threshold: f64,
) -> Result<TextTable> {
    let time_index = table
        .column_index(time_column)
        .ok_or_else(|| SensorError::column_not_found(time_column))?;
    let times = table.to_series(time_column, Some(&[]), CellPolicy::Strict)?;
    let gaps = detect_gaps(&times, gap_threshold)?;

    let kind = times.time_kind();
    let mut filled = TextTable::new(table.headers().to_vec());
    let mut pending = gaps.iter().peekable();

    for (index, row) in table.rows().iter().enumerate() {
        filled.push_row(row.clone());
        if let Some(gap) = pending.next_if(|g| g.index == index) {
            let mut synthetic = row.clone();
            synthetic[time_index] = format_cell(kind.represent(gap.midpoint()));
            debug!(
                start = gap.start,
                end = gap.end,
                inserted = %synthetic[time_index],
                "Filling timestamp gap"
            );
            filled.push_row(synthetic);
        }
    }

    info!(
        column = time_column,
        rows = table.len(),
        gaps = gaps.len(),
        threshold = gap_threshold,
        "Filled timestamp gaps"
    );

    Ok(filled)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::similar_names
)]
mod tests {
    use sensor_types::{Record, TimeKind};

    use super::*;

    fn series(times: &[f64], kind: TimeKind) -> Series {
        Series::from_records(
            "time_ms_loc",
            vec!["frame".to_string()],
            kind,
            times
                .iter()
                .enumerate()
                .map(|(i, &t)| Record::new(t, vec![i as f64]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn fill_midpoint_example() {
        let filled = fill_gaps(&series(&[0.0, 10.0, 100.0], TimeKind::Integer), 40.0).unwrap();
        assert_eq!(filled.times(), vec![0.0, 10.0, 55.0, 100.0]);
    }

    #[test]
    fn synthetic_record_copies_previous() {
        let filled = fill_gaps(&series(&[0.0, 10.0, 100.0], TimeKind::Integer), 40.0).unwrap();
        assert_eq!(filled.records()[2].values(), filled.records()[1].values());
        assert_eq!(filled.columns(), ["frame"]);
    }

    #[test]
    fn integer_midpoint_truncates() {
        let filled = fill_gaps(&series(&[0.0, 33.0, 100.0], TimeKind::Integer), 40.0).unwrap();
        assert_eq!(filled.times(), vec![0.0, 33.0, 66.0, 100.0]);

        let float = fill_gaps(&series(&[0.0, 33.0, 100.0], TimeKind::Float), 40.0).unwrap();
        assert_eq!(float.times(), vec![0.0, 33.0, 66.5, 100.0]);
    }

    #[test]
    fn one_record_per_gap_regardless_of_size() {
        let filled = fill_gaps(&series(&[0.0, 1000.0], TimeKind::Integer), 40.0).unwrap();
        assert_eq!(filled.times(), vec![0.0, 500.0, 1000.0]);
    }

    #[test]
    fn delta_equal_to_threshold_is_not_a_gap() {
        let s = series(&[0.0, 40.0, 80.0], TimeKind::Integer);
        assert!(detect_gaps(&s, 40.0).unwrap().is_empty());
        assert_eq!(fill_gaps(&s, 40.0).unwrap(), s);
    }

    #[test]
    fn short_series_unchanged() {
        let empty = series(&[], TimeKind::Integer);
        assert!(fill_gaps(&empty, 40.0).unwrap().is_empty());

        let single = series(&[5.0], TimeKind::Integer);
        assert_eq!(fill_gaps(&single, 40.0).unwrap(), single);
    }

    #[test]
    fn non_positive_threshold_marks_every_pair() {
        let s = series(&[0.0, 1.0, 2.0, 2.0], TimeKind::Float);
        assert_eq!(detect_gaps(&s, 0.0).unwrap().len(), 2);
        assert_eq!(detect_gaps(&s, -1.0).unwrap().len(), 3);
    }

    #[test]
    fn detect_reports_pairs() {
        let gaps = detect_gaps(&series(&[0.0, 30.0, 100.0, 130.0], TimeKind::Integer), 40.0).unwrap();
        assert_eq!(
            gaps,
            vec![Gap {
                index: 1,
                start: 30.0,
                end: 100.0
            }]
        );
        assert_eq!(gaps[0].delta(), 70.0);
        assert_eq!(gaps[0].midpoint(), 65.0);
    }

    #[test]
    fn invalid_inputs() {
        let s = series(&[0.0, f64::NAN], TimeKind::Float);
        assert!(matches!(
            fill_gaps(&s, 40.0),
            Err(FusionError::InvalidTimestamp { index: 1, .. })
        ));
        assert!(matches!(
            fill_gaps(&series(&[0.0], TimeKind::Float), f64::NAN),
            Err(FusionError::InvalidConfig(_))
        ));
    }

    fn table(headers: &[&str], rows: &[&[&str]]) -> TextTable {
        let mut table = TextTable::new(headers.iter().map(ToString::to_string).collect());
        for row in rows {
            table.push_row(row.iter().map(ToString::to_string).collect());
        }
        table
    }

    #[test]
    fn table_fill_keeps_text_cells_verbatim() {
        let camera = table(
            &["time_ms_loc", "frame", "file", "exposure"],
            &[
                &["0", "0", "f0.png", "0.10"],
                &["30", "1", "f1.png", "1.0"],
                &["100", "2", "f2.png", "0.10"],
            ],
        );

        let filled = fill_table_gaps(&camera, "time_ms_loc", 40.0).unwrap();
        assert_eq!(filled.headers(), camera.headers());
        assert_eq!(filled.len(), 4);
        assert_eq!(filled.rows()[0], camera.rows()[0]);
        assert_eq!(filled.rows()[2], ["65", "1", "f1.png", "1.0"]);
        assert_eq!(filled.rows()[3], camera.rows()[2]);
    }

    #[test]
    fn table_fill_midpoint_follows_time_kind() {
        let integral = table(&["t", "file"], &[&["0", "a"], &["33", "b"], &["100", "c"]]);
        let filled = fill_table_gaps(&integral, "t", 40.0).unwrap();
        assert_eq!(filled.rows()[2], ["66", "b"]);

        let float = table(&["t", "file"], &[&["0", "a"], &["33.0", "b"], &["100", "c"]]);
        let filled = fill_table_gaps(&float, "t", 40.0).unwrap();
        assert_eq!(filled.rows()[2], ["66.5", "b"]);
    }

    #[test]
    fn table_fill_without_gaps_is_identity() {
        let camera = table(&["t", "file"], &[&["0", "a"], &["40", "b"]]);
        assert_eq!(fill_table_gaps(&camera, "t", 40.0).unwrap(), camera);
    }

    #[test]
    fn table_fill_rejects_bad_time_column() {
        let camera = table(&["t", "file"], &[&["0", "a"], &["later", "b"]]);
        assert!(matches!(
            fill_table_gaps(&camera, "t", 40.0),
            Err(FusionError::Series(SensorError::NonNumericCell { row: 2, .. }))
        ));
        assert!(matches!(
            fill_table_gaps(&camera, "time_ms_loc", 40.0),
            Err(FusionError::Series(SensorError::ColumnNotFound { .. }))
        ));
    }
}
