//! Comma-separated tables with a header row.

use std::fs::{self, File};
use std::path::Path;

use csv::{ReaderBuilder, Trim, Writer};
use sensor_types::{CellPolicy, Series, TextTable};
use tracing::debug;

use crate::error::{IoError, IoResult};

/// Reads a CSV file with a header row into a [`TextTable`].
///
/// Fields are trimmed and rows may differ in length; short rows are padded
/// with empty cells. An empty file yields an empty table.
///
/// # Errors
///
/// Returns an error if:
/// - The path does not exist or is a directory
/// - The file cannot be read or is not valid CSV
///
/// # Example
///
/// ```no_run
/// use sensor_io::read_table;
///
/// let table = read_table("timestamp_1080_1.csv").unwrap();
/// println!("{} frames", table.len());
/// ```
pub fn read_table<P: AsRef<Path>>(path: P) -> IoResult<TextTable> {
    let path = path.as_ref();
    let file = open(path)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.iter().map(String::from).collect();
    let mut table = TextTable::new(headers);
    for record in reader.records() {
        table.push_row(record?.iter().map(String::from).collect());
    }

    debug!(
        path = %path.display(),
        columns = table.headers().len(),
        rows = table.len(),
        "Read table"
    );
    Ok(table)
}

/// Reads a CSV file straight into a [`Series`].
///
/// `value_columns` selects the channels to keep; `None` keeps every non-time
/// column.
///
/// # Errors
///
/// Returns the errors of [`read_table`], and [`IoError::Conversion`] naming
/// the file when a column is missing or a cell is rejected by `policy`.
pub fn read_series<P: AsRef<Path>>(
    path: P,
    time_column: &str,
    value_columns: Option<&[&str]>,
    policy: CellPolicy,
) -> IoResult<Series> {
    let path = path.as_ref();
    read_table(path)?
        .to_series(time_column, value_columns, policy)
        .map_err(|source| IoError::Conversion {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes a table as CSV, creating the parent directory if needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or written.
pub fn write_table<P: AsRef<Path>>(path: P, table: &TextTable) -> IoResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = Writer::from_writer(File::create(path)?);
    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = table.len(), "Wrote table");
    Ok(())
}

/// Writes a series as CSV with the time column first.
///
/// # Errors
///
/// Same conditions as [`write_table`].
pub fn write_series<P: AsRef<Path>>(path: P, series: &Series) -> IoResult<()> {
    write_table(path, &series.to_table())
}

fn open(path: &Path) -> IoResult<File> {
    if path.is_dir() {
        return Err(IoError::is_a_directory(path));
    }
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::file_not_found(path)
        } else {
            IoError::Io(e)
        }
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::similar_names
)]
mod tests {
    use sensor_types::{Record, SensorError, TimeKind};

    use super::*;

    #[test]
    fn read_trims_and_pads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cam.csv");
        fs::write(&path, "time_ms_loc, frame ,x\n0, 1, 2.5\n 33 ,2\n").unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.headers(), ["time_ms_loc", "frame", "x"]);
        assert_eq!(table.rows()[0], ["0", "1", "2.5"]);
        assert_eq!(table.rows()[1], ["33", "2", ""]);
    }

    #[test]
    fn read_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "").unwrap();

        let table = read_table(&path).unwrap();
        assert!(table.is_empty());
        assert!(table.headers().is_empty());
    }

    #[test]
    fn missing_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();

        let missing = read_table(dir.path().join("nonexistent_imu.csv"));
        assert!(
            matches!(missing, Err(IoError::FileNotFound { ref path }) if path.ends_with("nonexistent_imu.csv"))
        );

        let directory = read_table(dir.path());
        assert!(matches!(directory, Err(IoError::IsADirectory { .. })));
    }

    #[test]
    fn read_series_reports_path_on_bad_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imu.csv");
        fs::write(&path, "timestamp_ns,ax\n0,1.0\n10,oops\n").unwrap();

        let err = read_series(&path, "timestamp_ns", None, CellPolicy::Strict).unwrap_err();
        match err {
            IoError::Conversion { path: p, source } => {
                assert_eq!(p, path);
                assert!(matches!(source, SensorError::NonNumericCell { row: 2, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }

        let lenient = read_series(&path, "timestamp_ns", None, CellPolicy::Lenient).unwrap();
        assert!(lenient.records()[1].values()[0].is_nan());
    }

    #[test]
    fn read_series_selects_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imu.csv");
        fs::write(&path, "ax,timestamp_ns,label,ay\n1,0,left,2\n3,10,right,4\n").unwrap();

        let series = read_series(&path, "timestamp_ns", Some(&["ay", "ax"]), CellPolicy::Strict)
            .unwrap();
        assert_eq!(series.columns(), ["ay", "ax"]);
        assert_eq!(series.time_kind(), TimeKind::Integer);
        assert_eq!(series.records()[1].values(), [4.0, 3.0]);
    }

    #[test]
    fn write_creates_parent_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("case_01").join("imu_sync.csv");

        let series = Series::from_records(
            "time_ms_loc",
            vec!["ax".to_string(), "gy".to_string()],
            TimeKind::Integer,
            vec![
                Record::new(0.0, vec![1.5, f64::NAN]),
                Record::new(65.0, vec![2.15, -3.0]),
            ],
        )
        .unwrap();
        write_series(&path, &series).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "time_ms_loc,ax,gy\n0,1.5,\n65,2.15,-3\n");

        let back = read_series(&path, "time_ms_loc", None, CellPolicy::Lenient).unwrap();
        assert_eq!(back.times(), series.times());
        assert_eq!(back.records()[1].values(), [2.15, -3.0]);
        assert!(back.records()[0].values()[1].is_nan());
    }
}
