//! Stream-pair descriptors and single-pair execution.

use std::path::{Path, PathBuf};

use sensor_fusion::{
    AlignmentConfig, AlignmentReport, DuplicateHandling, PipelineError, Stage, align,
    fill_table_gaps,
};
use sensor_io::{IoError, read_series, read_table, write_series, write_table};
use sensor_types::CellPolicy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;

/// One reference/data stream pair and where its outputs go.
///
/// # Example
///
/// ```
/// use sensor_align::StreamPair;
/// use sensor_fusion::DuplicateHandling;
///
/// let pair = StreamPair::new(
///     "case_01_imu",
///     "case_01/timestamp_1080_1_sync.csv",
///     "case_01/imu_sync.csv",
///     "time_ms_loc",
///     ["x", "y", "z"],
///     "out/case_01/timestamp_1080_1_sync_fill.csv",
///     "out/case_01/imu_sync_fill.csv",
/// )
/// .with_duplicates(DuplicateHandling::Collapse);
///
/// assert_eq!(pair.value_columns.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamPair {
    /// Label used in logs and summaries.
    pub name: String,

    /// Reference stream file (camera frame timestamps).
    pub reference: PathBuf,

    /// Data stream file (inertial or phone sensor).
    pub data: PathBuf,

    /// Time column shared by both files.
    pub time_column: String,

    /// Data columns to align.
    pub value_columns: Vec<String>,

    /// Whether the data stream double-writes timestamps.
    #[serde(default = "unique")]
    pub duplicates: DuplicateHandling,

    /// Destination of the gap-filled reference.
    pub output_reference: PathBuf,

    /// Destination of the aligned data.
    pub output_data: PathBuf,
}

const fn unique() -> DuplicateHandling {
    DuplicateHandling::Unique
}

impl StreamPair {
    /// Creates a pair whose data stream has unique timestamps.
    #[must_use]
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        reference: impl Into<PathBuf>,
        data: impl Into<PathBuf>,
        time_column: impl Into<String>,
        value_columns: impl IntoIterator<Item = S>,
        output_reference: impl Into<PathBuf>,
        output_data: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            reference: reference.into(),
            data: data.into(),
            time_column: time_column.into(),
            value_columns: value_columns.into_iter().map(Into::into).collect(),
            duplicates: DuplicateHandling::Unique,
            output_reference: output_reference.into(),
            output_data: output_data.into(),
        }
    }

    /// Set the duplicate handling for the data stream.
    #[must_use]
    pub const fn with_duplicates(mut self, duplicates: DuplicateHandling) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Resolves relative paths against `base`.
    #[must_use]
    pub fn resolved(mut self, base: &Path) -> Self {
        for path in [
            &mut self.reference,
            &mut self.data,
            &mut self.output_reference,
            &mut self.output_data,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

/// What a successful pair produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSummary {
    /// Pair label.
    pub name: String,
    /// Stage counters.
    pub report: AlignmentReport,
    /// Written reference file.
    pub output_reference: PathBuf,
    /// Written data file.
    pub output_data: PathBuf,
}

/// Reads, aligns and writes one stream pair.
///
/// The pair's duplicate handling overrides the one in `config`. Only the
/// reference's time column is parsed, strictly; its other columns are carried
/// as text into the filled reference file, so frame labels and file names
/// survive unchanged. The data stream is read with only the time and value
/// columns, leniently when it is collapsed so missing cells drop out of the
/// means.
///
/// # Errors
///
/// Returns an error if a file cannot be read or written, a required cell is
/// not numeric, or an alignment stage fails.
pub fn run_pair(pair: &StreamPair, config: &AlignmentConfig) -> Result<PairSummary> {
    let config = config.with_duplicates(pair.duplicates);
    let value_columns: Vec<&str> = pair.value_columns.iter().map(String::as_str).collect();

    let reference_table = read_table(&pair.reference)?;
    let reference = reference_table
        .to_series(&pair.time_column, Some(&[]), CellPolicy::Strict)
        .map_err(|source| IoError::Conversion {
            path: pair.reference.clone(),
            source,
        })?;
    let policy = match pair.duplicates {
        DuplicateHandling::Collapse => CellPolicy::Lenient,
        DuplicateHandling::Unique => CellPolicy::Strict,
    };
    let data = read_series(&pair.data, &pair.time_column, Some(&value_columns), policy)?;
    debug!(
        pair = %pair.name,
        reference = reference.len(),
        data = data.len(),
        "Loaded stream pair"
    );

    let alignment = align(&reference, &data, &value_columns, &config)?;
    let filled_reference =
        fill_table_gaps(&reference_table, &pair.time_column, config.gap_threshold)
            .map_err(|source| PipelineError::new(Stage::Fill, source))?;

    write_table(&pair.output_reference, &filled_reference)?;
    write_series(&pair.output_data, &alignment.aligned)?;
    info!(
        pair = %pair.name,
        output = %pair.output_data.display(),
        rows = alignment.report.aligned_len,
        "Wrote aligned stream"
    );

    Ok(PairSummary {
        name: pair.name.clone(),
        report: alignment.report,
        output_reference: pair.output_reference.clone(),
        output_data: pair.output_data.clone(),
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
    use std::fs;

    use sensor_fusion::{BoundaryPolicy, Interpolator};

    use super::*;
    use crate::error::AlignError;

    fn config() -> AlignmentConfig {
        AlignmentConfig::new(
            40.0,
            DuplicateHandling::Unique,
            None,
            Interpolator::linear(BoundaryPolicy::Clamp),
        )
    }

    fn pair(dir: &Path) -> StreamPair {
        StreamPair::new(
            "case",
            dir.join("cam.csv"),
            dir.join("imu.csv"),
            "time_ms_loc",
            ["x"],
            dir.join("out/cam_fill.csv"),
            dir.join("out/imu_fill.csv"),
        )
    }

    #[test]
    fn run_pair_writes_both_outputs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cam.csv"), "time_ms_loc,frame\n0,0\n30,1\n100,2\n130,3\n").unwrap();
        fs::write(
            dir.path().join("imu.csv"),
            "time_ms_loc,x,label\n0,1,a\n50,2,b\n150,3,c\n",
        )
        .unwrap();

        let summary = run_pair(&pair(dir.path()), &config()).unwrap();
        assert_eq!(summary.report.gaps_filled, 1);
        assert_eq!(summary.report.aligned_len, 5);

        let cam = fs::read_to_string(dir.path().join("out/cam_fill.csv")).unwrap();
        assert_eq!(cam, "time_ms_loc,frame\n0,0\n30,1\n65,1\n100,2\n130,3\n");

        let imu = fs::read_to_string(dir.path().join("out/imu_fill.csv")).unwrap();
        assert_eq!(imu, "time_ms_loc,x\n0,1\n30,1.6\n65,2.15\n100,2.5\n130,2.8\n");
    }

    #[test]
    fn reference_text_columns_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("cam.csv"),
            "time_ms_loc,frame,file,exposure\n0,0,f0.png,0.10\n30,1,f1.png,1.0\n100,2,f2.png,0.10\n",
        )
        .unwrap();
        fs::write(dir.path().join("imu.csv"), "time_ms_loc,x\n0,1\n50,2\n150,3\n").unwrap();

        let summary = run_pair(&pair(dir.path()), &config()).unwrap();
        assert_eq!(summary.report.gaps_filled, 1);
        assert_eq!(summary.report.aligned_len, 4);

        let cam = fs::read_to_string(dir.path().join("out/cam_fill.csv")).unwrap();
        assert_eq!(
            cam,
            "time_ms_loc,frame,file,exposure\n0,0,f0.png,0.10\n30,1,f1.png,1.0\n\
             65,1,f1.png,1.0\n100,2,f2.png,0.10\n"
        );

        let imu = fs::read_to_string(dir.path().join("out/imu_fill.csv")).unwrap();
        assert_eq!(imu, "time_ms_loc,x\n0,1\n30,1.6\n65,2.15\n100,2.5\n");
    }

    #[test]
    fn reference_time_column_is_still_strict() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cam.csv"), "time_ms_loc,file\n0,f0.png\nlater,f1.png\n").unwrap();
        fs::write(dir.path().join("imu.csv"), "time_ms_loc,x\n0,1\n").unwrap();

        let err = run_pair(&pair(dir.path()), &config()).unwrap_err();
        assert!(matches!(err, AlignError::Io(IoError::Conversion { .. })));
    }

    #[test]
    fn collapse_reads_data_leniently() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cam.csv"), "time_ms_loc\n0\n10\n").unwrap();
        fs::write(
            dir.path().join("imu.csv"),
            "time_ms_loc,x\n0,1\n0,\n0,3\n10,5\n",
        )
        .unwrap();

        let p = pair(dir.path()).with_duplicates(DuplicateHandling::Collapse);
        let summary = run_pair(&p, &config()).unwrap();
        assert_eq!(summary.report.duplicates_removed, 2);

        let imu = fs::read_to_string(dir.path().join("out/imu_fill.csv")).unwrap();
        assert_eq!(imu, "time_ms_loc,x\n0,2\n10,5\n");
    }

    #[test]
    fn missing_data_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cam.csv"), "time_ms_loc\n0\n").unwrap();

        let err = run_pair(&pair(dir.path()), &config()).unwrap_err();
        assert!(matches!(err, AlignError::Io(sensor_io::IoError::FileNotFound { .. })));
    }

    #[test]
    fn stage_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cam.csv"), "time_ms_loc\n0\n").unwrap();
        fs::write(dir.path().join("imu.csv"), "time_ms_loc,x\n0,1\n").unwrap();

        let err = run_pair(&pair(dir.path()), &config()).unwrap_err();
        assert!(matches!(err, AlignError::Pipeline(ref e) if e.stage == Stage::Align));
    }

    #[test]
    fn resolved_joins_relative_paths_only() {
        let p = StreamPair::new("p", "cam.csv", "/abs/imu.csv", "t", ["x"], "o/c.csv", "o/d.csv")
            .resolved(Path::new("/data/case"));
        assert_eq!(p.reference, PathBuf::from("/data/case/cam.csv"));
        assert_eq!(p.data, PathBuf::from("/abs/imu.csv"));
        assert_eq!(p.output_data, PathBuf::from("/data/case/o/d.csv"));
    }
}
