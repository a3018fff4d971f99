//! End-to-end batch runs from a manifest on disk.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use sensor_align::{AlignError, BatchConfig};
use sensor_io::read_series;
use sensor_types::CellPolicy;

const CAMERA: &str = "time_ms_loc,frame\n0,0\n30,1\n100,2\n130,3\n";
const IMU: &str = "time_ms_loc,x\n0,1\n50,2\n150,3\n";
const PHONE_DOUBLE_WRITTEN: &str = "time_ms_loc,x\n0,1\n0,3\n50,4\n50,\n150,6\n";

fn write_case(dir: &Path) {
    fs::create_dir_all(dir.join("case_01")).unwrap();
    fs::write(dir.join("case_01/cam.csv"), CAMERA).unwrap();
    fs::write(dir.join("case_01/imu.csv"), IMU).unwrap();
    fs::write(dir.join("case_01/phone.csv"), PHONE_DOUBLE_WRITTEN).unwrap();
}

fn manifest(canonical_rate: &str, workers: usize) -> String {
    format!(
        r#"{{
            "gap_threshold": 40.0,
            "method": "linear",
            "boundary": "clamp",
            {canonical_rate}
            "workers": {workers},
            "pairs": [
                {{
                    "name": "imu",
                    "reference": "case_01/cam.csv",
                    "data": "case_01/imu.csv",
                    "time_column": "time_ms_loc",
                    "value_columns": ["x"],
                    "output_reference": "out/case_01/cam_fill.csv",
                    "output_data": "out/case_01/imu_fill.csv"
                }},
                {{
                    "name": "missing",
                    "reference": "case_01/cam.csv",
                    "data": "case_01/gyro.csv",
                    "time_column": "time_ms_loc",
                    "value_columns": ["x"],
                    "output_reference": "out/case_01/cam_fill_gyro.csv",
                    "output_data": "out/case_01/gyro_fill.csv"
                }},
                {{
                    "name": "phone",
                    "reference": "case_01/cam.csv",
                    "data": "case_01/phone.csv",
                    "time_column": "time_ms_loc",
                    "value_columns": ["x"],
                    "duplicates": "collapse",
                    "output_reference": "out/case_01/cam_fill_phone.csv",
                    "output_data": "out/case_01/phone_fill.csv"
                }}
            ]
        }}"#
    )
}

#[test]
fn failing_pair_does_not_abort_batch() {
    let dir = tempfile::tempdir().unwrap();
    write_case(dir.path());
    let path = dir.path().join("batch.json");
    fs::write(&path, manifest("", 2)).unwrap();

    let outcomes = BatchConfig::from_file(&path).unwrap().run().unwrap();
    let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, ["imu", "missing", "phone"]);

    assert!(outcomes[0].is_ok());
    assert!(matches!(outcomes[1].result, Err(AlignError::Io(_))));
    assert!(outcomes[2].is_ok());

    let imu = fs::read_to_string(dir.path().join("out/case_01/imu_fill.csv")).unwrap();
    assert_eq!(imu, "time_ms_loc,x\n0,1\n30,1.6\n65,2.15\n100,2.5\n130,2.8\n");
    assert!(!dir.path().join("out/case_01/gyro_fill.csv").exists());
}

#[test]
fn collapsed_pair_reports_removed_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    write_case(dir.path());
    let path = dir.path().join("batch.json");
    fs::write(&path, manifest("", 1)).unwrap();

    let outcomes = BatchConfig::from_file(&path).unwrap().run().unwrap();
    let phone = outcomes[2].result.as_ref().unwrap();
    assert_eq!(phone.report.duplicates_removed, 2);
    assert_eq!(phone.report.gaps_filled, 1);

    // Collapsed phone stream is 0 -> 2, 50 -> 4, 150 -> 6.
    let aligned = read_series(&phone.output_data, "time_ms_loc", None, CellPolicy::Strict).unwrap();
    let x = aligned.column_values("x").unwrap();
    assert_relative_eq!(x[0], 2.0);
    assert_relative_eq!(x[1], 3.2, epsilon = 1e-12);
    assert_relative_eq!(x[2], 4.3, epsilon = 1e-12);
}

#[test]
fn canonical_rate_resamples_before_alignment() {
    let dir = tempfile::tempdir().unwrap();
    write_case(dir.path());
    let path = dir.path().join("batch.json");
    let rate = r#""canonical_rate": { "hz": 100.0, "unit": "milliseconds" },"#;
    fs::write(&path, manifest(rate, 0)).unwrap();

    let batch = BatchConfig::from_file(&path).unwrap();
    let outcomes = batch.run().unwrap();
    let imu = outcomes[0].result.as_ref().unwrap();
    assert_eq!(imu.report.resampled_len, Some(16));
    assert_eq!(imu.report.aligned_len, 5);

    let aligned = read_series(&imu.output_data, "time_ms_loc", None, CellPolicy::Strict).unwrap();
    assert_eq!(aligned.times(), vec![0.0, 30.0, 65.0, 100.0, 130.0]);
    let expected = [1.0, 1.6, 2.15, 2.5, 2.8];
    for (got, want) in aligned.column_values("x").unwrap().iter().zip(expected) {
        assert_relative_eq!(*got, want, epsilon = 1e-9);
    }
}

#[test]
fn invalid_manifest_settings_fail_before_any_pair_runs() {
    let dir = tempfile::tempdir().unwrap();
    write_case(dir.path());
    let path = dir.path().join("batch.json");
    fs::write(&path, manifest("", 1).replace("\"clamp\"", "\"wrap\"")).unwrap();

    let err = BatchConfig::from_file(&path).unwrap().run().unwrap_err();
    assert!(matches!(err, AlignError::Config(_)));
    assert!(!dir.path().join("out").exists());
}
