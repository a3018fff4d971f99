//! End-to-end alignment scenarios.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use approx::assert_relative_eq;
use sensor_fusion::prelude::*;
use sensor_fusion::{AlignmentReport, Stage};
use sensor_types::{Record, Series, TimeKind, TimeUnit};

fn camera(times: &[f64]) -> Series {
    Series::from_records(
        "time_ms_loc",
        vec!["frame".to_string()],
        TimeKind::Integer,
        times
            .iter()
            .enumerate()
            .map(|(i, &t)| Record::new(t, vec![i as f64]))
            .collect(),
    )
    .unwrap()
}

fn imu(samples: &[(f64, f64)]) -> Series {
    Series::from_records(
        "time_ms_loc",
        vec!["ax".to_string(), "gx".to_string()],
        TimeKind::Integer,
        samples
            .iter()
            .map(|&(t, v)| Record::new(t, vec![v, v * v]))
            .collect(),
    )
    .unwrap()
}

fn linear(boundary: BoundaryPolicy) -> AlignmentConfig {
    AlignmentConfig::new(
        40.0,
        DuplicateHandling::Unique,
        None,
        Interpolator::linear(boundary),
    )
}

#[test]
fn camera_gap_with_imu_stream() {
    let out = align(
        &camera(&[0.0, 30.0, 100.0, 130.0]),
        &imu(&[(0.0, 1.0), (50.0, 2.0), (150.0, 3.0)]),
        &["ax"],
        &linear(BoundaryPolicy::Extrapolate),
    )
    .unwrap();

    assert_eq!(out.aligned.times(), vec![0.0, 30.0, 65.0, 100.0, 130.0]);
    let expected = [1.0, 1.6, 2.15, 2.5, 2.8];
    for (record, want) in out.aligned.iter().zip(expected) {
        assert_relative_eq!(record.values()[0], want, epsilon = 1e-12);
    }

    // The synthetic camera record copies the frame before the gap.
    assert_eq!(out.filled_reference.records()[2].values(), [1.0]);
}

#[test]
fn realigning_aligned_output_is_a_fixed_point() {
    let config = linear(BoundaryPolicy::Reject).with_duplicates(DuplicateHandling::Collapse);
    let first = align(
        &camera(&[0.0, 30.0, 100.0, 130.0]),
        &imu(&[(0.0, 1.0), (50.0, 2.0), (150.0, 3.0)]),
        &["ax", "gx"],
        &config,
    )
    .unwrap();

    let second = align(
        &first.filled_reference,
        &first.aligned,
        &["ax", "gx"],
        &config,
    )
    .unwrap();

    assert_eq!(
        second.report,
        AlignmentReport {
            gaps_filled: 0,
            duplicates_removed: 0,
            resampled_len: None,
            aligned_len: 5,
        }
    );
    assert_eq!(second.filled_reference, first.filled_reference);
    for (a, b) in second.aligned.iter().zip(first.aligned.iter()) {
        assert_eq!(a.time(), b.time());
        for (x, y) in a.values().iter().zip(b.values()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12);
        }
    }
}

#[test]
fn double_written_imu_resampled_then_aligned() {
    let config = linear(BoundaryPolicy::Clamp)
        .with_duplicates(DuplicateHandling::Collapse)
        .with_canonical_rate(CanonicalRate::new(100.0, TimeUnit::Milliseconds));

    let data = imu(&[
        (0.0, 0.0),
        (0.0, 2.0),
        (10.0, 2.0),
        (20.0, 4.0),
        (20.0, 4.0),
        (30.0, 6.0),
    ]);
    let out = align(&camera(&[5.0, 25.0]), &data, &["ax"], &config).unwrap();

    assert_eq!(out.report.duplicates_removed, 2);
    assert_eq!(out.report.resampled_len, Some(4));
    assert_relative_eq!(out.aligned.records()[0].values()[0], 1.5);
    assert_relative_eq!(out.aligned.records()[1].values()[0], 5.0);
}

#[test]
fn boundary_choice_is_visible_at_stream_edges() {
    let reference = camera(&[0.0, 20.0, 40.0]);
    let data = imu(&[(10.0, 1.0), (30.0, 3.0)]);

    let reject = align(&reference, &data, &["ax"], &linear(BoundaryPolicy::Reject)).unwrap_err();
    assert_eq!(reject.stage, Stage::Align);

    let clamp = align(&reference, &data, &["ax"], &linear(BoundaryPolicy::Clamp)).unwrap();
    assert_eq!(clamp.aligned.column_values("ax").unwrap(), vec![1.0, 2.0, 3.0]);

    let extra = align(&reference, &data, &["ax"], &linear(BoundaryPolicy::Extrapolate)).unwrap();
    let ax = extra.aligned.column_values("ax").unwrap();
    assert_relative_eq!(ax[0], 0.0);
    assert_relative_eq!(ax[2], 4.0);

    let fill = align(&reference, &data, &["ax"], &linear(BoundaryPolicy::Fill(f64::NAN))).unwrap();
    let ax = fill.aligned.column_values("ax").unwrap();
    assert!(ax[0].is_nan() && ax[2].is_nan());
    assert_relative_eq!(ax[1], 2.0);
}
