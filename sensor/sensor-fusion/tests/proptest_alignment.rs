//! Property-based tests for stream repair and interpolation.
//!
//! Run with: cargo test -p sensor-fusion -- proptest

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use proptest::prelude::*;
use sensor_fusion::{
    BoundaryPolicy, InterpolationMethod, Interpolator, collapse_duplicates, detect_gaps, fill_gaps,
    interpolate_onto, resample_to_rate,
};
use sensor_types::{Record, Series, TimeKind, TimeUnit};

// =============================================================================
// Strategies
// =============================================================================

/// Strictly increasing integral timestamps built from positive steps.
fn arb_times(max_len: usize, max_step: u32) -> impl Strategy<Value = Vec<f64>> {
    (0u32..1000, prop::collection::vec(1..=max_step, 0..max_len)).prop_map(|(start, steps)| {
        let mut t = f64::from(start);
        let mut times = vec![t];
        for step in steps {
            t += f64::from(step);
            times.push(t);
        }
        times
    })
}

/// A two-channel series over the given times.
fn series_over(times: &[f64], values: &[f64], kind: TimeKind) -> Series {
    Series::from_records(
        "t",
        vec!["a".to_string(), "b".to_string()],
        kind,
        times
            .iter()
            .zip(values.iter().cycle())
            .map(|(&t, &v)| Record::new(t, vec![v, -2.0 * v]))
            .collect(),
    )
    .unwrap()
}

fn arb_series(max_len: usize, max_step: u32) -> impl Strategy<Value = Series> {
    (
        arb_times(max_len, max_step),
        prop::collection::vec(-100.0..100.0f64, 1..8),
    )
        .prop_map(|(times, values)| series_over(&times, &values, TimeKind::Float))
}

/// Integral timestamps with repeats, in arbitrary order.
fn arb_duplicated() -> impl Strategy<Value = Series> {
    prop::collection::vec((0u32..20, -10.0..10.0f64), 0..40).prop_map(|samples| {
        let times: Vec<f64> = samples.iter().map(|(t, _)| f64::from(*t)).collect();
        let values: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
        let values = if values.is_empty() { vec![0.0] } else { values };
        series_over(&times, &values, TimeKind::Integer)
    })
}

// =============================================================================
// Property Tests: Gap Filling
// =============================================================================

proptest! {
    /// Filling never removes records and adds exactly one per gap.
    #[test]
    fn fill_adds_one_record_per_gap(series in arb_series(40, 120), threshold in 1.0..80.0f64) {
        let gaps = detect_gaps(&series, threshold).unwrap();
        let filled = fill_gaps(&series, threshold).unwrap();

        prop_assert!(filled.len() >= series.len());
        prop_assert_eq!(filled.len(), series.len() + gaps.len());
    }

    /// Every gap gets its midpoint, and nothing is inserted elsewhere.
    #[test]
    fn fill_inserts_midpoints(series in arb_series(40, 120), threshold in 1.0..80.0f64) {
        let filled = fill_gaps(&series, threshold).unwrap();
        let times = filled.times();

        let mut i = 0;
        for w in series.times().windows(2) {
            prop_assert_eq!(times[i], w[0]);
            if w[1] - w[0] > threshold {
                prop_assert_eq!(times[i + 1], w[0] + (w[1] - w[0]) / 2.0);
                i += 2;
            } else {
                i += 1;
            }
        }
        prop_assert_eq!(i + 1, times.len());
    }

    /// With every delta at most twice the threshold, a second fill finds nothing.
    #[test]
    fn fill_is_idempotent_for_single_frame_drops(series in arb_series(40, 80)) {
        let threshold = 40.0;
        let once = fill_gaps(&series.clone().with_time_kind(TimeKind::Integer), threshold).unwrap();
        let twice = fill_gaps(&once, threshold).unwrap();

        prop_assert!(detect_gaps(&once, threshold).unwrap().is_empty());
        prop_assert_eq!(once, twice);
    }
}

// =============================================================================
// Property Tests: Duplicate Collapsing
// =============================================================================

proptest! {
    /// Output times are strictly increasing and cover every distinct input time.
    #[test]
    fn collapse_yields_unique_sorted_times(series in arb_duplicated()) {
        let collapsed = collapse_duplicates(&series).unwrap();
        let times = collapsed.times();

        prop_assert!(times.windows(2).all(|w| w[0] < w[1]));

        let mut distinct = series.times();
        distinct.sort_by(f64::total_cmp);
        distinct.dedup();
        prop_assert_eq!(times, distinct);
    }

    /// Collapsing an already collapsed series changes nothing.
    #[test]
    fn collapse_is_idempotent(series in arb_duplicated()) {
        let once = collapse_duplicates(&series).unwrap();
        let twice = collapse_duplicates(&once).unwrap();
        prop_assert_eq!(once, twice);
    }
}

// =============================================================================
// Property Tests: Resampling
// =============================================================================

proptest! {
    /// The output timeline is arithmetic and spans the input range.
    #[test]
    fn resample_timeline_is_arithmetic(series in arb_series(30, 50), hz in 5.0..500.0f64) {
        prop_assume!(series.len() >= 2);
        let out = resample_to_rate(&series, hz, TimeUnit::Milliseconds).unwrap();
        let times = out.times();
        let step = 1e3 / hz;
        let input = series.times();
        let (min, max) = (input[0], input[input.len() - 1]);

        prop_assert_eq!(times[0], min);
        for (i, t) in times.iter().enumerate() {
            let expected = min + i as f64 * step;
            prop_assert!((t - expected).abs() <= 1e-9 * expected.abs().max(1.0));
        }
        let last = times[times.len() - 1];
        prop_assert!(last >= max - 1e-6 * max.max(1.0));
        prop_assert!(last - step < max);
    }
}

// =============================================================================
// Property Tests: Cross-Stream Interpolation
// =============================================================================

proptest! {
    /// Evaluating at the source's own timestamps reproduces its values.
    #[test]
    fn interpolation_identity(
        series in arb_series(30, 50),
        method in prop_oneof![
            Just(InterpolationMethod::Linear),
            Just(InterpolationMethod::Nearest),
            Just(InterpolationMethod::Previous),
            Just(InterpolationMethod::Next),
            Just(InterpolationMethod::Cubic),
            Just(InterpolationMethod::NaturalCubic),
        ],
    ) {
        prop_assume!(series.len() >= method.min_samples());
        let interpolator = Interpolator::new(method, BoundaryPolicy::Reject);
        let out = interpolate_onto(&series, &["a", "b"], &series.times(), &interpolator).unwrap();

        prop_assert_eq!(out.len(), series.len());
        for (record, row) in series.iter().zip(&out.rows) {
            for (expected, got) in record.values().iter().zip(row) {
                prop_assert!((expected - got).abs() <= 1e-9 * expected.abs().max(1.0));
            }
        }
    }

    /// Row count always equals the target length.
    #[test]
    fn interpolation_row_count(
        series in arb_series(30, 50),
        targets in prop::collection::vec(-500.0..3000.0f64, 0..50),
    ) {
        prop_assume!(series.len() >= 2);
        let out = interpolate_onto(
            &series,
            &["b"],
            &targets,
            &Interpolator::linear(BoundaryPolicy::Clamp),
        )
        .unwrap();
        prop_assert_eq!(out.rows.len(), targets.len());
        prop_assert_eq!(out.timeline, targets);
    }
}
