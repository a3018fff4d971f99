//! Duplicate timestamp collapsing.
//!
//! Some inertial loggers write the same sample time twice. Records sharing a
//! time are merged into one record holding the per-channel mean.

use sensor_types::{Record, Series};
use tracing::{debug, warn};

use crate::error::Result;

/// Collapses records with identical time values into one record per time.
///
/// Each output channel is the mean of that channel over the group, ignoring
/// missing (`NaN`) values; a channel with no present value in a group stays
/// missing. Records whose time is missing have no group and are dropped.
/// Output is sorted by ascending time, independent of input order.
///
/// # Errors
///
/// Returns an error only if the rebuilt series violates the input layout,
/// which indicates a bug.
///
/// # Example
///
/// ```
/// use sensor_fusion::collapse_duplicates;
/// use sensor_types::{Record, Series, TimeKind};
///
/// let imu = Series::from_records(
///     "timestamp_ns",
///     vec!["x".to_string()],
///     TimeKind::Integer,
///     vec![Record::new(5.0, vec![1.0]), Record::new(5.0, vec![3.0])],
/// )
/// .unwrap();
///
/// let collapsed = collapse_duplicates(&imu).unwrap();
/// assert_eq!(collapsed.len(), 1);
/// assert_eq!(collapsed.records()[0].values(), [2.0]);
/// ```
pub fn collapse_duplicates(series: &Series) -> Result<Series> {
    let mut keyed: Vec<(f64, &Record)> = series
        .iter()
        .filter(|r| !r.time().is_nan())
        // -0.0 and 0.0 are one group
        .map(|r| (r.time() + 0.0, r))
        .collect();

    let dropped = series.len() - keyed.len();
    if dropped > 0 {
        warn!(
            column = series.time_column(),
            dropped, "Dropped records with missing time values"
        );
    }

    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let width = series.columns().len();
    let collapsed: Vec<Record> = keyed
        .chunk_by(|a, b| a.0 == b.0)
        .map(|group| {
            let values = (0..width)
                .map(|c| mean_present(group.iter().map(|(_, r)| r.values()[c])))
                .collect();
            Record::new(group[0].0, values)
        })
        .collect();

    debug!(
        column = series.time_column(),
        input = series.len(),
        output = collapsed.len(),
        "Collapsed duplicate timestamps"
    );

    Ok(series.with_records(collapsed)?)
}

/// Mean of the non-`NaN` values, or `NaN` if there are none.
fn mean_present(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0_u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / f64::from(count)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::similar_names
)]
mod tests {
    use sensor_types::TimeKind;

    use super::*;

    fn series(records: Vec<Record>) -> Series {
        Series::from_records(
            "timestamp_ns",
            vec!["ax".to_string(), "ay".to_string()],
            TimeKind::Integer,
            records,
        )
        .unwrap()
    }

    #[test]
    fn collapse_means_each_channel() {
        let out = collapse_duplicates(&series(vec![
            Record::new(5.0, vec![1.0, 10.0]),
            Record::new(5.0, vec![3.0, 30.0]),
            Record::new(6.0, vec![7.0, 70.0]),
        ]))
        .unwrap();
        assert_eq!(out.times(), vec![5.0, 6.0]);
        assert_eq!(out.records()[0].values(), [2.0, 20.0]);
        assert_eq!(out.records()[1].values(), [7.0, 70.0]);
        assert_eq!(out.time_kind(), TimeKind::Integer);
    }

    #[test]
    fn collapse_sorts_output() {
        let out = collapse_duplicates(&series(vec![
            Record::new(9.0, vec![1.0, 1.0]),
            Record::new(2.0, vec![2.0, 2.0]),
            Record::new(9.0, vec![3.0, 3.0]),
            Record::new(4.0, vec![4.0, 4.0]),
        ]))
        .unwrap();
        assert_eq!(out.times(), vec![2.0, 4.0, 9.0]);
        assert_eq!(out.records()[2].values(), [2.0, 2.0]);
    }

    #[test]
    fn collapse_excludes_missing_from_mean() {
        let out = collapse_duplicates(&series(vec![
            Record::new(1.0, vec![f64::NAN, f64::NAN]),
            Record::new(1.0, vec![4.0, f64::NAN]),
            Record::new(1.0, vec![8.0, f64::NAN]),
        ]))
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.records()[0].values()[0], 6.0);
        assert!(out.records()[0].values()[1].is_nan());
    }

    #[test]
    fn collapse_drops_missing_times() {
        let out = collapse_duplicates(&series(vec![
            Record::new(f64::NAN, vec![1.0, 1.0]),
            Record::new(3.0, vec![2.0, 2.0]),
        ]))
        .unwrap();
        assert_eq!(out.times(), vec![3.0]);
    }

    #[test]
    fn collapse_unique_is_sorted_passthrough() {
        let input = series(vec![
            Record::new(1.0, vec![1.0, 2.0]),
            Record::new(2.0, vec![3.0, 4.0]),
        ]);
        assert_eq!(collapse_duplicates(&input).unwrap(), input);
    }

    #[test]
    fn collapse_empty() {
        let out = collapse_duplicates(&series(vec![])).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.columns(), ["ax", "ay"]);
    }

    #[test]
    fn collapse_signed_zero_is_one_group() {
        let out = collapse_duplicates(&series(vec![
            Record::new(-0.0, vec![1.0, 1.0]),
            Record::new(0.0, vec![3.0, 3.0]),
        ]))
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.records()[0].values(), [2.0, 2.0]);
    }

    #[test]
    fn mean_present_basic() {
        assert_eq!(mean_present([1.0, 2.0, 3.0].into_iter()), 2.0);
        assert!(mean_present([f64::NAN].into_iter()).is_nan());
        assert!(mean_present(std::iter::empty()).is_nan());
    }
}
