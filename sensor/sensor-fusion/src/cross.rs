//! Cross-stream interpolation onto an arbitrary target timeline.

use sensor_types::{Record, Series, TimeKind};
use tracing::debug;

use crate::error::{FusionError, Result, check_times};
use crate::interpolation::Interpolator;
use crate::samples::{SampleTrack, sorted_order};

/// Values of several channels evaluated on a target timeline.
///
/// `rows[i]` holds one value per entry of `columns`, evaluated at
/// `timeline[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolated {
    /// Target times, in the order they were requested.
    pub timeline: Vec<f64>,
    /// Channel names, in the order they were requested.
    pub columns: Vec<String>,
    /// Row-major value matrix.
    pub rows: Vec<Vec<f64>>,
}

impl Interpolated {
    /// Returns the number of target points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    /// Returns true if the timeline is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    /// Pairs every row with its target time.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &[f64])> {
        self.timeline
            .iter()
            .copied()
            .zip(self.rows.iter().map(Vec::as_slice))
    }

    /// Converts the matrix into a series keyed by `time_column`.
    ///
    /// # Errors
    ///
    /// Returns an error if `time_column` collides with a value column.
    pub fn into_series(self, time_column: &str, time_kind: TimeKind) -> Result<Series> {
        let records = self
            .timeline
            .into_iter()
            .zip(self.rows)
            .map(|(t, values)| Record::new(t, values))
            .collect();
        Ok(Series::from_records(time_column, self.columns, time_kind, records)?)
    }
}

/// Evaluates `value_columns` of `source` at every time in `target`.
///
/// Each column is interpolated independently against the source's time
/// column. Source records need not be sorted. Out-of-range target times are
/// handled by the interpolator's boundary policy.
///
/// # Errors
///
/// Returns an error if:
/// - A requested column does not exist
/// - A source or target time is not finite
/// - The source has fewer records than the method needs
/// - A target time is out of range under [`BoundaryPolicy::Reject`](crate::BoundaryPolicy::Reject)
///
/// # Example
///
/// ```
/// use sensor_fusion::{BoundaryPolicy, Interpolator, interpolate_onto};
/// use sensor_types::{Record, Series, TimeKind};
///
/// let imu = Series::from_records(
///     "t",
///     vec!["gx".to_string()],
///     TimeKind::Integer,
///     vec![Record::new(0.0, vec![0.0]), Record::new(10.0, vec![1.0])],
/// )
/// .unwrap();
///
/// let out = interpolate_onto(&imu, &["gx"], &[2.5, 5.0], &Interpolator::linear(BoundaryPolicy::Reject))
///     .unwrap();
/// assert_eq!(out.timeline, vec![2.5, 5.0]);
/// assert!((out.rows[1][0] - 0.5).abs() < 1e-12);
/// ```
pub fn interpolate_onto(
    source: &Series,
    value_columns: &[&str],
    target: &[f64],
    interpolator: &Interpolator,
) -> Result<Interpolated> {
    check_times(target).map_err(|err| match err {
        FusionError::InvalidTimestamp { index, value } => FusionError::insufficient_data(format!(
            "target timeline point {index} is not finite: {value}"
        )),
        other => other,
    })?;

    let indices = value_columns
        .iter()
        .map(|c| source.column_index(c))
        .collect::<sensor_types::Result<Vec<usize>>>()?;

    let needed = interpolator.method().min_samples();
    if source.len() < needed {
        return Err(FusionError::insufficient_data(format!(
            "{} interpolation of '{}' needs at least {needed} records, got {}",
            interpolator.method(),
            source.time_column(),
            source.len()
        )));
    }

    let times = source.times();
    let order = sorted_order(&times)?;

    let mut per_column = Vec::with_capacity(indices.len());
    for &index in &indices {
        let values: Vec<f64> = source.iter().map(|r| r.values()[index]).collect();
        let track = SampleTrack::from_order(&times, &values, &order)?;
        per_column.push(interpolator.evaluate_all(&track, target)?);
    }

    let rows = (0..target.len())
        .map(|i| per_column.iter().map(|column| column[i]).collect())
        .collect();

    debug!(
        source = source.time_column(),
        columns = value_columns.len(),
        targets = target.len(),
        method = %interpolator.method(),
        "Interpolated onto target timeline"
    );

    Ok(Interpolated {
        timeline: target.to_vec(),
        columns: value_columns.iter().map(|c| (*c).to_string()).collect(),
        rows,
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
    use approx::assert_relative_eq;

    use super::*;
    use crate::interpolation::{BoundaryPolicy, InterpolationMethod};

    fn source() -> Series {
        Series::from_records(
            "time_ms_loc",
            vec!["x".to_string(), "y".to_string()],
            TimeKind::Integer,
            vec![
                Record::new(50.0, vec![2.0, 20.0]),
                Record::new(0.0, vec![1.0, 10.0]),
                Record::new(150.0, vec![3.0, 30.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn identity_on_own_timestamps() {
        let src = source();
        let out = interpolate_onto(
            &src,
            &["x", "y"],
            &src.times(),
            &Interpolator::linear(BoundaryPolicy::Reject),
        )
        .unwrap();
        for (record, row) in src.iter().zip(&out.rows) {
            assert_eq!(record.values(), row.as_slice());
        }
    }

    #[test]
    fn row_count_matches_timeline() {
        let out = interpolate_onto(
            &source(),
            &["y"],
            &[0.0, 25.0, 100.0, 120.0],
            &Interpolator::linear(BoundaryPolicy::Reject),
        )
        .unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out.columns, vec!["y".to_string()]);
        assert_relative_eq!(out.rows[1][0], 15.0);
        assert_relative_eq!(out.rows[2][0], 25.0);
    }

    #[test]
    fn columns_follow_request_order() {
        let out = interpolate_onto(
            &source(),
            &["y", "x"],
            &[50.0],
            &Interpolator::linear(BoundaryPolicy::Reject),
        )
        .unwrap();
        assert_eq!(out.rows[0], vec![20.0, 2.0]);
    }

    #[test]
    fn boundary_policies() {
        let src = source();
        let targets = [-50.0, 200.0];

        let reject = interpolate_onto(&src, &["x"], &targets, &Interpolator::linear(BoundaryPolicy::Reject));
        assert!(matches!(reject, Err(FusionError::TimestampOutOfRange { .. })));

        let clamp = interpolate_onto(&src, &["x"], &targets, &Interpolator::linear(BoundaryPolicy::Clamp))
            .unwrap();
        assert_eq!(clamp.rows, vec![vec![1.0], vec![3.0]]);

        let extra = interpolate_onto(
            &src,
            &["x"],
            &targets,
            &Interpolator::linear(BoundaryPolicy::Extrapolate),
        )
        .unwrap();
        assert_relative_eq!(extra.rows[0][0], 0.0);
        assert_relative_eq!(extra.rows[1][0], 3.5);

        let fill = interpolate_onto(
            &src,
            &["x"],
            &targets,
            &Interpolator::linear(BoundaryPolicy::Fill(f64::NAN)),
        )
        .unwrap();
        assert!(fill.rows.iter().all(|r| r[0].is_nan()));
    }

    #[test]
    fn unknown_column() {
        let err = interpolate_onto(
            &source(),
            &["z"],
            &[0.0],
            &Interpolator::linear(BoundaryPolicy::Reject),
        )
        .unwrap_err();
        assert!(matches!(err, FusionError::Series(_)));
    }

    #[test]
    fn too_few_records() {
        let one = source().with_records(vec![Record::new(0.0, vec![1.0, 2.0])]).unwrap();
        let err = interpolate_onto(&one, &["x"], &[0.0], &Interpolator::linear(BoundaryPolicy::Clamp))
            .unwrap_err();
        assert!(matches!(err, FusionError::InsufficientData(_)));

        let nearest = Interpolator::new(InterpolationMethod::Nearest, BoundaryPolicy::Clamp);
        assert!(interpolate_onto(&one, &["x"], &[3.0], &nearest).is_ok());
    }

    #[test]
    fn non_finite_target_rejected() {
        let err = interpolate_onto(
            &source(),
            &["x"],
            &[0.0, f64::NAN],
            &Interpolator::linear(BoundaryPolicy::Clamp),
        )
        .unwrap_err();
        assert!(err.to_string().contains("target timeline point 1"));
    }

    #[test]
    fn into_series() {
        let series = interpolate_onto(
            &source(),
            &["x"],
            &[0.0, 75.0],
            &Interpolator::linear(BoundaryPolicy::Reject),
        )
        .unwrap()
        .into_series("frame_time", TimeKind::Integer)
        .unwrap();
        assert_eq!(series.time_column(), "frame_time");
        assert_eq!(series.columns(), ["x"]);
        assert_eq!(series.len(), 2);
        assert_relative_eq!(series.records()[1].values()[0], 2.25);
    }
}
