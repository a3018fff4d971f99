//! Fixed-rate resampling onto a uniform timeline.

use sensor_types::{Series, TimeKind, TimeUnit};
use tracing::{debug, info};

use crate::cross::interpolate_onto;
use crate::error::{FusionError, Result, check_times};
use crate::interpolation::{BoundaryPolicy, Interpolator};

/// Upper bound on generated timeline points.
///
/// A rate given in the wrong time unit easily asks for billions of points.
pub const MAX_TIMELINE_POINTS: usize = 50_000_000;

/// Relative slack when deciding whether the span is a whole number of steps.
const STEP_TOLERANCE: f64 = 1e-9;

/// Builds `start, start + step, ...` up to the first point at or after `end`.
///
/// The first point is exactly `start`. Each point is computed as
/// `start + i * step` rather than by accumulation, so long timelines do not
/// drift. A span within floating-point noise of a whole number of steps ends
/// exactly on that step instead of adding one more.
///
/// # Errors
///
/// Returns an error if an input is not finite, `step` is not positive,
/// `end < start`, or the timeline would exceed [`MAX_TIMELINE_POINTS`].
///
/// # Example
///
/// ```
/// use sensor_fusion::uniform_timeline;
///
/// assert_eq!(uniform_timeline(0.0, 25.0, 10.0).unwrap(), vec![0.0, 10.0, 20.0, 30.0]);
/// assert_eq!(uniform_timeline(0.0, 20.0, 10.0).unwrap(), vec![0.0, 10.0, 20.0]);
/// ```
pub fn uniform_timeline(start: f64, end: f64, step: f64) -> Result<Vec<f64>> {
    if !start.is_finite() || !end.is_finite() {
        return Err(FusionError::invalid_config(format!(
            "timeline bounds must be finite, got [{start}, {end}]"
        )));
    }
    if !step.is_finite() || step <= 0.0 {
        return Err(FusionError::invalid_config(format!(
            "timeline step must be positive, got {step}"
        )));
    }
    if end < start {
        return Err(FusionError::invalid_config(format!(
            "timeline end {end} is before start {start}"
        )));
    }

    let steps = (end - start) / step;
    let rounded = steps.round();
    let steps = if (steps - rounded).abs() <= STEP_TOLERANCE * rounded.max(1.0) {
        rounded
    } else {
        steps.ceil()
    };
    // Saturating cast; the bound check below catches huge spans.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let steps = steps as usize;
    if steps >= MAX_TIMELINE_POINTS {
        return Err(FusionError::invalid_config(format!(
            "timeline of {steps} steps exceeds {MAX_TIMELINE_POINTS} points"
        )));
    }

    #[allow(clippy::cast_precision_loss)]
    Ok((0..=steps).map(|i| step.mul_add(i as f64, start)).collect())
}

/// Regenerates `series` at `target_freq_hz` with linear interpolation.
///
/// The timeline starts at the minimum time, steps by
/// `unit.ticks_per_second() / target_freq_hz` and ends at or after the
/// maximum time. `unit` must be the unit of the series' time column; with
/// [`TimeUnit::Nanoseconds`] the step is `1e9 / target_freq_hz`. Every value
/// column is interpolated independently, extrapolating linearly past the
/// last sample. The output keeps the column names and has a float time
/// column.
///
/// # Errors
///
/// Returns an error if:
/// - The series has fewer than two records
/// - The frequency is not a positive finite number
/// - A time value is not finite
///
/// # Example
///
/// ```
/// use sensor_fusion::resample_to_rate;
/// use sensor_types::{Record, Series, TimeKind, TimeUnit};
///
/// let imu = Series::from_records(
///     "t",
///     vec!["ax".to_string()],
///     TimeKind::Integer,
///     vec![Record::new(0.0, vec![0.0]), Record::new(1000.0, vec![10.0])],
/// )
/// .unwrap();
///
/// let resampled = resample_to_rate(&imu, 4.0, TimeUnit::Milliseconds).unwrap();
/// assert_eq!(resampled.times(), vec![0.0, 250.0, 500.0, 750.0, 1000.0]);
/// assert_eq!(resampled.records()[2].values(), [5.0]);
/// ```
pub fn resample_to_rate(series: &Series, target_freq_hz: f64, unit: TimeUnit) -> Result<Series> {
    if !target_freq_hz.is_finite() || target_freq_hz <= 0.0 {
        return Err(FusionError::invalid_config(format!(
            "target frequency must be positive, got {target_freq_hz} Hz"
        )));
    }
    if series.len() < 2 {
        return Err(FusionError::insufficient_data(format!(
            "resampling '{}' needs at least 2 records, got {}",
            series.time_column(),
            series.len()
        )));
    }

    let times = series.times();
    check_times(&times)?;
    let (start, end) = times
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| {
            (lo.min(t), hi.max(t))
        });

    let step = unit.period_for_rate(target_freq_hz);
    let timeline = uniform_timeline(start, end, step)?;
    debug!(
        column = series.time_column(),
        start,
        end,
        step,
        points = timeline.len(),
        "Built uniform timeline"
    );

    let columns: Vec<&str> = series.columns().iter().map(String::as_str).collect();
    let resampled = interpolate_onto(
        series,
        &columns,
        &timeline,
        &Interpolator::linear(BoundaryPolicy::Extrapolate),
    )?
    .into_series(series.time_column(), TimeKind::Float)?;

    info!(
        column = series.time_column(),
        input = series.len(),
        output = resampled.len(),
        rate_hz = target_freq_hz,
        unit = unit.short_name(),
        "Resampled stream"
    );

    Ok(resampled)
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
    use sensor_types::Record;

    use super::*;

    fn imu(samples: &[(f64, f64)]) -> Series {
        Series::from_records(
            "timestamp_ns",
            vec!["ax".to_string(), "ay".to_string()],
            TimeKind::Integer,
            samples
                .iter()
                .map(|&(t, v)| Record::new(t, vec![v, -v]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn timeline_covers_end() {
        let line = uniform_timeline(5.0, 26.0, 10.0).unwrap();
        assert_eq!(line, vec![5.0, 15.0, 25.0, 35.0]);
    }

    #[test]
    fn timeline_exact_multiple_has_no_extra_point() {
        let step = 1e9 / 60.0;
        let line = uniform_timeline(0.0, 1e9, step).unwrap();
        assert_eq!(line.len(), 61);
        assert_relative_eq!(*line.last().unwrap(), 1e9, max_relative = 1e-12);
    }

    #[test]
    fn timeline_single_point() {
        assert_eq!(uniform_timeline(3.0, 3.0, 1.0).unwrap(), vec![3.0]);
    }

    #[test]
    fn timeline_rejects_bad_inputs() {
        assert!(uniform_timeline(0.0, 1.0, 0.0).is_err());
        assert!(uniform_timeline(0.0, 1.0, -1.0).is_err());
        assert!(uniform_timeline(0.0, 1.0, f64::NAN).is_err());
        assert!(uniform_timeline(2.0, 1.0, 1.0).is_err());
        assert!(uniform_timeline(f64::NAN, 1.0, 1.0).is_err());
        assert!(uniform_timeline(0.0, 1e12, 1.0).is_err());
    }

    #[test]
    fn resample_nanoseconds_step() {
        let s = imu(&[(0.0, 0.0), (1e8, 1.0), (2e8, 2.0)]);
        let out = resample_to_rate(&s, 20.0, TimeUnit::Nanoseconds).unwrap();
        assert_eq!(out.times(), vec![0.0, 5e7, 1e8, 1.5e8, 2e8]);
        assert_relative_eq!(out.records()[1].values()[0], 0.5);
        assert_relative_eq!(out.records()[3].values()[1], -1.5);
        assert_eq!(out.columns(), ["ax", "ay"]);
        assert_eq!(out.time_kind(), TimeKind::Float);
    }

    #[test]
    fn resample_extrapolates_past_last_sample() {
        let s = imu(&[(0.0, 0.0), (100.0, 1.0), (250.0, 4.0)]);
        let out = resample_to_rate(&s, 10.0, TimeUnit::Milliseconds).unwrap();
        assert_eq!(out.times(), vec![0.0, 100.0, 200.0, 300.0]);
        assert_relative_eq!(out.records()[2].values()[0], 3.0);
        assert_relative_eq!(out.records()[3].values()[0], 5.0);
    }

    #[test]
    fn resample_keeps_values_at_coinciding_times() {
        let s = imu(&[(0.0, 3.0), (10.0, -1.0), (20.0, 7.0)]);
        let out = resample_to_rate(&s, 100.0, TimeUnit::Milliseconds).unwrap();
        assert_eq!(out.times(), vec![0.0, 10.0, 20.0]);
        for (a, b) in out.iter().zip(s.iter()) {
            assert_relative_eq!(a.values()[0], b.values()[0]);
        }
    }

    #[test]
    fn resample_unsorted_input() {
        let s = imu(&[(20.0, 2.0), (0.0, 0.0), (10.0, 1.0)]);
        let out = resample_to_rate(&s, 200.0, TimeUnit::Milliseconds).unwrap();
        assert_eq!(out.len(), 5);
        assert_relative_eq!(out.records()[3].values()[0], 1.5);
    }

    #[test]
    fn resample_needs_two_records() {
        let one = imu(&[(0.0, 1.0)]);
        assert!(matches!(
            resample_to_rate(&one, 60.0, TimeUnit::Nanoseconds),
            Err(FusionError::InsufficientData(_))
        ));
        assert!(resample_to_rate(&imu(&[]), 60.0, TimeUnit::Nanoseconds).is_err());
    }

    #[test]
    fn resample_rejects_bad_rate() {
        let s = imu(&[(0.0, 0.0), (1.0, 1.0)]);
        for hz in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                resample_to_rate(&s, hz, TimeUnit::Seconds),
                Err(FusionError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn resample_rejects_missing_time() {
        let s = imu(&[(0.0, 0.0), (f64::NAN, 1.0), (2.0, 2.0)]);
        assert!(matches!(
            resample_to_rate(&s, 1.0, TimeUnit::Seconds),
            Err(FusionError::InvalidTimestamp { index: 1, .. })
        ));
    }
}
