//! Time-sorted sample tracks for a single channel.

use sensor_types::TimeRange;

use crate::error::{FusionError, Result, check_times};

/// A time-sorted track of `(time, value)` samples for one channel.
///
/// Tracks are built from series columns, which may be unsorted. Sorting is
/// stable, so samples sharing a time keep their original relative order.
///
/// # Example
///
/// ```
/// use sensor_fusion::SampleTrack;
///
/// let track = SampleTrack::from_unsorted(&[2.0, 0.0, 1.0], &[30.0, 10.0, 20.0]).unwrap();
///
/// assert_eq!(track.len(), 3);
/// assert_eq!(track.find_bracket(1.5), Some((1, 2)));
/// assert!((track.get(0).unwrap().1 - 10.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTrack {
    samples: Vec<(f64, f64)>,
}

impl SampleTrack {
    /// Builds a track from parallel time and value slices.
    ///
    /// # Errors
    ///
    /// Returns an error if the slices differ in length or a time value is not
    /// finite.
    pub fn from_unsorted(times: &[f64], values: &[f64]) -> Result<Self> {
        let order = sorted_order(times)?;
        Self::from_order(times, values, &order)
    }

    /// Builds a track using a precomputed sort order of `times`.
    ///
    /// This lets several channels of one series share a single sort.
    ///
    /// # Errors
    ///
    /// Returns an error if the slices differ in length.
    pub(crate) fn from_order(times: &[f64], values: &[f64], order: &[usize]) -> Result<Self> {
        if times.len() != values.len() || order.len() != times.len() {
            return Err(FusionError::insufficient_data(format!(
                "{} time values but {} channel values",
                times.len(),
                values.len()
            )));
        }
        let samples = order.iter().map(|&i| (times[i], values[i])).collect();
        Ok(Self { samples })
    }

    /// Returns the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the track has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Gets a sample by sorted index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&(f64, f64)> {
        self.samples.get(index)
    }

    /// Returns the earliest sample.
    #[must_use]
    pub fn first(&self) -> Option<&(f64, f64)> {
        self.samples.first()
    }

    /// Returns the latest sample.
    #[must_use]
    pub fn last(&self) -> Option<&(f64, f64)> {
        self.samples.last()
    }

    /// Returns an iterator over samples in time order.
    pub fn iter(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.samples.iter()
    }

    /// Returns the sample times in order.
    #[must_use]
    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|(t, _)| *t).collect()
    }

    /// Returns the time range `[first, last]`.
    ///
    /// Returns `None` if the track is empty.
    #[must_use]
    pub fn time_range(&self) -> Option<TimeRange> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        Some(TimeRange::new(first.0, last.0))
    }

    /// Finds samples bracketing the given time.
    ///
    /// Returns indices `(before, after)` where:
    /// - `before` is the index of the sample at or before `time`
    /// - `after` is the index of the sample at or after `time`
    ///
    /// An exact hit returns the first sample at that time twice.
    /// Returns `None` if `time` is outside the track range.
    #[must_use]
    pub fn find_bracket(&self, time: f64) -> Option<(usize, usize)> {
        let range = self.time_range()?;
        if !range.contains(time) {
            return None;
        }

        // First sample with t >= time
        let lo = self.samples.partition_point(|(t, _)| *t < time);

        if lo == 0 {
            Some((0, 0))
        } else if lo >= self.samples.len() {
            Some((self.samples.len() - 1, self.samples.len() - 1))
        } else if (self.samples[lo].0 - time).abs() < 1e-12 {
            Some((lo, lo))
        } else {
            Some((lo - 1, lo))
        }
    }
}

/// Returns the stable ascending sort order of `times`.
///
/// # Errors
///
/// Returns an error naming the first non-finite time.
pub(crate) fn sorted_order(times: &[f64]) -> Result<Vec<usize>> {
    check_times(times)?;
    let mut order: Vec<usize> = (0..times.len()).collect();
    order.sort_by(|&a, &b| times[a].total_cmp(&times[b]));
    Ok(order)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn track() -> SampleTrack {
        SampleTrack::from_unsorted(&[0.0, 1.0, 2.0, 3.0], &[1.0, 2.0, 3.0, 4.0]).unwrap()
    }

    #[test]
    fn track_sorts_input() {
        let track = SampleTrack::from_unsorted(&[3.0, 1.0, 2.0], &[30.0, 10.0, 20.0]).unwrap();
        assert_eq!(track.times(), vec![1.0, 2.0, 3.0]);
        assert_eq!(track.first(), Some(&(1.0, 10.0)));
        assert_eq!(track.last(), Some(&(3.0, 30.0)));
    }

    #[test]
    fn track_sort_is_stable() {
        let track = SampleTrack::from_unsorted(&[1.0, 0.0, 1.0], &[5.0, 0.0, 7.0]).unwrap();
        let values: Vec<f64> = track.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![0.0, 5.0, 7.0]);
    }

    #[test]
    fn track_rejects_bad_input() {
        assert!(SampleTrack::from_unsorted(&[0.0, 1.0], &[1.0]).is_err());
        let err = SampleTrack::from_unsorted(&[0.0, f64::NAN], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, FusionError::InvalidTimestamp { index: 1, .. }));
    }

    #[test]
    fn track_time_range() {
        let range = track().time_range().unwrap();
        assert_eq!(range.start, 0.0);
        assert_eq!(range.end, 3.0);

        let empty = SampleTrack::from_unsorted(&[], &[]).unwrap();
        assert!(empty.is_empty());
        assert!(empty.time_range().is_none());
    }

    #[test]
    fn track_find_bracket() {
        let track = track();

        // Exact match
        assert_eq!(track.find_bracket(1.0), Some((1, 1)));

        // Between samples
        assert_eq!(track.find_bracket(1.5), Some((1, 2)));

        // At boundaries
        assert_eq!(track.find_bracket(0.0), Some((0, 0)));
        assert_eq!(track.find_bracket(3.0), Some((3, 3)));

        // Outside range
        assert!(track.find_bracket(-1.0).is_none());
        assert!(track.find_bracket(5.0).is_none());
    }

    #[test]
    fn track_find_bracket_duplicates() {
        let track = SampleTrack::from_unsorted(&[0.0, 1.0, 1.0, 2.0], &[0.0, 1.0, 9.0, 2.0]).unwrap();
        assert_eq!(track.find_bracket(1.0), Some((1, 1)));
        assert_eq!(track.find_bracket(1.5), Some((2, 3)));
    }
}
