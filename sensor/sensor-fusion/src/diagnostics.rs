//! Sampling-rate and spectral checks for recorded streams.
//!
//! These are standalone analyses run on a stream before or after alignment.
//! The pipeline never calls them.
//!
//! # Example
//!
//! ```
//! use sensor_fusion::{FrequencySummary, estimate_frequencies, frequency_outliers};
//!
//! // Camera timestamps in milliseconds with one late frame.
//! let times = [0.0, 33.0, 66.0, 100.0, 133.0, 200.0, 233.0];
//! let hz = estimate_frequencies(&times, 2, 1e3).unwrap();
//!
//! let summary = FrequencySummary::from_frequencies(&hz).unwrap();
//! assert!(summary.mean > 20.0);
//!
//! let outliers = frequency_outliers(&hz);
//! assert_eq!(outliers[0].window, 4);
//! ```

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FusionError, Result, check_times};

/// Estimates the sampling frequency over sliding windows of timestamps.
///
/// Window `i` covers `times[i..i + window]`. Its frequency is
/// `ticks_per_second` divided by the mean interval inside the window, so
/// `ticks_per_second` is `1e3` for millisecond timestamps and `1e9` for
/// nanoseconds.
///
/// # Errors
///
/// Returns an error if:
/// - `window < 2` or there are fewer than `window` timestamps
/// - `ticks_per_second` is not positive
/// - A timestamp is not finite
/// - A window does not advance in time
pub fn estimate_frequencies(times: &[f64], window: usize, ticks_per_second: f64) -> Result<Vec<f64>> {
    if window < 2 {
        return Err(FusionError::invalid_config(format!(
            "frequency window must span at least 2 timestamps, got {window}"
        )));
    }
    if !(ticks_per_second.is_finite() && ticks_per_second > 0.0) {
        return Err(FusionError::invalid_config(format!(
            "ticks per second must be positive, got {ticks_per_second}"
        )));
    }
    if times.len() < window {
        return Err(FusionError::insufficient_data(format!(
            "frequency window of {window} needs at least {window} timestamps, got {}",
            times.len()
        )));
    }
    check_times(times)?;

    #[allow(clippy::cast_precision_loss)]
    let intervals = (window - 1) as f64;
    times
        .windows(window)
        .enumerate()
        .map(|(i, w)| {
            let mean_interval = (w[window - 1] - w[0]) / intervals;
            if mean_interval > 0.0 {
                Ok(ticks_per_second / mean_interval)
            } else {
                Err(FusionError::insufficient_data(format!(
                    "window {i} does not advance in time (mean interval {mean_interval})"
                )))
            }
        })
        .collect()
}

/// Spread of windowed frequency estimates around their mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencySummary {
    /// Number of windows.
    pub windows: usize,
    /// Mean frequency in Hz.
    pub mean: f64,
    /// Population standard deviation in Hz.
    pub std_dev: f64,
    /// Largest absolute deviation from the mean in Hz.
    pub max_deviation: f64,
}

impl FrequencySummary {
    /// Summarizes `frequencies`, or returns `None` if empty.
    #[must_use]
    pub fn from_frequencies(frequencies: &[f64]) -> Option<Self> {
        if frequencies.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = frequencies.len() as f64;
        let mean = frequencies.iter().sum::<f64>() / n;
        let variance = frequencies.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;
        let max_deviation = frequencies
            .iter()
            .map(|f| (f - mean).abs())
            .fold(0.0, f64::max);

        Some(Self {
            windows: frequencies.len(),
            mean,
            std_dev: variance.sqrt(),
            max_deviation,
        })
    }
}

/// A window whose frequency falls outside the interquartile fences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyOutlier {
    /// Index of the window.
    pub window: usize,
    /// Estimated frequency in Hz.
    pub hz: f64,
}

/// Flags windows outside `[q1 - 1.5 * iqr, q3 + 1.5 * iqr]`.
///
/// Quartiles are taken by position, `q1 = sorted[n / 4]` and
/// `q3 = sorted[3n / 4]`, without interpolation. Results are ordered by
/// ascending frequency.
#[must_use]
pub fn frequency_outliers(frequencies: &[f64]) -> Vec<FrequencyOutlier> {
    let mut sorted: Vec<FrequencyOutlier> = frequencies
        .iter()
        .enumerate()
        .map(|(window, &hz)| FrequencyOutlier { window, hz })
        .collect();
    if sorted.is_empty() {
        return sorted;
    }
    sorted.sort_by(|a, b| a.hz.total_cmp(&b.hz));

    let n = sorted.len();
    let q1 = sorted[n / 4].hz;
    let q3 = sorted[3 * n / 4].hz;
    let iqr = q3 - q1;
    let (lower, upper) = (1.5f64.mul_add(-iqr, q1), 1.5f64.mul_add(iqr, q3));
    debug!(q1, q3, lower, upper, "Frequency fences");

    sorted.retain(|o| o.hz < lower || o.hz > upper);
    sorted
}

/// Returns the band that folds back when decimating from `sample_rate_hz` to
/// `resample_rate_hz`, as `(resample Nyquist, original Nyquist)`.
///
/// Returns `None` when the new rate is not lower than the original.
///
/// # Example
///
/// ```
/// use sensor_fusion::aliasing_band;
///
/// assert_eq!(aliasing_band(200.0, 60.0), Some((30.0, 100.0)));
/// assert_eq!(aliasing_band(60.0, 60.0), None);
/// ```
#[must_use]
pub fn aliasing_band(sample_rate_hz: f64, resample_rate_hz: f64) -> Option<(f64, f64)> {
    (resample_rate_hz < sample_rate_hz).then(|| (resample_rate_hz / 2.0, sample_rate_hz / 2.0))
}

/// Fraction of one-sided spectral energy at frequencies above `cutoff_hz`.
///
/// Energy is the squared magnitude of each bin of the forward transform from
/// DC up to Nyquist. A signal with no energy yields `0.0`.
///
/// # Errors
///
/// Returns an error if the signal is empty or has non-finite samples, or if
/// the sample rate is not positive.
pub fn energy_above_cutoff(signal: &[f64], sample_rate_hz: f64, cutoff_hz: f64) -> Result<f64> {
    if signal.is_empty() {
        return Err(FusionError::insufficient_data("spectrum of an empty signal"));
    }
    if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
        return Err(FusionError::invalid_config(format!(
            "sample rate must be positive, got {sample_rate_hz} Hz"
        )));
    }
    if let Some(i) = signal.iter().position(|v| !v.is_finite()) {
        return Err(FusionError::insufficient_data(format!(
            "signal sample {i} is not finite"
        )));
    }

    let n = signal.len();
    let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&v| Complex::new(v, 0.0)).collect();
    FftPlanner::<f64>::new()
        .plan_fft_forward(n)
        .process(&mut buffer);

    #[allow(clippy::cast_precision_loss)]
    let resolution = sample_rate_hz / n as f64;
    let (total, above) = buffer[..=n / 2].iter().enumerate().fold(
        (0.0, 0.0),
        |(total, above), (k, bin)| {
            let energy = bin.norm_sqr();
            #[allow(clippy::cast_precision_loss)]
            let freq = k as f64 * resolution;
            (total + energy, if freq > cutoff_hz { above + energy } else { above })
        },
    );

    if total == 0.0 {
        return Ok(0.0);
    }
    Ok(above / total)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::similar_names
)]
mod tests {
    use std::f64::consts::TAU;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn steady_stream_has_constant_frequency() {
        let times = [0.0, 10.0, 20.0, 30.0, 40.0];
        let hz = estimate_frequencies(&times, 3, 1e3).unwrap();
        assert_eq!(hz.len(), 3);
        for f in hz {
            assert_relative_eq!(f, 100.0);
        }
    }

    #[test]
    fn nanosecond_scale() {
        let period = 1e9 / 60.0;
        let times: Vec<f64> = (0..10).map(|i| f64::from(i) * period).collect();
        let hz = estimate_frequencies(&times, 5, 1e9).unwrap();
        assert!(hz.iter().all(|f| (f - 60.0).abs() < 1e-9));
    }

    #[test]
    fn estimate_rejects_bad_input() {
        assert!(estimate_frequencies(&[0.0, 1.0], 1, 1.0).is_err());
        assert!(estimate_frequencies(&[0.0, 1.0], 3, 1.0).is_err());
        assert!(estimate_frequencies(&[0.0, 1.0], 2, 0.0).is_err());
        assert!(estimate_frequencies(&[0.0, f64::NAN], 2, 1.0).is_err());
        assert!(estimate_frequencies(&[0.0, 0.0, 1.0], 2, 1.0).is_err());
    }

    #[test]
    fn summary_statistics() {
        let s = FrequencySummary::from_frequencies(&[99.0, 101.0]).unwrap();
        assert_eq!(s.windows, 2);
        assert_relative_eq!(s.mean, 100.0);
        assert_relative_eq!(s.std_dev, 1.0);
        assert_relative_eq!(s.max_deviation, 1.0);
        assert!(FrequencySummary::from_frequencies(&[]).is_none());
    }

    #[test]
    fn outliers_by_position_quartiles() {
        let hz = [100.0, 100.0, 101.0, 99.0, 100.0, 100.0, 100.0, 150.0, 100.0];
        let outliers = frequency_outliers(&hz);
        assert_eq!(
            outliers,
            vec![
                FrequencyOutlier { window: 3, hz: 99.0 },
                FrequencyOutlier { window: 2, hz: 101.0 },
                FrequencyOutlier { window: 7, hz: 150.0 },
            ]
        );
    }

    #[test]
    fn no_outliers_in_spread_data() {
        let hz = [98.0, 99.0, 100.0, 101.0, 102.0];
        assert!(frequency_outliers(&hz).is_empty());
        assert!(frequency_outliers(&[]).is_empty());
    }

    #[test]
    fn aliasing() {
        assert_eq!(aliasing_band(200.0, 60.0), Some((30.0, 100.0)));
        assert_eq!(aliasing_band(100.0, 100.0), None);
        assert_eq!(aliasing_band(100.0, 200.0), None);
    }

    #[test]
    fn energy_of_pure_tone() {
        let rate = 100.0;
        let signal: Vec<f64> = (0..100)
            .map(|i| (TAU * 10.0 * f64::from(i) / rate).sin())
            .collect();
        assert_relative_eq!(energy_above_cutoff(&signal, rate, 5.0).unwrap(), 1.0, epsilon = 1e-9);
        assert!(energy_above_cutoff(&signal, rate, 20.0).unwrap() < 1e-9);
    }

    #[test]
    fn energy_of_constant_is_dc() {
        let signal = [2.0; 16];
        assert_relative_eq!(energy_above_cutoff(&signal, 16.0, 0.0).unwrap(), 0.0, epsilon = 1e-12);
        assert_eq!(energy_above_cutoff(&[0.0; 8], 8.0, 1.0).unwrap(), 0.0);
    }

    #[test]
    fn energy_rejects_bad_input() {
        assert!(energy_above_cutoff(&[], 100.0, 1.0).is_err());
        assert!(energy_above_cutoff(&[1.0], 0.0, 1.0).is_err());
        assert!(energy_above_cutoff(&[1.0, f64::NAN], 10.0, 1.0).is_err());
    }
}
