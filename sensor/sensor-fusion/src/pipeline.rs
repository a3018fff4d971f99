//! Alignment pipeline for one reference/data stream pair.
//!
//! The stages run in a fixed order and each consumes the previous stage's
//! full output:
//!
//! 1. **Fill** gaps in the reference stream
//! 2. **Normalize** the data stream by collapsing duplicate timestamps, when
//!    the caller says it has them
//! 3. **Canonicalize** the data stream to a fixed rate, when configured
//! 4. **Align** the data stream onto the filled reference timestamps
//!
//! The first failing stage aborts the pair. Nothing is shared between calls,
//! so independent pairs can run on separate threads.
//!
//! # Example
//!
//! ```
//! use sensor_fusion::{AlignmentConfig, BoundaryPolicy, DuplicateHandling, Interpolator, align};
//! use sensor_types::{Record, Series, TimeKind};
//!
//! let camera = Series::from_records(
//!     "time_ms",
//!     vec![],
//!     TimeKind::Integer,
//!     [0.0, 30.0, 100.0, 130.0].iter().map(|&t| Record::new(t, vec![])).collect(),
//! )
//! .unwrap();
//! let imu = Series::from_records(
//!     "time_ms",
//!     vec!["ax".to_string()],
//!     TimeKind::Integer,
//!     vec![
//!         Record::new(0.0, vec![1.0]),
//!         Record::new(50.0, vec![2.0]),
//!         Record::new(150.0, vec![3.0]),
//!     ],
//! )
//! .unwrap();
//!
//! let config = AlignmentConfig::new(
//!     40.0,
//!     DuplicateHandling::Unique,
//!     None,
//!     Interpolator::linear(BoundaryPolicy::Reject),
//! );
//! let alignment = align(&camera, &imu, &["ax"], &config).unwrap();
//!
//! assert_eq!(alignment.aligned.times(), vec![0.0, 30.0, 65.0, 100.0, 130.0]);
//! assert_eq!(alignment.report.gaps_filled, 1);
//! ```

use std::borrow::Cow;
use std::fmt;

use sensor_types::{Series, TimeUnit};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::cross::interpolate_onto;
use crate::dedup::collapse_duplicates;
use crate::error::{FusionError, Result};
use crate::gap::fill_gaps;
use crate::interpolation::Interpolator;
use crate::resample::resample_to_rate;

/// Whether the data stream may contain repeated timestamps.
///
/// Set by the caller from what is known about the sensor; the pipeline never
/// inspects content to decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateHandling {
    /// Timestamps are unique; the stream passes through unchanged.
    Unique,

    /// Records sharing a timestamp are averaged into one.
    Collapse,
}

/// Fixed rate the data stream is resampled to before alignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRate {
    /// Target frequency in Hz.
    pub hz: f64,
    /// Unit of the data stream's time column.
    pub unit: TimeUnit,
}

impl CanonicalRate {
    /// Creates a canonical rate.
    #[must_use]
    pub const fn new(hz: f64, unit: TimeUnit) -> Self {
        Self { hz, unit }
    }
}

/// Settings for [`align`].
///
/// Every field is required; there is no `Default`.
///
/// # Example
///
/// ```
/// use sensor_fusion::{
///     AlignmentConfig, BoundaryPolicy, CanonicalRate, DuplicateHandling, Interpolator,
/// };
/// use sensor_types::TimeUnit;
///
/// let config = AlignmentConfig::new(
///     40.0,
///     DuplicateHandling::Unique,
///     None,
///     Interpolator::linear(BoundaryPolicy::Clamp),
/// )
/// .with_duplicates(DuplicateHandling::Collapse)
/// .with_canonical_rate(CanonicalRate::new(60.0, TimeUnit::Nanoseconds));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Reference deltas strictly above this value are gaps.
    pub gap_threshold: f64,

    /// Duplicate timestamp handling for the data stream.
    pub duplicates: DuplicateHandling,

    /// Optional fixed rate for the data stream.
    pub canonical_rate: Option<CanonicalRate>,

    /// Kernel and boundary policy for the final alignment.
    pub interpolator: Interpolator,
}

impl AlignmentConfig {
    /// Creates a configuration from every setting.
    #[must_use]
    pub const fn new(
        gap_threshold: f64,
        duplicates: DuplicateHandling,
        canonical_rate: Option<CanonicalRate>,
        interpolator: Interpolator,
    ) -> Self {
        Self {
            gap_threshold,
            duplicates,
            canonical_rate,
            interpolator,
        }
    }

    /// Set the gap threshold.
    #[must_use]
    pub const fn with_gap_threshold(mut self, gap_threshold: f64) -> Self {
        self.gap_threshold = gap_threshold;
        self
    }

    /// Set the duplicate handling.
    #[must_use]
    pub const fn with_duplicates(mut self, duplicates: DuplicateHandling) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Resample the data stream to `rate` before aligning.
    #[must_use]
    pub const fn with_canonical_rate(mut self, rate: CanonicalRate) -> Self {
        self.canonical_rate = Some(rate);
        self
    }

    /// Align the data stream at its native rate.
    #[must_use]
    pub const fn without_canonical_rate(mut self) -> Self {
        self.canonical_rate = None;
        self
    }

    /// Set the interpolator.
    #[must_use]
    pub const fn with_interpolator(mut self, interpolator: Interpolator) -> Self {
        self.interpolator = interpolator;
        self
    }

    /// Checks the numeric settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the gap threshold is `NaN` or the canonical rate
    /// is not a positive finite number.
    pub fn validate(&self) -> Result<()> {
        if self.gap_threshold.is_nan() {
            return Err(FusionError::invalid_config("gap threshold must be a number"));
        }
        match self.canonical_rate {
            Some(rate) if !(rate.hz.is_finite() && rate.hz > 0.0) => {
                Err(FusionError::invalid_config(format!(
                    "canonical rate must be positive, got {} Hz",
                    rate.hz
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Configuration and column checks before any stage runs.
    Validate,
    /// Reference gap filling.
    Fill,
    /// Duplicate collapsing.
    Normalize,
    /// Fixed-rate resampling.
    Canonicalize,
    /// Cross-stream interpolation onto the reference.
    Align,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Fill => "fill",
            Self::Normalize => "normalize",
            Self::Canonicalize => "canonicalize",
            Self::Align => "align",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failure in one pipeline stage.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    /// The stage that failed.
    pub stage: Stage,
    /// The underlying error.
    pub source: FusionError,
}

impl PipelineError {
    /// Creates a pipeline error.
    #[must_use]
    pub const fn new(stage: Stage, source: FusionError) -> Self {
        Self { stage, source }
    }

    fn at(stage: Stage) -> impl FnOnce(FusionError) -> Self {
        move |source| Self::new(stage, source)
    }
}

/// Counters collected while aligning one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// Synthetic records inserted into the reference.
    pub gaps_filled: usize,
    /// Data records removed by duplicate collapsing.
    pub duplicates_removed: usize,
    /// Data length after resampling, if it ran.
    pub resampled_len: Option<usize>,
    /// Records in the aligned output.
    pub aligned_len: usize,
}

/// Output of [`align`].
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    /// The reference stream after gap filling.
    pub filled_reference: Series,
    /// Data values at every filled reference timestamp, keyed by the
    /// reference's time column.
    pub aligned: Series,
    /// Stage counters.
    pub report: AlignmentReport,
}

/// Aligns `value_columns` of `data` onto the timestamps of `reference`.
///
/// The aligned series has one record per filled reference record, in
/// reference order, with the reference's time column name and time kind.
///
/// # Errors
///
/// Returns a [`PipelineError`] naming the first stage that failed.
pub fn align(
    reference: &Series,
    data: &Series,
    value_columns: &[&str],
    config: &AlignmentConfig,
) -> std::result::Result<Alignment, PipelineError> {
    config.validate().map_err(PipelineError::at(Stage::Validate))?;
    for column in value_columns {
        data.column_index(column)
            .map_err(|err| PipelineError::new(Stage::Validate, err.into()))?;
    }

    let filled_reference =
        fill_gaps(reference, config.gap_threshold).map_err(PipelineError::at(Stage::Fill))?;
    let gaps_filled = filled_reference.len() - reference.len();
    debug!(
        reference = reference.time_column(),
        gaps_filled, "Fill stage complete"
    );

    let normalized: Cow<'_, Series> = match config.duplicates {
        DuplicateHandling::Unique => Cow::Borrowed(data),
        DuplicateHandling::Collapse => Cow::Owned(
            collapse_duplicates(data).map_err(PipelineError::at(Stage::Normalize))?,
        ),
    };
    let duplicates_removed = data.len() - normalized.len();
    debug!(
        data = data.time_column(),
        duplicates_removed, "Normalize stage complete"
    );

    let canonical: Cow<'_, Series> = match config.canonical_rate {
        Some(rate) => Cow::Owned(
            resample_to_rate(&normalized, rate.hz, rate.unit)
                .map_err(PipelineError::at(Stage::Canonicalize))?,
        ),
        None => normalized,
    };
    let resampled_len = config.canonical_rate.map(|_| canonical.len());
    debug!(
        data = data.time_column(),
        resampled_len, "Canonicalize stage complete"
    );

    let aligned = interpolate_onto(
        &canonical,
        value_columns,
        &filled_reference.times(),
        &config.interpolator,
    )
    .and_then(|m| m.into_series(reference.time_column(), reference.time_kind()))
    .map_err(PipelineError::at(Stage::Align))?;

    let report = AlignmentReport {
        gaps_filled,
        duplicates_removed,
        resampled_len,
        aligned_len: aligned.len(),
    };
    info!(
        reference = reference.time_column(),
        columns = value_columns.len(),
        gaps_filled = report.gaps_filled,
        duplicates_removed = report.duplicates_removed,
        aligned = report.aligned_len,
        "Aligned stream pair"
    );

    Ok(Alignment {
        filled_reference,
        aligned,
        report,
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
    use sensor_types::{Record, TimeKind};

    use super::*;
    use crate::interpolation::{BoundaryPolicy, InterpolationMethod};

    fn reference(times: &[f64]) -> Series {
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

    fn data(samples: &[(f64, f64)]) -> Series {
        Series::from_records(
            "time_ms_loc",
            vec!["ax".to_string(), "ay".to_string()],
            TimeKind::Integer,
            samples
                .iter()
                .map(|&(t, v)| Record::new(t, vec![v, 10.0 * v]))
                .collect(),
        )
        .unwrap()
    }

    fn config(boundary: BoundaryPolicy) -> AlignmentConfig {
        AlignmentConfig::new(
            40.0,
            DuplicateHandling::Unique,
            None,
            Interpolator::linear(boundary),
        )
    }

    #[test]
    fn end_to_end_scenario() {
        let out = align(
            &reference(&[0.0, 30.0, 100.0, 130.0]),
            &data(&[(0.0, 1.0), (50.0, 2.0), (150.0, 3.0)]),
            &["ax"],
            &config(BoundaryPolicy::Reject),
        )
        .unwrap();

        assert_eq!(out.aligned.times(), vec![0.0, 30.0, 65.0, 100.0, 130.0]);
        let ax: Vec<f64> = out.aligned.column_values("ax").unwrap();
        for (got, want) in ax.iter().zip([1.0, 1.6, 2.15, 2.5, 2.8]) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
        assert_eq!(out.aligned.time_column(), "time_ms_loc");
        assert_eq!(out.aligned.time_kind(), TimeKind::Integer);
        assert_eq!(out.aligned.columns(), ["ax"]);
        assert_eq!(
            out.report,
            AlignmentReport {
                gaps_filled: 1,
                duplicates_removed: 0,
                resampled_len: None,
                aligned_len: 5,
            }
        );
        assert_eq!(out.filled_reference.len(), 5);
    }

    #[test]
    fn collapse_runs_before_alignment() {
        let cfg = config(BoundaryPolicy::Reject).with_duplicates(DuplicateHandling::Collapse);
        let out = align(
            &reference(&[0.0, 10.0]),
            &data(&[(0.0, 1.0), (0.0, 3.0), (10.0, 4.0)]),
            &["ax", "ay"],
            &cfg,
        )
        .unwrap();
        assert_eq!(out.report.duplicates_removed, 1);
        assert_eq!(out.aligned.records()[0].values(), [2.0, 20.0]);
    }

    #[test]
    fn canonical_rate_resamples_first() {
        let cfg = config(BoundaryPolicy::Clamp)
            .with_canonical_rate(CanonicalRate::new(100.0, TimeUnit::Milliseconds));
        let out = align(
            &reference(&[0.0, 15.0, 30.0]),
            &data(&[(0.0, 0.0), (25.0, 2.5)]),
            &["ax"],
            &cfg,
        )
        .unwrap();
        // Resampled onto 0, 10, 20, 30 with linear extrapolation.
        assert_eq!(out.report.resampled_len, Some(4));
        assert_relative_eq!(out.aligned.records()[1].values()[0], 1.5);
        assert_relative_eq!(out.aligned.records()[2].values()[0], 3.0);
    }

    #[test]
    fn boundary_policy_applies_to_alignment() {
        let r = reference(&[0.0, 20.0]);
        let d = data(&[(10.0, 1.0), (20.0, 2.0)]);

        let err = align(&r, &d, &["ax"], &config(BoundaryPolicy::Reject)).unwrap_err();
        assert_eq!(err.stage, Stage::Align);
        assert!(matches!(err.source, FusionError::TimestampOutOfRange { .. }));

        let filled = align(&r, &d, &["ax"], &config(BoundaryPolicy::Fill(f64::NAN))).unwrap();
        assert!(filled.aligned.records()[0].values()[0].is_nan());

        let extra = align(&r, &d, &["ax"], &config(BoundaryPolicy::Extrapolate)).unwrap();
        assert_relative_eq!(extra.aligned.records()[0].values()[0], 0.0);
    }

    #[test]
    fn errors_name_their_stage() {
        let r = reference(&[0.0, 20.0]);
        let d = data(&[(0.0, 1.0), (20.0, 2.0)]);

        let err = align(&r, &d, &["gz"], &config(BoundaryPolicy::Clamp)).unwrap_err();
        assert_eq!(err.stage, Stage::Validate);

        let bad = config(BoundaryPolicy::Clamp).with_gap_threshold(f64::NAN);
        assert_eq!(align(&r, &d, &["ax"], &bad).unwrap_err().stage, Stage::Validate);

        let broken = reference(&[0.0, f64::NAN]);
        let err = align(&broken, &d, &["ax"], &config(BoundaryPolicy::Clamp)).unwrap_err();
        assert_eq!(err.stage, Stage::Fill);
        assert!(err.to_string().starts_with("fill stage failed"));

        let single = data(&[(0.0, 1.0)]);
        let cfg = config(BoundaryPolicy::Clamp)
            .with_canonical_rate(CanonicalRate::new(60.0, TimeUnit::Milliseconds));
        assert_eq!(
            align(&r, &single, &["ax"], &cfg).unwrap_err().stage,
            Stage::Canonicalize
        );

        let cubic = config(BoundaryPolicy::Clamp).with_interpolator(Interpolator::new(
            InterpolationMethod::Cubic,
            BoundaryPolicy::Clamp,
        ));
        assert_eq!(align(&r, &d, &["ax"], &cubic).unwrap_err().stage, Stage::Align);
    }

    #[test]
    fn validate_rejects_bad_rate() {
        for hz in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let cfg = config(BoundaryPolicy::Clamp)
                .with_canonical_rate(CanonicalRate::new(hz, TimeUnit::Nanoseconds));
            assert!(cfg.validate().is_err());
        }
        assert!(
            config(BoundaryPolicy::Clamp)
                .without_canonical_rate()
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = config(BoundaryPolicy::Clamp)
            .with_canonical_rate(CanonicalRate::new(60.0, TimeUnit::Nanoseconds));
        let json = serde_json::to_string(&cfg).unwrap();
        let back: AlignmentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
