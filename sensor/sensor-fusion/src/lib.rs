//! Temporal alignment of independently clocked sensor streams.
//!
//! This crate repairs and aligns in-memory [`Series`](sensor_types::Series):
//!
//! # Stream Repair
//!
//! - [`fill_gaps`] - Inserts a midpoint record into every timestamp gap
//! - [`fill_table_gaps`] - The same on a text table, other cells kept verbatim
//! - [`collapse_duplicates`] - Averages records that share a timestamp
//! - [`resample_to_rate`] - Regenerates a stream on a uniform timeline
//!
//! # Cross-Stream Interpolation
//!
//! - [`Interpolator`] - Kernel plus explicit [`BoundaryPolicy`]
//! - [`InterpolationMethod`] - Linear, nearest, previous, next or cubic spline
//! - [`interpolate_onto`] - Evaluates stream columns on another timeline
//!
//! # Alignment Pipeline
//!
//! - [`align`] - Fill, normalize, canonicalize and align one stream pair
//! - [`AlignmentConfig`] - Every pipeline knob, with no defaults
//!
//! # Diagnostics
//!
//! - [`estimate_frequencies`] and [`frequency_outliers`] - Sampling-rate checks
//! - [`energy_above_cutoff`] and [`aliasing_band`] - Spectral checks for decimation
//!
//! # Layer 0 Crate
//!
//! Operations are pure functions over materialized series. No I/O, no shared
//! state; pairs can be aligned on any number of threads.
//!
//! # Example
//!
//! ```
//! use sensor_fusion::{BoundaryPolicy, Interpolator, fill_gaps, interpolate_onto};
//! use sensor_types::{Record, Series, TimeKind};
//!
//! let camera = Series::from_records(
//!     "time_ms",
//!     vec![],
//!     TimeKind::Integer,
//!     [0.0, 10.0, 100.0].iter().map(|&t| Record::new(t, vec![])).collect(),
//! )
//! .unwrap();
//! let filled = fill_gaps(&camera, 40.0).unwrap();
//!
//! let imu = Series::from_records(
//!     "time_ms",
//!     vec!["gx".to_string()],
//!     TimeKind::Integer,
//!     vec![Record::new(0.0, vec![0.0]), Record::new(100.0, vec![1.0])],
//! )
//! .unwrap();
//! let out = interpolate_onto(
//!     &imu,
//!     &["gx"],
//!     &filled.times(),
//!     &Interpolator::linear(BoundaryPolicy::Reject),
//! )
//! .unwrap();
//! assert_eq!(out.len(), 4);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod cross;
mod dedup;
mod diagnostics;
mod error;
mod gap;
mod interpolation;
mod pipeline;
mod resample;
mod samples;
mod spline;

// Re-export repair operations
pub use dedup::collapse_duplicates;
pub use gap::{Gap, detect_gaps, fill_gaps, fill_table_gaps};
pub use resample::{MAX_TIMELINE_POINTS, resample_to_rate, uniform_timeline};

// Re-export interpolation types
pub use cross::{Interpolated, interpolate_onto};
pub use interpolation::{BoundaryPolicy, InterpolationMethod, Interpolator, lerp, lerp_factor};
pub use samples::SampleTrack;

// Re-export pipeline types
pub use pipeline::{
    Alignment, AlignmentConfig, AlignmentReport, CanonicalRate, DuplicateHandling, PipelineError,
    Stage, align,
};

// Re-export diagnostics
pub use diagnostics::{
    FrequencyOutlier, FrequencySummary, aliasing_band, energy_above_cutoff, estimate_frequencies,
    frequency_outliers,
};

// Re-export error types
pub use error::{FusionError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        AlignmentConfig, BoundaryPolicy, CanonicalRate, DuplicateHandling, FusionError,
        InterpolationMethod, Interpolator, PipelineError, align, collapse_duplicates, fill_gaps,
        interpolate_onto, resample_to_rate,
    };
}
