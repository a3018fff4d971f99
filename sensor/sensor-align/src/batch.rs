//! Batch manifests and parallel execution of independent stream pairs.
//!
//! Each pair is a self-contained task. Pairs run on a fixed-size worker
//! pool, one task per pair, and share no state. A failing pair is logged and
//! reported in its outcome; the rest of the batch still runs.
//!
//! # Manifest
//!
//! ```json
//! {
//!   "gap_threshold": 40.0,
//!   "method": "linear",
//!   "boundary": "nan",
//!   "canonical_rate": { "hz": 60.0, "unit": "nanoseconds" },
//!   "workers": 4,
//!   "pairs": [
//!     {
//!       "name": "case_01_imu",
//!       "reference": "case_01/timestamp_1080_1_sync.csv",
//!       "data": "case_01/imu_sync.csv",
//!       "time_column": "time_ms_loc",
//!       "value_columns": ["x", "y", "z"],
//!       "duplicates": "collapse",
//!       "output_reference": "out/case_01/timestamp_1080_1_sync_fill.csv",
//!       "output_data": "out/case_01/imu_sync_fill.csv"
//!     }
//!   ]
//! }
//! ```
//!
//! The boundary policy is written as text (`reject`, `clamp`, `extrapolate`,
//! `nan`, `fill:<value>`) because JSON has no `NaN`.

use std::fs;
use std::path::Path;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use sensor_fusion::{
    AlignmentConfig, BoundaryPolicy, CanonicalRate, DuplicateHandling, InterpolationMethod,
    Interpolator,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AlignError, Result};
use crate::pair::{PairSummary, StreamPair, run_pair};

/// Settings shared by every pair of a batch, plus the pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Reference gap threshold, in reference time units.
    pub gap_threshold: f64,

    /// Interpolation method name.
    pub method: String,

    /// Boundary policy for the final alignment.
    pub boundary: String,

    /// Optional fixed rate applied to every data stream.
    #[serde(default)]
    pub canonical_rate: Option<CanonicalRate>,

    /// Worker threads; `None` or `0` uses one per CPU.
    #[serde(default)]
    pub workers: Option<usize>,

    /// Stream pairs to run.
    pub pairs: Vec<StreamPair>,
}

impl BatchConfig {
    /// Parses a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid manifest.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a manifest file, resolving relative pair paths against the
    /// manifest's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid manifest.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| AlignError::ManifestIo {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json(&text)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.pairs = config
            .pairs
            .into_iter()
            .map(|pair| pair.resolved(base))
            .collect();
        Ok(config)
    }

    /// Builds the alignment settings shared by all pairs.
    ///
    /// Duplicate handling is per pair and starts as
    /// [`DuplicateHandling::Unique`] here.
    ///
    /// # Errors
    ///
    /// Returns an error if the method or boundary is not recognized or a
    /// numeric setting is invalid.
    pub fn alignment_config(&self) -> Result<AlignmentConfig> {
        let method: InterpolationMethod = self.method.parse()?;
        let boundary: BoundaryPolicy = self.boundary.parse()?;
        let config = AlignmentConfig::new(
            self.gap_threshold,
            DuplicateHandling::Unique,
            self.canonical_rate,
            Interpolator::new(method, boundary),
        );
        config.validate()?;
        Ok(config)
    }

    /// Runs every pair of the manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the pool cannot
    /// start. Per-pair failures are reported in the outcomes.
    pub fn run(&self) -> Result<Vec<PairOutcome>> {
        let config = self.alignment_config()?;
        run_batch(&self.pairs, &config, self.workers.unwrap_or(0))
    }
}

/// Result of one pair in a batch.
#[derive(Debug)]
pub struct PairOutcome {
    /// Pair label.
    pub name: String,
    /// Summary, or the error that aborted the pair.
    pub result: Result<PairSummary>,
}

impl PairOutcome {
    /// Returns true if the pair completed.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs `pairs` on a pool of `workers` threads, one task per pair.
///
/// `workers == 0` uses one thread per CPU. Outcomes are returned in input
/// order regardless of completion order.
///
/// # Errors
///
/// Returns an error only if the worker pool cannot be started.
pub fn run_batch(
    pairs: &[StreamPair],
    config: &AlignmentConfig,
    workers: usize,
) -> Result<Vec<PairOutcome>> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("align-worker-{i}"))
        .build()?;
    info!(
        pairs = pairs.len(),
        workers = pool.current_num_threads(),
        "Starting batch"
    );

    let outcomes: Vec<PairOutcome> = pool.install(|| {
        pairs
            .par_iter()
            .map(|pair| {
                let result = run_pair(pair, config);
                if let Err(err) = &result {
                    warn!(pair = %pair.name, error = %err, "Stream pair failed");
                }
                PairOutcome {
                    name: pair.name.clone(),
                    result,
                }
            })
            .collect()
    });

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    info!(
        succeeded = outcomes.len() - failed,
        failed, "Batch complete"
    );
    Ok(outcomes)
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

    const MANIFEST: &str = r#"{
        "gap_threshold": 40.0,
        "method": "linear",
        "boundary": "nan",
        "pairs": [
            {
                "name": "case_01_imu",
                "reference": "cam.csv",
                "data": "imu.csv",
                "time_column": "time_ms_loc",
                "value_columns": ["x"],
                "duplicates": "collapse",
                "output_reference": "out/cam.csv",
                "output_data": "out/imu.csv"
            },
            {
                "name": "case_01_phone",
                "reference": "cam.csv",
                "data": "phone.csv",
                "time_column": "time_ms_loc",
                "value_columns": ["x"],
                "output_reference": "out/cam2.csv",
                "output_data": "out/phone.csv"
            }
        ]
    }"#;

    #[test]
    fn parse_manifest() {
        let batch = BatchConfig::from_json(MANIFEST).unwrap();
        assert_eq!(batch.pairs.len(), 2);
        assert_eq!(batch.pairs[0].duplicates, DuplicateHandling::Collapse);
        assert_eq!(batch.pairs[1].duplicates, DuplicateHandling::Unique);
        assert_eq!(batch.workers, None);

        let config = batch.alignment_config().unwrap();
        assert_eq!(config.interpolator.method(), InterpolationMethod::Linear);
        assert!(matches!(config.interpolator.boundary(), BoundaryPolicy::Fill(v) if v.is_nan()));
        assert!(config.canonical_rate.is_none());
    }

    #[test]
    fn bad_settings_are_rejected() {
        let mut batch = BatchConfig::from_json(MANIFEST).unwrap();
        batch.method = "quadratic".into();
        assert!(matches!(batch.alignment_config(), Err(AlignError::Config(_))));

        let mut batch = BatchConfig::from_json(MANIFEST).unwrap();
        batch.boundary = "wrap".into();
        assert!(batch.alignment_config().is_err());

        let mut batch = BatchConfig::from_json(MANIFEST).unwrap();
        batch.gap_threshold = f64::NAN;
        assert!(batch.alignment_config().is_err());

        assert!(matches!(
            BatchConfig::from_json("{\"pairs\": 3}"),
            Err(AlignError::Manifest(_))
        ));
    }

    #[test]
    fn missing_manifest_file() {
        let err = BatchConfig::from_file("no_such_manifest.json").unwrap_err();
        assert!(matches!(err, AlignError::ManifestIo { .. }));
    }

    #[test]
    fn empty_batch() {
        let batch = BatchConfig::from_json(MANIFEST).unwrap();
        let config = batch.alignment_config().unwrap();
        let outcomes = run_batch(&[], &config, 2).unwrap();
        assert!(outcomes.is_empty());
    }
}
