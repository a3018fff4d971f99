//! Error types for stream-pair and batch execution.

use std::path::PathBuf;

use sensor_fusion::{FusionError, PipelineError};
use sensor_io::IoError;
use thiserror::Error;

/// Result type for stream-pair and batch execution.
pub type Result<T> = std::result::Result<T, AlignError>;

/// Errors that can occur while running stream pairs.
#[derive(Debug, Error)]
pub enum AlignError {
    /// Reading or writing a stream file failed.
    #[error(transparent)]
    Io(#[from] IoError),

    /// An alignment stage failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A setting could not be parsed or is out of range.
    #[error(transparent)]
    Config(#[from] FusionError),

    /// The batch manifest could not be read.
    #[error("cannot read manifest {path}: {source}")]
    ManifestIo {
        /// Manifest path.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The batch manifest is not valid JSON for a batch.
    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    /// The worker pool could not be started.
    #[error("cannot start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use sensor_fusion::Stage;

    use super::*;

    #[test]
    fn pipeline_errors_keep_their_stage_message() {
        let err: AlignError =
            PipelineError::new(Stage::Fill, FusionError::invalid_config("bad")).into();
        assert!(err.to_string().starts_with("fill stage failed"));
    }

    #[test]
    fn io_errors_are_transparent() {
        let err: AlignError = IoError::file_not_found("imu.csv").into();
        assert_eq!(err.to_string(), "file not found: imu.csv");
    }
}
