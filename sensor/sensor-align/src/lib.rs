//! Batch alignment of camera and inertial sensor recordings.
//!
//! Runs the [`sensor_fusion::align`] pipeline over stream pairs stored as CSV
//! files:
//!
//! - [`StreamPair`] / [`run_pair`] - One reference/data pair, read to written
//! - [`BatchConfig`] / [`run_batch`] - Many independent pairs on a worker pool
//!
//! Pairs share nothing, so a failure in one is logged and reported in its
//! [`PairOutcome`] while the rest of the batch completes.
//!
//! # Example
//!
//! ```no_run
//! use sensor_align::BatchConfig;
//!
//! let batch = BatchConfig::from_file("recordings/batch.json").unwrap();
//! for outcome in batch.run().unwrap() {
//!     println!("{}: {}", outcome.name, if outcome.is_ok() { "ok" } else { "failed" });
//! }
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod batch;
mod error;
mod pair;

pub use batch::{BatchConfig, PairOutcome, run_batch};
pub use error::{AlignError, Result};
pub use pair::{PairSummary, StreamPair, run_pair};
