//! Sensor file I/O.
//!
//! Loads and saves timestamped sensor streams as CSV with a header row:
//!
//! - [`read_table`] / [`write_table`] - Raw text tables
//! - [`read_series`] / [`write_series`] - Numeric series via [`CellPolicy`](sensor_types::CellPolicy)
//!
//! Missing files and directories given as files are reported before any
//! parsing, so a batch driver can log and skip that stream pair.
//!
//! # Example
//!
//! ```no_run
//! use sensor_io::{read_series, write_series};
//! use sensor_types::CellPolicy;
//!
//! let camera = read_series("timestamp_1080_1.csv", "time_ms_loc", None, CellPolicy::Strict).unwrap();
//! write_series("out/timestamp_1080_1_filled.csv", &camera).unwrap();
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod delimited;
mod error;

pub use delimited::{read_series, read_table, write_series, write_table};
pub use error::{IoError, IoResult};
