//! Timestamped sensor series types.
//!
//! This crate provides the data model shared by the alignment crates:
//!
//! - [`Record`] - One sample: a time value plus named channel values
//! - [`Series`] - Ordered records sharing one designated time column
//! - [`TextTable`] - Field→text rows as read from a tabular source
//! - [`CellPolicy`] - How non-numeric cells are treated during coercion
//!
//! # Time
//!
//! Time columns are plain `f64` values in the recording device's unit.
//! [`TimeUnit`] names that unit where an operation depends on it (rates in
//! Hz), and [`TimeKind`] remembers whether the column was written as
//! integers so synthetic timestamps keep the same shape.
//!
//! # Layer 0 Crate
//!
//! This crate does no I/O and has no numeric dependencies. It can be used in:
//! - Offline alignment tools
//! - Dataset converters
//! - Tests that build series by hand
//!
//! # Example
//!
//! ```
//! use sensor_types::{CellPolicy, TextTable, TimeKind};
//!
//! let mut table = TextTable::new(vec!["time_ms_loc".into(), "z".into()]);
//! table.push_row(vec!["0".into(), "0.5".into()]);
//! table.push_row(vec!["33".into(), "0.7".into()]);
//!
//! let series = table.to_series("time_ms_loc", None, CellPolicy::Strict).unwrap();
//! assert_eq!(series.time_kind(), TimeKind::Integer);
//! assert_eq!(series.len(), 2);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod series;
mod table;
mod time;

pub use error::{Result, SensorError};
pub use series::{Record, Series, format_cell};
pub use table::{CellPolicy, TextTable, parse_cell};
pub use time::{TimeKind, TimeRange, TimeUnit};
