//! Time axis types for sensor series.
//!
//! Series time columns are plain `f64` values in whatever unit the recording
//! device used. These types carry the unit and the textual representation of
//! that axis so operations can keep both intact.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unit of a time column.
///
/// Camera timestamp files are usually in milliseconds while inertial sensors
/// log nanoseconds, so the unit always travels with the rate-dependent call.
///
/// # Example
///
/// ```
/// use sensor_types::TimeUnit;
///
/// assert_eq!(TimeUnit::Nanoseconds.period_for_rate(60.0), 1e9 / 60.0);
/// assert_eq!(TimeUnit::Milliseconds.ticks_per_second(), 1e3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TimeUnit {
    /// Nanoseconds (1e9 ticks per second).
    Nanoseconds,
    /// Microseconds (1e6 ticks per second).
    Microseconds,
    /// Milliseconds (1e3 ticks per second).
    Milliseconds,
    /// Seconds.
    Seconds,
}

impl TimeUnit {
    /// Returns the number of ticks of this unit in one second.
    #[must_use]
    pub const fn ticks_per_second(self) -> f64 {
        match self {
            Self::Nanoseconds => 1e9,
            Self::Microseconds => 1e6,
            Self::Milliseconds => 1e3,
            Self::Seconds => 1.0,
        }
    }

    /// Returns the sample period, in this unit, of a stream at `rate_hz`.
    #[must_use]
    pub fn period_for_rate(self, rate_hz: f64) -> f64 {
        self.ticks_per_second() / rate_hz
    }

    /// Parses a unit from its short name (`ns`, `us`, `ms`, `s`).
    #[must_use]
    pub fn from_short_name(name: &str) -> Option<Self> {
        match name {
            "ns" => Some(Self::Nanoseconds),
            "us" => Some(Self::Microseconds),
            "ms" => Some(Self::Milliseconds),
            "s" => Some(Self::Seconds),
            _ => None,
        }
    }

    /// Returns the short name of this unit.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Nanoseconds => "ns",
            Self::Microseconds => "us",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
        }
    }
}

/// Textual representation of a time column.
///
/// Recording software writes timestamps either as integers or as decimals.
/// Synthetic time values are truncated to integers when the source was
/// integral so written files keep their original shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimeKind {
    /// Every time cell parsed as an integer.
    Integer,

    /// At least one time cell has a fractional or exponent form.
    #[default]
    Float,
}

impl TimeKind {
    /// Converts a computed time value into this representation.
    ///
    /// Integer columns truncate toward zero; float columns are unchanged.
    #[must_use]
    pub fn represent(self, value: f64) -> f64 {
        match self {
            Self::Integer => value.trunc(),
            Self::Float => value,
        }
    }
}

/// An inclusive time range `[start, end]`.
///
/// # Example
///
/// ```
/// use sensor_types::TimeRange;
///
/// let range = TimeRange::new(10.0, 0.0);
/// assert_eq!(range.start, 0.0);
/// assert!(range.contains(10.0));
/// assert!(!range.contains(10.5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeRange {
    /// Start of the range (inclusive).
    pub start: f64,
    /// End of the range (inclusive).
    pub end: f64,
}

impl TimeRange {
    /// Creates a new time range.
    ///
    /// If `start > end`, they are swapped.
    #[must_use]
    pub fn new(start: f64, end: f64) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Returns the length of this range.
    #[must_use]
    pub fn span(self) -> f64 {
        self.end - self.start
    }

    /// Checks if a time value is within this range.
    #[must_use]
    pub fn contains(self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }

    /// Returns the intersection of two ranges, if any.
    #[must_use]
    pub fn intersection(self, other: Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start <= end { Some(Self { start, end }) } else { None }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn unit_ticks() {
        assert_eq!(TimeUnit::Nanoseconds.ticks_per_second(), 1e9);
        assert_eq!(TimeUnit::Microseconds.ticks_per_second(), 1e6);
        assert_eq!(TimeUnit::Seconds.ticks_per_second(), 1.0);
    }

    #[test]
    fn unit_period_for_rate() {
        let period = TimeUnit::Milliseconds.period_for_rate(30.0);
        assert!((period - 33.333_333).abs() < 1e-5);
    }

    #[test]
    fn unit_short_names_roundtrip() {
        for unit in [
            TimeUnit::Nanoseconds,
            TimeUnit::Microseconds,
            TimeUnit::Milliseconds,
            TimeUnit::Seconds,
        ] {
            assert_eq!(TimeUnit::from_short_name(unit.short_name()), Some(unit));
        }
        assert_eq!(TimeUnit::from_short_name("min"), None);
    }

    #[test]
    fn kind_represent() {
        assert_eq!(TimeKind::Integer.represent(65.9), 65.0);
        assert_eq!(TimeKind::Integer.represent(-2.5), -2.0);
        assert_eq!(TimeKind::Float.represent(65.9), 65.9);
    }

    #[test]
    fn range_contains_is_inclusive() {
        let range = TimeRange::new(0.0, 150.0);
        assert!(range.contains(0.0));
        assert!(range.contains(150.0));
        assert!(!range.contains(-0.1));
        assert_eq!(range.span(), 150.0);
    }

    #[test]
    fn range_intersection() {
        let a = TimeRange::new(0.0, 100.0);
        let b = TimeRange::new(50.0, 200.0);
        assert_eq!(a.intersection(b), Some(TimeRange::new(50.0, 100.0)));
        assert_eq!(a.intersection(TimeRange::new(101.0, 102.0)), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn unit_serialization() {
        let json = serde_json::to_string(&TimeUnit::Nanoseconds).unwrap_or_default();
        assert_eq!(json, "\"nanoseconds\"");
    }
}
