//! Interpolation kernels and boundary policies for sample tracks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FusionError, Result};
use crate::samples::SampleTrack;
use crate::spline::{CubicSpline, EndCondition};

/// Method for interpolating between samples.
///
/// New kernels may be added; match with a wildcard arm.
///
/// # Example
///
/// ```
/// use sensor_fusion::InterpolationMethod;
///
/// let method: InterpolationMethod = "cubic".parse().unwrap();
/// assert_eq!(method, InterpolationMethod::Cubic);
/// assert_eq!(method.min_samples(), 4);
/// assert_eq!("zero".parse::<InterpolationMethod>().unwrap(), InterpolationMethod::Previous);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum InterpolationMethod {
    /// Linear interpolation between bracketing samples.
    #[serde(alias = "slinear")]
    Linear,

    /// Use the nearest sample (ties go to the earlier one).
    Nearest,

    /// Use the previous sample (zero-order hold).
    #[serde(alias = "zero")]
    Previous,

    /// Use the next sample.
    Next,

    /// Cubic spline through all samples with not-a-knot ends.
    Cubic,

    /// Cubic spline through all samples with zero curvature at both ends.
    NaturalCubic,
}

impl InterpolationMethod {
    /// Returns the configuration name of this method.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Nearest => "nearest",
            Self::Previous => "previous",
            Self::Next => "next",
            Self::Cubic => "cubic",
            Self::NaturalCubic => "natural_cubic",
        }
    }

    /// Returns the minimum number of samples this method needs.
    #[must_use]
    pub const fn min_samples(&self) -> usize {
        match self {
            Self::Linear => 2,
            Self::Cubic => 4,
            Self::NaturalCubic => 3,
            Self::Nearest | Self::Previous | Self::Next => 1,
        }
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InterpolationMethod {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" | "slinear" => Ok(Self::Linear),
            "nearest" => Ok(Self::Nearest),
            "previous" | "zero" => Ok(Self::Previous),
            "next" => Ok(Self::Next),
            "cubic" => Ok(Self::Cubic),
            "natural_cubic" => Ok(Self::NaturalCubic),
            _ => Err(FusionError::UnknownMethod(s.to_string())),
        }
    }
}

/// What to do with target times outside the sampled range.
///
/// There is no default: callers choose explicitly.
///
/// # Example
///
/// ```
/// use sensor_fusion::BoundaryPolicy;
///
/// let policy: BoundaryPolicy = "clamp".parse().unwrap();
/// assert_eq!(policy, BoundaryPolicy::Clamp);
/// assert!(matches!("nan".parse::<BoundaryPolicy>(), Ok(BoundaryPolicy::Fill(v)) if v.is_nan()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Fail with [`FusionError::TimestampOutOfRange`].
    Reject,

    /// Use the value of the nearest edge sample.
    Clamp,

    /// Continue the kernel past the edge. Step kernels hold the edge value.
    Extrapolate,

    /// Use a fixed value, typically `NaN`.
    Fill(f64),
}

impl FromStr for BoundaryPolicy {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "clamp" => Ok(Self::Clamp),
            "extrapolate" => Ok(Self::Extrapolate),
            "nan" | "fill" => Ok(Self::Fill(f64::NAN)),
            other => other
                .strip_prefix("fill:")
                .and_then(|v| v.parse::<f64>().ok())
                .map(Self::Fill)
                .ok_or_else(|| FusionError::invalid_config(format!("unknown boundary policy: {s}"))),
        }
    }
}

/// Interpolator for sample tracks.
///
/// Pairs a kernel with an explicit out-of-range policy.
///
/// # Example
///
/// ```
/// use sensor_fusion::{BoundaryPolicy, Interpolator, InterpolationMethod, SampleTrack};
///
/// let interpolator = Interpolator::new(InterpolationMethod::Linear, BoundaryPolicy::Reject);
/// let track = SampleTrack::from_unsorted(&[0.0, 1.0], &[0.0, 10.0]).unwrap();
///
/// let value = interpolator.interpolate(&track, 0.5).unwrap();
/// assert!((value - 5.0).abs() < 1e-6);
/// assert!(interpolator.interpolate(&track, 2.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interpolator {
    method: InterpolationMethod,
    boundary: BoundaryPolicy,
}

impl Interpolator {
    /// Creates a new interpolator.
    #[must_use]
    pub const fn new(method: InterpolationMethod, boundary: BoundaryPolicy) -> Self {
        Self { method, boundary }
    }

    /// Creates a linear interpolator.
    #[must_use]
    pub const fn linear(boundary: BoundaryPolicy) -> Self {
        Self::new(InterpolationMethod::Linear, boundary)
    }

    /// Returns the interpolation method.
    #[must_use]
    pub const fn method(&self) -> InterpolationMethod {
        self.method
    }

    /// Returns the boundary policy.
    #[must_use]
    pub const fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    /// Interpolates a single value at `time`.
    ///
    /// For the cubic kernels this fits the spline on every call; use
    /// [`Interpolator::evaluate_all`] for many target times.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The track has fewer samples than the method needs
    /// - `time` is not finite
    /// - `time` is outside the track range and the policy is `Reject`
    pub fn interpolate(&self, track: &SampleTrack, time: f64) -> Result<f64> {
        let spline = self.prepare(track)?;
        self.evaluate(track, spline.as_ref(), time)
    }

    /// Interpolates values at every time in `targets`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Interpolator::interpolate`], for the first failing
    /// target.
    pub fn evaluate_all(&self, track: &SampleTrack, targets: &[f64]) -> Result<Vec<f64>> {
        let spline = self.prepare(track)?;
        targets
            .iter()
            .map(|&t| self.evaluate(track, spline.as_ref(), t))
            .collect()
    }

    fn prepare(&self, track: &SampleTrack) -> Result<Option<CubicSpline>> {
        let needed = self.method.min_samples();
        if track.len() < needed {
            return Err(FusionError::insufficient_data(format!(
                "{} interpolation needs at least {needed} samples, got {}",
                self.method,
                track.len()
            )));
        }
        match self.method {
            InterpolationMethod::Cubic => CubicSpline::fit(track, EndCondition::NotAKnot).map(Some),
            InterpolationMethod::NaturalCubic => {
                CubicSpline::fit(track, EndCondition::Natural).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn evaluate(&self, track: &SampleTrack, spline: Option<&CubicSpline>, time: f64) -> Result<f64> {
        if !time.is_finite() {
            return Err(FusionError::insufficient_data(format!(
                "cannot interpolate at non-finite time {time}"
            )));
        }

        let Some((before, after)) = track.find_bracket(time) else {
            return self.outside(track, spline, time);
        };

        let before = track
            .get(before)
            .ok_or_else(|| FusionError::insufficient_data("missing before sample"))?;
        let after = track
            .get(after)
            .ok_or_else(|| FusionError::insufficient_data("missing after sample"))?;

        Ok(match self.method {
            InterpolationMethod::Linear => {
                lerp(before.1, after.1, lerp_factor(before.0, after.0, time))
            }
            InterpolationMethod::Nearest => {
                if time - before.0 <= after.0 - time {
                    before.1
                } else {
                    after.1
                }
            }
            InterpolationMethod::Previous => before.1,
            InterpolationMethod::Next => after.1,
            InterpolationMethod::Cubic | InterpolationMethod::NaturalCubic => match spline {
                Some(s) => s.evaluate(time),
                None => return Err(FusionError::insufficient_data("cubic spline not fitted")),
            },
        })
    }

    fn outside(&self, track: &SampleTrack, spline: Option<&CubicSpline>, time: f64) -> Result<f64> {
        let (first, last) = match (track.first(), track.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(FusionError::insufficient_data("track is empty")),
        };
        let before_start = time < first.0;

        match self.boundary {
            BoundaryPolicy::Reject => Err(FusionError::timestamp_out_of_range(time, first.0, last.0)),
            BoundaryPolicy::Fill(value) => Ok(value),
            BoundaryPolicy::Clamp => Ok(if before_start { first.1 } else { last.1 }),
            BoundaryPolicy::Extrapolate => match self.method {
                InterpolationMethod::Linear => {
                    let n = track.len();
                    let (a, b) = if before_start { (0, 1) } else { (n - 2, n - 1) };
                    let (a, b) = match (track.get(a), track.get(b)) {
                        (Some(a), Some(b)) => (*a, *b),
                        _ => return Err(FusionError::insufficient_data("need two edge samples")),
                    };
                    Ok(lerp(a.1, b.1, lerp_factor(a.0, b.0, time)))
                }
                InterpolationMethod::Cubic | InterpolationMethod::NaturalCubic => match spline {
                    Some(s) => Ok(s.evaluate(time)),
                    None => Err(FusionError::insufficient_data("cubic spline not fitted")),
                },
                InterpolationMethod::Nearest
                | InterpolationMethod::Previous
                | InterpolationMethod::Next => Ok(if before_start { first.1 } else { last.1 }),
            },
        }
    }
}

/// Computes linear interpolation factor.
///
/// Returns the position of `x` relative to `a` (0) and `b` (1). Outside
/// `[a, b]` the factor falls outside `[0, 1]`. A zero-width interval yields 0.
#[must_use]
pub fn lerp_factor(a: f64, b: f64, x: f64) -> f64 {
    if (b - a).abs() < f64::EPSILON {
        0.0
    } else {
        (x - a) / (b - a)
    }
}

/// Performs linear interpolation between two values.
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    t.mul_add(b - a, a)
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

    use super::*;

    fn ramp() -> SampleTrack {
        SampleTrack::from_unsorted(&[0.0, 1.0], &[0.0, 10.0]).unwrap()
    }

    fn with(method: InterpolationMethod, boundary: BoundaryPolicy) -> Interpolator {
        Interpolator::new(method, boundary)
    }

    #[test]
    fn method_parse_and_display() {
        for method in [
            InterpolationMethod::Linear,
            InterpolationMethod::Nearest,
            InterpolationMethod::Previous,
            InterpolationMethod::Next,
            InterpolationMethod::Cubic,
            InterpolationMethod::NaturalCubic,
        ] {
            assert_eq!(method.to_string().parse::<InterpolationMethod>().unwrap(), method);
        }
        assert_eq!(" Linear ".parse::<InterpolationMethod>().unwrap(), InterpolationMethod::Linear);
        assert_eq!("slinear".parse::<InterpolationMethod>().unwrap(), InterpolationMethod::Linear);
        assert_eq!("zero".parse::<InterpolationMethod>().unwrap(), InterpolationMethod::Previous);
        assert!(matches!(
            "quadratic".parse::<InterpolationMethod>(),
            Err(FusionError::UnknownMethod(name)) if name == "quadratic"
        ));
    }

    #[test]
    fn method_min_samples() {
        assert_eq!(InterpolationMethod::Linear.min_samples(), 2);
        assert_eq!(InterpolationMethod::Nearest.min_samples(), 1);
        assert_eq!(InterpolationMethod::Previous.min_samples(), 1);
        assert_eq!(InterpolationMethod::Next.min_samples(), 1);
        assert_eq!(InterpolationMethod::Cubic.min_samples(), 4);
        assert_eq!(InterpolationMethod::NaturalCubic.min_samples(), 3);
    }

    #[test]
    fn boundary_parse() {
        assert_eq!("reject".parse::<BoundaryPolicy>().unwrap(), BoundaryPolicy::Reject);
        assert_eq!("extrapolate".parse::<BoundaryPolicy>().unwrap(), BoundaryPolicy::Extrapolate);
        assert_eq!("fill:-1".parse::<BoundaryPolicy>().unwrap(), BoundaryPolicy::Fill(-1.0));
        assert!("fill:abc".parse::<BoundaryPolicy>().is_err());
        assert!("wrap".parse::<BoundaryPolicy>().is_err());
    }

    #[test]
    fn interpolate_linear_midpoint() {
        let interp = Interpolator::linear(BoundaryPolicy::Reject);
        let result = interp.interpolate(&ramp(), 0.5).unwrap();
        assert!((result - 5.0).abs() < 1e-6);
    }

    #[test]
    fn interpolate_linear_quarter() {
        let interp = Interpolator::linear(BoundaryPolicy::Reject);
        let result = interp.interpolate(&ramp(), 0.25).unwrap();
        assert!((result - 2.5).abs() < 1e-6);
    }

    #[test]
    fn interpolate_linear_exact() {
        let interp = Interpolator::linear(BoundaryPolicy::Reject);
        assert!((interp.interpolate(&ramp(), 0.0).unwrap() - 0.0).abs() < 1e-6);
        assert!((interp.interpolate(&ramp(), 1.0).unwrap() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn interpolate_nearest() {
        let interp = with(InterpolationMethod::Nearest, BoundaryPolicy::Reject);

        // Closer to 0.0
        assert!((interp.interpolate(&ramp(), 0.3).unwrap() - 0.0).abs() < 1e-6);

        // Closer to 1.0
        assert!((interp.interpolate(&ramp(), 0.7).unwrap() - 10.0).abs() < 1e-6);

        // Tie goes to the earlier sample
        assert!((interp.interpolate(&ramp(), 0.5).unwrap() - 0.0).abs() < 1e-6);
    }

    #[test]
    fn interpolate_previous_next() {
        let prev = with(InterpolationMethod::Previous, BoundaryPolicy::Reject);
        let next = with(InterpolationMethod::Next, BoundaryPolicy::Reject);
        assert!((prev.interpolate(&ramp(), 0.7).unwrap() - 0.0).abs() < 1e-6);
        assert!((next.interpolate(&ramp(), 0.3).unwrap() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn interpolate_cubic_matches_knots() {
        let track =
            SampleTrack::from_unsorted(&[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0, 0.0, 1.0]).unwrap();
        let interp = with(InterpolationMethod::Cubic, BoundaryPolicy::Reject);
        let values = interp.evaluate_all(&track, &[0.0, 1.0, 2.0, 3.0]).unwrap();
        for (v, e) in values.iter().zip([0.0, 1.0, 0.0, 1.0]) {
            assert_relative_eq!(*v, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn cubic_uses_not_a_knot_ends() {
        let track = SampleTrack::from_unsorted(
            &[0.0, 1.0, 2.0, 3.0, 4.0],
            &[0.0, 1.0, 0.0, 1.0, 0.0],
        )
        .unwrap();
        let cubic = with(InterpolationMethod::Cubic, BoundaryPolicy::Reject);
        assert_relative_eq!(cubic.interpolate(&track, 0.5).unwrap(), 1.125, epsilon = 1e-12);

        let natural = with(InterpolationMethod::NaturalCubic, BoundaryPolicy::Reject);
        assert_relative_eq!(
            natural.interpolate(&track, 0.5).unwrap(),
            0.767_857_142_857_142_8,
            epsilon = 1e-12
        );
    }

    #[test]
    fn cubic_needs_four_samples() {
        let three = SampleTrack::from_unsorted(&[0.0, 1.0, 2.0], &[0.0, 1.0, 0.0]).unwrap();
        let cubic = with(InterpolationMethod::Cubic, BoundaryPolicy::Reject);
        assert!(matches!(
            cubic.interpolate(&three, 0.5),
            Err(FusionError::InsufficientData(_))
        ));

        let natural = with(InterpolationMethod::NaturalCubic, BoundaryPolicy::Reject);
        assert_relative_eq!(natural.interpolate(&three, 0.5).unwrap(), 0.6875, epsilon = 1e-12);
    }

    #[test]
    fn interpolate_too_few_samples() {
        let single = SampleTrack::from_unsorted(&[0.0], &[4.0]).unwrap();
        let linear = Interpolator::linear(BoundaryPolicy::Extrapolate);
        assert!(matches!(
            linear.interpolate(&single, 0.0),
            Err(FusionError::InsufficientData(_))
        ));

        // Step kernels work with one sample.
        let nearest = with(InterpolationMethod::Nearest, BoundaryPolicy::Clamp);
        assert_eq!(nearest.interpolate(&single, 5.0).unwrap(), 4.0);
    }

    #[test]
    fn boundary_reject() {
        let interp = Interpolator::linear(BoundaryPolicy::Reject);
        let err = interp.interpolate(&ramp(), -1.0).unwrap_err();
        assert!(matches!(
            err,
            FusionError::TimestampOutOfRange { timestamp, min, max }
                if timestamp == -1.0 && min == 0.0 && max == 1.0
        ));
        assert!(interp.interpolate(&ramp(), 2.0).is_err());
    }

    #[test]
    fn boundary_clamp() {
        let interp = Interpolator::linear(BoundaryPolicy::Clamp);
        assert_eq!(interp.interpolate(&ramp(), -1.0).unwrap(), 0.0);
        assert_eq!(interp.interpolate(&ramp(), 2.0).unwrap(), 10.0);
    }

    #[test]
    fn boundary_extrapolate_linear() {
        let interp = Interpolator::linear(BoundaryPolicy::Extrapolate);
        assert_relative_eq!(interp.interpolate(&ramp(), -1.0).unwrap(), -10.0);
        assert_relative_eq!(interp.interpolate(&ramp(), 2.0).unwrap(), 20.0);
    }

    #[test]
    fn boundary_extrapolate_step_holds_edge() {
        let interp = with(InterpolationMethod::Previous, BoundaryPolicy::Extrapolate);
        assert_eq!(interp.interpolate(&ramp(), -1.0).unwrap(), 0.0);
        assert_eq!(interp.interpolate(&ramp(), 2.0).unwrap(), 10.0);
    }

    #[test]
    fn boundary_fill() {
        let interp = Interpolator::linear(BoundaryPolicy::Fill(f64::NAN));
        assert!(interp.interpolate(&ramp(), 2.0).unwrap().is_nan());
        assert_relative_eq!(interp.interpolate(&ramp(), 0.5).unwrap(), 5.0);
    }

    #[test]
    fn interpolate_non_finite_target() {
        let interp = Interpolator::linear(BoundaryPolicy::Fill(0.0));
        assert!(interp.interpolate(&ramp(), f64::NAN).is_err());
    }

    #[test]
    fn lerp_factor_basic() {
        assert!((lerp_factor(0.0, 10.0, 5.0) - 0.5).abs() < 1e-6);
        assert!((lerp_factor(0.0, 10.0, 0.0) - 0.0).abs() < 1e-6);
        assert!((lerp_factor(0.0, 10.0, 10.0) - 1.0).abs() < 1e-6);
        assert!((lerp_factor(0.0, 10.0, 20.0) - 2.0).abs() < 1e-6);
        assert!((lerp_factor(3.0, 3.0, 20.0) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn lerp_basic() {
        assert!((lerp(0.0, 10.0, 0.5) - 5.0).abs() < 1e-6);
        assert!((lerp(0.0, 10.0, 0.0) - 0.0).abs() < 1e-6);
        assert!((lerp(0.0, 10.0, 1.0) - 10.0).abs() < 1e-6);
    }
}
