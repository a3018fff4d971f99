//! Cubic splines through a sample track.

use crate::error::{FusionError, Result};
use crate::samples::SampleTrack;

/// How the spline is closed at the first and last knot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EndCondition {
    /// Third derivative continuous across the second and second-to-last
    /// knots. Needs four samples; with exactly four the spline is the single
    /// cubic through them.
    NotAKnot,

    /// Zero second derivative at both ends. Needs three samples.
    Natural,
}

impl EndCondition {
    const fn min_samples(self) -> usize {
        match self {
            Self::NotAKnot => 4,
            Self::Natural => 3,
        }
    }

    const fn method(self) -> &'static str {
        match self {
            Self::NotAKnot => "cubic",
            Self::Natural => "natural_cubic",
        }
    }
}

/// Piecewise cubic with continuous second derivative.
#[derive(Debug, Clone)]
pub(crate) struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivative at each knot.
    curvature: Vec<f64>,
}

impl CubicSpline {
    /// Fits a spline through every sample of the track.
    ///
    /// # Errors
    ///
    /// Returns an error for too few samples or repeated times.
    pub(crate) fn fit(track: &SampleTrack, end: EndCondition) -> Result<Self> {
        let n = track.len();
        let needed = end.min_samples();
        if n < needed {
            return Err(FusionError::insufficient_data(format!(
                "{} interpolation needs at least {needed} samples, got {n}",
                end.method()
            )));
        }

        let (xs, ys): (Vec<f64>, Vec<f64>) = track.iter().copied().unzip();
        if let Some(w) = xs.windows(2).find(|w| w[1] <= w[0]) {
            return Err(FusionError::DuplicateTimestamp {
                time: w[1],
                method: end.method(),
            });
        }

        // Continuity of the first derivative at each interior knot k:
        // h[k-1] M[k-1] + 2 (h[k-1] + h[k]) M[k] + h[k] M[k+1] = rhs
        let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let interior = n - 2;
        let mut sub = vec![0.0; interior];
        let mut diag = vec![0.0; interior];
        let mut sup = vec![0.0; interior];
        let mut rhs = vec![0.0; interior];
        for i in 0..interior {
            let k = i + 1;
            sub[i] = h[k - 1];
            diag[i] = 2.0 * (h[k - 1] + h[k]);
            sup[i] = h[k];
            rhs[i] = 6.0 * ((ys[k + 1] - ys[k]) / h[k] - (ys[k] - ys[k - 1]) / h[k - 1]);
        }

        if end == EndCondition::NotAKnot {
            // Substitute M[0] and M[n-1], which the end conditions express
            // through their two inner neighbours.
            let (h0, h1) = (h[0], h[1]);
            diag[0] = (h0 + h1) * (h0 + 2.0 * h1) / h1;
            sup[0] = (h1 - h0) * (h1 + h0) / h1;

            let last = interior - 1;
            let (inner, outer) = (h[n - 3], h[n - 2]);
            sub[last] = (inner - outer) * (inner + outer) / inner;
            diag[last] = (inner + outer) * (2.0 * inner + outer) / inner;
        }

        // Thomas algorithm.
        for i in 1..interior {
            let factor = sub[i] / diag[i - 1];
            diag[i] -= factor * sup[i - 1];
            rhs[i] -= factor * rhs[i - 1];
        }
        let mut curvature = vec![0.0; n];
        for i in (0..interior).rev() {
            let upper = if i + 1 < interior {
                sup[i] * curvature[i + 2]
            } else {
                0.0
            };
            curvature[i + 1] = (rhs[i] - upper) / diag[i];
        }

        if end == EndCondition::NotAKnot {
            let (h0, h1) = (h[0], h[1]);
            curvature[0] = ((h0 + h1) * curvature[1] - h0 * curvature[2]) / h1;

            let (inner, outer) = (h[n - 3], h[n - 2]);
            curvature[n - 1] =
                ((inner + outer) * curvature[n - 2] - outer * curvature[n - 3]) / inner;
        }

        Ok(Self { xs, ys, curvature })
    }

    /// Evaluates the spline at `x`.
    ///
    /// Points outside the knot range evaluate the end segment's cubic.
    pub(crate) fn evaluate(&self, x: f64) -> f64 {
        let last_segment = self.xs.len() - 2;
        let i = self
            .xs
            .partition_point(|&k| k <= x)
            .saturating_sub(1)
            .min(last_segment);

        let h = self.xs[i + 1] - self.xs[i];
        let a = (self.xs[i + 1] - x) / h;
        let b = (x - self.xs[i]) / h;
        let cubic = (a.powi(3) - a).mul_add(
            self.curvature[i],
            (b.powi(3) - b) * self.curvature[i + 1],
        );
        a.mul_add(self.ys[i], b * self.ys[i + 1]) + cubic * h * h / 6.0
    }
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

    fn spline(xs: &[f64], ys: &[f64], end: EndCondition) -> CubicSpline {
        CubicSpline::fit(&SampleTrack::from_unsorted(xs, ys).unwrap(), end).unwrap()
    }

    #[test]
    fn spline_passes_through_knots() {
        let xs = [0.0, 1.0, 2.5, 4.0, 5.0];
        let ys = [1.0, -2.0, 0.5, 3.0, 2.0];
        for end in [EndCondition::NotAKnot, EndCondition::Natural] {
            let s = spline(&xs, &ys, end);
            for (x, y) in xs.iter().zip(ys) {
                assert_relative_eq!(s.evaluate(*x), y, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn spline_reproduces_lines() {
        for end in [EndCondition::NotAKnot, EndCondition::Natural] {
            let s = spline(&[0.0, 1.0, 3.0, 4.0], &[1.0, 3.0, 7.0, 9.0], end);
            assert_relative_eq!(s.evaluate(2.0), 5.0, epsilon = 1e-12);
            // Zero curvature everywhere, so extrapolation stays on the line.
            assert_relative_eq!(s.evaluate(5.0), 11.0, epsilon = 1e-12);
            assert_relative_eq!(s.evaluate(-1.0), -1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn not_a_knot_known_value() {
        // The first two segments share p(x) = 4x - 4x^2 + x^3.
        let s = spline(
            &[0.0, 1.0, 2.0, 3.0, 4.0],
            &[0.0, 1.0, 0.0, 1.0, 0.0],
            EndCondition::NotAKnot,
        );
        assert_relative_eq!(s.evaluate(0.5), 1.125, epsilon = 1e-12);
        assert_relative_eq!(s.evaluate(1.5), 0.375, epsilon = 1e-12);
        assert_relative_eq!(s.evaluate(3.5), 1.125, epsilon = 1e-12);

        let natural = spline(
            &[0.0, 1.0, 2.0, 3.0, 4.0],
            &[0.0, 1.0, 0.0, 1.0, 0.0],
            EndCondition::Natural,
        );
        assert_relative_eq!(natural.evaluate(0.5), 0.767_857_142_857_142_8, epsilon = 1e-12);
    }

    #[test]
    fn not_a_knot_reproduces_cubics() {
        let xs = [-1.0, 0.5, 2.0, 2.5, 4.0, 6.0];
        let cubic = |x: f64| x.powi(3) - 2.0 * x + 1.0;
        let ys: Vec<f64> = xs.iter().map(|&x| cubic(x)).collect();
        let s = spline(&xs, &ys, EndCondition::NotAKnot);
        for x in [-2.0, 0.0, 1.3, 3.0, 5.5, 7.0] {
            assert_relative_eq!(s.evaluate(x), cubic(x), epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn four_points_give_the_interpolating_cubic() {
        let xs = [0.0, 1.0, 3.0, 4.0];
        let cubic = |x: f64| 2.0 * x.powi(3) - 5.0 * x * x + x;
        let ys: Vec<f64> = xs.iter().map(|&x| cubic(x)).collect();
        let s = spline(&xs, &ys, EndCondition::NotAKnot);
        assert_relative_eq!(s.evaluate(2.0), cubic(2.0), epsilon = 1e-9);
    }

    #[test]
    fn natural_three_points_known_value() {
        // Natural spline through (0,0), (1,1), (2,0): M1 = -3.
        let s = spline(&[0.0, 1.0, 2.0], &[0.0, 1.0, 0.0], EndCondition::Natural);
        assert_relative_eq!(s.evaluate(0.5), 0.6875, epsilon = 1e-12);
        assert_relative_eq!(s.evaluate(1.5), 0.6875, epsilon = 1e-12);
    }

    #[test]
    fn spline_minimum_samples() {
        let three = SampleTrack::from_unsorted(&[0.0, 1.0, 2.0], &[0.0, 1.0, 0.0]).unwrap();
        assert!(matches!(
            CubicSpline::fit(&three, EndCondition::NotAKnot),
            Err(FusionError::InsufficientData(_))
        ));

        let two = SampleTrack::from_unsorted(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
        assert!(matches!(
            CubicSpline::fit(&two, EndCondition::Natural),
            Err(FusionError::InsufficientData(_))
        ));
    }

    #[test]
    fn spline_rejects_repeated_times() {
        let dup =
            SampleTrack::from_unsorted(&[0.0, 1.0, 1.0, 2.0], &[0.0, 1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(
            CubicSpline::fit(&dup, EndCondition::NotAKnot),
            Err(FusionError::DuplicateTimestamp { method: "cubic", .. })
        ));
        assert!(matches!(
            CubicSpline::fit(&dup, EndCondition::Natural),
            Err(FusionError::DuplicateTimestamp { method: "natural_cubic", .. })
        ));
    }
}
