//! # Splines
//!
//! Piecewise curves mapping a noise value to a terrain quantity such as a height
//! offset or a density multiplier.

/// Interpolation used between two control points.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interpolation {
    /// Straight line between points
    Linear,
    /// Hermite smoothstep, flat at both ends of each segment
    Smoothstep,
}

/// One control point of a [`Spline`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SplinePoint {
    /// Input value where the point sits
    pub input: f64,
    /// Output value at `input`
    pub output: f64,
}

/// Monotone-input piecewise curve.
///
/// Inputs outside the covered range clamp to the first or last output.
#[derive(Clone, Debug)]
pub struct Spline {
    points: Vec<SplinePoint>,
    interpolation: Interpolation,
}

impl Spline {
    /// Builds a spline from `(input, output)` pairs.
    ///
    /// Points are sorted by input. When two points share an input the first one wins.
    pub fn new(points: &[(f64, f64)], interpolation: Interpolation) -> Self {
        let mut points: Vec<SplinePoint> = points
            .iter()
            .map(|&(input, output)| SplinePoint { input, output })
            .collect();
        points.sort_by(|a, b| a.input.total_cmp(&b.input));
        points.dedup_by(|later, earlier| later.input == earlier.input);
        Self {
            points,
            interpolation,
        }
    }

    /// Shorthand for a linear spline.
    pub fn linear(points: &[(f64, f64)]) -> Self {
        Self::new(points, Interpolation::Linear)
    }

    /// Shorthand for a smoothstep spline.
    pub fn smooth(points: &[(f64, f64)]) -> Self {
        Self::new(points, Interpolation::Smoothstep)
    }

    /// Evaluates the curve at `x`.
    pub fn sample(&self, x: f64) -> f64 {
        let points = self.points.as_slice();
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return 0.0;
        };
        if x.is_nan() || x <= first.input {
            return first.output;
        }
        if x >= last.input {
            return last.output;
        }

        let upper = points.partition_point(|point| point.input <= x);
        let (a, b) = (points[upper - 1], points[upper]);
        let t = (x - a.input) / (b.input - a.input);
        let t = match self.interpolation {
            Interpolation::Linear => t,
            Interpolation::Smoothstep => t * t * (3.0 - 2.0 * t),
        };
        a.output + (b.output - a.output) * t
    }
}
