//! Timing curves for basic animations
//!
//! A timing curve is a cubic Bezier from (0, 0) to (1, 1) with two control
//! points. Solving it maps normalized elapsed time to normalized progress.

use recoil_core::{AnimationError, Result};
use serde::{Deserialize, Serialize};

/// Newton-Raphson iterations before falling back to bisection
const NEWTON_ITERATIONS: usize = 8;

/// Bisection iteration cap; the best estimate is returned when reached
const BISECTION_ITERATIONS: usize = 64;

/// Timing curve of a basic animation
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// The platform default curve, (0.25, 0.1) (0.25, 1.0)
    #[default]
    Default,
    /// Control points (x1, y1, x2, y2)
    CubicBezier(f64, f64, f64, f64),
}

impl Easing {
    /// The curve's two control points as `[x1, y1, x2, y2]`
    pub fn control_points(&self) -> [f64; 4] {
        match self {
            Easing::Linear => [0.0, 0.0, 1.0, 1.0],
            Easing::EaseIn => [0.42, 0.0, 1.0, 1.0],
            Easing::EaseOut => [0.0, 0.0, 0.58, 1.0],
            Easing::EaseInOut => [0.42, 0.0, 0.58, 1.0],
            Easing::Default => [0.25, 0.1, 0.25, 1.0],
            Easing::CubicBezier(x1, y1, x2, y2) => [*x1, *y1, *x2, *y2],
        }
    }

    /// Reject control points outside [0, 1]
    pub fn validate(&self) -> Result<()> {
        for (index, value) in self.control_points().into_iter().enumerate() {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnimationError::InvalidControlPoint { index, value });
            }
        }
        Ok(())
    }

    /// Progress for normalized time `t`, solved to within `epsilon`
    pub fn solve(&self, t: f64, epsilon: f64) -> f64 {
        if let Easing::Linear = self {
            return t.clamp(0.0, 1.0);
        }
        timing_function_solve(self.control_points(), t, epsilon)
    }

    /// Progress for normalized time `t` at a fixed precision
    pub fn apply(&self, t: f64) -> f64 {
        self.solve(t, 1e-6)
    }
}

/// Solver precision for an animation of `duration` seconds.
///
/// The longer the duration, the higher the necessary precision.
pub fn solve_epsilon(duration: f64) -> f64 {
    1.0 / (1000.0 * duration)
}

/// Solve the curve `[x1, y1, x2, y2]` for progress at normalized time `t`.
///
/// Uses Newton-Raphson with a bisection fallback. A NaN result maps to 0.
pub fn timing_function_solve(points: [f64; 4], t: f64, epsilon: f64) -> f64 {
    // Endpoints are always exact
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let [x1, y1, x2, y2] = points;
    let s = solve_curve_x(t, x1, x2, epsilon);
    let p = bezier_sample(s, y1, y2);
    if p.is_nan() {
        0.0
    } else {
        p
    }
}

/// Find the curve parameter `s` with `bezier_x(s) == x`
fn solve_curve_x(x: f64, x1: f64, x2: f64, epsilon: f64) -> f64 {
    let mut s = x;
    for _ in 0..NEWTON_ITERATIONS {
        let err = bezier_sample(s, x1, x2) - x;
        if err.abs() < epsilon {
            return s;
        }
        let slope = bezier_slope(s, x1, x2);
        if slope.abs() < 1e-6 {
            break; // slope too flat, switch to bisection
        }
        s -= err / slope;
    }

    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    s = x;
    for _ in 0..BISECTION_ITERATIONS {
        let val = bezier_sample(s, x1, x2);
        if (val - x).abs() < epsilon {
            break;
        }
        if x > val {
            lo = s;
        } else {
            hi = s;
        }
        s = lo + (hi - lo) * 0.5;
    }
    s
}

/// Evaluate cubic bezier at parameter t: B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

/// Derivative of cubic bezier: B'(t) = 3(1-t)²·p1 + 6(1-t)t·(p2-p1) + 3t²·(1-p2)
#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_exact() {
        for easing in [Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut, Easing::Default] {
            assert_eq!(easing.solve(0.0, 1e-6), 0.0);
            assert_eq!(easing.solve(1.0, 1e-6), 1.0);
        }
    }

    #[test]
    fn test_linear_control_points_are_identity() {
        let linear = Easing::CubicBezier(0.0, 0.0, 1.0, 1.0);
        for i in 1..10 {
            let t = i as f64 / 10.0;
            assert!((linear.solve(t, 1e-7) - t).abs() < 1e-6);
        }
        assert!((linear.solve(0.5, 1e-7) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric_curve_midpoint() {
        let p = Easing::EaseInOut.solve(0.5, 1e-7);
        assert!((p - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_ease_in_lags_ease_out_leads() {
        assert!(Easing::EaseIn.apply(0.3) < 0.3);
        assert!(Easing::EaseOut.apply(0.3) > 0.3);
    }

    #[test]
    fn test_monotonic() {
        let mut last = 0.0;
        for i in 0..=100 {
            let p = Easing::Default.apply(i as f64 / 100.0);
            assert!(p >= last - 1e-9);
            last = p;
        }
    }

    #[test]
    fn test_flat_slope_falls_back_to_bisection() {
        // x1 = x2 = 1 gives a zero slope at the start of the curve
        let easing = Easing::CubicBezier(1.0, 0.0, 1.0, 1.0);
        let p = easing.solve(0.01, 1e-6);
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_validate_rejects_out_of_range_points() {
        assert!(Easing::Default.validate().is_ok());
        assert_eq!(
            Easing::CubicBezier(0.5, -0.2, 0.5, 1.0).validate(),
            Err(AnimationError::InvalidControlPoint {
                index: 1,
                value: -0.2
            })
        );
    }

    #[test]
    fn test_solve_epsilon_tightens_with_duration() {
        assert!(solve_epsilon(2.0) < solve_epsilon(0.5));
        assert_eq!(solve_epsilon(1.0), 0.001);
    }
}
