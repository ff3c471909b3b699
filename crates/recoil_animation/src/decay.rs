//! Velocity decay
//!
//! Closed-form exponential decay: velocity is multiplied by the deceleration
//! factor once per millisecond, so `v(t) = v0 * d^(1000t)` and the position
//! follows by summing the geometric series.

use recoil_core::{AnimationError, Result, Vector};

/// Velocity, as a multiple of the dynamics threshold, below which decay stops
pub const MIN_VELOCITY_FACTOR: f64 = 5.0;

pub const DEFAULT_DECELERATION: f64 = 0.998;

/// Check that `deceleration` lies strictly between 0 and 1
pub fn validate_deceleration(deceleration: f64) -> Result<f64> {
    if deceleration > 0.0 && deceleration < 1.0 {
        Ok(deceleration)
    } else {
        Err(AnimationError::InvalidDeceleration(deceleration))
    }
}

/// Advance position `x` and velocity `v` by `dt` seconds
pub fn decay_position(x: &mut Vector, v: &mut Vector, dt: f64, deceleration: f64) {
    let dt = dt * 1000.0;

    let kv = deceleration.powf(dt);
    let kx = deceleration * (1.0 - kv) / (1.0 - deceleration);

    for (x, v) in x.as_mut_slice().iter_mut().zip(v.as_mut_slice()) {
        let v0 = *v / 1000.0;
        *v = v0 * kv * 1000.0;
        *x += v0 * kx;
    }
}

/// Seconds until every velocity component falls below the stopping velocity.
///
/// The slowest component governs. Zero velocity, or velocity already below
/// the stopping velocity, gives 0.
pub fn duration(velocity: &Vector, deceleration: f64, threshold: f64) -> f64 {
    let k = threshold * MIN_VELOCITY_FACTOR / 1000.0;
    let d = deceleration.ln() * 1000.0;

    let duration = velocity
        .iter()
        .map(|v| (k / (v / 1000.0)).abs().ln() / d)
        .fold(f64::NEG_INFINITY, f64::max);

    if duration.is_nan() || duration < 0.0 {
        0.0
    } else {
        duration
    }
}

/// Resting value and duration of a decay starting at `from` with `velocity`
pub fn destination(from: &Vector, velocity: &Vector, deceleration: f64, threshold: f64) -> (Vector, f64) {
    let duration = duration(velocity, deceleration, threshold);
    let mut to = *from;
    if duration > 0.0 {
        let mut v = *velocity;
        decay_position(&mut to, &mut v, duration, deceleration);
    }
    (to, duration)
}

/// Whether every velocity component is below the stopping velocity
pub fn has_stopped(velocity: &Vector, threshold: f64) -> bool {
    let f = threshold * MIN_VELOCITY_FACTOR;
    velocity.iter().all(|v| v.abs() < f)
}
