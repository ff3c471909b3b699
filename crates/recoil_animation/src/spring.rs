//! Spring physics
//!
//! A damped harmonic oscillator integrated with fixed-step RK4. Elapsed time is
//! fed into an accumulator so the result does not depend on how the caller
//! slices time into frames.
//!
//! The solver works on position error: `p` is the distance left to the target
//! and the spring pulls it towards zero.

use recoil_core::{AnimationError, Result, Vector};
use serde::{Deserialize, Serialize};

/// Fixed integration step in seconds
pub const SOLVER_DT: f64 = 0.001;

/// Gaps longer than this reset the spring to rest instead of integrating
pub const MAX_SOLVER_DT: f64 = 30.0;

/// Default bounciness used when a spring is configured by feel
pub const DEFAULT_BOUNCINESS: f64 = 4.0;

/// Default speed used when a spring is configured by feel
pub const DEFAULT_SPEED: f64 = 12.0;

/// Position error and velocity of a spring
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringState {
    pub p: Vector,
    pub v: Vector,
}

impl SpringState {
    /// Equality up to the rounding picked up when the caller stores absolute
    /// values of size `magnitude` and rebuilds the state from them
    fn approx_eq(&self, other: &SpringState, magnitude: f64) -> bool {
        let close = |a: &Vector, b: &Vector| {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|(x, y)| (x - y).abs() <= 1e-9 * (1.0 + magnitude + x.abs() + y.abs()))
        };
        close(&self.p, &other.p) && close(&self.v, &other.v)
    }

    fn lerp(previous: &SpringState, current: &SpringState, alpha: f64) -> SpringState {
        SpringState {
            p: Vector::lerp(&previous.p, &current.p, alpha),
            v: Vector::lerp(&previous.v, &current.v, alpha),
        }
    }
}

#[derive(Clone, Copy)]
struct Derivative {
    dp: Vector,
    dv: Vector,
}

/// Spring dynamics constants
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    /// Stiffness
    pub tension: f64,
    /// Damping
    pub friction: f64,
    pub mass: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::from_bounciness_speed(DEFAULT_BOUNCINESS, DEFAULT_SPEED)
    }
}

impl SpringConfig {
    /// Create a config from explicit dynamics constants
    pub fn new(tension: f64, friction: f64, mass: f64) -> Result<Self> {
        let config = Self {
            tension,
            friction,
            mass,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject constants that would make the oscillator meaningless
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("tension", self.tension, self.tension >= 0.0),
            ("friction", self.friction, self.friction >= 0.0),
            ("mass", self.mass, self.mass > 0.0),
        ];
        for (name, value, ok) in checks {
            if !(value.is_finite() && ok) {
                return Err(AnimationError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }

    /// Convert bounciness and speed, both conventionally in [0, 20], into
    /// dynamics constants. Mass is always 1.
    pub fn from_bounciness_speed(bounciness: f64, speed: f64) -> Self {
        let b = project_normal(normalize(bounciness / 1.7, 0.0, 20.0), 0.0, 0.8);
        let s = normalize(speed / 1.7, 0.0, 20.0);

        let qc_tension = project_normal(s, 0.5, 200.0);
        let qc_friction = quadratic_out_interpolation(b, no_bounce(qc_tension), 0.01);

        Self {
            tension: tension_from_origami(qc_tension),
            friction: friction_from_origami(qc_friction),
            mass: 1.0,
        }
    }

    /// Inverse of [`SpringConfig::from_bounciness_speed`]. Mass is ignored.
    pub fn to_bounciness_speed(&self) -> (f64, f64) {
        let qc_friction = origami_from_friction(self.friction);
        let qc_tension = origami_from_tension(self.tension);

        let s = normalize(qc_tension, 0.5, 200.0);
        let nb = no_bounce(qc_tension);

        let b = solve_quadratic_out(nb, qc_friction);

        let bounciness = project_normal(normalize(b, 0.0, 0.8), 0.0, 20.0) * 1.7;
        let speed = project_normal(s, 0.0, 20.0) * 1.7;
        (bounciness, speed)
    }
}

fn normalize(value: f64, start: f64, end: f64) -> f64 {
    (value - start) / (end - start)
}

fn project_normal(n: f64, start: f64, end: f64) -> f64 {
    start + n * (end - start)
}

fn linear_interpolation(t: f64, start: f64, end: f64) -> f64 {
    t * end + (1.0 - t) * start
}

fn quadratic_out_interpolation(t: f64, start: f64, end: f64) -> f64 {
    linear_interpolation(2.0 * t - t * t, start, end)
}

/// Friction at which a spring of the given tension stops bouncing
fn no_bounce(tension: f64) -> f64 {
    if tension <= 18.0 {
        0.0007 * tension.powi(3) - 0.031 * tension.powi(2) + 0.64 * tension + 1.28
    } else if tension <= 44.0 {
        0.000044 * tension.powi(3) - 0.006 * tension.powi(2) + 0.36 * tension + 2.0
    } else {
        0.00000045 * tension.powi(3) - 0.000332 * tension.powi(2) + 0.1078 * tension + 5.84
    }
}

/// Solve `quadratic_out_interpolation(x, nb, 0.01) == friction` for x in [0, 1]
fn solve_quadratic_out(nb: f64, friction: f64) -> f64 {
    let a = nb - 0.01;
    let b = 2.0 * (0.01 - nb);
    let c = nb - friction;

    if a == 0.0 {
        return if b == 0.0 { 0.0 } else { -c / b };
    }

    let disc = (b * b - 4.0 * a * c).max(0.0).sqrt();
    let x1 = (-b + disc) / (2.0 * a);
    let x2 = (-b - disc) / (2.0 * a);

    if (0.0..=1.0).contains(&x1) {
        x1
    } else if (0.0..=1.0).contains(&x2) {
        x2
    } else {
        // Out-of-range constants; pick the root closest to the unit interval
        let dist = |x: f64| if x < 0.0 { -x } else { x - 1.0 };
        if dist(x1) <= dist(x2) {
            x1
        } else {
            x2
        }
    }
}

fn tension_from_origami(value: f64) -> f64 {
    194.0 + (value - 30.0) / 50.0 * (375.0 - 194.0)
}

fn origami_from_tension(value: f64) -> f64 {
    30.0 + (value - 194.0) / (375.0 - 194.0) * 50.0
}

fn friction_from_origami(value: f64) -> f64 {
    25.0 + (value - 8.0) / 2.0 * (25.0 - 19.0)
}

fn origami_from_friction(value: f64) -> f64 {
    8.0 + (value - 25.0) / (25.0 - 19.0) * 2.0
}

/// Fixed-step RK4 spring integrator
#[derive(Clone, Debug)]
pub struct SpringSolver {
    k: f64,
    b: f64,
    m: f64,

    tp: f64,
    tv: f64,
    ta: f64,

    /// Size of the absolute values the caller derives states from
    magnitude: f64,
    accumulated: f64,
    last_state: Option<SpringState>,
    last_dv: Option<Vector>,
    /// Pre- and post-step states behind the last interpolated output
    steps: Option<(SpringState, SpringState)>,
    started: bool,
}

impl SpringSolver {
    pub fn new(config: SpringConfig) -> Self {
        let mut solver = Self {
            k: config.tension,
            b: config.friction,
            m: config.mass,
            tp: 0.0,
            tv: 0.0,
            ta: 0.0,
            magnitude: 0.0,
            accumulated: 0.0,
            last_state: None,
            last_dv: None,
            steps: None,
            started: false,
        };
        solver.set_threshold(1.0);
        solver
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn set_config(&mut self, config: SpringConfig) {
        self.k = config.tension;
        self.b = config.friction;
        self.m = config.mass;
    }

    /// Derive the convergence thresholds from a dynamics threshold
    pub fn set_threshold(&mut self, t: f64) {
        self.tp = t / 2.0; // half a unit
        self.tv = 25.0 * t; // 5 units per second, squared
        self.ta = 625.0 * t * t; // 5 units per second squared, squared
    }

    /// Largest absolute value the caller converts states to and from, so
    /// that resuming tolerates the rounding of that round trip
    pub fn set_magnitude(&mut self, magnitude: f64) {
        self.magnitude = magnitude.abs();
    }

    fn acceleration(&self, p: &Vector, v: &Vector) -> Vector {
        *p * (-self.k / self.m) - *v * (self.b / self.m)
    }

    fn evaluate(&self, initial: &SpringState, dt: f64, d: Option<&Derivative>) -> Derivative {
        let (p, v) = match d {
            Some(d) => (initial.p + d.dp * dt, initial.v + d.dv * dt),
            None => (initial.p, initial.v),
        };
        Derivative {
            dp: v,
            dv: self.acceleration(&p, &v),
        }
    }

    fn integrate(&mut self, state: &mut SpringState, dt: f64) {
        let a = self.evaluate(state, 0.0, None);
        let b = self.evaluate(state, dt * 0.5, Some(&a));
        let c = self.evaluate(state, dt * 0.5, Some(&b));
        let d = self.evaluate(state, dt, Some(&c));

        let dpdt = (a.dp + (b.dp + c.dp) * 2.0 + d.dp) * (1.0 / 6.0);
        let dvdt = (a.dv + (b.dv + c.dv) * 2.0 + d.dv) * (1.0 / 6.0);

        state.p += dpdt * dt;
        state.v += dvdt * dt;

        self.last_dv = Some(dvdt);
    }

    /// Advance `state` by `dt` seconds.
    ///
    /// When `state` is the output of the previous call, integration resumes
    /// from the solver's own step states so that splitting a time span across
    /// calls gives the same result as a single call.
    pub fn advance(&mut self, state: &mut SpringState, dt: f64) {
        self.started = true;

        if dt > MAX_SOLVER_DT {
            tracing::warn!(dt, "excessive spring time step, resetting to rest");
            let zero = state.p * 0.0;
            *state = SpringState { p: zero, v: zero };
            self.last_state = Some(*state);
            self.last_dv = Some(zero);
            self.steps = None;
            self.accumulated = 0.0;
            return;
        }

        self.accumulated += dt;

        let (mut previous, mut current) = match (self.steps, self.last_state) {
            (Some(steps), Some(last)) if last.approx_eq(state, self.magnitude) => steps,
            _ => (*state, *state),
        };

        while self.accumulated >= SOLVER_DT {
            previous = current;
            self.integrate(&mut current, SOLVER_DT);
            self.accumulated -= SOLVER_DT;
        }

        let alpha = self.accumulated / SOLVER_DT;
        *state = SpringState::lerp(&previous, &current, alpha);
        self.steps = Some((previous, current));
        self.last_state = Some(*state);
    }

    /// Whether the last sample is within every threshold
    pub fn has_converged(&self) -> bool {
        if !self.started {
            return false;
        }
        let Some(last) = self.last_state else {
            return false;
        };

        if last.p.iter().any(|p| p.abs() >= self.tp) {
            return false;
        }

        let dv = self.last_dv.map_or(0.0, |dv| dv.squared_norm());
        last.v.squared_norm() < self.tv && dv < self.ta
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
        self.last_state = None;
        self.last_dv = None;
        self.steps = None;
        self.started = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(p: f64) -> SpringState {
        SpringState {
            p: Vector::from(p),
            v: Vector::from(0.0),
        }
    }

    #[test]
    fn test_default_config_is_bounciness_4_speed_12() {
        let config = SpringConfig::default();
        assert_eq!(config.mass, 1.0);
        assert!(config.tension > 0.0);
        assert!(config.friction > 0.0);
    }

    #[test]
    fn test_bounciness_speed_round_trip() {
        let config = SpringConfig::from_bounciness_speed(4.0, 12.0);
        let (bounciness, speed) = config.to_bounciness_speed();
        assert!((bounciness - 4.0).abs() < 1e-3, "bounciness {bounciness}");
        assert!((speed - 12.0).abs() < 1e-3, "speed {speed}");
    }

    #[test]
    fn test_round_trip_across_range() {
        for (bounciness, speed) in [(0.0, 1.0), (10.0, 5.0), (20.0, 20.0), (8.5, 17.0)] {
            let (b, s) = SpringConfig::from_bounciness_speed(bounciness, speed).to_bounciness_speed();
            assert!((b - bounciness).abs() < 1e-3, "{bounciness} -> {b}");
            assert!((s - speed).abs() < 1e-3, "{speed} -> {s}");
        }
    }

    #[test]
    fn test_more_bounciness_means_less_friction() {
        let stiff = SpringConfig::from_bounciness_speed(0.0, 12.0);
        let bouncy = SpringConfig::from_bounciness_speed(15.0, 12.0);
        assert!(bouncy.friction < stiff.friction);
        assert_eq!(bouncy.tension, stiff.tension);
    }

    #[test]
    fn test_invalid_constants_rejected() {
        assert!(SpringConfig::new(100.0, 10.0, 1.0).is_ok());
        assert_eq!(
            SpringConfig::new(100.0, 10.0, 0.0),
            Err(AnimationError::InvalidParameter {
                name: "mass",
                value: 0.0
            })
        );
        assert!(SpringConfig::new(f64::NAN, 10.0, 1.0).is_err());
    }

    #[test]
    fn test_converges_within_bounded_steps() {
        let config = SpringConfig::new(100.0, 10.0, 1.0).unwrap();
        let mut solver = SpringSolver::new(config);
        solver.set_threshold(1.0);

        // from 0 to 100: error starts at 100
        let mut s = state(100.0);
        let mut frames = 0;
        while !solver.has_converged() {
            solver.advance(&mut s, 1.0 / 60.0);
            frames += 1;
            assert!(frames < 60 * 10, "spring did not converge");
        }
        assert!(s.p[0].abs() < 0.5);
    }

    #[test]
    fn test_split_advance_matches_single_advance() {
        let config = SpringConfig::default();

        let mut one = SpringSolver::new(config);
        let mut a = state(50.0);
        one.advance(&mut a, 0.0333);

        let mut two = SpringSolver::new(config);
        let mut b = state(50.0);
        two.advance(&mut b, 0.0333 / 2.0);
        two.advance(&mut b, 0.0333 / 2.0);

        assert!((a.p[0] - b.p[0]).abs() < 1e-9, "{:?} vs {:?}", a, b);
        assert!((a.v[0] - b.v[0]).abs() < 1e-9);
    }

    #[test]
    fn test_split_advance_resumes_near_large_target() {
        let config = SpringConfig::default();
        let to = Vector::from(1.0e12);

        let mut one = SpringSolver::new(config);
        let mut a = state(100.0);
        one.advance(&mut a, 0.0333);

        let mut two = SpringSolver::new(config);
        two.set_magnitude(1.0e12);
        let mut b = state(100.0);
        two.advance(&mut b, 0.0333 / 2.0);
        // the caller keeps absolute values and rebuilds the error from them
        b.p = to - (to - b.p);
        two.advance(&mut b, 0.0333 / 2.0);

        assert!((a.p[0] - b.p[0]).abs() < 1e-6, "{:?} vs {:?}", a, b);
        assert!((a.v[0] - b.v[0]).abs() < 1e-6);
    }

    #[test]
    fn test_excessive_gap_resets_to_rest() {
        let mut solver = SpringSolver::new(SpringConfig::default());
        let mut s = state(10.0);
        solver.advance(&mut s, MAX_SOLVER_DT + 1.0);
        assert!(s.p.is_zero());
        assert!(s.v.is_zero());
        assert!(solver.has_converged());
    }

    #[test]
    fn test_not_converged_before_start() {
        let mut solver = SpringSolver::new(SpringConfig::default());
        assert!(!solver.has_converged());
        let mut s = state(0.0);
        solver.advance(&mut s, 0.016);
        assert!(solver.has_converged());
        solver.reset();
        assert!(!solver.started());
        assert!(!solver.has_converged());
    }

    #[test]
    fn test_convergence_ignores_missing_components() {
        let mut solver = SpringSolver::new(SpringConfig::default());
        let mut s = SpringState {
            p: Vector::from([0.1, 0.1]),
            v: Vector::from([0.0, 0.0]),
        };
        solver.advance(&mut s, 0.0005);
        assert_eq!(s.p.len(), 2);
        assert!(solver.has_converged());
    }
}
