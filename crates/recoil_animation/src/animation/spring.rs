use recoil_core::{AnimatableProperty, Result};

use super::values::PropertyValues;
use crate::spring::{SpringConfig, SpringSolver, SpringState, DEFAULT_BOUNCINESS, DEFAULT_SPEED};

/// A property animation driven by a damped spring
#[derive(Clone, Debug)]
pub struct SpringAnimation {
    pub(crate) values: PropertyValues,
    config: SpringConfig,
    bounciness: f64,
    speed: f64,
    solver: Option<SpringSolver>,
}

impl SpringAnimation {
    pub(crate) fn new(property: AnimatableProperty) -> Self {
        Self {
            values: PropertyValues::new(property),
            config: SpringConfig::from_bounciness_speed(DEFAULT_BOUNCINESS, DEFAULT_SPEED),
            bounciness: DEFAULT_BOUNCINESS,
            speed: DEFAULT_SPEED,
            solver: None,
        }
    }

    pub fn config(&self) -> SpringConfig {
        self.config
    }

    pub fn bounciness(&self) -> f64 {
        self.bounciness
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub(crate) fn set_bounciness_speed(&mut self, bounciness: f64, speed: f64) {
        self.bounciness = bounciness;
        self.speed = speed;
        self.config = SpringConfig::from_bounciness_speed(bounciness, speed);
        self.updated_dynamics();
    }

    pub(crate) fn set_config(&mut self, config: SpringConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        let (bounciness, speed) = config.to_bounciness_speed();
        self.bounciness = bounciness;
        self.speed = speed;
        self.updated_dynamics();
        Ok(())
    }

    fn updated_dynamics(&mut self) {
        if let Some(solver) = self.solver.as_mut() {
            solver.set_config(self.config);
        }
    }

    /// Create the solver once values are about to run
    pub(crate) fn ensure_solver(&mut self) {
        let threshold = self.values.threshold();
        let config = self.config;
        self.solver
            .get_or_insert_with(|| SpringSolver::new(config))
            .set_threshold(threshold);
    }

    pub(crate) fn advance(&mut self, dt: f64) -> bool {
        let (Some(current), Some(to)) = (self.values.current, self.values.to) else {
            return false;
        };
        let Some(solver) = self.solver.as_mut() else {
            return false;
        };
        let velocity = match self.values.velocity {
            Some(v) => v,
            None => current * 0.0,
        };

        // the solver models a spring of size zero pulling the error to rest
        let mut state = SpringState {
            p: to - current,
            v: -velocity,
        };
        let magnitude = to
            .iter()
            .chain(current.iter())
            .fold(0.0_f64, |m, x| m.max(x.abs()));
        solver.set_magnitude(magnitude);
        solver.advance(&mut state, dt);

        self.values.current = Some(to - state.p);
        self.values.velocity = Some(-state.v);
        self.values.clamp_current(self.values.clamp);
        true
    }

    /// Whether the last three samples have settled on the target
    fn has_converged_samples(&self) -> bool {
        let (Some(to), Some(previous), Some(previous2)) =
            (self.values.to, self.values.previous, self.values.previous2)
        else {
            return false;
        };

        if self.values.should_round() {
            return previous2 == previous && previous == to;
        }

        let t = self.values.threshold() / 5.0;
        (0..to.len()).all(|idx| (to[idx] - previous[idx]).abs() < t && (previous2[idx] - previous[idx]).abs() < t)
    }

    pub(crate) fn is_done(&self) -> bool {
        match self.solver.as_ref() {
            Some(solver) => solver.started() && (self.has_converged_samples() || solver.has_converged()),
            None => false,
        }
    }

    /// Flip the velocity for a reversed leg
    pub(crate) fn reverse_velocity(&mut self) {
        if let Some(v) = self.values.velocity.as_mut() {
            *v = -*v;
        }
    }

    pub(crate) fn restore_velocity(&mut self) -> Result<()> {
        self.values.velocity = match self.values.configured_velocity {
            Some(v) => Some(v),
            None => Some(self.values.zero()?),
        };
        Ok(())
    }

    pub(crate) fn reset(&mut self, all: bool) {
        self.values.reset(all);
        let config = self.config;
        if let Some(solver) = self.solver.as_mut() {
            solver.set_config(config);
            solver.reset();
        }
    }
}
