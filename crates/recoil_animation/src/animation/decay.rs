use recoil_core::{AnimatableProperty, Result, Vector};

use super::values::{Clamp, PropertyValues};
use crate::decay::{self, DEFAULT_DECELERATION};

/// A property animation that coasts from an initial velocity to rest
#[derive(Clone, Debug)]
pub struct DecayAnimation {
    pub(crate) values: PropertyValues,
    deceleration: f64,
    duration: f64,
    original_velocity: Option<Vector>,
}

impl DecayAnimation {
    pub(crate) fn new(property: AnimatableProperty) -> Self {
        Self {
            values: PropertyValues::new(property),
            deceleration: DEFAULT_DECELERATION,
            duration: 0.0,
            original_velocity: None,
        }
    }

    pub fn deceleration(&self) -> f64 {
        self.deceleration
    }

    /// Derived time until the velocity falls below the stopping velocity
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Velocity the animation was configured with
    pub fn original_velocity(&self) -> Option<Vector> {
        self.original_velocity
    }

    pub(crate) fn set_deceleration(&mut self, deceleration: f64) -> Result<()> {
        self.deceleration = decay::validate_deceleration(deceleration)?;
        self.invalidate_destination();
        Ok(())
    }

    pub(crate) fn set_velocity(&mut self, velocity: Vector) {
        self.values.velocity = Some(velocity);
        self.values.configured_velocity = Some(velocity);
        self.original_velocity = Some(velocity);
        self.invalidate_destination();
    }

    /// Drop the derived end value so it is recomputed before the next frame
    pub(crate) fn invalidate_destination(&mut self) {
        self.values.to = None;
        self.values.retarget();
    }

    /// Compute the resting value from the current (or from) value
    pub(crate) fn compute_destination(&mut self) -> Result<()> {
        let Some(start) = self.values.current.or(self.values.from) else {
            return Ok(());
        };
        let velocity = match self.values.velocity {
            Some(v) => v,
            None => self.values.zero()?,
        };
        let (to, duration) = decay::destination(&start, &velocity, self.deceleration, self.values.threshold());
        self.values.to = Some(to);
        self.duration = duration;
        Ok(())
    }

    pub(crate) fn advance(&mut self, dt: f64) -> bool {
        let (Some(current), Some(velocity)) = (self.values.current.as_mut(), self.values.velocity.as_mut()) else {
            return false;
        };
        decay::decay_position(current, velocity, dt, self.deceleration);

        // never decay past the derived end value
        self.values.clamp_current(Clamp::End.union(self.values.clamp));
        true
    }

    pub(crate) fn is_done(&self) -> bool {
        match self.values.velocity {
            Some(v) => decay::has_stopped(&v, self.values.threshold()),
            None => true,
        }
    }

    /// Prepare a reversed leg: coast back from the previous end value with
    /// the original velocity negated
    pub(crate) fn reverse(&mut self) -> Result<()> {
        let velocity = match self.original_velocity {
            Some(v) => -v,
            None => self.values.zero()?,
        };
        self.original_velocity = Some(velocity);
        self.values.velocity = Some(velocity);
        self.values.from = self.values.to;
        self.values.current = self.values.from;
        self.values.to = None;
        self.compute_destination()
    }

    /// Prepare a repeated leg with the original velocity
    pub(crate) fn restore_velocity(&mut self) -> Result<()> {
        self.values.velocity = match self.original_velocity {
            Some(v) => Some(v),
            None => Some(self.values.zero()?),
        };
        self.values.current = self.values.from;
        self.values.to = None;
        self.compute_destination()
    }
}
