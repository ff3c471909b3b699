use std::fmt;

use recoil_core::{AnimatableProperty, Vector};

use super::values::PropertyValues;
use crate::easing::{solve_epsilon, Easing};

/// Progress within this distance of 1 counts as complete
pub const PROGRESS_THRESHOLD: f64 = 1e-6;

/// Default duration of a basic animation, in seconds
pub const DEFAULT_DURATION: f64 = 0.4;

/// Easing function of normalized time
pub type EasingFn = Box<dyn Fn(f64) -> f64 + Send>;

/// How a basic animation maps elapsed time to progress
pub enum Timing {
    Curve(Easing),
    Function(EasingFn),
}

impl fmt::Debug for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timing::Curve(easing) => f.debug_tuple("Curve").field(easing).finish(),
            Timing::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// A property animation interpolating from -> to over a fixed duration
#[derive(Debug)]
pub struct BasicAnimation {
    pub(crate) values: PropertyValues,
    pub(crate) duration: f64,
    pub(crate) timing: Timing,
}

impl BasicAnimation {
    pub(crate) fn new(property: AnimatableProperty) -> Self {
        Self {
            values: PropertyValues::new(property),
            duration: DEFAULT_DURATION,
            timing: Timing::Curve(Easing::Default),
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// The Bezier timing curve, if the animation is not using an easing function
    pub fn easing(&self) -> Option<Easing> {
        match self.timing {
            Timing::Curve(easing) => Some(easing),
            Timing::Function(_) => None,
        }
    }

    pub(crate) fn advance(&mut self, local_time: f64) -> bool {
        let (Some(from), Some(to)) = (self.values.from, self.values.to) else {
            return false;
        };
        if self.values.current.is_none() {
            return false;
        }

        let t = if self.duration > 0.0 {
            local_time.min(self.duration) / self.duration
        } else {
            1.0
        };

        // the easing function drives the value; completion follows elapsed time
        let (p, progress) = match &self.timing {
            Timing::Curve(easing) => {
                let p = easing.solve(t, solve_epsilon(self.duration));
                (p, p)
            }
            Timing::Function(f) => {
                let p = f(t);
                (if p.is_nan() { 0.0 } else { p }, t)
            }
        };

        self.values.current = Some(Vector::lerp(&from, &to, p));
        self.values.progress = progress;
        self.values.clamp_current(self.values.clamp);
        true
    }

    pub(crate) fn is_done(&self) -> bool {
        self.values.progress + PROGRESS_THRESHOLD >= 1.0
    }
}
