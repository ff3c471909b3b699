//! Value vectors shared by every property animation
//!
//! From, to, current and velocity vectors plus the bookkeeping built on them:
//! clamping, rounding, progress estimation, progress markers and the
//! reached-to-value test.

use recoil_core::{
    AnimatableProperty, AnimationError, AnimationEvent, OwnerId, PropertyHost, Result, Vector,
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::Notifier;
use crate::tracer::{TraceKind, TracePayload};

/// Which end of the from/to range the current value is held within
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clamp {
    #[default]
    None,
    Start,
    End,
    Both,
}

impl Clamp {
    fn bits(self) -> u8 {
        match self {
            Clamp::None => 0,
            Clamp::Start => 1,
            Clamp::End => 2,
            Clamp::Both => 3,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => Clamp::None,
            1 => Clamp::Start,
            2 => Clamp::End,
            _ => Clamp::Both,
        }
    }

    pub fn union(self, other: Clamp) -> Clamp {
        Clamp::from_bits(self.bits() | other.bits())
    }

    pub fn clamps_start(self) -> bool {
        self.bits() & 1 != 0
    }

    pub fn clamps_end(self) -> bool {
        self.bits() & 2 != 0
    }
}

fn clamp_value(value: &mut f64, from: f64, to: f64, clamp: Clamp) {
    let increasing = to > from;
    if clamp.clamps_start() && ((increasing && *value < from) || (!increasing && *value > from)) {
        *value = from;
    }
    if clamp.clamps_end() && ((increasing && *value > to) || (!increasing && *value < to)) {
        *value = to;
    }
}

/// Estimate of how far `current` has travelled from `from` towards `to`
pub(crate) fn estimate_progress(current: &Vector, from: &Vector, to: &Vector) -> f64 {
    let s = (*current - *from).squared_norm();
    let e = (*current - *to).squared_norm();
    let d = (*to - *from).squared_norm();

    if d == 0.0 {
        1.0
    } else if s > e {
        (s / d).sqrt()
    } else {
        1.0 - (e / d).sqrt()
    }
}

/// Validate progress markers: ascending fractions in [0, 1]
pub(crate) fn check_markers(markers: &[f64]) -> Result<()> {
    let in_range = markers.iter().all(|m| (0.0..=1.0).contains(m));
    let ascending = markers.windows(2).all(|w| w[0] <= w[1]);
    if in_range && ascending {
        Ok(())
    } else {
        Err(AnimationError::InvalidProgressMarkers(markers.to_vec()))
    }
}

/// Vectors and per-run flags of a property animation
#[derive(Clone, Debug)]
pub struct PropertyValues {
    pub(crate) property: AnimatableProperty,
    pub(crate) from: Option<Vector>,
    pub(crate) to: Option<Vector>,
    pub(crate) current: Option<Vector>,
    pub(crate) velocity: Option<Vector>,
    /// Velocity as last set by the caller, restored on repeat
    pub(crate) configured_velocity: Option<Vector>,
    pub(crate) previous: Option<Vector>,
    pub(crate) previous2: Option<Vector>,
    /// Signed distance to target at start, absent when it was zero
    pub(crate) distance: Option<Vector>,

    pub(crate) rounding_factor: f64,
    pub(crate) clamp: Clamp,
    pub(crate) additive: bool,

    pub(crate) progress: f64,
    markers: SmallVec<[f64; 4]>,
    next_marker: usize,
    reached_to_value: bool,
}

impl PropertyValues {
    pub(crate) fn new(property: AnimatableProperty) -> Self {
        Self {
            property,
            from: None,
            to: None,
            current: None,
            velocity: None,
            configured_velocity: None,
            previous: None,
            previous2: None,
            distance: None,
            rounding_factor: 0.0,
            clamp: Clamp::None,
            additive: false,
            progress: 0.0,
            markers: SmallVec::new(),
            next_marker: 0,
            reached_to_value: false,
        }
    }

    pub(crate) fn threshold(&self) -> f64 {
        self.property.threshold()
    }

    pub(crate) fn should_round(&self) -> bool {
        self.rounding_factor != 0.0
    }

    /// Whether from, to and current are all known
    pub(crate) fn has_values(&self) -> bool {
        self.from.is_some() && self.to.is_some() && self.current.is_some()
    }

    /// Copy of the current value, rounded when a rounding factor is set
    pub(crate) fn current_value(&self) -> Option<Vector> {
        let mut value = self.current?;
        if self.should_round() {
            value.sub_round(1.0 / self.rounding_factor);
        }
        Some(value)
    }

    pub(crate) fn zero(&self) -> Result<Vector> {
        Vector::zeros(self.property.cardinality())
    }

    pub(crate) fn markers(&self) -> &[f64] {
        &self.markers
    }

    pub(crate) fn set_markers(&mut self, markers: &[f64]) -> Result<()> {
        check_markers(markers)?;
        self.markers = markers.iter().copied().collect();
        self.next_marker = 0;
        Ok(())
    }

    pub(crate) fn reached_to_value(&self) -> bool {
        self.reached_to_value
    }

    /// Forget the reached-to-value state after the target moved
    pub(crate) fn retarget(&mut self) {
        self.reached_to_value = false;
        self.distance = None;
    }

    pub(crate) fn clamp_current(&mut self, clamp: Clamp) {
        if clamp == Clamp::None {
            return;
        }
        let (Some(current), Some(from), Some(to)) = (self.current.as_mut(), self.from, self.to) else {
            return;
        };
        for (idx, value) in current.as_mut_slice().iter_mut().enumerate() {
            clamp_value(value, from[idx], to[idx], clamp);
        }
    }

    pub(crate) fn compute_progress(&mut self) {
        if let (Some(current), Some(from), Some(to)) = (self.current, self.from, self.to) {
            self.progress = estimate_progress(&current, &from, &to);
        }
    }

    /// Record the signed distance to target if it is not known yet
    pub(crate) fn compute_distance(&mut self) {
        if self.distance.is_some() {
            return;
        }
        let Some(start) = self.current.or(self.from) else {
            return;
        };
        if let Some(to) = self.to {
            let distance = to - start;
            if !distance.is_zero() {
                self.distance = Some(distance);
            }
        }
    }

    /// Read `slot` from the host if it has no value yet
    pub(crate) fn read_missing(
        property: &AnimatableProperty,
        slot: &mut Option<Vector>,
        owner: OwnerId,
        host: &dyn PropertyHost,
        notifier: &mut Notifier,
        time: f64,
    ) {
        if slot.is_some() {
            return;
        }
        match host.read(owner, property) {
            Some(value) if value.len() == property.cardinality() => {
                notifier.trace(TraceKind::PropertyRead, time, TracePayload::Vector(value));
                *slot = Some(value);
            }
            Some(value) => {
                tracing::warn!(
                    property = property.name(),
                    expected = property.cardinality(),
                    found = value.len(),
                    "host value has the wrong cardinality"
                );
            }
            None => {
                tracing::warn!(property = property.name(), owner = owner.0, "host cannot supply a value");
            }
        }
    }

    /// Fire notifications for passed progress markers and the target being
    /// reached
    pub(crate) fn delegate_progress(&mut self, notifier: &mut Notifier, time: f64) {
        if !self.has_values() {
            return;
        }

        while self.next_marker < self.markers.len() {
            let marker = self.markers[self.next_marker];
            if self.progress < marker {
                break;
            }
            notifier.emit(AnimationEvent::ReachedProgress { marker }, time);
            self.next_marker += 1;
        }

        if !self.reached_to_value && self.has_reached_to_value() {
            self.reached_to_value = true;
            if let Some(current) = self.current_value() {
                notifier.trace(TraceKind::DidReachToValue, time, TracePayload::Vector(current));
            }
            notifier.emit(AnimationEvent::ReachedToValue, time);
        }
    }

    fn has_reached_to_value(&self) -> bool {
        let (Some(current), Some(to)) = (self.current, self.to) else {
            return false;
        };
        let remaining = to - current;
        if remaining.is_zero() {
            return true;
        }
        let Some(initial) = self.distance else {
            // zero initial distance counts as already there
            return true;
        };
        let crossed = remaining
            .iter()
            .zip(initial.iter())
            .all(|(r, i)| *i == 0.0 || *r == 0.0 || r.is_sign_negative() != i.is_sign_negative());
        crossed
    }

    pub(crate) fn reset(&mut self, all: bool) {
        if all {
            self.current = None;
            self.previous = None;
            self.previous2 = None;
        }
        self.progress = 0.0;
        self.next_marker = 0;
        self.reached_to_value = false;
        self.distance = None;
    }

    /// Shift the sample window and return the value to hand to the host
    pub(crate) fn take_sample(&mut self, value: Vector, live: Option<Vector>) -> Vector {
        let out = if self.additive {
            let base = self.previous.or(self.from).unwrap_or(value);
            match live {
                Some(live) if live.len() == value.len() => live + (value - base),
                Some(live) => {
                    tracing::warn!(
                        property = self.property.name(),
                        expected = value.len(),
                        found = live.len(),
                        "host value has the wrong cardinality, writing absolute value"
                    );
                    value
                }
                None => value,
            }
        } else {
            value
        };
        self.previous2 = self.previous;
        self.previous = Some(value);
        out
    }
}
