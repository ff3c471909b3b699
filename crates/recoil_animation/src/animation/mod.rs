//! Animation state machine
//!
//! An [`Animation`] holds lifecycle flags and timing bookkeeping shared by all
//! kinds, and an [`AnimationKind`] with the kind-specific parameters and
//! values. The scheduler drives it one frame at a time:
//!
//! ```text
//! created (paused) -> attached -> started -> advancing -> stopped
//!                                    ^                       |
//!                                    +---- repeat leg -------+
//! ```
//!
//! A stopped animation is either detached or, when it is not removed on
//! completion, paused in place so that it can be retargeted and rerun.

mod basic;
mod custom;
mod decay;
mod group;
mod spring;
mod values;

use std::fmt;

pub use basic::{BasicAnimation, EasingFn, Timing, DEFAULT_DURATION, PROGRESS_THRESHOLD};
pub use custom::{CustomAnimation, CustomFrame, CustomStep};
pub use decay::DecayAnimation;
pub use group::GroupAnimation;
pub use spring::SpringAnimation;
pub use values::{Clamp, PropertyValues};

use recoil_core::{
    AnimatableProperty, AnimationError, AnimationEvent, EventHandler, OwnerId, PropertyHost,
    Result, Vector,
};
use smallvec::SmallVec;

use crate::easing::Easing;
use crate::spring::SpringConfig;
use crate::tracer::{AnimationTracer, TraceKind, TracePayload};

/// Kind-specific parameters and state
#[derive(Debug)]
pub enum AnimationKind {
    Spring(SpringAnimation),
    Decay(DecayAnimation),
    Basic(BasicAnimation),
    Custom(CustomAnimation),
    Group(GroupAnimation),
}

impl AnimationKind {
    pub fn name(&self) -> &'static str {
        match self {
            AnimationKind::Spring(_) => "spring",
            AnimationKind::Decay(_) => "decay",
            AnimationKind::Basic(_) => "basic",
            AnimationKind::Custom(_) => "custom",
            AnimationKind::Group(_) => "group",
        }
    }

    /// Property values, absent for custom and group animations
    pub fn values(&self) -> Option<&PropertyValues> {
        match self {
            AnimationKind::Spring(s) => Some(&s.values),
            AnimationKind::Decay(d) => Some(&d.values),
            AnimationKind::Basic(b) => Some(&b.values),
            AnimationKind::Custom(_) | AnimationKind::Group(_) => None,
        }
    }

    pub(crate) fn values_mut(&mut self) -> Option<&mut PropertyValues> {
        match self {
            AnimationKind::Spring(s) => Some(&mut s.values),
            AnimationKind::Decay(d) => Some(&mut d.values),
            AnimationKind::Basic(b) => Some(&mut b.values),
            AnimationKind::Custom(_) | AnimationKind::Group(_) => None,
        }
    }

    fn is_done(&self) -> bool {
        match self {
            AnimationKind::Spring(s) => s.is_done(),
            AnimationKind::Decay(d) => d.is_done(),
            AnimationKind::Basic(b) => b.is_done(),
            AnimationKind::Custom(c) => c.finished,
            AnimationKind::Group(g) => g.is_done(),
        }
    }

    fn reset(&mut self, all: bool) {
        match self {
            AnimationKind::Spring(s) => s.reset(all),
            AnimationKind::Decay(d) => d.values.reset(all),
            AnimationKind::Basic(b) => b.values.reset(all),
            AnimationKind::Custom(c) => c.finished = false,
            // a group resumed mid-run keeps its members going
            AnimationKind::Group(g) => {
                if all || g.is_done() {
                    g.restart();
                }
            }
        }
    }
}

/// Event fan-out for one animation: handlers, tracer and logs
pub(crate) struct Notifier {
    name: Option<String>,
    handlers: SmallVec<[EventHandler; 2]>,
    tracer: Option<AnimationTracer>,
}

impl Notifier {
    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    pub(crate) fn emit(&mut self, event: AnimationEvent, time: f64) {
        match event {
            AnimationEvent::Started => {
                tracing::debug!(animation = self.label(), time, "animation started");
                self.trace(TraceKind::DidStart, time, TracePayload::None);
            }
            AnimationEvent::Stopped { finished } => {
                tracing::debug!(animation = self.label(), time, finished, "animation stopped");
                self.trace(TraceKind::DidStop, time, TracePayload::Finished(finished));
            }
            AnimationEvent::ReachedProgress { marker } => {
                tracing::trace!(animation = self.label(), time, marker, "progress marker reached");
            }
            AnimationEvent::ReachedToValue | AnimationEvent::Applied => {}
        }

        for handler in self.handlers.iter_mut() {
            handler(&event);
        }
    }

    pub(crate) fn trace(&mut self, kind: TraceKind, time: f64, payload: TracePayload) {
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.record(kind, time, payload);
        }
    }
}

/// Outcome of rendering one frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Render {
    /// Paused or waiting for its begin time
    Idle,
    Running,
    /// Completed its last leg; `detach` when it should be removed
    Finished { detach: bool },
}

/// An animation of one property (or custom logic) on one owner
pub struct Animation {
    kind: AnimationKind,
    notifier: Notifier,

    begin_time: f64,
    start_time: Option<f64>,
    last_time: f64,

    active: bool,
    paused: bool,
    removed_on_completion: bool,

    autoreverses: bool,
    repeat_count: u32,
    repeat_forever: bool,
    legs_completed: u32,
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("name", &self.notifier.name)
            .field("kind", &self.kind)
            .field("begin_time", &self.begin_time)
            .field("start_time", &self.start_time)
            .field("active", &self.active)
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}

impl Animation {
    fn with_kind(kind: AnimationKind) -> Self {
        Self {
            kind,
            notifier: Notifier {
                name: None,
                handlers: SmallVec::new(),
                tracer: None,
            },
            begin_time: 0.0,
            start_time: None,
            last_time: 0.0,
            active: false,
            paused: true,
            removed_on_completion: true,
            autoreverses: false,
            repeat_count: 0,
            repeat_forever: false,
            legs_completed: 0,
        }
    }

    /// Spring animation with bounciness 4 and speed 12
    pub fn spring(property: AnimatableProperty) -> Self {
        Self::with_kind(AnimationKind::Spring(SpringAnimation::new(property)))
    }

    /// Decay animation with deceleration 0.998
    pub fn decay(property: AnimatableProperty) -> Self {
        Self::with_kind(AnimationKind::Decay(DecayAnimation::new(property)))
    }

    /// Basic animation lasting 0.4 seconds on the default timing curve
    pub fn basic(property: AnimatableProperty) -> Self {
        Self::with_kind(AnimationKind::Basic(BasicAnimation::new(property)))
    }

    /// Custom animation. `step` runs once per frame and returns `false` when
    /// finished.
    pub fn custom<F>(step: F) -> Self
    where
        F: FnMut(&mut dyn PropertyHost, &CustomFrame) -> bool + Send + 'static,
    {
        Self::with_kind(AnimationKind::Custom(CustomAnimation::new(Box::new(step))))
    }

    /// Empty group animation; see [`Animation::add_member`]
    pub fn group() -> Self {
        Self::with_kind(AnimationKind::Group(GroupAnimation::new()))
    }

    /// Add `animation` to this group under `key`, replacing a member with
    /// the same key. Members animate the group's owner and cannot be added
    /// while the group is running.
    pub fn add_member(&mut self, key: impl Into<String>, animation: Animation) -> Result<()> {
        let running = self.active && !self.paused;
        let kind = self.kind.name();
        match &mut self.kind {
            AnimationKind::Group(_) if running => Err(AnimationError::GroupRunning),
            AnimationKind::Group(g) => {
                g.insert(key.into(), animation);
                Ok(())
            }
            _ => Err(AnimationError::UnsupportedOperation {
                operation: "members",
                kind,
            }),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.notifier.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if let Some(tracer) = self.notifier.tracer.as_mut() {
            tracer.set_label(Some(name.clone()));
        }
        self.notifier.name = Some(name);
    }

    pub fn kind(&self) -> &AnimationKind {
        &self.kind
    }

    pub fn property(&self) -> Option<&AnimatableProperty> {
        self.kind.values().map(|v| &v.property)
    }

    // ------------------------------------------------------------------
    // Lifecycle flags
    // ------------------------------------------------------------------

    pub fn begin_time(&self) -> f64 {
        self.begin_time
    }

    /// Clock time before which the animation does not start
    pub fn set_begin_time(&mut self, begin_time: f64) {
        self.begin_time = begin_time;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume. Resuming restarts timing from the next frame while
    /// keeping the current value.
    pub fn set_paused(&mut self, paused: bool) {
        if paused != self.paused {
            self.paused = paused;
            if !paused {
                self.reset(false);
            }
            if let AnimationKind::Group(g) = &mut self.kind {
                g.set_paused(paused);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_started(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn removed_on_completion(&self) -> bool {
        self.removed_on_completion
    }

    pub fn set_removed_on_completion(&mut self, removed: bool) {
        self.removed_on_completion = removed;
    }

    pub fn autoreverses(&self) -> bool {
        self.autoreverses
    }

    /// Run every cycle forwards then backwards
    pub fn set_autoreverses(&mut self, autoreverses: bool) {
        self.autoreverses = autoreverses;
    }

    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    /// Number of cycles to run; 0 and 1 both run once
    pub fn set_repeat_count(&mut self, count: u32) {
        self.repeat_count = count;
    }

    pub fn repeat_forever(&self) -> bool {
        self.repeat_forever
    }

    pub fn set_repeat_forever(&mut self, forever: bool) {
        self.repeat_forever = forever;
    }

    fn total_legs(&self) -> u32 {
        let cycles = self.repeat_count.max(1);
        if self.autoreverses {
            cycles.saturating_mul(2)
        } else {
            cycles
        }
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    fn values_mut(&mut self, operation: &'static str) -> Result<&mut PropertyValues> {
        let kind = self.kind.name();
        self.kind
            .values_mut()
            .ok_or(AnimationError::UnsupportedOperation { operation, kind })
    }

    /// Progress in [0, 1], estimated geometrically for physics animations
    pub fn progress(&self) -> f64 {
        self.kind.values().map_or(0.0, |v| v.progress)
    }

    pub fn from_value(&self) -> Option<Vector> {
        self.kind.values().and_then(|v| v.from)
    }

    pub fn to_value(&self) -> Option<Vector> {
        self.kind.values().and_then(|v| v.to)
    }

    /// Current value, rounded when a rounding factor is set
    pub fn current_value(&self) -> Option<Vector> {
        self.kind.values().and_then(|v| v.current_value())
    }

    pub fn velocity(&self) -> Option<Vector> {
        self.kind.values().and_then(|v| v.velocity)
    }

    pub fn reached_to_value(&self) -> bool {
        self.kind.values().is_some_and(|v| v.reached_to_value())
    }

    pub fn set_from_value(&mut self, from: Vector) -> Result<()> {
        let values = self.values_mut("from value")?;
        values.property.check(&from)?;
        values.from = Some(from);
        if let AnimationKind::Decay(d) = &mut self.kind {
            d.invalidate_destination();
        }
        self.notifier
            .trace(TraceKind::FromValueUpdate, self.last_time, TracePayload::Vector(from));
        Ok(())
    }

    /// Set the target. Retargeting a running or retained animation continues
    /// from its current value and velocity.
    pub fn set_to_value(&mut self, to: Vector) -> Result<()> {
        if let AnimationKind::Decay(_) = self.kind {
            return Err(AnimationError::DerivedToValue);
        }
        let values = self.values_mut("to value")?;
        values.property.check(&to)?;
        values.to = Some(to);
        values.retarget();
        self.notifier
            .trace(TraceKind::ToValueUpdate, self.last_time, TracePayload::Vector(to));

        if self.active && self.paused {
            self.set_paused(false);
        }
        Ok(())
    }

    /// Initial velocity in units per second
    pub fn set_velocity(&mut self, velocity: Vector) -> Result<()> {
        let kind = self.kind.name();
        match &mut self.kind {
            AnimationKind::Spring(s) => {
                s.values.property.check(&velocity)?;
                s.values.velocity = Some(velocity);
                s.values.configured_velocity = Some(velocity);
            }
            AnimationKind::Decay(d) => {
                d.values.property.check(&velocity)?;
                d.set_velocity(velocity);
            }
            AnimationKind::Basic(_) | AnimationKind::Custom(_) | AnimationKind::Group(_) => {
                return Err(AnimationError::UnsupportedOperation {
                    operation: "velocity",
                    kind,
                });
            }
        }
        self.notifier
            .trace(TraceKind::VelocityUpdate, self.last_time, TracePayload::Vector(velocity));
        Ok(())
    }

    /// Round written values to multiples of `factor`, so 1.0 animates between
    /// whole numbers; 0 disables rounding
    pub fn set_rounding_factor(&mut self, factor: f64) -> Result<()> {
        if !(factor.is_finite() && factor >= 0.0) {
            return Err(AnimationError::InvalidParameter {
                name: "rounding factor",
                value: factor,
            });
        }
        self.values_mut("rounding")?.rounding_factor = factor;
        Ok(())
    }

    pub fn set_clamp(&mut self, clamp: Clamp) -> Result<()> {
        self.values_mut("clamping")?.clamp = clamp;
        Ok(())
    }

    /// Apply the change between samples on top of the live value instead of
    /// writing absolute values
    pub fn set_additive(&mut self, additive: bool) -> Result<()> {
        self.values_mut("additive")?.additive = additive;
        Ok(())
    }

    pub fn progress_markers(&self) -> &[f64] {
        self.kind.values().map_or(&[], |v| v.markers())
    }

    /// Progress fractions, ascending in [0, 1], that each fire a
    /// [`AnimationEvent::ReachedProgress`] once per run
    pub fn set_progress_markers(&mut self, markers: &[f64]) -> Result<()> {
        self.values_mut("progress markers")?.set_markers(markers)
    }

    // ------------------------------------------------------------------
    // Kind parameters
    // ------------------------------------------------------------------

    fn spring_mut(&mut self, operation: &'static str) -> Result<&mut SpringAnimation> {
        let kind = self.kind.name();
        match &mut self.kind {
            AnimationKind::Spring(s) => Ok(s),
            _ => Err(AnimationError::UnsupportedOperation { operation, kind }),
        }
    }

    pub fn set_bounciness(&mut self, bounciness: f64) -> Result<()> {
        check_finite("bounciness", bounciness)?;
        let spring = self.spring_mut("bounciness")?;
        let speed = spring.speed();
        spring.set_bounciness_speed(bounciness, speed);
        self.notifier
            .trace(TraceKind::BouncinessUpdate, self.last_time, TracePayload::Scalar(bounciness));
        Ok(())
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<()> {
        check_finite("speed", speed)?;
        let spring = self.spring_mut("speed")?;
        let bounciness = spring.bounciness();
        spring.set_bounciness_speed(bounciness, speed);
        self.notifier
            .trace(TraceKind::SpeedUpdate, self.last_time, TracePayload::Scalar(speed));
        Ok(())
    }

    pub fn set_tension(&mut self, tension: f64) -> Result<()> {
        let spring = self.spring_mut("tension")?;
        let config = SpringConfig {
            tension,
            ..spring.config()
        };
        spring.set_config(config)?;
        self.notifier
            .trace(TraceKind::TensionUpdate, self.last_time, TracePayload::Scalar(tension));
        Ok(())
    }

    pub fn set_friction(&mut self, friction: f64) -> Result<()> {
        let spring = self.spring_mut("friction")?;
        let config = SpringConfig {
            friction,
            ..spring.config()
        };
        spring.set_config(config)?;
        self.notifier
            .trace(TraceKind::FrictionUpdate, self.last_time, TracePayload::Scalar(friction));
        Ok(())
    }

    pub fn set_mass(&mut self, mass: f64) -> Result<()> {
        let spring = self.spring_mut("mass")?;
        let config = SpringConfig {
            mass,
            ..spring.config()
        };
        spring.set_config(config)?;
        self.notifier
            .trace(TraceKind::MassUpdate, self.last_time, TracePayload::Scalar(mass));
        Ok(())
    }

    /// Set tension, friction and mass together
    pub fn set_spring_config(&mut self, config: SpringConfig) -> Result<()> {
        self.spring_mut("spring config")?.set_config(config)
    }

    pub fn set_deceleration(&mut self, deceleration: f64) -> Result<()> {
        let kind = self.kind.name();
        match &mut self.kind {
            AnimationKind::Decay(d) => d.set_deceleration(deceleration),
            _ => Err(AnimationError::UnsupportedOperation {
                operation: "deceleration",
                kind,
            }),
        }
    }

    fn basic_mut(&mut self, operation: &'static str) -> Result<&mut BasicAnimation> {
        let kind = self.kind.name();
        match &mut self.kind {
            AnimationKind::Basic(b) => Ok(b),
            _ => Err(AnimationError::UnsupportedOperation { operation, kind }),
        }
    }

    /// Duration in seconds: configured for basic animations, derived for decay
    pub fn duration(&self) -> Option<f64> {
        match &self.kind {
            AnimationKind::Basic(b) => Some(b.duration()),
            AnimationKind::Decay(d) => Some(d.duration()),
            _ => None,
        }
    }

    pub fn set_duration(&mut self, duration: f64) -> Result<()> {
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(AnimationError::InvalidParameter {
                name: "duration",
                value: duration,
            });
        }
        self.basic_mut("duration")?.duration = duration;
        Ok(())
    }

    pub fn set_easing(&mut self, easing: Easing) -> Result<()> {
        easing.validate()?;
        self.basic_mut("easing")?.timing = Timing::Curve(easing);
        Ok(())
    }

    /// Use an easing function of normalized time in place of a timing curve
    pub fn set_easing_fn<F>(&mut self, easing: F) -> Result<()>
    where
        F: Fn(f64) -> f64 + Send + 'static,
    {
        self.basic_mut("easing function")?.timing = Timing::Function(Box::new(easing));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Register a handler for this animation's lifecycle events
    pub fn on_event<F>(&mut self, handler: F)
    where
        F: FnMut(&AnimationEvent) + Send + 'static,
    {
        self.notifier.handlers.push(Box::new(handler));
    }

    pub fn tracer(&self) -> Option<&AnimationTracer> {
        self.notifier.tracer.as_ref()
    }

    /// The animation's tracer, created on first use. Call
    /// [`AnimationTracer::start`] to begin recording.
    pub fn tracer_mut(&mut self) -> &mut AnimationTracer {
        let label = self.notifier.name.clone();
        self.notifier.tracer.get_or_insert_with(|| {
            let mut tracer = AnimationTracer::new();
            tracer.set_label(label);
            tracer
        })
    }

    // ------------------------------------------------------------------
    // Frame processing
    // ------------------------------------------------------------------

    /// Prepare for a run after being added to a scheduler
    pub(crate) fn attach(&mut self, begin_time: Option<f64>) {
        self.reset(true);
        self.paused = false;
        if let Some(begin_time) = begin_time {
            if self.begin_time == 0.0 {
                self.begin_time = begin_time;
            }
        }
        self.notifier.trace(TraceKind::DidAdd, self.last_time, TracePayload::None);
    }

    fn reset(&mut self, all: bool) {
        self.start_time = None;
        self.last_time = 0.0;
        self.legs_completed = 0;
        self.kind.reset(all);
    }

    /// Advance to `time` and write the result to the host
    pub(crate) fn render(&mut self, owner: OwnerId, time: f64, host: &mut dyn PropertyHost) -> Render {
        if self.paused {
            return Render::Idle;
        }

        self.start_if_needed(owner, time, host);
        if !self.active || self.paused {
            return Render::Idle;
        }

        if let Some(values) = self.kind.values() {
            if !values.has_values() {
                tracing::warn!(
                    animation = self.notifier.label(),
                    property = values.property.name(),
                    "animation has no values to run with"
                );
                let detach = self.removed_on_completion;
                self.stop(detach, true);
                return Render::Finished { detach };
            }
        }

        if self.advance_time(owner, time, host) {
            self.apply(owner, time, host);
        }

        if self.kind.is_done() {
            if let Some(detach) = self.complete(owner, time, host) {
                return Render::Finished { detach };
            }
        }
        Render::Running
    }

    /// Start once the begin time has passed, and make sure values exist
    /// before every running frame
    fn start_if_needed(&mut self, owner: OwnerId, time: f64, host: &dyn PropertyHost) -> bool {
        let mut started = false;

        if self.start_time.is_none() && time >= self.begin_time {
            self.active = true;
            self.set_paused(false);
            self.start_time = Some(time);
            self.last_time = time;
            started = true;
        }

        if self.active && !self.paused {
            self.will_run(started, owner, time, host);
        }

        if started {
            self.notifier.emit(AnimationEvent::Started, time);
        }
        started
    }

    fn will_run(&mut self, started: bool, owner: OwnerId, time: f64, host: &dyn PropertyHost) {
        let notifier = &mut self.notifier;
        let values = match &mut self.kind {
            AnimationKind::Custom(_) | AnimationKind::Group(_) => return,
            AnimationKind::Decay(d) => {
                PropertyValues::read_missing(&d.values.property, &mut d.values.from, owner, host, notifier, time);
                if d.values.to.is_none() {
                    if let Err(err) = d.compute_destination() {
                        tracing::warn!(%err, "cannot derive decay destination");
                    }
                }
                &mut d.values
            }
            AnimationKind::Spring(s) => {
                read_from_and_to(&mut s.values, owner, host, notifier, time);
                s.ensure_solver();
                &mut s.values
            }
            AnimationKind::Basic(b) => {
                read_from_and_to(&mut b.values, owner, host, notifier, time);
                &mut b.values
            }
        };

        if started {
            if values.current.is_none() {
                values.current = values.from;
            }
            if values.velocity.is_none() {
                values.velocity = values.zero().ok();
            }
        }

        values.compute_distance();
    }

    fn advance_time(&mut self, owner: OwnerId, time: f64, host: &mut dyn PropertyHost) -> bool {
        let dt = time - self.last_time;
        let local_time = time - self.start_time.unwrap_or(time);

        let advanced = match &mut self.kind {
            AnimationKind::Spring(s) => {
                let advanced = s.advance(dt);
                if advanced {
                    s.values.compute_progress();
                }
                advanced
            }
            AnimationKind::Decay(d) => {
                let advanced = d.advance(dt);
                if advanced {
                    d.values.compute_progress();
                }
                advanced
            }
            AnimationKind::Basic(b) => b.advance(local_time),
            AnimationKind::Custom(c) => {
                let frame = CustomFrame {
                    owner,
                    current_time: time,
                    elapsed_time: dt,
                };
                c.advance(host, &frame)
            }
            AnimationKind::Group(g) => g.advance(owner, time, host),
        };

        if advanced {
            if let Some(values) = self.kind.values_mut() {
                values.delegate_progress(&mut self.notifier, time);
            }
            self.last_time = time;
        }
        advanced
    }

    /// Write the current value to the host
    fn apply(&mut self, owner: OwnerId, time: f64, host: &mut dyn PropertyHost) {
        let Some(values) = self.kind.values_mut() else {
            self.notifier.emit(AnimationEvent::Applied, time);
            return;
        };
        let Some(value) = values.current_value() else {
            return;
        };

        let live = if values.additive {
            host.read(owner, &values.property)
        } else {
            None
        };
        let out = values.take_sample(value, live);
        host.write(owner, &values.property, &out);
        tracing::trace!(property = values.property.name(), value = %out, time, "applied");

        self.notifier
            .trace(TraceKind::PropertyWrite, time, TracePayload::Vector(out));
        self.notifier.emit(AnimationEvent::Applied, time);
    }

    /// Snap to the to-value and write it unless the host already holds it
    fn apply_to_value(&mut self, owner: OwnerId, time: f64, host: &mut dyn PropertyHost) {
        let Some(values) = self.kind.values_mut() else {
            return;
        };
        let Some(to) = values.to else {
            return;
        };

        values.progress = 1.0;
        values.current = Some(to);
        values.clamp_current(values.clamp);
        values.delegate_progress(&mut self.notifier, time);

        let Some(value) = values.current_value() else {
            return;
        };
        let live = host.read(owner, &values.property);
        let out = values.take_sample(value, if values.additive { live } else { None });

        if live != Some(out) {
            host.write(owner, &values.property, &out);
            self.notifier
                .trace(TraceKind::PropertyWrite, time, TracePayload::Vector(out));
        }
        self.notifier.emit(AnimationEvent::Applied, time);
    }

    /// Finish the current leg. Returns `None` when another leg started,
    /// otherwise whether the animation should be detached.
    fn complete(&mut self, owner: OwnerId, time: f64, host: &mut dyn PropertyHost) -> Option<bool> {
        self.apply_to_value(owner, time, host);
        self.legs_completed = self.legs_completed.saturating_add(1);

        if self.repeat_forever || self.legs_completed < self.total_legs() {
            self.notifier
                .emit(AnimationEvent::Stopped { finished: true }, time);
            match self.prepare_next_leg(time) {
                Ok(()) => {
                    self.start_if_needed(owner, time, host);
                    return None;
                }
                Err(err) => {
                    tracing::warn!(%err, "cannot start the next leg");
                }
            }
        }

        let detach = self.removed_on_completion;
        self.stop(detach, true);
        Some(detach)
    }

    fn prepare_next_leg(&mut self, time: f64) -> Result<()> {
        let reverse = self.autoreverses;
        match &mut self.kind {
            AnimationKind::Spring(s) => {
                if reverse {
                    std::mem::swap(&mut s.values.from, &mut s.values.to);
                    s.reverse_velocity();
                } else {
                    s.restore_velocity()?;
                }
            }
            AnimationKind::Basic(b) => {
                if reverse {
                    std::mem::swap(&mut b.values.from, &mut b.values.to);
                }
            }
            AnimationKind::Decay(d) => {
                if reverse {
                    d.reverse()?;
                } else {
                    d.restore_velocity()?;
                }
            }
            AnimationKind::Group(g) => g.restart(),
            AnimationKind::Custom(_) => {}
        }

        let legs = self.legs_completed;
        self.reset(false);
        self.legs_completed = legs;

        if let Some(values) = self.kind.values_mut() {
            values.current = values.from;
        }

        if reverse {
            tracing::debug!(animation = self.notifier.label(), time, "animation autoreversed");
            self.notifier
                .trace(TraceKind::Autoreversed, time, TracePayload::None);
        }
        Ok(())
    }

    /// Stop the animation. `removing` deactivates it; `done` reports whether
    /// it ran to completion.
    pub(crate) fn stop(&mut self, removing: bool, done: bool) {
        let time = self.last_time;
        if self.active {
            if done {
                if let Some(values) = self.kind.values_mut() {
                    values.delegate_progress(&mut self.notifier, time);
                }
            }
            if removing {
                self.active = false;
            }
            self.notifier
                .emit(AnimationEvent::Stopped { finished: done }, time);
        } else if self.start_time.is_none() {
            // stopped before it ever started
            self.notifier.emit(AnimationEvent::Started, time);
            self.notifier
                .emit(AnimationEvent::Stopped { finished: false }, time);
        }
        if let AnimationKind::Group(g) = &mut self.kind {
            g.stop_members();
        }
        self.set_paused(true);
    }
}

fn read_from_and_to(
    values: &mut PropertyValues,
    owner: OwnerId,
    host: &dyn PropertyHost,
    notifier: &mut Notifier,
    time: f64,
) {
    PropertyValues::read_missing(&values.property, &mut values.from, owner, host, notifier, time);
    PropertyValues::read_missing(&values.property, &mut values.to, owner, host, notifier, time);
}

fn check_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AnimationError::InvalidParameter { name, value })
    }
}
