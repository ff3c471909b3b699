//! Recoil Animation Engine
//!
//! Physics and timed animations of host object properties, driven one frame
//! at a time by an external clock.
//!
//! # Features
//!
//! - **Spring Physics**: RK4-integrated damped springs configured by
//!   tension, friction and mass or by bounciness and speed
//! - **Decay**: velocity-driven deceleration with a derived resting value
//! - **Basic Animations**: fixed-duration interpolation on cubic Bezier
//!   timing curves or custom easing functions
//! - **Custom Animations**: caller-supplied per-frame steps
//! - **Groups**: several animations run and finish as one unit
//! - **Retargeting**: changing the target of a running spring keeps its
//!   velocity
//! - **Tracing**: per-animation event recording for debugging
//!
//! # Example
//!
//! ```rust
//! use recoil_animation::{Animation, AnimationScheduler};
//! use recoil_core::{AnimatableProperty, MemoryHost, OwnerId, ValueType, Vector};
//!
//! let alpha = AnimatableProperty::new("alpha", ValueType::Float).unwrap();
//! let mut anim = Animation::basic(alpha);
//! anim.set_from_value(Vector::from(0.0)).unwrap();
//! anim.set_to_value(Vector::from(1.0)).unwrap();
//!
//! let mut host = MemoryHost::new();
//! let mut scheduler = AnimationScheduler::new();
//! scheduler.add_animation(OwnerId(1), "fade", anim);
//!
//! scheduler.render_time(0.0, &mut host);
//! scheduler.render_time(1.0, &mut host);
//! assert_eq!(host.get(OwnerId(1), "alpha"), Some(Vector::from(1.0)));
//! assert!(scheduler.is_empty());
//! ```

pub mod animation;
pub mod config;
pub mod decay;
pub mod easing;
pub mod scheduler;
pub mod spring;
pub mod tracer;

pub use animation::{Animation, AnimationKind, Clamp, CustomFrame, GroupAnimation};
pub use config::{ConfigError, EngineConfig};
pub use easing::Easing;
pub use scheduler::{AnimationId, AnimationScheduler};
pub use spring::{SpringConfig, SpringSolver, SpringState};
pub use tracer::{AnimationTracer, TraceEvent, TraceKind, TracePayload};

pub use recoil_core;
