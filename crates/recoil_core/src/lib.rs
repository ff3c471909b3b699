//! Recoil Core
//!
//! Foundational types shared by the Recoil animation engine:
//!
//! - **Vectors**: fixed-cardinality values of 1 to 4 components
//! - **Properties**: value types, animatable property descriptors and the
//!   [`PropertyHost`] boundary that reads and writes host objects
//! - **Events**: lifecycle notifications emitted by animations
//!
//! # Example
//!
//! ```rust
//! use recoil_core::{AnimatableProperty, MemoryHost, OwnerId, PropertyHost, ValueType, Vector};
//!
//! let position = AnimatableProperty::new("position", ValueType::Point).unwrap();
//! let mut host = MemoryHost::new();
//!
//! host.write(OwnerId(1), &position, &Vector::from([10.0, 20.0]));
//! assert_eq!(host.read(OwnerId(1), &position), Some(Vector::from([10.0, 20.0])));
//! ```

pub mod error;
pub mod events;
pub mod property;
pub mod vector;

pub use error::{AnimationError, Result};
pub use events::{AnimationEvent, EventHandler};
pub use property::{
    AnimatableProperty, MemoryHost, OwnerId, PropertyHost, ValueType, DEFAULT_THRESHOLD,
};
pub use vector::{Vector, MAX_COMPONENTS};
