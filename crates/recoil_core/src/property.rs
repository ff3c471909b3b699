//! Animatable properties and the host binding boundary
//!
//! The engine never touches host objects directly. A [`PropertyHost`] reads
//! and writes vectors for an (owner, property) pair; the engine only computes
//! values.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{AnimationError, Result};
use crate::vector::{Vector, MAX_COMPONENTS};

/// Default dynamics threshold used by properties that do not specify one
pub const DEFAULT_THRESHOLD: f64 = 0.01;

/// Identity of an object that animations are attached to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(pub u64);

/// The declared type of an animatable value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Float,
    Integer,
    Point,
    Size,
    Range,
    Vector3,
    Rect,
    EdgeInsets,
    Color,
    Vector4,
    /// Any other value carried as `n` components
    Custom(usize),
}

impl ValueType {
    /// Number of vector components carrying this type
    pub fn cardinality(&self) -> usize {
        match self {
            ValueType::Float | ValueType::Integer => 1,
            ValueType::Point | ValueType::Size | ValueType::Range => 2,
            ValueType::Vector3 => 3,
            ValueType::Rect | ValueType::EdgeInsets | ValueType::Color | ValueType::Vector4 => 4,
            ValueType::Custom(n) => *n,
        }
    }

    fn validate(&self) -> Result<()> {
        let n = self.cardinality();
        if n == 0 || n > MAX_COMPONENTS {
            return Err(AnimationError::UnsupportedCardinality(n));
        }
        Ok(())
    }
}

/// Describes an animatable property of a host object
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnimatableProperty {
    name: String,
    value_type: ValueType,
    threshold: f64,
}

impl AnimatableProperty {
    /// Create a property descriptor. Fails for value types that cannot be
    /// carried in 1 to 4 components.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Result<Self> {
        value_type.validate()?;
        Ok(Self {
            name: name.into(),
            value_type,
            threshold: DEFAULT_THRESHOLD,
        })
    }

    /// Set the dynamics threshold used to decide when simulations settle
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self> {
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(AnimationError::InvalidParameter {
                name: "threshold",
                value: threshold,
            });
        }
        self.threshold = threshold;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn cardinality(&self) -> usize {
        self.value_type.cardinality()
    }

    /// Check that `value` has this property's cardinality
    pub fn check(&self, value: &Vector) -> Result<()> {
        if value.len() != self.cardinality() {
            return Err(AnimationError::CardinalityMismatch {
                expected: self.cardinality(),
                found: value.len(),
            });
        }
        Ok(())
    }
}

/// Reads and writes property values on host objects.
///
/// Implementations own the mapping from owners to real objects and perform
/// their own liveness checks.
pub trait PropertyHost {
    /// Current value of `property` on `owner`, or `None` if it cannot be read
    fn read(&self, owner: OwnerId, property: &AnimatableProperty) -> Option<Vector>;

    /// Apply an animated value to `property` on `owner`
    fn write(&mut self, owner: OwnerId, property: &AnimatableProperty, value: &Vector);

    /// Whether `owner` still exists. Animations of dead owners are detached.
    fn is_alive(&self, _owner: OwnerId) -> bool {
        true
    }
}

/// A [`PropertyHost`] that keeps values in memory.
///
/// Used by headless simulation and tests.
#[derive(Debug, Default)]
pub struct MemoryHost {
    values: FxHashMap<(OwnerId, String), Vector>,
    dead: Vec<OwnerId>,
    writes: usize,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or overwrite a stored value
    pub fn set(&mut self, owner: OwnerId, name: impl Into<String>, value: Vector) {
        self.values.insert((owner, name.into()), value);
    }

    pub fn get(&self, owner: OwnerId, name: &str) -> Option<Vector> {
        self.values.get(&(owner, name.to_string())).copied()
    }

    /// Forget an owner; subsequent liveness checks report it as dead
    pub fn remove_owner(&mut self, owner: OwnerId) {
        self.values.retain(|(o, _), _| *o != owner);
        if !self.dead.contains(&owner) {
            self.dead.push(owner);
        }
    }

    /// Total number of writes applied
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl PropertyHost for MemoryHost {
    fn read(&self, owner: OwnerId, property: &AnimatableProperty) -> Option<Vector> {
        self.get(owner, property.name())
    }

    fn write(&mut self, owner: OwnerId, property: &AnimatableProperty, value: &Vector) {
        self.writes += 1;
        self.values
            .insert((owner, property.name().to_string()), *value);
    }

    fn is_alive(&self, owner: OwnerId) -> bool {
        !self.dead.contains(&owner)
    }
}
