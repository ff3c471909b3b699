//! Animation configuration errors

use thiserror::Error;

/// Errors raised while configuring an animation or binding a property.
///
/// These are precondition failures: they are reported when a value is set,
/// never while an animation is being advanced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// A vector or value type with a component count outside 1..=4
    #[error("unsupported value cardinality {0}: expected 1 to 4 components")]
    UnsupportedCardinality(usize),

    /// A value whose component count does not match the bound property
    #[error("value has {found} components but property expects {expected}")]
    CardinalityMismatch { expected: usize, found: usize },

    /// A timing curve control point outside [0, 1]
    #[error("timing curve control point {index} out of range [0, 1]: {value}")]
    InvalidControlPoint { index: usize, value: f64 },

    /// Progress markers must be ascending fractions in [0, 1]
    #[error("progress markers must be ascending fractions in [0, 1]: {0:?}")]
    InvalidProgressMarkers(Vec<f64>),

    /// Deceleration must lie strictly between 0 and 1
    #[error("deceleration must be in (0, 1): {0}")]
    InvalidDeceleration(f64),

    /// Tension, friction, mass or duration that is negative, zero or not finite
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// The to-value of a decay animation is derived from velocity and deceleration
    #[error("the to-value of a decay animation is derived and cannot be set")]
    DerivedToValue,

    /// Members can only be added to a group that is not running
    #[error("cannot add members to a running group animation")]
    GroupRunning,

    /// The operation does not apply to this kind of animation
    #[error("{operation} is not supported by {kind} animations")]
    UnsupportedOperation {
        operation: &'static str,
        kind: &'static str,
    },
}

/// Result type for animation configuration
pub type Result<T> = std::result::Result<T, AnimationError>;
