//! Engine configuration (recoil.toml)
//!
//! Default parameters for animations built through [`EngineConfig`]. Every
//! field is optional in the file.

use std::fs;
use std::path::Path;

use recoil_core::{AnimatableProperty, AnimationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::Animation;
use crate::decay;
use crate::easing::Easing;
use crate::spring::{DEFAULT_BOUNCINESS, DEFAULT_SPEED};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] AnimationError),
}

/// Top-level engine configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub spring: SpringDefaults,
    #[serde(default)]
    pub basic: BasicDefaults,
    #[serde(default)]
    pub decay: DecayDefaults,
    /// Dynamics threshold for properties created from the configuration
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    recoil_core::DEFAULT_THRESHOLD
}

/// Spring animation defaults
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SpringDefaults {
    #[serde(default = "default_bounciness")]
    pub bounciness: f64,
    #[serde(default = "default_speed")]
    pub speed: f64,
}

impl Default for SpringDefaults {
    fn default() -> Self {
        Self {
            bounciness: default_bounciness(),
            speed: default_speed(),
        }
    }
}

fn default_bounciness() -> f64 {
    DEFAULT_BOUNCINESS
}

fn default_speed() -> f64 {
    DEFAULT_SPEED
}

/// Basic animation defaults
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BasicDefaults {
    /// Duration in seconds
    #[serde(default = "default_duration")]
    pub duration: f64,
    #[serde(default)]
    pub easing: Easing,
}

impl Default for BasicDefaults {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            easing: Easing::default(),
        }
    }
}

fn default_duration() -> f64 {
    crate::animation::DEFAULT_DURATION
}

/// Decay animation defaults
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DecayDefaults {
    #[serde(default = "default_deceleration")]
    pub deceleration: f64,
}

impl Default for DecayDefaults {
    fn default() -> Self {
        Self {
            deceleration: default_deceleration(),
        }
    }
}

fn default_deceleration() -> f64 {
    decay::DEFAULT_DECELERATION
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            spring: SpringDefaults::default(),
            basic: BasicDefaults::default(),
            decay: DecayDefaults::default(),
            threshold: default_threshold(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), AnimationError> {
        for (name, value) in [
            ("bounciness", self.spring.bounciness),
            ("speed", self.spring.speed),
        ] {
            if !value.is_finite() {
                return Err(AnimationError::InvalidParameter { name, value });
            }
        }
        if !(self.basic.duration.is_finite() && self.basic.duration >= 0.0) {
            return Err(AnimationError::InvalidParameter {
                name: "duration",
                value: self.basic.duration,
            });
        }
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(AnimationError::InvalidParameter {
                name: "threshold",
                value: self.threshold,
            });
        }
        self.basic.easing.validate()?;
        decay::validate_deceleration(self.decay.deceleration)?;
        Ok(())
    }

    fn property(&self, property: AnimatableProperty) -> Result<AnimatableProperty, AnimationError> {
        property.with_threshold(self.threshold)
    }

    /// Spring animation with the configured bounciness and speed
    pub fn spring(&self, property: AnimatableProperty) -> Result<Animation, AnimationError> {
        let mut anim = Animation::spring(self.property(property)?);
        anim.set_bounciness(self.spring.bounciness)?;
        anim.set_speed(self.spring.speed)?;
        Ok(anim)
    }

    /// Basic animation with the configured duration and timing curve
    pub fn basic(&self, property: AnimatableProperty) -> Result<Animation, AnimationError> {
        let mut anim = Animation::basic(self.property(property)?);
        anim.set_duration(self.basic.duration)?;
        anim.set_easing(self.basic.easing)?;
        Ok(anim)
    }

    /// Decay animation with the configured deceleration
    pub fn decay(&self, property: AnimatableProperty) -> Result<Animation, AnimationError> {
        let mut anim = Animation::decay(self.property(property)?);
        anim.set_deceleration(self.decay.deceleration)?;
        Ok(anim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use recoil_core::ValueType;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.spring.bounciness, 4.0);
        assert_eq!(config.spring.speed, 12.0);
        assert_eq!(config.basic.duration, 0.4);
        assert_eq!(config.basic.easing, Easing::Default);
        assert_eq!(config.decay.deceleration, 0.998);
        assert_eq!(config.threshold, 0.01);
    }

    #[test]
    fn test_partial_sections() {
        let config = EngineConfig::from_toml_str(
            r#"
            threshold = 0.5

            [spring]
            bounciness = 10.0

            [basic]
            easing = { cubic_bezier = [0.1, 0.2, 0.3, 0.4] }
            "#,
        )
        .unwrap();
        assert_eq!(config.spring.bounciness, 10.0);
        assert_eq!(config.spring.speed, 12.0);
        assert_eq!(config.basic.easing, Easing::CubicBezier(0.1, 0.2, 0.3, 0.4));
        assert_eq!(config.threshold, 0.5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_toml_str("[decay]\ndeceleration = 1.5").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(AnimationError::InvalidDeceleration(_))
        ));

        let err = EngineConfig::from_toml_str("threshold = 'high'").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load("/nonexistent/recoil.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_factories_carry_defaults() {
        let config = EngineConfig::from_toml_str("threshold = 0.1\n[basic]\nduration = 2.0").unwrap();
        let prop = AnimatableProperty::new("x", ValueType::Float).unwrap();

        let basic = config.basic(prop.clone()).unwrap();
        assert_eq!(basic.duration(), Some(2.0));
        assert_eq!(basic.property().map(|p| p.threshold()), Some(0.1));

        let decay = config.decay(prop.clone()).unwrap();
        assert_eq!(decay.kind().name(), "decay");

        let spring = config.spring(prop).unwrap();
        assert_eq!(spring.kind().name(), "spring");
    }
}
