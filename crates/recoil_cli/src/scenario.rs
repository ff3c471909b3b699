//! Scenario files
//!
//! A scenario lists animations to run headlessly, optionally overriding the
//! engine defaults:
//!
//! ```toml
//! [engine.spring]
//! bounciness = 8.0
//!
//! [[animation]]
//! key = "slide"
//! kind = "spring"
//! type = "point"
//! from = [0.0, 0.0]
//! to = [100.0, 40.0]
//! ```

use anyhow::{bail, Context, Result};
use recoil_animation::{Animation, Clamp, Easing, EngineConfig, SpringConfig};
use recoil_core::{AnimatableProperty, OwnerId, ValueType, Vector};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level scenario file
#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default, rename = "animation")]
    pub animations: Vec<AnimationSpec>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindSpec {
    Spring,
    Decay,
    Basic,
}

/// One animation of a scenario
#[derive(Debug, Deserialize)]
pub struct AnimationSpec {
    /// Key the animation is added under
    pub key: String,
    #[serde(default = "default_owner")]
    pub owner: u64,
    /// Animated property name; defaults to the key
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default = "default_value_type", rename = "type")]
    pub value_type: ValueType,
    pub kind: KindSpec,

    /// Value seeded into the host before the first frame
    #[serde(default)]
    pub initial: Option<Vec<f64>>,
    #[serde(default)]
    pub from: Option<Vec<f64>>,
    #[serde(default)]
    pub to: Option<Vec<f64>>,
    #[serde(default)]
    pub velocity: Option<Vec<f64>>,

    // Spring
    #[serde(default)]
    pub bounciness: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub tension: Option<f64>,
    #[serde(default)]
    pub friction: Option<f64>,
    #[serde(default)]
    pub mass: Option<f64>,

    // Basic
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub easing: Option<Easing>,

    // Decay
    #[serde(default)]
    pub deceleration: Option<f64>,

    #[serde(default)]
    pub begin_time: Option<f64>,
    #[serde(default)]
    pub repeat_count: u32,
    #[serde(default)]
    pub repeat_forever: bool,
    #[serde(default)]
    pub autoreverses: bool,
    #[serde(default)]
    pub markers: Vec<f64>,
    #[serde(default)]
    pub rounding_factor: Option<f64>,
    #[serde(default)]
    pub clamp: Option<Clamp>,
    #[serde(default)]
    pub additive: bool,
}

fn default_owner() -> u64 {
    1
}

fn default_value_type() -> ValueType {
    ValueType::Float
}

fn vector(name: &str, values: &[f64]) -> Result<Vector> {
    Vector::from_slice(values).with_context(|| format!("invalid {name} value {values:?}"))
}

impl Scenario {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(text).context("failed to parse scenario")?;
        scenario.engine.validate().context("invalid engine settings")?;
        if scenario.animations.is_empty() {
            bail!("scenario has no [[animation]] entries");
        }
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }
}

impl AnimationSpec {
    pub fn owner(&self) -> OwnerId {
        OwnerId(self.owner)
    }

    pub fn property_name(&self) -> &str {
        self.property.as_deref().unwrap_or(&self.key)
    }

    pub fn property(&self) -> Result<AnimatableProperty> {
        AnimatableProperty::new(self.property_name(), self.value_type)
            .with_context(|| format!("animation `{}`", self.key))
    }

    pub fn initial_value(&self) -> Result<Option<Vector>> {
        self.initial
            .as_deref()
            .map(|values| vector("initial", values))
            .transpose()
    }

    /// Build the animation on top of the engine defaults
    pub fn build(&self, engine: &EngineConfig) -> Result<Animation> {
        self.build_inner(engine)
            .with_context(|| format!("animation `{}`", self.key))
    }

    fn build_inner(&self, engine: &EngineConfig) -> Result<Animation> {
        let property = self.property()?;
        let mut anim = match self.kind {
            KindSpec::Spring => engine.spring(property)?,
            KindSpec::Decay => engine.decay(property)?,
            KindSpec::Basic => engine.basic(property)?,
        };
        anim.set_name(self.key.clone());

        if let Some(from) = &self.from {
            anim.set_from_value(vector("from", from)?)?;
        }
        if let Some(to) = &self.to {
            anim.set_to_value(vector("to", to)?)?;
        }
        if let Some(velocity) = &self.velocity {
            anim.set_velocity(vector("velocity", velocity)?)?;
        }

        if let Some(bounciness) = self.bounciness {
            anim.set_bounciness(bounciness)?;
        }
        if let Some(speed) = self.speed {
            anim.set_speed(speed)?;
        }
        if self.tension.is_some() || self.friction.is_some() || self.mass.is_some() {
            let base = engine_spring(engine);
            let config = SpringConfig::new(
                self.tension.unwrap_or(base.tension),
                self.friction.unwrap_or(base.friction),
                self.mass.unwrap_or(base.mass),
            )?;
            anim.set_spring_config(config)?;
        }

        if let Some(duration) = self.duration {
            anim.set_duration(duration)?;
        }
        if let Some(easing) = self.easing {
            anim.set_easing(easing)?;
        }
        if let Some(deceleration) = self.deceleration {
            anim.set_deceleration(deceleration)?;
        }

        if let Some(begin_time) = self.begin_time {
            anim.set_begin_time(begin_time);
        }
        anim.set_repeat_count(self.repeat_count);
        anim.set_repeat_forever(self.repeat_forever);
        anim.set_autoreverses(self.autoreverses);
        if !self.markers.is_empty() {
            anim.set_progress_markers(&self.markers)?;
        }
        if let Some(factor) = self.rounding_factor {
            anim.set_rounding_factor(factor)?;
        }
        if let Some(clamp) = self.clamp {
            anim.set_clamp(clamp)?;
        }
        if self.additive {
            anim.set_additive(true)?;
        }
        Ok(anim)
    }
}

fn engine_spring(engine: &EngineConfig) -> SpringConfig {
    SpringConfig::from_bounciness_speed(engine.spring.bounciness, engine.spring.speed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCENARIO: &str = r#"
        [engine]
        threshold = 0.1

        [[animation]]
        key = "slide"
        kind = "spring"
        type = "point"
        from = [0.0, 0.0]
        to = [100.0, 40.0]
        tension = 300.0

        [[animation]]
        key = "fade"
        owner = 2
        property = "alpha"
        kind = "basic"
        to = [1.0]
        duration = 0.5
        easing = "ease_in_out"
        markers = [0.5]
    "#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_toml_str(SCENARIO).unwrap();
        assert_eq!(scenario.engine.threshold, 0.1);
        assert_eq!(scenario.animations.len(), 2);

        let slide = &scenario.animations[0];
        assert_eq!(slide.kind, KindSpec::Spring);
        assert_eq!(slide.value_type, ValueType::Point);
        assert_eq!(slide.property_name(), "slide");
        assert_eq!(slide.owner(), OwnerId(1));

        let fade = &scenario.animations[1];
        assert_eq!(fade.property_name(), "alpha");
        assert_eq!(fade.easing, Some(Easing::EaseInOut));
    }

    #[test]
    fn test_build_applies_overrides() {
        let scenario = Scenario::from_toml_str(SCENARIO).unwrap();
        let slide = scenario.animations[0].build(&scenario.engine).unwrap();
        assert_eq!(slide.name(), Some("slide"));
        assert_eq!(slide.to_value(), Some(Vector::from([100.0, 40.0])));
        assert_eq!(slide.property().map(|p| p.threshold()), Some(0.1));

        let fade = scenario.animations[1].build(&scenario.engine).unwrap();
        assert_eq!(fade.duration(), Some(0.5));
        assert_eq!(fade.progress_markers(), &[0.5]);
    }

    #[test]
    fn test_cardinality_mismatch_names_animation() {
        let err = Scenario::from_toml_str(
            r#"
            [[animation]]
            key = "bad"
            kind = "basic"
            to = [1.0, 2.0]
            "#,
        )
        .and_then(|s| s.animations[0].build(&s.engine))
        .unwrap_err();
        assert!(format!("{err:#}").contains("animation `bad`"));
    }

    #[test]
    fn test_bundled_example_builds() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/example.toml");
        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario.engine.spring.bounciness, 8.0);
        for spec in &scenario.animations {
            spec.build(&scenario.engine).unwrap();
        }
    }

    #[test]
    fn test_empty_scenario_rejected() {
        assert!(Scenario::from_toml_str("").is_err());
    }
}
