//! Animation scheduler
//!
//! Owns every attached animation, keyed by (owner, key), and renders them on
//! each tick of an external clock.

use indexmap::IndexMap;
use recoil_core::{OwnerId, PropertyHost};
use rustc_hash::FxBuildHasher;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::animation::{Animation, Render};

new_key_type! {
    pub struct AnimationId;
}

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Called with the frame time after every rendered frame
pub type FrameObserver = Box<dyn FnMut(f64) + Send>;

struct Entry {
    owner: OwnerId,
    key: String,
    animation: Animation,
}

/// The animation scheduler that renders all attached animations
pub struct AnimationScheduler {
    animations: SlotMap<AnimationId, Entry>,
    /// Per owner, keys in apply order
    owners: FxIndexMap<OwnerId, FxIndexMap<String, AnimationId>>,
    begin_time: Option<f64>,
    observers: Vec<FrameObserver>,
    last_frame: Option<f64>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            animations: SlotMap::with_key(),
            owners: FxIndexMap::default(),
            begin_time: None,
            observers: Vec::new(),
            last_frame: None,
        }
    }

    /// Begin time given to animations added without one
    pub fn set_begin_time(&mut self, begin_time: Option<f64>) {
        self.begin_time = begin_time;
    }

    /// Attach `animation` to `owner` under `key`.
    ///
    /// An animation already under that key is stopped as unfinished and
    /// detached first.
    pub fn add_animation(
        &mut self,
        owner: OwnerId,
        key: impl Into<String>,
        mut animation: Animation,
    ) -> AnimationId {
        let key = key.into();
        if self.remove_animation(owner, &key).is_some() {
            tracing::debug!(owner = owner.0, key = %key, "replaced animation");
        }

        animation.attach(self.begin_time);
        tracing::debug!(
            owner = owner.0,
            key = %key,
            kind = animation.kind().name(),
            "added animation"
        );

        let id = self.animations.insert(Entry {
            owner,
            key: key.clone(),
            animation,
        });
        self.owners.entry(owner).or_default().insert(key, id);
        id
    }

    /// Stop and detach the animation under `key`, returning it
    pub fn remove_animation(&mut self, owner: OwnerId, key: &str) -> Option<Animation> {
        let keys = self.owners.get_mut(&owner)?;
        let id = keys.shift_remove(key)?;
        if keys.is_empty() {
            self.owners.shift_remove(&owner);
        }

        let mut entry = self.animations.remove(id)?;
        entry.animation.stop(true, false);
        tracing::debug!(owner = owner.0, key, "removed animation");
        Some(entry.animation)
    }

    /// Stop and detach every animation of `owner`
    pub fn remove_all_animations(&mut self, owner: OwnerId) {
        let Some(keys) = self.owners.shift_remove(&owner) else {
            return;
        };
        for (_, id) in keys {
            if let Some(mut entry) = self.animations.remove(id) {
                entry.animation.stop(true, false);
            }
        }
        tracing::debug!(owner = owner.0, "removed all animations");
    }

    /// Stop and detach every animation
    pub fn clear(&mut self) {
        let owners: SmallVec<[OwnerId; 8]> = self.owners.keys().copied().collect();
        for owner in owners {
            self.remove_all_animations(owner);
        }
    }

    /// Keys attached to `owner`, in apply order
    pub fn animation_keys(&self, owner: OwnerId) -> Vec<&str> {
        self.owners
            .get(&owner)
            .map(|keys| keys.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn animation(&self, owner: OwnerId, key: &str) -> Option<&Animation> {
        let id = *self.owners.get(&owner)?.get(key)?;
        self.get(id)
    }

    pub fn animation_mut(&mut self, owner: OwnerId, key: &str) -> Option<&mut Animation> {
        let id = *self.owners.get(&owner)?.get(key)?;
        self.get_mut(id)
    }

    pub fn get(&self, id: AnimationId) -> Option<&Animation> {
        self.animations.get(id).map(|e| &e.animation)
    }

    pub fn get_mut(&mut self, id: AnimationId) -> Option<&mut Animation> {
        self.animations.get_mut(id).map(|e| &mut e.animation)
    }

    /// Owner and key an animation is attached under
    pub fn location(&self, id: AnimationId) -> Option<(OwnerId, &str)> {
        self.animations.get(id).map(|e| (e.owner, e.key.as_str()))
    }

    /// Check if any attached animation is still running
    pub fn has_active_animations(&self) -> bool {
        self.animations.iter().any(|(_, e)| !e.animation.is_paused())
    }

    /// Get the number of attached animations
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Register an observer called after every rendered frame
    pub fn add_observer<F>(&mut self, observer: F)
    where
        F: FnMut(f64) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Time of the last rendered frame
    pub fn last_frame_time(&self) -> Option<f64> {
        self.last_frame
    }

    /// Render every attached animation at `time`.
    ///
    /// Owners are visited in the order they first received an animation and
    /// each owner's animations in key insertion order. Animations that
    /// finish and are removed on completion are detached after their final
    /// value has been written.
    pub fn render_time(&mut self, time: f64, host: &mut dyn PropertyHost) {
        let owners: SmallVec<[OwnerId; 8]> = self.owners.keys().copied().collect();

        for owner in owners {
            if !host.is_alive(owner) {
                tracing::warn!(owner = owner.0, "owner is gone, detaching its animations");
                self.remove_all_animations(owner);
                continue;
            }

            let ids: SmallVec<[AnimationId; 8]> = match self.owners.get(&owner) {
                Some(keys) => keys.values().copied().collect(),
                None => continue,
            };

            for id in ids {
                let Some(entry) = self.animations.get_mut(id) else {
                    continue;
                };
                if let Render::Finished { detach: true } = entry.animation.render(owner, time, host) {
                    self.detach(id);
                }
            }
        }

        self.last_frame = Some(time);
        for observer in self.observers.iter_mut() {
            observer(time);
        }
    }

    /// Drop a stopped animation from the maps
    fn detach(&mut self, id: AnimationId) {
        let Some(entry) = self.animations.remove(id) else {
            return;
        };
        if let Some(keys) = self.owners.get_mut(&entry.owner) {
            keys.shift_remove(&entry.key);
            if keys.is_empty() {
                self.owners.shift_remove(&entry.owner);
            }
        }
        tracing::debug!(owner = entry.owner.0, key = %entry.key, "detached finished animation");
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recoil_core::{AnimatableProperty, MemoryHost, ValueType, Vector};

    fn basic(to: f64) -> Animation {
        let prop = AnimatableProperty::new("x", ValueType::Float).unwrap();
        let mut anim = Animation::basic(prop);
        anim.set_from_value(Vector::from(0.0)).unwrap();
        anim.set_to_value(Vector::from(to)).unwrap();
        anim
    }

    #[test]
    fn test_keys_in_insertion_order() {
        let mut scheduler = AnimationScheduler::new();
        let owner = OwnerId(1);
        scheduler.add_animation(owner, "b", basic(1.0));
        scheduler.add_animation(owner, "a", basic(1.0));
        scheduler.add_animation(owner, "c", basic(1.0));
        assert_eq!(scheduler.animation_keys(owner), vec!["b", "a", "c"]);
        assert_eq!(scheduler.len(), 3);
    }

    #[test]
    fn test_replacing_key_keeps_one_animation() {
        let mut scheduler = AnimationScheduler::new();
        let owner = OwnerId(1);
        scheduler.add_animation(owner, "x", basic(1.0));
        let id = scheduler.add_animation(owner, "x", basic(2.0));
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.location(id), Some((owner, "x")));
        assert_eq!(
            scheduler.animation(owner, "x").and_then(|a| a.to_value()),
            Some(Vector::from(2.0))
        );
    }

    #[test]
    fn test_finished_animation_detached() {
        let mut scheduler = AnimationScheduler::new();
        let mut host = MemoryHost::new();
        let owner = OwnerId(1);
        scheduler.add_animation(owner, "x", basic(1.0));
        assert!(scheduler.has_active_animations());

        scheduler.render_time(1.0, &mut host);
        scheduler.render_time(2.0, &mut host);
        assert!(scheduler.is_empty());
        assert!(scheduler.animation_keys(owner).is_empty());
        assert_eq!(host.get(owner, "x"), Some(Vector::from(1.0)));
        assert_eq!(scheduler.last_frame_time(), Some(2.0));
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut scheduler = AnimationScheduler::new();
        scheduler.add_animation(OwnerId(1), "x", basic(1.0));
        scheduler.add_animation(OwnerId(2), "x", basic(1.0));
        scheduler.clear();
        assert!(scheduler.is_empty());
        assert!(!scheduler.has_active_animations());
    }
}
