use indexmap::IndexMap;
use recoil_core::{OwnerId, PropertyHost};

use super::{Animation, Render};

#[derive(Debug)]
struct Member {
    animation: Animation,
    finished: bool,
}

/// A set of animations run as one unit on the group's owner.
///
/// Members are attached when the group starts and rendered by the group on
/// every frame. The group finishes once every member has.
#[derive(Debug, Default)]
pub struct GroupAnimation {
    members: IndexMap<String, Member>,
    attached: bool,
}

impl GroupAnimation {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add `animation` under `key`, replacing a member with the same key
    pub(crate) fn insert(&mut self, key: String, animation: Animation) {
        self.members.insert(
            key,
            Member {
                animation,
                finished: false,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member keys in render order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn member(&self, key: &str) -> Option<&Animation> {
        self.members.get(key).map(|m| &m.animation)
    }

    pub(crate) fn advance(&mut self, owner: OwnerId, time: f64, host: &mut dyn PropertyHost) -> bool {
        if !self.attached {
            for member in self.members.values_mut() {
                member.animation.attach(Some(time));
                member.finished = false;
            }
            self.attached = true;
        }

        for member in self.members.values_mut().filter(|m| !m.finished) {
            if let Render::Finished { .. } = member.animation.render(owner, time, host) {
                member.finished = true;
            }
        }
        true
    }

    pub(crate) fn is_done(&self) -> bool {
        self.attached && self.members.values().all(|m| m.finished)
    }

    /// Pause or resume the members still running
    pub(crate) fn set_paused(&mut self, paused: bool) {
        for member in self.members.values_mut().filter(|m| !m.finished) {
            member.animation.set_paused(paused);
        }
    }

    /// Stop every member that has not finished
    pub(crate) fn stop_members(&mut self) {
        for member in self.members.values_mut().filter(|m| !m.finished) {
            member.animation.stop(true, false);
            member.finished = true;
        }
    }

    /// Run every member again from the start on the next frame
    pub(crate) fn restart(&mut self) {
        self.attached = false;
    }
}
