//! Animation notifications
//!
//! Notifications are delivered synchronously to handlers registered on an
//! animation. Handlers only observe; they have no access to the scheduler, so
//! attaching or detaching animations in response has to happen after the
//! frame that produced the event.

use serde::{Deserialize, Serialize};

/// A lifecycle notification emitted by an animation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnimationEvent {
    /// The animation started running
    Started,
    /// Progress met or exceeded a progress marker
    ReachedProgress { marker: f64 },
    /// The value met or crossed the to-value for the first time
    ReachedToValue,
    /// The animation stopped; `finished` is false when it was removed early
    Stopped { finished: bool },
    /// A new value was computed for this frame
    Applied,
}

impl AnimationEvent {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            AnimationEvent::Started => "started",
            AnimationEvent::ReachedProgress { .. } => "reached_progress",
            AnimationEvent::ReachedToValue => "reached_to_value",
            AnimationEvent::Stopped { .. } => "stopped",
            AnimationEvent::Applied => "applied",
        }
    }
}

/// A handler invoked for every notification of an animation
pub type EventHandler = Box<dyn FnMut(&AnimationEvent) + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&AnimationEvent::Stopped { finished: true }).unwrap();
        assert_eq!(json, r#"{"event":"stopped","finished":true}"#);

        let json = serde_json::to_string(&AnimationEvent::ReachedProgress { marker: 0.5 }).unwrap();
        assert_eq!(json, r#"{"event":"reached_progress","marker":0.5}"#);
    }
}
