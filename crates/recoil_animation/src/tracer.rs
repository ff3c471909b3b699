//! Animation tracer
//!
//! Records what an animation does frame by frame: reads and writes of the
//! host property, parameter updates and lifecycle transitions. Useful for
//! debugging and for asserting on event streams in tests.

use recoil_core::Vector;
use serde::{Deserialize, Serialize};

/// Kind of traced event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    PropertyRead,
    PropertyWrite,
    ToValueUpdate,
    FromValueUpdate,
    VelocityUpdate,
    BouncinessUpdate,
    SpeedUpdate,
    FrictionUpdate,
    MassUpdate,
    TensionUpdate,
    DidAdd,
    DidStart,
    DidStop,
    DidReachToValue,
    Autoreversed,
}

/// Value attached to a traced event
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TracePayload {
    None,
    Vector(Vector),
    Scalar(f64),
    Finished(bool),
}

/// A single traced event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub kind: TraceKind,
    /// Animation time at which the event was recorded
    pub time: f64,
    pub payload: TracePayload,
}

/// Per-animation event recorder.
///
/// Recording only happens between [`AnimationTracer::start`] and
/// [`AnimationTracer::stop`].
#[derive(Clone, Debug, Default)]
pub struct AnimationTracer {
    events: Vec<TraceEvent>,
    tracing: bool,
    log_on_completion: bool,
    label: Option<String>,
}

impl AnimationTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin recording events
    pub fn start(&mut self) {
        self.tracing = true;
    }

    /// Stop recording events. Recorded events are kept.
    pub fn stop(&mut self) {
        self.tracing = false;
    }

    pub fn is_tracing(&self) -> bool {
        self.tracing
    }

    /// Discard recorded events
    pub fn reset(&mut self) {
        self.events.clear();
    }

    pub fn all_events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Every property write, in order
    pub fn write_events(&self) -> Vec<&TraceEvent> {
        self.events_with_kind(TraceKind::PropertyWrite)
    }

    pub fn events_with_kind(&self, kind: TraceKind) -> Vec<&TraceEvent> {
        self.events.iter().filter(|e| e.kind == kind).collect()
    }

    /// When set, the event log is emitted through `tracing` and cleared each
    /// time the animation stops
    pub fn set_log_and_reset_on_completion(&mut self, enabled: bool) {
        self.log_on_completion = enabled;
    }

    pub fn log_and_reset_on_completion(&self) -> bool {
        self.log_on_completion
    }

    /// Label used when logging, typically the animation name
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    pub(crate) fn record(&mut self, kind: TraceKind, time: f64, payload: TracePayload) {
        if !self.tracing {
            return;
        }
        self.events.push(TraceEvent {
            kind,
            time,
            payload,
        });

        if kind == TraceKind::DidStop && self.log_on_completion {
            self.flush();
        }
    }

    fn flush(&mut self) {
        let label = self.label.as_deref().unwrap_or("animation");
        for event in &self.events {
            tracing::info!(
                animation = label,
                kind = ?event.kind,
                time = event.time,
                payload = ?event.payload,
                "trace"
            );
        }
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_only_while_tracing() {
        let mut tracer = AnimationTracer::new();
        tracer.record(TraceKind::DidAdd, 0.0, TracePayload::None);
        assert!(tracer.all_events().is_empty());

        tracer.start();
        tracer.record(TraceKind::DidStart, 1.0, TracePayload::None);
        tracer.record(TraceKind::PropertyWrite, 1.0, TracePayload::Vector(Vector::from(2.0)));
        tracer.stop();
        tracer.record(TraceKind::PropertyWrite, 2.0, TracePayload::Vector(Vector::from(3.0)));

        assert_eq!(tracer.all_events().len(), 2);
        assert_eq!(tracer.write_events().len(), 1);
        assert_eq!(tracer.write_events()[0].time, 1.0);
    }

    #[test]
    fn test_log_on_completion_clears_events() {
        let mut tracer = AnimationTracer::new();
        tracer.start();
        tracer.set_log_and_reset_on_completion(true);
        tracer.record(TraceKind::DidStart, 0.0, TracePayload::None);
        tracer.record(TraceKind::DidStop, 0.5, TracePayload::Finished(true));
        assert!(tracer.all_events().is_empty());
    }

    #[test]
    fn test_events_serialize() {
        let event = TraceEvent {
            kind: TraceKind::DidStop,
            time: 0.25,
            payload: TracePayload::Finished(true),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"kind":"did_stop","time":0.25,"payload":true}"#);
    }
}
