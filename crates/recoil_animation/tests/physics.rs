use std::sync::{Arc, Mutex};

use recoil_animation::{Animation, AnimationScheduler, SpringConfig};
use recoil_core::{AnimatableProperty, AnimationEvent, MemoryHost, OwnerId, ValueType, Vector};

const OWNER: OwnerId = OwnerId(1);
const FPS: f64 = 60.0;

fn property(value_type: ValueType, threshold: f64) -> AnimatableProperty {
    AnimatableProperty::new("x", value_type)
        .unwrap()
        .with_threshold(threshold)
        .unwrap()
}

/// Render frames at 60 fps from `start` through `end`, returning the host
/// value after each frame
fn run(scheduler: &mut AnimationScheduler, host: &mut MemoryHost, start: f64, end: f64) -> Vec<Vector> {
    let mut samples = Vec::new();
    let mut frame = 0;
    loop {
        let time = start + frame as f64 / FPS;
        if time > end {
            break;
        }
        scheduler.render_time(time, host);
        if let Some(value) = host.get(OWNER, "x") {
            samples.push(value);
        }
        frame += 1;
    }
    samples
}

fn stop_count(events: &Mutex<Vec<AnimationEvent>>) -> usize {
    events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, AnimationEvent::Stopped { .. }))
        .count()
}

/// Render 60 fps frames from `frame` on until `stops` stops were seen,
/// returning the next frame index
fn run_until_stops(
    scheduler: &mut AnimationScheduler,
    host: &mut MemoryHost,
    events: &Mutex<Vec<AnimationEvent>>,
    stops: usize,
    mut frame: usize,
) -> usize {
    while stop_count(events) < stops {
        scheduler.render_time(frame as f64 / FPS, host);
        frame += 1;
        assert!(frame < 60 * 60, "leg never finished");
    }
    frame
}

fn record(anim: &mut Animation) -> Arc<Mutex<Vec<AnimationEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    anim.on_event(move |e| {
        if *e != AnimationEvent::Applied {
            sink.lock().unwrap().push(*e);
        }
    });
    events
}

#[test]
fn test_underdamped_spring_overshoots_and_settles() {
    let mut anim = Animation::spring(property(ValueType::Float, 1.0));
    anim.set_spring_config(SpringConfig::new(100.0, 10.0, 1.0).unwrap())
        .unwrap();
    anim.set_from_value(Vector::from(0.0)).unwrap();
    anim.set_to_value(Vector::from(100.0)).unwrap();
    let events = record(&mut anim);

    let mut host = MemoryHost::new();
    let mut scheduler = AnimationScheduler::new();
    scheduler.add_animation(OWNER, "x", anim);
    let samples = run(&mut scheduler, &mut host, 0.0, 10.0);

    assert!(scheduler.is_empty(), "spring never converged");
    let peak = samples.iter().map(|v| v[0]).fold(f64::NEG_INFINITY, f64::max);
    assert!(peak > 105.0, "peak {peak}");
    assert_eq!(host.get(OWNER, "x"), Some(Vector::from(100.0)));
    // overshooting past the target reports reaching it only once
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            AnimationEvent::Started,
            AnimationEvent::ReachedToValue,
            AnimationEvent::Stopped { finished: true },
        ]
    );
}

#[test]
fn test_spring_reads_missing_from_value_from_host() {
    let mut host = MemoryHost::new();
    host.set(OWNER, "x", Vector::from([50.0, -50.0]));

    let mut anim = Animation::spring(property(ValueType::Point, 0.01));
    anim.set_to_value(Vector::from([0.0, 0.0])).unwrap();
    let mut scheduler = AnimationScheduler::new();
    scheduler.add_animation(OWNER, "x", anim);

    scheduler.render_time(0.0, &mut host);
    assert_eq!(host.get(OWNER, "x"), Some(Vector::from([50.0, -50.0])));
    let from = scheduler.animation(OWNER, "x").and_then(|a| a.from_value());
    assert_eq!(from, Some(Vector::from([50.0, -50.0])));

    run(&mut scheduler, &mut host, 1.0 / FPS, 10.0);
    assert!(scheduler.is_empty());
    assert_eq!(host.get(OWNER, "x"), Some(Vector::from([0.0, 0.0])));
}

#[test]
fn test_retargeting_running_spring_keeps_velocity() {
    let mut anim = Animation::spring(property(ValueType::Float, 0.01));
    anim.set_from_value(Vector::from(0.0)).unwrap();
    anim.set_to_value(Vector::from(100.0)).unwrap();
    let events = record(&mut anim);

    let mut host = MemoryHost::new();
    let mut scheduler = AnimationScheduler::new();
    scheduler.add_animation(OWNER, "x", anim);
    let before = run(&mut scheduler, &mut host, 0.0, 0.05);
    let last = before.last().map(|v| v[0]).unwrap();

    let anim = scheduler.animation_mut(OWNER, "x").unwrap();
    let velocity = anim.velocity().unwrap();
    assert!(velocity[0] > 0.0);
    anim.set_to_value(Vector::from(200.0)).unwrap();
    assert_eq!(anim.velocity(), Some(velocity));
    assert!(!anim.reached_to_value());

    let after = run(&mut scheduler, &mut host, 0.05 + 1.0 / FPS, 10.0);
    assert!(after[0][0] > last, "value jumped back from {last} to {}", after[0][0]);
    assert!(scheduler.is_empty());
    assert_eq!(host.get(OWNER, "x"), Some(Vector::from(200.0)));
    assert_eq!(stop_count(&events), 1);
}

#[test]
fn test_spring_frame_rate_does_not_change_trajectory() {
    fn spring() -> Animation {
        let mut anim = Animation::spring(property(ValueType::Float, 0.01));
        anim.set_from_value(Vector::from(0.0)).unwrap();
        anim.set_to_value(Vector::from(1.0)).unwrap();
        anim
    }

    let mut whole_host = MemoryHost::new();
    let mut whole = AnimationScheduler::new();
    whole.add_animation(OWNER, "x", spring());
    whole.render_time(0.0, &mut whole_host);
    whole.render_time(0.0333, &mut whole_host);

    let mut split_host = MemoryHost::new();
    let mut split = AnimationScheduler::new();
    split.add_animation(OWNER, "x", spring());
    split.render_time(0.0, &mut split_host);
    split.render_time(0.01665, &mut split_host);
    split.render_time(0.0333, &mut split_host);

    let a = whole_host.get(OWNER, "x").unwrap();
    let b = split_host.get(OWNER, "x").unwrap();
    assert!(a.approx_eq(&b, 1e-6), "{a:?} != {b:?}");
    assert!(a[0] > 0.0 && a[0] < 1.0);
}

#[test]
fn test_excessive_gap_lands_on_target() {
    let mut anim = Animation::spring(property(ValueType::Float, 0.01));
    anim.set_from_value(Vector::from(0.0)).unwrap();
    anim.set_to_value(Vector::from(10.0)).unwrap();

    let mut host = MemoryHost::new();
    let mut scheduler = AnimationScheduler::new();
    scheduler.add_animation(OWNER, "x", anim);
    scheduler.render_time(0.0, &mut host);
    scheduler.render_time(100.0, &mut host);
    scheduler.render_time(100.0 + 1.0 / FPS, &mut host);
    scheduler.render_time(100.0 + 2.0 / FPS, &mut host);

    assert_eq!(host.get(OWNER, "x"), Some(Vector::from(10.0)));
    assert!(scheduler.is_empty());
}

#[test]
fn test_decay_coasts_monotonically_to_derived_value() {
    let mut anim = Animation::decay(property(ValueType::Float, 0.01));
    anim.set_from_value(Vector::from(0.0)).unwrap();
    anim.set_velocity(Vector::from(1000.0)).unwrap();
    assert_eq!(anim.to_value(), None);

    let mut host = MemoryHost::new();
    let mut scheduler = AnimationScheduler::new();
    scheduler.add_animation(OWNER, "x", anim);
    scheduler.render_time(0.0, &mut host);

    let anim = scheduler.animation(OWNER, "x").unwrap();
    let to = anim.to_value().unwrap()[0];
    assert!(to > 450.0 && to < 500.0, "destination {to}");
    let duration = anim.duration().unwrap();
    assert!(duration > 4.0 && duration < 6.0, "duration {duration}");

    let samples = run(&mut scheduler, &mut host, 1.0 / FPS, 8.0);
    assert!(samples.windows(2).all(|w| w[1][0] >= w[0][0]));
    assert!(samples.iter().all(|v| v[0] <= to));
    assert!(scheduler.is_empty());
    assert_eq!(host.get(OWNER, "x"), Some(Vector::from(to)));
}

#[test]
fn test_decay_without_velocity_finishes_in_place() {
    let mut host = MemoryHost::new();
    host.set(OWNER, "x", Vector::from(3.0));
    let mut anim = Animation::decay(property(ValueType::Float, 0.01));
    let events = record(&mut anim);

    let mut scheduler = AnimationScheduler::new();
    scheduler.add_animation(OWNER, "x", anim);
    scheduler.render_time(0.0, &mut host);

    assert!(scheduler.is_empty());
    assert_eq!(host.get(OWNER, "x"), Some(Vector::from(3.0)));
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            AnimationEvent::Started,
            AnimationEvent::ReachedToValue,
            AnimationEvent::Stopped { finished: true },
        ]
    );
}

#[test]
fn test_spring_autoreverse_swaps_ends() {
    let mut anim = Animation::spring(property(ValueType::Float, 0.01));
    anim.set_from_value(Vector::from(0.0)).unwrap();
    anim.set_to_value(Vector::from(10.0)).unwrap();
    anim.set_autoreverses(true);
    let events = record(&mut anim);

    let mut host = MemoryHost::new();
    let mut scheduler = AnimationScheduler::new();
    scheduler.add_animation(OWNER, "x", anim);

    let frame = run_until_stops(&mut scheduler, &mut host, &events, 1, 0);
    assert_eq!(host.get(OWNER, "x"), Some(Vector::from(10.0)));
    let anim = scheduler.animation(OWNER, "x").unwrap();
    assert_eq!(anim.from_value(), Some(Vector::from(10.0)));
    assert_eq!(anim.to_value(), Some(Vector::from(0.0)));

    let start = frame as f64 / FPS;
    let back = run(&mut scheduler, &mut host, start, start + 10.0);
    assert!(back[0][0] < 10.0, "reversed leg started at {:?}", back[0]);
    assert!(scheduler.is_empty());
    assert_eq!(host.get(OWNER, "x"), Some(Vector::from(0.0)));
    assert_eq!(stop_count(&events), 2);
}

#[test]
fn test_decay_autoreverse_coasts_back_with_negated_velocity() {
    let mut anim = Animation::decay(property(ValueType::Float, 0.01));
    anim.set_from_value(Vector::from(0.0)).unwrap();
    anim.set_velocity(Vector::from(1000.0)).unwrap();
    anim.set_autoreverses(true);
    anim.set_repeat_count(2);
    let events = record(&mut anim);

    let mut host = MemoryHost::new();
    let mut scheduler = AnimationScheduler::new();
    scheduler.add_animation(OWNER, "x", anim);
    scheduler.render_time(0.0, &mut host);
    let far = scheduler.animation(OWNER, "x").and_then(|a| a.to_value()).unwrap();

    let frame = run_until_stops(&mut scheduler, &mut host, &events, 1, 1);
    assert_eq!(host.get(OWNER, "x"), Some(far));
    let anim = scheduler.animation(OWNER, "x").unwrap();
    assert_eq!(anim.from_value(), Some(far));
    assert_eq!(anim.velocity(), Some(Vector::from(-1000.0)));
    assert_eq!(anim.to_value(), Some(Vector::from(0.0)));

    let back = run_until_stops(&mut scheduler, &mut host, &events, 2, frame);
    assert_eq!(host.get(OWNER, "x"), Some(Vector::from(0.0)));

    run_until_stops(&mut scheduler, &mut host, &events, 4, back);
    assert!(scheduler.is_empty());
    assert_eq!(host.get(OWNER, "x"), Some(Vector::from(0.0)));
}

#[test]
fn test_decay_repeat_restores_original_velocity() {
    let mut anim = Animation::decay(property(ValueType::Float, 0.01));
    anim.set_from_value(Vector::from(0.0)).unwrap();
    anim.set_velocity(Vector::from(1000.0)).unwrap();
    anim.set_repeat_count(2);
    let events = record(&mut anim);

    let mut host = MemoryHost::new();
    let mut scheduler = AnimationScheduler::new();
    scheduler.add_animation(OWNER, "x", anim);
    scheduler.render_time(0.0, &mut host);
    let far = scheduler.animation(OWNER, "x").and_then(|a| a.to_value()).unwrap();

    let frame = run_until_stops(&mut scheduler, &mut host, &events, 1, 1);
    assert_eq!(host.get(OWNER, "x"), Some(far));
    let anim = scheduler.animation(OWNER, "x").unwrap();
    assert_eq!(anim.from_value(), Some(Vector::from(0.0)));
    assert_eq!(anim.velocity(), Some(Vector::from(1000.0)));
    assert_eq!(anim.to_value(), Some(far));

    let start = frame as f64 / FPS;
    let second = run(&mut scheduler, &mut host, start, start + 10.0);
    assert!(second[0][0] < far[0], "repeat did not restart from the beginning");
    assert!(scheduler.is_empty());
    assert_eq!(stop_count(&events), 2);
    assert_eq!(host.get(OWNER, "x"), Some(far));
}
