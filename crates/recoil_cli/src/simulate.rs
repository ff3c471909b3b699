//! Headless simulation against an in-memory host

use std::io::Write;

use anyhow::{Context, Result};
use recoil_animation::{AnimationScheduler, TraceEvent};
use recoil_core::{MemoryHost, Vector};
use serde::Serialize;

use crate::scenario::Scenario;

/// Simulation settings
#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub fps: f64,
    /// Stop after this many seconds even if animations are still running
    pub max_duration: f64,
    pub trace: bool,
}

#[derive(Debug, Serialize)]
struct Sample<'a> {
    time: f64,
    owner: u64,
    key: &'a str,
    value: Vector,
}

#[derive(Debug, Serialize)]
struct TraceLine<'a> {
    key: &'a str,
    #[serde(flatten)]
    event: &'a TraceEvent,
}

/// What a simulation run did
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub frames: usize,
    pub end_time: f64,
    /// Whether every animation finished before the time limit
    pub settled: bool,
}

/// Run every animation of `scenario`, writing one JSON line per animated
/// value per frame to `out`
pub fn run(scenario: &Scenario, options: Options, out: &mut impl Write) -> Result<Summary> {
    let mut host = MemoryHost::new();
    let mut scheduler = AnimationScheduler::new();
    scheduler.set_begin_time(Some(0.0));

    for spec in &scenario.animations {
        if let Some(initial) = spec.initial_value()? {
            host.set(spec.owner(), spec.property_name(), initial);
        }
        let mut anim = spec.build(&scenario.engine)?;
        if options.trace {
            // keep finished animations around so their traces can be read
            anim.set_removed_on_completion(false);
            anim.tracer_mut().start();
        }
        scheduler.add_animation(spec.owner(), spec.key.clone(), anim);
    }
    tracing::info!(
        animations = scenario.animations.len(),
        fps = options.fps,
        "starting simulation"
    );

    let step = 1.0 / options.fps;
    let mut frames = 0;
    let mut time = 0.0;
    let mut settled = false;

    while time <= options.max_duration {
        scheduler.render_time(time, &mut host);
        frames += 1;

        for spec in &scenario.animations {
            if let Some(value) = host.get(spec.owner(), spec.property_name()) {
                let sample = Sample {
                    time,
                    owner: spec.owner,
                    key: &spec.key,
                    value,
                };
                serde_json::to_writer(&mut *out, &sample)?;
                writeln!(out)?;
            }
        }

        if !scheduler.has_active_animations() {
            settled = true;
            break;
        }
        time = frames as f64 * step;
    }

    if !settled {
        tracing::warn!(time, "animations still running at the time limit");
    }

    if options.trace {
        for spec in &scenario.animations {
            let Some(tracer) = scheduler
                .animation(spec.owner(), &spec.key)
                .and_then(|anim| anim.tracer())
            else {
                continue;
            };
            for event in tracer.all_events() {
                let line = TraceLine {
                    key: &spec.key,
                    event,
                };
                serde_json::to_writer(&mut *out, &line)?;
                writeln!(out)?;
            }
        }
    }

    out.flush().context("failed to flush output")?;
    Ok(Summary {
        frames,
        end_time: time,
        settled,
    })
}
