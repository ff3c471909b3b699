//! Recoil CLI
//!
//! Headless tools for the Recoil animation engine:
//! - `simulate`: run the animations of a scenario file on a fixed-rate clock
//!   and print every frame as JSON lines
//! - `spring`: convert between bounciness/speed and tension/friction/mass

mod scenario;
mod simulate;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use recoil_animation::spring::{DEFAULT_BOUNCINESS, DEFAULT_SPEED};
use recoil_animation::SpringConfig;
use serde::Serialize;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::scenario::Scenario;

/// Headless runner for Recoil animations
#[derive(Parser, Debug)]
#[command(name = "recoil")]
#[command(about = "Headless runner for Recoil animations")]
#[command(version)]
struct Cli {
    /// Log filter, e.g. `debug` or `recoil_animation=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a scenario and print one JSON line per value per frame
    Simulate {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Frames per second of the synthetic clock
        #[arg(long, default_value = "60")]
        fps: f64,

        /// Stop after this many seconds
        #[arg(long, default_value = "10")]
        max_duration: f64,

        /// Print the recorded trace of every animation after the frames
        #[arg(long)]
        trace: bool,
    },

    /// Convert spring parameters
    Spring {
        #[arg(long, conflicts_with_all = ["tension", "friction", "mass"])]
        bounciness: Option<f64>,

        #[arg(long, conflicts_with_all = ["tension", "friction", "mass"])]
        speed: Option<f64>,

        #[arg(long)]
        tension: Option<f64>,

        #[arg(long)]
        friction: Option<f64>,

        #[arg(long)]
        mass: Option<f64>,
    },
}

#[derive(Debug, Serialize)]
struct SpringReport {
    bounciness: f64,
    speed: f64,
    tension: f64,
    friction: f64,
    mass: f64,
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command {
        Commands::Simulate {
            scenario,
            fps,
            max_duration,
            trace,
        } => cmd_simulate(scenario, fps, max_duration, trace),
        Commands::Spring {
            bounciness,
            speed,
            tension,
            friction,
            mass,
        } => cmd_spring(bounciness, speed, tension, friction, mass),
    }
}

fn cmd_simulate(path: PathBuf, fps: f64, max_duration: f64, trace: bool) -> Result<()> {
    if !(fps.is_finite() && fps > 0.0) {
        bail!("--fps must be a positive number, got {fps}");
    }
    if !(max_duration.is_finite() && max_duration >= 0.0) {
        bail!("--max-duration must be a non-negative number, got {max_duration}");
    }

    let scenario = Scenario::load(&path)?;
    let options = simulate::Options {
        fps,
        max_duration,
        trace,
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let summary = simulate::run(&scenario, options, &mut out)?;
    tracing::info!(
        frames = summary.frames,
        end_time = summary.end_time,
        settled = summary.settled,
        "simulation finished"
    );
    Ok(())
}

fn cmd_spring(
    bounciness: Option<f64>,
    speed: Option<f64>,
    tension: Option<f64>,
    friction: Option<f64>,
    mass: Option<f64>,
) -> Result<()> {
    let config = if tension.is_some() || friction.is_some() || mass.is_some() {
        let base = SpringConfig::default();
        SpringConfig::new(
            tension.unwrap_or(base.tension),
            friction.unwrap_or(base.friction),
            mass.unwrap_or(base.mass),
        )?
    } else {
        let config = SpringConfig::from_bounciness_speed(
            bounciness.unwrap_or(DEFAULT_BOUNCINESS),
            speed.unwrap_or(DEFAULT_SPEED),
        );
        config.validate()?;
        config
    };

    let (bounciness, speed) = config.to_bounciness_speed();
    let report = SpringReport {
        bounciness,
        speed,
        tension: config.tension,
        friction: config.friction,
        mass: config.mass,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
