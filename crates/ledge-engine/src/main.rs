//! `ledge [config.toml]`: runs one scripted simulation and reports where the
//! actor ended up.
//!
//! Without an argument, `ledge.toml` in the working directory is used if
//! present, otherwise the built-in scenario.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use ledge_engine::{SimConfig, Simulation, DEFAULT_CONFIG_PATH};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("ledge=info".parse()?))
        .init();

    info!("Ledge {} starting", env!("CARGO_PKG_VERSION"));

    let mut config = match std::env::args().nth(1) {
        Some(path) => SimConfig::from_file(&path).context("failed to load config")?,
        None => SimConfig::load_from(DEFAULT_CONFIG_PATH),
    };
    config.validate();

    let mut simulation = Simulation::new(&config).context("failed to set up simulation")?;

    let summary = match &config.trace_path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let summary = simulation.run(Some(&mut writer as &mut dyn Write))?;
            info!("Trace written to {}", path.display());
            summary
        },
        None => simulation.run(None)?,
    };

    info!(
        "Finished {} ticks in {} frames: {:?} at ({:.3}, {:.3}), {} transitions, {} jumps",
        summary.ticks,
        summary.frames,
        summary.final_state,
        summary.final_position.x,
        summary.final_position.y,
        summary.transitions,
        summary.jumps
    );
    Ok(())
}
