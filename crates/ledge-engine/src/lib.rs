//! # Ledge Engine
//!
//! Headless runner for the Ledge movement core.
//!
//! This crate ties the subsystems together without a window:
//! - Simulation configuration loaded from TOML
//! - Fixed timestep accumulator
//! - Scripted simulation loop with a JSON-lines trace

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod simulation;
pub mod timing;

pub use config::{ActorConfig, ConfigFileError, LevelConfig, SimConfig, TimelineEvent, DEFAULT_CONFIG_PATH};
pub use simulation::{SimSummary, Simulation, SimulationError, TraceRecord};
pub use timing::FixedTimestep;
