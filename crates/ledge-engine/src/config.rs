//! Simulation configuration.
//!
//! A run is described by one TOML file: the level, the actor, the scripted
//! input timeline and every tunable. Missing fields fall back to defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ledge_common::Vec2;
use ledge_gameplay::{ClipDurations, InputConfig, InputFrame, MovementConfig, RaycastConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "ledge.toml";

/// Errors reading a config file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// File that was read
        path: PathBuf,
        /// Underlying IO error
        source: io::Error,
    },

    /// The file is not a valid config
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        /// File that was parsed
        path: PathBuf,
        /// Underlying TOML error
        source: toml::de::Error,
    },
}

/// Input applied before a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Tick the input lands on
    pub tick: u64,
    /// Input for that tick; its directional part stays held afterwards
    #[serde(default)]
    pub input: InputFrame,
}

/// Level layout as ASCII rows, top row first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// World size of one cell
    pub cell_size: f32,
    /// World position of the bottom-left corner
    pub origin: Vec2,
    /// `#` solid, `=` platform, `.` empty
    pub rows: Vec<String>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        let rows = [
            "#..............................#",
            "#..............................#",
            "#..............................#",
            "#.........................#....#",
            "#.........................#....#",
            "#............====.........#....#",
            "#.........................#....#",
            "#.........................#....#",
            "################################",
        ];
        Self {
            cell_size: 1.0,
            origin: Vec2::ZERO,
            rows: rows.iter().map(|row| (*row).to_string()).collect(),
        }
    }
}

/// The simulated actor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Center of the box at spawn
    pub spawn: Vec2,
    /// Full size of the box
    pub size: Vec2,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            spawn: Vec2::new(3.5, 3.0),
            size: Vec2::new(1.0, 2.0),
        }
    }
}

/// Full description of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Physics ticks per second
    pub tick_rate: u32,
    /// Presentation frames per second
    pub frame_rate: u32,
    /// Length of the run in seconds
    pub duration_secs: f32,
    /// JSON-lines trace output, one record per tick
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_path: Option<PathBuf>,
    /// Actor box and spawn point
    pub actor: ActorConfig,
    /// Level layout
    pub level: LevelConfig,
    /// Movement tunables
    pub movement: MovementConfig,
    /// Ray layout
    pub raycast: RaycastConfig,
    /// Input shim settings
    pub input: InputConfig,
    /// Clip lengths for the headless animator
    pub clips: ClipDurations,
    /// Scripted input, sorted by tick when loaded
    pub timeline: Vec<TimelineEvent>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 50,
            frame_rate: 60,
            duration_secs: 5.0,
            trace_path: None,
            actor: ActorConfig::default(),
            level: LevelConfig::default(),
            movement: MovementConfig::default(),
            raycast: RaycastConfig::default(),
            input: InputConfig::default(),
            clips: ClipDurations::default(),
            timeline: default_timeline(),
        }
    }
}

/// Run right, jump onto the platform, then drop off and slide down the pillar.
fn default_timeline() -> Vec<TimelineEvent> {
    let event = |tick, input| TimelineEvent { tick, input };
    vec![
        event(25, InputFrame::moving(1.0, 0.0)),
        event(
            60,
            InputFrame {
                directional: Vec2::new(1.0, 0.0),
                jump_pressed: true,
                ..Default::default()
            },
        ),
        event(
            80,
            InputFrame {
                directional: Vec2::new(1.0, 0.0),
                jump_released: true,
                ..Default::default()
            },
        ),
        event(
            150,
            InputFrame {
                directional: Vec2::new(1.0, 0.0),
                attack_pressed: true,
                ..Default::default()
            },
        ),
        event(200, InputFrame::moving(-1.0, 0.0)),
        event(230, InputFrame::default()),
    ]
}

impl SimConfig {
    /// Reads configuration from `path`. Missing fields take their defaults;
    /// an unreadable or malformed file is an error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigFileError> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&contents).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.timeline.sort_by_key(|event| event.tick);
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{e}, using defaults");
                Self::default()
            },
        }
    }

    /// Saves configuration to `path`.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamps run parameters into workable ranges.
    pub fn validate(&mut self) {
        self.tick_rate = self.tick_rate.clamp(10, 1000);
        self.frame_rate = self.frame_rate.clamp(1, 1000);
        if !self.duration_secs.is_finite() {
            self.duration_secs = 0.0;
        }
        self.duration_secs = self.duration_secs.clamp(0.0, 3600.0);
        self.input.jump_buffer_ticks = self.input.jump_buffer_ticks.min(self.tick_rate);
    }

    /// Seconds per presentation frame.
    #[must_use]
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }

    /// Number of physics ticks in the run.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        (self.duration_secs * self.tick_rate as f32).round() as u64
    }
}
