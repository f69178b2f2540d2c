//! Headless simulation loop.
//!
//! Frames advance at `frame_rate`; each frame feeds the fixed timestep and
//! runs however many physics ticks it owes. Timeline input is applied before
//! the tick it names, and the presentation update runs once per frame.

use std::io::{self, Write};

use ledge_common::{CollisionError, LedgeError, Vec2};
use ledge_gameplay::{Actor, ClipPlayer, InputFrame, MovementState, TickReport};
use ledge_kernel::{TileGrid, TileGridError};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{SimConfig, TimelineEvent};
use crate::timing::FixedTimestep;

/// Errors raised while building or running a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The ASCII level could not be parsed
    #[error("invalid level: {0}")]
    Level(#[from] TileGridError),

    /// The actor could not be created
    #[error("invalid actor: {0}")]
    Actor(#[from] LedgeError),

    /// The resolver rejected a tick
    #[error("tick {tick} failed: {source}")]
    Tick {
        /// Tick that failed
        tick: u64,
        /// Underlying resolver error
        source: CollisionError,
    },

    /// Writing a trace record failed
    #[error("trace serialization failed: {0}")]
    Trace(#[from] serde_json::Error),

    /// Writing the trace stream failed
    #[error("trace write failed: {0}")]
    Io(#[from] io::Error),
}

/// One line of the JSON trace.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TraceRecord {
    /// Tick index, starting at zero
    pub tick: u64,
    /// Simulated seconds at the end of the tick
    pub time: f32,
    /// Input applied before the tick
    pub input: InputFrame,
    /// What the tick did
    #[serde(flatten)]
    pub report: TickReport,
}

/// Result of a completed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimSummary {
    /// Physics ticks run
    pub ticks: u64,
    /// Presentation frames run
    pub frames: u64,
    /// Where the actor ended up
    pub final_position: Vec2,
    /// Movement state after the last tick
    pub final_state: MovementState,
    /// Number of movement state changes
    pub transitions: u32,
    /// Jumps accepted, including wall jumps
    pub jumps: u32,
}

/// A level, an actor and a scripted input timeline.
#[derive(Debug)]
pub struct Simulation {
    level: TileGrid,
    actor: Actor,
    animator: ClipPlayer,
    timestep: FixedTimestep,
    timeline: Vec<TimelineEvent>,
    next_event: usize,
    held: InputFrame,
    total_ticks: u64,
    frame_dt: f32,
}

impl Simulation {
    /// Builds the level and spawns the actor.
    pub fn new(config: &SimConfig) -> Result<Self, SimulationError> {
        let level = TileGrid::from_ascii(&config.level.rows, config.level.cell_size, config.level.origin)?;
        let actor = Actor::new(
            config.actor.spawn,
            config.actor.size,
            config.movement.clone(),
            config.raycast,
            config.input,
        )?;

        let mut timeline = config.timeline.clone();
        timeline.sort_by_key(|event| event.tick);

        info!(
            "Level {}x{}, actor at ({}, {}), {} timeline events",
            level.width(),
            level.height(),
            config.actor.spawn.x,
            config.actor.spawn.y,
            timeline.len()
        );

        Ok(Self {
            level,
            actor,
            animator: ClipPlayer::new(config.clips),
            timestep: FixedTimestep::new(config.tick_rate),
            timeline,
            next_event: 0,
            held: InputFrame::default(),
            total_ticks: config.total_ticks(),
            frame_dt: config.frame_dt(),
        })
    }

    /// The simulated actor.
    #[must_use]
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// The level being simulated.
    #[must_use]
    pub fn level(&self) -> &TileGrid {
        &self.level
    }

    /// Ticks run so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.timestep.ticks()
    }

    /// Runs to the end of the timeline duration, writing one JSON line per
    /// tick to `trace` when given.
    pub fn run(&mut self, mut trace: Option<&mut dyn Write>) -> Result<SimSummary, SimulationError> {
        let mut summary = SimSummary {
            ticks: 0,
            frames: 0,
            final_position: self.actor.position(),
            final_state: self.actor.state(),
            transitions: 0,
            jumps: 0,
        };
        let mut tick = 0;

        while tick < self.total_ticks {
            let owed = self.timestep.accumulate(self.frame_dt);
            for _ in 0..owed {
                if tick >= self.total_ticks {
                    break;
                }

                let input = self.input_for(tick);
                if self.actor.handle_input(&input, &mut self.animator).jump_accepted {
                    summary.jumps += 1;
                }

                let previous = self.actor.state();
                let report = self
                    .actor
                    .fixed_update(&self.level, &self.animator, self.timestep.fixed_dt())
                    .map_err(|source| SimulationError::Tick { tick, source })?;

                if report.state != previous {
                    summary.transitions += 1;
                    info!(
                        tick,
                        "{:?} -> {:?} at ({:.3}, {:.3})",
                        previous,
                        report.state,
                        report.position.x,
                        report.position.y
                    );
                }
                if report.flipped {
                    debug!(tick, facing = ?report.contacts.facing, "Facing flipped");
                }

                if let Some(out) = trace.as_mut() {
                    let record = TraceRecord {
                        tick,
                        time: (tick + 1) as f32 * self.timestep.fixed_dt(),
                        input,
                        report,
                    };
                    serde_json::to_writer(&mut **out, &record)?;
                    out.write_all(b"\n")?;
                }
                tick += 1;
            }

            self.actor.frame_update(&mut self.animator, self.frame_dt);
            summary.frames += 1;
        }

        if let Some(out) = trace.as_mut() {
            out.flush()?;
        }

        summary.ticks = tick;
        summary.final_position = self.actor.position();
        summary.final_state = self.actor.state();
        Ok(summary)
    }

    /// Input for `tick`: the scripted frame if one lands here, otherwise the
    /// held direction with no button edges.
    fn input_for(&mut self, tick: u64) -> InputFrame {
        let mut frame = self.held;
        while let Some(event) = self.timeline.get(self.next_event) {
            if event.tick > tick {
                break;
            }
            if event.tick == tick {
                frame = event.input;
            }
            self.next_event += 1;
        }
        self.held = frame.held();
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActorConfig, LevelConfig};

    fn flat_config(timeline: Vec<TimelineEvent>, duration_secs: f32) -> SimConfig {
        SimConfig {
            duration_secs,
            level: LevelConfig {
                rows: vec![
                    "#....................#".to_string(),
                    "#....................#".to_string(),
                    "#....................#".to_string(),
                    "#....................#".to_string(),
                    "#....................#".to_string(),
                    "#....................#".to_string(),
                    "######################".to_string(),
                ],
                ..Default::default()
            },
            actor: ActorConfig {
                spawn: Vec2::new(5.5, 2.5),
                size: Vec2::new(1.0, 2.0),
            },
            timeline,
            ..Default::default()
        }
    }

    #[test]
    fn test_idle_run_settles_on_floor() {
        let mut sim = Simulation::new(&flat_config(Vec::new(), 1.0)).expect("valid sim");
        let summary = sim.run(None).expect("runs");

        assert_eq!(summary.ticks, 50);
        assert!((summary.frames as i64 - 60).abs() <= 1);
        assert_eq!(summary.final_state, MovementState::Grounded);
        assert!((summary.final_position.y - 2.0).abs() < 1e-3);
        assert_eq!(summary.final_position.x, 5.5);
    }

    #[test]
    fn test_held_direction_persists() {
        let timeline = vec![TimelineEvent {
            tick: 0,
            input: InputFrame::moving(1.0, 0.0),
        }];
        let mut sim = Simulation::new(&flat_config(timeline, 1.0)).expect("valid sim");
        let summary = sim.run(None).expect("runs");
        assert!(summary.final_position.x > 9.0);
        assert!((sim.actor().velocity().x - 6.0).abs() < 0.05);
    }

    #[test]
    fn test_scripted_jump_writes_trace() {
        let timeline = vec![
            TimelineEvent {
                tick: 30,
                input: InputFrame {
                    jump_pressed: true,
                    ..Default::default()
                },
            },
            TimelineEvent {
                tick: 10,
                input: InputFrame::default(),
            },
        ];
        let mut sim = Simulation::new(&flat_config(timeline, 2.0)).expect("valid sim");

        let mut trace = Vec::new();
        let summary = sim.run(Some(&mut trace)).expect("runs");
        assert_eq!(summary.jumps, 1);
        assert!(summary.transitions >= 3);

        let text = String::from_utf8(trace).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len() as u64, summary.ticks);

        let record: serde_json::Value = serde_json::from_str(lines[30]).expect("json");
        assert_eq!(record["tick"], 30);
        assert_eq!(record["input"]["jump_pressed"], true);
        assert_eq!(record["state"], "AirborneRising");
    }

    #[test]
    fn test_bad_level_rejected() {
        let mut config = flat_config(Vec::new(), 1.0);
        config.level.rows = vec!["##".to_string(), "#".to_string()];
        assert!(matches!(Simulation::new(&config), Err(SimulationError::Level(_))));
    }

    #[test]
    fn test_bad_movement_rejected() {
        let mut config = flat_config(Vec::new(), 1.0);
        config.movement.jump_height = 0.0;
        assert!(matches!(Simulation::new(&config), Err(SimulationError::Actor(_))));
    }

    #[test]
    fn test_wall_slide_demo_runs() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/wall_slide.toml");
        let config = SimConfig::from_file(&path).expect("demo config parses");
        let mut sim = Simulation::new(&config).expect("valid sim");

        let mut trace = Vec::new();
        let summary = sim.run(Some(&mut trace)).expect("runs");
        assert_eq!(summary.ticks, 200);
        assert_eq!(summary.jumps, 1);
        assert_eq!(summary.final_state, MovementState::Grounded);

        let text = String::from_utf8(trace).expect("utf8");
        let sliding = text
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).expect("json"))
            .filter(|record| record["state"].get("WallSliding").is_some())
            .count();
        assert!(sliding > 0);
    }

    #[test]
    fn test_default_scenario_runs() {
        let mut sim = Simulation::new(&SimConfig::default()).expect("valid sim");
        let summary = sim.run(None).expect("runs");
        assert_eq!(summary.ticks, 250);
        assert!(summary.jumps >= 1);
    }
}
