//! Jump arc derivation, apex tracking and wall-jump selection.
//!
//! Gravity is not a tunable. It is solved from the jump the designer wants:
//!
//! ```text
//! gravity        = -2 * jump_height / time_to_apex^2
//! jump_velocity  = |gravity| * time_to_apex
//! release        = -jump_velocity^2 / (2 * min_jump_height)
//! falling        = gravity * fall_gravity_multiplier
//! ```

use ledge_common::{ConfigError, Facing, Vec2};
use serde::{Deserialize, Serialize};

use crate::config::MovementConfig;

/// Gravity magnitudes derived once from the movement configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GravityProfile {
    /// Acceleration while rising with the jump held (negative)
    pub rising: f32,
    /// Initial upward speed of a ground jump
    pub jump_velocity: f32,
    /// Acceleration after the jump is released before the apex (negative)
    pub release: f32,
    /// Acceleration after the apex (negative)
    pub falling: f32,
    /// Lowest vertical velocity allowed (negative)
    pub terminal_velocity: f32,
}

impl GravityProfile {
    /// Solves the profile from `config`.
    pub fn from_config(config: &MovementConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let rising = -(2.0 * config.jump_height) / (config.time_to_apex * config.time_to_apex);
        let jump_velocity = rising.abs() * config.time_to_apex;
        let release = -(jump_velocity * jump_velocity) / (2.0 * config.min_jump_height);
        let falling = rising * config.fall_gravity_multiplier;

        Ok(Self {
            rising,
            jump_velocity,
            release,
            falling,
            terminal_velocity: falling * config.terminal_velocity_factor,
        })
    }

    /// Acceleration for a gravity mode.
    #[must_use]
    pub fn acceleration(&self, mode: GravityMode) -> f32 {
        match mode {
            GravityMode::Rising => self.rising,
            GravityMode::Released => self.release,
            GravityMode::Falling => self.falling,
        }
    }
}

/// Which gravity magnitude currently applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GravityMode {
    /// Base gravity: held jumps and walking off ledges
    #[default]
    Rising,
    /// Jump button let go before the apex
    Released,
    /// Apex has passed
    Falling,
}

/// Running maximum height since the last jump.
///
/// The apex is the first observation lower than the running maximum, so no
/// clock is needed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApexTracker {
    max_height: f32,
    reached: bool,
}

impl Default for ApexTracker {
    fn default() -> Self {
        Self {
            max_height: f32::NEG_INFINITY,
            reached: true,
        }
    }
}

impl ApexTracker {
    /// Arms the tracker for a new jump.
    pub fn start(&mut self) {
        self.max_height = f32::NEG_INFINITY;
        self.reached = false;
    }

    /// Records a height; returns `true` exactly once per jump, on the first
    /// observation after the actor started descending.
    pub fn observe(&mut self, height: f32) -> bool {
        let apex = !self.reached && self.max_height > height;
        if apex {
            self.reached = true;
        }
        self.max_height = self.max_height.max(height);
        apex
    }

    /// Whether the current jump is still in its rising phase.
    #[must_use]
    pub fn is_rising(&self) -> bool {
        !self.reached
    }

    /// Highest point observed since the last jump started.
    #[must_use]
    pub fn max_height(&self) -> f32 {
        self.max_height
    }
}

/// Wall-jump variant, picked from the input direction relative to the wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallJumpKind {
    /// Pushing into the wall: short hop back up the wall
    Climb,
    /// No horizontal input: drop off with a small push
    Neutral,
    /// Pushing away: long jump off the wall
    Leap,
}

impl WallJumpKind {
    /// Chooses a variant from the discrete input direction (-1, 0, 1).
    #[must_use]
    pub fn select(input_direction: i32, wall: Facing) -> Self {
        if input_direction == wall.as_i32() {
            Self::Climb
        } else if input_direction == 0 {
            Self::Neutral
        } else {
            Self::Leap
        }
    }

    /// Take-off velocity; x always points away from the wall.
    #[must_use]
    pub fn velocity(self, config: &MovementConfig, wall: Facing) -> Vec2 {
        let preset = match self {
            Self::Climb => config.wall_jump_climb,
            Self::Neutral => config.wall_jump_neutral,
            Self::Leap => config.wall_jump_leap,
        };
        Vec2::new(-wall.sign() * preset.x, preset.y)
    }
}
