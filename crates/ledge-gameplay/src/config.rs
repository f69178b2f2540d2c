//! Movement tunables.
//!
//! Every value here is supplied at actor initialization. Gravity and jump
//! speed are not configured directly: they are derived from the desired jump
//! height and time to apex (see [`GravityProfile`](crate::jump::GravityProfile)).

use ledge_common::{ConfigError, Vec2};
use serde::{Deserialize, Serialize};

/// Player movement configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Peak height of a jump released on the first tick
    pub min_jump_height: f32,
    /// Peak height of a jump held through the apex
    pub jump_height: f32,
    /// Seconds from take-off to apex for a held jump
    pub time_to_apex: f32,
    /// Gravity multiplier once the apex has passed
    pub fall_gravity_multiplier: f32,
    /// Horizontal speed at full input
    pub move_speed: f32,
    /// Smoothing time for horizontal velocity on the ground
    pub acceleration_time_grounded: f32,
    /// Smoothing time for horizontal velocity in the air
    pub acceleration_time_airborne: f32,
    /// Fastest downward speed while sliding on a wall
    pub wall_slide_speed_max: f32,
    /// Seconds of input away from a wall before the actor lets go
    pub wall_stick_time: f32,
    /// Terminal fall speed as a fraction of falling gravity (per second)
    pub terminal_velocity_factor: f32,
    /// Wall jump when pushing toward the wall (x away from wall, y up)
    pub wall_jump_climb: Vec2,
    /// Wall jump with no horizontal input
    pub wall_jump_neutral: Vec2,
    /// Wall jump when pushing away from the wall
    pub wall_jump_leap: Vec2,
    /// Horizontal input magnitude below which the stick counts as centered
    pub input_dead_zone: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            min_jump_height: 0.5,
            jump_height: 4.0,
            time_to_apex: 0.4,
            fall_gravity_multiplier: 2.0,
            move_speed: 6.0,
            acceleration_time_grounded: 0.1,
            acceleration_time_airborne: 0.2,
            wall_slide_speed_max: 3.0,
            wall_stick_time: 0.15,
            terminal_velocity_factor: 0.5,
            wall_jump_climb: Vec2::new(7.5, 16.0),
            wall_jump_neutral: Vec2::new(8.5, 7.0),
            wall_jump_leap: Vec2::new(18.0, 17.0),
            input_dead_zone: 0.1,
        }
    }
}

fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::not_positive(field, value))
    }
}

impl MovementConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects values that would make the derived gravity non-finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("min_jump_height", self.min_jump_height)?;
        require_positive("jump_height", self.jump_height)?;
        require_positive("time_to_apex", self.time_to_apex)?;
        require_positive("fall_gravity_multiplier", self.fall_gravity_multiplier)?;
        require_positive("terminal_velocity_factor", self.terminal_velocity_factor)?;
        require_positive("wall_slide_speed_max", self.wall_slide_speed_max)?;

        if !(self.move_speed >= 0.0 && self.move_speed.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "move_speed",
                reason: format!("expected a finite value >= 0, got {}", self.move_speed),
            });
        }
        if !(self.wall_stick_time >= 0.0 && self.wall_stick_time.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "wall_stick_time",
                reason: format!("expected a finite value >= 0, got {}", self.wall_stick_time),
            });
        }
        if !(0.0..1.0).contains(&self.input_dead_zone) {
            return Err(ConfigError::InvalidValue {
                field: "input_dead_zone",
                reason: format!("expected a value in [0, 1), got {}", self.input_dead_zone),
            });
        }
        Ok(())
    }

    /// Discrete direction of a horizontal input axis: -1, 0 or 1.
    #[must_use]
    pub fn input_direction(&self, axis: f32) -> i32 {
        if axis > self.input_dead_zone {
            1
        } else if axis < -self.input_dead_zone {
            -1
        } else {
            0
        }
    }
}
