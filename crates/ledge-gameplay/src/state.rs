//! Movement state and the per-actor motion record.

use ledge_common::{Facing, Vec2};
use serde::{Deserialize, Serialize};

use crate::controller::ContactState;
use crate::jump::{ApexTracker, GravityMode};

/// Discrete movement state, derived from contacts after every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementState {
    /// Standing on a floor
    Grounded,
    /// In the air, moving up
    AirborneRising,
    /// In the air, moving down or hanging
    #[default]
    AirborneFalling,
    /// Touching a wall with no floor below
    WallSliding {
        /// Side the wall is on
        wall: Facing,
    },
}

impl MovementState {
    /// Classifies contacts and the vertical velocity they produced.
    #[must_use]
    pub fn classify(contacts: &ContactState, vertical_velocity: f32) -> Self {
        if contacts.below {
            return Self::Grounded;
        }
        if let Some(wall) = contacts.wall_side() {
            return Self::WallSliding { wall };
        }
        if vertical_velocity > 0.0 {
            Self::AirborneRising
        } else {
            Self::AirborneFalling
        }
    }

    /// Check if the actor is on a floor (can jump).
    #[must_use]
    pub fn is_grounded(self) -> bool {
        matches!(self, Self::Grounded)
    }

    /// Check if the actor is in the air and not on a wall.
    #[must_use]
    pub fn is_airborne(self) -> bool {
        matches!(self, Self::AirborneRising | Self::AirborneFalling)
    }

    /// Check if the actor is sliding on a wall.
    #[must_use]
    pub fn is_wall_sliding(self) -> bool {
        matches!(self, Self::WallSliding { .. })
    }

    /// Side of the wall being slid on.
    #[must_use]
    pub fn wall(self) -> Option<Facing> {
        match self {
            Self::WallSliding { wall } => Some(wall),
            _ => None,
        }
    }
}

/// Which attack is locking the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    /// Started on the ground; roots the actor
    Ground,
    /// Started in the air; ends early on landing
    Air,
}

/// A jump accepted but not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PendingJump {
    /// Straight up, keeping the current horizontal speed
    Ground,
    /// Fixed take-off velocity away from a wall
    Wall(Vec2),
}

/// Everything the motion controller mutates from tick to tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    /// Current velocity in world units per second
    pub velocity: Vec2,
    /// Active gravity magnitude
    pub gravity_mode: GravityMode,
    /// Apex detection for the current jump
    pub apex: ApexTracker,
    /// Seconds of away-input left before the actor lets go of the wall
    pub wall_stick_timer: f32,
    /// Set while an attack locks the actor
    pub attack: Option<AttackKind>,
    /// Rate of change carried by horizontal smoothing
    pub smoothing_velocity: f32,
    /// Jump to apply on the next tick
    pub pending_jump: Option<PendingJump>,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            gravity_mode: GravityMode::Rising,
            apex: ApexTracker::default(),
            wall_stick_timer: 0.0,
            attack: None,
            smoothing_velocity: 0.0,
            pending_jump: None,
        }
    }
}

impl MotionState {
    /// Whether an attack lock is active.
    #[must_use]
    pub fn is_attack_locked(&self) -> bool {
        self.attack.is_some()
    }
}
