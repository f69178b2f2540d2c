//! Input shim between the input-mapping layer and the motion controller.
//!
//! A jump pressed slightly before landing is remembered for a few ticks and
//! retried every tick until the controller accepts it.

use ledge_common::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::motion::MotionController;
use crate::state::AttackKind;

/// Input shim configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Ticks a rejected jump press stays buffered
    pub jump_buffer_ticks: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { jump_buffer_ticks: 20 }
    }
}

/// One tick of mapped input.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFrame {
    /// Movement axes, each in [-1, 1]
    pub directional: Vec2,
    /// Jump went down this tick
    pub jump_pressed: bool,
    /// Jump went up this tick
    pub jump_released: bool,
    /// Attack went down this tick
    pub attack_pressed: bool,
}

impl InputFrame {
    /// Frame with only a movement direction.
    #[must_use]
    pub fn moving(x: f32, y: f32) -> Self {
        Self {
            directional: Vec2::new(x, y),
            ..Default::default()
        }
    }

    /// Same directional input with the edge flags cleared.
    #[must_use]
    pub fn held(&self) -> Self {
        Self::moving(self.directional.x, self.directional.y)
    }
}

/// What the shim did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputOutcome {
    /// A jump request was accepted this tick
    pub jump_accepted: bool,
    /// An attack started this tick
    pub attack: Option<AttackKind>,
}

/// Forwards input frames to a [`MotionController`], buffering early jumps.
#[derive(Debug, Clone, Default)]
pub struct PlayerInput {
    config: InputConfig,
    jump_buffer: u32,
}

impl PlayerInput {
    /// Creates a shim with an empty jump buffer.
    #[must_use]
    pub fn new(config: InputConfig) -> Self {
        Self { config, jump_buffer: 0 }
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Ticks left on the jump buffer; zero when nothing is buffered.
    #[must_use]
    pub fn jump_buffer(&self) -> u32 {
        self.jump_buffer
    }

    /// Applies one tick of input.
    pub fn apply(&mut self, frame: &InputFrame, motion: &mut MotionController) -> InputOutcome {
        let mut outcome = InputOutcome::default();
        motion.set_directional_input(frame.directional);

        self.jump_buffer = self.jump_buffer.saturating_sub(1);

        if frame.jump_pressed || self.jump_buffer > 0 {
            if motion.request_jump_down() {
                self.jump_buffer = 0;
                outcome.jump_accepted = true;
            } else if self.jump_buffer == 0 && self.config.jump_buffer_ticks > 0 {
                debug!(ticks = self.config.jump_buffer_ticks, "Jump buffered");
                self.jump_buffer = self.config.jump_buffer_ticks;
            }
        }

        if frame.jump_released {
            motion.request_jump_up();
        }

        if frame.attack_pressed {
            outcome.attack = motion.request_attack();
        }

        outcome
    }
}
