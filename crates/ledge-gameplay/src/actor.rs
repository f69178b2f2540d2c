//! Actor record: box, motion state machine and input shim for one character.

use ledge_common::{CollisionError, Facing, LedgeResult, Vec2};
use ledge_kernel::CollisionLayer;

use crate::animation::{AnimationParams, Animator, Clip};
use crate::config::MovementConfig;
use crate::controller::{ContactState, RaycastConfig, RaycastController};
use crate::input::{InputConfig, InputFrame, InputOutcome, PlayerInput};
use crate::motion::{MotionController, TickReport};
use crate::state::MovementState;

/// A kinematic character.
#[derive(Debug, Clone)]
pub struct Actor {
    body: RaycastController,
    motion: MotionController,
    input: PlayerInput,
}

impl Actor {
    /// Creates an actor of `size` centered at `spawn`.
    pub fn new(
        spawn: Vec2,
        size: Vec2,
        movement: MovementConfig,
        raycast: RaycastConfig,
        input: InputConfig,
    ) -> LedgeResult<Self> {
        Ok(Self {
            body: RaycastController::new(raycast, spawn, size)?,
            motion: MotionController::new(movement)?,
            input: PlayerInput::new(input),
        })
    }

    /// Collision body.
    #[must_use]
    pub fn body(&self) -> &RaycastController {
        &self.body
    }

    /// Motion state machine.
    #[must_use]
    pub fn motion(&self) -> &MotionController {
        &self.motion
    }

    /// Input shim.
    #[must_use]
    pub fn input(&self) -> &PlayerInput {
        &self.input
    }

    /// Center of the box.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.body.position()
    }

    /// Current velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.motion.velocity()
    }

    /// Movement state from the latest tick.
    #[must_use]
    pub fn state(&self) -> MovementState {
        self.motion.state()
    }

    /// Contacts from the latest tick.
    #[must_use]
    pub fn contacts(&self) -> ContactState {
        self.body.contacts()
    }

    /// Facing direction.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.body.facing()
    }

    /// Feeds one tick of input. An accepted attack starts its clip on `animator`.
    pub fn handle_input<A: Animator + ?Sized>(&mut self, frame: &InputFrame, animator: &mut A) -> InputOutcome {
        let outcome = self.input.apply(frame, &mut self.motion);
        if let Some(kind) = outcome.attack {
            animator.play(Clip::from(kind));
        }
        outcome
    }

    /// Runs one fixed physics step.
    pub fn fixed_update<L, A>(&mut self, layer: &L, animator: &A, dt: f32) -> Result<TickReport, CollisionError>
    where
        L: CollisionLayer + ?Sized,
        A: Animator + ?Sized,
    {
        self.motion.poll_attack_lock(animator);
        self.motion.fixed_tick(&mut self.body, layer, dt)
    }

    /// Per-frame presentation update. Never touches physics.
    pub fn frame_update<A: Animator + ?Sized>(&self, animator: &mut A, dt: f32) -> AnimationParams {
        let params = AnimationParams::from_motion(&self.motion);
        params.apply(animator);
        animator.update(dt);
        params
    }
}
