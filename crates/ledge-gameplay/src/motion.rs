//! Motion controller: gravity, jumps, wall interaction and attack lock.
//!
//! One [`MotionController::fixed_tick`] per simulation step. Per tick:
//!
//! 1. apex check and horizontal smoothing toward `input.x * move_speed`
//! 2. wall-stick countdown (pins the actor to the wall while it runs)
//! 3. apply a pending jump
//! 4. integrate `v * dt + a * dt^2 / 2` and hand it to the resolver
//! 5. advance velocity by gravity, clamp to terminal and wall-slide speed
//! 6. zero velocity on touched sides and reclassify the movement state

use ledge_common::{smooth_damp, CollisionError, ConfigError, Facing, Vec2};
use ledge_kernel::CollisionLayer;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::animation::{Animator, Clip};
use crate::config::MovementConfig;
use crate::controller::{ContactState, RaycastController};
use crate::jump::{GravityMode, GravityProfile, WallJumpKind};
use crate::state::{AttackKind, MotionState, MovementState, PendingJump};

/// Tolerance for the wall-stick countdown reaching zero.
const TIMER_EPSILON: f32 = 1e-5;

/// What happened during one fixed tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Displacement applied after collision clipping
    pub displacement: Vec2,
    /// Position after the tick
    pub position: Vec2,
    /// Velocity after the tick
    pub velocity: Vec2,
    /// Contacts from this tick's resolve
    pub contacts: ContactState,
    /// State for the next tick
    pub state: MovementState,
    /// Whether the actor turned around this tick
    pub flipped: bool,
}

/// Per-actor movement state machine.
#[derive(Debug, Clone)]
pub struct MotionController {
    config: MovementConfig,
    gravity: GravityProfile,
    state: MovementState,
    motion: MotionState,
    directional_input: Vec2,
}

impl MotionController {
    /// Creates a controller, deriving the gravity profile from `config`.
    pub fn new(config: MovementConfig) -> Result<Self, ConfigError> {
        let gravity = GravityProfile::from_config(&config)?;
        debug!(
            "Gravity: {}, jump velocity: {}, release gravity: {}, falling gravity: {}",
            gravity.rising, gravity.jump_velocity, gravity.release, gravity.falling
        );
        Ok(Self {
            config,
            gravity,
            state: MovementState::default(),
            motion: MotionState::default(),
            directional_input: Vec2::ZERO,
        })
    }

    /// Movement configuration.
    #[must_use]
    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Derived gravity magnitudes.
    #[must_use]
    pub fn gravity_profile(&self) -> &GravityProfile {
        &self.gravity
    }

    /// Acceleration currently applied on y.
    #[must_use]
    pub fn gravity(&self) -> f32 {
        self.gravity.acceleration(self.motion.gravity_mode)
    }

    /// State derived at the end of the latest tick.
    #[must_use]
    pub fn state(&self) -> MovementState {
        self.state
    }

    /// Mutable motion record.
    #[must_use]
    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    /// Current velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.motion.velocity
    }

    /// Whether an attack lock is active.
    #[must_use]
    pub fn is_attack_locked(&self) -> bool {
        self.motion.is_attack_locked()
    }

    /// Latest directional input.
    #[must_use]
    pub fn directional_input(&self) -> Vec2 {
        self.directional_input
    }

    /// Sets the directional input; each axis is clamped to [-1, 1].
    pub fn set_directional_input(&mut self, input: Vec2) {
        let input = if input.is_finite() { input } else { Vec2::ZERO };
        self.directional_input = input.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    /// Jump pressed. Accepted on the ground or on a wall; otherwise the
    /// caller is expected to buffer and retry. The take-off velocity is
    /// applied on the next tick.
    pub fn request_jump_down(&mut self) -> bool {
        let jump = match self.state {
            MovementState::WallSliding { wall } => {
                let input_direction = self.config.input_direction(self.directional_input.x);
                let kind = WallJumpKind::select(input_direction, wall);
                let velocity = kind.velocity(&self.config, wall);
                debug!(?kind, ?wall, "Wall jump accepted");
                PendingJump::Wall(velocity)
            },
            MovementState::Grounded => {
                debug!("Jump accepted");
                PendingJump::Ground
            },
            MovementState::AirborneRising | MovementState::AirborneFalling => {
                trace!("Jump rejected while airborne");
                return false;
            },
        };

        self.motion.pending_jump = Some(jump);
        self.motion.gravity_mode = GravityMode::Rising;
        self.motion.apex.start();
        true
    }

    /// Jump released. Cuts the jump short if it is still rising.
    pub fn request_jump_up(&mut self) {
        if self.motion.apex.is_rising() && self.motion.gravity_mode == GravityMode::Rising {
            debug!("Jump released early");
            self.motion.gravity_mode = GravityMode::Released;
        }
    }

    /// Attack pressed. Returns the attack started, if any; the caller plays
    /// the matching clip. Ignored while wall-sliding.
    pub fn request_attack(&mut self) -> Option<AttackKind> {
        let kind = match self.state {
            MovementState::Grounded => AttackKind::Ground,
            MovementState::AirborneRising | MovementState::AirborneFalling => AttackKind::Air,
            MovementState::WallSliding { .. } => return None,
        };
        debug!(?kind, "Attack lock set");
        self.motion.attack = Some(kind);
        Some(kind)
    }

    /// Releases the attack lock once the animation collaborator reports the
    /// attack clip finished, or an air attack is interrupted by landing.
    pub fn poll_attack_lock<A: Animator + ?Sized>(&mut self, animator: &A) {
        if self.motion.attack.is_none() {
            return;
        }

        let air_attack = animator.is_playing_clip(Clip::JumpAttack);
        let playing = animator.is_playing_clip(Clip::Attack) || air_attack;

        let release = if playing && animator.normalized_time() < 1.0 {
            air_attack && self.state.is_grounded()
        } else {
            true
        };

        if release {
            debug!("Attack lock cleared");
            self.motion.attack = None;
        }
    }

    /// Advances the actor by one fixed step of `dt` seconds.
    pub fn fixed_tick<L: CollisionLayer + ?Sized>(
        &mut self,
        body: &mut RaycastController,
        layer: &L,
        dt: f32,
    ) -> Result<TickReport, CollisionError> {
        if self.motion.apex.observe(body.position().y) {
            debug!(height = self.motion.apex.max_height(), "Apex reached");
            self.motion.gravity_mode = GravityMode::Falling;
        }

        let mut input = self.directional_input;
        if self.motion.is_attack_locked() && self.state.is_grounded() {
            input = Vec2::ZERO;
        }

        let target = input.x * self.config.move_speed;
        let smooth_time = if self.state.is_grounded() {
            self.config.acceleration_time_grounded
        } else {
            self.config.acceleration_time_airborne
        };
        let motion = &mut self.motion;
        motion.velocity.x = smooth_damp(
            motion.velocity.x,
            target,
            &mut motion.smoothing_velocity,
            smooth_time,
            dt,
        );

        if let MovementState::WallSliding { wall } = self.state {
            self.update_wall_stick(wall, input.x, dt);
        }

        if let Some(jump) = self.motion.pending_jump.take() {
            self.motion.velocity = match jump {
                PendingJump::Ground => Vec2::new(self.motion.velocity.x, self.gravity.jump_velocity),
                PendingJump::Wall(velocity) => velocity,
            };
        }

        let gravity = self.gravity();
        let acceleration = Vec2::new(0.0, gravity);
        let delta = self.motion.velocity * dt + 0.5 * acceleration * dt * dt;
        let outcome = body.move_by(layer, delta)?;

        let motion = &mut self.motion;
        motion.velocity.y += gravity * dt;
        motion.velocity.y = motion.velocity.y.max(self.gravity.terminal_velocity);
        if self.state.is_wall_sliding() {
            motion.velocity.y = motion.velocity.y.max(-self.config.wall_slide_speed_max);
        }

        let contacts = outcome.contacts;
        if contacts.above || contacts.below {
            motion.velocity.y = 0.0;
        }
        if contacts.left || contacts.right {
            motion.velocity.x = 0.0;
        }

        self.transition(MovementState::classify(&contacts, self.motion.velocity.y));

        Ok(TickReport {
            displacement: outcome.displacement,
            position: body.position(),
            velocity: self.motion.velocity,
            contacts,
            state: self.state,
            flipped: outcome.flipped,
        })
    }

    /// Counts down while input pushes away from the wall; any other input
    /// re-arms the timer. The actor is held on the wall until it runs out.
    fn update_wall_stick(&mut self, wall: Facing, input_x: f32, dt: f32) {
        let pushing_away = self.config.input_direction(input_x) == wall.flipped().as_i32();
        let motion = &mut self.motion;

        if pushing_away {
            motion.wall_stick_timer -= dt;
            if motion.wall_stick_timer <= TIMER_EPSILON {
                debug!(?wall, "Wall stick expired");
                motion.wall_stick_timer = self.config.wall_stick_time;
                return;
            }
        } else {
            motion.wall_stick_timer = self.config.wall_stick_time;
        }

        motion.velocity.x = 0.0;
        motion.smoothing_velocity = 0.0;
    }

    fn transition(&mut self, next: MovementState) {
        if next == self.state {
            return;
        }

        match (self.state.is_wall_sliding(), next.is_wall_sliding()) {
            (false, true) => {
                debug!(wall = ?next.wall(), "Wall slide started");
                self.motion.wall_stick_timer = self.config.wall_stick_time;
            },
            (true, false) => debug!(?next, "Wall slide ended"),
            _ => trace!(from = ?self.state, to = ?next, "Movement state changed"),
        }
        self.state = next;
    }
}
