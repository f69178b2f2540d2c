//! Animation collaborator.
//!
//! The motion controller only needs to know whether an attack clip is still
//! playing. Everything else here derives presentation parameters from the
//! motion state for whatever drives the sprites.

use serde::{Deserialize, Serialize};

use crate::motion::MotionController;
use crate::state::AttackKind;

/// Vertical speed mapped onto the ends of the jump clip.
pub const JUMP_BLEND_RANGE: f32 = 20.0;

/// Horizontal speed below which the actor counts as standing.
pub const RUN_THRESHOLD: f32 = 0.01;

/// Animation clips the actor can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Clip {
    /// Standing still
    #[default]
    Idle,
    /// Running on the ground
    Run,
    /// In the air; scrubbed by vertical speed instead of played
    Jump,
    /// Holding onto a wall
    WallGrab,
    /// Grounded attack
    Attack,
    /// Airborne attack
    JumpAttack,
}

impl Clip {
    /// Whether the clip wraps around when it reaches its end.
    #[must_use]
    pub fn is_looping(self) -> bool {
        matches!(self, Self::Idle | Self::Run | Self::WallGrab)
    }

    /// Whether this is one of the attack clips.
    #[must_use]
    pub fn is_attack(self) -> bool {
        matches!(self, Self::Attack | Self::JumpAttack)
    }
}

impl From<AttackKind> for Clip {
    fn from(kind: AttackKind) -> Self {
        match kind {
            AttackKind::Ground => Self::Attack,
            AttackKind::Air => Self::JumpAttack,
        }
    }
}

/// Something that plays clips.
pub trait Animator {
    /// Starts `clip` from the beginning unless it is already playing.
    fn play(&mut self, clip: Clip);

    /// Jumps to `normalized_time` within `clip`.
    fn play_at(&mut self, clip: Clip, normalized_time: f32);

    /// Whether `clip` is the current clip.
    fn is_playing_clip(&self, clip: Clip) -> bool;

    /// Progress through the current clip; 1.0 is the end of the first pass.
    fn normalized_time(&self) -> f32;

    /// Sets the playback speed multiplier.
    fn set_speed(&mut self, _speed: f32) {}

    /// Advances the clip clock by a frame.
    fn update(&mut self, _dt: f32) {}
}

/// Clip lengths in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipDurations {
    /// Idle loop
    pub idle: f32,
    /// Run cycle
    pub run: f32,
    /// Jump clip
    pub jump: f32,
    /// Wall grab loop
    pub wall_grab: f32,
    /// Grounded attack
    pub attack: f32,
    /// Airborne attack
    pub jump_attack: f32,
}

impl Default for ClipDurations {
    fn default() -> Self {
        Self {
            idle: 1.0,
            run: 0.6,
            jump: 1.0,
            wall_grab: 0.5,
            attack: 0.35,
            jump_attack: 0.4,
        }
    }
}

impl ClipDurations {
    /// Length of `clip`.
    #[must_use]
    pub fn get(&self, clip: Clip) -> f32 {
        match clip {
            Clip::Idle => self.idle,
            Clip::Run => self.run,
            Clip::Jump => self.jump,
            Clip::WallGrab => self.wall_grab,
            Clip::Attack => self.attack,
            Clip::JumpAttack => self.jump_attack,
        }
    }
}

/// Headless [`Animator`] that only keeps a clip clock.
#[derive(Debug, Clone)]
pub struct ClipPlayer {
    durations: ClipDurations,
    clip: Option<Clip>,
    elapsed: f32,
    speed: f32,
}

impl Default for ClipPlayer {
    fn default() -> Self {
        Self::new(ClipDurations::default())
    }
}

impl ClipPlayer {
    /// Creates a player with the given clip lengths.
    #[must_use]
    pub fn new(durations: ClipDurations) -> Self {
        Self {
            durations,
            clip: None,
            elapsed: 0.0,
            speed: 1.0,
        }
    }

    /// Clip lengths.
    #[must_use]
    pub fn durations(&self) -> &ClipDurations {
        &self.durations
    }

    /// Current clip, if any.
    #[must_use]
    pub fn clip(&self) -> Option<Clip> {
        self.clip
    }

    /// Current speed multiplier.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Moves the clip clock forward.
    pub fn advance(&mut self, dt: f32) {
        if self.clip.is_some() {
            self.elapsed += dt * self.speed;
        }
    }
}

impl Animator for ClipPlayer {
    fn play(&mut self, clip: Clip) {
        if self.clip != Some(clip) {
            self.clip = Some(clip);
            self.elapsed = 0.0;
        }
    }

    fn play_at(&mut self, clip: Clip, normalized_time: f32) {
        self.clip = Some(clip);
        self.elapsed = normalized_time.max(0.0) * self.durations.get(clip);
    }

    fn is_playing_clip(&self, clip: Clip) -> bool {
        self.clip == Some(clip)
    }

    fn normalized_time(&self) -> f32 {
        let Some(clip) = self.clip else {
            return 0.0;
        };
        let duration = self.durations.get(clip);
        if duration <= 0.0 {
            return 1.0;
        }

        let t = self.elapsed / duration;
        if clip.is_looping() {
            t.fract()
        } else {
            t
        }
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn update(&mut self, dt: f32) {
        self.advance(dt);
    }
}

/// Presentation parameters derived from the motion state once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimationParams {
    /// |vx|
    pub horizontal_speed: f32,
    /// Run cycle speed multiplier, 0.5 at a crawl up to 1.0 at move speed
    pub playback_speed: f32,
    /// On the ground
    pub grounded: bool,
    /// Sliding on a wall
    pub wall_grab: bool,
    /// Airborne and not on a wall
    pub jumping: bool,
    /// Attack lock active
    pub attacking: bool,
    /// Scrub position into the jump clip: 0 rising fast, 1 falling fast
    pub jump_blend: f32,
}

impl AnimationParams {
    /// Derives parameters from `motion`.
    #[must_use]
    pub fn from_motion(motion: &MotionController) -> Self {
        let velocity = motion.velocity();
        let state = motion.state();
        let horizontal_speed = velocity.x.abs();
        let move_speed = motion.config().move_speed;

        let running = state.is_grounded() && horizontal_speed > RUN_THRESHOLD;
        let playback_speed = if running && move_speed > 0.0 {
            (horizontal_speed / move_speed + 1.0) / 2.0
        } else {
            1.0
        };

        let falling = (-velocity.y).clamp(-JUMP_BLEND_RANGE, JUMP_BLEND_RANGE);

        Self {
            horizontal_speed,
            playback_speed,
            grounded: state.is_grounded(),
            wall_grab: state.is_wall_sliding(),
            jumping: state.is_airborne(),
            attacking: motion.is_attack_locked(),
            jump_blend: (falling + JUMP_BLEND_RANGE) / (2.0 * JUMP_BLEND_RANGE),
        }
    }

    /// Clip that should play when no attack is running.
    #[must_use]
    pub fn base_clip(&self) -> Clip {
        if self.wall_grab {
            Clip::WallGrab
        } else if self.jumping {
            Clip::Jump
        } else if self.grounded && self.horizontal_speed > RUN_THRESHOLD {
            Clip::Run
        } else {
            Clip::Idle
        }
    }

    /// Drives `animator` for this frame. Attack clips are left alone.
    pub fn apply<A: Animator + ?Sized>(&self, animator: &mut A) {
        if self.attacking {
            animator.set_speed(1.0);
            return;
        }

        animator.set_speed(self.playback_speed);
        match self.base_clip() {
            Clip::Jump => animator.play_at(Clip::Jump, self.jump_blend),
            clip => animator.play(clip),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MovementConfig;

    #[test]
    fn test_attack_clip_mapping() {
        assert_eq!(Clip::from(AttackKind::Ground), Clip::Attack);
        assert_eq!(Clip::from(AttackKind::Air), Clip::JumpAttack);
        assert!(Clip::JumpAttack.is_attack());
        assert!(!Clip::Run.is_attack());
    }

    #[test]
    fn test_clip_player_one_shot_runs_past_end() {
        let mut player = ClipPlayer::default();
        player.play(Clip::Attack);
        assert_eq!(player.normalized_time(), 0.0);

        player.advance(0.175);
        assert!((player.normalized_time() - 0.5).abs() < 1e-4);
        player.advance(0.35);
        assert!(player.normalized_time() >= 1.0);
        assert!(player.is_playing_clip(Clip::Attack));
    }

    #[test]
    fn test_clip_player_loop_wraps() {
        let mut player = ClipPlayer::default();
        player.play(Clip::Run);
        player.advance(0.9);
        assert!((player.normalized_time() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_play_same_clip_does_not_restart() {
        let mut player = ClipPlayer::default();
        player.play(Clip::Idle);
        player.advance(0.25);
        player.play(Clip::Idle);
        assert!((player.normalized_time() - 0.25).abs() < 1e-4);

        player.play(Clip::Run);
        assert_eq!(player.normalized_time(), 0.0);
    }

    #[test]
    fn test_play_at_scrubs() {
        let mut player = ClipPlayer::default();
        player.play_at(Clip::Jump, 0.75);
        assert!(player.is_playing_clip(Clip::Jump));
        assert!((player.normalized_time() - 0.75).abs() < 1e-4);
    }

    #[test]
    fn test_speed_scales_clock() {
        let mut player = ClipPlayer::default();
        player.play(Clip::Attack);
        player.set_speed(0.5);
        player.update(0.35);
        assert!((player.normalized_time() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_params_at_rest() {
        let motion = MotionController::new(MovementConfig::default()).expect("valid");
        let params = AnimationParams::from_motion(&motion);
        assert_eq!(params.playback_speed, 1.0);
        assert!((params.jump_blend - 0.5).abs() < 1e-6);
        assert!(params.jumping);
        assert_eq!(params.base_clip(), Clip::Jump);
    }

    #[test]
    fn test_base_clip_priority() {
        let params = AnimationParams {
            wall_grab: true,
            jumping: false,
            ..Default::default()
        };
        assert_eq!(params.base_clip(), Clip::WallGrab);

        let params = AnimationParams {
            grounded: true,
            horizontal_speed: 3.0,
            ..Default::default()
        };
        assert_eq!(params.base_clip(), Clip::Run);

        let params = AnimationParams {
            grounded: true,
            ..Default::default()
        };
        assert_eq!(params.base_clip(), Clip::Idle);
    }

    #[test]
    fn test_apply_leaves_attack_clip() {
        let mut player = ClipPlayer::default();
        player.play(Clip::Attack);
        let params = AnimationParams {
            grounded: true,
            attacking: true,
            ..Default::default()
        };
        params.apply(&mut player);
        assert!(player.is_playing_clip(Clip::Attack));
    }
}
