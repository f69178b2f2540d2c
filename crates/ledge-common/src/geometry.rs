//! Geometry types shared by the collision layer and the gameplay crate.
//!
//! World space is y-up: positive `y` points toward the ceiling, gravity is
//! a negative `y` acceleration.

use serde::{Deserialize, Serialize};

pub use glam::Vec2;

/// Axis-aligned bounding box in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Bottom-left corner
    pub min: Vec2,
    /// Top-right corner
    pub max: Vec2,
}

impl Aabb {
    /// Creates a new AABB from its corners.
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates an AABB from a center point and full size.
    #[must_use]
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Creates an AABB from its bottom-left corner and size.
    #[must_use]
    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self {
            min,
            max: min + size,
        }
    }

    /// Returns the center of the AABB.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Returns the full size of the AABB.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Returns the width of the AABB.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Returns the height of the AABB.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Checks if this AABB overlaps with another (touching edges do not count).
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Returns the AABB translated by a vector.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Shrinks the AABB inward by `margin` on every side.
    #[must_use]
    pub fn shrunk(&self, margin: f32) -> Self {
        Self {
            min: self.min + Vec2::splat(margin),
            max: self.max - Vec2::splat(margin),
        }
    }

    /// Whether the box has no positive area or non-finite corners.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
            || !self.min.is_finite()
            || !self.max.is_finite()
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Vec2::ONE)
    }
}

/// Horizontal facing of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Facing negative x
    Left,
    /// Facing positive x (default)
    #[default]
    Right,
}

impl Facing {
    /// `-1.0` for left, `1.0` for right.
    #[must_use]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// `-1` for left, `1` for right.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            Facing::Left => -1,
            Facing::Right => 1,
        }
    }

    /// Facing implied by the sign of `value`; `None` for zero or NaN.
    #[must_use]
    pub fn from_sign(value: f32) -> Option<Self> {
        if value > 0.0 {
            Some(Facing::Right)
        } else if value < 0.0 {
            Some(Facing::Left)
        } else {
            None
        }
    }

    /// The opposite facing.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}
