//! Layer masks and the ray query contract.

use ledge_common::Vec2;
use serde::{Deserialize, Serialize};

/// Bit set of collision layers a solid belongs to, or a query accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Matches nothing
    pub const NONE: Self = Self(0);
    /// Layer for solids that do not say otherwise
    pub const DEFAULT: Self = Self(1 << 0);
    /// Floors and walls
    pub const GROUND: Self = Self(1 << 1);
    /// Thin platforms
    pub const PLATFORM: Self = Self(1 << 2);
    /// Matches every layer
    pub const ALL: Self = Self(u32::MAX);

    /// Whether every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the two masks share at least one bit.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Bitwise union.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether no bit is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// Result of a raycast operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from ray origin to hit, along the normalized direction
    pub distance: f32,
    /// Surface normal at the hit point
    pub normal: Vec2,
}

/// Ray queries against static geometry.
///
/// Implementations must treat a ray whose origin is inside a solid as a hit
/// at distance zero, and must never report a hit beyond `max_distance`. A
/// zero-length `direction` or a non-positive `max_distance` never hits.
pub trait CollisionLayer {
    /// Casts a ray and returns the closest solid matching `mask`, if any.
    fn cast_ray(&self, origin: Vec2, direction: Vec2, max_distance: f32, mask: LayerMask) -> Option<RayHit>;
}

impl<T: CollisionLayer + ?Sized> CollisionLayer for &T {
    fn cast_ray(&self, origin: Vec2, direction: Vec2, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        (**self).cast_ray(origin, direction, max_distance, mask)
    }
}

/// A layer with no geometry at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLayer;

impl CollisionLayer for EmptyLayer {
    fn cast_ray(&self, _origin: Vec2, _direction: Vec2, _max_distance: f32, _mask: LayerMask) -> Option<RayHit> {
        None
    }
}
