//! Box-list collision layer.
//!
//! Solids are axis-aligned boxes tagged with a [`LayerMask`]. Rays are tested
//! against every box with the slab method; the closest accepted hit wins.

use ledge_common::{Aabb, Vec2};
use serde::{Deserialize, Serialize};

use crate::layer::{CollisionLayer, LayerMask, RayHit};

/// Components below this magnitude are treated as parallel to a slab.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A single static solid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// World-space extent
    pub bounds: Aabb,
    /// Layers this solid belongs to
    pub layers: LayerMask,
}

/// An unordered set of static box colliders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticGeometry {
    colliders: Vec<Collider>,
}

impl StaticGeometry {
    /// Creates an empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a solid and returns its index.
    pub fn add(&mut self, bounds: Aabb, layers: LayerMask) -> usize {
        self.colliders.push(Collider { bounds, layers });
        self.colliders.len() - 1
    }

    /// Builder-style [`add`](Self::add).
    #[must_use]
    pub fn with(mut self, bounds: Aabb, layers: LayerMask) -> Self {
        self.add(bounds, layers);
        self
    }

    /// All colliders in insertion order.
    #[must_use]
    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    /// Number of colliders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Whether the layer holds no geometry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}

/// Slab test of a normalized ray against one box.
fn ray_vs_aabb(origin: Vec2, dir: Vec2, bounds: &Aabb) -> Option<RayHit> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;
    let mut normal = Vec2::ZERO;

    for axis in 0..2 {
        let (o, d, lo, hi) = (origin[axis], dir[axis], bounds.min[axis], bounds.max[axis]);

        if d.abs() < PARALLEL_EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let (mut t1, mut t2) = ((lo - o) * inv, (hi - o) * inv);
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }

        if t1 > t_near {
            t_near = t1;
            normal = Vec2::ZERO;
            normal[axis] = -d.signum();
        }
        t_far = t_far.min(t2);
    }

    if t_near > t_far || t_far < 0.0 {
        return None;
    }

    if t_near < 0.0 {
        // Origin is inside or on the exit face; only a strict interior counts.
        let inside = origin.x > bounds.min.x
            && origin.x < bounds.max.x
            && origin.y > bounds.min.y
            && origin.y < bounds.max.y;
        return inside.then_some(RayHit {
            distance: 0.0,
            normal: -dir,
        });
    }

    Some(RayHit {
        distance: t_near,
        normal,
    })
}

impl CollisionLayer for StaticGeometry {
    fn cast_ray(&self, origin: Vec2, direction: Vec2, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec2::ZERO || !(max_distance > 0.0) {
            return None;
        }

        self.colliders
            .iter()
            .filter(|c| c.layers.intersects(mask))
            .filter_map(|c| ray_vs_aabb(origin, dir, &c.bounds))
            .filter(|hit| hit.distance <= max_distance)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
