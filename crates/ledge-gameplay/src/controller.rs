//! Raycast collision resolver.
//!
//! Converts a proposed displacement into one that does not penetrate static
//! geometry. Rays are cast from the edges of the actor's box, shrunk inward by
//! a skin width, first along x and then along y. The vertical rays are shifted
//! by the already-clipped horizontal displacement so that an actor sliding
//! into a wall is still caught by the floor under where it actually ends up.
//!
//! Each axis is discrete: very large displacements can still pass between
//! rays on the axis that is not being swept.

use ledge_common::{Aabb, CollisionError, ConfigError, Facing, LedgeResult, Vec2};
use ledge_kernel::{CollisionLayer, LayerMask};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Default inward margin of the ray origins.
pub const DEFAULT_SKIN_WIDTH: f32 = 0.015;

/// Fewest rays allowed along either axis.
pub const MIN_RAY_COUNT: usize = 2;

/// Ray layout configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaycastConfig {
    /// Inward margin applied to the box before casting
    pub skin_width: f32,
    /// Rays cast along x, spread over the box height
    pub horizontal_ray_count: usize,
    /// Rays cast along y, spread over the box width
    pub vertical_ray_count: usize,
    /// Layers that block movement
    pub collision_mask: LayerMask,
}

impl Default for RaycastConfig {
    fn default() -> Self {
        Self {
            skin_width: DEFAULT_SKIN_WIDTH,
            horizontal_ray_count: 4,
            vertical_ray_count: 4,
            collision_mask: LayerMask::ALL,
        }
    }
}

impl RaycastConfig {
    /// Clamps ray counts to [`MIN_RAY_COUNT`] and rejects a non-positive skin.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.horizontal_ray_count < MIN_RAY_COUNT {
            warn!(
                "horizontal_ray_count {} raised to {}",
                self.horizontal_ray_count, MIN_RAY_COUNT
            );
            self.horizontal_ray_count = MIN_RAY_COUNT;
        }
        if self.vertical_ray_count < MIN_RAY_COUNT {
            warn!(
                "vertical_ray_count {} raised to {}",
                self.vertical_ray_count, MIN_RAY_COUNT
            );
            self.vertical_ray_count = MIN_RAY_COUNT;
        }
        if !(self.skin_width > 0.0 && self.skin_width.is_finite()) {
            return Err(ConfigError::not_positive("skin_width", self.skin_width));
        }
        Ok(self)
    }
}

/// Distance between neighbouring rays, derived from box size and ray counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaySpacing {
    /// Vertical gap between the horizontal rays
    pub horizontal: f32,
    /// Horizontal gap between the vertical rays
    pub vertical: f32,
}

impl RaySpacing {
    /// Spacing for a box of `size` under a validated `config`.
    pub fn new(size: Vec2, config: &RaycastConfig) -> Result<Self, CollisionError> {
        let inner = Aabb::from_center(Vec2::ZERO, size).shrunk(config.skin_width);
        if inner.is_degenerate() {
            return Err(CollisionError::DegenerateBox {
                width: inner.width(),
                height: inner.height(),
            });
        }

        let horizontal_count = config.horizontal_ray_count.max(MIN_RAY_COUNT);
        let vertical_count = config.vertical_ray_count.max(MIN_RAY_COUNT);

        Ok(Self {
            horizontal: inner.height() / (horizontal_count - 1) as f32,
            vertical: inner.width() / (vertical_count - 1) as f32,
        })
    }
}

/// Corners of the skin-shrunk box. Recomputed on every resolve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayOrigins {
    /// Top-left corner
    pub top_left: Vec2,
    /// Top-right corner
    pub top_right: Vec2,
    /// Bottom-left corner
    pub bottom_left: Vec2,
    /// Bottom-right corner
    pub bottom_right: Vec2,
}

impl RayOrigins {
    /// Corners of `bounds` shrunk by `skin_width`.
    #[must_use]
    pub fn from_bounds(bounds: &Aabb, skin_width: f32) -> Self {
        let inner = bounds.shrunk(skin_width);
        Self {
            top_left: Vec2::new(inner.min.x, inner.max.y),
            top_right: inner.max,
            bottom_left: inner.min,
            bottom_right: Vec2::new(inner.max.x, inner.min.y),
        }
    }
}

/// Which sides touched geometry during the latest resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactState {
    /// Ceiling contact
    pub above: bool,
    /// Floor contact
    pub below: bool,
    /// Wall on the left
    pub left: bool,
    /// Wall on the right
    pub right: bool,
    /// Facing direction; carried over between resolves
    pub facing: Facing,
}

impl ContactState {
    /// Whether either side flag is set.
    #[must_use]
    pub fn any_side(&self) -> bool {
        self.left || self.right
    }

    /// Side of a touching wall, left taking precedence.
    #[must_use]
    pub fn wall_side(&self) -> Option<Facing> {
        if self.left {
            Some(Facing::Left)
        } else if self.right {
            Some(Facing::Right)
        } else {
            None
        }
    }
}

/// Clipped displacement and the contacts found while clipping it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Displacement that stops at the first obstruction on each axis
    pub displacement: Vec2,
    /// Fresh contact flags
    pub contacts: ContactState,
}

/// Clips `displacement` for a box at `bounds` against `layer`.
///
/// When the horizontal component is zero, `facing` decides which side is
/// probed so that a resting actor still reports a wall it leans on.
pub fn resolve<L: CollisionLayer + ?Sized>(
    layer: &L,
    config: &RaycastConfig,
    spacing: &RaySpacing,
    bounds: &Aabb,
    facing: Facing,
    displacement: Vec2,
) -> Result<Resolution, CollisionError> {
    if !displacement.is_finite() {
        return Err(CollisionError::NonFiniteDisplacement);
    }
    let inner = bounds.shrunk(config.skin_width);
    if inner.is_degenerate() {
        return Err(CollisionError::DegenerateBox {
            width: inner.width(),
            height: inner.height(),
        });
    }

    let skin = config.skin_width;
    let origins = RayOrigins::from_bounds(bounds, skin);
    let mut delta = displacement;
    let mut contacts = ContactState {
        facing: Facing::from_sign(displacement.x).unwrap_or(facing),
        ..ContactState::default()
    };

    // Horizontal pass
    let direction_x = contacts.facing.sign();
    let mut ray_length = if delta.x.abs() < skin {
        2.0 * skin
    } else {
        delta.x.abs() + skin
    };
    let start = if direction_x < 0.0 {
        origins.bottom_left
    } else {
        origins.bottom_right
    };

    for i in 0..config.horizontal_ray_count {
        let origin = start + Vec2::Y * (spacing.horizontal * i as f32);
        if let Some(hit) = layer.cast_ray(origin, Vec2::X * direction_x, ray_length, config.collision_mask) {
            trace!(ray = i, distance = hit.distance, normal = ?hit.normal, "horizontal hit");
            delta.x = (hit.distance - skin) * direction_x;
            ray_length = hit.distance;
            contacts.left = direction_x < 0.0;
            contacts.right = direction_x > 0.0;
        }
    }

    // Vertical pass
    if delta.y != 0.0 {
        let direction_y = delta.y.signum();
        let mut ray_length = delta.y.abs() + skin;
        let start = if direction_y < 0.0 {
            origins.bottom_left
        } else {
            origins.top_left
        };

        for i in 0..config.vertical_ray_count {
            let origin = start + Vec2::X * (spacing.vertical * i as f32 + delta.x);
            if let Some(hit) = layer.cast_ray(origin, Vec2::Y * direction_y, ray_length, config.collision_mask) {
                trace!(ray = i, distance = hit.distance, normal = ?hit.normal, "vertical hit");
                delta.y = (hit.distance - skin) * direction_y;
                ray_length = hit.distance;
                contacts.below = direction_y < 0.0;
                contacts.above = direction_y > 0.0;
            }
        }
    }

    Ok(Resolution {
        displacement: delta,
        contacts,
    })
}

/// Outcome of [`RaycastController::move_by`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    /// Displacement actually applied
    pub displacement: Vec2,
    /// Contacts found during the move
    pub contacts: ContactState,
    /// Whether the facing changed during this move
    pub flipped: bool,
}

/// An actor's box plus the state the resolver keeps between moves.
#[derive(Debug, Clone)]
pub struct RaycastController {
    config: RaycastConfig,
    position: Vec2,
    size: Vec2,
    spacing: RaySpacing,
    contacts: ContactState,
}

impl RaycastController {
    /// Creates a controller for a box of `size` centered at `position`.
    ///
    /// Ray counts below two are clamped; a box with no room inside its
    /// skin is rejected.
    pub fn new(config: RaycastConfig, position: Vec2, size: Vec2) -> LedgeResult<Self> {
        let config = config.validated()?;
        let spacing = RaySpacing::new(size, &config)?;
        Ok(Self {
            config,
            position,
            size,
            spacing,
            contacts: ContactState::default(),
        })
    }

    /// Active configuration (after clamping).
    #[must_use]
    pub fn config(&self) -> &RaycastConfig {
        &self.config
    }

    /// Current ray spacing.
    #[must_use]
    pub fn spacing(&self) -> RaySpacing {
        self.spacing
    }

    /// Center of the box.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Teleports the box without collision checks.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Full size of the box.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// World-space box.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.position, self.size)
    }

    /// Contacts from the latest move.
    #[must_use]
    pub fn contacts(&self) -> ContactState {
        self.contacts
    }

    /// Current facing.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.contacts.facing
    }

    /// Moves the box by `delta`, stopping at geometry.
    ///
    /// Facing follows the sign of the requested horizontal movement, even
    /// when a wall cancels that movement.
    pub fn move_by<L: CollisionLayer + ?Sized>(&mut self, layer: &L, delta: Vec2) -> Result<MoveOutcome, CollisionError> {
        let previous = self.contacts.facing;
        let facing = Facing::from_sign(delta.x).unwrap_or(previous);

        let resolution = resolve(layer, &self.config, &self.spacing, &self.bounds(), facing, delta)?;
        self.position += resolution.displacement;
        self.contacts = resolution.contacts;

        Ok(MoveOutcome {
            displacement: resolution.displacement,
            contacts: resolution.contacts,
            flipped: previous != self.contacts.facing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledge_kernel::{EmptyLayer, StaticGeometry, TileGrid};
    use proptest::prelude::*;

    const SKIN: f32 = DEFAULT_SKIN_WIDTH;

    fn solid(min: (f32, f32), max: (f32, f32)) -> Aabb {
        Aabb::new(Vec2::new(min.0, min.1), Vec2::new(max.0, max.1))
    }

    fn wall_right_at(x: f32) -> StaticGeometry {
        StaticGeometry::new().with(solid((x, -50.0), (x + 1.0, 50.0)), LayerMask::GROUND)
    }

    fn unit_box(center: Vec2) -> (Aabb, RaySpacing, RaycastConfig) {
        let config = RaycastConfig::default();
        let size = Vec2::new(1.0, 2.0);
        let spacing = RaySpacing::new(size, &config).expect("valid box");
        (Aabb::from_center(center, size), spacing, config)
    }

    #[test]
    fn test_ray_spacing() {
        let config = RaycastConfig::default();
        let spacing = RaySpacing::new(Vec2::new(1.0, 2.0), &config).expect("valid box");
        assert!((spacing.horizontal - (2.0 - 2.0 * SKIN) / 3.0).abs() < 1e-6);
        assert!((spacing.vertical - (1.0 - 2.0 * SKIN) / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_ray_count_clamped() {
        let config = RaycastConfig {
            horizontal_ray_count: 0,
            vertical_ray_count: 1,
            ..Default::default()
        }
        .validated()
        .expect("counts are clamped, not rejected");
        assert_eq!(config.horizontal_ray_count, MIN_RAY_COUNT);
        assert_eq!(config.vertical_ray_count, MIN_RAY_COUNT);
    }

    #[test]
    fn test_zero_skin_rejected() {
        let config = RaycastConfig {
            skin_width: 0.0,
            ..Default::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_degenerate_box_rejected() {
        let config = RaycastConfig::default();
        assert!(matches!(
            RaySpacing::new(Vec2::new(0.02, 1.0), &config),
            Err(CollisionError::DegenerateBox { .. })
        ));
        assert!(RaycastController::new(config, Vec2::ZERO, Vec2::ZERO).is_err());
    }

    #[test]
    fn test_non_finite_displacement_rejected() {
        let (bounds, spacing, config) = unit_box(Vec2::ZERO);
        let result = resolve(
            &EmptyLayer,
            &config,
            &spacing,
            &bounds,
            Facing::Right,
            Vec2::new(f32::NAN, 0.0),
        );
        assert_eq!(result, Err(CollisionError::NonFiniteDisplacement));
    }

    #[test]
    fn test_no_geometry_passes_through() {
        let (bounds, spacing, config) = unit_box(Vec2::ZERO);
        let delta = Vec2::new(3.0, -7.0);
        let resolution = resolve(&EmptyLayer, &config, &spacing, &bounds, Facing::Right, delta)
            .expect("resolves");
        assert_eq!(resolution.displacement, delta);
        assert_eq!(
            resolution.contacts,
            ContactState {
                facing: Facing::Right,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_wall_clamps_horizontal() {
        let (bounds, spacing, config) = unit_box(Vec2::ZERO);
        // Box right edge at 0.5, wall face at 3.0
        let geometry = wall_right_at(3.0);
        let resolution = resolve(
            &geometry,
            &config,
            &spacing,
            &bounds,
            Facing::Right,
            Vec2::new(5.0, 0.0),
        )
        .expect("resolves");

        assert!((resolution.displacement.x - 2.5).abs() < 1e-4);
        assert!(resolution.contacts.right);
        assert!(!resolution.contacts.left);
    }

    #[test]
    fn test_short_move_does_not_report_far_wall() {
        let (bounds, spacing, config) = unit_box(Vec2::ZERO);
        let geometry = wall_right_at(3.0);
        let resolution = resolve(
            &geometry,
            &config,
            &spacing,
            &bounds,
            Facing::Right,
            Vec2::new(1.0, 0.0),
        )
        .expect("resolves");
        assert_eq!(resolution.displacement.x, 1.0);
        assert!(!resolution.contacts.right);
    }

    #[test]
    fn test_no_floor_leaves_vertical_unclipped() {
        let (bounds, spacing, config) = unit_box(Vec2::ZERO);
        let geometry = wall_right_at(3.0);
        let resolution = resolve(
            &geometry,
            &config,
            &spacing,
            &bounds,
            Facing::Right,
            Vec2::new(0.0, -4.0),
        )
        .expect("resolves");
        assert_eq!(resolution.displacement.y, -4.0);
        assert!(!resolution.contacts.below);
    }

    #[test]
    fn test_floor_clamps_vertical() {
        let (bounds, spacing, config) = unit_box(Vec2::new(0.0, 3.0));
        // Box bottom at 2.0, floor top at 0.0
        let floor = StaticGeometry::new().with(solid((-10.0, -1.0), (10.0, 0.0)), LayerMask::GROUND);
        let resolution = resolve(
            &floor,
            &config,
            &spacing,
            &bounds,
            Facing::Right,
            Vec2::new(0.0, -5.0),
        )
        .expect("resolves");
        assert!((resolution.displacement.y + 2.0).abs() < 1e-4);
        assert!(resolution.contacts.below);
        assert!(!resolution.contacts.above);
    }

    #[test]
    fn test_ceiling_sets_above() {
        let (bounds, spacing, config) = unit_box(Vec2::ZERO);
        let ceiling = StaticGeometry::new().with(solid((-10.0, 1.5), (10.0, 2.0)), LayerMask::GROUND);
        let resolution = resolve(
            &ceiling,
            &config,
            &spacing,
            &bounds,
            Facing::Right,
            Vec2::new(0.0, 3.0),
        )
        .expect("resolves");
        assert!((resolution.displacement.y - 0.5).abs() < 1e-4);
        assert!(resolution.contacts.above);
    }

    #[test]
    fn test_vertical_rays_follow_clipped_horizontal() {
        // Floor stops at x = 2 where a wall rises; past the wall there is no floor.
        let geometry = StaticGeometry::new()
            .with(solid((-10.0, -1.0), (2.0, 0.0)), LayerMask::GROUND)
            .with(solid((2.0, 0.0), (3.0, 10.0)), LayerMask::GROUND);
        let config = RaycastConfig::default();
        let size = Vec2::ONE;
        let spacing = RaySpacing::new(size, &config).expect("valid box");
        let bounds = Aabb::from_center(Vec2::new(0.5, 1.5), size);

        let resolution = resolve(
            &geometry,
            &config,
            &spacing,
            &bounds,
            Facing::Right,
            Vec2::new(5.0, -2.0),
        )
        .expect("resolves");

        assert!((resolution.displacement.x - 1.0).abs() < 1e-4);
        assert!((resolution.displacement.y + 1.0).abs() < 1e-4);
        assert!(resolution.contacts.right);
        assert!(resolution.contacts.below);
    }

    #[test]
    fn test_zero_horizontal_probes_facing_side() {
        // Box left edge exactly on the wall face
        let geometry = StaticGeometry::new().with(solid((-2.0, -10.0), (-0.5, 10.0)), LayerMask::GROUND);
        let (bounds, spacing, config) = unit_box(Vec2::ZERO);

        let facing_wall = resolve(&geometry, &config, &spacing, &bounds, Facing::Left, Vec2::ZERO)
            .expect("resolves");
        assert!(facing_wall.contacts.left);
        assert!(facing_wall.displacement.x.abs() < 1e-4);

        let facing_away = resolve(&geometry, &config, &spacing, &bounds, Facing::Right, Vec2::ZERO)
            .expect("resolves");
        assert!(!facing_away.contacts.left);
        assert!(!facing_away.contacts.right);
    }

    #[test]
    fn test_mask_ignores_other_layers() {
        let (bounds, spacing, mut config) = unit_box(Vec2::ZERO);
        config.collision_mask = LayerMask::PLATFORM;
        let geometry = wall_right_at(1.0);
        let resolution = resolve(
            &geometry,
            &config,
            &spacing,
            &bounds,
            Facing::Right,
            Vec2::new(2.0, 0.0),
        )
        .expect("resolves");
        assert_eq!(resolution.displacement.x, 2.0);
        assert!(!resolution.contacts.right);
    }

    #[test]
    fn test_controller_flags_are_fresh_each_move() {
        let grid = TileGrid::from_ascii(&["......", "......", "######"], 1.0, Vec2::ZERO).expect("valid");
        // 1x1 box resting on the floor (floor top at y = 1)
        let mut controller =
            RaycastController::new(RaycastConfig::default(), Vec2::new(2.5, 1.5), Vec2::ONE).expect("valid");

        let first = controller.move_by(&grid, Vec2::new(0.0, -0.1)).expect("moves");
        assert!(first.contacts.below);
        assert!(first.displacement.y.abs() < 1e-4);

        let second = controller.move_by(&grid, Vec2::ZERO).expect("moves");
        assert!(!second.contacts.below);
        assert!(!second.contacts.any_side());
    }

    #[test]
    fn test_huge_displacement_over_tile_grid() {
        let grid = TileGrid::from_ascii(&["......", "......", "######"], 1.0, Vec2::ZERO).expect("valid");
        let mut controller =
            RaycastController::new(RaycastConfig::default(), Vec2::new(2.5, 1.5), Vec2::ONE).expect("valid");

        let outcome = controller.move_by(&grid, Vec2::new(1.0e8, 0.0)).expect("moves");
        assert_eq!(outcome.displacement.x, 1.0e8);
        assert!(!outcome.contacts.right);

        let walled = TileGrid::from_ascii(&["#.....#", "#.....#", "#######"], 1.0, Vec2::ZERO).expect("valid");
        let mut controller =
            RaycastController::new(RaycastConfig::default(), Vec2::new(2.5, 1.5), Vec2::ONE).expect("valid");
        let outcome = controller.move_by(&walled, Vec2::new(-1.0e8, 0.0)).expect("moves");
        assert!((outcome.displacement.x + 1.0).abs() < 1e-3);
        assert!(outcome.contacts.left);
    }

    #[test]
    fn test_controller_facing_and_flip() {
        let mut controller =
            RaycastController::new(RaycastConfig::default(), Vec2::ZERO, Vec2::ONE).expect("valid");
        assert_eq!(controller.facing(), Facing::Right);

        let outcome = controller.move_by(&EmptyLayer, Vec2::new(-0.5, 0.0)).expect("moves");
        assert!(outcome.flipped);
        assert_eq!(controller.facing(), Facing::Left);

        let outcome = controller.move_by(&EmptyLayer, Vec2::ZERO).expect("moves");
        assert!(!outcome.flipped);
        assert_eq!(controller.facing(), Facing::Left);
        assert!((controller.position().x + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_facing_follows_intent_into_wall() {
        // Wall touching the box's left edge: the move is cancelled but facing turns.
        let geometry = StaticGeometry::new().with(solid((-2.0, -10.0), (-0.5, 10.0)), LayerMask::GROUND);
        let mut controller =
            RaycastController::new(RaycastConfig::default(), Vec2::ZERO, Vec2::ONE).expect("valid");
        let outcome = controller.move_by(&geometry, Vec2::new(-0.3, 0.0)).expect("moves");
        assert!(outcome.displacement.x.abs() < 1e-4);
        assert!(outcome.contacts.left);
        assert!(outcome.flipped);
    }

    proptest! {
        #[test]
        fn test_wall_clamp_law(gap in 0.0f32..5.0, extra in 0.05f32..5.0, left in any::<bool>()) {
            let config = RaycastConfig::default();
            let size = Vec2::new(1.0, 2.0);
            let spacing = RaySpacing::new(size, &config).expect("valid box");
            let bounds = Aabb::from_center(Vec2::ZERO, size);

            let sign = if left { -1.0 } else { 1.0 };
            let face = 0.5 + gap;
            let wall = if left {
                solid((-face - 1.0, -50.0), (-face, 50.0))
            } else {
                solid((face, -50.0), (face + 1.0, 50.0))
            };
            let geometry = StaticGeometry::new().with(wall, LayerMask::GROUND);

            let dx = (gap + extra) * sign;
            let facing = if left { Facing::Left } else { Facing::Right };
            let resolution = resolve(&geometry, &config, &spacing, &bounds, facing, Vec2::new(dx, 0.0))
                .expect("resolves");

            prop_assert!((resolution.displacement.x - gap * sign).abs() < 1e-3);
            let touched = if left { resolution.contacts.left } else { resolution.contacts.right };
            prop_assert!(touched);

            let moved = bounds.translated(resolution.displacement);
            prop_assert!(!moved.shrunk(config.skin_width).overlaps(&wall));
        }
    }
}
