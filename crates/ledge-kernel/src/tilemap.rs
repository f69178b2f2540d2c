//! Tile-grid collision layer.
//!
//! A dense grid of cells, each either empty or solid on some set of layers.
//! Cell `(0, 0)` is the bottom-left cell; its lower-left corner sits at the
//! grid origin.

use ledge_common::{Aabb, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::layer::{CollisionLayer, LayerMask, RayHit};

/// Errors building a tile grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TileGridError {
    /// No rows, or rows with no cells
    #[error("tile grid has no cells")]
    Empty,

    /// Rows of different widths
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Offending row (0 = top line of the input)
        row: usize,
        /// Width of the first row
        expected: usize,
        /// Width of this row
        found: usize,
    },

    /// A character with no tile mapping
    #[error("unknown tile {ch:?} at row {row}, column {column}")]
    UnknownTile {
        /// The character
        ch: char,
        /// Row (0 = top line of the input)
        row: usize,
        /// Column
        column: usize,
    },

    /// Cell size must be positive
    #[error("cell size must be > 0, got {0}")]
    InvalidCellSize(f32),
}

/// A dense grid of solid/empty cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    /// Layers per cell, row-major from the bottom row; `NONE` is empty
    cells: Vec<LayerMask>,
    /// Cells per row
    width: usize,
    /// Number of rows
    height: usize,
    /// World size of one cell edge
    cell_size: f32,
    /// World position of the bottom-left corner of cell (0, 0)
    origin: Vec2,
}

impl TileGrid {
    /// Creates an all-empty grid.
    pub fn new(width: usize, height: usize, cell_size: f32, origin: Vec2) -> Result<Self, TileGridError> {
        if width == 0 || height == 0 {
            return Err(TileGridError::Empty);
        }
        if !(cell_size > 0.0 && cell_size.is_finite()) {
            return Err(TileGridError::InvalidCellSize(cell_size));
        }

        Ok(Self {
            cells: vec![LayerMask::NONE; width * height],
            width,
            height,
            cell_size,
            origin,
        })
    }

    /// Builds a grid from text rows, the first row being the top of the level.
    ///
    /// `#` is a ground tile, `=` a platform tile, `.` and space are empty.
    pub fn from_ascii<S: AsRef<str>>(rows: &[S], cell_size: f32, origin: Vec2) -> Result<Self, TileGridError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().chars().count());
        let mut grid = Self::new(width, height, cell_size, origin)?;

        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(TileGridError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }

            let y = height - 1 - row;
            for (column, ch) in line.chars().enumerate() {
                let layers = match ch {
                    '#' => LayerMask::GROUND,
                    '=' => LayerMask::PLATFORM,
                    '.' | ' ' => LayerMask::NONE,
                    _ => return Err(TileGridError::UnknownTile { ch, row, column }),
                };
                grid.set(column as i64, y as i64, layers);
            }
        }

        debug!(
            "Built {}x{} tile grid ({} solid cells)",
            width,
            height,
            grid.cells.iter().filter(|c| !c.is_empty()).count()
        );
        Ok(grid)
    }

    /// Grid width in cells.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// World size of one cell.
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World-space bounds of the whole grid.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_min_size(
            self.origin,
            Vec2::new(self.width as f32, self.height as f32) * self.cell_size,
        )
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    /// Layers of the cell at `(x, y)`; `NONE` outside the grid.
    #[must_use]
    pub fn get(&self, x: i64, y: i64) -> LayerMask {
        self.index(x, y).map_or(LayerMask::NONE, |i| self.cells[i])
    }

    /// Sets the layers of a cell. Out-of-range writes are ignored.
    pub fn set(&mut self, x: i64, y: i64, layers: LayerMask) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = layers;
        }
    }

    /// Checks if a cell is solid on any layer in `mask`.
    #[must_use]
    pub fn is_solid(&self, x: i64, y: i64, mask: LayerMask) -> bool {
        self.get(x, y).intersects(mask)
    }

    /// Cell containing a world point.
    #[must_use]
    pub fn cell_at(&self, point: Vec2) -> (i64, i64) {
        let local = (point - self.origin) / self.cell_size;
        (local.x.floor() as i64, local.y.floor() as i64)
    }

    /// World-space bounds of a cell.
    #[must_use]
    pub fn cell_bounds(&self, x: i64, y: i64) -> Aabb {
        let min = self.origin + Vec2::new(x as f32, y as f32) * self.cell_size;
        Aabb::from_min_size(min, Vec2::splat(self.cell_size))
    }
}

/// Parametric span of a ray (in cell units) inside `[0, extent]`, clipped to
/// `[0, max_t]`, with the normal of the face it enters through.
fn clip_to_grid(start: Vec2, dir: Vec2, extent: Vec2, max_t: f32) -> Option<(f32, f32, Vec2)> {
    let mut enter = 0.0_f32;
    let mut exit = max_t;
    let mut normal = -dir;

    for axis in 0..2 {
        let (s, d, size) = (start[axis], dir[axis], extent[axis]);
        if d.abs() <= f32::EPSILON {
            if s < 0.0 || s >= size {
                return None;
            }
            continue;
        }

        let (near, far) = if d > 0.0 {
            (-s / d, (size - s) / d)
        } else {
            ((size - s) / d, -s / d)
        };
        if near > enter {
            enter = near;
            normal = Vec2::ZERO;
            normal[axis] = -d.signum();
        }
        exit = exit.min(far);
    }

    (enter <= exit).then_some((enter, exit, normal))
}

impl CollisionLayer for TileGrid {
    /// DDA traversal in cell units; returns the distance at which the ray
    /// enters the first solid cell.
    ///
    /// Everything outside the grid is empty, so the march only covers the
    /// part of the ray that lies inside it.
    fn cast_ray(&self, origin: Vec2, direction: Vec2, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec2::ZERO || !(max_distance > 0.0) {
            return None;
        }

        let start = (origin - self.origin) / self.cell_size;
        let extent = Vec2::new(self.width as f32, self.height as f32);
        let (enter, exit, mut normal) = clip_to_grid(start, dir, extent, max_distance / self.cell_size)?;

        let entry = start + dir * enter;
        let mut cell_x = entry.x.floor() as i64;
        let mut cell_y = entry.y.floor() as i64;
        if enter > 0.0 {
            // Entry lands on the boundary; snap onto the edge cell
            cell_x = cell_x.clamp(0, self.width as i64 - 1);
            cell_y = cell_y.clamp(0, self.height as i64 - 1);
        }

        let step_x = if dir.x.abs() > f32::EPSILON { (1.0 / dir.x).abs() } else { f32::MAX };
        let step_y = if dir.y.abs() > f32::EPSILON { (1.0 / dir.y).abs() } else { f32::MAX };

        let sign_x: i64 = if dir.x >= 0.0 { 1 } else { -1 };
        let sign_y: i64 = if dir.y >= 0.0 { 1 } else { -1 };

        let mut t_max_x = if dir.x.abs() > f32::EPSILON {
            let next = if dir.x >= 0.0 {
                (cell_x as f32 + 1.0 - entry.x) / dir.x
            } else {
                (entry.x - cell_x as f32) / -dir.x
            };
            enter + next.max(0.0)
        } else {
            f32::MAX
        };
        let mut t_max_y = if dir.y.abs() > f32::EPSILON {
            let next = if dir.y >= 0.0 {
                (cell_y as f32 + 1.0 - entry.y) / dir.y
            } else {
                (entry.y - cell_y as f32) / -dir.y
            };
            enter + next.max(0.0)
        } else {
            f32::MAX
        };

        let mut dist = enter;
        while dist <= exit {
            if self.is_solid(cell_x, cell_y, mask) {
                return Some(RayHit {
                    distance: dist * self.cell_size,
                    normal,
                });
            }

            if t_max_x < t_max_y {
                dist = t_max_x;
                t_max_x += step_x;
                cell_x += sign_x;
                normal = Vec2::new(-sign_x as f32, 0.0);
            } else {
                dist = t_max_y;
                t_max_y += step_y;
                cell_y += sign_y;
                normal = Vec2::new(0.0, -sign_y as f32);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level() -> TileGrid {
        TileGrid::from_ascii(
            &[
                "#........#",
                "#........#",
                "#...=....#",
                "##########",
            ],
            1.0,
            Vec2::ZERO,
        )
        .expect("valid level")
    }

    #[test]
    fn test_from_ascii_orientation() {
        let grid = level();
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 4);
        // Bottom row is the floor
        assert!(grid.is_solid(5, 0, LayerMask::ALL));
        // Platform tile is one row above the floor
        assert_eq!(grid.get(4, 1), LayerMask::PLATFORM);
        assert!(!grid.is_solid(5, 2, LayerMask::ALL));
    }

    #[test]
    fn test_from_ascii_errors() {
        assert!(matches!(
            TileGrid::from_ascii::<&str>(&[], 1.0, Vec2::ZERO),
            Err(TileGridError::Empty)
        ));
        assert!(matches!(
            TileGrid::from_ascii(&["..", "..."], 1.0, Vec2::ZERO),
            Err(TileGridError::RaggedRow { row: 1, .. })
        ));
        assert!(matches!(
            TileGrid::from_ascii(&[".x"], 1.0, Vec2::ZERO),
            Err(TileGridError::UnknownTile { ch: 'x', .. })
        ));
        assert!(matches!(
            TileGrid::from_ascii(&[".."], 0.0, Vec2::ZERO),
            Err(TileGridError::InvalidCellSize(_))
        ));
    }

    #[test]
    fn test_out_of_bounds_is_empty() {
        let grid = level();
        assert_eq!(grid.get(-1, 0), LayerMask::NONE);
        assert_eq!(grid.get(100, 100), LayerMask::NONE);
    }

    #[test]
    fn test_raycast_hit_wall() {
        let grid = level();
        let hit = grid
            .cast_ray(Vec2::new(5.5, 2.5), Vec2::X, 20.0, LayerMask::ALL)
            .expect("should have hit");
        assert!((hit.distance - 3.5).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_raycast_hit_floor() {
        let grid = level();
        let hit = grid
            .cast_ray(Vec2::new(6.5, 2.25), Vec2::NEG_Y, 5.0, LayerMask::ALL)
            .expect("should have hit");
        assert!((hit.distance - 1.25).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::Y);
    }

    #[test]
    fn test_raycast_miss_short() {
        let grid = level();
        assert!(grid
            .cast_ray(Vec2::new(5.5, 2.5), Vec2::X, 3.0, LayerMask::ALL)
            .is_none());
    }

    #[test]
    fn test_raycast_mask_filters_platform() {
        let grid = level();
        let hit = grid
            .cast_ray(Vec2::new(4.5, 3.5), Vec2::NEG_Y, 5.0, LayerMask::GROUND)
            .expect("floor below platform");
        assert!((hit.distance - 2.5).abs() < 1e-5);

        let hit = grid
            .cast_ray(Vec2::new(4.5, 3.5), Vec2::NEG_Y, 5.0, LayerMask::PLATFORM)
            .expect("platform");
        assert!((hit.distance - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_raycast_with_offset_and_scale() {
        let grid = TileGrid::from_ascii(&["..#"], 2.0, Vec2::new(100.0, 50.0)).expect("valid");
        let hit = grid
            .cast_ray(Vec2::new(101.0, 51.0), Vec2::X, 10.0, LayerMask::ALL)
            .expect("should have hit");
        assert!((hit.distance - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_raycast_starting_inside_solid() {
        let grid = level();
        let hit = grid
            .cast_ray(Vec2::new(0.5, 2.5), Vec2::X, 1.0, LayerMask::ALL)
            .expect("inside");
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn test_raycast_huge_distance_terminates() {
        let grid = level();
        // Nothing past the right wall; the march stops at the grid edge
        assert!(grid
            .cast_ray(Vec2::new(10.5, 2.5), Vec2::X, 1.0e8, LayerMask::ALL)
            .is_none());
        assert!(grid
            .cast_ray(Vec2::new(5.5, 2.5), Vec2::NEG_Y, f32::MAX, LayerMask::ALL)
            .is_some());
    }

    #[test]
    fn test_raycast_from_outside_grid() {
        let grid = level();
        let hit = grid
            .cast_ray(Vec2::new(-1.0e6, 0.5), Vec2::X, 2.0e6, LayerMask::ALL)
            .expect("should enter the floor row");
        assert!((hit.distance - 1.0e6).abs() < 1.0);
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));

        // Passes above the level
        assert!(grid
            .cast_ray(Vec2::new(-5.0, 10.0), Vec2::X, 100.0, LayerMask::ALL)
            .is_none());
        // Points away from it
        assert!(grid
            .cast_ray(Vec2::new(-5.0, 2.5), Vec2::NEG_X, 100.0, LayerMask::ALL)
            .is_none());
    }

    #[test]
    fn test_bounds() {
        let grid = level();
        let bounds = grid.bounds();
        assert_eq!(bounds.max, Vec2::new(10.0, 4.0));
        assert_eq!(grid.cell_bounds(2, 1).min, Vec2::new(2.0, 1.0));
        assert_eq!(grid.cell_at(Vec2::new(2.5, 1.9)), (2, 1));
    }
}
