//! # Ledge Kernel
//!
//! The static collision layer the movement core queries.
//!
//! This crate owns everything about level geometry that the gameplay crate
//! must not: how solids are stored, which layers they belong to, and how a
//! ray is marched through them. Gameplay only sees the [`CollisionLayer`]
//! trait.
//!
//! ## Layers
//!
//! - [`StaticGeometry`]: an unordered list of boxes, queried with a slab test
//! - [`TileGrid`]: a dense cell grid, queried with a DDA traversal
//!
//! Both are read-only during movement ticks; nothing here is mutated by a
//! ray query.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod layer;
pub mod static_geometry;
pub mod tilemap;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::layer::*;
    pub use crate::static_geometry::*;
    pub use crate::tilemap::*;
}

pub use prelude::*;
