//! # Ledge Common
//!
//! Common types, utilities, and shared abstractions for Ledge.
//!
//! This crate provides foundational types used across all Ledge subsystems:
//! - Geometry types (`Vec2`, axis-aligned boxes, facing direction)
//! - Damping math for velocity smoothing
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod geometry;
pub mod math;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::geometry::*;
    pub use crate::math::*;
}

pub use prelude::*;
