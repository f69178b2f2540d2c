//! # Ledge Gameplay
//!
//! Kinematic character movement for side-on platformers.
//!
//! This crate provides the two halves of the movement core and the pieces
//! that sit around them:
//! - Raycast collision resolver (`controller`)
//! - Motion controller state machine (`motion`, `state`, `jump`)
//! - Movement tunables (`config`)
//! - Animation collaborator seam (`animation`)
//! - Input shim with jump buffering (`input`)
//! - The `Actor` record tying them together

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod actor;
pub mod animation;
pub mod config;
pub mod controller;
pub mod input;
pub mod jump;
pub mod motion;
pub mod state;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::actor::*;
    pub use crate::animation::*;
    pub use crate::config::*;
    pub use crate::controller::*;
    pub use crate::input::*;
    pub use crate::jump::*;
    pub use crate::motion::*;
    pub use crate::state::*;
}

pub use prelude::*;
