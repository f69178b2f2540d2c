//! Error types for Ledge.

use thiserror::Error;

/// Top-level error type for Ledge operations.
#[derive(Debug, Error)]
pub enum LedgeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Collision resolver errors
    #[error("Collision error: {0}")]
    Collision(#[from] CollisionError),
}

/// Tunables that would make the simulation produce non-finite numbers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A field is outside the range the physics can work with
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for a field that must be strictly positive and finite.
    #[must_use]
    pub fn not_positive(field: &'static str, value: f32) -> Self {
        Self::InvalidValue {
            field,
            reason: format!("expected a finite value > 0, got {value}"),
        }
    }
}

/// Collision resolver errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollisionError {
    /// The skin-shrunk box has no area to distribute rays over
    #[error("degenerate bounding box after skin shrink: {width} x {height}")]
    DegenerateBox {
        /// Shrunk width
        width: f32,
        /// Shrunk height
        height: f32,
    },

    /// A displacement component was NaN or infinite
    #[error("proposed displacement is not finite")]
    NonFiniteDisplacement,
}

/// Result type alias for Ledge operations.
pub type LedgeResult<T> = Result<T, LedgeError>;
