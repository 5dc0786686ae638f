//! Simulation error types.
//!
//! The core is purely computational, so every error here is a contract
//! violation caught at a component boundary: bad geometry, bad tuning, or a
//! tuning document that does not parse.

use thiserror::Error;

/// Top-level error enum for the simulation core.
#[derive(Debug, Error)]
pub enum SimError {
    /// An obstacle or player rectangle with a non-positive or non-finite extent.
    #[error("invalid geometry for {what}: {width}x{height} (both extents must be finite and > 0)")]
    InvalidGeometry {
        what: &'static str,
        width: f32,
        height: f32,
    },

    /// A tuning constant is outside its safe operating range.
    #[error("tuning value '{name}' = {value} is outside safe range {expected}")]
    InvalidTuning {
        name: &'static str,
        value: f32,
        expected: &'static str,
    },

    /// A `[min, max]` tuning range with `min > max` or non-finite bounds.
    #[error("tuning range '{name}' is invalid: [{min}, {max}]")]
    InvalidRange { name: &'static str, min: f32, max: f32 },

    /// Tuning JSON could not be parsed.
    #[error("malformed tuning document: {0}")]
    Config(#[from] serde_json::Error),
}

/// Convenience alias: a `Result` using `SimError` as the error type.
pub type SimResult<T> = Result<T, SimError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Rejects non-finite or non-positive values.
pub fn require_positive(name: &'static str, value: f32) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidTuning {
            name,
            value,
            expected: "(0.0, ∞)",
        })
    }
}

/// Rejects values outside `[0, 1]`.
pub fn require_unit(name: &'static str, value: f32) -> SimResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::InvalidTuning {
            name,
            value,
            expected: "[0.0, 1.0]",
        })
    }
}

/// Rejects ranges that are inverted or not finite.
pub fn require_range(name: &'static str, min: f32, max: f32) -> SimResult<()> {
    if min.is_finite() && max.is_finite() && min <= max {
        Ok(())
    } else {
        Err(SimError::InvalidRange { name, min, max })
    }
}
