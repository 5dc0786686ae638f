//! Endless Elevator - simulation core for a vertical shaft dodging game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, obstacles, shaft, events)
//! - `tuning`: Data-driven game balance
//! - `highscores`: High score persistence seam
//! - `error`: Contract violations raised at component boundaries

pub mod error;
pub mod highscores;
pub mod sim;
pub mod tuning;

pub use error::{SimError, SimResult};
pub use highscores::{HighScoreStore, MemoryHighScore};
pub use tuning::Tuning;

use serde::{Deserialize, Serialize};

/// Game configuration constants (defaults for [`Tuning`])
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum simulation substeps per rendered frame
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Player defaults
    pub const PLAYER_START_X: f32 = 180.0;
    pub const PLAYER_START_Y: f32 = 400.0;
    pub const PLAYER_WIDTH: f32 = 50.0;
    pub const PLAYER_HEIGHT: f32 = 70.0;
    pub const PLAYER_CROUCH_HEIGHT: f32 = 35.0;
    pub const PLAYER_MAX_HEALTH: u32 = 100;

    /// Elevator floor the player stands on (screen space)
    pub const GROUND_Y: f32 = 470.0;

    /// Horizontal track walls
    pub const TRACK_MIN_X: f32 = 50.0;
    pub const TRACK_MAX_X: f32 = 350.0;

    /// Movement tuning
    pub const GRAVITY: f32 = 1300.0;
    pub const JUMP_FORCE: f32 = -600.0;
    pub const DASH_SPEED: f32 = 350.0;
    pub const DASH_DURATION: f32 = 0.2;
    pub const MOVE_SPEED: f32 = 210.0;
    pub const AIR_CONTROL: f32 = 0.6;
    pub const GROUND_FRICTION: f32 = 0.86;
    pub const AIR_FRICTION: f32 = 0.94;
    pub const JUMP_BUFFER_TIME: f32 = 0.14;
    pub const COYOTE_TIME: f32 = 0.10;

    /// Shaft layout
    pub const SEGMENT_HEIGHT: f32 = 500.0;
    /// Distance behind the camera after which a segment is retired
    pub const SEGMENT_REMOVAL_DISTANCE: f32 = 800.0;
    /// Maximum retired segments kept for reuse
    pub const SEGMENT_POOL_CAPACITY: usize = 10;

    /// Elevator base climb speed (units/s)
    pub const BASE_ELEVATOR_SPEED: f32 = 100.0;
}

/// Width/height pair used for every rectangle in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when both extents are finite and strictly positive
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Closed numeric interval `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Uniform sample in `[min, max)`; degenerate spans return `min`
    pub fn sample<R: rand::Rng>(&self, rng: &mut R) -> f32 {
        self.min + rng.random::<f32>() * (self.max - self.min)
    }

    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// Positions and velocities are plain 2D vectors
pub type Position = glam::Vec2;

/// Horizontal direction for dashes and ping-pong movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    Left,
    #[default]
    Right,
}

impl Direction {
    /// -1.0 for left, +1.0 for right
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Frame deltas must be positive and finite; anything else is ignored
#[inline]
pub fn is_valid_dt(dt: f32) -> bool {
    dt.is_finite() && dt > 0.0
}
