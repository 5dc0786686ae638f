//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering, storage or platform dependencies

pub mod collision;
pub mod events;
pub mod obstacle;
pub mod physics;
pub mod pool;
pub mod shaft;
pub mod state;
pub mod tick;

pub use collision::{CollisionBox, CollisionDetector, CollisionTuning, Ellipse};
pub use events::{EventEffect, EventKind, EventManager, EventModifiers, EventTuning, Monster, ShaftEvent};
pub use obstacle::{Obstacle, ObstacleKind, ObstacleTuning, ObstacleType, create_random_obstacle};
pub use physics::{PhysicsConfig, PhysicsEngine};
pub use pool::SegmentPool;
pub use shaft::{ShaftGenerator, ShaftSegment, ShaftTuning};
pub use state::{
    DifficultyConfig, DifficultyTuning, GamePhase, GameState, GameStats, Player, SessionTuning,
};
pub use tick::{TickInput, tick};
