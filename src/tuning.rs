//! Data-driven game balance
//!
//! Every magic number of the simulation, grouped per component. All groups
//! are `#[serde(default)]`, so a tuning document only needs the values it
//! overrides.

use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::sim::collision::CollisionTuning;
use crate::sim::events::EventTuning;
use crate::sim::obstacle::ObstacleTuning;
use crate::sim::physics::PhysicsConfig;
use crate::sim::shaft::ShaftTuning;
use crate::sim::state::{DifficultyTuning, SessionTuning};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub physics: PhysicsConfig,
    pub collision: CollisionTuning,
    pub obstacles: ObstacleTuning,
    pub shaft: ShaftTuning,
    pub events: EventTuning,
    pub difficulty: DifficultyTuning,
    pub session: SessionTuning,
}

impl Tuning {
    /// Parse a (possibly partial) tuning document and validate it
    pub fn from_json(json: &str) -> SimResult<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> SimResult<()> {
        self.physics.validate()?;
        self.collision.validate()?;
        self.obstacles.validate()?;
        self.shaft.validate()?;
        self.events.validate()?;
        self.difficulty.validate()?;
        self.session.validate()?;
        Ok(())
    }
}
