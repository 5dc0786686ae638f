//! High score tracking
//!
//! The simulation only needs the best score at session start and a place to
//! report the finished run; storage backends implement [`HighScoreStore`].

use serde::{Deserialize, Serialize};

use crate::sim::GameStats;

/// Where finished runs are recorded
pub trait HighScoreStore {
    /// Best score recorded so far (0 when empty)
    fn best(&self) -> u64;

    /// Report a finished run
    fn record(&mut self, stats: &GameStats);
}

/// Single best score kept in memory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryHighScore {
    best: u64,
}

impl MemoryHighScore {
    pub fn new(best: u64) -> Self {
        Self { best }
    }
}

impl HighScoreStore for MemoryHighScore {
    fn best(&self) -> u64 {
        self.best
    }

    fn record(&mut self, stats: &GameStats) {
        self.best = self.best.max(stats.score);
    }
}
