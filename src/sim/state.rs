//! Game state and core simulation types
//!
//! Everything a session needs to advance deterministically lives here: the
//! player, the live shaft segments, the event manager and the run stats.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::CollisionDetector;
use super::events::{EventKind, EventManager};
use super::physics::PhysicsEngine;
use super::pool::SegmentPool;
use super::shaft::{ShaftGenerator, ShaftSegment};
use crate::consts::*;
use crate::error::{SimResult, require_positive, require_range};
use crate::highscores::HighScoreStore;
use crate::tuning::Tuning;
use crate::{Size, is_valid_dt};

/// Mixed into the session seed for the event RNG stream
const EVENT_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the player to start a run
    Menu,
    /// Active gameplay
    Playing,
    /// Active gameplay with a shaft event running
    EventActive,
    /// Game is paused
    Paused,
    /// Run ended
    GameOver,
}

/// The player capsule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner, screen space
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: Size,
    pub health: u32,
    pub max_health: u32,
    pub can_jump: bool,
    pub is_dashing: bool,
    pub is_crouching: bool,
    /// Height removed by the current crouch, restored on stand
    pub crouch_delta: f32,
}

impl Player {
    pub fn new(position: Vec2, max_health: u32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            size: Size::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            health: max_health,
            max_health,
            can_jump: true,
            is_dashing: false,
            is_crouching: false,
            crouch_delta: 0.0,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.position + Vec2::new(self.size.width / 2.0, self.size.height / 2.0)
    }

    /// Y of the feet
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.height
    }

    /// Copy of the player shifted by `offset` (screen to world space)
    pub fn offset_by(&self, offset: Vec2) -> Self {
        Self {
            position: self.position + offset,
            ..*self
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// Run statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub score: u64,
    pub floors: u32,
    /// Distance climbed (world units)
    pub distance: f32,
    pub time_alive: f32,
    pub near_misses: u32,
    pub perfect_segments: u32,
    pub high_score: u64,
}

/// Difficulty values derived from time alive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyConfig {
    /// Ramp position in `[0, max_level]`, also used as segment difficulty
    pub level: f32,
    pub base_speed: f32,
    pub speed_multiplier: f32,
    pub obstacle_frequency: f32,
    pub event_frequency: f32,
    /// Seconds of warning the player gets (shrinks with level)
    pub reaction_time: f32,
}

impl DifficultyConfig {
    /// Elevator climb speed before event modifiers
    #[inline]
    pub fn elevator_speed(&self) -> f32 {
        self.base_speed * self.speed_multiplier
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTuning {
    /// Seconds alive per difficulty level
    pub seconds_per_level: f32,
    pub max_level: f32,
    pub speed_per_level: f32,
    pub obstacle_frequency_per_level: f32,
    pub base_event_frequency: f32,
    pub event_frequency_per_level: f32,
    pub base_reaction_time: f32,
    pub reaction_time_per_level: f32,
    pub min_reaction_time: f32,
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        Self {
            seconds_per_level: 60.0,
            max_level: 3.0,
            speed_per_level: 0.5,
            obstacle_frequency_per_level: 0.3,
            base_event_frequency: 0.5,
            event_frequency_per_level: 0.2,
            base_reaction_time: 2.0,
            reaction_time_per_level: 0.3,
            min_reaction_time: 1.0,
        }
    }
}

impl DifficultyTuning {
    pub fn validate(&self) -> SimResult<()> {
        require_positive("difficulty.seconds_per_level", self.seconds_per_level)?;
        require_range("difficulty.max_level", 0.0, self.max_level)?;
        require_range("difficulty.speed_per_level", 0.0, self.speed_per_level)?;
        require_range(
            "difficulty.obstacle_frequency_per_level",
            0.0,
            self.obstacle_frequency_per_level,
        )?;
        require_range("difficulty.event_frequency_per_level", 0.0, self.event_frequency_per_level)?;
        require_range("difficulty.reaction_time_per_level", 0.0, self.reaction_time_per_level)?;
        require_range("difficulty.reaction_time", self.min_reaction_time, self.base_reaction_time)?;
        Ok(())
    }

    /// Difficulty after `time_alive` seconds
    pub fn at_time(&self, time_alive: f32, base_speed: f32) -> DifficultyConfig {
        let level = (time_alive.max(0.0) / self.seconds_per_level).min(self.max_level);
        DifficultyConfig {
            level,
            base_speed,
            speed_multiplier: 1.0 + level * self.speed_per_level,
            obstacle_frequency: 1.0 + level * self.obstacle_frequency_per_level,
            event_frequency: self.base_event_frequency + level * self.event_frequency_per_level,
            reaction_time: (self.base_reaction_time - level * self.reaction_time_per_level)
                .max(self.min_reaction_time),
        }
    }
}

/// Session layout and scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    pub player_start: Vec2,
    pub max_health: u32,
    /// Elevator floor (screen space)
    pub ground_y: f32,
    pub base_elevator_speed: f32,
    pub initial_segments: usize,
    pub distance_per_point: f32,
    pub distance_per_floor: f32,
    pub near_miss_bonus: u64,
    pub perfect_segment_bonus: u64,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            player_start: Vec2::new(PLAYER_START_X, PLAYER_START_Y),
            max_health: PLAYER_MAX_HEALTH,
            ground_y: GROUND_Y,
            base_elevator_speed: BASE_ELEVATOR_SPEED,
            initial_segments: 4,
            distance_per_point: 10.0,
            distance_per_floor: 150.0,
            near_miss_bonus: 50,
            perfect_segment_bonus: 100,
        }
    }
}

impl SessionTuning {
    pub fn validate(&self) -> SimResult<()> {
        if self.max_health == 0 {
            return Err(crate::SimError::InvalidTuning {
                name: "session.max_health",
                value: 0.0,
                expected: "at least 1",
            });
        }
        require_positive("session.ground_y", self.ground_y)?;
        require_positive("session.base_elevator_speed", self.base_elevator_speed)?;
        require_positive("session.distance_per_point", self.distance_per_point)?;
        require_positive("session.distance_per_floor", self.distance_per_floor)?;
        Ok(())
    }
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub phase: GamePhase,
    pub player: Player,
    pub physics: PhysicsEngine,
    pub collision: CollisionDetector,
    /// Live segments, world space
    pub segments: Vec<ShaftSegment>,
    pub pool: SegmentPool,
    pub events: EventManager,
    pub difficulty: DifficultyConfig,
    pub stats: GameStats,
    /// World y at the top of the screen; decreases as the elevator climbs
    pub camera_y: f32,
    /// Most recent event started, for notifications
    pub last_event: Option<EventKind>,
    pub tuning: Tuning,
    /// Obstacles that already dealt damage
    pub(crate) hit_obstacles: HashSet<u32>,
    /// Obstacles that already paid a near-miss bonus
    pub(crate) near_missed: HashSet<u32>,
    /// Obstacles currently inside near-miss range
    pub(crate) near_pending: HashSet<u32>,
    /// Segments where the player took a hit
    pub(crate) hit_segments: HashSet<u32>,
    pub(crate) monster_contact: bool,
}

impl GameState {
    /// Build a session in the menu phase
    pub fn new(seed: u64, tuning: Tuning, high_score: u64) -> SimResult<Self> {
        tuning.validate()?;

        let generator = ShaftGenerator::new(seed, tuning.shaft.clone(), tuning.obstacles.clone())?;
        let events = EventManager::new(seed ^ EVENT_SEED_SALT, tuning.events.clone())?;
        let player = Player::new(tuning.session.player_start, tuning.session.max_health);
        let difficulty = tuning.difficulty.at_time(0.0, tuning.session.base_elevator_speed);

        let mut state = Self {
            seed,
            phase: GamePhase::Menu,
            player,
            physics: PhysicsEngine::new(tuning.physics.clone()),
            collision: CollisionDetector::new(tuning.collision.clone()),
            segments: Vec::new(),
            pool: SegmentPool::new(generator),
            events,
            difficulty,
            stats: GameStats {
                high_score,
                ..Default::default()
            },
            camera_y: 0.0,
            last_event: None,
            tuning,
            hit_obstacles: HashSet::new(),
            near_missed: HashSet::new(),
            near_pending: HashSet::new(),
            hit_segments: HashSet::new(),
            monster_contact: false,
        };
        state.spawn_initial_segments();
        Ok(state)
    }

    fn spawn_initial_segments(&mut self) {
        let height = self.pool.generator().segment_height();
        let count = self.tuning.session.initial_segments;
        self.segments = self
            .pool
            .generator_mut()
            .generate_initial_segments(count, -height);
    }

    /// Menu -> Playing
    pub fn start(&mut self) {
        if self.phase == GamePhase::Menu {
            self.phase = GamePhase::Playing;
            log::info!("Run started (seed {})", self.seed);
        }
    }

    /// Discard the run and return to the menu, keeping the high score.
    /// Resetting twice leaves the same state as resetting once.
    pub fn reset(&mut self) {
        let session = &self.tuning.session;
        self.phase = GamePhase::Menu;
        self.player = Player::new(session.player_start, session.max_health);
        self.physics.reset();
        self.difficulty = self.tuning.difficulty.at_time(0.0, session.base_elevator_speed);
        self.stats = GameStats {
            high_score: self.stats.high_score,
            ..Default::default()
        };
        self.camera_y = 0.0;
        self.last_event = None;
        self.hit_obstacles.clear();
        self.near_missed.clear();
        self.near_pending.clear();
        self.hit_segments.clear();
        self.monster_contact = false;

        self.events.reseed(self.seed ^ EVENT_SEED_SALT);
        self.pool.clear();
        self.pool.generator_mut().reseed(self.seed);
        self.spawn_initial_segments();
        log::debug!("Session reset");
    }

    /// Toggle pause; returns to `EventActive` if an event is still running
    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            GamePhase::Playing | GamePhase::EventActive => GamePhase::Paused,
            GamePhase::Paused => self.running_phase(),
            other => other,
        };
    }

    /// Playing or EventActive depending on the event manager
    pub(crate) fn running_phase(&self) -> GamePhase {
        if self.events.active_event().is_some() {
            GamePhase::EventActive
        } else {
            GamePhase::Playing
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, GamePhase::Playing | GamePhase::EventActive)
    }

    /// Subtract health; reaching zero ends the run
    pub fn damage_player(&mut self, amount: u32) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.player.health = self.player.health.saturating_sub(amount);
        log::debug!("Player took {} damage, health {}", amount, self.player.health);
        if self.player.health == 0 {
            self.phase = GamePhase::GameOver;
            self.stats.high_score = self.stats.high_score.max(self.stats.score);
            log::info!(
                "Run over: score {} floors {} time {:.1}s",
                self.stats.score,
                self.stats.floors,
                self.stats.time_alive
            );
        }
    }

    pub fn heal_player(&mut self, amount: u32) {
        self.player.health = self.player.health.saturating_add(amount).min(self.player.max_health);
    }

    /// Finish the run and record it. Returns true on a new high score.
    pub fn end_game(&mut self, store: &mut impl HighScoreStore) -> bool {
        self.phase = GamePhase::GameOver;
        let previous = store.best();
        let is_record = self.stats.score > previous;
        store.record(&self.stats);
        self.stats.high_score = previous.max(self.stats.score);
        if is_record {
            log::info!("New high score: {}", self.stats.score);
        }
        is_record
    }

    /// Re-derive score and floors from the raw counters
    pub(crate) fn refresh_score(&mut self) {
        let session = &self.tuning.session;
        let distance = self.stats.distance.max(0.0);
        self.stats.floors = (distance / session.distance_per_floor).floor() as u32;
        self.stats.score = (distance / session.distance_per_point).floor() as u64
            + session.near_miss_bonus * self.stats.near_misses as u64
            + session.perfect_segment_bonus * self.stats.perfect_segments as u64;
    }

    /// Ramp difficulty after `dt` more seconds alive
    pub(crate) fn advance_clock(&mut self, dt: f32) {
        if !is_valid_dt(dt) {
            return;
        }
        self.stats.time_alive += dt;
        self.difficulty = self
            .tuning
            .difficulty
            .at_time(self.stats.time_alive, self.tuning.session.base_elevator_speed);
    }

    /// Player shifted into world space
    pub fn world_player(&self) -> Player {
        self.player.offset_by(Vec2::new(0.0, self.camera_y))
    }

    /// Topmost live segment's y, if any
    pub fn top_segment_y(&self) -> Option<f32> {
        self.segments.iter().map(|s| s.position.y).reduce(f32::min)
    }

    pub fn obstacle_count(&self) -> usize {
        self.segments.iter().map(|s| s.obstacles.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::MemoryHighScore;

    fn state() -> GameState {
        GameState::new(7, Tuning::default(), 0).unwrap()
    }

    #[test]
    fn test_new_state_in_menu() {
        let state = state();
        assert_eq!(state.phase, GamePhase::Menu);
        assert_eq!(state.player.health, PLAYER_MAX_HEALTH);
        assert_eq!(state.segments.len(), 4);
        assert_eq!(state.top_segment_y(), Some(-4.0 * SEGMENT_HEIGHT));
    }

    #[test]
    fn test_start_and_pause_toggle() {
        let mut state = state();
        state.toggle_pause();
        assert_eq!(state.phase, GamePhase::Menu);
        state.start();
        assert_eq!(state.phase, GamePhase::Playing);
        state.toggle_pause();
        assert_eq!(state.phase, GamePhase::Paused);
        state.events.activate(EventKind::PowerCut);
        state.toggle_pause();
        assert_eq!(state.phase, GamePhase::EventActive);
    }

    #[test]
    fn test_damage_to_zero_ends_run() {
        let mut state = state();
        state.start();
        state.damage_player(30);
        assert_eq!(state.player.health, 70);
        assert_eq!(state.phase, GamePhase::Playing);
        state.damage_player(500);
        assert_eq!(state.player.health, 0);
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut state = state();
        state.damage_player(40);
        state.heal_player(25);
        assert_eq!(state.player.health, 85);
        state.heal_player(1000);
        assert_eq!(state.player.health, PLAYER_MAX_HEALTH);
    }

    #[test]
    fn test_score_formula() {
        let mut state = state();
        state.stats.distance = 1234.0;
        state.stats.near_misses = 2;
        state.stats.perfect_segments = 3;
        state.refresh_score();
        assert_eq!(state.stats.score, 123 + 100 + 300);
        assert_eq!(state.stats.floors, 8);
    }

    #[test]
    fn test_difficulty_ramp() {
        let tuning = DifficultyTuning::default();
        let start = tuning.at_time(0.0, 100.0);
        assert_eq!(start.level, 0.0);
        assert_eq!(start.speed_multiplier, 1.0);
        assert_eq!(start.reaction_time, 2.0);
        assert_eq!(start.elevator_speed(), 100.0);

        let mid = tuning.at_time(90.0, 100.0);
        assert!((mid.level - 1.5).abs() < 1e-6);
        assert!((mid.speed_multiplier - 1.75).abs() < 1e-6);
        assert!((mid.obstacle_frequency - 1.45).abs() < 1e-6);
        assert!((mid.event_frequency - 0.8).abs() < 1e-6);

        let capped = tuning.at_time(10_000.0, 100.0);
        assert_eq!(capped.level, 3.0);
        assert_eq!(capped.speed_multiplier, 2.5);
        assert!((capped.reaction_time - 1.1).abs() < 1e-5);
    }

    #[test]
    fn test_reset_is_repeatable() {
        let mut state = state();
        state.start();
        state.camera_y = -3000.0;
        state.stats.distance = 3000.0;
        state.stats.high_score = 900;
        state.damage_player(10);
        state.events.activate(EventKind::MonsterEncounter);

        state.reset();
        let once: Vec<_> = state.segments.clone();
        assert_eq!(state.phase, GamePhase::Menu);
        assert_eq!(state.player.health, PLAYER_MAX_HEALTH);
        assert_eq!(state.stats.distance, 0.0);
        assert_eq!(state.stats.high_score, 900);
        assert!(state.events.active_event().is_none());
        assert!(state.pool.is_empty());

        state.reset();
        assert_eq!(state.segments, once);
        assert_eq!(once, GameState::new(7, Tuning::default(), 0).unwrap().segments);
    }

    #[test]
    fn test_end_game_records_high_score() {
        let mut store = MemoryHighScore::new(100);
        let mut state = GameState::new(1, Tuning::default(), store.best()).unwrap();
        state.start();
        state.stats.score = 250;
        assert!(state.end_game(&mut store));
        assert_eq!(store.best(), 250);
        assert_eq!(state.stats.high_score, 250);
        assert_eq!(state.phase, GamePhase::GameOver);

        let mut state = GameState::new(1, Tuning::default(), store.best()).unwrap();
        state.stats.score = 10;
        assert!(!state.end_game(&mut store));
        assert_eq!(store.best(), 250);
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let mut tuning = Tuning::default();
        tuning.session.max_health = 0;
        assert!(GameState::new(1, tuning, 0).is_err());
    }

    #[test]
    fn test_offset_by_moves_position_only() {
        let player = Player::new(Vec2::new(180.0, 400.0), 100);
        let shifted = player.offset_by(Vec2::new(0.0, -1000.0));
        assert_eq!(shifted.position, Vec2::new(180.0, -600.0));
        assert_eq!(shifted.size, player.size);
        assert_eq!(shifted.bottom(), -530.0);
    }
}
