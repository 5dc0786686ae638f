//! Random shaft events
//!
//! A fixed roster of events, each with a duration and a selection weight. The
//! [`EventManager`] decides when one fires and is the only thing that can put
//! an event into the active state, so at most one is active at a time.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::CollisionBox;
use crate::error::{SimResult, require_positive, require_range, require_unit};
use crate::{Size, Span, is_valid_dt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    PowerCut,
    MonsterEncounter,
    TrapMode,
    SpeedBoost,
}

impl EventKind {
    /// Roster order
    pub const ALL: [EventKind; 4] = [
        EventKind::PowerCut,
        EventKind::MonsterEncounter,
        EventKind::TrapMode,
        EventKind::SpeedBoost,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EventKind::PowerCut => "Power Cut",
            EventKind::MonsterEncounter => "Monster Encounter",
            EventKind::TrapMode => "Trap Mode Activated",
            EventKind::SpeedBoost => "Speed Boost",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            EventKind::PowerCut => "Limited vision! Watch out for hidden obstacles.",
            EventKind::MonsterEncounter => "Something is in the shaft with you!",
            EventKind::TrapMode => "Multiple traps activating simultaneously!",
            EventKind::SpeedBoost => "The elevator lurches upward!",
        }
    }
}

/// Duration and selection weight of one roster entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EventProfile {
    pub duration: f32,
    pub weight: f32,
}

/// The hazard that roams the shaft during a monster encounter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterTuning {
    pub start: Vec2,
    pub speed: f32,
    /// Horizontal patrol bounds (screen space)
    pub bounds: Span,
    pub size: Size,
    pub damage: u32,
}

impl Default for MonsterTuning {
    fn default() -> Self {
        Self {
            start: Vec2::new(-100.0, 300.0),
            speed: 50.0,
            bounds: Span::new(-100.0, 500.0),
            size: Size::new(60.0, 60.0),
            damage: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTuning {
    /// Chance per eligible tick that an event fires
    pub trigger_chance: f32,
    pub cooldown_duration: f32,
    /// Minimum game time between two triggers
    pub min_interval: f32,
    pub power_cut: EventProfile,
    pub monster_encounter: EventProfile,
    pub trap_mode: EventProfile,
    pub speed_boost: EventProfile,
    pub power_cut_visibility: f32,
    pub trap_difficulty_bonus: f32,
    pub speed_boost_multiplier: f32,
    pub monster: MonsterTuning,
}

impl Default for EventTuning {
    fn default() -> Self {
        Self {
            trigger_chance: 0.02,
            cooldown_duration: 10.0,
            min_interval: 10.0,
            power_cut: EventProfile { duration: 5.0, weight: 0.3 },
            monster_encounter: EventProfile { duration: 8.0, weight: 0.2 },
            trap_mode: EventProfile { duration: 6.0, weight: 0.25 },
            speed_boost: EventProfile { duration: 4.0, weight: 0.25 },
            power_cut_visibility: 0.35,
            trap_difficulty_bonus: 0.5,
            speed_boost_multiplier: 1.5,
            monster: MonsterTuning::default(),
        }
    }
}

impl EventTuning {
    pub fn validate(&self) -> SimResult<()> {
        require_unit("events.trigger_chance", self.trigger_chance)?;
        require_range("events.cooldown_duration", 0.0, self.cooldown_duration)?;
        require_range("events.min_interval", 0.0, self.min_interval)?;
        for (name, profile) in [
            ("events.power_cut.duration", self.power_cut),
            ("events.monster_encounter.duration", self.monster_encounter),
            ("events.trap_mode.duration", self.trap_mode),
            ("events.speed_boost.duration", self.speed_boost),
        ] {
            require_positive(name, profile.duration)?;
            require_range(name, 0.0, profile.weight)?;
        }
        require_unit("events.power_cut_visibility", self.power_cut_visibility)?;
        require_positive("events.speed_boost_multiplier", self.speed_boost_multiplier)?;
        require_range("events.monster.bounds", self.monster.bounds.min, self.monster.bounds.max)?;
        if !self.monster.size.is_valid() {
            return Err(crate::SimError::InvalidGeometry {
                what: "monster",
                width: self.monster.size.width,
                height: self.monster.size.height,
            });
        }
        Ok(())
    }

    fn profile(&self, kind: EventKind) -> EventProfile {
        match kind {
            EventKind::PowerCut => self.power_cut,
            EventKind::MonsterEncounter => self.monster_encounter,
            EventKind::TrapMode => self.trap_mode,
            EventKind::SpeedBoost => self.speed_boost,
        }
    }
}

/// Monster hazard state, bouncing between its patrol bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: Size,
    pub damage: u32,
    bounds: Span,
    start: Vec2,
    speed: f32,
}

impl Monster {
    fn new(tuning: &MonsterTuning) -> Self {
        Self {
            position: tuning.start,
            velocity: Vec2::new(tuning.speed, 0.0),
            size: tuning.size,
            damage: tuning.damage,
            bounds: tuning.bounds,
            start: tuning.start,
            speed: tuning.speed,
        }
    }

    fn reset(&mut self) {
        self.position = self.start;
        self.velocity = Vec2::new(self.speed, 0.0);
    }

    fn update(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        if self.position.x >= self.bounds.max {
            self.position.x = self.bounds.max;
            self.velocity.x = -self.speed;
        } else if self.position.x <= self.bounds.min {
            self.position.x = self.bounds.min;
            self.velocity.x = self.speed;
        }
    }

    pub fn hitbox(&self) -> CollisionBox {
        CollisionBox::new(self.position.x, self.position.y, self.size.width, self.size.height)
    }
}

/// What an event does while it is active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventEffect {
    PowerCut { visibility: f32 },
    MonsterEncounter(Monster),
    TrapMode { difficulty_bonus: f32 },
    SpeedBoost { multiplier: f32 },
}

/// One roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaftEvent {
    pub duration: f32,
    /// Relative selection weight
    pub weight: f32,
    active: bool,
    elapsed: f32,
    pub effect: EventEffect,
}

impl ShaftEvent {
    fn new(kind: EventKind, tuning: &EventTuning) -> Self {
        let profile = tuning.profile(kind);
        let effect = match kind {
            EventKind::PowerCut => EventEffect::PowerCut {
                visibility: tuning.power_cut_visibility,
            },
            EventKind::MonsterEncounter => EventEffect::MonsterEncounter(Monster::new(&tuning.monster)),
            EventKind::TrapMode => EventEffect::TrapMode {
                difficulty_bonus: tuning.trap_difficulty_bonus,
            },
            EventKind::SpeedBoost => EventEffect::SpeedBoost {
                multiplier: tuning.speed_boost_multiplier,
            },
        };
        Self {
            duration: profile.duration,
            weight: profile.weight,
            active: false,
            elapsed: 0.0,
            effect,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self.effect {
            EventEffect::PowerCut { .. } => EventKind::PowerCut,
            EventEffect::MonsterEncounter(_) => EventKind::MonsterEncounter,
            EventEffect::TrapMode { .. } => EventKind::TrapMode,
            EventEffect::SpeedBoost { .. } => EventKind::SpeedBoost,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    pub fn monster(&self) -> Option<&Monster> {
        match &self.effect {
            EventEffect::MonsterEncounter(monster) if self.active => Some(monster),
            _ => None,
        }
    }

    // Only the manager activates, which keeps activation exclusive
    fn activate(&mut self) {
        self.active = true;
        self.elapsed = 0.0;
        if let EventEffect::MonsterEncounter(monster) = &mut self.effect {
            monster.reset();
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.elapsed = 0.0;
    }

    /// Advance the effect; true once the duration has run out
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.active || !is_valid_dt(dt) {
            return false;
        }
        self.elapsed += dt;
        if let EventEffect::MonsterEncounter(monster) = &mut self.effect {
            monster.update(dt);
        }
        self.elapsed >= self.duration
    }
}

/// Modifiers the session driver applies while an event runs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventModifiers {
    pub speed_multiplier: f32,
    /// 1.0 is full visibility; consumed by the renderer
    pub visibility: f32,
    pub difficulty_bonus: f32,
}

impl Default for EventModifiers {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            visibility: 1.0,
            difficulty_bonus: 0.0,
        }
    }
}

/// Schedules roster events
#[derive(Debug, Clone)]
pub struct EventManager {
    events: Vec<ShaftEvent>,
    tuning: EventTuning,
    cooldown: f32,
    last_event_time: f32,
    rng: Pcg32,
}

impl EventManager {
    pub fn new(seed: u64, tuning: EventTuning) -> SimResult<Self> {
        tuning.validate()?;
        Ok(Self::build(seed, tuning))
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::build(seed, EventTuning::default())
    }

    fn build(seed: u64, tuning: EventTuning) -> Self {
        let events = EventKind::ALL.iter().map(|&kind| ShaftEvent::new(kind, &tuning)).collect();
        Self {
            events,
            tuning,
            cooldown: 0.0,
            last_event_time: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn events(&self) -> &[ShaftEvent] {
        &self.events
    }

    pub fn event(&self, kind: EventKind) -> Option<&ShaftEvent> {
        self.events.iter().find(|e| e.kind() == kind)
    }

    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    /// Poll the scheduler. Returns the event the caller should activate.
    pub fn update(&mut self, dt: f32, game_time: f32) -> Option<EventKind> {
        if !is_valid_dt(dt) {
            return None;
        }

        if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - dt).max(0.0);
            return None;
        }

        if game_time - self.last_event_time < self.tuning.min_interval {
            return None;
        }

        if self.rng.random::<f32>() < self.tuning.trigger_chance {
            let kind = self.select_random_event()?;
            self.last_event_time = game_time;
            self.cooldown = self.tuning.cooldown_duration;
            log::debug!("Event scheduler picked {:?} at t={:.1}s", kind, game_time);
            return Some(kind);
        }

        None
    }

    /// Cumulative-weight scan over the roster
    fn select_random_event(&mut self) -> Option<EventKind> {
        let total: f32 = self.events.iter().map(|e| e.weight).sum();
        if total <= 0.0 {
            return None;
        }
        let mut remaining = self.rng.random::<f32>() * total;

        for event in &self.events {
            if event.weight <= 0.0 {
                continue;
            }
            remaining -= event.weight;
            if remaining <= 0.0 {
                return Some(event.kind());
            }
        }

        // Float rounding left a sliver of mass; take the last weighted entry
        self.events.iter().rev().find(|e| e.weight > 0.0).map(ShaftEvent::kind)
    }

    pub fn active_event(&self) -> Option<&ShaftEvent> {
        self.events.iter().find(|e| e.active)
    }

    /// Make `kind` the single active event
    pub fn activate(&mut self, kind: EventKind) {
        for event in &mut self.events {
            if event.kind() == kind {
                event.activate();
            } else if event.active {
                log::info!("Event {:?} preempted by {:?}", event.kind(), kind);
                event.deactivate();
            }
        }
        log::info!("Event started: {}", kind.name());
    }

    pub fn deactivate(&mut self, kind: EventKind) {
        if let Some(event) = self.events.iter_mut().find(|e| e.kind() == kind && e.active) {
            event.deactivate();
            log::info!("Event ended: {}", kind.name());
        }
    }

    /// Advance the active event; returns its kind after it expires and is deactivated
    pub fn update_active(&mut self, dt: f32) -> Option<EventKind> {
        let event = self.events.iter_mut().find(|e| e.active)?;
        if event.update(dt) {
            let kind = event.kind();
            event.deactivate();
            log::info!("Event ended: {}", kind.name());
            return Some(kind);
        }
        None
    }

    pub fn modifiers(&self) -> EventModifiers {
        let mut modifiers = EventModifiers::default();
        match self.active_event().map(|e| &e.effect) {
            Some(EventEffect::PowerCut { visibility }) => modifiers.visibility = *visibility,
            Some(EventEffect::TrapMode { difficulty_bonus }) => {
                modifiers.difficulty_bonus = *difficulty_bonus
            }
            Some(EventEffect::SpeedBoost { multiplier }) => modifiers.speed_multiplier = *multiplier,
            Some(EventEffect::MonsterEncounter(_)) | None => {}
        }
        modifiers
    }

    /// Deactivate everything and forget scheduling history
    pub fn reset(&mut self) {
        for event in &mut self.events {
            event.deactivate();
        }
        self.cooldown = 0.0;
        self.last_event_time = 0.0;
    }

    /// Reset and restart the RNG from `seed`
    pub fn reseed(&mut self, seed: u64) {
        self.reset();
        self.rng = Pcg32::seed_from_u64(seed);
    }
}
