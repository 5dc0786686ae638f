//! Obstacle state machines and the random obstacle factory
//!
//! Three flat variants share the common fields on [`Obstacle`]; the
//! variant-specific state lives in [`ObstacleKind`] and is advanced by a
//! single `match` in [`Obstacle::update`].

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult, require_positive, require_range};
use crate::{Direction, Size, Span, is_valid_dt};

/// Type tag for the obstacle variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleType {
    Static,
    Dynamic,
    Timed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaticVariant {
    Debris,
    Cable,
    Panel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DynamicVariant {
    Piston,
    Swinging,
    Sliding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimedVariant {
    Spike,
    Laser,
    Electric,
}

/// Variant-specific state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Fixed geometry, never changes
    Static { variant: StaticVariant },
    /// Ping-pongs along x inside `range`
    Dynamic {
        variant: DynamicVariant,
        velocity: Vec2,
        range: Span,
        direction: Direction,
    },
    /// Alternates between dormant (`interval`) and active (`active_time`)
    Timed {
        variant: TimedVariant,
        interval: f32,
        active_time: f32,
        timer: f32,
    },
}

/// A hazard inside a shaft segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    /// Top-left corner in world space
    pub position: Vec2,
    pub size: Size,
    pub active: bool,
    pub damage: u32,
    pub kind: ObstacleKind,
}

pub const STATIC_DAMAGE: u32 = 20;
pub const DYNAMIC_DAMAGE: u32 = 25;
pub const TIMED_DAMAGE: u32 = 30;

fn check_size(size: Size) -> SimResult<()> {
    if size.is_valid() {
        Ok(())
    } else {
        Err(SimError::InvalidGeometry {
            what: "obstacle",
            width: size.width,
            height: size.height,
        })
    }
}

impl Obstacle {
    pub fn new_static(id: u32, position: Vec2, size: Size, variant: StaticVariant) -> SimResult<Self> {
        check_size(size)?;
        Ok(Self {
            id,
            position,
            size,
            active: true,
            damage: STATIC_DAMAGE,
            kind: ObstacleKind::Static { variant },
        })
    }

    pub fn new_dynamic(
        id: u32,
        position: Vec2,
        size: Size,
        velocity: Vec2,
        range: Span,
        variant: DynamicVariant,
    ) -> SimResult<Self> {
        check_size(size)?;
        require_range("dynamic.range", range.min, range.max)?;
        Ok(Self {
            id,
            position,
            size,
            active: true,
            damage: DYNAMIC_DAMAGE,
            kind: ObstacleKind::Dynamic {
                variant,
                velocity,
                range,
                direction: Direction::Right,
            },
        })
    }

    pub fn new_timed(
        id: u32,
        position: Vec2,
        size: Size,
        interval: f32,
        active_time: f32,
        variant: TimedVariant,
    ) -> SimResult<Self> {
        check_size(size)?;
        require_positive("timed.interval", interval)?;
        require_positive("timed.active_time", active_time)?;
        Ok(Self {
            id,
            position,
            size,
            active: false,
            damage: TIMED_DAMAGE,
            kind: ObstacleKind::Timed {
                variant,
                interval,
                active_time,
                timer: 0.0,
            },
        })
    }

    pub fn obstacle_type(&self) -> ObstacleType {
        match self.kind {
            ObstacleKind::Static { .. } => ObstacleType::Static,
            ObstacleKind::Dynamic { .. } => ObstacleType::Dynamic,
            ObstacleKind::Timed { .. } => ObstacleType::Timed,
        }
    }

    /// Reset to the freshly spawned state
    pub fn on_spawn(&mut self) {
        match &mut self.kind {
            ObstacleKind::Static { .. } => self.active = true,
            ObstacleKind::Dynamic { direction, .. } => {
                self.active = true;
                *direction = Direction::Right;
            }
            ObstacleKind::Timed { timer, .. } => {
                *timer = 0.0;
                self.active = false;
            }
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
        if let ObstacleKind::Timed { timer, .. } = &mut self.kind {
            *timer = 0.0;
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Advance the variant state machine by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        if !is_valid_dt(dt) {
            return;
        }

        match &mut self.kind {
            ObstacleKind::Static { .. } => {}
            ObstacleKind::Dynamic {
                velocity,
                range,
                direction,
                ..
            } => {
                if !self.active {
                    return;
                }
                self.position.x += velocity.x * direction.sign() * dt;

                if self.position.x >= range.max {
                    *direction = Direction::Left;
                    self.position.x = range.max;
                } else if self.position.x <= range.min {
                    *direction = Direction::Right;
                    self.position.x = range.min;
                }
            }
            ObstacleKind::Timed {
                interval,
                active_time,
                timer,
                ..
            } => {
                *timer += dt;
                if self.active && *timer >= *active_time {
                    self.active = false;
                    *timer = 0.0;
                } else if !self.active && *timer >= *interval {
                    self.active = true;
                    *timer = 0.0;
                }
            }
        }
    }

    /// Dormant timed hazards still get drawn as a warning
    pub fn is_telegraphing(&self) -> bool {
        !self.active && matches!(self.kind, ObstacleKind::Timed { .. })
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.position.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.height
    }
}

/// Size and timing ranges for [`create_random_obstacle`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTuning {
    /// Probability of a static obstacle
    pub static_chance: f32,
    /// Cumulative probability of static or dynamic (rest is timed)
    pub dynamic_chance: f32,
    /// Horizontal placement of the obstacle's left edge
    pub spawn_x: Span,

    pub static_width: Span,
    pub static_height: Span,

    pub dynamic_width: Span,
    pub dynamic_height: Span,
    pub dynamic_base_speed: f32,
    pub dynamic_speed_per_difficulty: f32,
    pub dynamic_range: Span,

    pub timed_width: Span,
    pub timed_height: Span,
    pub laser_height: f32,
    pub timed_base_interval: f32,
    pub timed_interval_per_difficulty: f32,
    pub timed_min_interval: f32,
    pub timed_active_time: f32,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            static_chance: 0.4,
            dynamic_chance: 0.7,
            spawn_x: Span::new(70.0, 330.0),

            // Kept short so everything can be jumped
            static_width: Span::new(30.0, 80.0),
            static_height: Span::new(15.0, 25.0),

            dynamic_width: Span::new(40.0, 60.0),
            dynamic_height: Span::new(20.0, 35.0),
            dynamic_base_speed: 40.0,
            dynamic_speed_per_difficulty: 15.0,
            dynamic_range: Span::new(70.0, 330.0),

            timed_width: Span::new(50.0, 80.0),
            timed_height: Span::new(12.0, 20.0),
            laser_height: 8.0,
            timed_base_interval: 1.8,
            timed_interval_per_difficulty: 0.2,
            timed_min_interval: 0.6,
            timed_active_time: 0.8,
        }
    }
}

impl ObstacleTuning {
    pub fn validate(&self) -> SimResult<()> {
        if !(0.0..=1.0).contains(&self.static_chance)
            || !(self.static_chance..=1.0).contains(&self.dynamic_chance)
        {
            return Err(SimError::InvalidRange {
                name: "obstacles.static_chance/dynamic_chance",
                min: self.static_chance,
                max: self.dynamic_chance,
            });
        }
        for (name, span) in [
            ("obstacles.spawn_x", self.spawn_x),
            ("obstacles.dynamic_range", self.dynamic_range),
        ] {
            require_range(name, span.min, span.max)?;
        }
        for (name, span) in [
            ("obstacles.static_width", self.static_width),
            ("obstacles.static_height", self.static_height),
            ("obstacles.dynamic_width", self.dynamic_width),
            ("obstacles.dynamic_height", self.dynamic_height),
            ("obstacles.timed_width", self.timed_width),
            ("obstacles.timed_height", self.timed_height),
        ] {
            require_range(name, span.min, span.max)?;
            require_positive(name, span.min)?;
        }
        require_positive("obstacles.laser_height", self.laser_height)?;
        require_positive("obstacles.timed_min_interval", self.timed_min_interval)?;
        require_positive("obstacles.timed_active_time", self.timed_active_time)?;
        Ok(())
    }

    fn timed_interval(&self, difficulty: f32) -> f32 {
        (self.timed_base_interval - difficulty * self.timed_interval_per_difficulty)
            .max(self.timed_min_interval)
    }
}

fn pick<T: Copy, R: Rng>(rng: &mut R, options: &[T; 3]) -> T {
    options[rng.random_range(0..options.len())]
}

/// Draw a random obstacle for a segment at `y`.
///
/// `tuning` must already be validated; sampled extents are then always positive.
pub fn create_random_obstacle<R: Rng>(
    id: u32,
    y: f32,
    difficulty: f32,
    tuning: &ObstacleTuning,
    rng: &mut R,
) -> Obstacle {
    let roll = rng.random::<f32>();
    let position = Vec2::new(tuning.spawn_x.sample(rng), y);

    if roll < tuning.static_chance {
        let variant = pick(rng, &[StaticVariant::Debris, StaticVariant::Cable, StaticVariant::Panel]);
        let height = tuning.static_height.sample(rng);
        let width = tuning.static_width.sample(rng);
        Obstacle {
            id,
            position,
            size: Size::new(width, height),
            active: true,
            damage: STATIC_DAMAGE,
            kind: ObstacleKind::Static { variant },
        }
    } else if roll < tuning.dynamic_chance {
        let variant = pick(
            rng,
            &[DynamicVariant::Piston, DynamicVariant::Swinging, DynamicVariant::Sliding],
        );
        let height = tuning.dynamic_height.sample(rng);
        let width = tuning.dynamic_width.sample(rng);
        let speed = tuning.dynamic_base_speed + difficulty * tuning.dynamic_speed_per_difficulty;
        Obstacle {
            id,
            position: Vec2::new(tuning.dynamic_range.clamp(position.x), y),
            size: Size::new(width, height),
            active: true,
            damage: DYNAMIC_DAMAGE,
            kind: ObstacleKind::Dynamic {
                variant,
                velocity: Vec2::new(speed, 0.0),
                range: tuning.dynamic_range,
                direction: Direction::Right,
            },
        }
    } else {
        let variant = pick(rng, &[TimedVariant::Spike, TimedVariant::Laser, TimedVariant::Electric]);
        // Lasers are a thin beam
        let height = if variant == TimedVariant::Laser {
            tuning.laser_height
        } else {
            tuning.timed_height.sample(rng)
        };
        let width = tuning.timed_width.sample(rng);
        Obstacle {
            id,
            position,
            size: Size::new(width, height),
            active: false,
            damage: TIMED_DAMAGE,
            kind: ObstacleKind::Timed {
                variant,
                interval: tuning.timed_interval(difficulty),
                active_time: tuning.timed_active_time,
                timer: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn dynamic_at(x: f32, speed: f32) -> Obstacle {
        Obstacle::new_dynamic(
            1,
            Vec2::new(x, 0.0),
            Size::new(50.0, 30.0),
            Vec2::new(speed, 0.0),
            Span::new(50.0, 350.0),
            DynamicVariant::Piston,
        )
        .unwrap()
    }

    #[test]
    fn test_static_update_is_noop() {
        let mut obstacle =
            Obstacle::new_static(1, Vec2::new(100.0, 50.0), Size::new(40.0, 20.0), StaticVariant::Cable)
                .unwrap();
        let before = obstacle.clone();
        obstacle.update(1.0);
        assert_eq!(obstacle, before);
        assert!(obstacle.active);
    }

    #[test]
    fn test_dynamic_clamps_and_flips_at_max() {
        let mut obstacle = dynamic_at(50.0, 70.0);
        let dt = 0.016;
        let mut ticks = 0;
        while obstacle.position.x < 350.0 {
            obstacle.update(dt);
            ticks += 1;
            assert!(ticks < 10_000, "obstacle never reached range.max");
        }
        assert_eq!(obstacle.position.x, 350.0);
        match obstacle.kind {
            ObstacleKind::Dynamic { direction, .. } => assert_eq!(direction, Direction::Left),
            _ => unreachable!(),
        }

        // Next tick moves back toward min
        obstacle.update(dt);
        assert!(obstacle.position.x < 350.0);
    }

    #[test]
    fn test_dynamic_flips_at_min() {
        let mut obstacle = dynamic_at(60.0, 100.0);
        if let ObstacleKind::Dynamic { direction, .. } = &mut obstacle.kind {
            *direction = Direction::Left;
        }
        obstacle.update(0.5);
        assert_eq!(obstacle.position.x, 50.0);
        assert!(matches!(
            obstacle.kind,
            ObstacleKind::Dynamic { direction: Direction::Right, .. }
        ));
    }

    #[test]
    fn test_inactive_dynamic_does_not_move() {
        let mut obstacle = dynamic_at(100.0, 70.0);
        obstacle.deactivate();
        obstacle.update(1.0);
        assert_eq!(obstacle.position.x, 100.0);
    }

    #[test]
    fn test_timed_cycle() {
        let mut obstacle =
            Obstacle::new_timed(1, Vec2::ZERO, Size::new(60.0, 20.0), 1.0, 0.5, TimedVariant::Spike)
                .unwrap();
        assert!(!obstacle.active);
        assert!(obstacle.is_telegraphing());

        obstacle.update(0.6);
        assert!(!obstacle.active);
        obstacle.update(0.4);
        assert!(obstacle.active);
        assert!(!obstacle.is_telegraphing());

        obstacle.update(0.25);
        assert!(obstacle.active);
        obstacle.update(0.25);
        assert!(!obstacle.active);
    }

    #[test]
    fn test_timed_activate_resets_timer() {
        let mut obstacle =
            Obstacle::new_timed(1, Vec2::ZERO, Size::new(60.0, 20.0), 1.0, 0.5, TimedVariant::Laser)
                .unwrap();
        obstacle.update(0.9);
        obstacle.activate();
        assert!(matches!(obstacle.kind, ObstacleKind::Timed { timer, .. } if timer == 0.0));
        obstacle.on_spawn();
        assert!(!obstacle.active);
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let err = Obstacle::new_static(1, Vec2::ZERO, Size::new(0.0, 10.0), StaticVariant::Debris);
        assert!(matches!(err, Err(SimError::InvalidGeometry { .. })));
        let err = Obstacle::new_static(1, Vec2::ZERO, Size::new(10.0, f32::NAN), StaticVariant::Debris);
        assert!(err.is_err());
    }

    #[test]
    fn test_invalid_dt_is_noop() {
        let mut obstacle = dynamic_at(100.0, 70.0);
        obstacle.update(0.0);
        obstacle.update(-1.0);
        obstacle.update(f32::NAN);
        assert_eq!(obstacle.position.x, 100.0);
    }

    #[test]
    fn test_factory_distribution_and_sizes() {
        let tuning = ObstacleTuning::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut counts = [0u32; 3];
        for id in 0..2000 {
            let obstacle = create_random_obstacle(id, 100.0, 1.0, &tuning, &mut rng);
            assert!(obstacle.size.is_valid());
            assert_eq!(obstacle.id, id);
            assert_eq!(obstacle.position.y, 100.0);
            match obstacle.obstacle_type() {
                ObstacleType::Static => {
                    counts[0] += 1;
                    assert!(obstacle.size.height <= tuning.static_height.max);
                }
                ObstacleType::Dynamic => {
                    counts[1] += 1;
                    assert!(obstacle.position.x >= tuning.dynamic_range.min);
                    assert!(obstacle.position.x <= tuning.dynamic_range.max);
                }
                ObstacleType::Timed => {
                    counts[2] += 1;
                    assert!(!obstacle.active);
                }
            }
        }
        // 40/30/30 split with generous tolerance
        assert!((700..900).contains(&counts[0]), "static count {}", counts[0]);
        assert!((500..700).contains(&counts[1]), "dynamic count {}", counts[1]);
        assert!((500..700).contains(&counts[2]), "timed count {}", counts[2]);
    }

    #[test]
    fn test_timed_interval_floor() {
        let tuning = ObstacleTuning::default();
        assert!((tuning.timed_interval(0.0) - 1.8).abs() < 1e-6);
        assert_eq!(tuning.timed_interval(100.0), tuning.timed_min_interval);
    }
}
