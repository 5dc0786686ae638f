//! Procedural shaft generation
//!
//! The shaft is a stack of fixed-height segments. Each segment is filled by
//! [`ShaftGenerator::populate`], the single placement routine shared by fresh
//! generation and by [`SegmentPool`](super::pool::SegmentPool) reuse.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::obstacle::{Obstacle, ObstacleTuning, create_random_obstacle};
use crate::consts::{SEGMENT_HEIGHT, SEGMENT_REMOVAL_DISTANCE};
use crate::error::{SimResult, require_positive, require_range, require_unit};

/// A vertical slice of the shaft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaftSegment {
    pub id: u32,
    /// `y` is the segment's anchor; it spans `[y, y + segment_height]`
    pub position: Vec2,
    pub obstacles: Vec<Obstacle>,
    /// Set once, when the player clears the segment
    pub passed: bool,
}

impl ShaftSegment {
    pub fn new(id: u32, y: f32) -> Self {
        Self {
            id,
            position: Vec2::new(0.0, y),
            obstacles: Vec::new(),
            passed: false,
        }
    }
}

/// Placement and scrolling rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaftTuning {
    pub segment_height: f32,
    /// Clear band at the top and bottom of every segment
    pub edge_spacing: f32,
    pub obstacles_per_difficulty: f32,
    /// Cap on obstacles added by difficulty (on top of the first one)
    pub max_extra_obstacles: f32,
    pub base_skip_chance: f32,
    pub skip_reduction_per_difficulty: f32,
    pub min_skip_chance: f32,
    /// Horizontal gap between neighbours, widened by their size
    pub min_horizontal_gap: f32,
    pub size_gap_factor: f32,
    pub min_vertical_gap: f32,
    /// An empty segment above this difficulty gets one forced obstacle
    pub fallback_min_difficulty: f32,
    pub fallback_difficulty_scale: f32,
    pub max_difficulty: f32,
    pub initial_difficulty_step: f32,
    pub initial_difficulty_cap: f32,
    /// Segments kept generated ahead of the camera
    pub lookahead_segments: f32,
    pub removal_distance: f32,
}

impl Default for ShaftTuning {
    fn default() -> Self {
        Self {
            segment_height: SEGMENT_HEIGHT,
            edge_spacing: 150.0,
            obstacles_per_difficulty: 1.5,
            max_extra_obstacles: 4.0,
            base_skip_chance: 0.25,
            skip_reduction_per_difficulty: 0.15,
            min_skip_chance: 0.05,
            min_horizontal_gap: 80.0,
            size_gap_factor: 0.5,
            min_vertical_gap: 120.0,
            fallback_min_difficulty: 0.2,
            fallback_difficulty_scale: 0.5,
            max_difficulty: 10.0,
            initial_difficulty_step: 0.1,
            initial_difficulty_cap: 0.3,
            lookahead_segments: 2.0,
            removal_distance: SEGMENT_REMOVAL_DISTANCE,
        }
    }
}

impl ShaftTuning {
    pub fn validate(&self) -> SimResult<()> {
        require_positive("shaft.segment_height", self.segment_height)?;
        require_range("shaft.edge_spacing", 0.0, self.edge_spacing)?;
        if self.edge_spacing * 2.0 > self.segment_height {
            return Err(crate::SimError::InvalidTuning {
                name: "shaft.edge_spacing",
                value: self.edge_spacing,
                expected: "at most half of segment_height",
            });
        }
        require_range("shaft.max_extra_obstacles", 0.0, self.max_extra_obstacles)?;
        require_unit("shaft.base_skip_chance", self.base_skip_chance)?;
        require_unit("shaft.min_skip_chance", self.min_skip_chance)?;
        require_unit("shaft.fallback_difficulty_scale", self.fallback_difficulty_scale)?;
        require_positive("shaft.max_difficulty", self.max_difficulty)?;
        require_positive("shaft.lookahead_segments", self.lookahead_segments)?;
        require_positive("shaft.removal_distance", self.removal_distance)?;
        Ok(())
    }

    fn skip_chance(&self, difficulty: f32) -> f32 {
        (self.base_skip_chance - difficulty * self.skip_reduction_per_difficulty).max(self.min_skip_chance)
    }

    fn obstacle_count(&self, difficulty: f32) -> usize {
        (1.0 + (difficulty * self.obstacles_per_difficulty).min(self.max_extra_obstacles)).floor() as usize
    }

    /// Neighbours closer than this (in both axes) are rejected
    fn too_close(&self, existing: &Obstacle, candidate: &Obstacle) -> bool {
        let horizontal = (existing.position.x - candidate.position.x).abs();
        let vertical = (existing.position.y - candidate.position.y).abs();
        let widest = existing.size.width.max(candidate.size.width);
        horizontal < self.min_horizontal_gap + widest * self.size_gap_factor
            && vertical < self.min_vertical_gap
    }
}

/// Produces segments with unique ids from a seeded RNG
#[derive(Debug, Clone)]
pub struct ShaftGenerator {
    shaft: ShaftTuning,
    obstacles: ObstacleTuning,
    rng: Pcg32,
    next_segment_id: u32,
    next_obstacle_id: u32,
}

impl ShaftGenerator {
    pub fn new(seed: u64, shaft: ShaftTuning, obstacles: ObstacleTuning) -> SimResult<Self> {
        shaft.validate()?;
        obstacles.validate()?;
        Ok(Self {
            shaft,
            obstacles,
            rng: Pcg32::seed_from_u64(seed),
            next_segment_id: 1,
            next_obstacle_id: 1,
        })
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            shaft: ShaftTuning::default(),
            obstacles: ObstacleTuning::default(),
            rng: Pcg32::seed_from_u64(seed),
            next_segment_id: 1,
            next_obstacle_id: 1,
        }
    }

    /// Restart the RNG and id counters, as if freshly built with `seed`
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Pcg32::seed_from_u64(seed);
        self.next_segment_id = 1;
        self.next_obstacle_id = 1;
    }

    pub fn tuning(&self) -> &ShaftTuning {
        &self.shaft
    }

    pub fn segment_height(&self) -> f32 {
        self.shaft.segment_height
    }

    /// Clamp difficulty into `[0, max_difficulty]`; NaN becomes 0
    pub fn sanitize_difficulty(&self, difficulty: f32) -> f32 {
        if difficulty.is_nan() {
            log::warn!("NaN difficulty passed to shaft generator, using 0");
            return 0.0;
        }
        let clamped = difficulty.clamp(0.0, self.shaft.max_difficulty);
        if clamped != difficulty {
            log::warn!("Difficulty {} clamped to {}", difficulty, clamped);
        }
        clamped
    }

    fn next_obstacle_id(&mut self) -> u32 {
        let id = self.next_obstacle_id;
        self.next_obstacle_id = self.next_obstacle_id.wrapping_add(1);
        id
    }

    fn next_segment_id(&mut self) -> u32 {
        let id = self.next_segment_id;
        self.next_segment_id = self.next_segment_id.wrapping_add(1);
        id
    }

    pub fn generate_segment(&mut self, y: f32, difficulty: f32) -> ShaftSegment {
        let id = self.next_segment_id();
        let mut segment = ShaftSegment::new(id, y);
        self.populate(&mut segment, difficulty);
        segment
    }

    /// Replace `segment`'s obstacles with a fresh placement at its current `y`
    pub fn populate(&mut self, segment: &mut ShaftSegment, difficulty: f32) {
        let difficulty = self.sanitize_difficulty(difficulty);
        let y = segment.position.y;
        segment.obstacles.clear();

        let count = self.shaft.obstacle_count(difficulty);
        let usable = self.shaft.segment_height - self.shaft.edge_spacing * 2.0;
        let skip_chance = self.shaft.skip_chance(difficulty);

        for i in 0..count {
            let obstacle_y = y + self.shaft.edge_spacing + i as f32 * usable / count as f32;

            if self.rng.random::<f32>() < skip_chance {
                continue;
            }

            let id = self.next_obstacle_id();
            let candidate =
                create_random_obstacle(id, obstacle_y, difficulty, &self.obstacles, &mut self.rng);

            let crowded = segment
                .obstacles
                .iter()
                .any(|existing| self.shaft.too_close(existing, &candidate));
            if !crowded {
                segment.obstacles.push(candidate);
            }
        }

        if segment.obstacles.is_empty() && difficulty > self.shaft.fallback_min_difficulty {
            let id = self.next_obstacle_id();
            let mid_y = y + self.shaft.segment_height / 2.0;
            let reduced = difficulty * self.shaft.fallback_difficulty_scale;
            let obstacle = create_random_obstacle(id, mid_y, reduced, &self.obstacles, &mut self.rng);
            segment.obstacles.push(obstacle);
        }

        log::debug!(
            "Segment {} at y={} difficulty={:.2}: {} obstacles",
            segment.id,
            y,
            difficulty,
            segment.obstacles.len()
        );
    }

    /// The opening stretch, stacked upward from `start_y` with a gentle ramp
    pub fn generate_initial_segments(&mut self, count: usize, start_y: f32) -> Vec<ShaftSegment> {
        (0..count)
            .map(|i| {
                let difficulty = (i as f32 * self.shaft.initial_difficulty_step)
                    .min(self.shaft.initial_difficulty_cap);
                let y = start_y - i as f32 * self.shaft.segment_height;
                self.generate_segment(y, difficulty)
            })
            .collect()
    }

    /// True while the topmost segment is inside the lookahead buffer
    pub fn should_generate_new_segment(&self, top_segment_y: f32, camera_y: f32) -> bool {
        top_segment_y > camera_y - self.shaft.segment_height * self.shaft.lookahead_segments
    }

    /// True once a segment has fallen far enough behind the camera
    pub fn should_remove_segment(&self, segment_y: f32, camera_y: f32) -> bool {
        segment_y > camera_y + self.shaft.removal_distance
    }
}
