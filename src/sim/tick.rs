//! Fixed timestep simulation tick
//!
//! Core game loop that advances a session deterministically.

use std::cmp::Ordering;
use std::collections::HashSet;

use super::collision::aabb_overlap;
use super::events::EventKind;
use super::obstacle::ObstacleType;
use super::state::{GamePhase, GameState};
use crate::{Direction, is_valid_dt};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
    /// Start a dash this tick
    pub dash: Option<Direction>,
    /// Held crouch
    pub crouch: bool,
    /// Pause toggle
    pub pause: bool,
    /// Demo mode - AI dodges for the player
    pub autopilot: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.pause {
        state.toggle_pause();
    }

    if !state.is_running() {
        return;
    }

    if !is_valid_dt(dt) {
        log::warn!("Ignoring tick with invalid dt {}", dt);
        return;
    }

    let mut input = input.clone();
    if input.autopilot {
        autopilot(state, &mut input);
    }

    state.advance_clock(dt);

    step_player(state, &input, dt);
    scroll_camera(state, dt);

    for segment in &mut state.segments {
        for obstacle in &mut segment.obstacles {
            obstacle.update(dt);
        }
    }

    resolve_collisions(state);
    if state.phase == GamePhase::GameOver {
        state.refresh_score();
        return;
    }

    mark_passed_segments(state);
    manage_segments(state);
    update_events(state, dt);

    state.refresh_score();
}

/// Input, then dash timer, gravity, buffered jump and horizontal motion
fn step_player(state: &mut GameState, input: &TickInput, dt: f32) {
    let ground_y = state.tuning.session.ground_y;
    let physics = &mut state.physics;
    let player = &mut state.player;

    physics.crouch(player, input.crouch);

    let in_air = !player.can_jump;
    match (input.move_left, input.move_right) {
        (true, false) => physics.move_left(player, in_air),
        (false, true) => physics.move_right(player, in_air),
        _ => {}
    }

    if input.jump {
        physics.jump(player);
    }
    if let Some(direction) = input.dash {
        physics.dash(player, direction);
    }

    physics.update_dash(player, dt);
    physics.apply_gravity(player, dt, ground_y);
    physics.update_jump_buffer(player);

    let in_air = !player.can_jump;
    physics.apply_horizontal_movement(player, dt, in_air);
}

fn scroll_camera(state: &mut GameState, dt: f32) {
    let speed = state.difficulty.elevator_speed() * state.events.modifiers().speed_multiplier;
    let climbed = speed * dt;
    state.camera_y -= climbed;
    state.stats.distance += climbed;
}

/// Damage once per obstacle; a near miss pays out once the obstacle leaves
/// range without having hit
fn resolve_collisions(state: &mut GameState) {
    let probe = state.world_player();
    let threshold = state.collision.tuning.near_miss_threshold;
    let band_top = probe.position.y - threshold;
    let band_bottom = probe.bottom() + threshold;
    let segment_height = state.pool.generator().segment_height();

    let mut damage = 0u32;
    let mut near_now = HashSet::new();

    for segment in &state.segments {
        let segment_y = segment.position.y;
        if segment_y > band_bottom || segment_y + segment_height < band_top {
            continue;
        }

        for obstacle in &segment.obstacles {
            if state.hit_obstacles.contains(&obstacle.id) {
                continue;
            }

            if state.collision.check_player_obstacle_collision(&probe, obstacle) {
                state.hit_obstacles.insert(obstacle.id);
                state.hit_segments.insert(segment.id);
                state.near_pending.remove(&obstacle.id);
                damage += obstacle.damage;
                log::debug!(
                    "Hit {:?} obstacle {} for {}",
                    obstacle.obstacle_type(),
                    obstacle.id,
                    obstacle.damage
                );
            } else if state.collision.check_near_miss(&probe, obstacle) {
                near_now.insert(obstacle.id);
            }
        }
    }

    // Obstacles that left range this tick without hitting
    let cleared: Vec<u32> = state
        .near_pending
        .iter()
        .filter(|id| !near_now.contains(*id))
        .copied()
        .collect();
    for id in cleared {
        state.near_pending.remove(&id);
        if !state.hit_obstacles.contains(&id) && state.near_missed.insert(id) {
            state.stats.near_misses += 1;
            log::debug!("Near miss on obstacle {}", id);
        }
    }
    state.near_pending.extend(near_now.into_iter().filter(|id| !state.near_missed.contains(id)));

    // Monster lives in screen space, like the player
    let monster_hit = state
        .events
        .active_event()
        .and_then(|event| event.monster())
        .filter(|monster| aabb_overlap(&state.collision.player_box(&state.player), &monster.hitbox()))
        .map(|monster| monster.damage);
    match monster_hit {
        Some(amount) if !state.monster_contact => {
            state.monster_contact = true;
            damage += amount;
        }
        Some(_) => {}
        None => state.monster_contact = false,
    }

    if damage > 0 {
        state.damage_player(damage);
    }
}

/// A segment is passed once the player's feet rise above its top edge
fn mark_passed_segments(state: &mut GameState) {
    let feet = state.world_player().bottom();
    for segment in &mut state.segments {
        if segment.passed || feet >= segment.position.y {
            continue;
        }
        segment.passed = true;
        if !state.hit_segments.contains(&segment.id) {
            state.stats.perfect_segments += 1;
        }
    }
}

/// Retire segments behind the camera into the pool and fill the lookahead
fn manage_segments(state: &mut GameState) {
    let camera_y = state.camera_y;

    let (retired, live): (Vec<_>, Vec<_>) = std::mem::take(&mut state.segments)
        .into_iter()
        .partition(|segment| {
            state
                .pool
                .generator()
                .should_remove_segment(segment.position.y, camera_y)
        });
    state.segments = live;

    for segment in retired {
        for obstacle in &segment.obstacles {
            state.hit_obstacles.remove(&obstacle.id);
            state.near_missed.remove(&obstacle.id);
            state.near_pending.remove(&obstacle.id);
        }
        state.hit_segments.remove(&segment.id);
        state.pool.release(segment);
    }

    let segment_height = state.pool.generator().segment_height();
    let difficulty = state.difficulty.level + state.events.modifiers().difficulty_bonus;
    // An empty shaft restarts just above the screen
    let mut top = state.top_segment_y().unwrap_or(camera_y);

    while state.pool.generator().should_generate_new_segment(top, camera_y) {
        top -= segment_height;
        let segment = state.pool.get(top, difficulty);
        state.segments.push(segment);
    }
}

fn update_events(state: &mut GameState, dt: f32) {
    if let Some(kind) = state.events.update_active(dt) {
        log::debug!("{} wore off", kind.name());
        if kind == EventKind::MonsterEncounter {
            state.monster_contact = false;
        }
        if state.phase == GamePhase::EventActive {
            state.phase = GamePhase::Playing;
        }
    }

    if let Some(kind) = state.events.update(dt, state.stats.time_alive) {
        start_event(state, kind);
    }
}

fn start_event(state: &mut GameState, kind: EventKind) {
    state.events.activate(kind);
    state.last_event = Some(kind);
    state.monster_contact = false;
    state.phase = GamePhase::EventActive;

    if kind == EventKind::TrapMode {
        let mut armed = 0;
        for obstacle in state.segments.iter_mut().flat_map(|s| s.obstacles.iter_mut()) {
            if obstacle.obstacle_type() == ObstacleType::Timed {
                obstacle.activate();
                armed += 1;
            }
        }
        log::debug!("Trap mode armed {} timed obstacles", armed);
    }
}

/// Dodge the closest obstacle that is about to reach the player's column
fn autopilot(state: &GameState, input: &mut TickInput) {
    let probe = state.world_player();
    let look_ahead = probe.position.y - 150.0;
    let left = probe.position.x;
    let right = probe.position.x + probe.size.width;

    let threat = state
        .segments
        .iter()
        .flat_map(|s| s.obstacles.iter())
        .filter(|o| o.active || o.is_telegraphing())
        .filter(|o| o.bottom() > look_ahead && o.top() < probe.bottom())
        .filter(|o| o.position.x < right && o.position.x + o.size.width > left)
        .max_by(|a, b| a.bottom().partial_cmp(&b.bottom()).unwrap_or(Ordering::Equal));

    let Some(obstacle) = threat else {
        return;
    };

    let track = state.physics.config.track;
    let room_left = obstacle.position.x - track.min;
    let room_right = track.max - (obstacle.position.x + obstacle.size.width);
    if room_left >= room_right {
        input.move_left = true;
    } else {
        input.move_right = true;
    }

    // Hop over low obstacles once they are close
    if obstacle.size.height < state.collision.tuning.short_obstacle_height
        && obstacle.bottom() > probe.position.y - 40.0
    {
        input.jump = true;
    }
}
