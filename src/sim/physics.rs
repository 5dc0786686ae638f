//! Player movement model
//!
//! Platformer-style movement with asymmetric gravity, coyote time, jump
//! buffering, dashes and crouching. The engine holds only the small amount of
//! per-player buffering state that has to survive between ticks; everything
//! else lives on [`Player`].

use serde::{Deserialize, Serialize};

use super::state::Player;
use crate::consts::*;
use crate::error::{SimResult, require_positive, require_range, require_unit};
use crate::{Direction, Span, is_valid_dt};

/// Movement tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    /// Upward impulse (negative is up)
    pub jump_force: f32,
    pub dash_speed: f32,
    /// Simulated seconds a dash lasts
    pub dash_duration: f32,
    pub move_speed: f32,
    /// Fraction of `move_speed` available while airborne
    pub air_control: f32,
    pub ground_friction: f32,
    pub air_friction: f32,
    pub jump_buffer_time: f32,
    pub coyote_time: f32,
    /// Horizontal walls
    pub track: Span,
    /// Rising slower than this gets reduced gravity (floaty apex)
    pub apex_band: f32,
    pub apex_gravity_scale: f32,
    /// Feet within this distance of the floor count as grounded
    pub grounding_tolerance: f32,
    pub full_height: f32,
    pub crouch_height: f32,
    /// Extra downward velocity when crouching mid-fall
    pub crouch_fall_boost: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            jump_force: JUMP_FORCE,
            dash_speed: DASH_SPEED,
            dash_duration: DASH_DURATION,
            move_speed: MOVE_SPEED,
            air_control: AIR_CONTROL,
            ground_friction: GROUND_FRICTION,
            air_friction: AIR_FRICTION,
            jump_buffer_time: JUMP_BUFFER_TIME,
            coyote_time: COYOTE_TIME,
            track: Span::new(TRACK_MIN_X, TRACK_MAX_X),
            apex_band: 300.0,
            apex_gravity_scale: 0.5,
            grounding_tolerance: 10.0,
            full_height: PLAYER_HEIGHT,
            crouch_height: PLAYER_CROUCH_HEIGHT,
            crouch_fall_boost: 1.3,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> SimResult<()> {
        require_positive("physics.gravity", self.gravity)?;
        require_positive("physics.jump_force (magnitude)", -self.jump_force)?;
        require_positive("physics.dash_speed", self.dash_speed)?;
        require_positive("physics.dash_duration", self.dash_duration)?;
        require_positive("physics.move_speed", self.move_speed)?;
        require_unit("physics.air_control", self.air_control)?;
        require_unit("physics.ground_friction", self.ground_friction)?;
        require_unit("physics.air_friction", self.air_friction)?;
        require_positive("physics.jump_buffer_time", self.jump_buffer_time)?;
        require_positive("physics.coyote_time", self.coyote_time)?;
        require_range("physics.track", self.track.min, self.track.max)?;
        require_unit("physics.apex_gravity_scale", self.apex_gravity_scale)?;
        require_positive("physics.grounding_tolerance", self.grounding_tolerance)?;
        require_positive("physics.crouch_height", self.crouch_height)?;
        require_range("physics.crouch_height..full_height", self.crouch_height, self.full_height)?;
        Ok(())
    }
}

/// Advances one player's position and velocity
#[derive(Debug, Clone)]
pub struct PhysicsEngine {
    pub config: PhysicsConfig,
    jump_buffer: f32,
    coyote_timer: f32,
    was_grounded: bool,
    dash_timer: f32,
}

impl Default for PhysicsEngine {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PhysicsEngine {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            jump_buffer: 0.0,
            coyote_timer: 0.0,
            was_grounded: false,
            dash_timer: 0.0,
        }
    }

    /// Drop all buffered input and timers (session reset)
    pub fn reset(&mut self) {
        self.jump_buffer = 0.0;
        self.coyote_timer = 0.0;
        self.was_grounded = false;
        self.dash_timer = 0.0;
    }

    pub fn coyote_timer(&self) -> f32 {
        self.coyote_timer
    }

    pub fn jump_buffer(&self) -> f32 {
        self.jump_buffer
    }

    pub fn dash_timer(&self) -> f32 {
        self.dash_timer
    }

    /// Apply gravity, integrate vertical position and resolve grounding
    pub fn apply_gravity(&mut self, player: &mut Player, dt: f32, ground_y: f32) {
        if !is_valid_dt(dt) {
            return;
        }
        let cfg = &self.config;

        // Floaty apex: reduced gravity while rising slowly
        if player.velocity.y < 0.0 && player.velocity.y > -cfg.apex_band {
            player.velocity.y += cfg.gravity * dt * cfg.apex_gravity_scale;
        } else {
            player.velocity.y += cfg.gravity * dt;
        }

        player.position.y += player.velocity.y * dt;

        let distance_to_ground = (player.position.y + player.size.height - ground_y).abs();
        let grounded = distance_to_ground < cfg.grounding_tolerance && player.velocity.y >= 0.0;

        if grounded {
            player.position.y = ground_y - player.size.height;
            player.velocity.y = 0.0;
            player.can_jump = true;
            self.coyote_timer = cfg.coyote_time;
            self.was_grounded = true;
        } else if self.was_grounded {
            self.coyote_timer -= dt;
            if self.coyote_timer <= 0.0 {
                self.coyote_timer = 0.0;
                self.was_grounded = false;
                player.can_jump = false;
            }
        }

        if self.jump_buffer > 0.0 {
            self.jump_buffer = (self.jump_buffer - dt).max(0.0);
        }
    }

    /// Friction, integration and the hard track walls
    pub fn apply_horizontal_movement(&self, player: &mut Player, dt: f32, in_air: bool) {
        if !is_valid_dt(dt) {
            return;
        }
        let cfg = &self.config;

        let friction = if in_air { cfg.air_friction } else { cfg.ground_friction };
        player.velocity.x *= friction;
        player.position.x += player.velocity.x * dt;

        let min_x = cfg.track.min;
        let max_x = cfg.track.max - player.size.width;

        if player.position.x < min_x {
            player.position.x = min_x;
            player.velocity.x = 0.0;
        } else if player.position.x > max_x {
            player.position.x = max_x;
            player.velocity.x = 0.0;
        }
    }

    /// Jump now if grounded or inside the coyote window, otherwise buffer it
    pub fn jump(&mut self, player: &mut Player) {
        if !player.can_jump && self.coyote_timer <= 0.0 {
            self.jump_buffer = self.config.jump_buffer_time;
            return;
        }

        player.velocity.y = self.config.jump_force;
        player.can_jump = false;
        self.coyote_timer = 0.0;
        self.was_grounded = false;
        self.jump_buffer = 0.0;
    }

    /// Consume a buffered jump once the player can jump again.
    ///
    /// Call after [`apply_gravity`](Self::apply_gravity) so grounding is current.
    pub fn update_jump_buffer(&mut self, player: &mut Player) {
        if self.jump_buffer > 0.0 && player.can_jump {
            self.jump(player);
        }
    }

    pub fn dash(&mut self, player: &mut Player, direction: Direction) {
        if player.is_dashing {
            return;
        }
        player.velocity.x = self.config.dash_speed * direction.sign();
        if player.can_jump {
            player.velocity.y = 0.0;
        }
        player.is_dashing = true;
        self.dash_timer = self.config.dash_duration;
    }

    /// Count down the active dash in simulation time
    pub fn update_dash(&mut self, player: &mut Player, dt: f32) {
        if !is_valid_dt(dt) || self.dash_timer <= 0.0 {
            return;
        }
        self.dash_timer -= dt;
        if self.dash_timer <= 0.0 {
            self.dash_timer = 0.0;
            player.is_dashing = false;
        }
    }

    pub fn move_left(&self, player: &mut Player, in_air: bool) {
        self.steer(player, Direction::Left, in_air);
    }

    pub fn move_right(&self, player: &mut Player, in_air: bool) {
        self.steer(player, Direction::Right, in_air);
    }

    fn steer(&self, player: &mut Player, direction: Direction, in_air: bool) {
        if player.is_dashing {
            return;
        }
        let speed = if in_air {
            self.config.move_speed * self.config.air_control
        } else {
            self.config.move_speed
        };
        player.velocity.x = speed * direction.sign();
    }

    /// Shrink or restore the player's height, keeping the feet anchored
    pub fn crouch(&self, player: &mut Player, crouching: bool) {
        if crouching == player.is_crouching {
            return;
        }

        if crouching {
            let delta = player.size.height - self.config.crouch_height;
            player.size.height = self.config.crouch_height;
            player.position.y += delta;
            player.crouch_delta = delta;
            if player.velocity.y > 0.0 {
                player.velocity.y *= self.config.crouch_fall_boost;
            }
        } else {
            player.size.height += player.crouch_delta;
            player.position.y -= player.crouch_delta;
            player.crouch_delta = 0.0;
        }
        player.is_crouching = crouching;
    }
}
