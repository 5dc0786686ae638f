//! Collision detection between the player and obstacles
//!
//! The player is an ellipse inscribed (with a margin) in its bounding box and
//! obstacles are margin-shrunk boxes. Ellipse-vs-box is kinder at corners than
//! box-vs-box, and on top of the geometry a few vertical-motion rules let a
//! rising player clip past short obstacles.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::obstacle::Obstacle;
use super::state::Player;
use crate::error::{SimResult, require_positive, require_unit};

/// Axis-aligned box (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CollisionBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Box shrunk by `margin` on every side, never inverted
    pub fn shrunk(position: Vec2, width: f32, height: f32, margin: f32) -> Self {
        Self {
            x: position.x + margin,
            y: position.y + margin,
            width: (width - margin * 2.0).max(0.0),
            height: (height - margin * 2.0).max(0.0),
        }
    }

    /// Nearest point inside the box to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.x, self.x + self.width),
            p.y.clamp(self.y, self.y + self.height),
        )
    }
}

/// Player hitbox ellipse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub center: Vec2,
    pub radius_x: f32,
    pub radius_y: f32,
}

impl Ellipse {
    pub fn expanded(&self, amount: f32) -> Self {
        Self {
            center: self.center,
            radius_x: self.radius_x + amount,
            radius_y: self.radius_y + amount,
        }
    }
}

/// Margins and forgiveness thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    pub player_margin: f32,
    /// Margin while rising faster than `rising_speed`
    pub rising_margin: f32,
    pub rising_speed: f32,
    /// Added to the margin while crouching
    pub crouch_margin_bonus: f32,
    pub obstacle_margin: f32,
    /// Fraction of the nominal ellipse that actually collides
    pub ellipse_scale: f32,
    pub min_radius: f32,

    /// Apex pass-through applies above this upward speed
    pub apex_pass_speed: f32,
    pub apex_pass_top_allowance: f32,
    pub apex_pass_height_fraction: f32,

    /// Short-obstacle clearance applies above this upward speed
    pub clearance_speed: f32,
    pub short_obstacle_height: f32,
    pub clearance_band: f32,

    pub near_miss_threshold: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            player_margin: 12.0,
            rising_margin: 16.0,
            rising_speed: 100.0,
            crouch_margin_bonus: 8.0,
            obstacle_margin: 3.0,
            ellipse_scale: 0.7,
            min_radius: 1.0,

            apex_pass_speed: 230.0,
            apex_pass_top_allowance: 28.0,
            apex_pass_height_fraction: 0.4,

            clearance_speed: 100.0,
            short_obstacle_height: 35.0,
            clearance_band: -15.0,

            near_miss_threshold: 40.0,
        }
    }
}

impl CollisionTuning {
    pub fn validate(&self) -> SimResult<()> {
        require_positive("collision.ellipse_scale", self.ellipse_scale)?;
        require_positive("collision.min_radius", self.min_radius)?;
        require_unit("collision.apex_pass_height_fraction", self.apex_pass_height_fraction)?;
        require_positive("collision.near_miss_threshold", self.near_miss_threshold)?;
        Ok(())
    }
}

/// Ellipse-vs-box overlap with the forgiveness scale applied.
///
/// The offset from the ellipse centre to the closest point on the box is
/// normalized by the radii; the pair collides when that normalized distance is
/// below `scale`.
pub fn ellipse_rect_overlap(ellipse: &Ellipse, rect: &CollisionBox, scale: f32) -> bool {
    let closest = rect.closest_point(ellipse.center);
    let dx = (ellipse.center.x - closest.x) / ellipse.radius_x;
    let dy = (ellipse.center.y - closest.y) / ellipse.radius_y;
    dx * dx + dy * dy < scale * scale
}

/// Plain AABB overlap
pub fn aabb_overlap(a: &CollisionBox, b: &CollisionBox) -> bool {
    a.x < b.x + b.width && a.x + a.width > b.x && a.y < b.y + b.height && a.y + a.height > b.y
}

/// Stateless player-vs-obstacle queries
#[derive(Debug, Clone, Default)]
pub struct CollisionDetector {
    pub tuning: CollisionTuning,
}

impl CollisionDetector {
    pub fn new(tuning: CollisionTuning) -> Self {
        Self { tuning }
    }

    pub fn player_ellipse(&self, player: &Player) -> Ellipse {
        let t = &self.tuning;
        let mut margin = if player.velocity.y < -t.rising_speed {
            t.rising_margin
        } else {
            t.player_margin
        };
        if player.is_crouching {
            margin += t.crouch_margin_bonus;
        }

        Ellipse {
            center: player.center(),
            radius_x: (player.size.width / 2.0 - margin).max(t.min_radius),
            radius_y: (player.size.height / 2.0 - margin).max(t.min_radius),
        }
    }

    pub fn player_box(&self, player: &Player) -> CollisionBox {
        CollisionBox::shrunk(
            player.position,
            player.size.width,
            player.size.height,
            self.tuning.player_margin,
        )
    }

    pub fn obstacle_box(&self, obstacle: &Obstacle) -> CollisionBox {
        CollisionBox::shrunk(
            obstacle.position,
            obstacle.size.width,
            obstacle.size.height,
            self.tuning.obstacle_margin,
        )
    }

    /// Vertical-motion rules that wave a rising player through
    fn forgiven(&self, player: &Player, obstacle: &Obstacle) -> bool {
        let t = &self.tuning;
        let player_top = player.position.y;
        let player_bottom = player.bottom();
        let obstacle_top = obstacle.top();
        let obstacle_bottom = obstacle.bottom();

        if player.velocity.y < -t.apex_pass_speed {
            if player_bottom < obstacle_top + t.apex_pass_top_allowance {
                return true;
            }
            if player_top < obstacle_bottom - obstacle.size.height * t.apex_pass_height_fraction {
                return true;
            }
        }

        if player.velocity.y < -t.clearance_speed && obstacle.size.height < t.short_obstacle_height {
            let clearance = obstacle_top - player_bottom;
            if clearance > t.clearance_band {
                return true;
            }
        }

        false
    }

    pub fn check_player_obstacle_collision(&self, player: &Player, obstacle: &Obstacle) -> bool {
        if !obstacle.active || self.forgiven(player, obstacle) {
            return false;
        }

        let ellipse = self.player_ellipse(player);
        let rect = self.obstacle_box(obstacle);
        ellipse_rect_overlap(&ellipse, &rect, self.tuning.ellipse_scale)
    }

    /// Close pass that did not collide, using the tuned threshold
    pub fn check_near_miss(&self, player: &Player, obstacle: &Obstacle) -> bool {
        self.check_near_miss_within(player, obstacle, self.tuning.near_miss_threshold)
    }

    pub fn check_near_miss_within(&self, player: &Player, obstacle: &Obstacle, threshold: f32) -> bool {
        if !obstacle.active {
            return false;
        }

        let near = ellipse_rect_overlap(
            &self.player_ellipse(player).expanded(threshold),
            &self.obstacle_box(obstacle),
            self.tuning.ellipse_scale,
        );

        near && !self.check_player_obstacle_collision(player, obstacle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Size;
    use crate::sim::obstacle::StaticVariant;

    fn player_at(x: f32, y: f32) -> Player {
        Player::new(Vec2::new(x, y), 100)
    }

    fn block(x: f32, y: f32, w: f32, h: f32) -> Obstacle {
        Obstacle::new_static(1, Vec2::new(x, y), Size::new(w, h), StaticVariant::Panel).unwrap()
    }

    #[test]
    fn test_ellipse_margins() {
        let detector = CollisionDetector::default();
        let mut player = player_at(100.0, 100.0);

        let e = detector.player_ellipse(&player);
        assert_eq!(e.center, Vec2::new(125.0, 135.0));
        assert_eq!(e.radius_x, 25.0 - 12.0);
        assert_eq!(e.radius_y, 35.0 - 12.0);

        player.velocity.y = -150.0;
        let e = detector.player_ellipse(&player);
        assert_eq!(e.radius_x, 25.0 - 16.0);

        player.velocity.y = 0.0;
        player.is_crouching = true;
        let e = detector.player_ellipse(&player);
        assert_eq!(e.radius_x, 25.0 - 20.0);
    }

    #[test]
    fn test_ellipse_radius_never_collapses() {
        let detector = CollisionDetector::default();
        let mut player = player_at(0.0, 0.0);
        player.size = Size::new(50.0, 35.0);
        player.is_crouching = true;
        let e = detector.player_ellipse(&player);
        assert_eq!(e.radius_y, detector.tuning.min_radius);
    }

    #[test]
    fn test_overlap_uses_scaled_radius() {
        let ellipse = Ellipse {
            center: Vec2::ZERO,
            radius_x: 10.0,
            radius_y: 10.0,
        };
        // Box edge 6 units away: inside 0.7 * 10
        let near = CollisionBox::new(6.0, -5.0, 10.0, 10.0);
        assert!(ellipse_rect_overlap(&ellipse, &near, 0.7));
        // Box edge 8 units away: inside the geometric ellipse but outside 70%
        let far = CollisionBox::new(8.0, -5.0, 10.0, 10.0);
        assert!(!ellipse_rect_overlap(&ellipse, &far, 0.7));
        assert!(ellipse_rect_overlap(&ellipse, &far, 1.0));
    }

    #[test]
    fn test_direct_hit() {
        let detector = CollisionDetector::default();
        let player = player_at(100.0, 100.0);
        let obstacle = block(110.0, 120.0, 30.0, 30.0);
        assert!(detector.check_player_obstacle_collision(&player, &obstacle));
        assert!(!detector.check_near_miss(&player, &obstacle));
    }

    #[test]
    fn test_inactive_never_collides() {
        let detector = CollisionDetector::default();
        let player = player_at(100.0, 100.0);
        let mut obstacle = block(110.0, 120.0, 30.0, 30.0);
        obstacle.deactivate();
        assert!(!detector.check_player_obstacle_collision(&player, &obstacle));
        assert!(!detector.check_near_miss(&player, &obstacle));
    }

    #[test]
    fn test_near_miss_beside_obstacle() {
        let detector = CollisionDetector::default();
        let player = player_at(100.0, 100.0);
        // Just right of the player's box
        let obstacle = block(155.0, 120.0, 30.0, 30.0);
        assert!(!detector.check_player_obstacle_collision(&player, &obstacle));
        assert!(detector.check_near_miss(&player, &obstacle));

        let distant = block(300.0, 120.0, 30.0, 30.0);
        assert!(!detector.check_near_miss(&player, &distant));
    }

    #[test]
    fn test_rising_player_passes_short_obstacle() {
        // Looser ellipse so the geometry alone reaches the player's feet
        let detector = CollisionDetector::new(CollisionTuning {
            ellipse_scale: 2.0,
            ..Default::default()
        });
        let mut player = player_at(100.0, 100.0);
        // Short obstacle whose top is 10 units above the player's feet
        let obstacle = block(110.0, 160.0, 30.0, 20.0);
        assert!(detector.check_player_obstacle_collision(&player, &obstacle));

        player.velocity.y = -150.0;
        assert!(!detector.check_player_obstacle_collision(&player, &obstacle));

        // Same clearance against a tall obstacle is not forgiven
        let tall = block(110.0, 160.0, 30.0, 50.0);
        assert!(detector.check_player_obstacle_collision(&player, &tall));
    }

    #[test]
    fn test_fast_rise_apex_pass_through() {
        let detector = CollisionDetector::default();
        let mut player = player_at(100.0, 100.0);
        player.velocity.y = -400.0;
        // Tall obstacle whose top is near the player's feet
        let obstacle = block(110.0, 160.0, 30.0, 60.0);
        assert!(!detector.check_player_obstacle_collision(&player, &obstacle));
    }

    #[test]
    fn test_aabb_overlap() {
        let a = CollisionBox::new(0.0, 0.0, 10.0, 10.0);
        let b = CollisionBox::new(5.0, 5.0, 10.0, 10.0);
        let c = CollisionBox::new(10.0, 0.0, 10.0, 10.0);
        assert!(aabb_overlap(&a, &b));
        assert!(!aabb_overlap(&a, &c));
    }
}
