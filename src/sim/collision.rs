//! Narrow-phase collision detection and response for circles
//!
//! Ball-ball contacts are resolved in two parts: a positional correction that
//! pushes the pair apart in inverse proportion to mass, then an impulse along
//! the contact normal if the balls are still closing.

use glam::Vec2;

use super::body::Ball;
use crate::consts::FALLBACK_NORMAL;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the discs overlap
    pub hit: bool,
    /// Unit normal pointing from the first ball toward the second
    pub normal: Vec2,
    /// Overlap depth (sum of radii minus center distance)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// How a contact was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Discs do not overlap
    Miss,
    /// Overlap corrected, but the balls were already separating
    Separating,
    /// Overlap corrected and an impulse exchanged
    Impulse,
}

/// Check overlap between two discs
///
/// Coincident centers get `FALLBACK_NORMAL` instead of dividing by zero.
pub fn ball_ball_collision(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> CollisionResult {
    let dist_vec = b_pos - a_pos;
    let sum_radii = a_radius + b_radius;
    let dist_sq = dist_vec.length_squared();

    if dist_sq >= sum_radii * sum_radii {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > f32::EPSILON {
        dist_vec / dist
    } else {
        Vec2::new(FALLBACK_NORMAL.0, FALLBACK_NORMAL.1)
    };

    CollisionResult {
        hit: true,
        normal,
        penetration: sum_radii - dist,
    }
}

/// Detect and resolve a contact between `a` and `b` in place, using the
/// given inverse masses
///
/// `restitution` of 1.0 is perfectly elastic. Speed clamping and cosmetic
/// tinting are left to the caller. An inverse mass of zero makes that ball immovable for this contact (used
/// for a ball held by the pointer).
pub fn resolve_collision_weighted(
    a: &mut Ball,
    b: &mut Ball,
    restitution: f32,
    inv_mass_a: f32,
    inv_mass_b: f32,
) -> Resolution {
    let result = ball_ball_collision(a.pos, a.radius(), b.pos, b.radius());
    if !result.hit {
        return Resolution::Miss;
    }
    let inv_sum = inv_mass_a + inv_mass_b;
    if inv_sum <= 0.0 {
        return Resolution::Separating;
    }
    let n = result.normal;

    // Positional correction: each ball moves by the other's share of total
    // mass, i.e. its own share of total inverse mass
    a.pos -= n * (result.penetration * inv_mass_a / inv_sum);
    b.pos += n * (result.penetration * inv_mass_b / inv_sum);

    let closing_speed = (b.vel - a.vel).dot(n);
    if closing_speed > 0.0 {
        return Resolution::Separating;
    }

    let j = -(1.0 + restitution) * closing_speed / inv_sum;
    a.vel -= n * (j * inv_mass_a);
    b.vel += n * (j * inv_mass_b);
    Resolution::Impulse
}

/// Rescale `vel` down to `max_speed` if faster, keeping direction
#[inline]
pub fn clamp_speed(vel: Vec2, max_speed: f32) -> Vec2 {
    vel.clamp_length_max(max_speed)
}

/// Keep a ball inside `[0, world.x] × [0, world.y]`
///
/// A ball crossing a wall is placed against it and its velocity on that axis
/// is pointed back inward. Returns whether any wall was touched.
pub fn contain_in_world(ball: &mut Ball, world: Vec2) -> bool {
    let r = ball.radius();
    let hit_x = contain_axis(&mut ball.pos.x, &mut ball.vel.x, r, world.x);
    let hit_y = contain_axis(&mut ball.pos.y, &mut ball.vel.y, r, world.y);
    hit_x || hit_y
}

fn contain_axis(pos: &mut f32, vel: &mut f32, radius: f32, extent: f32) -> bool {
    if extent <= 2.0 * radius {
        // Narrower than the ball: park it in the middle
        *pos = extent * 0.5;
        *vel = 0.0;
        return true;
    }
    if *pos - radius < 0.0 {
        *pos = radius;
        *vel = vel.abs();
        true
    } else if *pos + radius > extent {
        *pos = extent - radius;
        *vel = -vel.abs();
        true
    } else {
        false
    }
}
