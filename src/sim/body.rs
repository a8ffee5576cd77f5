//! Ball bodies and population spawning

use glam::Vec2;
use rand::Rng;

use super::grid::{CellCoord, CellSlot};
use crate::consts::MASS_DENSITY;

/// Linear RGBA color, opaque to the physics
pub type Rgba = [f32; 4];

/// Smallest radius a ball may have (keeps mass and inverse mass finite)
pub const MIN_BALL_RADIUS: f32 = 0.01;

/// A simulated rigid disc
///
/// Radius and mass are fixed at construction; mass is always
/// `radius² · MASS_DENSITY`.
#[derive(Debug, Clone)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    radius: f32,
    mass: f32,
    /// Presentation color, only rewritten by collision tinting
    pub color: Rgba,
    /// Grid cell and position inside it; owned by `SpatialGrid`
    pub(crate) slot: Option<CellSlot>,
}

impl Ball {
    pub fn new(pos: Vec2, radius: f32, color: Rgba) -> Self {
        let radius = if radius.is_finite() {
            radius.max(MIN_BALL_RADIUS)
        } else {
            MIN_BALL_RADIUS
        };
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
            mass: radius * radius * MASS_DENSITY,
            color,
            slot: None,
        }
    }

    /// Builder-style initial velocity
    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        1.0 / self.mass
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Whether `point` lies inside this ball's collision disc
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.pos.distance_squared(point) <= self.radius * self.radius
    }

    /// Grid cell currently holding this ball, if bucketed
    pub fn cell(&self) -> Option<CellCoord> {
        self.slot.map(|s| s.cell)
    }
}

/// Spawn `count` resting balls uniformly inside a `world` rectangle
///
/// Radii are drawn from `min_radius..=max_radius`, colors from a random hue.
/// All randomness comes from `rng` so a seeded generator reproduces the
/// same population.
pub fn spawn_population<R: Rng>(
    count: usize,
    min_radius: f32,
    max_radius: f32,
    world: Vec2,
    rng: &mut R,
) -> Vec<Ball> {
    let (lo, hi) = if min_radius <= max_radius {
        (min_radius, max_radius)
    } else {
        (max_radius, min_radius)
    };
    let lo = lo.max(MIN_BALL_RADIUS);
    let hi = hi.max(lo);

    (0..count)
        .map(|_| {
            let radius = rng.random_range(lo..=hi);
            let pos = Vec2::new(
                random_axis(rng, radius, world.x),
                random_axis(rng, radius, world.y),
            );
            let color = hsv_to_rgb(rng.random_range(0.0..1.0), 0.75, 0.95);
            Ball::new(pos, radius, color)
        })
        .collect()
}

/// Random coordinate keeping a ball of `radius` inside `[0, extent]`
fn random_axis<R: Rng>(rng: &mut R, radius: f32, extent: f32) -> f32 {
    if extent <= 2.0 * radius {
        extent * 0.5
    } else {
        rng.random_range(radius..=extent - radius)
    }
}

/// HSV (all components in 0-1) to opaque RGBA
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgba {
    let h6 = h.rem_euclid(1.0) * 6.0;
    let c = v * s;
    let x = c * (1.0 - ((h6 % 2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h6 as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r + m, g + m, b + m, 1.0]
}
