//! Per-frame simulation step and interactive grabbing
//!
//! A step runs two passes, always in this order:
//! 1. Integration: gravity, friction, displacement, speed clamp and wall
//!    containment for every free ball, then re-bucketing into the grid.
//! 2. Collisions: every cell is paired with itself and its
//!    `HALF_NEIGHBORHOOD`, and each candidate pair is resolved in place.

use glam::Vec2;
use rand::Rng;

use super::body::{Ball, spawn_population};
use super::collision::{Resolution, clamp_speed, contain_in_world, resolve_collision_weighted};
use super::grid::{HALF_NEIGHBORHOOD, SpatialGrid};
use super::tint::{CollisionTint, FasterTints};
use crate::consts::FRICTION_REFERENCE_HZ;
use crate::error::{Error, Result};
use crate::settings::{PhysicsSettings, Settings, clamp_unit};

/// Counters from one `step`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Pairs handed to the narrow phase
    pub candidate_pairs: usize,
    /// Pairs that actually overlapped
    pub collisions: usize,
    /// Overlapping pairs that were closing and exchanged an impulse
    pub impulses: usize,
    /// Balls that changed grid cell during integration
    pub rebucketed: usize,
    /// Times a ball was pushed back inside a wall
    pub wall_contacts: usize,
}

impl std::ops::AddAssign for StepStats {
    fn add_assign(&mut self, rhs: Self) {
        self.candidate_pairs += rhs.candidate_pairs;
        self.collisions += rhs.collisions;
        self.impulses += rhs.impulses;
        self.rebucketed += rhs.rebucketed;
        self.wall_contacts += rhs.wall_contacts;
    }
}

/// Interactive grab state; at most one ball is held
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrabState {
    Free,
    Grabbed {
        index: usize,
        /// Latest pointer position, clamped into the world
        pointer: Vec2,
        /// Position at the previous pointer sample
        last_pos: Vec2,
        /// Throw velocity synthesized from pointer deltas
        drag_vel: Vec2,
        /// Whether the pointer moved since the last step
        moved: bool,
    },
}

/// Owns the balls and the grid and advances them frame by frame
pub struct PhysicsController {
    balls: Vec<Ball>,
    grid: SpatialGrid,
    world: Vec2,
    settings: PhysicsSettings,
    grab: GrabState,
    /// Most recently released ball, allowed the drag ceiling until it slows
    thrown: Option<usize>,
    tint: Box<dyn CollisionTint>,
}

impl PhysicsController {
    /// Take ownership of a population inside a `world` rectangle
    ///
    /// The grid cell size is the largest ball diameter (or
    /// `settings.min_cell_size` if bigger), so overlapping balls are always
    /// in the same or adjacent cells.
    pub fn new(mut balls: Vec<Ball>, world: Vec2, settings: PhysicsSettings) -> Self {
        let settings = settings.validated();
        let max_diameter = balls.iter().map(|b| 2.0 * b.radius()).fold(0.0, f32::max);
        let cell_size = max_diameter.max(settings.min_cell_size);

        let mut grid = SpatialGrid::new(world, cell_size);
        grid.insert_all(&mut balls);
        log::info!(
            "Physics controller: {} balls, world {}x{}, grid {}x{} (cell {})",
            balls.len(),
            world.x,
            world.y,
            grid.cols(),
            grid.rows(),
            cell_size
        );

        Self {
            balls,
            grid,
            world,
            tint: Box::new(FasterTints {
                threshold: settings.tint_threshold,
            }),
            settings,
            grab: GrabState::Free,
            thrown: None,
        }
    }

    /// Spawn the population described by `settings` using `rng`
    pub fn with_random_population<R: Rng>(settings: &Settings, rng: &mut R) -> Self {
        let settings = settings.clone().validated();
        let world = settings.world_size();
        let balls = spawn_population(
            settings.effective_ball_count(),
            settings.min_radius,
            settings.max_radius,
            world,
            rng,
        );
        Self::new(balls, world, settings.physics)
    }

    /// Replace the cosmetic collision tint rule
    pub fn set_collision_tint(&mut self, tint: Box<dyn CollisionTint>) {
        self.tint = tint;
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn ball(&self, index: usize) -> Option<&Ball> {
        self.balls.get(index)
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn world(&self) -> Vec2 {
        self.world
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    pub fn grab_state(&self) -> GrabState {
        self.grab
    }

    /// Index of the held ball, if any
    pub fn grabbed(&self) -> Option<usize> {
        match self.grab {
            GrabState::Grabbed { index, .. } => Some(index),
            GrabState::Free => None,
        }
    }

    /// Speed ceiling currently applying to ball `index`
    pub fn speed_ceiling_for(&self, index: usize) -> f32 {
        if self.grabbed() == Some(index) || self.thrown == Some(index) {
            self.settings.drag_ceiling()
        } else {
            self.settings.speed_ceiling()
        }
    }

    // === Configuration (applies from the next step) ===

    pub fn set_gravity(&mut self, gravity: Vec2) -> Result<()> {
        if !gravity.is_finite() {
            log::warn!("Rejected gravity {gravity:?}");
            return Err(Error::InvalidVector {
                name: "gravity",
                value: gravity,
            });
        }
        self.settings.gravity = gravity;
        Ok(())
    }

    /// Friction is clamped into [0, 1]
    pub fn set_friction(&mut self, friction: f32) {
        self.settings.friction = clamp_unit("friction", friction, self.settings.friction);
    }

    pub fn set_max_speed(&mut self, max_speed: f32) -> Result<()> {
        self.settings.max_speed = require_positive("max_speed", max_speed)?;
        Ok(())
    }

    pub fn set_speed_multiplier(&mut self, multiplier: f32) -> Result<()> {
        self.settings.speed_multiplier = require_positive("speed_multiplier", multiplier)?;
        Ok(())
    }

    /// Restitution is clamped into [0, 1]
    pub fn set_restitution(&mut self, restitution: f32) {
        self.settings.restitution = clamp_unit("restitution", restitution, self.settings.restitution);
    }

    // === Simulation ===

    /// Advance one frame of `dt` seconds inside a `world_width × world_height`
    /// world. A non-positive `dt` does nothing.
    pub fn step(&mut self, dt: f32, world_width: f32, world_height: f32) -> StepStats {
        let mut stats = StepStats::default();
        if !(dt.is_finite() && dt > 0.0) {
            return stats;
        }

        let world = Vec2::new(world_width, world_height);
        if world != self.world {
            if world.is_finite() && world.x > 0.0 && world.y > 0.0 {
                self.world = world;
                self.grid.resize(world, &mut self.balls);
            } else {
                log::warn!("Ignoring invalid world size {world:?}");
            }
        }

        self.integrate(dt, &mut stats);
        self.collide(&mut stats);
        stats
    }

    /// Integration pass
    fn integrate(&mut self, dt: f32, stats: &mut StepStats) {
        let gravity_dv = self.settings.gravity * dt;
        let decay = (1.0 - self.settings.friction).powf(dt * FRICTION_REFERENCE_HZ);
        let displacement_scale = dt * self.settings.speed_multiplier;
        let grabbed = self.grabbed();

        if let GrabState::Grabbed {
            index,
            pointer,
            ref mut drag_vel,
            ref mut moved,
            ..
        } = self.grab
        {
            // Held still since the last frame: nothing to throw
            if !*moved {
                *drag_vel = Vec2::ZERO;
            }
            *moved = false;
            let ball = &mut self.balls[index];
            ball.pos = clamp_inside(pointer, ball.radius(), self.world);
            ball.vel = *drag_vel;
        }

        for idx in 0..self.balls.len() {
            if Some(idx) != grabbed {
                let ceiling = self.speed_ceiling_for(idx);
                let ball = &mut self.balls[idx];
                ball.vel += gravity_dv;
                ball.vel *= decay;
                ball.pos += ball.vel * displacement_scale;
                ball.vel = clamp_speed(ball.vel, ceiling);
                if contain_in_world(ball, self.world) {
                    stats.wall_contacts += 1;
                }
            }
            if self.grid.rebucket(&mut self.balls, idx) {
                stats.rebucketed += 1;
            }
        }

        if let Some(idx) = self.thrown {
            if self.balls[idx].speed() <= self.settings.speed_ceiling() {
                self.thrown = None;
            }
        }

        debug_assert!(self.grid.validate(&self.balls), "grid out of sync with balls");
    }

    /// Broad phase over the grid, narrow phase per candidate pair
    fn collide(&mut self, stats: &mut StepStats) {
        let ctx = PairContext {
            restitution: self.settings.restitution,
            ceiling: self.settings.speed_ceiling(),
            drag_ceiling: self.settings.drag_ceiling(),
            held: self.grabbed(),
            thrown: self.thrown,
            world: self.world,
            tint: self.tint.as_ref(),
        };
        let balls = &mut self.balls;
        let grid = &self.grid;

        for cell in grid.cells_in_order() {
            let here = grid.cell(cell);
            for (i, &a) in here.iter().enumerate() {
                for &b in &here[i + 1..] {
                    ctx.resolve(balls, a, b, stats);
                }
            }
            for (dc, dr) in HALF_NEIGHBORHOOD {
                let Some(other) = grid.offset(cell, dc, dr) else {
                    continue;
                };
                let there = grid.cell(other);
                for &a in here {
                    for &b in there {
                        ctx.resolve(balls, a, b, stats);
                    }
                }
            }
        }
    }

    // === Interactive grabbing ===

    /// Lowest-index ball whose disc contains `point`
    pub fn ball_at(&self, point: Vec2) -> Option<usize> {
        let center = self.grid.cell_for_position(point);
        let mut best: Option<usize> = None;
        for dc in -1..=1 {
            for dr in -1..=1 {
                let Some(cell) = self.grid.offset(center, dc, dr) else {
                    continue;
                };
                for &idx in self.grid.cell(cell) {
                    if self.balls[idx].contains_point(point) && best.is_none_or(|b| idx < b) {
                        best = Some(idx);
                    }
                }
            }
        }
        best
    }

    /// Grab the first ball under `point`
    ///
    /// Does nothing while a ball is already held. The grabbed ball stops
    /// immediately.
    pub fn on_pointer_down(&mut self, point: Vec2) -> Option<usize> {
        if let Some(held) = self.grabbed() {
            log::debug!("Pointer down ignored, ball {held} already held");
            return None;
        }
        let index = self.ball_at(point)?;
        let ball = &mut self.balls[index];
        ball.vel = Vec2::ZERO;
        self.grab = GrabState::Grabbed {
            index,
            pointer: ball.pos,
            last_pos: ball.pos,
            drag_vel: Vec2::ZERO,
            moved: false,
        };
        if self.thrown == Some(index) {
            self.thrown = None;
        }
        log::debug!("Grabbed ball {index} at {:?}", ball.pos);
        Some(index)
    }

    /// Move the held ball to `point` and derive its throw velocity.
    /// Returns `false` when nothing is held.
    pub fn on_pointer_move(&mut self, point: Vec2) -> bool {
        let GrabState::Grabbed {
            index,
            ref mut pointer,
            ref mut last_pos,
            ref mut drag_vel,
            ref mut moved,
        } = self.grab
        else {
            return false;
        };
        if !point.is_finite() {
            return true;
        }

        let ball = &mut self.balls[index];
        let new_pos = clamp_inside(point, ball.radius(), self.world);
        let vel = (new_pos - *last_pos) / self.settings.drag_reference_dt;
        *drag_vel = clamp_speed(vel, self.settings.drag_ceiling());
        *pointer = new_pos;
        *last_pos = new_pos;
        *moved = true;

        ball.pos = new_pos;
        ball.vel = *drag_vel;
        true
    }

    /// Release the held ball with its last drag velocity
    pub fn on_pointer_up(&mut self) -> Option<usize> {
        let GrabState::Grabbed {
            index, drag_vel, ..
        } = self.grab
        else {
            return None;
        };
        self.grab = GrabState::Free;

        let ball = &mut self.balls[index];
        ball.vel = clamp_speed(drag_vel, self.settings.drag_ceiling());
        self.thrown = (ball.speed() > self.settings.speed_ceiling()).then_some(index);
        log::debug!("Released ball {index} at {:.1} units/s", ball.speed());
        Some(index)
    }
}

fn require_positive(name: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        log::warn!("Rejected {name} {value}");
        Err(Error::InvalidParameter { name, value })
    }
}

/// Clamp `point` so a ball of `radius` centered there stays inside the world
fn clamp_inside(point: Vec2, radius: f32, world: Vec2) -> Vec2 {
    let axis = |v: f32, extent: f32| {
        if extent <= 2.0 * radius {
            extent * 0.5
        } else {
            v.clamp(radius, extent - radius)
        }
    };
    Vec2::new(axis(point.x, world.x), axis(point.y, world.y))
}

/// Borrow two distinct balls mutably
fn pair_mut(balls: &mut [Ball], a: usize, b: usize) -> (&mut Ball, &mut Ball) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = balls.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = balls.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}

/// Per-step constants for the narrow phase
struct PairContext<'a> {
    restitution: f32,
    ceiling: f32,
    drag_ceiling: f32,
    /// Held ball: kinematic in contacts and uses the drag ceiling
    held: Option<usize>,
    /// Just-released ball, also on the drag ceiling
    thrown: Option<usize>,
    world: Vec2,
    tint: &'a dyn CollisionTint,
}

impl PairContext<'_> {
    #[inline]
    fn ceiling_for(&self, idx: usize) -> f32 {
        if self.held == Some(idx) || self.thrown == Some(idx) {
            self.drag_ceiling
        } else {
            self.ceiling
        }
    }

    #[inline]
    fn inv_mass_for(&self, idx: usize, ball: &Ball) -> f32 {
        if self.held == Some(idx) {
            0.0
        } else {
            ball.inv_mass()
        }
    }

    fn resolve(&self, balls: &mut [Ball], a: usize, b: usize, stats: &mut StepStats) {
        stats.candidate_pairs += 1;
        let (ball_a, ball_b) = pair_mut(balls, a, b);

        let inv_a = self.inv_mass_for(a, ball_a);
        let inv_b = self.inv_mass_for(b, ball_b);

        match resolve_collision_weighted(ball_a, ball_b, self.restitution, inv_a, inv_b) {
            Resolution::Miss => return,
            Resolution::Separating => stats.collisions += 1,
            Resolution::Impulse => {
                stats.collisions += 1;
                stats.impulses += 1;
                ball_a.vel = clamp_speed(ball_a.vel, self.ceiling_for(a));
                ball_b.vel = clamp_speed(ball_b.vel, self.ceiling_for(b));
                self.tint.on_collision(ball_a, ball_b);
            }
        }

        // Positional correction must not push a ball through a wall
        if contain_in_world(ball_a, self.world) {
            stats.wall_contacts += 1;
        }
        if contain_in_world(ball_b, self.world) {
            stats.wall_contacts += 1;
        }
    }
}
