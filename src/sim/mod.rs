//! Deterministic simulation module
//!
//! All physics lives here. This module must stay pure and deterministic:
//! - Caller-supplied timestep
//! - Seeded RNG only, passed in explicitly
//! - Stable iteration order (grid storage order, then insertion order)
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod controller;
pub mod grid;
pub mod tint;

pub use body::{Ball, Rgba, hsv_to_rgb, spawn_population};
pub use collision::{
    CollisionResult, Resolution, ball_ball_collision, clamp_speed, contain_in_world,
    resolve_collision_weighted,
};
pub use controller::{GrabState, PhysicsController, StepStats};
pub use grid::{CellCoord, CellSlot, HALF_NEIGHBORHOOD, SpatialGrid};
pub use tint::{CollisionTint, FasterTints, NoTint};
