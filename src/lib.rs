//! Ballpit - real-time 2D rigid-circle physics
//!
//! Core modules:
//! - `sim`: Deterministic simulation (integration, spatial grid, collisions, grabbing)
//! - `renderer`: Read-only extraction of ball state for an external renderer
//! - `settings`: Tunable physics and population parameters
//! - `error`: Crate error type

pub mod error;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{Error, Result};
pub use settings::{PhysicsSettings, PopulationPreset, Settings};
pub use sim::{Ball, PhysicsController, SpatialGrid, StepStats};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Friction is specified per tick at this rate and rescaled for other timesteps
    pub const FRICTION_REFERENCE_HZ: f32 = 60.0;

    /// Upper bound on spatial grid cells; larger worlds get coarser cells
    pub const MAX_GRID_CELLS: usize = 1 << 20;

    /// Mass per unit of squared radius (mass = radius² · density)
    pub const MASS_DENSITY: f32 = 1.0;

    /// Default physics tuning
    pub const DEFAULT_GRAVITY: (f32, f32) = (0.0, -300.0);
    pub const DEFAULT_FRICTION: f32 = 0.002;
    pub const DEFAULT_MAX_SPEED: f32 = 600.0;
    pub const DEFAULT_RESTITUTION: f32 = 1.0;
    /// Held balls may move this many times faster than free ones
    pub const DEFAULT_DRAG_SPEED_FACTOR: f32 = 3.0;
    /// Speed difference above which the faster ball paints the slower one
    pub const DEFAULT_TINT_THRESHOLD: f32 = 250.0;

    /// Default population
    pub const DEFAULT_MIN_RADIUS: f32 = 2.0;
    pub const DEFAULT_MAX_RADIUS: f32 = 6.0;
    pub const DEFAULT_WORLD_WIDTH: f32 = 1000.0;
    pub const DEFAULT_WORLD_HEIGHT: f32 = 1000.0;

    /// Normal used when two ball centers coincide exactly
    pub const FALLBACK_NORMAL: (f32, f32) = (1.0, 0.0);
}
