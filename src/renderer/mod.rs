//! Read-only extraction of simulation state for an external renderer
//!
//! Nothing here mutates the simulation. A renderer picks a `Visualizer`,
//! fills a `BallInstance` buffer once per frame and uploads the bytes.

pub mod instance;
pub mod visualize;

pub use instance::BallInstance;
pub use visualize::{
    BodyColor, MassShade, SpeedHeat, VisualizationMode, Visualizer, extract_instances,
};
