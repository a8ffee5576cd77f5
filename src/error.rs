//! Crate error type

use glam::Vec2;
use thiserror::Error;

/// Errors surfaced by configuration and settings persistence.
///
/// The simulation step itself never fails; degenerate geometry is
/// recovered locally.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid value {value} for parameter `{name}`")]
    InvalidParameter { name: &'static str, value: f32 },

    #[error("invalid vector {value} for parameter `{name}`")]
    InvalidVector { name: &'static str, value: Vec2 },

    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
