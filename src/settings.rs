//! Simulation settings
//!
//! Persisted as JSON. Every field has a default so partial files load.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::Result;
use crate::renderer::VisualizationMode;

/// Population size presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PopulationPreset {
    Sparse,
    #[default]
    Medium,
    Dense,
}

impl PopulationPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            PopulationPreset::Sparse => "Sparse",
            PopulationPreset::Medium => "Medium",
            PopulationPreset::Dense => "Dense",
        }
    }

    /// Number of balls spawned for this preset
    pub fn ball_count(&self) -> usize {
        match self {
            PopulationPreset::Sparse => 1_000,
            PopulationPreset::Medium => 10_000,
            PopulationPreset::Dense => 30_000,
        }
    }
}

impl fmt::Display for PopulationPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PopulationPreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sparse" | "low" => Ok(PopulationPreset::Sparse),
            "medium" | "med" => Ok(PopulationPreset::Medium),
            "dense" | "high" => Ok(PopulationPreset::Dense),
            other => Err(format!("unknown population preset `{other}`")),
        }
    }
}

/// Physics tuning, adjustable at runtime through `PhysicsController` setters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Constant acceleration (world units/s²)
    pub gravity: Vec2,
    /// Fraction of velocity lost per 60 Hz tick (0 - 1)
    pub friction: f32,
    /// Speed ceiling for free balls before the multiplier
    pub max_speed: f32,
    /// Scales displacement per step and the speed ceiling
    pub speed_multiplier: f32,
    /// Ball-ball restitution (1.0 = perfectly elastic)
    pub restitution: f32,
    /// Held and just-thrown balls may reach this multiple of the free ceiling
    pub drag_speed_factor: f32,
    /// Timestep used to turn pointer deltas into a throw velocity
    pub drag_reference_dt: f32,
    /// Speed difference that triggers collision tinting
    pub tint_threshold: f32,
    /// Lower bound on grid cell size (the largest ball diameter wins if bigger)
    pub min_cell_size: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(DEFAULT_GRAVITY.0, DEFAULT_GRAVITY.1),
            friction: DEFAULT_FRICTION,
            max_speed: DEFAULT_MAX_SPEED,
            speed_multiplier: 1.0,
            restitution: DEFAULT_RESTITUTION,
            drag_speed_factor: DEFAULT_DRAG_SPEED_FACTOR,
            drag_reference_dt: SIM_DT,
            tint_threshold: DEFAULT_TINT_THRESHOLD,
            min_cell_size: 1.0,
        }
    }
}

impl PhysicsSettings {
    /// Speed ceiling for free balls
    #[inline]
    pub fn speed_ceiling(&self) -> f32 {
        self.max_speed * self.speed_multiplier
    }

    /// Looser ceiling for held and just-released balls
    #[inline]
    pub fn drag_ceiling(&self) -> f32 {
        self.speed_ceiling() * self.drag_speed_factor.max(1.0)
    }

    /// Replace out-of-domain values with the nearest valid (or default) value
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if !self.gravity.is_finite() {
            log::warn!("gravity {:?} is not finite, using default", self.gravity);
            self.gravity = defaults.gravity;
        }
        self.friction = clamp_unit("friction", self.friction, defaults.friction);
        self.restitution = clamp_unit("restitution", self.restitution, defaults.restitution);
        self.max_speed = positive_or("max_speed", self.max_speed, defaults.max_speed);
        self.speed_multiplier =
            positive_or("speed_multiplier", self.speed_multiplier, defaults.speed_multiplier);
        self.drag_reference_dt =
            positive_or("drag_reference_dt", self.drag_reference_dt, defaults.drag_reference_dt);
        self.min_cell_size = positive_or("min_cell_size", self.min_cell_size, defaults.min_cell_size);
        if !(self.drag_speed_factor >= 1.0) {
            log::warn!("drag_speed_factor {} below 1, using 1", self.drag_speed_factor);
            self.drag_speed_factor = 1.0;
        }
        if !(self.tint_threshold >= 0.0) {
            log::warn!("tint_threshold {} is negative, using 0", self.tint_threshold);
            self.tint_threshold = 0.0;
        }
        self
    }
}

/// Clamp into [0, 1]; NaN falls back to `default`
pub(crate) fn clamp_unit(name: &str, value: f32, default: f32) -> f32 {
    if value.is_nan() {
        log::warn!("{name} is NaN, using {default}");
        return default;
    }
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        log::warn!("{name} {value} out of [0, 1], clamped to {clamped}");
    }
    clamped
}

fn positive_or(name: &str, value: f32, default: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        log::warn!("{name} {value} must be positive, using {default}");
        default
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed for the population RNG
    pub seed: u64,
    /// Population size preset
    pub population: PopulationPreset,
    /// Explicit ball count, overriding the preset
    pub ball_count: Option<usize>,
    pub min_radius: f32,
    pub max_radius: f32,
    pub world_width: f32,
    pub world_height: f32,
    /// How the renderer colors balls
    pub visualization: VisualizationMode,
    pub physics: PhysicsSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 42,
            population: PopulationPreset::Medium,
            ball_count: None,
            min_radius: DEFAULT_MIN_RADIUS,
            max_radius: DEFAULT_MAX_RADIUS,
            world_width: DEFAULT_WORLD_WIDTH,
            world_height: DEFAULT_WORLD_HEIGHT,
            visualization: VisualizationMode::Body,
            physics: PhysicsSettings::default(),
        }
    }
}

impl Settings {
    /// Create settings from a population preset
    pub fn from_preset(preset: PopulationPreset) -> Self {
        Self {
            population: preset,
            ..Self::default()
        }
    }

    /// Switch preset, dropping any explicit ball count
    pub fn apply_preset(&mut self, preset: PopulationPreset) {
        self.population = preset;
        self.ball_count = None;
    }

    /// Number of balls to spawn
    pub fn effective_ball_count(&self) -> usize {
        self.ball_count.unwrap_or_else(|| self.population.ball_count())
    }

    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.world_width, self.world_height)
    }

    /// Fix out-of-domain values, logging each correction
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        self.min_radius = positive_or("min_radius", self.min_radius, defaults.min_radius);
        self.max_radius = positive_or("max_radius", self.max_radius, defaults.max_radius);
        if self.min_radius > self.max_radius {
            log::warn!(
                "min_radius {} exceeds max_radius {}, swapping",
                self.min_radius,
                self.max_radius
            );
            std::mem::swap(&mut self.min_radius, &mut self.max_radius);
        }
        self.world_width = positive_or("world_width", self.world_width, defaults.world_width);
        self.world_height = positive_or("world_height", self.world_height, defaults.world_height);
        self.physics = self.physics.validated();
        self
    }

    /// Load settings from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings: Settings = serde_json::from_str(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings.validated())
    }

    /// Save settings as pretty JSON
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parsing() {
        assert_eq!("dense".parse::<PopulationPreset>(), Ok(PopulationPreset::Dense));
        assert_eq!("MED".parse::<PopulationPreset>(), Ok(PopulationPreset::Medium));
        assert!("huge".parse::<PopulationPreset>().is_err());
        assert_eq!(PopulationPreset::Sparse.to_string(), "Sparse");
    }

    #[test]
    fn test_effective_ball_count() {
        let mut settings = Settings::from_preset(PopulationPreset::Sparse);
        assert_eq!(settings.effective_ball_count(), 1_000);
        settings.ball_count = Some(12);
        assert_eq!(settings.effective_ball_count(), 12);
        settings.apply_preset(PopulationPreset::Dense);
        assert_eq!(settings.effective_ball_count(), 30_000);
    }

    #[test]
    fn test_physics_validation_clamps() {
        let physics = PhysicsSettings {
            gravity: Vec2::new(f32::NAN, 0.0),
            friction: 1.5,
            max_speed: -3.0,
            speed_multiplier: 0.0,
            restitution: f32::NAN,
            drag_speed_factor: 0.5,
            tint_threshold: -1.0,
            ..PhysicsSettings::default()
        }
        .validated();

        let defaults = PhysicsSettings::default();
        assert_eq!(physics.gravity, defaults.gravity);
        assert_eq!(physics.friction, 1.0);
        assert_eq!(physics.max_speed, defaults.max_speed);
        assert_eq!(physics.speed_multiplier, 1.0);
        assert_eq!(physics.restitution, defaults.restitution);
        assert_eq!(physics.drag_speed_factor, 1.0);
        assert_eq!(physics.tint_threshold, 0.0);
    }

    #[test]
    fn test_ceilings() {
        let physics = PhysicsSettings {
            max_speed: 100.0,
            speed_multiplier: 2.0,
            drag_speed_factor: 3.0,
            ..PhysicsSettings::default()
        };
        assert_eq!(physics.speed_ceiling(), 200.0);
        assert_eq!(physics.drag_ceiling(), 600.0);
    }

    #[test]
    fn test_settings_validation_swaps_radii() {
        let settings = Settings {
            min_radius: 8.0,
            max_radius: 3.0,
            world_width: 0.0,
            ..Settings::default()
        }
        .validated();
        assert_eq!((settings.min_radius, settings.max_radius), (3.0, 8.0));
        assert_eq!(settings.world_width, DEFAULT_WORLD_WIDTH);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "seed": 7, "physics": { "friction": 0.1 } }"#).unwrap();
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.physics.friction, 0.1);
        assert_eq!(settings.physics.max_speed, DEFAULT_MAX_SPEED);
        assert_eq!(settings.population, PopulationPreset::Medium);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("ballpit-settings-{}.json", std::process::id()));
        let mut settings = Settings::from_preset(PopulationPreset::Sparse);
        settings.physics.gravity = Vec2::new(0.0, -9.8);
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.population, PopulationPreset::Sparse);
        assert_eq!(loaded.physics, settings.physics);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_errors() {
        let path = std::env::temp_dir().join("ballpit-does-not-exist.json");
        assert!(matches!(Settings::load_from(&path), Err(crate::Error::Io(_))));
    }
}
