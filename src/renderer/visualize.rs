//! Visualization modes: how a ball's state maps to its drawn color

use serde::{Deserialize, Serialize};

use super::instance::BallInstance;
use crate::settings::PhysicsSettings;
use crate::sim::{Ball, Rgba};

/// Color strategy for rendering
pub trait Visualizer {
    fn color(&self, ball: &Ball) -> Rgba;
}

/// The ball's own (collision-tinted) color
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyColor;

impl Visualizer for BodyColor {
    fn color(&self, ball: &Ball) -> Rgba {
        ball.color
    }
}

/// Blue (slow) through green and yellow to red (fast)
#[derive(Debug, Clone, Copy)]
pub struct SpeedHeat {
    pub min_speed: f32,
    pub max_speed: f32,
}

impl Visualizer for SpeedHeat {
    fn color(&self, ball: &Ball) -> Rgba {
        let span = (self.max_speed - self.min_speed).max(f32::EPSILON);
        let t = ((ball.speed() - self.min_speed) / span).clamp(0.0, 1.0);
        heat_ramp(t, ball.color[3])
    }
}

/// Dark (light) to bright (heavy) tint of the ball's own hue
#[derive(Debug, Clone, Copy)]
pub struct MassShade {
    pub min_mass: f32,
    pub max_mass: f32,
}

impl Visualizer for MassShade {
    fn color(&self, ball: &Ball) -> Rgba {
        let span = (self.max_mass - self.min_mass).max(f32::EPSILON);
        let t = ((ball.mass() - self.min_mass) / span).clamp(0.0, 1.0);
        let shade = 0.35 + 0.65 * t;
        let [r, g, b, a] = ball.color;
        [r * shade, g * shade, b * shade, a]
    }
}

/// Color gradient: blue -> cyan -> green -> yellow -> red
fn heat_ramp(t: f32, alpha: f32) -> Rgba {
    let (r, g, b) = if t < 0.25 {
        let u = t / 0.25;
        (0.2, 0.4 + 0.4 * u, 1.0)
    } else if t < 0.5 {
        let u = (t - 0.25) / 0.25;
        (0.2, 0.8, 1.0 - 0.6 * u)
    } else if t < 0.75 {
        let u = (t - 0.5) / 0.25;
        (0.2 + 0.8 * u, 0.8, 0.4 - 0.2 * u)
    } else {
        let u = (t - 0.75) / 0.25;
        (1.0, 0.8 - 0.5 * u, 0.2)
    };
    [r, g, b, alpha]
}

/// Selectable visualization, persisted in settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VisualizationMode {
    #[default]
    Body,
    Speed,
    Mass,
}

impl VisualizationMode {
    /// Build the strategy for this mode, scaled to the current physics and
    /// population
    pub fn visualizer(&self, physics: &PhysicsSettings, balls: &[Ball]) -> Box<dyn Visualizer> {
        match self {
            VisualizationMode::Body => Box::new(BodyColor),
            VisualizationMode::Speed => Box::new(SpeedHeat {
                min_speed: 0.0,
                max_speed: physics.speed_ceiling(),
            }),
            VisualizationMode::Mass => {
                let (min_mass, max_mass) = balls.iter().fold((f32::MAX, 0.0f32), |(lo, hi), b| {
                    (lo.min(b.mass()), hi.max(b.mass()))
                });
                Box::new(MassShade {
                    min_mass: min_mass.min(max_mass),
                    max_mass,
                })
            }
        }
    }
}

/// Refill `out` with one instance per ball, in ball order
pub fn extract_instances(balls: &[Ball], visualizer: &dyn Visualizer, out: &mut Vec<BallInstance>) {
    out.clear();
    out.extend(
        balls
            .iter()
            .map(|b| BallInstance::new(b.pos.x, b.pos.y, b.radius(), visualizer.color(b))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    const GREY: Rgba = [0.5, 0.5, 0.5, 1.0];

    #[test]
    fn test_extract_body_color() {
        let balls = vec![
            Ball::new(Vec2::new(1.0, 2.0), 3.0, GREY),
            Ball::new(Vec2::new(4.0, 5.0), 1.0, [1.0; 4]),
        ];
        let mut out = vec![BallInstance::new(0.0, 0.0, 0.0, [0.0; 4]); 5];
        extract_instances(&balls, &BodyColor, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], BallInstance::new(1.0, 2.0, 3.0, GREY));
        assert_eq!(out[1].radius, 1.0);
    }

    #[test]
    fn test_speed_heat_endpoints() {
        let heat = SpeedHeat {
            min_speed: 0.0,
            max_speed: 100.0,
        };
        let slow = Ball::new(Vec2::ZERO, 1.0, GREY);
        let fast = Ball::new(Vec2::ZERO, 1.0, GREY).with_velocity(Vec2::new(500.0, 0.0));
        assert_eq!(heat.color(&slow), [0.2, 0.4, 1.0, 1.0]);
        let hot = heat.color(&fast);
        assert_eq!(hot[0], 1.0);
        assert!((hot[1] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_mass_shade_brightens_heavy_balls() {
        let balls = vec![
            Ball::new(Vec2::ZERO, 1.0, GREY),
            Ball::new(Vec2::ZERO, 4.0, GREY),
        ];
        let vis = VisualizationMode::Mass.visualizer(&PhysicsSettings::default(), &balls);
        let light = vis.color(&balls[0]);
        let heavy = vis.color(&balls[1]);
        assert!(heavy[0] > light[0]);
        assert!((heavy[0] - 0.5).abs() < 1e-6);
        assert_eq!(light[3], 1.0);
    }

    #[test]
    fn test_mass_mode_with_no_balls() {
        let vis = VisualizationMode::Mass.visualizer(&PhysicsSettings::default(), &[]);
        let ball = Ball::new(Vec2::ZERO, 2.0, GREY);
        assert!(vis.color(&ball).iter().all(|c| c.is_finite()));
    }
}
