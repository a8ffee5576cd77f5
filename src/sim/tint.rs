//! Cosmetic color exchange on collision
//!
//! Purely visual: implementations may rewrite `Ball::color` but must not
//! touch position, velocity or mass.

use super::body::Ball;

/// Hook run after every impulse-resolved collision
pub trait CollisionTint {
    fn on_collision(&self, a: &mut Ball, b: &mut Ball);
}

/// The faster ball paints the slower one when their speeds differ by more
/// than `threshold`
#[derive(Debug, Clone, Copy)]
pub struct FasterTints {
    pub threshold: f32,
}

impl CollisionTint for FasterTints {
    fn on_collision(&self, a: &mut Ball, b: &mut Ball) {
        let (speed_a, speed_b) = (a.speed(), b.speed());
        if (speed_a - speed_b).abs() <= self.threshold {
            return;
        }
        if speed_a > speed_b {
            b.color = a.color;
        } else {
            a.color = b.color;
        }
    }
}

/// Colors never change
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTint;

impl CollisionTint for NoTint {
    fn on_collision(&self, _a: &mut Ball, _b: &mut Ball) {}
}
