use ballpit::consts::SIM_DT;
use ballpit::{Ball, PhysicsController, PhysicsSettings, Settings};
use glam::Vec2;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

const WHITE: [f32; 4] = [1.0; 4];

/// Physics with no gravity or friction and a generous speed ceiling
fn frictionless(max_speed: f32) -> PhysicsSettings {
    PhysicsSettings {
        gravity: Vec2::ZERO,
        friction: 0.0,
        max_speed,
        ..PhysicsSettings::default()
    }
}

/// Seeded population of `count` balls in a `width × height` world
fn seeded_controller(
    seed: u64,
    count: usize,
    width: f32,
    height: f32,
    radii: (f32, f32),
) -> PhysicsController {
    let settings = Settings {
        seed,
        ball_count: Some(count),
        min_radius: radii.0,
        max_radius: radii.1,
        world_width: width,
        world_height: height,
        ..Settings::default()
    };
    let mut rng = Pcg32::seed_from_u64(seed);
    PhysicsController::with_random_population(&settings, &mut rng)
}

fn step_n(controller: &mut PhysicsController, n: usize, dt: f32) {
    let world = controller.world();
    for _ in 0..n {
        controller.step(dt, world.x, world.y);
    }
}

#[test]
fn test_head_on_pair_swaps_velocities() {
    let balls = vec![
        Ball::new(Vec2::new(9.0, 10.0), 1.0, WHITE).with_velocity(Vec2::new(1.0, 0.0)),
        Ball::new(Vec2::new(10.5, 10.0), 1.0, WHITE).with_velocity(Vec2::new(-1.0, 0.0)),
    ];
    let mut controller = PhysicsController::new(balls, Vec2::new(20.0, 20.0), frictionless(10.0));
    let momentum_before: Vec2 = controller.balls().iter().map(|b| b.vel * b.mass()).sum();

    let stats = controller.step(0.01, 20.0, 20.0);

    assert_eq!(stats.collisions, 1);
    assert_eq!(stats.impulses, 1);
    let a = &controller.balls()[0];
    let b = &controller.balls()[1];
    assert!((a.vel - Vec2::new(-1.0, 0.0)).length() < 1e-5, "a.vel = {:?}", a.vel);
    assert!((b.vel - Vec2::new(1.0, 0.0)).length() < 1e-5, "b.vel = {:?}", b.vel);

    let momentum_after = a.vel * a.mass() + b.vel * b.mass();
    assert!((momentum_after - momentum_before).length() < 1e-5);
}

#[test]
fn test_resolved_pair_no_longer_overlaps() {
    let balls = vec![
        Ball::new(Vec2::new(9.0, 10.0), 1.0, WHITE).with_velocity(Vec2::new(1.0, 0.0)),
        Ball::new(Vec2::new(10.5, 10.0), 1.0, WHITE).with_velocity(Vec2::new(-1.0, 0.0)),
    ];
    let mut controller = PhysicsController::new(balls, Vec2::new(20.0, 20.0), frictionless(10.0));
    controller.step(0.01, 20.0, 20.0);

    let a = &controller.balls()[0];
    let b = &controller.balls()[1];
    assert!(a.pos.distance(b.pos) >= a.radius() + b.radius() - 1e-4);
}

#[test]
fn test_falling_ball_bounces_at_floor() {
    let radius = 1.0;
    let ball = Ball::new(Vec2::new(10.0, radius + 5.0), radius, WHITE);
    let physics = PhysicsSettings {
        gravity: Vec2::new(0.0, -9.8),
        friction: 0.0,
        max_speed: 100.0,
        ..PhysicsSettings::default()
    };
    let mut controller = PhysicsController::new(vec![ball], Vec2::new(20.0, 20.0), physics);

    let mut bounced = false;
    for _ in 0..500 {
        let falling = controller.balls()[0].vel.y;
        controller.step(0.01, 20.0, 20.0);
        let ball = &controller.balls()[0];
        if falling < 0.0 && ball.vel.y > 0.0 {
            assert!((ball.pos.y - radius).abs() < 1e-5, "bounced at y = {}", ball.pos.y);
            // Roughly sqrt(2 g h) for a 5 unit drop
            assert!((ball.vel.y - 9.9).abs() < 0.2, "rebound speed {}", ball.vel.y);
            bounced = true;
            break;
        }
    }
    assert!(bounced, "ball never reached the floor");
}

#[test]
fn test_dense_population_is_sub_quadratic() {
    let n = 10_000;
    let mut controller = seeded_controller(1, n, 1000.0, 1000.0, (2.0, 6.0));
    assert_eq!(controller.len(), n);

    for _ in 0..3 {
        let stats = controller.step(SIM_DT, 1000.0, 1000.0);
        assert!(
            stats.candidate_pairs < 20 * n,
            "{} candidate pairs for {n} balls",
            stats.candidate_pairs
        );
        assert!(controller.grid().validate(controller.balls()));
    }
}

#[test]
fn test_same_seed_same_trajectory() {
    let mut a = seeded_controller(7, 500, 300.0, 300.0, (2.0, 6.0));
    let mut b = seeded_controller(7, 500, 300.0, 300.0, (2.0, 6.0));
    step_n(&mut a, 30, SIM_DT);
    step_n(&mut b, 30, SIM_DT);

    for (x, y) in a.balls().iter().zip(b.balls()) {
        assert_eq!(x.pos, y.pos);
        assert_eq!(x.vel, y.vel);
        assert_eq!(x.color, y.color);
    }
}

#[test]
fn test_only_one_ball_held_at_a_time() {
    let balls = vec![
        Ball::new(Vec2::new(20.0, 20.0), 3.0, WHITE),
        Ball::new(Vec2::new(60.0, 60.0), 3.0, WHITE),
    ];
    let mut controller = PhysicsController::new(balls, Vec2::new(100.0, 100.0), frictionless(100.0));

    assert_eq!(controller.on_pointer_down(Vec2::new(20.0, 20.0)), Some(0));
    assert_eq!(controller.on_pointer_down(Vec2::new(60.0, 60.0)), None);
    assert_eq!(controller.grabbed(), Some(0));

    assert_eq!(controller.on_pointer_up(), Some(0));
    assert_eq!(controller.grabbed(), None);
    assert_eq!(controller.on_pointer_down(Vec2::new(60.0, 60.0)), Some(1));
}

#[test]
fn test_fling_keeps_drag_ceiling_until_slowed() {
    let ball = Ball::new(Vec2::new(100.0, 100.0), 5.0, WHITE);
    let mut controller = PhysicsController::new(vec![ball], Vec2::new(200.0, 200.0), frictionless(100.0));

    assert_eq!(controller.on_pointer_down(Vec2::new(100.0, 100.0)), Some(0));
    assert!(controller.on_pointer_move(Vec2::new(102.0, 100.0)));
    assert_eq!(controller.on_pointer_up(), Some(0));

    // 2 units over one 60 Hz reference tick, above the free ceiling of 100
    let thrown = controller.balls()[0].vel;
    assert!((thrown.x - 120.0).abs() < 1e-3, "thrown at {thrown:?}");

    controller.step(SIM_DT, 200.0, 200.0);
    let ball = &controller.balls()[0];
    assert!((ball.speed() - 120.0).abs() < 1e-3);
    assert!((ball.pos.x - 104.0).abs() < 1e-3);
}

#[test]
fn test_population_survives_world_shrink() {
    let mut controller = seeded_controller(3, 200, 200.0, 200.0, (1.0, 3.0));
    step_n(&mut controller, 5, SIM_DT);

    controller.step(SIM_DT, 120.0, 80.0);
    assert_eq!(controller.world(), Vec2::new(120.0, 80.0));
    assert!(controller.grid().validate(controller.balls()));
    for ball in controller.balls() {
        assert!(ball.pos.x >= ball.radius() - 1e-3 && ball.pos.x <= 120.0 - ball.radius() + 1e-3);
        assert!(ball.pos.y >= ball.radius() - 1e-3 && ball.pos.y <= 80.0 - ball.radius() + 1e-3);
    }
}

#[test]
fn test_huge_world_from_settings() {
    let mut controller = seeded_controller(5, 100, 1.0e7, 1.0e7, (2.0, 6.0));
    step_n(&mut controller, 3, SIM_DT);
    assert!(controller.grid().validate(controller.balls()));
    assert!(controller.grid().cell_size() >= 2.0 * 2.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_step_preserves_invariants(
        seed in any::<u64>(),
        count in 1usize..60,
        gx in -500.0f32..500.0,
        gy in -500.0f32..500.0,
        restitution in 0.0f32..=1.0,
        steps in 1usize..30,
    ) {
        let (width, height) = (120.0, 80.0);
        let mut controller = seeded_controller(seed, count, width, height, (1.0, 4.0));
        controller.set_gravity(Vec2::new(gx, gy)).unwrap();
        controller.set_restitution(restitution);
        let masses: Vec<f32> = controller.balls().iter().map(Ball::mass).collect();
        let ceiling = controller.settings().speed_ceiling();

        step_n(&mut controller, steps, SIM_DT);

        prop_assert!(controller.grid().validate(controller.balls()));
        for (ball, &mass) in controller.balls().iter().zip(&masses) {
            let r = ball.radius();
            prop_assert_eq!(ball.mass(), mass);
            prop_assert!(ball.pos.x >= r - 1e-3 && ball.pos.x <= width - r + 1e-3, "x {} r {}", ball.pos.x, r);
            prop_assert!(ball.pos.y >= r - 1e-3 && ball.pos.y <= height - r + 1e-3, "y {} r {}", ball.pos.y, r);
            prop_assert!(ball.speed() <= ceiling * (1.0 + 1e-5), "speed {}", ball.speed());
        }
    }

    #[test]
    fn prop_dragged_ball_stays_inside(
        x in -50.0f32..150.0,
        y in -50.0f32..150.0,
    ) {
        let ball = Ball::new(Vec2::new(50.0, 50.0), 4.0, WHITE);
        let mut controller = PhysicsController::new(vec![ball], Vec2::new(100.0, 100.0), frictionless(100.0));
        prop_assert_eq!(controller.on_pointer_down(Vec2::new(50.0, 50.0)), Some(0));
        controller.on_pointer_move(Vec2::new(x, y));
        controller.step(SIM_DT, 100.0, 100.0);

        let ball = &controller.balls()[0];
        prop_assert!(ball.pos.x >= 4.0 && ball.pos.x <= 96.0);
        prop_assert!(ball.pos.y >= 4.0 && ball.pos.y <= 96.0);
        prop_assert!(ball.speed() <= controller.settings().drag_ceiling() * (1.0 + 1e-5));
    }
}
