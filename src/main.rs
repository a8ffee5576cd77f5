//! Ballpit entry point
//!
//! Headless native runner: spawns a seeded population, drives the fixed
//! timestep loop, scripts one grab-and-fling through the pointer API and logs
//! step statistics. Rendering and windowing live outside this crate.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;
    use std::time::Instant;

    use anyhow::{Context, Result};
    use clap::Parser;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use ballpit::consts::{MAX_SUBSTEPS, SIM_DT};
    use ballpit::renderer::{BallInstance, Visualizer, extract_instances};
    use ballpit::{PhysicsController, PopulationPreset, Settings, StepStats};

    #[derive(Parser, Debug)]
    #[command(version, about = "Headless ball pit simulation")]
    struct Args {
        /// Settings JSON file
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Population preset (sparse, medium, dense)
        #[arg(long)]
        preset: Option<PopulationPreset>,
        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,
        /// Explicit ball count
        #[arg(long)]
        balls: Option<usize>,
        /// Rendered frames to simulate
        #[arg(long, default_value_t = 600)]
        frames: u32,
        /// Wall-clock seconds per rendered frame
        #[arg(long, default_value_t = 1.0 / 60.0)]
        frame_dt: f32,
        /// Write default settings to this path and exit
        #[arg(long)]
        write_default: Option<PathBuf>,
    }

    /// Frames at which the scripted drag starts and ends
    const GRAB_FRAME: u32 = 60;
    const RELEASE_FRAME: u32 = 90;

    /// Simulation plus the per-frame loop state
    struct Runner {
        controller: PhysicsController,
        visualizer: Box<dyn Visualizer>,
        instances: Vec<BallInstance>,
        accumulator: f32,
        totals: StepStats,
        steps: u64,
    }

    impl Runner {
        /// Run as many fixed steps as the elapsed frame time allows
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let world = self.controller.world();
            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.totals += self.controller.step(SIM_DT, world.x, world.y);
                self.accumulator -= SIM_DT;
                self.steps += 1;
                substeps += 1;
            }
        }

        /// Drive the pointer API the way an input layer would
        fn script_pointer(&mut self, frame: u32) {
            let world = self.controller.world();
            let center = world * 0.5;
            match frame {
                GRAB_FRAME => {
                    if let Some(pos) = self.controller.ball(0).map(|b| b.pos) {
                        self.controller.on_pointer_down(pos);
                    }
                }
                f if f > GRAB_FRAME && f < RELEASE_FRAME => {
                    let t = (f - GRAB_FRAME) as f32 / (RELEASE_FRAME - GRAB_FRAME) as f32;
                    let angle = t * std::f32::consts::TAU;
                    let swing = world.min_element() * 0.25;
                    let target = center + Vec2::new(angle.cos(), angle.sin()) * swing;
                    self.controller.on_pointer_move(target);
                }
                RELEASE_FRAME => {
                    if let Some(index) = self.controller.on_pointer_up() {
                        let speed = self.controller.ball(index).map_or(0.0, |b| b.speed());
                        log::info!("Flung ball {index} at {speed:.1} units/s");
                    }
                }
                _ => {}
            }
        }

        /// Refresh the instance buffer a renderer would upload
        fn extract(&mut self) -> usize {
            extract_instances(self.controller.balls(), self.visualizer.as_ref(), &mut self.instances);
            BallInstance::as_bytes(&self.instances).len()
        }
    }

    fn load_settings(args: &Args) -> Result<Settings> {
        let mut settings = match &args.settings {
            Some(path) => Settings::load_from(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => Settings::default(),
        };
        if let Some(preset) = args.preset {
            settings.apply_preset(preset);
        }
        if let Some(seed) = args.seed {
            settings.seed = seed;
        }
        if let Some(balls) = args.balls {
            settings.ball_count = Some(balls);
        }
        Ok(settings.validated())
    }

    pub fn run() -> Result<()> {
        env_logger::init();
        let args = Args::parse();

        if let Some(path) = &args.write_default {
            Settings::default().save_to(path)?;
            return Ok(());
        }

        let settings = load_settings(&args)?;
        log::info!(
            "Ballpit (native) starting: {} balls ({}), seed {}",
            settings.effective_ball_count(),
            settings.population,
            settings.seed
        );

        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let controller = PhysicsController::with_random_population(&settings, &mut rng);
        let visualizer = settings
            .visualization
            .visualizer(controller.settings(), controller.balls());
        let mut runner = Runner {
            controller,
            visualizer,
            instances: Vec::new(),
            accumulator: 0.0,
            totals: StepStats::default(),
            steps: 0,
        };

        let start = Instant::now();
        let mut uploaded = 0;
        for frame in 0..args.frames {
            runner.script_pointer(frame);
            runner.update(args.frame_dt);
            uploaded = runner.extract();

            if frame % 120 == 0 {
                log::debug!(
                    "frame {frame}: {} steps, {} candidate pairs, {} collisions so far",
                    runner.steps,
                    runner.totals.candidate_pairs,
                    runner.totals.collisions
                );
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        let steps = runner.steps.max(1) as f64;
        log::info!(
            "Ran {} frames / {} steps in {:.2}s ({:.2} ms/step)",
            args.frames,
            runner.steps,
            elapsed,
            elapsed * 1000.0 / steps
        );
        log::info!(
            "Per step: {:.0} candidate pairs, {:.0} collisions, {:.0} impulses, {:.0} rebucketed, {:.0} wall contacts",
            runner.totals.candidate_pairs as f64 / steps,
            runner.totals.collisions as f64 / steps,
            runner.totals.impulses as f64 / steps,
            runner.totals.rebucketed as f64 / steps,
            runner.totals.wall_contacts as f64 / steps
        );
        log::info!(
            "Instance buffer: {} instances x {} bytes = {} bytes/frame",
            uploaded / BallInstance::STRIDE,
            BallInstance::STRIDE,
            uploaded
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The headless runner is native only; embedders drive the library directly
}
