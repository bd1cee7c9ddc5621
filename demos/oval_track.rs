//! Headless training on a small oval.
//!
//! ```sh
//! RUST_LOG=trackmind=debug cargo run --example oval_track
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use trackmind::{
    load_parameters, save_parameters, CheckpointTrack, Control, DriveCommands, FeedforwardNetwork,
    FieldOfView, Pose, TerrainKind, TileGrid, TileMap, TrackProgress, TrainingConfig,
    TrainingOrchestrator, Vec2, Vehicle, VehiclePool,
};

const OVAL: &str = "\
ssssssssssssssssssssss
...1##############2...
..##################..
..##~~~~~~~~~~~~~~##..
..##~~~~~~~~~~~~~~##..
..0#~~~~~~~~~~~~~~#3..
..##~~~~~~~~~~~~~~##..
..##~~~~~~~~~~~~~~##..
..##################..
...5##############4...
ssssssssssssssssssssss
";

const TILE: f32 = 32.0;
const GENERATIONS: u32 = 15;
const DT: f64 = 1.0 / 30.0;

/// Kinematic car: no mass, no drift, crashes on anything but track.
struct ToyCar {
    pose: Pose,
    progress: TrackProgress,
    crashed: bool,
    commands: DriveCommands,
    fitness: f32,
}

impl ToyCar {
    const MAX_SPEED: f32 = 160.0;
    const TURN_RATE: f32 = 150.0;

    fn new(start: Vec2) -> Self {
        Self {
            pose: Pose::new(start, 0.0),
            progress: TrackProgress::default(),
            crashed: false,
            commands: DriveCommands::NONE,
            fitness: 0.0,
        }
    }

    fn respawn(&mut self, start: Vec2) {
        self.pose = Pose::new(start, 0.0);
        self.commands = DriveCommands::NONE;
    }

    fn step(&mut self, map: &TileGrid, track: &CheckpointTrack, dt: f32) {
        if self.crashed {
            return;
        }
        let cmd = self.commands;

        let mut throttle = 0.0;
        if cmd.is_active(Control::Forward) {
            throttle += 1.0;
        }
        if cmd.is_active(Control::Backward) {
            throttle -= 0.5;
        }
        if cmd.is_active(Control::Accelerate) {
            throttle *= 1.5;
        }
        let mut speed = self.pose.velocity + throttle * Self::MAX_SPEED * dt;
        if cmd.is_active(Control::Brake) {
            speed *= 0.8;
        }
        self.pose.velocity = speed.clamp(-Self::MAX_SPEED / 2.0, Self::MAX_SPEED) * 0.98;

        if cmd.is_active(Control::TurnLeft) {
            self.pose.heading += Self::TURN_RATE * dt;
        }
        if cmd.is_active(Control::TurnRight) {
            self.pose.heading -= Self::TURN_RATE * dt;
        }
        self.pose.position = self.pose.position + self.pose.forward() * (self.pose.velocity * dt);

        match map.tile_at(self.pose.position.x, self.pose.position.y) {
            Some(tile) if tile.terrain == TerrainKind::Track => {
                track.update_progress(&mut self.progress, self.pose.position, TILE);
            }
            _ => self.crashed = true,
        }
    }
}

impl Vehicle for ToyCar {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn progress(&self) -> TrackProgress {
        self.progress
    }

    fn is_disabled(&self) -> bool {
        self.crashed
    }

    fn apply_commands(&mut self, commands: DriveCommands) {
        self.commands = commands;
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    fn reset_knowledge(&mut self) {
        self.progress = TrackProgress::default();
        self.crashed = false;
        self.fitness = 0.0;
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let grid = TileGrid::parse(OVAL, TILE)?;
    let track = CheckpointTrack::from_grid(&grid)?;
    let start = track.positions()[0];
    info!(
        checkpoints = track.len(),
        length = track.total_length(),
        "track loaded"
    );

    let config = TrainingConfig {
        seed: Some(7),
        population_size: 16,
        generation_seconds: 20.0,
        ..TrainingConfig::default()
    };
    let pool: VehiclePool<ToyCar> = (0..config.population_size)
        .map(|_| ToyCar::new(start))
        .collect();
    let mut trainer = TrainingOrchestrator::new(config, pool)?;

    while trainer.generation() < GENERATIONS {
        trainer.tick(&grid, &track, DT)?;

        let ids = trainer.pool().ids().to_vec();
        let ended = trainer.take_generation_ended();
        for id in ids {
            let Some(car) = trainer.pool_mut().get_mut(id) else {
                continue;
            };
            if ended {
                car.respawn(start);
            } else {
                #[allow(clippy::cast_possible_truncation)]
                car.step(&grid, &track, DT as f32);
            }
        }
    }

    let Some(best) = trainer.optimizer().best_genome() else {
        return Ok(());
    };
    let path = std::env::temp_dir().join("trackmind_oval_best.bin");
    save_parameters(&path, best)?;
    info!(path = %path.display(), params = best.len(), "saved best genome");

    // Replay the saved genome for one frame from the start line.
    let genome = load_parameters(&path)?;
    let mut network = FeedforwardNetwork::from_parameters(&trainer.config().layer_sizes, &genome)?;
    let mut fov = FieldOfView::new();
    let outputs = network.forward(fov.update(&Pose::new(start, 0.0), &grid))?;
    let commands = DriveCommands::from_outputs(&outputs, trainer.config().command_threshold);
    info!(?commands, "first decision of the best genome");

    Ok(())
}
