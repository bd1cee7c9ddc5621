//! # Trackmind
//!
//! Neuroevolution core for agents that learn to drive around a tile-based
//! track.
//!
//! ## Features
//!
//! - **Field-of-View Perception**: a heading-aligned 12×12 window of terrain
//!   values ahead of the vehicle, always exactly 144 features
//! - **Fixed-Topology Networks**: dense ReLU layers with a sigmoid output,
//!   parameters packed into a flat [`Genome`]
//! - **Genetic Optimizer**: elitism, top-two uniform crossover and decaying
//!   Gaussian mutation
//! - **Training Orchestrator**: a per-tick SIMULATE / EVOLVE loop that reuses a
//!   fixed pool of vehicles across generations
//!
//! Physics, rendering and input devices stay outside the crate: vehicles are
//! anything implementing [`Vehicle`], maps anything implementing [`TileMap`].
//!
//! ## Quick Start
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use trackmind::{DriveCommands, FeedforwardNetwork, FieldOfView, Pose, TileGrid, Vec2, FOV_LEN};
//!
//! let grid = TileGrid::parse(
//!     "\
//! .....
//! .###.
//! .#.#.
//! .0##.
//! .....
//! ",
//!     32.0,
//! )?;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut network = FeedforwardNetwork::new(&[FOV_LEN, 16, 6], &mut rng)?;
//! let mut fov = FieldOfView::new();
//!
//! let pose = Pose::new(Vec2::new(48.0, 48.0), 0.0);
//! let features = fov.update(&pose, &grid);
//! let outputs = network.forward(features)?;
//! let commands = DriveCommands::from_outputs(&outputs, 0.5);
//!
//! assert_eq!(outputs.len(), 6);
//! println!("commands: {:?}", commands.as_array());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Training
//!
//! ```rust,ignore
//! use trackmind::{TrainingConfig, TrainingOrchestrator, VehiclePool};
//!
//! let pool: VehiclePool<MyCar> = (0..20).map(|_| MyCar::at_start()).collect();
//! let mut trainer = TrainingOrchestrator::new(TrainingConfig::default(), pool)?;
//!
//! loop {
//!     trainer.tick(&map, &track, 1.0 / 60.0)?;
//!     if trainer.take_generation_ended() {
//!         for id in trainer.pool().ids().to_vec() {
//!             if let Some(car) = trainer.pool_mut().get_mut(id) {
//!                 car.move_to_start();
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! ### Genome Layout
//!
//! A genome is the concatenation, layer by layer, of the row-major weight
//! matrix followed by the bias vector. Its length is fixed by the layer sizes:
//!
//! - `[144, 32, 16, 6]` packs `144·32 + 32 + 32·16 + 16 + 16·6 + 6` values
//! - Applying a genome of any other length fails and leaves the network as it was
//!
//! ### Fitness
//!
//! Agents are scored by a shaped reward (checkpoints reached minus an
//! accumulated distance penalty, plus a tie-breaking jitter) or by their
//! geometric lap progress, selected with [`RankingSignal`]. The same value is
//! reported to the vehicle and used for ranking.

pub mod activation;
pub mod config;
pub mod control;
pub mod fitness;
pub mod genome;
pub mod geometry;
pub mod network;
pub mod optimizer;
pub mod perception;
pub mod persistence;
pub mod track;
pub mod trainer;
pub mod vehicle;

// Re-exports for convenience
pub use activation::Activation;
pub use config::{ConfigError, TrainingConfig};
pub use control::{drive, CommandSource, Control, DeviceInput, DriveCommands, SyntheticInput};
pub use fitness::{FitnessConfig, FitnessModel, FitnessSnapshot, RankingSignal};
pub use genome::{Genome, GenomeError};
pub use geometry::{point_in_polygon, rotate_point, Vec2};
pub use network::{FeedforwardNetwork, Layer, NetworkError};
pub use optimizer::{EvolutionError, GenerationStats, GeneticOptimizer, OptimizerConfig};
pub use perception::{FieldOfView, FOV_LEN};
pub use persistence::{
    load_parameters, save_parameters, FitnessLog, GenerationInterval, IntervalLog,
    PersistenceError,
};
pub use track::{CheckpointTrack, TerrainKind, Tile, TileGrid, TileMap, TrackError, TrackProgress};
pub use trainer::{
    Agent, EvolutionTrigger, TickOutcome, TrainerError, TrainerState, TrainingOrchestrator,
};
pub use vehicle::{Pose, Vehicle, VehicleId, VehiclePool};
