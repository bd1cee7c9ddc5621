//! Generation loop binding agents to pooled vehicles.
//!
//! [`TrainingOrchestrator::tick`] is called once per simulation frame. While
//! simulating, every agent is scored, perceives the map, runs its network and
//! drives its vehicle. When a generation ends (external request, every agent
//! disabled, or timeout) the optimizer evolves the population within the same
//! tick and the new genomes are rebound to the same vehicles.

use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, TrainingConfig};
use crate::control::{drive, DriveCommands, SyntheticInput};
use crate::fitness::FitnessModel;
use crate::network::{FeedforwardNetwork, NetworkError};
use crate::optimizer::{EvolutionError, GeneticOptimizer};
use crate::perception::FieldOfView;
use crate::persistence::{self, FitnessLog, IntervalLog, PersistenceError};
use crate::track::{CheckpointTrack, TileMap};
use crate::vehicle::{Vehicle, VehicleId, VehiclePool};

#[derive(Debug, Error)]
pub enum TrainerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Evolution(#[from] EvolutionError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("population of {population} needs as many vehicles, pool has {vehicles}")]
    VehicleCount { population: usize, vehicles: usize },
    #[error("vehicle {0:?} is not in the pool")]
    MissingVehicle(VehicleId),
}

/// Phase of the training loop.
///
/// An evolution step runs to completion inside a single
/// [`TrainingOrchestrator::tick`], so [`TrainingOrchestrator::state`] reads
/// `Simulating` between ticks. [`TickOutcome::state`] reports `Evolving` for
/// the tick that evolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrainerState {
    #[default]
    Simulating,
    Evolving,
}

/// Why a generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvolutionTrigger {
    /// [`TrainingOrchestrator::request_advance`] was called.
    Requested,
    AllDisabled,
    Timeout,
}

/// Summary of one call to [`TrainingOrchestrator::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// [`TrainerState::Evolving`] if this tick ran an evolution step.
    pub state: TrainerState,
    /// Every agent was disabled during this tick.
    pub all_disabled: bool,
    pub generation_ended: bool,
    pub trigger: Option<EvolutionTrigger>,
}

/// One network driving one pooled vehicle.
#[derive(Debug, Clone)]
pub struct Agent {
    network: FeedforwardNetwork,
    vehicle: VehicleId,
    fov: FieldOfView,
    fitness: FitnessModel,
    input: SyntheticInput,
}

impl Agent {
    #[must_use]
    pub const fn network(&self) -> &FeedforwardNetwork {
        &self.network
    }

    #[must_use]
    pub const fn vehicle(&self) -> VehicleId {
        self.vehicle
    }

    #[must_use]
    pub const fn fov(&self) -> &FieldOfView {
        &self.fov
    }

    #[must_use]
    pub const fn fitness(&self) -> &FitnessModel {
        &self.fitness
    }

    /// Commands issued on the last tick.
    #[must_use]
    pub const fn commands(&self) -> DriveCommands {
        self.input.pending()
    }
}

/// Owns the population, the vehicle pool and the run's random generator.
pub struct TrainingOrchestrator<V> {
    config: TrainingConfig,
    rng: ChaCha8Rng,
    optimizer: GeneticOptimizer,
    agents: Vec<Agent>,
    pool: VehiclePool<V>,
    state: TrainerState,
    advance_requested: bool,
    generation_ended: bool,
    /// Some agent has been evaluated since the last generation boundary.
    scored: bool,
    /// Simulation seconds since the run began.
    clock: f64,
    generation_start: f64,
    fitness_log: FitnessLog,
    interval_log: IntervalLog,
}

impl<V: Vehicle> TrainingOrchestrator<V> {
    /// Build a random population and bind agent `i` to the `i`-th vehicle of
    /// `pool`.
    ///
    /// # Errors
    ///
    /// Fails on an invalid config or when the pool size differs from the
    /// population size.
    pub fn new(config: TrainingConfig, pool: VehiclePool<V>) -> Result<Self, TrainerError> {
        config.validate()?;
        if pool.len() != config.population_size {
            return Err(TrainerError::VehicleCount {
                population: config.population_size,
                vehicles: pool.len(),
            });
        }

        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };

        let optimizer = GeneticOptimizer::random(
            config.optimizer.clone(),
            &config.layer_sizes,
            config.population_size,
            &mut rng,
        )?;

        let agents = optimizer
            .population()
            .iter()
            .zip(pool.ids())
            .map(|(genome, &vehicle)| {
                Ok(Agent {
                    network: FeedforwardNetwork::from_parameters(&config.layer_sizes, genome)?,
                    vehicle,
                    fov: FieldOfView::new(),
                    fitness: FitnessModel::new(config.fitness),
                    input: SyntheticInput::new(),
                })
            })
            .collect::<Result<Vec<_>, NetworkError>>()?;

        info!(
            population = config.population_size,
            layers = ?config.layer_sizes,
            seed = ?config.seed,
            "training run initialised"
        );

        Ok(Self {
            config,
            rng,
            optimizer,
            agents,
            pool,
            state: TrainerState::Simulating,
            advance_requested: false,
            generation_ended: false,
            scored: false,
            clock: 0.0,
            generation_start: 0.0,
            fitness_log: FitnessLog::new(),
            interval_log: IntervalLog::new(),
        })
    }

    /// Advance the run by one frame of `dt` simulation seconds.
    ///
    /// # Errors
    ///
    /// Only on programmer or configuration defects: a vehicle missing from
    /// the pool, a network shape mismatch, or a failed log/checkpoint write.
    pub fn tick<M: TileMap + ?Sized>(
        &mut self,
        map: &M,
        track: &CheckpointTrack,
        dt: f64,
    ) -> Result<TickOutcome, TrainerError> {
        self.clock += dt.max(0.0);

        let threshold = self.config.command_threshold;
        let mut all_disabled = true;
        for agent in &mut self.agents {
            let vehicle = self
                .pool
                .get_mut(agent.vehicle)
                .ok_or(TrainerError::MissingVehicle(agent.vehicle))?;

            let pose = vehicle.pose();
            let progress = vehicle.progress();
            let disabled = vehicle.is_disabled();

            agent
                .fitness
                .evaluate(&progress, pose.position, disabled, track, &mut self.rng);
            vehicle.set_fitness(agent.fitness.ranking_value());

            if disabled {
                agent.input.clear();
            } else {
                all_disabled = false;
                let features = agent.fov.update(&pose, map);
                let outputs = agent.network.forward(features)?;
                agent.input.push(DriveCommands::from_outputs(&outputs, threshold));
            }
            drive(vehicle, &mut agent.input);
        }
        self.scored |= !self.agents.is_empty();

        let trigger = if std::mem::take(&mut self.advance_requested) {
            Some(EvolutionTrigger::Requested)
        } else if all_disabled {
            Some(EvolutionTrigger::AllDisabled)
        } else if self.elapsed() >= self.config.generation_seconds {
            Some(EvolutionTrigger::Timeout)
        } else {
            None
        };

        let state = if let Some(trigger) = trigger {
            self.state = TrainerState::Evolving;
            let result = self.end_generation(trigger);
            self.state = TrainerState::Simulating;
            result?;
            TrainerState::Evolving
        } else {
            TrainerState::Simulating
        };

        Ok(TickOutcome {
            state,
            all_disabled,
            generation_ended: trigger.is_some(),
            trigger,
        })
    }

    fn end_generation(&mut self, trigger: EvolutionTrigger) -> Result<(), TrainerError> {
        let generation = self.optimizer.generation();
        let scores: Vec<f32> = self
            .agents
            .iter()
            .map(|agent| agent.fitness.ranking_value())
            .collect();
        let best_distance = self
            .agents
            .iter()
            .map(|agent| agent.fitness.snapshot().traveled_distance)
            .fold(f32::NEG_INFINITY, f32::max);

        if trigger == EvolutionTrigger::AllDisabled
            && self
                .agents
                .iter()
                .all(|agent| agent.fitness.snapshot().checkpoint_reward <= 0.0)
        {
            warn!(generation, "every agent disabled before reaching a checkpoint");
        }

        self.fitness_log.record(generation, scores.clone());
        self.optimizer.evolve(&scores, &mut self.rng)?;

        for (agent, genome) in self.agents.iter_mut().zip(self.optimizer.population()) {
            agent.network = FeedforwardNetwork::from_parameters(&self.config.layer_sizes, genome)?;
            agent.fitness.reset();
            agent.input.clear();
            self.pool
                .get_mut(agent.vehicle)
                .ok_or(TrainerError::MissingVehicle(agent.vehicle))?
                .reset_knowledge();
        }

        self.interval_log.push(self.generation_start, self.clock);
        self.generation_start = self.clock;
        self.scored = false;
        // The generation has advanced; raise the flag before any log I/O can fail.
        self.generation_ended = true;

        if let Some(stats) = self.optimizer.last_stats() {
            info!(
                generation = stats.generation,
                best = stats.best,
                mean = stats.mean,
                best_distance,
                ?trigger,
                "generation complete"
            );
        }

        if let Some(path) = &self.config.fitness_log_path {
            self.fitness_log.save(path)?;
        }
        if let Some(path) = &self.config.interval_log_path {
            self.interval_log.save(path)?;
        }
        Ok(())
    }

    /// Ask for the current generation to end on the next tick.
    pub fn request_advance(&mut self) {
        self.advance_requested = true;
    }

    /// Whether a generation ended since the last call; clears the flag.
    pub fn take_generation_ended(&mut self) -> bool {
        std::mem::take(&mut self.generation_ended)
    }

    /// Index of the agent with the highest ranking value in the running
    /// generation. Ties go to the lower index.
    ///
    /// `None` until some agent has been evaluated since the last generation
    /// boundary, because every fitness was just reset to zero.
    #[must_use]
    pub fn best_agent(&self) -> Option<usize> {
        if !self.scored {
            return None;
        }
        self.agents
            .iter()
            .map(|agent| agent.fitness.ranking_value())
            .enumerate()
            .reduce(|best, next| if next.1.total_cmp(&best.1).is_gt() { next } else { best })
            .map(|(i, _)| i)
    }

    /// Write the parameters of the best genome known right now.
    ///
    /// During a generation that is [`Self::best_agent`]. Right after a
    /// boundary it is the best genome of the generation that just finished.
    /// Nothing is written before the first evaluation.
    pub fn save_best_parameters(&self, path: impl AsRef<Path>) -> Result<(), TrainerError> {
        let genome = match (self.best_agent(), self.optimizer.best_genome()) {
            (Some(i), _) => self.agents[i].network.get_parameters(),
            (None, Some(best)) => best.clone(),
            (None, None) => return Ok(()),
        };
        persistence::save_parameters(path, &genome)?;
        Ok(())
    }

    pub fn save_fitness_log(&self, path: impl AsRef<Path>) -> Result<(), TrainerError> {
        Ok(self.fitness_log.save(path)?)
    }

    pub fn save_interval_log(&self, path: impl AsRef<Path>) -> Result<(), TrainerError> {
        Ok(self.interval_log.save(path)?)
    }

    /// Load a saved parameter file into every agent and the optimizer's
    /// population.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or does not fit the configured
    /// topology; no agent is touched in that case.
    pub fn load_parameters(&mut self, path: impl AsRef<Path>) -> Result<(), TrainerError> {
        let path = path.as_ref();
        let genome = persistence::load_parameters(path)?;
        let network = FeedforwardNetwork::from_parameters(&self.config.layer_sizes, &genome)?;

        self.optimizer.fill_with(&genome);
        for agent in &mut self.agents {
            agent.network.clone_from(&network);
        }
        debug!(path = %path.display(), params = genome.len(), "loaded parameters into population");
        Ok(())
    }

    /// Phase between ticks; always [`TrainerState::Simulating`] once a tick
    /// returns, even when that tick failed while evolving.
    #[must_use]
    pub const fn state(&self) -> TrainerState {
        self.state
    }

    /// Generations completed.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.optimizer.generation()
    }

    /// Simulation seconds spent in the current generation.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.clock - self.generation_start
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[must_use]
    pub const fn pool(&self) -> &VehiclePool<V> {
        &self.pool
    }

    /// Mutable access for the shell, e.g. to reposition vehicles after a
    /// generation ends.
    pub fn pool_mut(&mut self) -> &mut VehiclePool<V> {
        &mut self.pool
    }

    #[must_use]
    pub const fn optimizer(&self) -> &GeneticOptimizer {
        &self.optimizer
    }

    #[must_use]
    pub const fn fitness_log(&self) -> &FitnessLog {
        &self.fitness_log
    }

    #[must_use]
    pub const fn interval_log(&self) -> &IntervalLog {
        &self.interval_log
    }

    #[must_use]
    pub const fn config(&self) -> &TrainingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;
    use crate::track::{TerrainKind, TileGrid, TrackProgress};
    use crate::vehicle::Pose;

    #[derive(Debug, Default)]
    struct StubVehicle {
        pose: Pose,
        progress: TrackProgress,
        disabled: bool,
        fitness: f32,
        commands: Vec<DriveCommands>,
        resets: u32,
    }

    impl Vehicle for StubVehicle {
        fn pose(&self) -> Pose {
            self.pose
        }

        fn progress(&self) -> TrackProgress {
            self.progress
        }

        fn is_disabled(&self) -> bool {
            self.disabled
        }

        fn apply_commands(&mut self, commands: DriveCommands) {
            self.commands.push(commands);
        }

        fn set_fitness(&mut self, fitness: f32) {
            self.fitness = fitness;
        }

        fn reset_knowledge(&mut self) {
            self.progress = TrackProgress::default();
            self.disabled = false;
            self.fitness = 0.0;
            self.resets += 1;
        }
    }

    fn world() -> (TileGrid, CheckpointTrack) {
        let grid = TileGrid::new(30, 30, 10.0, vec![TerrainKind::Track; 900]).unwrap();
        let track = CheckpointTrack::new(vec![
            Vec2::new(50.0, 50.0),
            Vec2::new(50.0, 250.0),
            Vec2::new(250.0, 250.0),
        ])
        .unwrap();
        (grid, track)
    }

    fn pool(n: usize) -> VehiclePool<StubVehicle> {
        (0..n)
            .map(|_| StubVehicle {
                pose: Pose::new(Vec2::new(150.0, 100.0), 0.0),
                ..StubVehicle::default()
            })
            .collect()
    }

    fn config(n: usize) -> TrainingConfig {
        TrainingConfig {
            seed: Some(42),
            ..TrainingConfig::quick(n)
        }
    }

    #[test]
    fn test_new_requires_one_vehicle_per_agent() {
        assert!(matches!(
            TrainingOrchestrator::new(config(4), pool(3)),
            Err(TrainerError::VehicleCount {
                population: 4,
                vehicles: 3
            })
        ));
        assert!(matches!(
            TrainingOrchestrator::new(TrainingConfig { population_size: 1, ..config(1) }, pool(1)),
            Err(TrainerError::Config(_))
        ));
    }

    #[test]
    fn test_simulating_tick_drives_every_vehicle() {
        let (grid, track) = world();
        let mut trainer = TrainingOrchestrator::new(config(4), pool(4)).unwrap();

        let outcome = trainer.tick(&grid, &track, 0.1).unwrap();

        assert_eq!(outcome.state, TrainerState::Simulating);
        assert!(!outcome.generation_ended);
        assert!(!outcome.all_disabled);
        for (agent, (_, vehicle)) in trainer.agents().iter().zip(trainer.pool().iter()) {
            assert_eq!(vehicle.commands.len(), 1);
            assert_eq!(vehicle.commands[0], agent.commands());
            assert_eq!(agent.network().last_output().len(), 6);
            assert!((vehicle.fitness - agent.fitness().ranking_value()).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_disabled_agent_sends_no_commands() {
        let (grid, track) = world();
        let mut trainer = TrainingOrchestrator::new(config(3), pool(3)).unwrap();
        let first = trainer.pool().ids()[0];
        trainer.pool_mut().get_mut(first).unwrap().disabled = true;

        let outcome = trainer.tick(&grid, &track, 0.1).unwrap();

        assert!(!outcome.all_disabled);
        let vehicle = trainer.pool().get(first).unwrap();
        assert_eq!(vehicle.commands, [DriveCommands::NONE]);
    }

    #[test]
    fn test_all_disabled_ends_generation() {
        let (grid, track) = world();
        let mut trainer = TrainingOrchestrator::new(config(4), pool(4)).unwrap();
        let ids = trainer.pool().ids().to_vec();
        for id in ids {
            trainer.pool_mut().get_mut(id).unwrap().disabled = true;
        }

        let outcome = trainer.tick(&grid, &track, 0.5).unwrap();

        assert!(outcome.all_disabled);
        assert_eq!(outcome.trigger, Some(EvolutionTrigger::AllDisabled));
        assert_eq!(outcome.state, TrainerState::Evolving);
        assert_eq!(trainer.state(), TrainerState::Simulating);
        assert_eq!(trainer.generation(), 1);
        assert!(trainer.take_generation_ended());
        assert!(!trainer.take_generation_ended());

        for (_, vehicle) in trainer.pool().iter() {
            assert_eq!(vehicle.resets, 1);
            assert!(!vehicle.disabled);
        }
        assert_eq!(trainer.fitness_log().get(0).map(<[f32]>::len), Some(4));
        assert_eq!(trainer.interval_log().len(), 1);
        assert!((trainer.interval_log().intervals()[0].end - 0.5).abs() < 1e-9);
        assert!(trainer.elapsed().abs() < 1e-9);
    }

    #[test]
    fn test_timeout_ends_generation() {
        let (grid, track) = world();
        let cfg = TrainingConfig {
            generation_seconds: 1.0,
            ..config(3)
        };
        let mut trainer = TrainingOrchestrator::new(cfg, pool(3)).unwrap();

        assert!(trainer.tick(&grid, &track, 0.4).unwrap().trigger.is_none());
        assert!(trainer.tick(&grid, &track, 0.4).unwrap().trigger.is_none());
        let outcome = trainer.tick(&grid, &track, 0.4).unwrap();

        assert_eq!(outcome.trigger, Some(EvolutionTrigger::Timeout));
        assert_eq!(trainer.generation(), 1);
    }

    #[test]
    fn test_requested_advance() {
        let (grid, track) = world();
        let mut trainer = TrainingOrchestrator::new(config(3), pool(3)).unwrap();

        trainer.request_advance();
        let outcome = trainer.tick(&grid, &track, 0.01).unwrap();
        assert_eq!(outcome.trigger, Some(EvolutionTrigger::Requested));
        // Only the outcome of the evolving tick reports the phase.
        assert_eq!(outcome.state, TrainerState::Evolving);
        assert_eq!(trainer.state(), TrainerState::Simulating);

        let outcome = trainer.tick(&grid, &track, 0.01).unwrap();
        assert_eq!(outcome.trigger, None);
    }

    #[test]
    fn test_agents_keep_their_vehicles_across_generations() {
        let (grid, track) = world();
        let mut trainer = TrainingOrchestrator::new(config(4), pool(4)).unwrap();
        let before: Vec<VehicleId> = trainer.agents().iter().map(Agent::vehicle).collect();
        let old_params = trainer.agents()[0].network().get_parameters();

        trainer.request_advance();
        trainer.tick(&grid, &track, 0.1).unwrap();

        let after: Vec<VehicleId> = trainer.agents().iter().map(Agent::vehicle).collect();
        assert_eq!(before, after);
        assert_eq!(trainer.pool().len(), 4);
        for (agent, genome) in trainer.agents().iter().zip(trainer.optimizer().population()) {
            assert_eq!(&agent.network().get_parameters(), genome);
        }
        assert_eq!(trainer.agents()[0].network().get_parameters().len(), old_params.len());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let (grid, track) = world();
        let mut a = TrainingOrchestrator::new(config(4), pool(4)).unwrap();
        let mut b = TrainingOrchestrator::new(config(4), pool(4)).unwrap();

        for _ in 0..3 {
            a.request_advance();
            b.request_advance();
            a.tick(&grid, &track, 0.1).unwrap();
            b.tick(&grid, &track, 0.1).unwrap();
        }

        assert_eq!(a.optimizer().population(), b.optimizer().population());
        assert_eq!(a.fitness_log(), b.fitness_log());
    }

    #[test]
    fn test_save_and_load_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.bin");
        let (grid, track) = world();
        let mut source = TrainingOrchestrator::new(config(3), pool(3)).unwrap();
        source.tick(&grid, &track, 0.1).unwrap();
        source.save_best_parameters(&path).unwrap();
        let best = source.best_agent().unwrap();
        let expected = source.agents()[best].network().get_parameters();

        let mut target = TrainingOrchestrator::new(
            TrainingConfig {
                seed: Some(7),
                ..config(3)
            },
            pool(3),
        )
        .unwrap();
        target.load_parameters(&path).unwrap();

        for agent in target.agents() {
            assert_eq!(agent.network().get_parameters(), expected);
        }
        assert!(target.optimizer().population().iter().all(|g| *g == expected));
    }

    #[test]
    fn test_save_right_after_boundary_writes_generation_best() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.bin");
        let (grid, track) = world();
        let mut trainer = TrainingOrchestrator::new(config(4), pool(4)).unwrap();
        assert!(trainer.best_agent().is_none());

        for _ in 0..5 {
            trainer.tick(&grid, &track, 0.1).unwrap();
        }
        trainer.request_advance();
        trainer.tick(&grid, &track, 0.1).unwrap();
        assert!(trainer.take_generation_ended());
        assert!(trainer.best_agent().is_none());

        trainer.save_best_parameters(&path).unwrap();
        let saved = persistence::load_parameters(&path).unwrap();
        assert_eq!(Some(&saved), trainer.optimizer().best_genome());
        // The elite keeps the first slot of the new generation.
        assert_eq!(saved, trainer.agents()[0].network().get_parameters());

        trainer.tick(&grid, &track, 0.1).unwrap();
        assert!(trainer.best_agent().is_some());
    }

    #[test]
    fn test_failed_log_write_still_finishes_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let (grid, track) = world();
        let cfg = TrainingConfig {
            fitness_log_path: Some(dir.path().join("missing").join("fitness.json")),
            ..config(3)
        };
        let mut trainer = TrainingOrchestrator::new(cfg, pool(3)).unwrap();

        trainer.request_advance();
        assert!(matches!(
            trainer.tick(&grid, &track, 0.1),
            Err(TrainerError::Persistence(_))
        ));
        assert_eq!(trainer.generation(), 1);
        assert_eq!(trainer.state(), TrainerState::Simulating);
        assert!(trainer.take_generation_ended());
        for (_, vehicle) in trainer.pool().iter() {
            assert_eq!(vehicle.resets, 1);
        }

        let outcome = trainer.tick(&grid, &track, 0.1).unwrap();
        assert_eq!(outcome.state, TrainerState::Simulating);
        assert_eq!(trainer.generation(), 1);
    }

    #[test]
    fn test_load_rejects_wrong_topology() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bin");
        persistence::save_parameters(&path, &crate::genome::Genome::new(vec![0.0; 10])).unwrap();
        let mut trainer = TrainingOrchestrator::new(config(2), pool(2)).unwrap();
        let before = trainer.agents()[0].network().get_parameters();

        assert!(matches!(
            trainer.load_parameters(&path),
            Err(TrainerError::Network(NetworkError::ParameterLength { .. }))
        ));
        assert_eq!(trainer.agents()[0].network().get_parameters(), before);
    }

    #[test]
    fn test_logs_written_at_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let fitness_path = dir.path().join("fitness.json");
        let interval_path = dir.path().join("intervals.json");
        let (grid, track) = world();
        let cfg = TrainingConfig {
            fitness_log_path: Some(fitness_path.clone()),
            interval_log_path: Some(interval_path.clone()),
            ..config(3)
        };
        let mut trainer = TrainingOrchestrator::new(cfg, pool(3)).unwrap();

        trainer.request_advance();
        trainer.tick(&grid, &track, 0.2).unwrap();
        trainer.request_advance();
        trainer.tick(&grid, &track, 0.3).unwrap();

        let fitness = FitnessLog::load(&fitness_path).unwrap();
        assert_eq!(fitness.len(), 2);
        let intervals = IntervalLog::load(&interval_path).unwrap();
        assert_eq!(intervals.len(), 2);
        assert!((intervals.intervals()[1].start - 0.2).abs() < 1e-9);
        assert!((intervals.intervals()[1].end - 0.5).abs() < 1e-9);
    }
}
