//! Generational genetic optimizer over flat genomes.
//!
//! Each generation keeps an elite unchanged, then fills the remaining slots
//! with mutated uniform-crossover children of the two best agents. Mutation
//! rate and strength decay geometrically so the search narrows over time.

use std::path::PathBuf;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::genome::{Genome, GenomeError};
use crate::network::{FeedforwardNetwork, NetworkError};
use crate::persistence::{save_parameters, PersistenceError};

/// Errors raised while evolving a population.
#[derive(Debug, Error)]
pub enum EvolutionError {
    #[error("population is empty")]
    EmptyPopulation,
    #[error("breeding needs at least two genomes, population has {0}")]
    PopulationTooSmall(usize),
    #[error("got {actual} fitness scores for a population of {expected}")]
    FitnessCount { expected: usize, actual: usize },
    #[error(transparent)]
    Genome(#[from] GenomeError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("failed to checkpoint best genome: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Hyperparameters of the genetic optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Initial per-gene mutation probability.
    pub mutation_rate: f32,
    /// Initial standard deviation of mutation noise.
    pub mutation_strength: f32,
    /// Share of the population carried over unchanged.
    pub elite_fraction: f32,
    /// Factor applied to rate and strength after every generation.
    pub decay: f32,
    /// Where the best genome of each generation is written, if anywhere.
    pub checkpoint_path: Option<PathBuf>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            mutation_rate: 0.1,
            mutation_strength: 0.5,
            elite_fraction: 0.13,
            decay: 0.99,
            checkpoint_path: None,
        }
    }
}

impl OptimizerConfig {
    /// Elites kept from a population of `population_size`.
    ///
    /// `max(1, round(elite_fraction × population_size))` when the fraction is
    /// positive, never more than the population itself.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn elite_count(&self, population_size: usize) -> usize {
        if self.elite_fraction <= 0.0 {
            return 0;
        }
        let rounded = (self.elite_fraction * population_size as f32).round() as usize;
        rounded.max(1).min(population_size)
    }
}

/// Fitness summary of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: u32,
    pub best: f32,
    pub mean: f32,
    pub worst: f32,
}

impl GenerationStats {
    /// Summarise `fitness`; an empty slice yields zeros.
    #[must_use]
    pub fn from_scores(generation: u32, fitness: &[f32]) -> Self {
        if fitness.is_empty() {
            return Self {
                generation,
                best: 0.0,
                mean: 0.0,
                worst: 0.0,
            };
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = fitness.iter().sum::<f32>() / fitness.len() as f32;
        Self {
            generation,
            best: fitness.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            mean,
            worst: fitness.iter().copied().fold(f32::INFINITY, f32::min),
        }
    }
}

/// Owns the genome population and evolves it one generation at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticOptimizer {
    config: OptimizerConfig,
    population: Vec<Genome>,
    mutation_rate: f32,
    mutation_strength: f32,
    generation: u32,
    best_genome: Option<Genome>,
    last_stats: Option<GenerationStats>,
}

impl GeneticOptimizer {
    /// Wrap an existing population.
    ///
    /// # Errors
    ///
    /// [`EvolutionError::EmptyPopulation`] if `population` is empty.
    pub fn new(config: OptimizerConfig, population: Vec<Genome>) -> Result<Self, EvolutionError> {
        if population.is_empty() {
            return Err(EvolutionError::EmptyPopulation);
        }
        Ok(Self {
            mutation_rate: config.mutation_rate,
            mutation_strength: config.mutation_strength,
            config,
            population,
            generation: 0,
            best_genome: None,
            last_stats: None,
        })
    }

    /// Population of freshly He-initialised networks for `layer_sizes`.
    pub fn random<R: Rng>(
        config: OptimizerConfig,
        layer_sizes: &[usize],
        population_size: usize,
        rng: &mut R,
    ) -> Result<Self, EvolutionError> {
        let population = (0..population_size)
            .map(|_| FeedforwardNetwork::new(layer_sizes, rng).map(|n| n.get_parameters()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(config, population)
    }

    /// Produce the next generation from per-genome fitness (higher is better).
    ///
    /// `fitness[i]` scores `population()[i]`. The returned population has the
    /// same size as the current one; its first `elite_count` entries are
    /// exact copies of the top-ranked genomes.
    ///
    /// # Errors
    ///
    /// Fails on a population smaller than two, a fitness slice of the wrong
    /// length, mismatched genome lengths, or a failed checkpoint write. The
    /// population is left untouched on error.
    pub fn evolve<R: Rng>(&mut self, fitness: &[f32], rng: &mut R) -> Result<&[Genome], EvolutionError> {
        let size = self.population.len();
        if size < 2 {
            return Err(EvolutionError::PopulationTooSmall(size));
        }
        if fitness.len() != size {
            return Err(EvolutionError::FitnessCount {
                expected: size,
                actual: fitness.len(),
            });
        }

        let mut ranking: Vec<usize> = (0..size).collect();
        ranking.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));

        let elite_count = self.config.elite_count(size);
        let mut next: Vec<Genome> = ranking[..elite_count]
            .iter()
            .map(|&i| self.population[i].clone())
            .collect();

        let first = &self.population[ranking[0]];
        let second = &self.population[ranking[1]];
        while next.len() < size {
            let mut a = first.crossover(second, rng)?;
            let mut b = first.crossover(second, rng)?;
            a.mutate(rng, self.mutation_rate, self.mutation_strength);
            b.mutate(rng, self.mutation_rate, self.mutation_strength);

            next.push(a);
            if next.len() < size {
                next.push(b);
            }
        }

        // Nothing durable is written until every child has been bred.
        let best = &self.population[ranking[0]];
        if let Some(path) = &self.config.checkpoint_path {
            save_parameters(path, best)?;
            debug!(path = %path.display(), "checkpointed best genome");
        }

        let stats = GenerationStats::from_scores(self.generation, fitness);
        self.best_genome = Some(best.clone());
        self.last_stats = Some(stats);

        self.mutation_rate *= self.config.decay;
        self.mutation_strength *= self.config.decay;
        self.generation += 1;
        self.population = next;

        debug!(
            generation = self.generation,
            elite_count,
            mutation_rate = self.mutation_rate,
            mutation_strength = self.mutation_strength,
            "evolved population"
        );
        Ok(&self.population)
    }

    #[must_use]
    pub fn population(&self) -> &[Genome] {
        &self.population
    }

    /// Overwrite every genome with a copy of `genome`. Rates and the
    /// generation counter are kept.
    pub fn fill_with(&mut self, genome: &Genome) {
        for slot in &mut self.population {
            slot.clone_from(genome);
        }
    }

    /// Generations evolved so far.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    #[must_use]
    pub const fn mutation_rate(&self) -> f32 {
        self.mutation_rate
    }

    #[must_use]
    pub const fn mutation_strength(&self) -> f32 {
        self.mutation_strength
    }

    #[must_use]
    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Top genome of the last evolved generation.
    #[must_use]
    pub const fn best_genome(&self) -> Option<&Genome> {
        self.best_genome.as_ref()
    }

    /// Score of [`Self::best_genome`].
    #[must_use]
    pub fn best_fitness(&self) -> Option<f32> {
        self.last_stats.map(|stats| stats.best)
    }

    #[must_use]
    pub const fn last_stats(&self) -> Option<&GenerationStats> {
        self.last_stats.as_ref()
    }
}
