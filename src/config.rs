//! Run configuration: topology, population, timing and the nested optimizer
//! and fitness settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::control::COMMAND_LEN;
use crate::fitness::FitnessConfig;
use crate::optimizer::OptimizerConfig;
use crate::perception::FOV_LEN;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything a training run needs besides the map and the vehicles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    // == TOPOLOGY ==
    /// Network layer widths, input first. Input must be the FOV length and
    /// output the command length.
    pub layer_sizes: Vec<usize>,

    // == POPULATION ==
    /// Agents per generation; one vehicle is needed per agent.
    pub population_size: usize,
    /// Seed of the run's generator; `None` draws one from the OS.
    pub seed: Option<u64>,

    // == TIMING ==
    /// Simulation seconds before a generation is forced to end.
    pub generation_seconds: f64,

    // == CONTROL ==
    /// Outputs strictly above this activate their command.
    pub command_threshold: f32,

    pub optimizer: OptimizerConfig,
    pub fitness: FitnessConfig,

    // == LOGS ==
    /// Written at every generation boundary when set.
    pub fitness_log_path: Option<PathBuf>,
    /// Written at every generation boundary when set.
    pub interval_log_path: Option<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            layer_sizes: vec![FOV_LEN, 32, 16, COMMAND_LEN],
            population_size: 20,
            seed: None,
            generation_seconds: 30.0,
            command_threshold: 0.5,
            optimizer: OptimizerConfig::default(),
            fitness: FitnessConfig::default(),
            fitness_log_path: None,
            interval_log_path: None,
        }
    }
}

impl TrainingConfig {
    /// Small, fast setup for experiments and tests: one narrow hidden layer
    /// and short generations.
    #[must_use]
    pub fn quick(population_size: usize) -> Self {
        Self {
            layer_sizes: vec![FOV_LEN, 8, COMMAND_LEN],
            population_size,
            generation_seconds: 10.0,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check every field for a value the run cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.layer_sizes.len() < 2 {
            return invalid(format!(
                "need at least 2 layer sizes, got {}",
                self.layer_sizes.len()
            ));
        }
        if let Some(index) = self.layer_sizes.iter().position(|&n| n == 0) {
            return invalid(format!("layer {index} has size 0"));
        }
        if self.layer_sizes[0] != FOV_LEN {
            return invalid(format!(
                "input layer must have {FOV_LEN} neurons, got {}",
                self.layer_sizes[0]
            ));
        }
        let outputs = self.layer_sizes[self.layer_sizes.len() - 1];
        if outputs != COMMAND_LEN {
            return invalid(format!(
                "output layer must have {COMMAND_LEN} neurons, got {outputs}"
            ));
        }
        if self.population_size < 2 {
            return invalid(format!(
                "population must hold at least 2 agents, got {}",
                self.population_size
            ));
        }
        if !(self.generation_seconds.is_finite() && self.generation_seconds > 0.0) {
            return invalid(format!(
                "generation_seconds must be positive, got {}",
                self.generation_seconds
            ));
        }

        let opt = &self.optimizer;
        if !(0.0..=1.0).contains(&opt.mutation_rate) {
            return invalid(format!("mutation_rate {} outside [0, 1]", opt.mutation_rate));
        }
        if opt.mutation_strength.is_nan() || opt.mutation_strength < 0.0 {
            return invalid(format!(
                "mutation_strength must be non-negative, got {}",
                opt.mutation_strength
            ));
        }
        if !(0.0..=1.0).contains(&opt.elite_fraction) {
            return invalid(format!("elite_fraction {} outside [0, 1]", opt.elite_fraction));
        }
        if opt.decay.is_nan() || opt.decay <= 0.0 || opt.decay > 1.0 {
            return invalid(format!("decay {} outside (0, 1]", opt.decay));
        }

        let fit = &self.fitness;
        if fit.distance_scale.is_nan() || fit.distance_scale <= 0.0 {
            return invalid(format!(
                "distance_scale must be positive, got {}",
                fit.distance_scale
            ));
        }
        if fit.jitter_std.is_nan() || fit.jitter_std < 0.0 {
            return invalid(format!(
                "jitter_std must be non-negative, got {}",
                fit.jitter_std
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = TrainingConfig::default();
        config.validate().unwrap();
        assert_eq!(config.layer_sizes, [144, 32, 16, 6]);
        assert_eq!(config.population_size, 20);
        assert!((config.optimizer.elite_fraction - 0.13).abs() < f32::EPSILON);
        assert!((config.optimizer.decay - 0.99).abs() < f32::EPSILON);
    }

    #[test]
    fn test_quick_is_valid() {
        let config = TrainingConfig::quick(4);
        config.validate().unwrap();
        assert_eq!(config.population_size, 4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = TrainingConfig::from_json_str(
            r#"{ "population_size": 8, "seed": 7, "optimizer": { "mutation_rate": 0.3 } }"#,
        )
        .unwrap();
        assert_eq!(config.population_size, 8);
        assert_eq!(config.seed, Some(7));
        assert!((config.optimizer.mutation_rate - 0.3).abs() < f32::EPSILON);
        assert!((config.optimizer.mutation_strength - 0.5).abs() < f32::EPSILON);
        assert!((config.fitness.checkpoint_reward - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_ranking_signal_from_json() {
        let config = TrainingConfig::from_json_str(r#"{ "fitness": { "ranking": "traveled_distance" } }"#)
            .unwrap();
        assert_eq!(
            config.fitness.ranking,
            crate::fitness::RankingSignal::TraveledDistance
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            r#"{ "layer_sizes": [144] }"#,
            r#"{ "layer_sizes": [144, 0, 6] }"#,
            r#"{ "layer_sizes": [10, 6] }"#,
            r#"{ "layer_sizes": [144, 4] }"#,
            r#"{ "population_size": 1 }"#,
            r#"{ "generation_seconds": 0.0 }"#,
            r#"{ "optimizer": { "mutation_rate": 1.5 } }"#,
            r#"{ "optimizer": { "elite_fraction": -0.1 } }"#,
            r#"{ "optimizer": { "decay": 0.0 } }"#,
            r#"{ "fitness": { "distance_scale": 0.0 } }"#,
        ];
        for json in cases {
            assert!(
                matches!(TrainingConfig::from_json_str(json), Err(ConfigError::Invalid(_))),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let config = TrainingConfig {
            seed: Some(3),
            ..TrainingConfig::quick(6)
        };
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        assert_eq!(TrainingConfig::from_json_file(&path).unwrap(), config);
        assert!(matches!(
            TrainingConfig::from_json_file(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
        assert!(matches!(
            TrainingConfig::from_json_str("not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
