//! Fitness shaping for track-driving agents.
//!
//! Two signals are produced every tick:
//!
//! - the **composite fitness**: checkpoint reward minus an accumulated,
//!   superlinear distance-to-next-checkpoint penalty, plus a small Gaussian
//!   jitter that breaks exact ties;
//! - the **traveled distance**: pure lap geometry, see
//!   [`CheckpointTrack::traveled_distance`].
//!
//! [`RankingSignal`] picks which of the two the optimizer ranks on. The same
//! value is what the vehicle is told, so the vehicle and the optimizer never
//! disagree about an agent's score.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;
use crate::track::{CheckpointTrack, TrackProgress};

/// Which fitness signal ranks agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingSignal {
    /// Shaped composite reward.
    #[default]
    Fitness,
    /// Geometric lap progress.
    TraveledDistance,
}

/// Constants of the fitness shaping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    /// Reward per checkpoint reached (lap-aware).
    pub checkpoint_reward: f32,
    /// Multiplier of the per-tick distance penalty.
    pub distance_penalty: f32,
    /// Distance normaliser before the exponent is applied.
    pub distance_scale: f32,
    /// Exponent of the normalised distance.
    pub penalty_exponent: f32,
    /// Standard deviation of the tie-breaking jitter; `0` disables it.
    pub jitter_std: f32,
    pub ranking: RankingSignal,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            checkpoint_reward: 100.0,
            distance_penalty: 0.01,
            distance_scale: 160.0,
            penalty_exponent: 1.5,
            jitter_std: 1e-3,
            ranking: RankingSignal::Fitness,
        }
    }
}

impl FitnessConfig {
    /// Penalty added for one tick spent `distance` away from the next checkpoint.
    #[must_use]
    pub fn tick_penalty(&self, distance: f32) -> f32 {
        self.distance_penalty * (distance / self.distance_scale).powf(self.penalty_exponent)
    }
}

/// Sub-metrics of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitnessSnapshot {
    pub checkpoint_reward: f32,
    /// Penalty accumulated over the generation so far.
    pub distance_penalty: f32,
    pub jitter: f32,
    /// `checkpoint_reward - distance_penalty + jitter`.
    pub fitness: f32,
    pub traveled_distance: f32,
}

/// Per-agent fitness accumulator.
#[derive(Debug, Clone)]
pub struct FitnessModel {
    config: FitnessConfig,
    jitter: Option<Normal<f32>>,
    accumulated_penalty: f32,
    last: FitnessSnapshot,
}

impl FitnessModel {
    #[must_use]
    pub fn new(config: FitnessConfig) -> Self {
        let jitter = if config.jitter_std > 0.0 {
            Normal::new(0.0, config.jitter_std).ok()
        } else {
            None
        };

        Self {
            config,
            jitter,
            accumulated_penalty: 0.0,
            last: FitnessSnapshot::default(),
        }
    }

    /// Update and return this tick's metrics.
    ///
    /// A disabled agent keeps its last metrics unchanged; repeated calls
    /// after disablement are idempotent and draw no randomness.
    pub fn evaluate<R: Rng>(
        &mut self,
        progress: &TrackProgress,
        position: Vec2,
        disabled: bool,
        track: &CheckpointTrack,
        rng: &mut R,
    ) -> FitnessSnapshot {
        if disabled {
            return self.last;
        }

        #[allow(clippy::cast_precision_loss)]
        let checkpoints = progress.cumulative_checkpoints(track.len()) as f32;
        let checkpoint_reward = self.config.checkpoint_reward * checkpoints;

        let distance = track.distance_to_next(progress, position);
        self.accumulated_penalty += self.config.tick_penalty(distance);

        let jitter = self.jitter.as_ref().map_or(0.0, |noise| noise.sample(rng));

        self.last = FitnessSnapshot {
            checkpoint_reward,
            distance_penalty: self.accumulated_penalty,
            jitter,
            fitness: checkpoint_reward - self.accumulated_penalty + jitter,
            traveled_distance: track.traveled_distance(progress, position),
        };
        self.last
    }

    /// Metrics of the most recent evaluation.
    #[must_use]
    pub const fn snapshot(&self) -> FitnessSnapshot {
        self.last
    }

    /// The value agents are ranked by, per [`RankingSignal`].
    #[must_use]
    pub const fn ranking_value(&self) -> f32 {
        match self.config.ranking {
            RankingSignal::Fitness => self.last.fitness,
            RankingSignal::TraveledDistance => self.last.traveled_distance,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &FitnessConfig {
        &self.config
    }

    /// Clear accumulators for a new generation.
    pub fn reset(&mut self) {
        self.accumulated_penalty = 0.0;
        self.last = FitnessSnapshot::default();
    }
}
