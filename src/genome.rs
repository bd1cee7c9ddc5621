//! Flat genome representation and its genetic operators.
//!
//! A genome is the ordered list of every weight and bias of one network. It
//! has no structure of its own; [`FeedforwardNetwork`](crate::FeedforwardNetwork)
//! reinterprets it through its layer sizes.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by genetic operators.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenomeError {
    #[error("cannot cross genomes of length {left} and {right}")]
    LengthMismatch { left: usize, right: usize },
}

/// Flat parameter vector of one network.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genome(Vec<f32>);

impl Genome {
    #[must_use]
    pub const fn new(genes: Vec<f32>) -> Self {
        Self(genes)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn genes(&self) -> &[f32] {
        &self.0
    }

    #[must_use]
    pub fn into_genes(self) -> Vec<f32> {
        self.0
    }

    /// Uniform crossover: every gene comes from `self` or `other` with equal
    /// probability, drawn independently per gene.
    pub fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Result<Self, GenomeError> {
        if self.len() != other.len() {
            return Err(GenomeError::LengthMismatch {
                left: self.len(),
                right: other.len(),
            });
        }

        let genes = self
            .0
            .iter()
            .zip(&other.0)
            .map(|(&a, &b)| if rng.random::<bool>() { a } else { b })
            .collect();
        Ok(Self(genes))
    }

    /// Gaussian mutation: each gene, with probability `rate`, receives
    /// additive noise with standard deviation `strength`.
    pub fn mutate<R: Rng>(&mut self, rng: &mut R, rate: f32, strength: f32) {
        if rate.is_nan() || rate <= 0.0 || !(strength.is_finite() && strength > 0.0) {
            return;
        }
        let Ok(noise) = Normal::new(0.0_f32, strength) else {
            return;
        };
        let rate = f64::from(rate.min(1.0));

        for gene in &mut self.0 {
            if rng.random_bool(rate) {
                *gene += noise.sample(rng);
            }
        }
    }
}

impl From<Vec<f32>> for Genome {
    fn from(genes: Vec<f32>) -> Self {
        Self(genes)
    }
}

impl AsRef<[f32]> for Genome {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}
