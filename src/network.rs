//! Fixed-topology dense feedforward network.
//!
//! Each [`Layer`] stores its weights row-major (`outputs × inputs`) next to a
//! bias vector. A network's parameters flatten into a [`Genome`] layer by
//! layer, weights before biases, and unflatten the same way.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activation::Activation;
use crate::genome::Genome;

/// Errors raised when building or driving a network.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("layer_sizes needs at least two entries, got {0}")]
    TooFewLayers(usize),
    #[error("layer {index} has non-positive size")]
    ZeroSizedLayer { index: usize },
    #[error("genome has {actual} parameters, network expects {expected}")]
    ParameterLength { expected: usize, actual: usize },
    #[error("input has {actual} values, network expects {expected}")]
    InputLength { expected: usize, actual: usize },
}

/// One dense layer: `a = f(W·x + b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    inputs: usize,
    outputs: usize,
    /// Row-major `outputs × inputs`.
    weights: Vec<f32>,
    biases: Vec<f32>,
    activation: Activation,
}

impl Layer {
    /// He-initialised layer (`std = sqrt(2 / fan_in)`) with zero biases.
    pub fn he_init<R: Rng>(
        inputs: usize,
        outputs: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let std = (2.0 / inputs as f32).sqrt();
        let weights = match Normal::new(0.0_f32, std) {
            Ok(dist) => (0..inputs * outputs).map(|_| dist.sample(rng)).collect(),
            Err(_) => vec![0.0; inputs * outputs],
        };

        Self {
            inputs,
            outputs,
            weights,
            biases: vec![0.0; outputs],
            activation,
        }
    }

    #[must_use]
    pub const fn inputs(&self) -> usize {
        self.inputs
    }

    #[must_use]
    pub const fn outputs(&self) -> usize {
        self.outputs
    }

    #[must_use]
    pub const fn activation(&self) -> Activation {
        self.activation
    }

    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[must_use]
    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    /// Weight plus bias count.
    #[must_use]
    pub const fn param_count(&self) -> usize {
        self.inputs * self.outputs + self.outputs
    }

    /// Compute the activated output for `input` into `output`.
    fn forward_into(&self, input: &[f32], output: &mut Vec<f32>) {
        output.clear();
        output.extend(
            self.weights
                .chunks_exact(self.inputs.max(1))
                .zip(&self.biases)
                .map(|(row, &bias)| {
                    row.iter()
                        .zip(input)
                        .fold(bias, |sum, (&w, &x)| w.mul_add(x, sum))
                }),
        );
        self.activation.apply_slice(output);
    }

    /// Overwrite weights and biases from `params` (exactly `param_count` long).
    fn load(&mut self, params: &[f32]) {
        let (weights, biases) = params.split_at(self.weights.len());
        self.weights.copy_from_slice(weights);
        self.biases.copy_from_slice(biases);
    }
}

/// Ordered dense layers sized from `layer_sizes`.
///
/// Stateless between calls apart from the cached last input and output,
/// which exist for explainability overlays only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedforwardNetwork {
    layer_sizes: Vec<usize>,
    layers: Vec<Layer>,
    #[serde(skip)]
    last_input: Vec<f32>,
    #[serde(skip)]
    last_output: Vec<f32>,
}

impl FeedforwardNetwork {
    /// Build a randomly initialised network.
    ///
    /// # Errors
    ///
    /// [`NetworkError::TooFewLayers`] or [`NetworkError::ZeroSizedLayer`] when
    /// `layer_sizes` does not describe a valid topology.
    pub fn new<R: Rng>(layer_sizes: &[usize], rng: &mut R) -> Result<Self, NetworkError> {
        validate_layer_sizes(layer_sizes)?;

        let count = layer_sizes.len() - 1;
        let layers = layer_sizes
            .windows(2)
            .enumerate()
            .map(|(i, pair)| Layer::he_init(pair[0], pair[1], Activation::for_layer(i, count), rng))
            .collect();

        Ok(Self {
            layer_sizes: layer_sizes.to_vec(),
            layers,
            last_input: Vec::new(),
            last_output: Vec::new(),
        })
    }

    /// Build a network and load `genome` into it.
    pub fn from_parameters(layer_sizes: &[usize], genome: &Genome) -> Result<Self, NetworkError> {
        validate_layer_sizes(layer_sizes)?;

        let count = layer_sizes.len() - 1;
        let layers = layer_sizes
            .windows(2)
            .enumerate()
            .map(|(i, pair)| Layer {
                inputs: pair[0],
                outputs: pair[1],
                weights: vec![0.0; pair[0] * pair[1]],
                biases: vec![0.0; pair[1]],
                activation: Activation::for_layer(i, count),
            })
            .collect();

        let mut network = Self {
            layer_sizes: layer_sizes.to_vec(),
            layers,
            last_input: Vec::new(),
            last_output: Vec::new(),
        };
        network.set_parameters(genome)?;
        Ok(network)
    }

    /// Parameter count for a topology, without building it.
    #[must_use]
    pub fn total_params(layer_sizes: &[usize]) -> usize {
        layer_sizes.windows(2).map(|p| p[0] * p[1] + p[1]).sum()
    }

    /// Parameter count of this network.
    #[must_use]
    pub fn get_total_params(&self) -> usize {
        self.layers.iter().map(Layer::param_count).sum()
    }

    #[must_use]
    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.layer_sizes[0]
    }

    #[must_use]
    pub fn num_outputs(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    /// Run the network on `input`.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InputLength`] if `input` does not match the first
    /// layer size.
    pub fn forward(&mut self, input: &[f32]) -> Result<Vec<f32>, NetworkError> {
        if input.len() != self.num_inputs() {
            return Err(NetworkError::InputLength {
                expected: self.num_inputs(),
                actual: input.len(),
            });
        }

        let mut current = input.to_vec();
        let mut next = Vec::new();
        for layer in &self.layers {
            layer.forward_into(&current, &mut next);
            std::mem::swap(&mut current, &mut next);
        }

        self.last_input.clear();
        self.last_input.extend_from_slice(input);
        self.last_output.clone_from(&current);
        Ok(current)
    }

    /// Concatenate each layer's weights then biases, in layer order.
    #[must_use]
    pub fn get_parameters(&self) -> Genome {
        let mut genes = Vec::with_capacity(self.get_total_params());
        for layer in &self.layers {
            genes.extend_from_slice(&layer.weights);
            genes.extend_from_slice(&layer.biases);
        }
        Genome::new(genes)
    }

    /// Load a genome produced by [`get_parameters`](Self::get_parameters).
    ///
    /// The length is checked before any layer is touched, so a rejected
    /// genome leaves the network unchanged.
    ///
    /// # Errors
    ///
    /// [`NetworkError::ParameterLength`] on a length mismatch.
    pub fn set_parameters(&mut self, genome: &Genome) -> Result<(), NetworkError> {
        let expected = self.get_total_params();
        if genome.len() != expected {
            return Err(NetworkError::ParameterLength {
                expected,
                actual: genome.len(),
            });
        }

        let mut rest = genome.genes();
        for layer in &mut self.layers {
            let (head, tail) = rest.split_at(layer.param_count());
            layer.load(head);
            rest = tail;
        }
        Ok(())
    }

    /// Input of the most recent [`forward`](Self::forward) call.
    #[must_use]
    pub fn last_input(&self) -> &[f32] {
        &self.last_input
    }

    /// Output of the most recent [`forward`](Self::forward) call.
    #[must_use]
    pub fn last_output(&self) -> &[f32] {
        &self.last_output
    }
}

fn validate_layer_sizes(layer_sizes: &[usize]) -> Result<(), NetworkError> {
    if layer_sizes.len() < 2 {
        return Err(NetworkError::TooFewLayers(layer_sizes.len()));
    }
    if let Some(index) = layer_sizes.iter().position(|&n| n == 0) {
        return Err(NetworkError::ZeroSizedLayer { index });
    }
    Ok(())
}
