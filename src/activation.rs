//! Activation functions for dense layers.
//!
//! Hidden layers rectify; the output layer squashes into `[0, 1]` so each
//! output can be read as an independent command probability.

use serde::{Deserialize, Serialize};

/// Activation applied to a layer's pre-activation sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Activation {
    /// Rectified Linear Unit: f(x) = max(0, x)
    #[default]
    ReLU,
    /// Sigmoid: f(x) = 1 / (1 + e^(-x))
    Sigmoid,
}

impl Activation {
    /// All available activation functions.
    pub const ALL: [Self; 2] = [Self::ReLU, Self::Sigmoid];

    /// Activation for layer `index` of a network with `layer_count` layers.
    #[must_use]
    pub const fn for_layer(index: usize, layer_count: usize) -> Self {
        if index + 1 == layer_count {
            Self::Sigmoid
        } else {
            Self::ReLU
        }
    }

    /// Apply this activation function to an input value.
    ///
    /// NaN propagates; infinities map to the function's limits.
    #[inline]
    #[must_use]
    pub fn apply(self, x: f32) -> f32 {
        if x.is_nan() {
            return f32::NAN;
        }

        match self {
            Self::ReLU => {
                if x == f32::NEG_INFINITY {
                    return 0.0;
                }
                x.max(0.0)
            }
            Self::Sigmoid => {
                if x == f32::INFINITY {
                    return 1.0;
                }
                if x == f32::NEG_INFINITY {
                    return 0.0;
                }
                // sigmoid(-88) ≈ 0, sigmoid(88) ≈ 1; beyond that exp overflows
                let clamped = x.clamp(-88.0, 88.0);
                1.0 / (1.0 + (-clamped).exp())
            }
        }
    }

    /// Apply in place over a slice.
    #[inline]
    pub fn apply_slice(self, values: &mut [f32]) {
        for v in values {
            *v = self.apply(*v);
        }
    }

    /// Range of values this activation can produce.
    #[must_use]
    pub const fn output_range(self) -> (f32, f32) {
        match self {
            Self::ReLU => (0.0, f32::INFINITY),
            Self::Sigmoid => (0.0, 1.0),
        }
    }
}
