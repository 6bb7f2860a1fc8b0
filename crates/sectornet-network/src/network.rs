//! Bounded feedforward network.
//!
//! A fully-connected multilayer perceptron with externally supplied,
//! pre-trained weights.  Topology, weights and output bounds are validated
//! once at construction; afterwards [`BoundedNetwork::forward`] is a pure
//! function of its input.
//!
//! # Weight layout
//!
//! Weights are consumed left-to-right, layer by layer, node by node.  Layer
//! `i` has `layer_sizes[i + 1]` nodes and each of them takes
//! `layer_sizes[i] + 1` weights, the last one being the bias (applied to a
//! constant `1.0` input).
//!
//! # Bound shaping
//!
//! The raw activation of output node `i` is mapped into its `(low, high)`
//! pair:
//! - [`Activation::Tanh`]: positive values are scaled by `high`, others by
//!   `-low`, so a symmetric `(-1, 1)` activation covers an asymmetric range.
//! - [`Activation::Linear`]: hard clip into `[low, high]`.
//!
//! # Example
//!
//! ```rust
//! use sectornet_network::network::{Bounds, BoundedNetwork};
//!
//! // 1 input, 1 hidden node, 1 output; every weight zero except the output bias.
//! let weights = [0.0, 0.0, 0.0, -20.0];
//! let net = BoundedNetwork::new(&weights, &[1, 1, 1], &[Bounds::new(-3.0, 10.0)]).unwrap();
//!
//! // tanh(-20) ≈ -1, scaled by -low = 3.
//! let out = net.forward(&[0.7]).unwrap();
//! assert!((out[0] + 3.0).abs() < 1e-9);
//! ```

use sectornet_types::{ConfigError, InputShapeError};
use tracing::{debug, info};

// ────────────────────────────────────────────────────────────────────────────
// Activation / Bounds
// ────────────────────────────────────────────────────────────────────────────

/// Node activation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// Hyperbolic tangent, range `(-1, 1)`.  Used by every hidden node.
    #[default]
    Tanh,
    /// Identity.
    Linear,
}

impl Activation {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Tanh => x.tanh(),
            Activation::Linear => x,
        }
    }

    /// Parse `"tanh"` or `"linear"` (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "tanh" => Some(Activation::Tanh),
            "linear" => Some(Activation::Linear),
            _ => None,
        }
    }
}

/// Physical range of one output node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub low: f64,
    pub high: f64,
}

impl Bounds {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Map a raw output activation into this range.
    pub fn shape(&self, raw: f64, activation: Activation) -> f64 {
        match activation {
            Activation::Tanh => {
                if raw > 0.0 {
                    raw * self.high
                } else {
                    // low is expected to be negative; negating keeps the sign.
                    raw * -self.low
                }
            }
            Activation::Linear => {
                if raw < self.low {
                    self.low
                } else if raw > self.high {
                    self.high
                } else {
                    raw
                }
            }
        }
    }
}

/// Number of weights a topology consumes: `Σ (layer_sizes[i] + 1) * layer_sizes[i + 1]`.
///
/// `None` when the count does not fit in a `usize`.
pub fn required_weights(layer_sizes: &[usize]) -> Option<usize> {
    layer_sizes.windows(2).try_fold(0usize, |acc, w| {
        let layer = w[0].checked_add(1)?.checked_mul(w[1])?;
        acc.checked_add(layer)
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Node / Layer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct Node {
    /// `inputs + 1` weights, bias last.
    weights: Vec<f64>,
    activation: Activation,
}

impl Node {
    fn activate(&self, inputs: &[f64]) -> f64 {
        let sum = inputs
            .iter()
            .chain(std::iter::once(&1.0))
            .zip(&self.weights)
            .fold(0.0, |acc, (x, w)| acc + x * w);
        self.activation.apply(sum)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Layer {
    nodes: Vec<Node>,
}

impl Layer {
    fn forward(&self, inputs: &[f64]) -> Vec<f64> {
        self.nodes.iter().map(|n| n.activate(inputs)).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// BoundedNetwork
// ────────────────────────────────────────────────────────────────────────────

/// Fixed-topology MLP with per-output bound shaping.
///
/// Immutable after construction and free of interior state, so one instance
/// can serve concurrent callers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedNetwork {
    layer_sizes: Vec<usize>,
    layers: Vec<Layer>,
    bounds: Vec<Bounds>,
}

impl BoundedNetwork {
    /// Build a network whose output nodes all use [`Activation::Tanh`].
    ///
    /// # Errors
    ///
    /// See [`BoundedNetwork::with_output_activations`].
    pub fn new(
        weights: &[f64],
        layer_sizes: &[usize],
        bounds: &[Bounds],
    ) -> Result<Self, ConfigError> {
        Self::build(weights, layer_sizes, bounds, None)
    }

    /// Build a network with an explicit activation for each output node.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] (never a partially built network) when:
    /// - fewer than 3 layer sizes are given ([`ConfigError::TooFewLayers`]),
    /// - a layer size is zero ([`ConfigError::EmptyLayer`]),
    /// - the topology needs more weights than a `usize` can count
    ///   ([`ConfigError::TopologyTooLarge`]),
    /// - `weights` is not exactly [`required_weights`] long
    ///   ([`ConfigError::WeightCount`]),
    /// - there is not one bounds pair per output node
    ///   ([`ConfigError::BoundsCount`]),
    /// - there is not one activation per output node
    ///   ([`ConfigError::ActivationCount`]),
    /// - a bounds pair has `low > high` ([`ConfigError::InvertedBounds`]).
    pub fn with_output_activations(
        weights: &[f64],
        layer_sizes: &[usize],
        bounds: &[Bounds],
        output_activations: &[Activation],
    ) -> Result<Self, ConfigError> {
        Self::build(weights, layer_sizes, bounds, Some(output_activations))
    }

    fn build(
        weights: &[f64],
        layer_sizes: &[usize],
        bounds: &[Bounds],
        output_activations: Option<&[Activation]>,
    ) -> Result<Self, ConfigError> {
        if layer_sizes.len() < 3 {
            return Err(ConfigError::TooFewLayers {
                actual: layer_sizes.len(),
            });
        }
        if let Some(layer) = layer_sizes.iter().position(|&n| n == 0) {
            return Err(ConfigError::EmptyLayer { layer });
        }

        let expected =
            required_weights(layer_sizes).ok_or_else(|| ConfigError::TopologyTooLarge {
                layer_sizes: layer_sizes.to_vec(),
            })?;
        if weights.len() != expected {
            return Err(ConfigError::WeightCount {
                expected,
                actual: weights.len(),
            });
        }

        let output_size = layer_sizes[layer_sizes.len() - 1];
        if bounds.len() != output_size {
            return Err(ConfigError::BoundsCount {
                expected: output_size,
                actual: bounds.len(),
            });
        }
        if let Some(index) = bounds.iter().position(|b| !(b.low <= b.high)) {
            return Err(ConfigError::InvertedBounds {
                index,
                low: bounds[index].low,
                high: bounds[index].high,
            });
        }

        let output_activations = match output_activations {
            Some(acts) if acts.len() != output_size => {
                return Err(ConfigError::ActivationCount {
                    expected: output_size,
                    actual: acts.len(),
                });
            }
            Some(acts) => acts.to_vec(),
            None => vec![Activation::Tanh; output_size],
        };

        let last = layer_sizes.len() - 2;
        let mut remaining = weights;
        let mut layers = Vec::with_capacity(layer_sizes.len() - 1);
        for (i, pair) in layer_sizes.windows(2).enumerate() {
            let (fan_in, node_count) = (pair[0] + 1, pair[1]);
            let mut nodes = Vec::with_capacity(node_count);
            for j in 0..node_count {
                let (node_weights, rest) = remaining.split_at(fan_in);
                remaining = rest;
                let activation = if i == last {
                    output_activations[j]
                } else {
                    Activation::Tanh
                };
                nodes.push(Node {
                    weights: node_weights.to_vec(),
                    activation,
                });
            }
            debug!(layer = i + 1, nodes = node_count, fan_in, "initialized network layer");
            layers.push(Layer { nodes });
        }

        info!(
            ?layer_sizes,
            weights = weights.len(),
            ?output_activations,
            "bounded network initialized"
        );

        Ok(Self {
            layer_sizes: layer_sizes.to_vec(),
            layers,
            bounds: bounds.to_vec(),
        })
    }

    /// Width of the input layer.
    pub fn input_size(&self) -> usize {
        self.layer_sizes[0]
    }

    /// Width of the output layer.
    pub fn output_size(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    pub fn bounds(&self) -> &[Bounds] {
        &self.bounds
    }

    pub fn output_activations(&self) -> Vec<Activation> {
        self.output_layer().nodes.iter().map(|n| n.activation).collect()
    }

    fn output_layer(&self) -> &Layer {
        // Construction guarantees at least two weighted layers.
        &self.layers[self.layers.len() - 1]
    }

    /// Evaluate the network and shape each output into its bounds.
    ///
    /// # Errors
    ///
    /// Returns [`InputShapeError`] when `inputs` is not exactly
    /// [`input_size`][Self::input_size] long.
    pub fn forward(&self, inputs: &[f64]) -> Result<Vec<f64>, InputShapeError> {
        if inputs.len() != self.input_size() {
            return Err(InputShapeError {
                expected: self.input_size(),
                actual: inputs.len(),
            });
        }

        let mut current = inputs.to_vec();
        for layer in &self.layers {
            current = layer.forward(&current);
        }

        let shaped: Vec<f64> = current
            .iter()
            .zip(&self.output_layer().nodes)
            .zip(&self.bounds)
            .map(|((&raw, node), bounds)| bounds.shape(raw, node.activation))
            .collect();

        debug!(raw = ?current, outputs = ?shaped, "network forward pass");
        Ok(shaped)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
