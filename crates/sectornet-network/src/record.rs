//! Serialized network record.
//!
//! A trained network is shipped as a three-line text record:
//!
//! ```text
//! w0,w1,w2,...            # flat weights, layer by layer, node by node
//! in,hidden...,out        # layer sizes
//! lo0,hi0,lo1,hi1,...     # bounds, one (low, high) pair per output node
//! ```
//!
//! Blank lines and whitespace around values are ignored.  Anything else that
//! does not fit the format is a [`ConfigError::Record`]; consistency between
//! the three lines is checked when the record is turned into a
//! [`BoundedNetwork`].

use std::fs;
use std::path::Path;

use sectornet_types::{ConfigError, SectorNetError};
use tracing::debug;

use crate::network::{Activation, BoundedNetwork, Bounds};

/// The three parsed lines of a network record.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkRecord {
    pub weights: Vec<f64>,
    pub layer_sizes: Vec<usize>,
    pub bounds: Vec<Bounds>,
}

impl NetworkRecord {
    /// Parse a record from text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.len() != 3 {
            return Err(ConfigError::Record(format!(
                "expected 3 non-empty lines (weights, layer sizes, bounds), found {}",
                lines.len()
            )));
        }

        let weights = parse_f64_list(lines[0])
            .map_err(|e| ConfigError::Record(format!("weights: {e}")))?;
        let layer_sizes = parse_usize_list(lines[1])
            .map_err(|e| ConfigError::Record(format!("layer sizes: {e}")))?;
        let flat_bounds = parse_f64_list(lines[2])
            .map_err(|e| ConfigError::Record(format!("bounds: {e}")))?;
        let bounds = reshape_bounds(&flat_bounds)?;

        debug!(
            weights = weights.len(),
            ?layer_sizes,
            bounds = bounds.len(),
            "parsed network record"
        );
        Ok(Self {
            weights,
            layer_sizes,
            bounds,
        })
    }

    /// Read and parse a record file.
    pub fn load(path: &Path) -> Result<Self, SectorNetError> {
        let raw = fs::read_to_string(path).map_err(|e| SectorNetError::Io {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        Ok(Self::parse(&raw)?)
    }

    /// Construct the network this record describes.
    ///
    /// `output_activations` defaults to tanh on every output node.
    pub fn build(
        &self,
        output_activations: Option<&[Activation]>,
    ) -> Result<BoundedNetwork, ConfigError> {
        match output_activations {
            Some(acts) => BoundedNetwork::with_output_activations(
                &self.weights,
                &self.layer_sizes,
                &self.bounds,
                acts,
            ),
            None => BoundedNetwork::new(&self.weights, &self.layer_sizes, &self.bounds),
        }
    }
}

/// Split a comma-separated list of decimal numbers.
pub fn parse_f64_list(line: &str) -> Result<Vec<f64>, String> {
    line.split(',')
        .enumerate()
        .map(|(i, item)| {
            let item = item.trim();
            item.parse::<f64>()
                .map_err(|_| format!("item {i} ({item:?}) is not a number"))
        })
        .collect()
}

/// Split a comma-separated list of non-negative integers.
pub fn parse_usize_list(line: &str) -> Result<Vec<usize>, String> {
    line.split(',')
        .enumerate()
        .map(|(i, item)| {
            let item = item.trim();
            item.parse::<usize>()
                .map_err(|_| format!("item {i} ({item:?}) is not a non-negative integer"))
        })
        .collect()
}

/// Reshape a flat `[lo0, hi0, lo1, hi1, ...]` list into row-major pairs.
pub fn reshape_bounds(flat: &[f64]) -> Result<Vec<Bounds>, ConfigError> {
    if flat.len() % 2 != 0 {
        return Err(ConfigError::Record(format!(
            "bounds: {} values cannot form (low, high) pairs",
            flat.len()
        )));
    }
    Ok(flat
        .chunks_exact(2)
        .map(|pair| Bounds::new(pair[0], pair[1]))
        .collect())
}
