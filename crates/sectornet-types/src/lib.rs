use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point entity (swimmer, neighbouring vehicle, ...) in the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &Point2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Observer pose. Heading is in degrees, 0° = north (+y), increasing
/// clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading_deg: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, heading_deg: f64) -> Self {
        Self { x, y, heading_deg }
    }

    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// One control-cycle snapshot, as delivered by the navigation layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    pub pose: Pose,
    /// People in the water. Always sensed.
    #[serde(default)]
    pub swimmers: Vec<Point2>,
    /// Other vehicles. Only sensed when a vehicle sensor is configured.
    #[serde(default)]
    pub vehicles: Vec<Point2>,
}

/// Bounded controller output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Absolute speed (m/s).
    pub speed: f64,
    /// Heading change relative to the current heading (degrees).
    pub delta_heading_deg: f64,
}

/// Objective handed to the helm: an absolute course and a speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleCommand {
    /// Desired course in degrees, `[0, 360)`.
    pub course_deg: f64,
    pub speed: f64,
}

/// Everything produced for one observation, emitted by the CLI stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub timestamp: DateTime<Utc>,
    pub readings: Vec<f64>,
    pub action: Option<Action>,
    pub command: Option<VehicleCommand>,
}

/// Construction-time failures. None of these are recoverable locally: the
/// affected component is never built.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("network topology needs at least 3 layers (input, hidden, output), got {actual}")]
    TooFewLayers { actual: usize },

    #[error("layer {layer} declares zero nodes")]
    EmptyLayer { layer: usize },

    #[error("network topology {layer_sizes:?} needs more weights than can be counted")]
    TopologyTooLarge { layer_sizes: Vec<usize> },

    #[error("weight count mismatch: topology requires {expected}, got {actual}")]
    WeightCount { expected: usize, actual: usize },

    #[error("bounds count mismatch: output layer has {expected} nodes, got {actual} bounds")]
    BoundsCount { expected: usize, actual: usize },

    #[error("bounds for output {index} are inverted: low {low} > high {high}")]
    InvertedBounds { index: usize, low: f64, high: f64 },

    #[error(
        "activation count mismatch: output layer has {expected} nodes, got {actual} activations"
    )]
    ActivationCount { expected: usize, actual: usize },

    #[error("network input layer is {actual} wide but the sensors produce {expected} readings")]
    InputWidth { expected: usize, actual: usize },

    #[error("network output layer is {actual} wide, expected {expected} (speed, heading)")]
    OutputWidth { expected: usize, actual: usize },

    #[error("invalid sensor configuration: {0}")]
    Sensor(String),

    #[error("malformed network record: {0}")]
    Record(String),
}

/// `forward` was handed a vector of the wrong length.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("input shape mismatch: expected {expected} values, got {actual}")]
pub struct InputShapeError {
    pub expected: usize,
    pub actual: usize,
}

/// Error type spanning configuration, evaluation and I/O failures.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum SectorNetError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    InputShape(#[from] InputShapeError),

    #[error("I/O error on {path}: {details}")]
    Io { path: String, details: String },
}
