//! Perception-to-decision pipeline.
//!
//! One [`DecisionPipeline::process`] call is one control cycle:
//!
//! ```text
//! Observation ─▶ swimmer SectorSensor ─┐
//!             └▶ vehicle SectorSensor ─┴▶ readings ─▶ Controller ─▶ Action ─▶ VehicleCommand
//! ```
//!
//! The vehicle sensor and the controller are both optional.  Sensor widths
//! and the network topology are cross-checked when the pipeline is built,
//! so a pipeline that exists can always evaluate its network.
//!
//! # Example
//!
//! ```rust
//! use sectornet_perception::{NormalizationRule, SectorSensor};
//! use sectornet_runtime::pipeline::{Controller, DecisionPipeline};
//! use sectornet_types::{Observation, Point2, Pose};
//!
//! let swimmers = SectorSensor::new(50.0, 5.0, 4, NormalizationRule::Dynamic).unwrap();
//! let pipeline = DecisionPipeline::new(
//!     swimmers,
//!     None,
//!     Some(Controller::FollowCenterOfMass { speed: 1.5 }),
//! )
//! .unwrap();
//!
//! let obs = Observation {
//!     pose: Pose::new(0.0, 0.0, 0.0),
//!     swimmers: vec![Point2::new(10.0, 0.0)],
//!     vehicles: vec![],
//! };
//! let record = pipeline.process(&obs).unwrap();
//! let command = record.command.unwrap();
//! assert!((command.course_deg - 90.0).abs() < 1e-9);
//! assert_eq!(command.speed, 1.5);
//! ```

use chrono::Utc;
use sectornet_network::BoundedNetwork;
use sectornet_perception::SectorSensor;
use sectornet_perception::angle::angle360;
use sectornet_types::{
    Action, ConfigError, DecisionRecord, Observation, Pose, SectorNetError, VehicleCommand,
};
use tracing::debug;

use crate::follow_com::center_of_mass_heading;

/// Index of the speed output of a network controller.
pub const SPEED_OUTPUT: usize = 0;
/// Index of the relative-heading output of a network controller.
pub const HEADING_OUTPUT: usize = 1;
/// Required output width of a network controller.
pub const ACTION_WIDTH: usize = 2;

/// Turns sensor readings into an [`Action`].
#[derive(Debug, Clone)]
pub enum Controller {
    /// Pre-trained network; output [`SPEED_OUTPUT`] is the speed and
    /// [`HEADING_OUTPUT`] the relative heading change.
    Network(BoundedNetwork),
    /// Steer toward the centre of mass of the swimmer readings at a constant
    /// speed.
    FollowCenterOfMass { speed: f64 },
}

/// Sensors plus an optional controller, validated as a unit.
#[derive(Debug, Clone)]
pub struct DecisionPipeline {
    swimmer_sensor: SectorSensor,
    vehicle_sensor: Option<SectorSensor>,
    controller: Option<Controller>,
}

impl DecisionPipeline {
    /// Assemble a pipeline.
    ///
    /// # Errors
    ///
    /// For a [`Controller::Network`]:
    /// - [`ConfigError::InputWidth`] when the network's input layer differs
    ///   from the total sector count of the configured sensors,
    /// - [`ConfigError::OutputWidth`] when the output layer is not
    ///   [`ACTION_WIDTH`] wide.
    pub fn new(
        swimmer_sensor: SectorSensor,
        vehicle_sensor: Option<SectorSensor>,
        controller: Option<Controller>,
    ) -> Result<Self, ConfigError> {
        let pipeline = Self {
            swimmer_sensor,
            vehicle_sensor,
            controller,
        };

        if let Some(Controller::Network(net)) = &pipeline.controller {
            let expected = pipeline.expected_input_width();
            if net.input_size() != expected {
                return Err(ConfigError::InputWidth {
                    expected,
                    actual: net.input_size(),
                });
            }
            if net.output_size() != ACTION_WIDTH {
                return Err(ConfigError::OutputWidth {
                    expected: ACTION_WIDTH,
                    actual: net.output_size(),
                });
            }
        }

        Ok(pipeline)
    }

    /// Length of the concatenated reading vector.
    pub fn expected_input_width(&self) -> usize {
        self.swimmer_sensor.sector_count()
            + self.vehicle_sensor.as_ref().map_or(0, SectorSensor::sector_count)
    }

    pub fn swimmer_sensor(&self) -> &SectorSensor {
        &self.swimmer_sensor
    }

    pub fn vehicle_sensor(&self) -> Option<&SectorSensor> {
        self.vehicle_sensor.as_ref()
    }

    pub fn controller(&self) -> Option<&Controller> {
        self.controller.as_ref()
    }

    /// Swimmer readings followed by vehicle readings (when a vehicle sensor
    /// is configured).
    pub fn sense(&self, obs: &Observation) -> Vec<f64> {
        let mut readings = self.swimmer_sensor.query(&obs.swimmers, obs.pose);
        if let Some(vehicle_sensor) = &self.vehicle_sensor {
            readings.extend(vehicle_sensor.query(&obs.vehicles, obs.pose));
        }
        readings
    }

    /// Run the controller on already-sensed `readings`.
    ///
    /// Returns `Ok(None)` when no controller is configured.
    pub fn decide(&self, readings: &[f64]) -> Result<Option<Action>, SectorNetError> {
        let Some(controller) = &self.controller else {
            return Ok(None);
        };

        let action = match controller {
            Controller::Network(net) => {
                let outputs = net.forward(readings)?;
                Action {
                    speed: outputs[SPEED_OUTPUT],
                    delta_heading_deg: outputs[HEADING_OUTPUT],
                }
            }
            Controller::FollowCenterOfMass { speed } => {
                let swimmer_width = self.swimmer_sensor.sector_count().min(readings.len());
                let swimmer_readings = &readings[..swimmer_width];
                Action {
                    speed: *speed,
                    delta_heading_deg: center_of_mass_heading(swimmer_readings).unwrap_or(0.0),
                }
            }
        };
        Ok(Some(action))
    }

    /// One full control cycle.
    pub fn process(&self, obs: &Observation) -> Result<DecisionRecord, SectorNetError> {
        let readings = self.sense(obs);
        let action = self.decide(&readings)?;
        let command = action.map(|a| command_for(&a, &obs.pose));
        debug!(?action, ?command, "control cycle complete");

        Ok(DecisionRecord {
            timestamp: Utc::now(),
            readings,
            action,
            command,
        })
    }
}

/// Convert a relative [`Action`] into an absolute helm objective.
pub fn command_for(action: &Action, pose: &Pose) -> VehicleCommand {
    VehicleCommand {
        course_deg: angle360(pose.heading_deg + action.delta_heading_deg),
        speed: action.speed,
    }
}
