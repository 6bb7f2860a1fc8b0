//! `sectornet-runtime` – the perception-to-decision loop.
//!
//! # Modules
//!
//! - [`pipeline`] – [`DecisionPipeline`]: swimmer and vehicle
//!   [`SectorSensor`][sectornet_perception::SectorSensor]s feeding a
//!   [`Controller`], producing a
//!   [`DecisionRecord`][sectornet_types::DecisionRecord] per observation.
//! - [`follow_com`] – the centre-of-mass baseline controller.
//! - [`telemetry`] – [`init_tracing`]: global `tracing` subscriber with
//!   optional OTLP span export.

pub mod follow_com;
pub mod pipeline;
pub mod telemetry;

pub use follow_com::center_of_mass_heading;
pub use pipeline::{Controller, DecisionPipeline, command_for};
pub use telemetry::{LogFormat, TelemetryGuard, init_tracing};
