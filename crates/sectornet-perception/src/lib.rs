//! `sectornet-perception` – egocentric sensing.
//!
//! Turns the positions of nearby entities into the fixed-width vector a
//! controller can consume, independent of how many entities there are and of
//! the observer's absolute position.
//!
//! # Modules
//!
//! - [`angle`] – compass-angle helpers (bearings, signed heading deltas,
//!   sector geometry) shared by every component that reasons about
//!   direction.
//! - [`sector_sensor`] – [`SectorSensor`][sector_sensor::SectorSensor]:
//!   radial bucketed distance encoder with saturation and
//!   [`NormalizationRule`][sector_sensor::NormalizationRule]s.

pub mod angle;
pub mod sector_sensor;

pub use sector_sensor::{Bucket, Buckets, MAX_SECTORS, NormalizationRule, SectorSensor};
