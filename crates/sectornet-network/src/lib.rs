//! `sectornet-network` – the neural controller.
//!
//! Evaluates small pre-trained feedforward networks and shapes their outputs
//! into physically meaningful, bounded action values.  Training is out of
//! scope; weights arrive from outside as a [`NetworkRecord`][record::NetworkRecord].
//!
//! # Modules
//!
//! - [`network`] – [`BoundedNetwork`][network::BoundedNetwork]: validated
//!   fixed-topology MLP with per-output [`Bounds`][network::Bounds] shaping.
//! - [`record`] – [`NetworkRecord`][record::NetworkRecord]: parser for the
//!   three-line weights / layer sizes / bounds text format.

pub mod network;
pub mod record;

pub use network::{Activation, BoundedNetwork, Bounds};
pub use record::NetworkRecord;
