//! The network engine and everything built around it.
//!
//! - [`Evonet`] - Architecture, free parameters and the update step
//! - [`ProceduralLayout`] - Canonical input/hidden/output topologies
//! - [`EvonetConfig`] - Serializable settings for [`Evonet::configure`]
//! - [`ActivationHistory`] / [`ActivationFrame`] - Access to past activations
//! - [`EvonetIterator`] - Sensor/motor binding through the
//!   [`ControllerInputIterator`] and [`ControllerOutputIterator`] traits
//!
//! # Per-step protocol
//!
//! 1. Write every sensor value ([`Evonet::set_input`] or the iterator)
//! 2. Call [`Evonet::update`] once
//! 3. Read every motor value ([`Evonet::output`] or the iterator)

pub use self::{build::*, config::*, evonet::*, history::*, iterator::*, monitor::ActivationFrame};

mod build;
mod config;
mod evonet;
mod history;
mod iterator;
mod monitor;
mod net_file;
