//! Test module for determinism, integration and property tests.
//!
//! # Test Structure
//!
//! - `determinism.rs`: identical inputs produce identical event logs
//! - `integration.rs`: end-to-end scenarios through [`Simulation`](crate::simulation::Simulation)
//! - `properties.rs`: proptest invariants (clamping, recalculation, stacks, cooldowns)
//! - `helpers.rs`: shared definitions and setup utilities

mod determinism;
mod helpers;

pub use helpers::*;
