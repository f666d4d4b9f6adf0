//! Spectral entity to atom assignments.
//!
//! # Responsibility
//! - Keep the per-entity (range/zone/signal) atom assignment table.
//! - Drive hover feedback for assignments through the highlight bus.

pub mod registry;

pub use registry::{Assignment, AssignmentRegistry};
