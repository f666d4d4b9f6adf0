//! Correlation graph domain model.
//!
//! # Responsibility
//! - Define the value types exchanged between the editor, stores and UI.
//! - Keep wire names aligned with the external JSON graph snapshot.
//!
//! # Invariants
//! - Model values are plain data; edits build new values instead of mutating
//!   committed snapshots.

pub mod correlation;
pub mod graph;
pub mod link;
pub mod signal;
