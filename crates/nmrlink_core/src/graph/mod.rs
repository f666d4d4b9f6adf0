//! Correlation graph state, derived attributes and view queries.
//!
//! # Responsibility
//! - Own the committed graph snapshot and its undo history.
//! - Derive non-overridden attributes after every change.
//! - Answer viewport and highlight-key queries for correlation rows.

pub mod derive;
pub mod formula;
pub mod store;
pub mod view;

pub use formula::{build_state, parse_molecular_formula, AtomTypeState, FormulaError};
pub use store::{
    CorrelationGraphStore, CorrelationPatch, FieldEdit, GraphCommit, GraphListener,
    GraphListenerId,
};
pub use view::{
    highlight_keys, is_in_view, DisplayerMode, SpectrumSource, Viewport, DELTA_PRECISION_SCALE,
};
