//! Core domain logic for nmrlink.
//! This crate is the single source of truth for correlation graph invariants.

pub mod assignment;
pub mod config;
pub mod editor;
pub mod graph;
pub mod highlight;
pub mod identity;
pub mod logging;
pub mod model;
pub mod service;

pub use assignment::{Assignment, AssignmentRegistry};
pub use config::SessionConfig;
pub use editor::{
    CommitOptions, EditAction, EditOutcome, EditResult, EditSession, EditState, GraphEditError,
    PseudoLinkOp, TargetCorrelation,
};
pub use graph::{
    AtomTypeState, CorrelationGraphStore, CorrelationPatch, DisplayerMode, FieldEdit, FormulaError,
    GraphCommit, SpectrumSource, Viewport,
};
pub use highlight::{HighlightBus, HighlightChange, HighlightScope, SharedHighlightBus, SubscriberId};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::correlation::Correlation;
pub use model::graph::{CorrelationGraph, GraphOptions, GraphValidationError};
pub use model::link::{ExperimentType, Link};
pub use model::signal::{Axis, PathLength, Signal};
pub use service::AnnotationSession;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
