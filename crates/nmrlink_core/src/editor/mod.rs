//! Correlation graph edit algebra and edit lifecycle.
//!
//! # Responsibility
//! - Turn user edit requests into complete, validated graph deltas.
//! - Enforce one pending edit at a time.
//!
//! # See also
//! - `graph::store` for how outcomes are committed.

pub mod error;
pub mod ops;
pub mod session;

pub use error::{EditResult, GraphEditError};
pub use ops::{
    add_pseudo_hsqc, apply, move_link, remove_all, remove_link, remove_pseudo_hsqc,
    set_path_length, unmove_link, CommitOptions, EditAction, EditOutcome, PseudoLinkOp,
    TargetCorrelation, PSEUDO_EXPERIMENT_ID,
};
pub use session::{EditSession, EditState};
