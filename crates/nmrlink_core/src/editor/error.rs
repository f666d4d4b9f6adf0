//! Graph edit error model.

use crate::graph::formula::FormulaError;
use crate::model::graph::GraphValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by editor and store operations.
pub type EditResult<T> = Result<T, GraphEditError>;

/// Rejected graph edit. The committed graph is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEditError {
    CorrelationNotFound(String),
    /// The correlation does not hold the link.
    LinkNotFound {
        link_id: String,
        correlation_id: String,
    },
    /// A 2D link has no second holder.
    MissingCounterpart(String),
    AtomTypeMismatch {
        correlation_id: String,
        expected: String,
        found: String,
    },
    /// Every endpoint of a move targets its current correlation.
    MoveToSelf(String),
    /// Target correlation already holds the link.
    LinkAlreadyPresent {
        link_id: String,
        correlation_id: String,
    },
    DuplicatePseudoLink {
        row_id: String,
        column_id: String,
    },
    PseudoLinkNotFound {
        row_id: String,
        column_id: String,
    },
    /// Row and column of a pseudo link must differ.
    SelfLink(String),
    InvalidTolerance {
        atom_type: String,
        value: f64,
    },
    Formula(FormulaError),
    Validation(GraphValidationError),
    /// Commit or cancel without a pending edit.
    NoPendingEdit,
    /// A new edit was started while another is pending.
    EditInProgress,
}

impl Display for GraphEditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CorrelationNotFound(id) => write!(f, "correlation not found: {id}"),
            Self::LinkNotFound {
                link_id,
                correlation_id,
            } => write!(f, "link {link_id} not found on correlation {correlation_id}"),
            Self::MissingCounterpart(id) => write!(f, "2D link has no counterpart: {id}"),
            Self::AtomTypeMismatch {
                correlation_id,
                expected,
                found,
            } => write!(
                f,
                "correlation {correlation_id} has atom type {found}, expected {expected}"
            ),
            Self::MoveToSelf(id) => write!(f, "link {id} would move onto its own correlations"),
            Self::LinkAlreadyPresent {
                link_id,
                correlation_id,
            } => write!(f, "correlation {correlation_id} already holds link {link_id}"),
            Self::DuplicatePseudoLink { row_id, column_id } => write!(
                f,
                "pseudo HSQC link already exists between {row_id} and {column_id}"
            ),
            Self::PseudoLinkNotFound { row_id, column_id } => write!(
                f,
                "no pseudo HSQC link between {row_id} and {column_id}"
            ),
            Self::SelfLink(id) => write!(f, "correlation cannot link to itself: {id}"),
            Self::InvalidTolerance { atom_type, value } => {
                write!(f, "tolerance for {atom_type} must be positive, got {value}")
            }
            Self::Formula(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NoPendingEdit => write!(f, "no edit is pending"),
            Self::EditInProgress => write!(f, "another edit is already pending"),
        }
    }
}

impl Error for GraphEditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Formula(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GraphValidationError> for GraphEditError {
    fn from(value: GraphValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<FormulaError> for GraphEditError {
    fn from(value: FormulaError) -> Self {
        Self::Formula(value)
    }
}
