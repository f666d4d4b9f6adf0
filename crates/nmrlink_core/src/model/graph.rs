//! Correlation graph snapshot and structural validation.
//!
//! # Responsibility
//! - Hold the complete set of correlations plus graph-wide options.
//! - Check the symmetry invariants every committed snapshot must satisfy.
//!
//! # Invariants
//! - Correlation ids are unique.
//! - Each link id is held once (1D) or exactly twice on opposite axes (2D).
//! - Every link half's atom type at its axis equals its holder's atom type.

use crate::identity;
use crate::model::correlation::Correlation;
use crate::model::link::Link;
use crate::model::signal::Axis;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Graph-wide options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphOptions {
    /// Shift matching tolerance (ppm) per atom type.
    #[serde(default)]
    pub tolerance: BTreeMap<String, f64>,
    /// Molecular formula of the candidate structure, e.g. `C10H12O`.
    #[serde(default)]
    pub mf: Option<String>,
}

/// Full correlation graph snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationGraph {
    #[serde(default)]
    pub correlations: Vec<Correlation>,
    #[serde(default)]
    pub options: GraphOptions,
}

impl CorrelationGraph {
    pub fn new(correlations: Vec<Correlation>) -> Self {
        Self {
            correlations,
            options: GraphOptions::default(),
        }
    }

    pub fn find(&self, correlation_id: &str) -> Option<&Correlation> {
        self.correlations
            .iter()
            .find(|correlation| correlation.id == correlation_id)
    }

    pub fn position(&self, correlation_id: &str) -> Option<usize> {
        self.correlations
            .iter()
            .position(|correlation| correlation.id == correlation_id)
    }

    /// Returns every `(correlation, half)` pair holding `link_id`.
    pub fn link_holders(&self, link_id: &str) -> Vec<(&Correlation, &Link)> {
        self.correlations
            .iter()
            .filter_map(|correlation| {
                correlation
                    .find_link(link_id)
                    .map(|link| (correlation, link))
            })
            .collect()
    }

    /// Whether any link in the graph still references `signal_id`.
    pub fn references_signal(&self, signal_id: &str) -> bool {
        self.correlations.iter().any(|correlation| {
            correlation
                .links
                .iter()
                .any(|link| link.signal.id == signal_id)
        })
    }

    /// Next free display label for `atom_type`, e.g. `C3`.
    pub fn next_label(&self, atom_type: &str) -> String {
        let taken: HashSet<&str> = self
            .correlations
            .iter()
            .map(|correlation| correlation.label.origin.as_str())
            .collect();
        let mut index = self
            .correlations
            .iter()
            .filter(|correlation| correlation.atom_type == atom_type)
            .count()
            + 1;
        loop {
            let candidate = format!("{atom_type}{index}");
            if !taken.contains(candidate.as_str()) {
                return candidate;
            }
            index += 1;
        }
    }

    /// Validates structural invariants of this snapshot.
    ///
    /// # Errors
    /// - Returns the first violated invariant with the offending ids.
    pub fn validate(&self) -> Result<(), GraphValidationError> {
        let mut correlation_ids = HashSet::new();
        let mut halves: BTreeMap<&str, Vec<(&str, &Link)>> = BTreeMap::new();

        for correlation in &self.correlations {
            if correlation.id.trim().is_empty() {
                return Err(GraphValidationError::EmptyCorrelationId);
            }
            if !identity::is_reserved_free(&correlation.id) {
                return Err(GraphValidationError::ReservedToken(correlation.id.clone()));
            }
            if !correlation_ids.insert(correlation.id.as_str()) {
                return Err(GraphValidationError::DuplicateCorrelationId(
                    correlation.id.clone(),
                ));
            }

            let mut own_links = HashSet::new();
            for link in &correlation.links {
                if !identity::is_reserved_free(&link.id) {
                    return Err(GraphValidationError::ReservedToken(link.id.clone()));
                }
                if !identity::is_reserved_free(&link.signal.id) {
                    return Err(GraphValidationError::ReservedToken(link.signal.id.clone()));
                }
                if !own_links.insert(link.id.as_str()) {
                    return Err(GraphValidationError::DuplicateLinkInCorrelation {
                        correlation_id: correlation.id.clone(),
                        link_id: link.id.clone(),
                    });
                }
                if link.dimension() == 2 && link.axis.is_none() {
                    return Err(GraphValidationError::MissingAxis(link.id.clone()));
                }
                let expected = link.atom_type_at(link.effective_axis()).unwrap_or_default();
                if expected != correlation.atom_type {
                    return Err(GraphValidationError::AtomTypeMismatch {
                        correlation_id: correlation.id.clone(),
                        link_id: link.id.clone(),
                        expected: expected.to_string(),
                        found: correlation.atom_type.clone(),
                    });
                }
                halves
                    .entry(link.id.as_str())
                    .or_default()
                    .push((correlation.id.as_str(), link));
            }
        }

        for (link_id, holders) in halves {
            let expected = if holders[0].1.dimension() == 1 { 1 } else { 2 };
            if holders.len() != expected {
                return Err(GraphValidationError::LinkArity {
                    link_id: link_id.to_string(),
                    expected,
                    found: holders.len(),
                });
            }
            if expected == 2 {
                let axes: HashSet<Axis> = holders
                    .iter()
                    .map(|(_, link)| link.effective_axis())
                    .collect();
                if axes.len() != 2 {
                    return Err(GraphValidationError::LinkAxes(link_id.to_string()));
                }
            }
        }

        Ok(())
    }
}

/// Structural invariant violations of a graph snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphValidationError {
    EmptyCorrelationId,
    DuplicateCorrelationId(String),
    /// Id contains the reserved compose token.
    ReservedToken(String),
    DuplicateLinkInCorrelation {
        correlation_id: String,
        link_id: String,
    },
    /// 2D link half without axis tag.
    MissingAxis(String),
    AtomTypeMismatch {
        correlation_id: String,
        link_id: String,
        expected: String,
        found: String,
    },
    /// Link held by the wrong number of correlations.
    LinkArity {
        link_id: String,
        expected: usize,
        found: usize,
    },
    /// 2D link halves are not on opposite axes.
    LinkAxes(String),
}

impl Display for GraphValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCorrelationId => write!(f, "correlation id must not be empty"),
            Self::DuplicateCorrelationId(id) => write!(f, "duplicate correlation id: {id}"),
            Self::ReservedToken(id) => write!(
                f,
                "id must not contain reserved token `{}`: {id}",
                identity::JOIN_TOKEN
            ),
            Self::DuplicateLinkInCorrelation {
                correlation_id,
                link_id,
            } => write!(
                f,
                "link {link_id} is held twice by correlation {correlation_id}"
            ),
            Self::MissingAxis(id) => write!(f, "2D link has no axis: {id}"),
            Self::AtomTypeMismatch {
                correlation_id,
                link_id,
                expected,
                found,
            } => write!(
                f,
                "link {link_id} expects atom type {expected} but correlation {correlation_id} is {found}"
            ),
            Self::LinkArity {
                link_id,
                expected,
                found,
            } => write!(
                f,
                "link {link_id} must be held by {expected} correlation(s), found {found}"
            ),
            Self::LinkAxes(id) => write!(f, "2D link halves must be on opposite axes: {id}"),
        }
    }
}

impl Error for GraphValidationError {}
