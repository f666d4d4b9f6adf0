//! Correlation (graph node) model.
//!
//! # Responsibility
//! - Represent one candidate atom and the link halves it holds.
//! - Track which derived fields the chemist has overridden.
//!
//! # Invariants
//! - `edited.<field> == true` freezes that field against recomputation.
//! - Pseudo correlations have no own signal.

use crate::model::link::Link;
use crate::model::signal::{Axis, Signal};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display label of a correlation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationLabel {
    pub origin: String,
}

/// Sticky override flags for derived fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationEdited {
    #[serde(default)]
    pub equivalence: bool,
    #[serde(default)]
    pub protons_count: bool,
    #[serde(default)]
    pub hybridization: bool,
}

/// Graph node for one candidate atom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correlation {
    pub id: String,
    pub atom_type: String,
    #[serde(default)]
    pub label: CorrelationLabel,
    #[serde(default = "default_equivalence")]
    pub equivalence: u32,
    #[serde(default)]
    pub protons_count: Vec<u32>,
    #[serde(default)]
    pub hybridization: Vec<u8>,
    #[serde(default)]
    pub pseudo: bool,
    #[serde(default)]
    pub signal: Option<Signal>,
    #[serde(default, rename = "link")]
    pub links: Vec<Link>,
    #[serde(default)]
    pub edited: CorrelationEdited,
}

fn default_equivalence() -> u32 {
    1
}

impl Correlation {
    /// Creates an observed correlation with a generated id.
    pub fn new(atom_type: impl Into<String>, label: impl Into<String>, signal: Signal) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), atom_type, label, Some(signal))
    }

    /// Creates a pseudo heavy-atom placeholder with a generated id.
    pub fn new_pseudo(atom_type: impl Into<String>, label: impl Into<String>) -> Self {
        let mut correlation = Self::with_id(Uuid::new_v4().to_string(), atom_type, label, None);
        correlation.pseudo = true;
        correlation.protons_count = vec![0];
        correlation
    }

    /// Creates a correlation with a caller-provided id.
    ///
    /// Used by snapshot import paths and tests where identity already exists.
    pub fn with_id(
        id: impl Into<String>,
        atom_type: impl Into<String>,
        label: impl Into<String>,
        signal: Option<Signal>,
    ) -> Self {
        Self {
            id: id.into(),
            atom_type: atom_type.into(),
            label: CorrelationLabel {
                origin: label.into(),
            },
            equivalence: default_equivalence(),
            protons_count: Vec::new(),
            hybridization: Vec::new(),
            pseudo: false,
            signal,
            links: Vec::new(),
            edited: CorrelationEdited::default(),
        }
    }

    pub fn find_link(&self, link_id: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.id == link_id)
    }

    pub fn has_link(&self, link_id: &str) -> bool {
        self.find_link(link_id).is_some()
    }

    /// Own signal delta on this correlation's axis, falling back to the
    /// first link with a position.
    ///
    /// A 2D own signal is read on the axis of the half that carries it; a
    /// signal without a `y` shift is read on `x`.
    pub fn delta(&self) -> Option<f64> {
        if let Some(signal) = &self.signal {
            let axis = self
                .links
                .iter()
                .find(|link| link.signal.id == signal.id)
                .map(Link::effective_axis)
                .or_else(|| signal.y.is_none().then_some(Axis::X));
            if let Some(delta) = axis.and_then(|axis| signal.delta(axis)) {
                return Some(delta);
            }
        }
        self.links.iter().find_map(Link::delta)
    }

    /// Number of pseudo HSQC links held by this correlation.
    pub fn pseudo_hsqc_count(&self) -> u32 {
        self.links.iter().filter(|link| link.is_pseudo_hsqc()).count() as u32
    }
}
