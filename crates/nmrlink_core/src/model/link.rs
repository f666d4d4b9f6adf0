//! Correlation graph edge model.
//!
//! # Responsibility
//! - Describe one half of an experiment-backed edge between correlations.
//! - Provide dimension/delta helpers used by the editor and view filter.
//!
//! # Invariants
//! - A 2D link id is held by exactly two correlations, one per axis.
//! - A 1D link id is held by exactly one correlation.
//! - `atom_type[axis.index()]` equals the holder correlation's atom type.

use crate::model::signal::{Axis, Signal};
use serde::{Deserialize, Serialize};

/// NMR experiment a link was observed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentType {
    #[serde(rename = "1d")]
    OneD,
    Hsqc,
    Hmqc,
    Hmbc,
    Cosy,
    Tocsy,
    Noesy,
    Roesy,
    Inadequate,
    Adequate,
}

impl ExperimentType {
    /// Number of spectral dimensions of the experiment.
    pub fn dimension(self) -> u8 {
        match self {
            Self::OneD => 1,
            _ => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneD => "1d",
            Self::Hsqc => "hsqc",
            Self::Hmqc => "hmqc",
            Self::Hmbc => "hmbc",
            Self::Cosy => "cosy",
            Self::Tocsy => "tocsy",
            Self::Noesy => "noesy",
            Self::Roesy => "roesy",
            Self::Inadequate => "inadequate",
            Self::Adequate => "adequate",
        }
    }
}

/// User edit markers on a link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEdited {
    /// The link was moved away from the correlation it was built into.
    #[serde(default)]
    pub moved: bool,
}

/// One correlation's view of a graph edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    #[serde(rename = "experimentID")]
    pub experiment_id: String,
    pub experiment_type: ExperimentType,
    /// Element symbols per axis; one entry for 1D links.
    pub atom_type: Vec<String>,
    /// Axis on which the holding correlation sits.
    #[serde(default)]
    pub axis: Option<Axis>,
    #[serde(default)]
    pub pseudo: bool,
    pub signal: Signal,
    #[serde(default)]
    pub edited: LinkEdited,
}

impl Link {
    /// Builds a 1D link half for the correlation of `atom_type`.
    pub fn one_d(
        id: impl Into<String>,
        experiment_id: impl Into<String>,
        atom_type: impl Into<String>,
        signal: Signal,
    ) -> Self {
        Self {
            id: id.into(),
            experiment_id: experiment_id.into(),
            experiment_type: ExperimentType::OneD,
            atom_type: vec![atom_type.into()],
            axis: Some(Axis::X),
            pseudo: false,
            signal,
            edited: LinkEdited::default(),
        }
    }

    /// Builds the two halves of a 2D link, `(x half, y half)`.
    pub fn two_d_pair(
        id: impl Into<String>,
        experiment_id: impl Into<String>,
        experiment_type: ExperimentType,
        atom_types: [&str; 2],
        signal: Signal,
    ) -> (Self, Self) {
        let x_half = Self {
            id: id.into(),
            experiment_id: experiment_id.into(),
            experiment_type,
            atom_type: atom_types.iter().map(|value| value.to_string()).collect(),
            axis: Some(Axis::X),
            pseudo: false,
            signal,
            edited: LinkEdited::default(),
        };
        let y_half = x_half.with_axis(Axis::Y);
        (x_half, y_half)
    }

    /// Returns a copy of this half tagged for `axis`.
    pub fn with_axis(&self, axis: Axis) -> Self {
        Self {
            axis: Some(axis),
            ..self.clone()
        }
    }

    pub fn dimension(&self) -> u8 {
        if self.atom_type.len() < 2 {
            return 1;
        }
        self.experiment_type.dimension()
    }

    /// Axis of this half, `x` when untagged.
    pub fn effective_axis(&self) -> Axis {
        self.axis.unwrap_or(Axis::X)
    }

    /// Atom type expected at `axis` for this link.
    pub fn atom_type_at(&self, axis: Axis) -> Option<&str> {
        self.atom_type.get(axis.index()).map(String::as_str)
    }

    /// Chemical shift of the signal on this half's axis.
    pub fn delta(&self) -> Option<f64> {
        if self.dimension() == 1 {
            return self.signal.x;
        }
        self.signal.delta(self.effective_axis())
    }

    /// Whether this is an HSQC pseudo link used to infer attached protons.
    pub fn is_pseudo_hsqc(&self) -> bool {
        self.pseudo && self.experiment_type == ExperimentType::Hsqc
    }
}
