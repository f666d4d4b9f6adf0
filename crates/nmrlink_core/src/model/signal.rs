//! Spectral signal model.
//!
//! # Responsibility
//! - Describe one peak-picked feature referenced by links and correlations.
//! - Carry the optional coupling path length annotated by the chemist.
//!
//! # Invariants
//! - `id` is globally unique and never changes after creation.
//! - Pseudo signals carry no delta on either axis.

use serde::{Deserialize, Serialize};

/// Axis of a 1D/2D spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Stable lowercase name used in composed keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
        }
    }

    /// Position of this axis inside a link `atomType` pair.
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
        }
    }

    /// The other axis of a 2D experiment.
    pub fn opposite(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
}

/// Who set a path length value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathLengthSource {
    /// Entered by the chemist in the link editor.
    Manual,
    /// Computed from a candidate structure.
    Derived,
}

/// Coupling path length range (number of bonds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathLength {
    /// `[min, max]` as entered; ordering is not enforced.
    pub values: [u32; 2],
    pub source: PathLengthSource,
}

impl PathLength {
    pub fn manual(min: u32, max: u32) -> Self {
        Self {
            values: [min, max],
            source: PathLengthSource::Manual,
        }
    }

    pub fn min(&self) -> u32 {
        self.values[0]
    }

    pub fn max(&self) -> u32 {
        self.values[1]
    }
}

/// Peak-picked spectral feature owned by one range or zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub id: String,
    /// Chemical shift (ppm) on the direct dimension.
    #[serde(default)]
    pub x: Option<f64>,
    /// Chemical shift (ppm) on the indirect dimension, 2D only.
    #[serde(default)]
    pub y: Option<f64>,
    /// Phase sign for edited experiments: -1, 0 or 1.
    #[serde(default)]
    pub sign: Option<i8>,
    #[serde(default)]
    pub path_length: Option<PathLength>,
}

impl Signal {
    /// Creates a 1D signal at `delta`.
    pub fn one_d(id: impl Into<String>, delta: f64) -> Self {
        Self {
            id: id.into(),
            x: Some(delta),
            y: None,
            sign: None,
            path_length: None,
        }
    }

    /// Creates a 2D signal at `(x, y)`.
    pub fn two_d(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x: Some(x),
            y: Some(y),
            sign: None,
            path_length: None,
        }
    }

    /// Creates a position-less signal for pseudo links.
    pub fn pseudo(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: None,
            y: None,
            sign: Some(0),
            path_length: None,
        }
    }

    /// Returns the delta on `axis`, if present.
    pub fn delta(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}
