//! Session configuration.
//!
//! # Invariants
//! - Missing fields fall back to [`SessionConfig::default`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_UNDO_LIMIT: usize = 50;
const HEAVY_ATOM_TOLERANCE: f64 = 0.25;
const PROTON_TOLERANCE: f64 = 0.02;
const HEAVY_ATOM_TYPES: [&str; 7] = ["C", "N", "O", "F", "Si", "P", "S"];

/// Tunables for one annotation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Committed snapshots kept for undo. `0` disables undo.
    pub undo_limit: usize,
    /// Shift tolerance (ppm) applied to atom types a snapshot leaves unset.
    pub default_tolerance: BTreeMap<String, f64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let mut default_tolerance: BTreeMap<String, f64> = HEAVY_ATOM_TYPES
            .iter()
            .map(|atom_type| (atom_type.to_string(), HEAVY_ATOM_TOLERANCE))
            .collect();
        default_tolerance.insert("H".to_string(), PROTON_TOLERANCE);
        Self {
            undo_limit: DEFAULT_UNDO_LIMIT,
            default_tolerance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SessionConfig;

    #[test]
    fn defaults_cover_common_nuclei() {
        let config = SessionConfig::default();
        assert_eq!(config.undo_limit, 50);
        assert_eq!(config.default_tolerance.get("H"), Some(&0.02));
        assert_eq!(config.default_tolerance.get("C"), Some(&0.25));
        assert_eq!(config.default_tolerance.len(), 8);
    }
}
