//! Derived correlation attributes.
//!
//! # Invariants
//! - A field whose `edited` flag is set is never written here.
//! - Derived equivalence is at least 1.

use crate::model::correlation::Correlation;
use std::collections::HashSet;

/// Default equivalence: distinct non-pseudo links held, at least 1.
pub fn derived_equivalence(correlation: &Correlation) -> u32 {
    let distinct: HashSet<&str> = correlation
        .links
        .iter()
        .filter(|link| !link.pseudo)
        .map(|link| link.id.as_str())
        .collect();
    (distinct.len() as u32).max(1)
}

/// Default attached-proton count of a pseudo heavy atom.
///
/// Returns `None` for correlations whose proton count is not derived.
pub fn derived_protons_count(correlation: &Correlation) -> Option<Vec<u32>> {
    if !correlation.pseudo {
        return None;
    }
    Some(vec![correlation.pseudo_hsqc_count()])
}

/// Recomputes every non-overridden derived field in place.
///
/// Hybridization has no derivation source in this core; it only changes
/// through explicit patches.
pub fn recompute(correlation: &mut Correlation) {
    if !correlation.edited.equivalence {
        correlation.equivalence = derived_equivalence(correlation);
    }
    if !correlation.edited.protons_count {
        if let Some(protons_count) = derived_protons_count(correlation) {
            correlation.protons_count = protons_count;
        }
    }
}
