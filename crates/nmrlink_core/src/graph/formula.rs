//! Molecular formula parsing and per-atom-type completion state.

use crate::model::graph::CorrelationGraph;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

static FORMULA_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z][a-z]?)(\d*)").expect("valid formula token regex"));

/// Parses a formula such as `C10H12O` into atom counts.
///
/// # Errors
/// - Returns an error when the formula is blank or contains characters that
///   are not element symbols or counts.
/// - Returns [`FormulaError::CountOverflow`] when an element's total does not
///   fit in `u32`.
pub fn parse_molecular_formula(mf: &str) -> Result<BTreeMap<String, u32>, FormulaError> {
    let compact: String = mf.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(FormulaError::Empty);
    }

    let mut counts = BTreeMap::new();
    let mut consumed = 0;
    for capture in FORMULA_TOKEN_RE.captures_iter(&compact) {
        let whole = capture.get(0).map(|m| (m.start(), m.end()));
        let Some((start, end)) = whole else {
            continue;
        };
        if start != consumed {
            return Err(FormulaError::InvalidToken(compact[consumed..start].to_string()));
        }
        consumed = end;
        let symbol = capture[1].to_string();
        let count = match &capture[2] {
            "" => 1,
            digits => digits
                .parse::<u32>()
                .map_err(|_| FormulaError::InvalidToken(digits.to_string()))?,
        };
        let total = counts.entry(symbol).or_insert(0u32);
        *total = total
            .checked_add(count)
            .ok_or_else(|| FormulaError::CountOverflow(capture[1].to_string()))?;
    }
    if consumed != compact.len() {
        return Err(FormulaError::InvalidToken(compact[consumed..].to_string()));
    }
    Ok(counts)
}

/// Completion of one atom type against the molecular formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomTypeState {
    /// Sum of equivalences of non-pseudo and pseudo correlations of the type.
    pub current: u32,
    /// Count from the molecular formula, `None` without a formula.
    pub total: Option<u32>,
    pub complete: bool,
    /// More atoms assigned than the formula allows.
    pub error: bool,
}

/// Per-atom-type state for `graph`.
///
/// Atom types present only in the formula appear with `current == 0`.
///
/// # Errors
/// - [`FormulaError::CountOverflow`] when the equivalences of one atom type
///   sum past `u32::MAX`.
pub fn build_state(
    graph: &CorrelationGraph,
) -> Result<BTreeMap<String, AtomTypeState>, FormulaError> {
    let totals = graph
        .options
        .mf
        .as_deref()
        .and_then(|mf| parse_molecular_formula(mf).ok());

    let mut current: BTreeMap<String, u32> = BTreeMap::new();
    for correlation in &graph.correlations {
        let sum = current.entry(correlation.atom_type.clone()).or_insert(0);
        *sum = sum
            .checked_add(correlation.equivalence)
            .ok_or_else(|| FormulaError::CountOverflow(correlation.atom_type.clone()))?;
    }
    if let Some(totals) = &totals {
        for atom_type in totals.keys() {
            current.entry(atom_type.clone()).or_insert(0);
        }
    }

    Ok(current
        .into_iter()
        .map(|(atom_type, current)| {
            let total = totals
                .as_ref()
                .map(|totals| totals.get(&atom_type).copied().unwrap_or(0));
            let state = AtomTypeState {
                current,
                total,
                complete: total == Some(current),
                error: total.is_some_and(|total| current > total),
            };
            (atom_type, state)
        })
        .collect())
}

/// Molecular formula parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    Empty,
    InvalidToken(String),
    /// Atom count of the named element does not fit in `u32`.
    CountOverflow(String),
}

impl Display for FormulaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "molecular formula must not be empty"),
            Self::InvalidToken(value) => {
                write!(f, "molecular formula contains invalid token: {value}")
            }
            Self::CountOverflow(atom_type) => write!(f, "atom count overflow for {atom_type}"),
        }
    }
}

impl Error for FormulaError {}

#[cfg(test)]
mod tests {
    use super::{build_state, parse_molecular_formula, FormulaError};
    use crate::model::correlation::Correlation;
    use crate::model::graph::CorrelationGraph;

    #[test]
    fn parses_counts_and_two_letter_symbols() {
        let counts = parse_molecular_formula("C10H12OCl2").expect("valid formula");
        assert_eq!(counts.get("C"), Some(&10));
        assert_eq!(counts.get("H"), Some(&12));
        assert_eq!(counts.get("O"), Some(&1));
        assert_eq!(counts.get("Cl"), Some(&2));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_molecular_formula("  "), Err(FormulaError::Empty));
        assert!(matches!(
            parse_molecular_formula("C6h6"),
            Err(FormulaError::InvalidToken(_))
        ));
    }

    #[test]
    fn state_flags_complete_and_overfull_types() {
        let mut graph = CorrelationGraph::new(vec![
            Correlation::with_id("c1", "C", "C1", None),
            Correlation::with_id("c2", "C", "C2", None),
            Correlation::with_id("o1", "O", "O1", None),
            Correlation::with_id("o2", "O", "O2", None),
        ]);
        graph.options.mf = Some("C2H6O".to_string());

        let state = build_state(&graph).expect("state");
        assert!(state["C"].complete);
        assert!(state["O"].error);
        assert_eq!(state["H"].current, 0);
        assert_eq!(state["H"].total, Some(6));
        assert!(!state["H"].complete);
    }

    #[test]
    fn repeated_element_counts_past_u32_are_rejected() {
        assert_eq!(
            parse_molecular_formula("C4294967295C"),
            Err(FormulaError::CountOverflow("C".to_string()))
        );
        assert_eq!(
            parse_molecular_formula("C4294967294C").expect("fits").get("C"),
            Some(&u32::MAX)
        );
    }

    #[test]
    fn state_reports_equivalence_overflow() {
        let mut c1 = Correlation::with_id("c1", "C", "C1", None);
        c1.equivalence = u32::MAX;
        let c2 = Correlation::with_id("c2", "C", "C2", None);
        let graph = CorrelationGraph::new(vec![c1, c2]);

        assert_eq!(
            build_state(&graph),
            Err(FormulaError::CountOverflow("C".to_string()))
        );
    }
}
