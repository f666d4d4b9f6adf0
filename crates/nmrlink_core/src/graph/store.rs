//! Committed correlation graph state.
//!
//! # Responsibility
//! - Own the single committed [`CorrelationGraph`] snapshot.
//! - Apply field patches, bulk replacements and editor outcomes atomically.
//! - Keep a bounded undo history and notify listeners after each commit.
//!
//! # Invariants
//! - The committed snapshot always passes [`CorrelationGraph::validate`].
//! - Listeners fire only after the full next snapshot is in place.
//! - A rejected change leaves snapshot, history and listeners untouched.
//!
//! # See also
//! - `editor::ops` for the edit algebra producing [`EditOutcome`] values.

use crate::config::SessionConfig;
use crate::editor::error::{EditResult, GraphEditError};
use crate::editor::ops::{self, CommitOptions, EditOutcome};
use crate::graph::derive;
use crate::graph::formula::{self, AtomTypeState};
use crate::graph::view::{self, SpectrumSource, Viewport};
use crate::model::correlation::Correlation;
use crate::model::graph::{CorrelationGraph, GraphOptions};
use log::{debug, info};
use std::collections::{BTreeMap, VecDeque};
use std::fmt::{Debug, Formatter};

/// Summary passed to graph listeners after a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphCommit {
    /// Ids of changed or created correlations.
    pub touched: Vec<String>,
    /// Ids of removed correlations.
    pub deleted: Vec<String>,
    /// Only graph metadata changed; spectrum data does not need refreshing.
    pub skip_data_update: bool,
}

/// Listener callback receiving the commit and the new snapshot.
pub type GraphListener = Box<dyn FnMut(&GraphCommit, &CorrelationGraph)>;

/// Handle returned by [`CorrelationGraphStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphListenerId(u64);

/// Value change for one overridable field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit<T> {
    /// Store the value and mark the field as edited.
    Set(T),
    /// Drop the override and fall back to the derived value.
    Reset,
}

/// Shallow merge applied by [`CorrelationGraphStore::set_correlation`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationPatch {
    pub equivalence: Option<FieldEdit<u32>>,
    pub protons_count: Option<FieldEdit<Vec<u32>>>,
    pub hybridization: Option<FieldEdit<Vec<u8>>>,
    pub label: Option<String>,
}

impl CorrelationPatch {
    pub fn is_empty(&self) -> bool {
        self.equivalence.is_none()
            && self.protons_count.is_none()
            && self.hybridization.is_none()
            && self.label.is_none()
    }
}

pub struct CorrelationGraphStore {
    graph: CorrelationGraph,
    history: VecDeque<CorrelationGraph>,
    undo_limit: usize,
    listeners: Vec<(GraphListenerId, GraphListener)>,
    next_listener: u64,
}

impl Debug for CorrelationGraphStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationGraphStore")
            .field("correlations", &self.graph.correlations.len())
            .field("history", &self.history.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl CorrelationGraphStore {
    /// Creates a store with default session settings.
    ///
    /// # Errors
    /// - [`GraphEditError::Validation`] when `graph` breaks a structural invariant.
    pub fn new(graph: CorrelationGraph) -> EditResult<Self> {
        Self::with_config(graph, &SessionConfig::default())
    }

    /// Creates a store, filling tolerances the snapshot leaves unset.
    pub fn with_config(mut graph: CorrelationGraph, config: &SessionConfig) -> EditResult<Self> {
        graph.validate()?;
        for (atom_type, value) in &config.default_tolerance {
            graph
                .options
                .tolerance
                .entry(atom_type.clone())
                .or_insert(*value);
        }
        info!(
            "event=store_load module=store status=ok correlations={}",
            graph.correlations.len()
        );
        Ok(Self {
            graph,
            history: VecDeque::new(),
            undo_limit: config.undo_limit,
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    pub fn graph(&self) -> &CorrelationGraph {
        &self.graph
    }

    pub fn get_all(&self) -> &[Correlation] {
        &self.graph.correlations
    }

    pub fn get(&self, correlation_id: &str) -> Option<&Correlation> {
        self.graph.find(correlation_id)
    }

    pub fn options(&self) -> &GraphOptions {
        &self.graph.options
    }

    /// Sets the shift tolerance for `atom_type`.
    ///
    /// # Errors
    /// - [`GraphEditError::InvalidTolerance`] unless `value` is finite and positive.
    pub fn set_tolerance(&mut self, atom_type: &str, value: f64) -> EditResult<GraphCommit> {
        if !value.is_finite() || value <= 0.0 {
            return Err(GraphEditError::InvalidTolerance {
                atom_type: atom_type.to_string(),
                value,
            });
        }
        let mut next = self.graph.clone();
        next.options
            .tolerance
            .insert(atom_type.to_string(), value);
        self.replace(next, metadata_commit())
    }

    /// Sets or clears the molecular formula.
    ///
    /// # Errors
    /// - [`GraphEditError::Formula`] when `mf` does not parse.
    pub fn set_molecular_formula(&mut self, mf: Option<&str>) -> EditResult<GraphCommit> {
        if let Some(mf) = mf {
            formula::parse_molecular_formula(mf)?;
        }
        let mut next = self.graph.clone();
        next.options.mf = mf.map(|value| value.trim().to_string());
        self.replace(next, metadata_commit())
    }

    /// Per-atom-type completion against the molecular formula.
    ///
    /// # Errors
    /// - [`GraphEditError::Formula`] when an atom type's equivalences overflow.
    pub fn state(&self) -> EditResult<BTreeMap<String, AtomTypeState>> {
        Ok(formula::build_state(&self.graph)?)
    }

    /// Applies `patch` to one correlation.
    ///
    /// Set fields become sticky overrides; reset fields return to their
    /// derived default.
    pub fn set_correlation(
        &mut self,
        correlation_id: &str,
        patch: CorrelationPatch,
    ) -> EditResult<GraphCommit> {
        let mut next = self.graph.clone();
        let correlation = next
            .correlations
            .iter_mut()
            .find(|correlation| correlation.id == correlation_id)
            .ok_or_else(|| GraphEditError::CorrelationNotFound(correlation_id.to_string()))?;

        match patch.equivalence {
            Some(FieldEdit::Set(value)) => {
                correlation.equivalence = value;
                correlation.edited.equivalence = true;
            }
            Some(FieldEdit::Reset) => correlation.edited.equivalence = false,
            None => {}
        }
        match patch.protons_count {
            Some(FieldEdit::Set(value)) => {
                correlation.protons_count = value;
                correlation.edited.protons_count = true;
            }
            Some(FieldEdit::Reset) => {
                correlation.edited.protons_count = false;
                correlation.protons_count = Vec::new();
            }
            None => {}
        }
        match patch.hybridization {
            Some(FieldEdit::Set(value)) => {
                correlation.hybridization = value;
                correlation.edited.hybridization = true;
            }
            Some(FieldEdit::Reset) => {
                correlation.edited.hybridization = false;
                correlation.hybridization = Vec::new();
            }
            None => {}
        }
        if let Some(label) = patch.label {
            correlation.label.origin = label;
        }
        derive::recompute(correlation);

        debug!("event=correlation_patch module=store status=ok correlation_id={correlation_id}");
        self.replace(
            next,
            GraphCommit {
                touched: vec![correlation_id.to_string()],
                deleted: Vec::new(),
                skip_data_update: true,
            },
        )
    }

    /// Replaces correlations by id and appends unknown ones in one commit.
    pub fn set_correlations(
        &mut self,
        correlations: Vec<Correlation>,
        options: CommitOptions,
    ) -> EditResult<GraphCommit> {
        let mut next = self.graph.clone();
        let mut touched = Vec::with_capacity(correlations.len());
        for mut correlation in correlations {
            derive::recompute(&mut correlation);
            touched.push(correlation.id.clone());
            upsert(&mut next, correlation);
        }
        self.replace(
            next,
            GraphCommit {
                touched,
                deleted: Vec::new(),
                skip_data_update: options.skip_data_update,
            },
        )
    }

    /// Applies an editor outcome as one commit.
    ///
    /// # Errors
    /// - [`GraphEditError::Validation`] when the resulting snapshot is broken.
    pub fn commit(&mut self, outcome: &EditOutcome) -> EditResult<GraphCommit> {
        let mut next = self.graph.clone();
        next.correlations
            .retain(|correlation| !outcome.deleted.contains(&correlation.id));
        let mut touched = Vec::with_capacity(outcome.touched.len());
        for correlation in &outcome.touched {
            let mut correlation = correlation.clone();
            derive::recompute(&mut correlation);
            touched.push(correlation.id.clone());
            upsert(&mut next, correlation);
        }
        self.replace(
            next,
            GraphCommit {
                touched,
                deleted: outcome.deleted.clone(),
                skip_data_update: outcome.options.skip_data_update,
            },
        )
    }

    /// Removes a correlation and its link halves from every partner.
    ///
    /// Returns the applied outcome so callers can release related state.
    pub fn delete_correlation(&mut self, correlation_id: &str) -> EditResult<EditOutcome> {
        let outcome = ops::remove_all(&self.graph, correlation_id)?;
        self.commit(&outcome)?;
        Ok(outcome)
    }

    pub fn is_in_view<S: SpectrumSource>(
        &self,
        correlation: &Correlation,
        viewport: &Viewport,
        spectra: &S,
    ) -> bool {
        view::is_in_view(correlation, viewport, spectra)
    }

    pub fn highlight_keys<S: SpectrumSource>(
        &self,
        correlation: &Correlation,
        spectra: &S,
    ) -> Vec<String> {
        view::highlight_keys(correlation, spectra)
    }

    /// Adds a commit listener.
    pub fn subscribe(&mut self, listener: GraphListener) -> GraphListenerId {
        self.next_listener += 1;
        let id = GraphListenerId(self.next_listener);
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: GraphListenerId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Restores the previous committed snapshot.
    ///
    /// Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<GraphCommit> {
        let previous = self.history.pop_back()?;
        let commit = diff_commit(&self.graph, &previous);
        self.graph = previous;
        info!(
            "event=graph_undo module=store status=ok touched={} deleted={} remaining={}",
            commit.touched.len(),
            commit.deleted.len(),
            self.history.len()
        );
        self.notify(&commit);
        Some(commit)
    }

    fn replace(&mut self, next: CorrelationGraph, commit: GraphCommit) -> EditResult<GraphCommit> {
        next.validate()?;
        if self.undo_limit > 0 {
            if self.history.len() == self.undo_limit {
                self.history.pop_front();
            }
            let previous = std::mem::replace(&mut self.graph, next);
            self.history.push_back(previous);
        } else {
            self.graph = next;
        }
        info!(
            "event=graph_commit module=store status=ok touched={} deleted={} skip_data_update={}",
            commit.touched.len(),
            commit.deleted.len(),
            commit.skip_data_update
        );
        self.notify(&commit);
        Ok(commit)
    }

    fn notify(&mut self, commit: &GraphCommit) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(commit, &self.graph);
        }
    }
}

fn metadata_commit() -> GraphCommit {
    GraphCommit {
        touched: Vec::new(),
        deleted: Vec::new(),
        skip_data_update: true,
    }
}

fn upsert(graph: &mut CorrelationGraph, correlation: Correlation) {
    match graph
        .correlations
        .iter_mut()
        .find(|existing| existing.id == correlation.id)
    {
        Some(slot) => *slot = correlation,
        None => graph.correlations.push(correlation),
    }
}

/// Commit describing the step from `current` to `restored`.
fn diff_commit(current: &CorrelationGraph, restored: &CorrelationGraph) -> GraphCommit {
    let touched = restored
        .correlations
        .iter()
        .filter(|correlation| current.find(&correlation.id) != Some(*correlation))
        .map(|correlation| correlation.id.clone())
        .collect();
    let deleted = current
        .correlations
        .iter()
        .filter(|correlation| restored.find(&correlation.id).is_none())
        .map(|correlation| correlation.id.clone())
        .collect();
    GraphCommit {
        touched,
        deleted,
        skip_data_update: false,
    }
}

#[cfg(test)]
mod tests {
    use super::{CorrelationGraphStore, CorrelationPatch};
    use crate::config::SessionConfig;
    use crate::model::correlation::Correlation;
    use crate::model::graph::CorrelationGraph;

    fn store_with_limit(limit: usize) -> CorrelationGraphStore {
        let graph = CorrelationGraph::new(vec![Correlation::with_id("c1", "C", "C1", None)]);
        let config = SessionConfig {
            undo_limit: limit,
            ..SessionConfig::default()
        };
        CorrelationGraphStore::with_config(graph, &config).expect("valid graph")
    }

    #[test]
    fn history_is_bounded_by_undo_limit() {
        let mut store = store_with_limit(2);
        for value in [0.1, 0.2, 0.3] {
            store.set_tolerance("C", value).expect("valid tolerance");
        }
        assert!(store.undo().is_some());
        assert!(store.undo().is_some());
        assert!(store.undo().is_none());
        assert_eq!(store.options().tolerance.get("C"), Some(&0.1));
    }

    #[test]
    fn zero_limit_disables_undo() {
        let mut store = store_with_limit(0);
        store.set_tolerance("C", 0.5).expect("valid tolerance");
        assert!(!store.can_undo());
    }

    #[test]
    fn empty_patch_is_a_noop_change() {
        let mut store = store_with_limit(5);
        assert!(CorrelationPatch::default().is_empty());
        let commit = store
            .set_correlation("c1", CorrelationPatch::default())
            .expect("patch applies");
        assert_eq!(commit.touched, vec!["c1".to_string()]);
        assert_eq!(store.get("c1").map(|c| c.equivalence), Some(1));
    }
}
