//! Annotation session use-case service.
//!
//! # Responsibility
//! - Compose the graph store, highlight bus, assignment registry and edit
//!   lifecycle behind one entry point.
//! - Reconcile highlight and assignment state after every graph commit.
//!
//! # Invariants
//! - The graph is the source of truth; secondary state never refers to
//!   entities the committed graph removed.
//! - Keys released by an edit are cleared from the bus before the call returns.

use crate::assignment::registry::{Assignment, AssignmentRegistry};
use crate::config::SessionConfig;
use crate::editor::error::EditResult;
use crate::editor::ops::{self, EditAction, EditOutcome};
use crate::editor::session::{EditSession, EditState};
use crate::graph::store::{CorrelationGraphStore, GraphCommit};
use crate::highlight::bus::HighlightBus;
use crate::highlight::scope::{HighlightScope, SharedHighlightBus};
use crate::model::graph::CorrelationGraph;
use crate::model::signal::Axis;
use log::{info, warn};
use std::cell::{RefCell, RefMut};
use std::rc::Rc;

/// Root composition for one annotation view.
#[derive(Debug)]
pub struct AnnotationSession {
    store: CorrelationGraphStore,
    bus: SharedHighlightBus,
    assignments: AssignmentRegistry,
    edits: EditSession,
}

impl AnnotationSession {
    pub fn new(graph: CorrelationGraph) -> EditResult<Self> {
        Self::with_config(graph, &SessionConfig::default())
    }

    /// Creates a session over a validated snapshot.
    pub fn with_config(graph: CorrelationGraph, config: &SessionConfig) -> EditResult<Self> {
        let store = CorrelationGraphStore::with_config(graph, config)?;
        let bus: SharedHighlightBus = Rc::new(RefCell::new(HighlightBus::new()));
        let assignments = AssignmentRegistry::new(&mut bus.borrow_mut());
        Ok(Self {
            store,
            bus,
            assignments,
            edits: EditSession::new(),
        })
    }

    pub fn store(&self) -> &CorrelationGraphStore {
        &self.store
    }

    /// Direct store access for field patches and metadata changes.
    pub fn store_mut(&mut self) -> &mut CorrelationGraphStore {
        &mut self.store
    }

    pub fn bus(&self) -> &SharedHighlightBus {
        &self.bus
    }

    pub fn assignments(&self) -> &AssignmentRegistry {
        &self.assignments
    }

    pub fn edit_state(&self) -> &EditState {
        self.edits.state()
    }

    pub fn begin_edit(&mut self, action: EditAction) -> EditResult<()> {
        self.edits.begin(action)
    }

    pub fn cancel_edit(&mut self) -> EditResult<EditAction> {
        self.edits.cancel()
    }

    /// Applies the pending edit to the committed graph.
    ///
    /// # Errors
    /// - Any [`crate::GraphEditError`] from the edit algebra or validation;
    ///   the graph is unchanged and the edit is aborted.
    pub fn commit_edit(&mut self) -> EditResult<GraphCommit> {
        let store = &mut self.store;
        let (outcome, commit) = self.edits.commit(|action| {
            let outcome = ops::apply(store.graph(), action)?;
            let commit = store.commit(&outcome)?;
            Ok((outcome, commit))
        })?;
        self.reconcile(&outcome);
        Ok(commit)
    }

    /// Begins and commits `action` in one step.
    pub fn apply(&mut self, action: EditAction) -> EditResult<GraphCommit> {
        self.begin_edit(action)?;
        self.commit_edit()
    }

    pub fn delete_correlation(&mut self, correlation_id: &str) -> EditResult<GraphCommit> {
        self.apply(EditAction::RemoveAll {
            correlation_id: correlation_id.to_string(),
        })
    }

    /// Restores the previous snapshot; `None` when history is empty.
    pub fn undo(&mut self) -> Option<GraphCommit> {
        self.store.undo()
    }

    /// Creates a highlight scope for one UI fragment.
    pub fn highlight_scope(&self, keys: Vec<String>) -> HighlightScope {
        HighlightScope::new(&self.bus, keys)
    }

    pub fn assignment(&self, entity_id: &str) -> Assignment {
        self.assignments.get(entity_id)
    }

    pub fn set_active_assignment(&mut self, entity_id: &str, axis: Axis) {
        self.assignments.set_active(entity_id, axis);
    }

    pub fn deactivate_assignment(&mut self) {
        self.assignments.deactivate();
    }

    pub fn assign(&mut self, entity_id: &str, axis: Axis, atom_id: &str) {
        let Some(mut bus) = borrow_bus(&self.bus, "assign") else {
            return;
        };
        self.assignments.assign(&mut bus, entity_id, axis, atom_id);
    }

    pub fn unassign(&mut self, entity_id: &str, axis: Axis, atom_id: &str) {
        let Some(mut bus) = borrow_bus(&self.bus, "unassign") else {
            return;
        };
        self.assignments.unassign(&mut bus, entity_id, axis, atom_id);
    }

    pub fn remove_all_assignments(&mut self, entity_id: &str, axis: Axis) {
        let Some(mut bus) = borrow_bus(&self.bus, "remove_all_assignments") else {
            return;
        };
        self.assignments.remove_all(&mut bus, entity_id, axis);
    }

    pub fn highlight_assignment(&mut self, entity_id: &str, axis: Axis) {
        let Some(mut bus) = borrow_bus(&self.bus, "highlight_assignment") else {
            return;
        };
        self.assignments.highlight(&mut bus, entity_id, axis);
    }

    pub fn clear_assignment_highlight(&mut self, entity_id: &str) {
        let Some(mut bus) = borrow_bus(&self.bus, "clear_assignment_highlight") else {
            return;
        };
        self.assignments.clear_highlight(&mut bus, entity_id);
    }

    fn reconcile(&mut self, outcome: &EditOutcome) {
        let Some(mut bus) = borrow_bus(&self.bus, "session_reconcile") else {
            return;
        };
        bus.clear(&outcome.released_keys);

        let mut forgotten = 0usize;
        for signal_id in &outcome.removed_signal_ids {
            self.assignments.clear_highlight(&mut bus, signal_id);
            if !self.store.graph().references_signal(signal_id) {
                self.assignments.forget(&mut bus, signal_id);
                forgotten += 1;
            }
        }
        info!(
            "event=session_reconcile module=service status=ok released={} forgotten={forgotten}",
            outcome.released_keys.len()
        );
    }
}

fn borrow_bus<'a>(
    bus: &'a SharedHighlightBus,
    operation: &str,
) -> Option<RefMut<'a, HighlightBus>> {
    match bus.try_borrow_mut() {
        Ok(bus) => Some(bus),
        Err(_) => {
            warn!("event={operation} module=service status=error reason=bus_busy");
            None
        }
    }
}
