//! Bidirectional entity/atom assignment table.
//!
//! # Responsibility
//! - Map range/zone/signal ids to atom ids per axis and back.
//! - Track the single entity currently selecting atoms.
//! - Show/hide hover keys for assignments on the shared bus.
//!
//! # Invariants
//! - Atom ids on one entity axis are unique and keep insertion order.
//! - The reverse index mirrors `entries` exactly.
//! - At most one entity axis is active at a time.
//! - The correlation graph stays the source of truth; the owning session
//!   reconciles this table after graph commits.

use crate::highlight::bus::{HighlightBus, SubscriberId};
use crate::identity;
use crate::model::signal::Axis;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Atom ids assigned to one entity, per axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub x: Vec<String>,
    pub y: Vec<String>,
}

impl Assignment {
    pub fn axis(&self, axis: Axis) -> &[String] {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut Vec<String> {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }

    /// An entity without atoms is unassigned, not an error.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty()
    }
}

#[derive(Debug)]
struct HoverState {
    axis: Axis,
    keys: Vec<String>,
}

/// Assignment table plus hover/selection state.
#[derive(Debug)]
pub struct AssignmentRegistry {
    subscriber: SubscriberId,
    entries: BTreeMap<String, Assignment>,
    by_atom: BTreeMap<String, BTreeSet<(String, Axis)>>,
    active: Option<(String, Axis)>,
    hovered: BTreeMap<String, HoverState>,
}

impl AssignmentRegistry {
    /// Creates an empty registry holding its own subscriber on `bus`.
    pub fn new(bus: &mut HighlightBus) -> Self {
        Self {
            subscriber: bus.register(),
            entries: BTreeMap::new(),
            by_atom: BTreeMap::new(),
            active: None,
            hovered: BTreeMap::new(),
        }
    }

    /// Returns the assignment of `entity_id`, empty when absent.
    pub fn get(&self, entity_id: &str) -> Assignment {
        self.entries.get(entity_id).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Marks `entity_id` as the target of the next atom selection.
    ///
    /// Any previously active entity is deactivated.
    pub fn set_active(&mut self, entity_id: &str, axis: Axis) {
        self.active = Some((entity_id.to_string(), axis));
    }

    pub fn deactivate(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<(&str, Axis)> {
        self.active
            .as_ref()
            .map(|(entity_id, axis)| (entity_id.as_str(), *axis))
    }

    pub fn is_active(&self, entity_id: &str, axis: Axis) -> bool {
        self.active() == Some((entity_id, axis))
    }

    /// Appends `atom_id` to the entity axis if not already present.
    pub fn assign(&mut self, bus: &mut HighlightBus, entity_id: &str, axis: Axis, atom_id: &str) {
        let atoms = self
            .entries
            .entry(entity_id.to_string())
            .or_default()
            .axis_mut(axis);
        if atoms.iter().any(|existing| existing == atom_id) {
            return;
        }
        atoms.push(atom_id.to_string());
        self.by_atom
            .entry(atom_id.to_string())
            .or_default()
            .insert((entity_id.to_string(), axis));
        debug!(
            "event=assignment_add module=assignment status=ok entity_id={entity_id} axis={}",
            axis.as_str()
        );

        if let Some(hover) = self.hovered.get_mut(entity_id) {
            if hover.axis == axis {
                bus.show(self.subscriber, &[atom_id]);
                hover.keys.push(atom_id.to_string());
            }
        }
    }

    /// Removes one atom from the entity axis.
    pub fn unassign(&mut self, bus: &mut HighlightBus, entity_id: &str, axis: Axis, atom_id: &str) {
        let Some(assignment) = self.entries.get_mut(entity_id) else {
            return;
        };
        let atoms = assignment.axis_mut(axis);
        let before = atoms.len();
        atoms.retain(|existing| existing != atom_id);
        if atoms.len() == before {
            return;
        }
        if assignment.is_empty() {
            self.entries.remove(entity_id);
        }
        self.unindex(entity_id, axis, atom_id);

        if let Some(hover) = self.hovered.get_mut(entity_id) {
            if hover.axis == axis {
                if let Some(position) = hover.keys.iter().position(|key| key == atom_id) {
                    hover.keys.remove(position);
                    bus.hide(self.subscriber, &[atom_id]);
                }
            }
        }
    }

    /// Clears the entity axis and hides what its hover showed.
    pub fn remove_all(&mut self, bus: &mut HighlightBus, entity_id: &str, axis: Axis) {
        let removed = match self.entries.get_mut(entity_id) {
            Some(assignment) => std::mem::take(assignment.axis_mut(axis)),
            None => Vec::new(),
        };
        if self
            .entries
            .get(entity_id)
            .is_some_and(Assignment::is_empty)
        {
            self.entries.remove(entity_id);
        }
        for atom_id in &removed {
            self.unindex(entity_id, axis, atom_id);
        }

        let hovered_axis = self.hovered.get(entity_id).map(|hover| hover.axis);
        if hovered_axis == Some(axis) {
            self.clear_highlight(bus, entity_id);
        }
        debug!(
            "event=assignment_clear module=assignment status=ok entity_id={entity_id} axis={} removed={}",
            axis.as_str(),
            removed.len()
        );
    }

    /// Hover: highlights the entity axis key and its assigned atoms.
    pub fn highlight(&mut self, bus: &mut HighlightBus, entity_id: &str, axis: Axis) {
        self.clear_highlight(bus, entity_id);
        let mut keys = vec![identity::axis_key(entity_id, axis)];
        if let Some(assignment) = self.entries.get(entity_id) {
            keys.extend(assignment.axis(axis).iter().cloned());
        }
        bus.show(self.subscriber, &keys);
        self.hovered
            .insert(entity_id.to_string(), HoverState { axis, keys });
    }

    /// Hover end: hides everything shown for `entity_id`.
    pub fn clear_highlight(&mut self, bus: &mut HighlightBus, entity_id: &str) {
        if let Some(hover) = self.hovered.remove(entity_id) {
            bus.hide(self.subscriber, &hover.keys);
        }
    }

    /// Drops every trace of `entity_id`.
    pub fn forget(&mut self, bus: &mut HighlightBus, entity_id: &str) {
        self.clear_highlight(bus, entity_id);
        self.remove_all(bus, entity_id, Axis::X);
        self.remove_all(bus, entity_id, Axis::Y);
        if self
            .active
            .as_ref()
            .is_some_and(|(active_id, _)| active_id == entity_id)
        {
            self.active = None;
        }
    }

    /// Reverse lookup: every entity axis an atom is assigned to.
    pub fn entities_for_atom(&self, atom_id: &str) -> Vec<(String, Axis)> {
        self.by_atom
            .get(atom_id)
            .map(|entities| entities.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn unindex(&mut self, entity_id: &str, axis: Axis, atom_id: &str) {
        if let Some(entities) = self.by_atom.get_mut(atom_id) {
            entities.remove(&(entity_id.to_string(), axis));
            if entities.is_empty() {
                self.by_atom.remove(atom_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AssignmentRegistry;
    use crate::highlight::HighlightBus;
    use crate::model::signal::Axis;

    #[test]
    fn get_returns_empty_assignment_for_unknown_entity() {
        let mut bus = HighlightBus::new();
        let registry = AssignmentRegistry::new(&mut bus);
        let assignment = registry.get("range-missing");
        assert!(assignment.is_empty());
        assert!(assignment.x.is_empty() && assignment.y.is_empty());
    }

    #[test]
    fn assign_deduplicates_and_keeps_order() {
        let mut bus = HighlightBus::new();
        let mut registry = AssignmentRegistry::new(&mut bus);
        registry.assign(&mut bus, "zone1", Axis::X, "atom-b");
        registry.assign(&mut bus, "zone1", Axis::X, "atom-a");
        registry.assign(&mut bus, "zone1", Axis::X, "atom-b");
        registry.assign(&mut bus, "zone1", Axis::Y, "atom-c");

        let assignment = registry.get("zone1");
        assert_eq!(assignment.x, vec!["atom-b", "atom-a"]);
        assert_eq!(assignment.y, vec!["atom-c"]);
        assert_eq!(
            registry.entities_for_atom("atom-b"),
            vec![("zone1".to_string(), Axis::X)]
        );
    }

    #[test]
    fn only_one_entity_is_active() {
        let mut bus = HighlightBus::new();
        let mut registry = AssignmentRegistry::new(&mut bus);
        registry.set_active("range1", Axis::X);
        registry.set_active("zone2", Axis::Y);
        assert!(!registry.is_active("range1", Axis::X));
        assert_eq!(registry.active(), Some(("zone2", Axis::Y)));
        registry.deactivate();
        assert_eq!(registry.active(), None);
    }

    #[test]
    fn hover_shows_axis_key_and_atoms() {
        let mut bus = HighlightBus::new();
        let mut registry = AssignmentRegistry::new(&mut bus);
        registry.assign(&mut bus, "range1", Axis::X, "atom-1");
        registry.highlight(&mut bus, "range1", Axis::X);
        assert!(bus.is_active(&["range1___x"]));
        assert!(bus.is_active(&["atom-1"]));

        registry.assign(&mut bus, "range1", Axis::X, "atom-2");
        assert!(bus.is_active(&["atom-2"]));

        registry.clear_highlight(&mut bus, "range1");
        assert!(bus.active_keys().is_empty());
    }

    #[test]
    fn remove_all_hides_keys_shown_for_that_axis() {
        let mut bus = HighlightBus::new();
        let mut registry = AssignmentRegistry::new(&mut bus);
        registry.assign(&mut bus, "range1", Axis::X, "atom-1");
        registry.highlight(&mut bus, "range1", Axis::X);

        registry.remove_all(&mut bus, "range1", Axis::X);
        assert!(registry.get("range1").is_empty());
        assert!(registry.entities_for_atom("atom-1").is_empty());
        assert!(!bus.is_active(&["range1___x", "atom-1"]));
    }

    #[test]
    fn forget_drops_entity_and_active_state() {
        let mut bus = HighlightBus::new();
        let mut registry = AssignmentRegistry::new(&mut bus);
        registry.assign(&mut bus, "sig1", Axis::X, "atom-1");
        registry.assign(&mut bus, "sig1", Axis::Y, "atom-2");
        registry.set_active("sig1", Axis::Y);
        registry.highlight(&mut bus, "sig1", Axis::Y);

        registry.forget(&mut bus, "sig1");
        assert!(registry.is_empty());
        assert_eq!(registry.active(), None);
        assert!(bus.active_keys().is_empty());
    }
}
