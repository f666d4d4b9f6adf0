//! Pure link edit algebra.
//!
//! # Responsibility
//! - Compute the correlations an edit touches, without mutating the input.
//! - Keep both halves of a 2D link in step inside one outcome.
//!
//! # Invariants
//! - Every function reads a snapshot and returns a complete delta; nothing
//!   is applied until the store commits the outcome.
//! - Derived fields of touched correlations are recomputed unless edited.
//! - Removing a link removes it from every holder.

use crate::editor::error::{EditResult, GraphEditError};
use crate::graph::derive;
use crate::identity;
use crate::model::correlation::Correlation;
use crate::model::graph::CorrelationGraph;
use crate::model::link::{ExperimentType, Link, LinkEdited};
use crate::model::signal::{Axis, PathLength, Signal};
use log::info;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Experiment id stamped on pseudo links.
pub const PSEUDO_EXPERIMENT_ID: &str = "pseudo";

/// Destination of one link half in a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetCorrelation {
    /// Create a fresh correlation for the half.
    New,
    Existing(String),
}

impl TargetCorrelation {
    /// UI sentinel that selects [`TargetCorrelation::New`].
    pub const NEW_SENTINEL: &'static str = "new";

    pub fn parse(value: &str) -> Self {
        if value == Self::NEW_SENTINEL {
            Self::New
        } else {
            Self::Existing(value.to_string())
        }
    }
}

/// Pseudo HSQC direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoLinkOp {
    Add,
    Remove,
}

/// One user edit request.
#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    Move {
        link_id: String,
        correlation_dim1: String,
        correlation_dim2: Option<String>,
        target_dim1: TargetCorrelation,
        target_dim2: Option<TargetCorrelation>,
    },
    Remove {
        link_id: String,
        correlation_dim1: String,
        correlation_dim2: Option<String>,
    },
    Unmove {
        link_id: String,
        correlation_dim1: String,
        correlation_dim2: Option<String>,
    },
    SetPathLength {
        link_id: String,
        correlation_dim1: String,
        correlation_dim2: Option<String>,
        min: u32,
        max: u32,
    },
    PseudoHsqc {
        row_id: String,
        column_id: String,
        op: PseudoLinkOp,
    },
    RemoveAll {
        correlation_id: String,
    },
}

impl EditAction {
    /// Stable action name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Remove { .. } => "remove",
            Self::Unmove { .. } => "unmove",
            Self::SetPathLength { .. } => "set_path_length",
            Self::PseudoHsqc {
                op: PseudoLinkOp::Add,
                ..
            } => "add_pseudo_hsqc",
            Self::PseudoHsqc {
                op: PseudoLinkOp::Remove,
                ..
            } => "remove_pseudo_hsqc",
            Self::RemoveAll { .. } => "remove_all",
        }
    }
}

/// Options forwarded to store listeners with a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// Only graph metadata changed; spectrum signals are untouched.
    pub skip_data_update: bool,
}

/// Delta produced by one edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditOutcome {
    /// New versions of changed or created correlations.
    pub touched: Vec<Correlation>,
    /// Ids of correlations to drop.
    pub deleted: Vec<String>,
    /// Highlight keys that refer to removed entities.
    pub released_keys: Vec<String>,
    /// Signal ids whose link left the graph.
    pub removed_signal_ids: Vec<String>,
    pub options: CommitOptions,
}

/// Dispatches `action` to the matching edit function.
pub fn apply(graph: &CorrelationGraph, action: &EditAction) -> EditResult<EditOutcome> {
    match action {
        EditAction::Move {
            link_id,
            correlation_dim1,
            correlation_dim2,
            target_dim1,
            target_dim2,
        } => move_link(
            graph,
            link_id,
            correlation_dim1,
            correlation_dim2.as_deref(),
            target_dim1,
            target_dim2.as_ref(),
        ),
        EditAction::Remove {
            link_id,
            correlation_dim1,
            correlation_dim2,
        } => remove_link(graph, link_id, correlation_dim1, correlation_dim2.as_deref()),
        EditAction::Unmove {
            link_id,
            correlation_dim1,
            correlation_dim2,
        } => unmove_link(graph, link_id, correlation_dim1, correlation_dim2.as_deref()),
        EditAction::SetPathLength {
            link_id,
            correlation_dim1,
            correlation_dim2,
            min,
            max,
        } => set_path_length(
            graph,
            link_id,
            correlation_dim1,
            correlation_dim2.as_deref(),
            *min,
            *max,
        ),
        EditAction::PseudoHsqc {
            row_id,
            column_id,
            op: PseudoLinkOp::Add,
        } => add_pseudo_hsqc(graph, row_id, column_id),
        EditAction::PseudoHsqc {
            row_id,
            column_id,
            op: PseudoLinkOp::Remove,
        } => remove_pseudo_hsqc(graph, row_id, column_id),
        EditAction::RemoveAll { correlation_id } => remove_all(graph, correlation_id),
    }
}

/// Removes a link from both of its holders.
pub fn remove_link(
    graph: &CorrelationGraph,
    link_id: &str,
    correlation_dim1: &str,
    correlation_dim2: Option<&str>,
) -> EditResult<EditOutcome> {
    let holders = resolve_holders(graph, link_id, correlation_dim1, correlation_dim2)?;
    let removed = holder_half(graph, holders[0], link_id)?.clone();

    let touched = holders
        .iter()
        .map(|&index| {
            let mut correlation = graph.correlations[index].clone();
            correlation.links.retain(|link| link.id != link_id);
            derive::recompute(&mut correlation);
            correlation
        })
        .collect();

    info!(
        "event=link_remove module=editor status=ok link_id={link_id} holders={}",
        holders.len()
    );
    Ok(EditOutcome {
        touched,
        released_keys: link_keys(&removed),
        removed_signal_ids: vec![removed.signal.id.clone()],
        options: CommitOptions {
            skip_data_update: true,
        },
        ..EditOutcome::default()
    })
}

/// Moves each half of a link to its target correlation.
///
/// A missing `target_dim2` keeps the second half in place. Targets equal to
/// the current holder keep that half in place; if no half moves the edit is
/// rejected.
pub fn move_link(
    graph: &CorrelationGraph,
    link_id: &str,
    correlation_dim1: &str,
    correlation_dim2: Option<&str>,
    target_dim1: &TargetCorrelation,
    target_dim2: Option<&TargetCorrelation>,
) -> EditResult<EditOutcome> {
    let holders = resolve_holders(graph, link_id, correlation_dim1, correlation_dim2)?;
    let targets = [Some(target_dim1), target_dim2];

    let mut next = graph.clone();
    let mut touched_ids: Vec<String> = Vec::new();
    let mut moved_any = false;

    for (&source_index, target) in holders.iter().zip(targets) {
        let source = &graph.correlations[source_index];
        touch(&mut touched_ids, &source.id);
        let Some(target) = target else {
            continue;
        };
        let half = holder_half(graph, source_index, link_id)?.clone();

        let target_id = match target {
            TargetCorrelation::Existing(target_id) if *target_id == source.id => continue,
            TargetCorrelation::Existing(target_id) => {
                let target = next
                    .find(target_id)
                    .ok_or_else(|| GraphEditError::CorrelationNotFound(target_id.clone()))?;
                if target.atom_type != source.atom_type {
                    return Err(GraphEditError::AtomTypeMismatch {
                        correlation_id: target_id.clone(),
                        expected: source.atom_type.clone(),
                        found: target.atom_type.clone(),
                    });
                }
                if target.has_link(link_id) {
                    return Err(GraphEditError::LinkAlreadyPresent {
                        link_id: link_id.to_string(),
                        correlation_id: target_id.clone(),
                    });
                }
                target_id.clone()
            }
            TargetCorrelation::New => {
                let label = next.next_label(&source.atom_type);
                let created = Correlation::new(&source.atom_type, label, half.signal.clone());
                let created_id = created.id.clone();
                next.correlations.push(created);
                created_id
            }
        };

        if let Some(source_next) = next.correlations.iter_mut().find(|c| c.id == source.id) {
            source_next.links.retain(|link| link.id != link_id);
        }
        if let Some(target_next) = next.correlations.iter_mut().find(|c| c.id == target_id) {
            target_next.links.push(half);
        }
        touch(&mut touched_ids, &target_id);
        moved_any = true;
    }

    if !moved_any {
        return Err(GraphEditError::MoveToSelf(link_id.to_string()));
    }

    set_moved_flag(&mut next, link_id, true);
    info!(
        "event=link_move module=editor status=ok link_id={link_id} touched={}",
        touched_ids.len()
    );
    Ok(EditOutcome {
        touched: collect_touched(next, &touched_ids),
        options: CommitOptions {
            skip_data_update: true,
        },
        ..EditOutcome::default()
    })
}

/// Clears the moved flag; holders stay as they are.
pub fn unmove_link(
    graph: &CorrelationGraph,
    link_id: &str,
    correlation_dim1: &str,
    correlation_dim2: Option<&str>,
) -> EditResult<EditOutcome> {
    let holders = resolve_holders(graph, link_id, correlation_dim1, correlation_dim2)?;
    let touched = holders
        .iter()
        .map(|&index| {
            let mut correlation = graph.correlations[index].clone();
            for link in correlation.links.iter_mut().filter(|l| l.id == link_id) {
                link.edited.moved = false;
            }
            correlation
        })
        .collect();
    Ok(EditOutcome {
        touched,
        options: CommitOptions {
            skip_data_update: true,
        },
        ..EditOutcome::default()
    })
}

/// Sets a manual path length on both halves of a link.
///
/// `min` and `max` are stored as given; an inverted pair is not rejected.
pub fn set_path_length(
    graph: &CorrelationGraph,
    link_id: &str,
    correlation_dim1: &str,
    correlation_dim2: Option<&str>,
    min: u32,
    max: u32,
) -> EditResult<EditOutcome> {
    let holders = resolve_holders(graph, link_id, correlation_dim1, correlation_dim2)?;
    let touched = holders
        .iter()
        .map(|&index| {
            let mut correlation = graph.correlations[index].clone();
            for link in correlation.links.iter_mut().filter(|l| l.id == link_id) {
                link.signal.path_length = Some(PathLength::manual(min, max));
            }
            correlation
        })
        .collect();
    Ok(EditOutcome {
        touched,
        options: CommitOptions {
            skip_data_update: false,
        },
        ..EditOutcome::default()
    })
}

/// Adds a pseudo HSQC link between a heavy-atom row and a proton column.
pub fn add_pseudo_hsqc(
    graph: &CorrelationGraph,
    row_id: &str,
    column_id: &str,
) -> EditResult<EditOutcome> {
    let (row, column) = pseudo_endpoints(graph, row_id, column_id)?;
    if shared_pseudo_hsqc(row, column).is_some() {
        return Err(GraphEditError::DuplicatePseudoLink {
            row_id: row_id.to_string(),
            column_id: column_id.to_string(),
        });
    }

    let link_id = Uuid::new_v4().to_string();
    let signal = Signal::pseudo(Uuid::new_v4().to_string());
    let column_half = Link {
        id: link_id.clone(),
        experiment_id: PSEUDO_EXPERIMENT_ID.to_string(),
        experiment_type: ExperimentType::Hsqc,
        atom_type: vec![column.atom_type.clone(), row.atom_type.clone()],
        axis: Some(Axis::X),
        pseudo: true,
        signal,
        edited: LinkEdited::default(),
    };
    let row_half = column_half.with_axis(Axis::Y);

    let mut row_next = row.clone();
    row_next.links.push(row_half);
    derive::recompute(&mut row_next);
    let mut column_next = column.clone();
    column_next.links.push(column_half);
    derive::recompute(&mut column_next);

    info!("event=pseudo_link_add module=editor status=ok link_id={link_id}");
    Ok(EditOutcome {
        touched: vec![row_next, column_next],
        options: CommitOptions {
            skip_data_update: true,
        },
        ..EditOutcome::default()
    })
}

/// Removes the pseudo HSQC link shared by a row and a column.
pub fn remove_pseudo_hsqc(
    graph: &CorrelationGraph,
    row_id: &str,
    column_id: &str,
) -> EditResult<EditOutcome> {
    let (row, column) = pseudo_endpoints(graph, row_id, column_id)?;
    let link = shared_pseudo_hsqc(row, column)
        .ok_or_else(|| GraphEditError::PseudoLinkNotFound {
            row_id: row_id.to_string(),
            column_id: column_id.to_string(),
        })?
        .clone();

    let touched = [row, column]
        .into_iter()
        .map(|correlation| {
            let mut next = correlation.clone();
            next.links.retain(|held| held.id != link.id);
            derive::recompute(&mut next);
            next
        })
        .collect();

    info!(
        "event=pseudo_link_remove module=editor status=ok link_id={}",
        link.id
    );
    Ok(EditOutcome {
        touched,
        released_keys: link_keys(&link),
        removed_signal_ids: vec![link.signal.id.clone()],
        options: CommitOptions {
            skip_data_update: true,
        },
        ..EditOutcome::default()
    })
}

/// Deletes a correlation and its link halves from every partner.
pub fn remove_all(graph: &CorrelationGraph, correlation_id: &str) -> EditResult<EditOutcome> {
    let correlation = graph
        .find(correlation_id)
        .ok_or_else(|| GraphEditError::CorrelationNotFound(correlation_id.to_string()))?;
    let link_ids: BTreeSet<&str> = correlation.links.iter().map(|l| l.id.as_str()).collect();

    let touched = graph
        .correlations
        .iter()
        .filter(|other| other.id != correlation_id)
        .filter(|other| other.links.iter().any(|l| link_ids.contains(l.id.as_str())))
        .map(|other| {
            let mut next = other.clone();
            next.links.retain(|l| !link_ids.contains(l.id.as_str()));
            derive::recompute(&mut next);
            next
        })
        .collect();

    let mut released_keys = vec![correlation.id.clone()];
    let mut removed_signal_ids = Vec::new();
    for link in &correlation.links {
        for key in link_keys(link) {
            touch(&mut released_keys, &key);
        }
        touch(&mut removed_signal_ids, &link.signal.id);
    }

    info!(
        "event=correlation_delete module=editor status=ok correlation_id={correlation_id} links={}",
        link_ids.len()
    );
    Ok(EditOutcome {
        touched,
        deleted: vec![correlation_id.to_string()],
        released_keys,
        removed_signal_ids,
        options: CommitOptions {
            skip_data_update: true,
        },
    })
}

/// Indices of every correlation holding `link_id`, starting with the
/// requested endpoints.
fn resolve_holders(
    graph: &CorrelationGraph,
    link_id: &str,
    correlation_dim1: &str,
    correlation_dim2: Option<&str>,
) -> EditResult<Vec<usize>> {
    let first = locate(graph, correlation_dim1, link_id)?;
    let mut holders = vec![first];
    if let Some(dim2) = correlation_dim2 {
        let second = locate(graph, dim2, link_id)?;
        if second != first {
            holders.push(second);
        }
    }
    for (index, correlation) in graph.correlations.iter().enumerate() {
        if !holders.contains(&index) && correlation.has_link(link_id) {
            holders.push(index);
        }
    }

    let dimension = holder_half(graph, first, link_id)?.dimension();
    if dimension == 2 && holders.len() < 2 {
        return Err(GraphEditError::MissingCounterpart(link_id.to_string()));
    }
    Ok(holders)
}

fn locate(graph: &CorrelationGraph, correlation_id: &str, link_id: &str) -> EditResult<usize> {
    let index = graph
        .position(correlation_id)
        .ok_or_else(|| GraphEditError::CorrelationNotFound(correlation_id.to_string()))?;
    if !graph.correlations[index].has_link(link_id) {
        return Err(GraphEditError::LinkNotFound {
            link_id: link_id.to_string(),
            correlation_id: correlation_id.to_string(),
        });
    }
    Ok(index)
}

fn holder_half<'g>(graph: &'g CorrelationGraph, index: usize, link_id: &str) -> EditResult<&'g Link> {
    let correlation = &graph.correlations[index];
    correlation
        .find_link(link_id)
        .ok_or_else(|| GraphEditError::LinkNotFound {
            link_id: link_id.to_string(),
            correlation_id: correlation.id.clone(),
        })
}

fn pseudo_endpoints<'g>(
    graph: &'g CorrelationGraph,
    row_id: &str,
    column_id: &str,
) -> EditResult<(&'g Correlation, &'g Correlation)> {
    if row_id == column_id {
        return Err(GraphEditError::SelfLink(row_id.to_string()));
    }
    let row = graph
        .find(row_id)
        .ok_or_else(|| GraphEditError::CorrelationNotFound(row_id.to_string()))?;
    let column = graph
        .find(column_id)
        .ok_or_else(|| GraphEditError::CorrelationNotFound(column_id.to_string()))?;
    Ok((row, column))
}

fn shared_pseudo_hsqc<'c>(row: &'c Correlation, column: &Correlation) -> Option<&'c Link> {
    row.links
        .iter()
        .filter(|link| link.is_pseudo_hsqc())
        .find(|link| column.has_link(&link.id))
}

/// Highlight keys that point at a link's signal.
fn link_keys(link: &Link) -> Vec<String> {
    let mut keys = vec![link.signal.id.clone()];
    if link.dimension() == 2 {
        keys.push(identity::crosshair_key(&link.signal.id, Axis::X));
        keys.push(identity::crosshair_key(&link.signal.id, Axis::Y));
    }
    keys
}

fn set_moved_flag(graph: &mut CorrelationGraph, link_id: &str, moved: bool) {
    for correlation in graph.correlations.iter_mut() {
        for link in correlation.links.iter_mut().filter(|l| l.id == link_id) {
            link.edited.moved = moved;
        }
    }
}

fn collect_touched(graph: CorrelationGraph, touched_ids: &[String]) -> Vec<Correlation> {
    graph
        .correlations
        .into_iter()
        .filter(|correlation| touched_ids.contains(&correlation.id))
        .map(|mut correlation| {
            derive::recompute(&mut correlation);
            correlation
        })
        .collect()
}

fn touch(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}
