//! One-at-a-time edit lifecycle.
//!
//! # Invariants
//! - At most one edit is pending.
//! - A failed commit leaves the session idle; nothing half-applied remains.

use crate::editor::error::{EditResult, GraphEditError};
use crate::editor::ops::EditAction;
use log::{info, warn};

/// Lifecycle state of the current edit.
#[derive(Debug, Clone, PartialEq)]
pub enum EditState {
    Idle,
    Editing(EditAction),
    Committed(EditAction),
}

/// Tracks the edit between `begin` and `commit`/`cancel`.
#[derive(Debug)]
pub struct EditSession {
    state: EditState,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSession {
    pub fn new() -> Self {
        Self {
            state: EditState::Idle,
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    /// Pending action, if an edit is open.
    pub fn pending(&self) -> Option<&EditAction> {
        match &self.state {
            EditState::Editing(action) => Some(action),
            _ => None,
        }
    }

    /// Opens an edit for `action`.
    ///
    /// # Errors
    /// - [`GraphEditError::EditInProgress`] when another edit is pending.
    pub fn begin(&mut self, action: EditAction) -> EditResult<()> {
        if let EditState::Editing(pending) = &self.state {
            warn!(
                "event=edit_begin module=editor status=rejected pending={}",
                pending.name()
            );
            return Err(GraphEditError::EditInProgress);
        }
        info!(
            "event=edit_begin module=editor status=ok action={}",
            action.name()
        );
        self.state = EditState::Editing(action);
        Ok(())
    }

    /// Drops the pending edit.
    pub fn cancel(&mut self) -> EditResult<EditAction> {
        match std::mem::replace(&mut self.state, EditState::Idle) {
            EditState::Editing(action) => {
                info!(
                    "event=edit_cancel module=editor status=ok action={}",
                    action.name()
                );
                Ok(action)
            }
            previous => {
                self.state = previous;
                Err(GraphEditError::NoPendingEdit)
            }
        }
    }

    /// Runs `apply` with the pending action and closes the edit.
    ///
    /// On error the edit is aborted and the session returns to idle.
    pub fn commit<T, F>(&mut self, apply: F) -> EditResult<T>
    where
        F: FnOnce(&EditAction) -> EditResult<T>,
    {
        let action = match std::mem::replace(&mut self.state, EditState::Idle) {
            EditState::Editing(action) => action,
            previous => {
                self.state = previous;
                return Err(GraphEditError::NoPendingEdit);
            }
        };
        match apply(&action) {
            Ok(value) => {
                info!(
                    "event=edit_commit module=editor status=ok action={}",
                    action.name()
                );
                self.state = EditState::Committed(action);
                Ok(value)
            }
            Err(err) => {
                warn!(
                    "event=edit_commit module=editor status=error action={} error={err}",
                    action.name()
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EditSession, EditState};
    use crate::editor::error::GraphEditError;
    use crate::editor::ops::EditAction;

    fn remove_all(id: &str) -> EditAction {
        EditAction::RemoveAll {
            correlation_id: id.to_string(),
        }
    }

    #[test]
    fn second_begin_is_rejected_while_editing() {
        let mut session = EditSession::new();
        session.begin(remove_all("c1")).expect("first begin");
        assert_eq!(
            session.begin(remove_all("c2")),
            Err(GraphEditError::EditInProgress)
        );
        assert_eq!(session.pending(), Some(&remove_all("c1")));
    }

    #[test]
    fn failed_commit_returns_to_idle() {
        let mut session = EditSession::new();
        session.begin(remove_all("c1")).expect("begin");
        let result: Result<(), _> =
            session.commit(|_| Err(GraphEditError::CorrelationNotFound("c1".into())));
        assert!(result.is_err());
        assert_eq!(session.state(), &EditState::Idle);
    }

    #[test]
    fn commit_without_begin_fails() {
        let mut session = EditSession::new();
        let result = session.commit(|_| Ok(()));
        assert_eq!(result, Err(GraphEditError::NoPendingEdit));
        assert_eq!(session.cancel(), Err(GraphEditError::NoPendingEdit));
    }

    #[test]
    fn successful_commit_records_action() {
        let mut session = EditSession::new();
        session.begin(remove_all("c1")).expect("begin");
        session.commit(|_| Ok(())).expect("commit");
        assert_eq!(session.state(), &EditState::Committed(remove_all("c1")));
        session.begin(remove_all("c2")).expect("committed session accepts new edit");
    }
}
