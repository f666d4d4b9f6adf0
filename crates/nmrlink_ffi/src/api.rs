//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the annotation session to Dart via FRB as sync calls.
//! - Translate core errors into plain response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - One session per UI thread; calls on other threads see no session.
//! - Graph payloads cross the boundary as JSON strings in the snapshot
//!   wire format.

use log::warn;
use nmrlink_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AnnotationSession, Axis, CorrelationGraph, CorrelationPatch, EditAction, FieldEdit,
    GraphCommit, PseudoLinkOp, SubscriberId, TargetCorrelation,
};
use std::cell::RefCell;

thread_local! {
    static SESSION: RefCell<Option<AnnotationSession>> = const { RefCell::new(None) };
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: `trace|debug|info|warn|error`; empty reads `NMRLINK_LOG_LEVEL`.
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Idempotent for the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Result envelope for graph-changing calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResponse {
    pub ok: bool,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
    /// Ids of changed or created correlations.
    pub touched: Vec<String>,
    /// Ids of removed correlations.
    pub deleted: Vec<String>,
}

impl EditResponse {
    fn success(message: impl Into<String>, commit: GraphCommit) -> Self {
        Self {
            ok: true,
            message: message.into(),
            touched: commit.touched,
            deleted: commit.deleted,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            touched: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

/// JSON payload envelope for read calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonResponse {
    pub ok: bool,
    /// JSON document on success, empty otherwise.
    pub json: String,
    pub message: String,
}

/// Assigned atom ids of one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentView {
    pub x: Vec<String>,
    pub y: Vec<String>,
}

/// Loads a graph snapshot and starts a fresh session on this thread.
///
/// # FFI contract
/// - Replaces any existing session, dropping its highlights and assignments.
/// - Fragment ids from the replaced session stay inert; `highlight_register`
///   never hands out the same id twice in a process.
/// - Fails with "session is busy" only while the slot is borrowed.
/// - Returns every correlation id as `touched` on success.
#[flutter_rust_bridge::frb(sync)]
pub fn session_load(snapshot_json: String) -> EditResponse {
    let graph: CorrelationGraph = match serde_json::from_str(&snapshot_json) {
        Ok(graph) => graph,
        Err(err) => return failed("session_load", format!("invalid snapshot JSON: {err}")),
    };
    let touched = graph
        .correlations
        .iter()
        .map(|correlation| correlation.id.clone())
        .collect();
    match AnnotationSession::new(graph) {
        Ok(session) => {
            let stored = SESSION.with(|slot| {
                slot.try_borrow_mut()
                    .map(|mut slot| *slot = Some(session))
                    .is_ok()
            });
            if !stored {
                return failed("session_load", "session is busy".to_string());
            }
            EditResponse::success(
                "Session loaded.",
                GraphCommit {
                    touched,
                    ..GraphCommit::default()
                },
            )
        }
        Err(err) => failed("session_load", err.to_string()),
    }
}

/// Drops this thread's session. Returns whether one was loaded.
#[flutter_rust_bridge::frb(sync)]
pub fn session_close() -> bool {
    SESSION.with(|slot| {
        slot.try_borrow_mut()
            .map(|mut slot| slot.take().is_some())
            .unwrap_or(false)
    })
}

/// Current graph snapshot as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn session_snapshot_json() -> JsonResponse {
    json_response(with_session(|session| {
        serde_json::to_string(session.store().graph()).map_err(|err| err.to_string())
    }))
}

/// Per-atom-type molecular formula completion as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn session_state_json() -> JsonResponse {
    json_response(with_session(|session| {
        let state: serde_json::Map<String, serde_json::Value> = session
            .store()
            .state()
            .map_err(|err| err.to_string())?
            .into_iter()
            .map(|(atom_type, state)| {
                let value = serde_json::json!({
                    "current": state.current,
                    "total": state.total,
                    "complete": state.complete,
                    "error": state.error,
                });
                (atom_type, value)
            })
            .collect();
        Ok(serde_json::Value::Object(state).to_string())
    }))
}

/// Moves a link; target ids accept the `new` sentinel.
#[flutter_rust_bridge::frb(sync)]
pub fn edit_move_link(
    link_id: String,
    correlation_dim1: String,
    correlation_dim2: Option<String>,
    target_dim1: String,
    target_dim2: Option<String>,
) -> EditResponse {
    apply_action(
        "edit_move_link",
        "Link moved.",
        EditAction::Move {
            link_id,
            correlation_dim1,
            correlation_dim2,
            target_dim1: TargetCorrelation::parse(&target_dim1),
            target_dim2: target_dim2.as_deref().map(TargetCorrelation::parse),
        },
    )
}

#[flutter_rust_bridge::frb(sync)]
pub fn edit_remove_link(
    link_id: String,
    correlation_dim1: String,
    correlation_dim2: Option<String>,
) -> EditResponse {
    apply_action(
        "edit_remove_link",
        "Link removed.",
        EditAction::Remove {
            link_id,
            correlation_dim1,
            correlation_dim2,
        },
    )
}

#[flutter_rust_bridge::frb(sync)]
pub fn edit_unmove_link(
    link_id: String,
    correlation_dim1: String,
    correlation_dim2: Option<String>,
) -> EditResponse {
    apply_action(
        "edit_unmove_link",
        "Link restored.",
        EditAction::Unmove {
            link_id,
            correlation_dim1,
            correlation_dim2,
        },
    )
}

#[flutter_rust_bridge::frb(sync)]
pub fn edit_set_path_length(
    link_id: String,
    correlation_dim1: String,
    correlation_dim2: Option<String>,
    min: u32,
    max: u32,
) -> EditResponse {
    apply_action(
        "edit_set_path_length",
        "Path length set.",
        EditAction::SetPathLength {
            link_id,
            correlation_dim1,
            correlation_dim2,
            min,
            max,
        },
    )
}

#[flutter_rust_bridge::frb(sync)]
pub fn edit_add_pseudo_hsqc(row_id: String, column_id: String) -> EditResponse {
    apply_action(
        "edit_add_pseudo_hsqc",
        "Pseudo HSQC link added.",
        EditAction::PseudoHsqc {
            row_id,
            column_id,
            op: PseudoLinkOp::Add,
        },
    )
}

#[flutter_rust_bridge::frb(sync)]
pub fn edit_remove_pseudo_hsqc(row_id: String, column_id: String) -> EditResponse {
    apply_action(
        "edit_remove_pseudo_hsqc",
        "Pseudo HSQC link removed.",
        EditAction::PseudoHsqc {
            row_id,
            column_id,
            op: PseudoLinkOp::Remove,
        },
    )
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_correlation(correlation_id: String) -> EditResponse {
    apply_action(
        "delete_correlation",
        "Correlation deleted.",
        EditAction::RemoveAll { correlation_id },
    )
}

/// Sets (`Some`) or resets (`None`) the equivalence override.
#[flutter_rust_bridge::frb(sync)]
pub fn correlation_set_equivalence(correlation_id: String, value: Option<u32>) -> EditResponse {
    let patch = CorrelationPatch {
        equivalence: Some(value.map_or(FieldEdit::Reset, FieldEdit::Set)),
        ..CorrelationPatch::default()
    };
    commit_response(
        "correlation_set_equivalence",
        "Equivalence updated.",
        with_session(|session| {
            session
                .store_mut()
                .set_correlation(&correlation_id, patch)
                .map_err(|err| err.to_string())
        }),
    )
}

/// Sets (`Some`) or resets (`None`) the attached proton count override.
#[flutter_rust_bridge::frb(sync)]
pub fn correlation_set_protons_count(
    correlation_id: String,
    value: Option<Vec<u32>>,
) -> EditResponse {
    let patch = CorrelationPatch {
        protons_count: Some(value.map_or(FieldEdit::Reset, FieldEdit::Set)),
        ..CorrelationPatch::default()
    };
    commit_response(
        "correlation_set_protons_count",
        "Proton count updated.",
        with_session(|session| {
            session
                .store_mut()
                .set_correlation(&correlation_id, patch)
                .map_err(|err| err.to_string())
        }),
    )
}

#[flutter_rust_bridge::frb(sync)]
pub fn set_tolerance(atom_type: String, value: f64) -> EditResponse {
    commit_response(
        "set_tolerance",
        "Tolerance updated.",
        with_session(|session| {
            session
                .store_mut()
                .set_tolerance(atom_type.trim(), value)
                .map_err(|err| err.to_string())
        }),
    )
}

/// Sets the molecular formula; `None` or blank clears it.
#[flutter_rust_bridge::frb(sync)]
pub fn set_molecular_formula(mf: Option<String>) -> EditResponse {
    let mf = mf.filter(|value| !value.trim().is_empty());
    commit_response(
        "set_molecular_formula",
        "Molecular formula updated.",
        with_session(|session| {
            session
                .store_mut()
                .set_molecular_formula(mf.as_deref())
                .map_err(|err| err.to_string())
        }),
    )
}

#[flutter_rust_bridge::frb(sync)]
pub fn undo() -> EditResponse {
    match with_session(|session| Ok(session.undo())) {
        Ok(Some(commit)) => EditResponse::success("Undone.", commit),
        Ok(None) => EditResponse::failure("Nothing to undo."),
        Err(err) => failed("undo", err),
    }
}

/// Registers one UI fragment on the highlight bus; returns `0` without a session.
#[flutter_rust_bridge::frb(sync)]
pub fn highlight_register() -> u64 {
    with_session(|session| Ok(session.bus().borrow_mut().register().as_u64())).unwrap_or(0)
}

#[flutter_rust_bridge::frb(sync)]
pub fn highlight_show(subscriber: u64, keys: Vec<String>) {
    with_bus(|bus| bus.show(SubscriberId::from_u64(subscriber), &keys));
}

#[flutter_rust_bridge::frb(sync)]
pub fn highlight_hide(subscriber: u64, keys: Vec<String>) {
    with_bus(|bus| bus.hide(SubscriberId::from_u64(subscriber), &keys));
}

/// Whether any key is active or latched.
#[flutter_rust_bridge::frb(sync)]
pub fn highlight_is_active(keys: Vec<String>) -> bool {
    with_session(|session| Ok(session.bus().borrow().is_highlighted(&keys))).unwrap_or(false)
}

/// Click-to-pin toggle; returns whether `keys` are latched afterwards.
#[flutter_rust_bridge::frb(sync)]
pub fn highlight_toggle_latch(subscriber: u64, keys: Vec<String>) -> bool {
    with_bus(|bus| bus.toggle_latched(SubscriberId::from_u64(subscriber), &keys)).unwrap_or(false)
}

/// Fragment teardown. Safe to call more than once.
#[flutter_rust_bridge::frb(sync)]
pub fn highlight_dispose(subscriber: u64) {
    with_bus(|bus| bus.dispose_all(SubscriberId::from_u64(subscriber)));
}

#[flutter_rust_bridge::frb(sync)]
pub fn assignment_get(entity_id: String) -> AssignmentView {
    let assignment = with_session(|session| Ok(session.assignment(&entity_id))).unwrap_or_default();
    AssignmentView {
        x: assignment.x,
        y: assignment.y,
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn assignment_assign(entity_id: String, axis: String, atom_id: String) -> String {
    unit_response(with_session(|session| {
        session.assign(&entity_id, parse_axis(&axis)?, &atom_id);
        Ok(())
    }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn assignment_unassign(entity_id: String, axis: String, atom_id: String) -> String {
    unit_response(with_session(|session| {
        session.unassign(&entity_id, parse_axis(&axis)?, &atom_id);
        Ok(())
    }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn assignment_remove_all(entity_id: String, axis: String) -> String {
    unit_response(with_session(|session| {
        session.remove_all_assignments(&entity_id, parse_axis(&axis)?);
        Ok(())
    }))
}

/// Hover start (`Some(axis)`) or end (`None`) on an assignable entity.
#[flutter_rust_bridge::frb(sync)]
pub fn assignment_highlight(entity_id: String, axis: Option<String>) -> String {
    unit_response(with_session(|session| {
        match axis {
            Some(axis) => session.highlight_assignment(&entity_id, parse_axis(&axis)?),
            None => session.clear_assignment_highlight(&entity_id),
        }
        Ok(())
    }))
}

fn apply_action(call: &str, message: &str, action: EditAction) -> EditResponse {
    commit_response(
        call,
        message,
        with_session(|session| session.apply(action).map_err(|err| err.to_string())),
    )
}

fn commit_response(call: &str, message: &str, result: Result<GraphCommit, String>) -> EditResponse {
    match result {
        Ok(commit) => EditResponse::success(message, commit),
        Err(err) => failed(call, err),
    }
}

fn failed(call: &str, err: String) -> EditResponse {
    warn!("event=ffi_call module=ffi status=error call={call}");
    EditResponse::failure(format!("{call} failed: {err}"))
}

fn json_response(result: Result<String, String>) -> JsonResponse {
    match result {
        Ok(json) => JsonResponse {
            ok: true,
            json,
            message: String::new(),
        },
        Err(message) => JsonResponse {
            ok: false,
            json: String::new(),
            message,
        },
    }
}

fn unit_response(result: Result<(), String>) -> String {
    match result {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

fn parse_axis(value: &str) -> Result<Axis, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "x" => Ok(Axis::X),
        "y" => Ok(Axis::Y),
        other => Err(format!("unsupported axis `{other}`; expected x|y")),
    }
}

fn with_session<T>(f: impl FnOnce(&mut AnnotationSession) -> Result<T, String>) -> Result<T, String> {
    SESSION.with(|slot| {
        let mut slot = slot
            .try_borrow_mut()
            .map_err(|_| "session is busy".to_string())?;
        let session = slot
            .as_mut()
            .ok_or_else(|| "no session loaded; call session_load first".to_string())?;
        f(session)
    })
}

fn with_bus<T>(f: impl FnOnce(&mut nmrlink_core::HighlightBus) -> T) -> Option<T> {
    with_session(|session| {
        let mut bus = session
            .bus()
            .try_borrow_mut()
            .map_err(|_| "highlight bus is busy".to_string())?;
        Ok(f(&mut *bus))
    })
    .ok()
}
