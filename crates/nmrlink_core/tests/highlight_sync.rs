use nmrlink_core::{
    AnnotationSession, Axis, Correlation, CorrelationGraph, EditAction, ExperimentType,
    HighlightBus, HighlightScope, Link, SharedHighlightBus, Signal,
};
use std::cell::RefCell;
use std::rc::Rc;

fn shared_bus() -> SharedHighlightBus {
    Rc::new(RefCell::new(HighlightBus::new()))
}

fn hsqc_graph() -> CorrelationGraph {
    let (h_half, c_half) = Link::two_d_pair(
        "l1",
        "exp-hsqc",
        ExperimentType::Hsqc,
        ["H", "C"],
        Signal::two_d("s1", 1.2, 20.0),
    );
    let mut carbon = Correlation::with_id("c1", "C", "C1", None);
    carbon.links.push(c_half);
    let mut proton = Correlation::with_id("h1", "H", "H1", None);
    proton.links.push(h_half);
    CorrelationGraph::new(vec![carbon, proton])
}

#[test]
fn overlapping_fragments_keep_shared_key_until_last_leaves() {
    let bus = shared_bus();
    let mut table_row = HighlightScope::new(&bus, vec!["s1".into(), "c1".into()]);
    let mut peak = HighlightScope::new(&bus, vec!["s1".into()]);

    table_row.enter();
    peak.enter();
    assert_eq!(bus.borrow().count("s1"), 2);

    table_row.leave();
    assert!(bus.borrow().is_active(&["s1"]));
    assert!(!bus.borrow().is_active(&["c1"]));

    peak.leave();
    assert!(!bus.borrow().is_active(&["s1"]));
}

#[test]
fn hide_without_show_never_goes_negative() {
    let mut bus = HighlightBus::new();
    let row = bus.register();
    let other = bus.register();

    bus.hide(row, &["ghost"]);
    bus.show(row, &["s1"]);
    bus.hide(other, &["s1"]);
    assert_eq!(bus.count("s1"), 1);

    bus.hide(row, &["s1"]);
    bus.hide(row, &["s1"]);
    assert_eq!(bus.count("s1"), 0);
    assert!(bus.active_keys().is_empty());
}

#[test]
fn dispose_twice_equals_dispose_once() {
    let mut bus = HighlightBus::new();
    let row = bus.register();
    let peak = bus.register();
    bus.show(row, &["s1", "s1", "c1"]);
    bus.show(peak, &["s1"]);
    bus.set_latched(row, &["c1"]);

    bus.dispose(row, &["s1", "c1"]);
    let after_first = (bus.count("s1"), bus.count("c1"), bus.latched_keys());
    bus.dispose(row, &["s1", "c1"]);
    let after_second = (bus.count("s1"), bus.count("c1"), bus.latched_keys());

    assert_eq!(after_first, after_second);
    assert_eq!(after_first, (1, 0, Vec::<String>::new()));
}

#[test]
fn dropped_scope_releases_keys_and_latch() {
    let bus = shared_bus();
    {
        let mut scope = HighlightScope::new(&bus, vec!["z1".into()]);
        scope.enter();
        assert!(scope.toggle_latch());
        assert!(bus.borrow().is_latched(&["z1"]));
    }
    assert!(!bus.borrow().is_highlighted(&["z1"]));
}

#[test]
fn deleting_correlation_clears_keys_and_forgets_assignments() {
    let mut session = AnnotationSession::new(hsqc_graph()).unwrap();
    session.assign("s1", Axis::X, "atom-7");
    session.highlight_assignment("s1", Axis::X);
    let mut row = session.highlight_scope(vec!["c1".into(), "s1".into()]);
    row.enter();
    assert!(session.bus().borrow().is_active(&["atom-7", "s1___x", "c1"]));

    session.delete_correlation("c1").unwrap();

    let bus = session.bus().borrow();
    assert!(!bus.is_active(&["atom-7", "s1___x", "s1", "c1"]));
    assert!(session.assignment("s1").is_empty());
    assert!(session.assignments().entities_for_atom("atom-7").is_empty());
    drop(bus);

    row.leave();
    assert!(session.bus().borrow().active_keys().is_empty());
}

#[test]
fn failed_edit_leaves_highlights_untouched() {
    let mut session = AnnotationSession::new(hsqc_graph()).unwrap();
    let mut row = session.highlight_scope(vec!["c1".into()]);
    row.enter();

    let err = session.apply(EditAction::RemoveAll {
        correlation_id: "missing".into(),
    });
    assert!(err.is_err());
    assert!(session.bus().borrow().is_active(&["c1"]));
    assert!(session.store().get("c1").is_some());
}
