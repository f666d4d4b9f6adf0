use nmrlink_core::{
    Axis, Correlation, CorrelationGraph, ExperimentType, GraphValidationError, Link, Signal,
};
use serde_json::json;

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
fn snapshot_json_uses_external_wire_names() {
    let value = serde_json::to_value(hsqc_graph()).unwrap();
    let link = &value["correlations"][0]["link"][0];

    assert_eq!(value["correlations"][0]["atomType"], "C");
    assert_eq!(value["correlations"][0]["protonsCount"], json!([]));
    assert_eq!(link["experimentID"], "exp-hsqc");
    assert_eq!(link["experimentType"], "hsqc");
    assert_eq!(link["atomType"], json!(["H", "C"]));
    assert_eq!(link["axis"], "y");
    assert_eq!(link["edited"]["moved"], false);
}

#[test]
fn minimal_snapshot_fills_defaults() {
    let raw = json!({
        "correlations": [
            {
                "id": "c1",
                "atomType": "C",
                "link": [
                    {
                        "id": "l1",
                        "experimentID": "exp-c",
                        "experimentType": "1d",
                        "atomType": ["C"],
                        "signal": { "id": "s1", "x": 20.5, "pathLength": { "values": [2, 3], "source": "manual" } }
                    }
                ]
            }
        ],
        "options": { "mf": "C1" }
    });
    let graph: CorrelationGraph = serde_json::from_value(raw).unwrap();
    let correlation = &graph.correlations[0];

    assert_eq!(correlation.equivalence, 1);
    assert!(!correlation.pseudo);
    assert!(!correlation.edited.equivalence);
    assert_eq!(correlation.links[0].dimension(), 1);
    assert_eq!(correlation.links[0].delta(), Some(20.5));
    assert_eq!(
        correlation.links[0].signal.path_length.as_ref().map(|p| p.max()),
        Some(3)
    );
    assert!(graph.validate().is_ok());
}

#[test]
fn validate_rejects_one_sided_2d_link() {
    let mut graph = hsqc_graph();
    graph.correlations[1].links.clear();

    assert_eq!(
        graph.validate(),
        Err(GraphValidationError::LinkArity {
            link_id: "l1".to_string(),
            expected: 2,
            found: 1,
        })
    );
}

#[test]
fn validate_rejects_reserved_token_in_ids() {
    let graph = CorrelationGraph::new(vec![Correlation::with_id("c___x", "C", "C1", None)]);
    assert_eq!(
        graph.validate(),
        Err(GraphValidationError::ReservedToken("c___x".to_string()))
    );
}

#[test]
fn validate_rejects_duplicate_ids_and_atom_type_mismatch() {
    let mut graph = hsqc_graph();
    graph
        .correlations
        .push(Correlation::with_id("c1", "C", "C2", None));
    assert_eq!(
        graph.validate(),
        Err(GraphValidationError::DuplicateCorrelationId("c1".to_string()))
    );

    let mut graph = hsqc_graph();
    graph.correlations[0].atom_type = "N".to_string();
    assert!(matches!(
        graph.validate(),
        Err(GraphValidationError::AtomTypeMismatch { .. })
    ));
}

#[test]
fn validate_rejects_halves_on_the_same_axis() {
    let mut graph = hsqc_graph();
    let proton_half = graph.correlations[1].links[0].with_axis(Axis::Y);
    graph.correlations[1].links[0] = proton_half;
    graph.correlations[1].atom_type = "C".to_string();

    assert_eq!(
        graph.validate(),
        Err(GraphValidationError::LinkAxes("l1".to_string()))
    );
}

#[test]
fn next_label_skips_taken_labels() {
    let mut graph = hsqc_graph();
    assert_eq!(graph.next_label("C"), "C2");
    graph
        .correlations
        .push(Correlation::with_id("c2", "C", "C3", None));
    assert_eq!(graph.next_label("C"), "C4");
}
