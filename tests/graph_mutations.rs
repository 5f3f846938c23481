mod common;

use critpath::dag::{DependencyGraph, EdgeInsert};
use critpath::errors::CritpathError;
use critpath::types::{Direction, GraphVersion};

use crate::common::{GraphBuilder, id, init_tracing, samples};

#[test]
fn rejected_cycle_leaves_graph_unchanged() {
    init_tracing();
    let mut graph = samples::linear_chain();
    let before = graph.clone();

    // A <- B <- C <- D already; A waiting on D closes the loop.
    let err = graph
        .add_edge(&id("A"), &id("D"), "blocks", "test")
        .unwrap_err();

    assert!(matches!(err, CritpathError::Cycle { .. }), "got {err:?}");
    assert_eq!(graph, before);
    assert_eq!(graph.version(), before.version());
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn self_dependency_is_a_cycle() {
    let mut graph = GraphBuilder::new().node("A", 1).build();
    let err = graph.add_edge(&id("A"), &id("A"), "blocks", "test").unwrap_err();
    assert!(matches!(err, CritpathError::Cycle { .. }));
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn edge_to_untracked_item_is_unknown_node() {
    let mut graph = GraphBuilder::new().node("A", 1).build();
    let err = graph.add_edge(&id("A"), &id("Z"), "blocks", "test").unwrap_err();
    match err {
        CritpathError::UnknownNode(item) => assert_eq!(item, id("Z")),
        other => panic!("expected UnknownNode, got {other:?}"),
    }
}

#[test]
fn duplicate_edge_is_a_no_op() {
    let mut graph = samples::linear_chain();
    let version = graph.version();

    let outcome = graph.add_edge(&id("B"), &id("A"), "relates", "someone-else").unwrap();

    assert_eq!(outcome, EdgeInsert::AlreadyPresent);
    assert_eq!(graph.version(), version);
    // Original metadata is kept.
    assert_eq!(graph.edge(&id("B"), &id("A")).unwrap().kind, "blocks");
}

#[test]
fn removing_an_edge_twice_reports_not_found() {
    let mut graph = samples::fan_in();
    graph.remove_edge(&id("909"), &id("907")).unwrap();
    let after_first = graph.clone();

    let err = graph.remove_edge(&id("909"), &id("907")).unwrap_err();

    assert!(matches!(err, CritpathError::NotFound { .. }));
    assert_eq!(graph, after_first);
}

#[test]
fn remove_node_drops_incident_edges() {
    let mut graph = samples::fan_in();
    graph.remove_node(&id("904")).unwrap();

    assert!(!graph.contains(&id("904")));
    assert!(!graph.has_edge(&id("904"), &id("901")));
    assert!(!graph.has_edge(&id("907"), &id("904")));
    assert_eq!(graph.neighbors(&id("901"), Direction::Dependents), vec![id("902")]);
    assert_eq!(graph.in_degree(&id("907")), 0);

    assert!(matches!(
        graph.remove_node(&id("904")),
        Err(CritpathError::ItemNotFound(_))
    ));
}

#[test]
fn version_bumps_only_on_change() {
    let mut graph = DependencyGraph::new();
    assert_eq!(graph.version(), GraphVersion(0));

    assert!(graph.insert_node(id("A"), 3));
    let v1 = graph.version();
    assert!(!graph.insert_node(id("A"), 5));
    assert_eq!(graph.version(), v1);
    assert_eq!(graph.weight(&id("A")), Some(3));

    graph.set_weight(&id("A"), 3).unwrap();
    assert_eq!(graph.version(), v1);
    graph.set_weight(&id("A"), 4).unwrap();
    assert!(graph.version() > v1);
}

#[test]
fn check_edge_does_not_mutate() {
    let graph = samples::linear_chain();
    let before = graph.clone();

    assert!(graph.check_edge(&id("E"), &id("D")).is_ok());
    assert!(graph.check_edge(&id("A"), &id("C")).is_err());
    assert!(graph.is_reachable(&id("D"), &id("A")));
    assert!(!graph.is_reachable(&id("A"), &id("D")));
    assert_eq!(graph, before);
}
