//! Tests for the scene graph structural primitives
//!
//! Covers attach/detach lockstep between tree and node map, index-preserving
//! re-attachment, parent-mismatch handling and the integrity checker.

use super::*;
use crate::models::{Dimension, Node, NodeId};
use serde_json::json;

fn id(value: &str) -> NodeId {
    NodeId::from(value)
}

fn node(node_id: &str, is_container: bool) -> Node {
    Node::with_id(
        id(node_id),
        if is_container { "group" } else { "mesh" },
        node_id,
        Dimension::ThreeD,
        is_container,
        json!({}),
    )
}

fn attach(graph: &mut SceneGraph, node_id: &str, container: bool, parent: Option<&str>) {
    graph
        .attach(
            Subtree::single(node(node_id, container)),
            parent.map(id).as_ref(),
            None,
        )
        .unwrap();
}

/// a > (b > d, c); e
fn fixture() -> SceneGraph {
    let mut graph = SceneGraph::new();
    attach(&mut graph, "a", true, None);
    attach(&mut graph, "b", true, Some("a"));
    attach(&mut graph, "c", false, Some("a"));
    attach(&mut graph, "d", false, Some("b"));
    attach(&mut graph, "e", false, None);
    graph
}

fn ids(values: &[&str]) -> Vec<NodeId> {
    values.iter().map(|v| id(v)).collect()
}

#[test]
fn test_attach_appends_and_registers() {
    let graph = fixture();

    assert_eq!(graph.len(), 5);
    assert_eq!(graph.roots(), ids(&["a", "e"]).as_slice());
    assert_eq!(graph.children_of(Some(&id("a"))), ids(&["b", "c"]).as_slice());
    assert_eq!(graph.parent_of(&id("d")), Some(&id("b")));
    assert_eq!(graph.parent_of(&id("a")), None);
    graph.check_integrity().unwrap();
}

#[test]
fn test_attach_at_index() {
    let mut graph = fixture();
    graph
        .attach(Subtree::single(node("x", false)), Some(&id("a")), Some(0))
        .unwrap();
    assert_eq!(
        graph.children_of(Some(&id("a"))),
        ids(&["x", "b", "c"]).as_slice()
    );

    // Out-of-range indices clamp to append
    graph
        .attach(Subtree::single(node("y", false)), None, Some(99))
        .unwrap();
    assert_eq!(graph.roots(), ids(&["a", "e", "y"]).as_slice());
}

#[test]
fn test_attach_unknown_parent_fails_without_mutation() {
    let mut graph = fixture();
    let before = graph.clone();
    let result = graph.attach(Subtree::single(node("x", false)), Some(&id("nope")), None);
    assert_eq!(result, Err(GraphError::parent_not_found(&id("nope"))));
    assert_eq!(graph, before);
}

#[test]
fn test_attach_duplicate_id_fails() {
    let mut graph = fixture();
    let result = graph.attach(Subtree::single(node("c", false)), None, None);
    assert_eq!(result, Err(GraphError::duplicate_id(&id("c"))));
    graph.check_integrity().unwrap();
}

#[test]
fn test_detach_removes_subtree_from_map() {
    let mut graph = fixture();
    let (subtree, index) = graph.detach(&id("b"), Some(&id("a"))).unwrap();

    assert_eq!(index, 0);
    assert_eq!(subtree.ids().cloned().collect::<Vec<_>>(), ids(&["b", "d"]));
    assert!(!graph.contains(&id("b")));
    assert!(!graph.contains(&id("d")));
    assert_eq!(graph.parent_of(&id("d")), None);
    assert_eq!(graph.children_of(Some(&id("a"))), ids(&["c"]).as_slice());
    graph.check_integrity().unwrap();
}

#[test]
fn test_detach_then_attach_restores_structure() {
    let mut graph = fixture();
    let original = graph.clone();

    let (subtree, index) = graph.detach(&id("b"), Some(&id("a"))).unwrap();
    graph.attach(subtree, Some(&id("a")), Some(index)).unwrap();

    assert_eq!(graph, original);
}

#[test]
fn test_detach_with_wrong_parent_is_noop() {
    let mut graph = fixture();
    let before = graph.clone();

    assert!(graph.detach(&id("d"), Some(&id("a"))).is_none());
    assert!(graph.detach(&id("d"), None).is_none());
    assert!(graph.detach(&id("ghost"), None).is_none());
    assert_eq!(graph, before);
}

#[test]
fn test_find_by_id_depth_first() {
    let graph = fixture();
    assert_eq!(graph.find_by_id(&id("a"), &id("d")).unwrap().id, id("d"));
    assert!(graph.find_by_id(&id("b"), &id("c")).is_none());
    assert!(graph.find_by_id(&id("ghost"), &id("c")).is_none());
}

#[test]
fn test_ancestors_and_index() {
    let graph = fixture();
    assert_eq!(graph.ancestors(&id("d")), ids(&["b", "a"]));
    assert!(graph.is_ancestor(&id("a"), &id("d")));
    assert!(!graph.is_ancestor(&id("d"), &id("a")));
    assert_eq!(graph.index_in_parent(&id("c")), Some(1));
    assert_eq!(graph.index_in_parent(&id("e")), Some(1));
    assert_eq!(graph.index_in_parent(&id("ghost")), None);
}

#[test]
fn test_iter_depth_first_order() {
    let graph = fixture();
    let order: Vec<&str> = graph
        .iter_depth_first()
        .into_iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(order, vec!["a", "b", "d", "c", "e"]);
}

#[test]
fn test_node_map_matches_reachable_set_across_sequences() {
    let mut graph = fixture();
    let mut parked = Vec::new();

    for (target, parent) in [("d", Some("b")), ("c", Some("a")), ("e", None), ("a", None)] {
        let detached = graph.detach(&id(target), parent.map(id).as_ref()).unwrap();
        parked.push((detached, parent));
        graph.check_integrity().unwrap();
        let reachable: std::collections::HashSet<NodeId> = graph
            .iter_depth_first()
            .into_iter()
            .map(|n| n.id.clone())
            .collect();
        assert_eq!(reachable.len(), graph.len());
    }
    assert!(graph.is_empty());

    while let Some(((subtree, index), parent)) = parked.pop() {
        graph
            .attach(subtree, parent.map(id).as_ref(), Some(index))
            .unwrap();
        graph.check_integrity().unwrap();
    }
    assert_eq!(graph, fixture());
}

#[test]
fn test_first_root_container() {
    let mut graph = fixture();
    assert_eq!(
        graph.first_root_container(Dimension::ThreeD).unwrap().id,
        id("a")
    );
    assert!(graph.first_root_container(Dimension::TwoD).is_none());

    let canvas = Node::from_kind("canvas", "Canvas").unwrap();
    let canvas_id = canvas.id.clone();
    graph.attach(Subtree::single(canvas), None, None).unwrap();
    assert_eq!(
        graph.first_root_container(Dimension::TwoD).unwrap().id,
        canvas_id
    );
}
