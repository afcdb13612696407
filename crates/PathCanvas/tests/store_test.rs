use path_canvas::EditorError;
use path_canvas::model::{Node, NodePatch, Path, PathPatch, Position};
use path_canvas::store::GraphStore;

fn seeded() -> GraphStore {
    let mut store = GraphStore::default();
    store.add_node(Node::new("a", "A", Position::new(0.0, 0.0))).unwrap();
    store.add_node(Node::new("b", "B", Position::new(100.0, 0.0))).unwrap();
    store
}

#[test]
fn test_duplicate_ids_are_rejected() {
    let mut store = seeded();
    let err = store.add_node(Node::new("a", "Again", Position::default()));
    assert!(matches!(err, Err(EditorError::DuplicateId { .. })));
    assert_eq!(store.node_count(), 2);
    assert_eq!(store.history().len(), 2);

    store.add_path(Path::new("p", "P", "a", "b")).unwrap();
    let err = store.add_path(Path::new("p", "P", "b", "a"));
    assert!(matches!(err, Err(EditorError::DuplicateId { .. })));
}

#[test]
fn test_add_path_requires_existing_endpoints() {
    let mut store = seeded();
    let err = store.add_path(Path::new("p", "P", "a", "ghost"));
    match err {
        Err(EditorError::InvalidEndpoint { node, .. }) => assert_eq!(node, "ghost"),
        other => panic!("expected InvalidEndpoint, got {other:?}"),
    }
    assert_eq!(store.path_count(), 0);
    assert_eq!(store.history().len(), 2);
}

#[test]
fn test_negative_weight_is_rejected() {
    let mut store = seeded();
    let err = store.add_path(Path::new("p", "P", "a", "b").with_weight(-1.0));
    assert!(matches!(err, Err(EditorError::Validation(_))));

    store.add_path(Path::new("p", "P", "a", "b").with_weight(2.5)).unwrap();
    let patch = PathPatch {
        weight: Some(f64::NAN),
        ..Default::default()
    };
    assert!(matches!(store.update_path("p", &patch), Err(EditorError::Validation(_))));
    assert_eq!(store.path("p").unwrap().weight, 2.5);
}

#[test]
fn test_update_node_records_only_position_changes() {
    let mut store = seeded();
    let recorded = store.history().len();

    store.update_node("a", &NodePatch::name("Dock")).unwrap();
    assert_eq!(store.node("a").unwrap().name, "Dock");
    assert_eq!(store.history().len(), recorded);

    store
        .update_node("a", &NodePatch::position(Position::new(7.0, 8.0)))
        .unwrap();
    assert_eq!(store.history().len(), recorded + 1);

    store.undo();
    let a = store.node("a").unwrap();
    assert_eq!(a.position, Position::new(0.0, 0.0));
    assert_eq!(a.name, "Dock", "name edits are not undo-tracked");
}

#[test]
fn test_update_missing_entities() {
    let mut store = seeded();
    assert!(matches!(
        store.update_node("ghost", &NodePatch::name("x")),
        Err(EditorError::NotFound { .. })
    ));
    assert!(matches!(
        store.update_path("ghost", &PathPatch::default()),
        Err(EditorError::NotFound { .. })
    ));
}

#[test]
fn test_update_path_rejects_dangling_endpoint() {
    let mut store = seeded();
    store.add_path(Path::new("p", "P", "a", "b")).unwrap();
    let patch = PathPatch {
        to: Some("ghost".into()),
        ..Default::default()
    };
    assert!(matches!(
        store.update_path("p", &patch),
        Err(EditorError::InvalidEndpoint { .. })
    ));
    assert_eq!(store.path("p").unwrap().to, "b");
}

#[test]
fn test_delete_missing_is_noop() {
    let mut store = seeded();
    let recorded = store.history().len();
    assert!(store.delete_node("ghost").is_none());
    assert!(!store.delete_path("ghost"));
    assert_eq!(store.history().len(), recorded);
}

#[test]
fn test_delete_node_cascades_to_incident_paths() {
    let mut store = seeded();
    store.add_node(Node::new("c", "C", Position::new(0.0, 100.0))).unwrap();
    store.add_path(Path::new("p1", "P1", "a", "b")).unwrap();
    store.add_path(Path::new("p2", "P2", "c", "a")).unwrap();
    store.add_path(Path::new("p3", "P3", "b", "c")).unwrap();

    let cascaded: Vec<_> = store.delete_node("a").unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(cascaded, ["p1", "p2"]);
    assert_eq!(store.path_ids(), ["p3"]);
    assert_eq!(store.paths_touching("a").count(), 0);
}

#[test]
fn test_bulk_setters_bypass_history() {
    let mut store = seeded();
    store.add_path(Path::new("p", "P", "a", "b")).unwrap();
    store.undo();
    assert!(store.can_redo());
    let recorded = store.history().len();

    store.set_nodes(vec![
        Node::new("a", "A", Position::new(1.0, 1.0)),
        Node::new("c", "C", Position::new(2.0, 2.0)),
    ]);
    store.set_paths(vec![
        Path::new("p1", "P1", "a", "c"),
        Path::new("p2", "P2", "a", "b"),
    ]);

    assert_eq!(store.history().len(), recorded);
    assert_eq!(store.node_ids(), ["a", "c"]);
    // p2 points at the vanished "b".
    assert_eq!(store.path_ids(), ["p1"]);
}

#[test]
fn test_set_nodes_drops_dangling_paths() {
    let mut store = seeded();
    store.add_path(Path::new("p", "P", "a", "b")).unwrap();
    store.set_nodes(vec![Node::new("a", "A", Position::default())]);
    assert_eq!(store.path_count(), 0);
}

#[test]
fn test_dirty_tracking() {
    let mut store = seeded();
    assert!(store.is_dirty());
    store.mark_clean();
    assert!(!store.is_dirty());

    store.undo();
    assert!(store.is_dirty());
    store.mark_clean();

    store.set_paths(Vec::new());
    assert!(store.is_dirty());
}

#[test]
fn test_clear_empties_graph_and_history() {
    let mut store = seeded();
    store.clear();
    assert_eq!(store.node_count(), 0);
    assert!(!store.can_undo());
    assert!(!store.can_redo());
}
