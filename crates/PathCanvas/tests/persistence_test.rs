use path_canvas::model::{Node, NodeType, Path, Position};
use path_canvas::persistence::{
    FileStorage, STORAGE_NAMESPACE, STORAGE_VERSION, SavedEditor, StateStorage,
};
use path_canvas::view::Viewport;
use path_canvas::{CanvasConfig, Editor};

fn populated_editor() -> Editor {
    let mut editor = Editor::new(CanvasConfig::default());
    editor.replace_nodes(vec![
        Node::new("a", "Dock", Position::new(10.0, 20.0)).with_kind(NodeType::Charging),
        Node::new("b", "Shelf", Position::new(200.0, 20.0)),
    ]);
    editor.replace_paths(vec![Path::new("p", "Aisle", "a", "b").with_weight(3.5)]);
    editor.set_viewport(Viewport {
        x: 15.0,
        y: -5.0,
        scale: 1.5,
    });
    editor
}

#[test]
fn test_file_storage_save_restore_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());

    let mut editor = populated_editor();
    editor.save_to(&storage).unwrap();
    assert!(storage.path_for(STORAGE_NAMESPACE).exists());
    assert!(!editor.is_dirty());

    let mut restored = Editor::new(CanvasConfig::default());
    assert!(restored.restore_from(&storage).unwrap());

    assert_eq!(restored.snapshot(), editor.snapshot());
    assert_eq!(restored.viewport().scale, 1.5);
    assert_eq!(restored.store().node("a").unwrap().kind, NodeType::Charging);
    assert!(!restored.can_undo(), "history is not persisted");
    assert!(!restored.is_dirty());
}

#[test]
fn test_missing_file_restores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("never-created"));
    let mut editor = populated_editor();
    assert!(!editor.restore_from(&storage).unwrap());
    assert_eq!(editor.store().node_count(), 2);
}

#[test]
fn test_restore_drops_dangling_paths_and_clamps_viewport() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    let saved = SavedEditor {
        version: STORAGE_VERSION,
        nodes: vec![Node::new("a", "A", Position::default())],
        paths: vec![Path::new("p", "P", "a", "gone")],
        viewport: Viewport {
            x: 0.0,
            y: 0.0,
            scale: 50.0,
        },
    };
    storage
        .write(STORAGE_NAMESPACE, &serde_json::to_string(&saved).unwrap())
        .unwrap();

    let mut editor = Editor::default();
    editor.restore_from(&storage).unwrap();
    assert_eq!(editor.store().path_count(), 0);
    assert_eq!(editor.viewport().scale, 5.0);
}

#[test]
fn test_saved_format_is_stable_json() {
    let editor = populated_editor();
    let json = serde_json::to_value(editor.snapshot()).unwrap();

    assert_eq!(json["version"], 1);
    assert_eq!(json["nodes"][0]["type"], "charging");
    assert_eq!(json["paths"][0]["from"], "a");
    assert_eq!(json["paths"][0]["weight"], 3.5);
    assert_eq!(json["viewport"]["scale"], 1.5);
}

#[test]
fn test_corrupt_document_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    storage.write(STORAGE_NAMESPACE, "{ not json").unwrap();

    let mut editor = populated_editor();
    assert!(editor.restore_from(&storage).is_err());
    assert_eq!(editor.store().node_count(), 2);
}
