//! # Local Persistence
//!
//! The document (nodes, paths and the viewport) survives restarts through a small
//! key-value `StateStorage`. The command history is deliberately not persisted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use crate::Editor;
use crate::error::{EditorError, Result};
use crate::model::{Node, Path};
use crate::view::Viewport;

/// Key the editor state is stored under.
pub const STORAGE_NAMESPACE: &str = "robot-path-editor-storage";
/// Schema version of `SavedEditor`.
pub const STORAGE_VERSION: u32 = 1;

/// A serializable snapshot of the editor document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedEditor {
    pub version: u32,
    pub nodes: Vec<Node>,
    pub paths: Vec<Path>,
    #[serde(default)]
    pub viewport: Viewport,
}

/// String key-value storage.
pub trait StateStorage {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let target = self.path_for(key);
        // Write then rename so a crash never leaves a truncated document behind.
        let tmp = target.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}

/// In-memory storage, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl StateStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl Editor {
    /// Captures the current document.
    pub fn snapshot(&self) -> SavedEditor {
        SavedEditor {
            version: STORAGE_VERSION,
            nodes: self.store.nodes().cloned().collect(),
            paths: self.store.paths().cloned().collect(),
            viewport: self.view.viewport(),
        }
    }

    /// Writes the document to `storage` and marks it clean.
    pub fn save_to(&mut self, storage: &dyn StateStorage) -> Result<()> {
        let json = serde_json::to_string(&self.snapshot())?;
        storage.write(STORAGE_NAMESPACE, &json)?;
        self.store.mark_clean();
        tracing::info!(
            nodes = self.store.node_count(),
            paths = self.store.path_count(),
            "Editor state saved"
        );
        Ok(())
    }

    /// Loads the document from `storage`, replacing the current one.
    ///
    /// Returns `false` when nothing was stored yet.
    pub fn restore_from(&mut self, storage: &dyn StateStorage) -> Result<bool> {
        let Some(json) = storage.read(STORAGE_NAMESPACE)? else {
            return Ok(false);
        };
        let saved: SavedEditor = serde_json::from_str(&json)?;
        self.restore(saved)?;
        Ok(true)
    }

    /// Replaces the document with `saved`. History, selection and any pending gesture
    /// are reset; paths with missing endpoints are dropped.
    pub fn restore(&mut self, saved: SavedEditor) -> Result<()> {
        if saved.version != STORAGE_VERSION {
            return Err(EditorError::Validation(format!(
                "unsupported storage version {} (expected {STORAGE_VERSION})",
                saved.version
            )));
        }
        self.cancel_gesture();
        self.store.set_nodes(saved.nodes);
        self.store.set_paths(saved.paths);
        self.store.clear_history();
        self.store.mark_clean();
        self.view.set_viewport(saved.viewport);
        self.selection.clear();
        self.modes.cancel_connection();
        tracing::info!(
            nodes = self.store.node_count(),
            paths = self.store.path_count(),
            "Editor state restored"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;

    #[test]
    fn memory_storage_round_trips_document() {
        let storage = MemoryStorage::default();
        let mut editor = Editor::default();
        editor.replace_nodes(vec![Node::new("a", "A", Position::new(1.0, 2.0))]);
        assert!(editor.is_dirty());

        editor.save_to(&storage).unwrap();
        assert!(!editor.is_dirty());

        let mut restored = Editor::default();
        assert!(restored.restore_from(&storage).unwrap());
        assert_eq!(restored.snapshot(), editor.snapshot());
    }

    #[test]
    fn empty_storage_restores_nothing() {
        let mut editor = Editor::default();
        assert!(!editor.restore_from(&MemoryStorage::default()).unwrap());
    }

    #[test]
    fn rejects_unknown_version() {
        let mut editor = Editor::default();
        let saved = SavedEditor {
            version: 2,
            nodes: Vec::new(),
            paths: Vec::new(),
            viewport: Viewport::default(),
        };
        assert!(matches!(editor.restore(saved), Err(EditorError::Validation(_))));
    }
}
