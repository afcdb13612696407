//! # Graph Store
//!
//! `GraphStore` is the authoritative client copy of the graph. It pairs the raw
//! `GraphState` with the `CommandHistory`: every user-level mutation goes through
//! here, is validated, applied, and recorded as a `Command` in one step.
//!
//! Bulk setters (`set_nodes`, `set_paths`) exist for reconciling with the server and
//! are deliberately not undoable.

use crate::error::{EditorError, EntityKind, Result};
use crate::history::{CascadeUndo, Command, CommandHistory};
use crate::model::{
    GraphState, Node, NodeId, NodePatch, Path, PathId, PathPatch, Position, validate_weight,
};

#[derive(Clone, Debug, Default)]
pub struct GraphStore {
    state: GraphState,
    history: CommandHistory,
}

impl GraphStore {
    pub fn new(history_limit: usize, cascade: CascadeUndo) -> Self {
        Self {
            state: GraphState::default(),
            history: CommandHistory::new(history_limit).with_cascade(cascade),
        }
    }

    /// Read access to the raw graph.
    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.state.node(id)
    }

    pub fn path(&self, id: &str) -> Option<&Path> {
        self.state.path(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.state.nodes()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.state.paths()
    }

    pub fn paths_touching<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Path> + 'a {
        self.state.paths_touching(id)
    }

    pub fn node_count(&self) -> usize {
        self.state.node_count()
    }

    pub fn path_count(&self) -> usize {
        self.state.path_count()
    }

    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    pub fn mark_clean(&mut self) {
        self.state.mark_clean();
    }

    /// Replaces all nodes with the server's copy. Not recorded in history.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.state.replace_nodes(nodes);
        self.state.mark_dirty();
    }

    /// Replaces all paths with the server's copy. Not recorded in history.
    pub fn set_paths(&mut self, paths: Vec<Path>) {
        self.state.replace_paths(paths);
        self.state.mark_dirty();
    }

    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.state.contains_node(&node.id) {
            return Err(EditorError::DuplicateId {
                kind: EntityKind::Node,
                id: node.id,
            });
        }
        self.state.insert_node(node.clone());
        self.record(Command::AddNode(node));
        Ok(())
    }

    /// Merges `patch` into the node.
    ///
    /// Only position changes are recorded for undo; other fields are applied but not
    /// tracked.
    pub fn update_node(&mut self, id: &str, patch: &NodePatch) -> Result<&Node> {
        let old = self
            .state
            .node(id)
            .map(|n| n.position)
            .ok_or_else(|| not_found(EntityKind::Node, id))?;

        self.state.patch_node(id, patch);
        self.state.mark_dirty();
        if let Some(new) = patch.position {
            self.history.push(Command::UpdateNodePosition {
                id: id.to_string(),
                old,
                new,
            });
        }
        self.state
            .node(id)
            .ok_or_else(|| not_found(EntityKind::Node, id))
    }

    /// Commits a drag: moves the node to `destination` and records the move from
    /// `origin`, which may differ from the node's current (transient) position.
    pub fn move_node(&mut self, id: &str, origin: Position, destination: Position) -> Result<()> {
        self.state
            .set_node_position(id, destination)
            .ok_or_else(|| not_found(EntityKind::Node, id))?;
        self.record(Command::UpdateNodePosition {
            id: id.to_string(),
            old: origin,
            new: destination,
        });
        Ok(())
    }

    /// Sets a node's position without recording anything. Used while dragging.
    pub fn set_transient_position(&mut self, id: &str, position: Position) -> bool {
        self.state.set_node_position(id, position).is_some()
    }

    /// Deletes a node and every path that references it.
    ///
    /// Returns the removed paths; `None` if the node did not exist.
    pub fn delete_node(&mut self, id: &str) -> Option<Vec<Path>> {
        let (node, cascaded) = self.state.remove_node_cascading(id)?;
        tracing::debug!(node_id = %id, cascaded = cascaded.len(), "Node deleted");
        self.record(Command::DeleteNode {
            node,
            cascaded: cascaded.clone(),
        });
        Some(cascaded)
    }

    pub fn add_path(&mut self, path: Path) -> Result<()> {
        for endpoint in [&path.from, &path.to] {
            if !self.state.contains_node(endpoint) {
                return Err(EditorError::InvalidEndpoint {
                    path: path.id.clone(),
                    node: endpoint.clone(),
                });
            }
        }
        if self.state.contains_path(&path.id) {
            return Err(EditorError::DuplicateId {
                kind: EntityKind::Path,
                id: path.id,
            });
        }
        validate_weight(path.weight)?;
        self.state.insert_path(path.clone());
        self.record(Command::AddPath(path));
        Ok(())
    }

    /// Merges `patch` into the path. Not recorded for undo.
    pub fn update_path(&mut self, id: &str, patch: &PathPatch) -> Result<&Path> {
        if !self.state.contains_path(id) {
            return Err(not_found(EntityKind::Path, id));
        }
        for endpoint in [&patch.from, &patch.to].into_iter().flatten() {
            if !self.state.contains_node(endpoint) {
                return Err(EditorError::InvalidEndpoint {
                    path: id.to_string(),
                    node: endpoint.clone(),
                });
            }
        }
        if let Some(weight) = patch.weight {
            validate_weight(weight)?;
        }
        self.state.mark_dirty();
        self.state
            .patch_path(id, patch)
            .ok_or_else(|| not_found(EntityKind::Path, id))
    }

    /// Deletes a path. Returns `false` if it did not exist.
    pub fn delete_path(&mut self, id: &str) -> bool {
        match self.state.remove_path(id) {
            Some(path) => {
                self.record(Command::DeletePath(path));
                true
            }
            None => false,
        }
    }

    /// Reverts the latest command. See `CommandHistory::undo`.
    pub fn undo(&mut self) -> Option<&Command> {
        self.history.undo(&mut self.state)
    }

    /// Re-applies the next command. See `CommandHistory::redo`.
    pub fn redo(&mut self) -> Option<&Command> {
        self.history.redo(&mut self.state)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Moves a node to the top of the draw order.
    pub fn bring_to_front(&mut self, id: &str) {
        self.state.bring_to_front(id);
    }

    /// Empties the canvas and forgets the history.
    pub fn clear(&mut self) {
        self.state.clear();
        self.state.mark_dirty();
        self.history.clear();
    }

    /// Forgets the history without touching the graph.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Ids of every node, in draw order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.state.nodes().map(|n| n.id.clone()).collect()
    }

    /// Ids of every path, in insertion order.
    pub fn path_ids(&self) -> Vec<PathId> {
        self.state.paths().map(|p| p.id.clone()).collect()
    }

    fn record(&mut self, command: Command) {
        self.state.mark_dirty();
        self.history.push(command);
    }
}

fn not_found(kind: EntityKind, id: &str) -> EditorError {
    EditorError::NotFound {
        kind,
        id: id.to_string(),
    }
}
