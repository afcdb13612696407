use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::model::{GraphState, Node, NodeId, Path, Position};

/// How undoing a node deletion treats the paths removed with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeUndo {
    /// Undo restores the node only; its cascaded paths stay deleted.
    #[default]
    NodeOnly,
    /// Undo restores the node and its cascaded paths as one step.
    Compound,
}

/// One reversible mutation of the graph.
///
/// Each variant carries enough to replay it forward and to invert it. A command is
/// never modified after construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Command {
    AddNode(Node),
    DeleteNode {
        node: Node,
        /// Paths removed by the cascade, in the order they were stored.
        cascaded: Vec<Path>,
    },
    UpdateNodePosition {
        id: NodeId,
        old: Position,
        new: Position,
    },
    AddPath(Path),
    DeletePath(Path),
}

impl Command {
    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::AddNode(_) => "addNode",
            Command::DeleteNode { .. } => "deleteNode",
            Command::UpdateNodePosition { .. } => "updateNodePosition",
            Command::AddPath(_) => "addPath",
            Command::DeletePath(_) => "deletePath",
        }
    }

    /// Re-applies the mutation.
    pub fn apply(&self, graph: &mut GraphState) {
        match self {
            Command::AddNode(node) => {
                graph.insert_node(node.clone());
            }
            Command::DeleteNode { node, .. } => {
                graph.remove_node_cascading(&node.id);
            }
            Command::UpdateNodePosition { id, new, .. } => {
                graph.set_node_position(id, *new);
            }
            Command::AddPath(path) => insert_if_connected(graph, path),
            Command::DeletePath(path) => {
                graph.remove_path(&path.id);
            }
        }
    }

    /// Applies the inverse of the mutation.
    pub fn revert(&self, graph: &mut GraphState, cascade: CascadeUndo) {
        match self {
            // Cascade as well so no path is left pointing at the removed node.
            Command::AddNode(node) => {
                graph.remove_node_cascading(&node.id);
            }
            Command::DeleteNode { node, cascaded } => {
                graph.insert_node(node.clone());
                if cascade == CascadeUndo::Compound {
                    for path in cascaded {
                        insert_if_connected(graph, path);
                    }
                }
            }
            Command::UpdateNodePosition { id, old, .. } => {
                graph.set_node_position(id, *old);
            }
            Command::AddPath(path) => {
                graph.remove_path(&path.id);
            }
            Command::DeletePath(path) => insert_if_connected(graph, path),
        }
    }
}

fn insert_if_connected(graph: &mut GraphState, path: &Path) {
    if graph.contains_node(&path.from) && graph.contains_node(&path.to) {
        graph.insert_path(path.clone());
    } else {
        tracing::warn!(path_id = %path.id, "Path endpoints missing, not restoring");
    }
}

/// Manages the Undo/Redo history of the graph.
///
/// This implementation uses the Command pattern: a bounded, linear sequence of
/// commands with a cursor. Entries before the cursor are undoable, entries at or
/// after it are redoable. Branching redo is not supported.
#[derive(Clone, Debug)]
pub struct CommandHistory {
    entries: VecDeque<Command>,
    /// Number of applied commands (0 = nothing to undo).
    cursor: usize,
    limit: usize,
    cascade: CascadeUndo,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

impl CommandHistory {
    /// Creates a history holding at most `limit` commands (at least one).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            entries: VecDeque::with_capacity(limit),
            cursor: 0,
            limit,
            cascade: CascadeUndo::default(),
        }
    }

    pub fn with_cascade(mut self, cascade: CascadeUndo) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn cascade(&self) -> CascadeUndo {
        self.cascade
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of commands currently applied.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Commands in order, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &Command> {
        self.entries.iter()
    }

    /// Records a command that has already been applied.
    ///
    /// Anything redoable is discarded. When the limit is exceeded the oldest entry is
    /// evicted and the cursor shifts with it.
    pub fn push(&mut self, command: Command) {
        self.entries.truncate(self.cursor);
        self.entries.push_back(command);
        self.cursor = self.entries.len();

        if self.entries.len() > self.limit {
            self.entries.pop_front();
            self.cursor -= 1;
        }
    }

    /// Performs Undo.
    ///
    /// Returns the command that was reverted, or `None` if there was nothing to undo.
    pub fn undo(&mut self, graph: &mut GraphState) -> Option<&Command> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        let command = &self.entries[self.cursor];
        command.revert(graph, self.cascade);
        graph.mark_dirty();
        tracing::debug!(command = command.kind(), position = self.cursor, "Undo");
        Some(command)
    }

    /// Performs Redo.
    ///
    /// Returns the command that was re-applied, or `None` if there was nothing to redo.
    pub fn redo(&mut self, graph: &mut GraphState) -> Option<&Command> {
        let command = self.entries.get(self.cursor)?;
        command.apply(graph);
        graph.mark_dirty();
        self.cursor += 1;
        tracing::debug!(command = command.kind(), position = self.cursor, "Redo");
        Some(command)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
