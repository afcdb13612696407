//! # Edit Modes
//!
//! The toolbar mode decides what a click on the canvas means. The controller here does
//! not mutate anything itself: it turns clicks into `Intent`s that the Editor applies
//! to the store and the selection, in order.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Node, NodeId, Path, PathId, Position};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditMode {
    #[default]
    Select,
    AddNode,
    AddPath,
    Delete,
}

/// Sub-state of `EditMode::AddPath`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ConnectState {
    #[default]
    Idle,
    Connecting { source: NodeId },
}

/// A logical effect of a click, applied by the Editor.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    ClearSelection,
    SelectNode(NodeId),
    SelectPath(PathId),
    CreateNode(Node),
    BeginConnect(NodeId),
    CancelConnect,
    CreatePath(Path),
    DeleteNode(NodeId),
    DeletePath(PathId),
}

#[derive(Clone, Debug, Default)]
pub struct EditModeController {
    mode: EditMode,
    connect: ConnectState,
}

impl EditModeController {
    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn connect_state(&self) -> &ConnectState {
        &self.connect
    }

    /// The pending connection's source node, if any.
    pub fn connecting_from(&self) -> Option<&NodeId> {
        match &self.connect {
            ConnectState::Connecting { source } => Some(source),
            ConnectState::Idle => None,
        }
    }

    /// Switches mode. Any pending connection is dropped.
    pub fn set_mode(&mut self, mode: EditMode) {
        if self.mode != mode {
            tracing::debug!(from = ?self.mode, to = ?mode, "Edit mode changed");
        }
        self.mode = mode;
        self.connect = ConnectState::Idle;
    }

    /// Click on empty canvas at `at` (canvas space).
    pub fn on_canvas_click(&mut self, at: DVec2, node_count: usize) -> Vec<Intent> {
        let mut intents = vec![Intent::ClearSelection];
        match self.mode {
            EditMode::AddNode => {
                let node = Node::new(
                    Uuid::new_v4().to_string(),
                    format!("Node {}", node_count + 1),
                    Position::from(at),
                );
                intents.push(Intent::CreateNode(node));
            }
            EditMode::AddPath => {
                if self.cancel_connection() {
                    intents.push(Intent::CancelConnect);
                }
            }
            EditMode::Select | EditMode::Delete => {}
        }
        intents
    }

    pub fn on_node_click(&mut self, id: &str, path_count: usize) -> Vec<Intent> {
        match self.mode {
            EditMode::Select | EditMode::AddNode => vec![Intent::SelectNode(id.to_string())],
            EditMode::Delete => vec![Intent::DeleteNode(id.to_string())],
            EditMode::AddPath => match std::mem::take(&mut self.connect) {
                ConnectState::Idle => {
                    self.connect = ConnectState::Connecting {
                        source: id.to_string(),
                    };
                    vec![
                        Intent::SelectNode(id.to_string()),
                        Intent::BeginConnect(id.to_string()),
                    ]
                }
                ConnectState::Connecting { source } if source == id => {
                    vec![Intent::CancelConnect]
                }
                ConnectState::Connecting { source } => {
                    let path = Path::new(
                        Uuid::new_v4().to_string(),
                        format!("Path {}", path_count + 1),
                        source,
                        id,
                    );
                    vec![Intent::SelectNode(id.to_string()), Intent::CreatePath(path)]
                }
            },
        }
    }

    pub fn on_path_click(&mut self, id: &str) -> Vec<Intent> {
        match self.mode {
            EditMode::Delete => vec![Intent::DeletePath(id.to_string())],
            _ => vec![Intent::SelectPath(id.to_string())],
        }
    }

    /// Drops a pending connection. Returns `true` if there was one.
    pub fn cancel_connection(&mut self) -> bool {
        matches!(
            std::mem::take(&mut self.connect),
            ConnectState::Connecting { .. }
        )
    }

    /// Cancels a pending connection whose source no longer exists.
    pub fn prune(&mut self, exists: impl Fn(&str) -> bool) -> bool {
        let orphaned = matches!(
            &self.connect,
            ConnectState::Connecting { source } if !exists(source)
        );
        orphaned && self.cancel_connection()
    }
}
