//! # PathCanvas
//!
//! `path_canvas` is the headless editing core of the waypoint path editor. It owns the
//! graph of nodes (robot stations) and paths (directed, weighted edges), interprets raw
//! pointer and keyboard input against it, and leaves drawing to the host application.
//!
//! ## Core Architecture
//! - **Model (`src/model.rs`)**: Stores the graph in flat arenas (SlotMap) with an id index.
//! - **Store (`src/store.rs`)**: The mutation API; records every change as a `Command`.
//! - **History (`src/history.rs`)**: Bounded undo/redo over those commands.
//! - **View (`src/view.rs`)**: Handles coordinate transformation (Canvas <-> Screen).
//! - **Interaction (`src/interaction.rs`)**: The pointer/keyboard state machine.
//! - **Sync (`src/sync.rs`)**: Fire-and-forget persistence requests with staleness tracking.

pub mod config;
pub mod edit_mode;
pub mod error;
pub mod history;
pub mod input;
pub mod interaction;
pub mod math;
pub mod model;
pub mod persistence;
pub mod selection;
pub mod store;
pub mod sync;
pub mod view;

pub use glam::DVec2;

use edit_mode::{EditMode, EditModeController};
use interaction::Gesture;
use model::{Node, NodePatch, Path, PathPatch};
use selection::SelectionModel;
use store::GraphStore;
use sync::{
    EntityRef, Freshness, Notification, NotificationLevel, NullSink, SyncEnvelope, SyncLedger,
    SyncOutcome, SyncRequest, SyncSink,
};
use view::{View, Viewport};

// Re-exports for convenience
pub use config::CanvasConfig;
pub use error::{EditorError, Result};
pub use interaction::LogicEvent;

/// The main entry point for the library.
///
/// The `Editor` holds the document (nodes, paths, history), the transient editing state
/// (mode, selection, gesture in progress) and the viewport. Every handler runs to
/// completion synchronously; remote persistence is handed to the `SyncSink`.
pub struct Editor {
    /// Configuration settings.
    pub config: CanvasConfig,
    /// The Viewport system handling coordinate transforms.
    pub view: View,
    store: GraphStore,
    selection: SelectionModel,
    modes: EditModeController,
    gesture: Gesture,
    ledger: SyncLedger,
    sink: Box<dyn SyncSink>,
    notifications: Vec<Notification>,
    /// Last known pointer position (Screen Space).
    pointer: DVec2,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl Editor {
    /// Creates an offline editor: sync requests are discarded.
    pub fn new(config: CanvasConfig) -> Self {
        Self::with_sink(config, NullSink)
    }

    pub fn with_sink(config: CanvasConfig, sink: impl SyncSink + 'static) -> Self {
        Self {
            view: View::from_config(&config),
            store: GraphStore::new(config.history_limit, config.cascade_undo),
            selection: SelectionModel::default(),
            modes: EditModeController::default(),
            gesture: Gesture::Idle,
            ledger: SyncLedger::default(),
            sink: Box::new(sink),
            notifications: Vec::new(),
            pointer: DVec2::ZERO,
            config,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn mode(&self) -> EditMode {
        self.modes.mode()
    }

    pub fn modes(&self) -> &EditModeController {
        &self.modes
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn ledger(&self) -> &SyncLedger {
        &self.ledger
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn viewport(&self) -> Viewport {
        self.view.viewport()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> Vec<LogicEvent> {
        self.view.set_viewport(viewport);
        vec![LogicEvent::RepaintNeeded]
    }

    pub fn reset_view(&mut self) -> Vec<LogicEvent> {
        self.view.reset();
        vec![LogicEvent::RepaintNeeded]
    }

    /// Switches the edit mode. A pending connection is abandoned; a drag in progress is
    /// committed where the pointer left it.
    pub fn set_mode(&mut self, mode: EditMode) -> Vec<LogicEvent> {
        let mut events = self.commit_gesture();
        if self.modes.connecting_from().is_some() {
            events.push(LogicEvent::ConnectionCancelled);
        }
        self.modes.set_mode(mode);
        events.push(LogicEvent::ModeChanged(mode));
        events.push(LogicEvent::RepaintNeeded);
        events
    }

    /// Undoes the latest command and re-synchronises the remote copy.
    pub fn undo(&mut self) -> Vec<LogicEvent> {
        let rolled_back = self.cancel_gesture();
        let cascade = self.store.history().cascade();
        let Some(command) = self.store.undo().cloned() else {
            return repaint_if(rolled_back);
        };
        tracing::info!(command = command.kind(), "Undo");
        for request in command.inverse_requests(self.store.state(), cascade) {
            self.emit(request);
        }
        self.prune_transient()
    }

    /// Re-applies the next command and re-synchronises the remote copy.
    pub fn redo(&mut self) -> Vec<LogicEvent> {
        let rolled_back = self.cancel_gesture();
        let Some(command) = self.store.redo().cloned() else {
            return repaint_if(rolled_back);
        };
        tracing::info!(command = command.kind(), "Redo");
        for request in command.forward_requests(self.store.state()) {
            self.emit(request);
        }
        self.prune_transient()
    }

    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.can_redo()
    }

    /// Deletes the selected nodes, or the selected paths when no node is selected.
    pub fn delete_selection(&mut self) -> Vec<LogicEvent> {
        let nodes: Vec<_> = self.selection.nodes().cloned().collect();
        let mut events = Vec::new();
        if !nodes.is_empty() {
            for id in nodes {
                events.extend(self.delete_node(&id));
            }
        } else {
            let paths: Vec<_> = self.selection.paths().cloned().collect();
            for id in paths {
                events.extend(self.delete_path(&id));
            }
        }
        if events.is_empty() {
            return events;
        }
        self.selection.clear();
        events.push(LogicEvent::SelectionChanged);
        events.push(LogicEvent::RepaintNeeded);
        events
    }

    /// Empties the canvas locally and forgets the history. Nothing is sent remotely.
    pub fn clear_canvas(&mut self) -> Vec<LogicEvent> {
        tracing::info!(
            nodes = self.store.node_count(),
            paths = self.store.path_count(),
            "Clearing canvas"
        );
        self.cancel_gesture();
        self.store.clear();
        self.reset_transient();
        vec![LogicEvent::SelectionChanged, LogicEvent::RepaintNeeded]
    }

    /// Absorbs a server-computed node set (layout, template). Not undoable.
    pub fn replace_nodes(&mut self, nodes: Vec<Node>) -> Vec<LogicEvent> {
        self.cancel_gesture();
        self.store.set_nodes(nodes);
        self.prune_transient()
    }

    /// Absorbs a server-computed path set (path generation, template). Not undoable.
    pub fn replace_paths(&mut self, paths: Vec<Path>) -> Vec<LogicEvent> {
        self.cancel_gesture();
        self.store.set_paths(paths);
        self.prune_transient()
    }

    /// Edits node fields from a property panel and persists the change.
    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<()> {
        self.store.update_node(id, &patch)?;
        self.emit(SyncRequest::UpdateNode {
            id: id.to_string(),
            patch,
        });
        Ok(())
    }

    /// Edits path fields from a property panel and persists the change.
    pub fn update_path(&mut self, id: &str, patch: PathPatch) -> Result<()> {
        self.store.update_path(id, &patch)?;
        self.emit(SyncRequest::UpdatePath {
            id: id.to_string(),
            patch,
        });
        Ok(())
    }

    /// Feeds back the outcome of a sync request.
    ///
    /// Failures of the latest request for an entity become notifications; local state is
    /// never rolled back. Stale outcomes are only logged.
    pub fn report_outcome(&mut self, outcome: SyncOutcome) -> Freshness {
        let freshness = self.ledger.settle(&outcome.entity, outcome.seq);
        match (&outcome.result, freshness) {
            (Ok(()), _) => {
                tracing::debug!(
                    entity = ?outcome.entity,
                    seq = outcome.seq,
                    ?freshness,
                    "Sync acknowledged"
                );
            }
            (Err(message), Freshness::Current) => {
                let error = EditorError::Network {
                    kind: outcome.entity.kind(),
                    id: outcome.entity.id().to_string(),
                    message: message.clone(),
                };
                tracing::warn!(seq = outcome.seq, "{error}");
                self.notifications.push(Notification {
                    level: NotificationLevel::Error,
                    message: error.to_string(),
                    entity: Some(outcome.entity),
                });
            }
            (Err(message), Freshness::Stale) => {
                tracing::debug!(
                    entity = ?outcome.entity,
                    seq = outcome.seq,
                    %message,
                    "Ignoring stale sync failure"
                );
            }
        }
        freshness
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Stamps a request and hands it to the sink.
    pub(crate) fn emit(&mut self, request: SyncRequest) -> u64 {
        let entity: EntityRef = request.entity();
        let seq = self.ledger.issue(entity.clone());
        tracing::debug!(seq, op = request.op(), "Queueing sync request");
        self.sink.submit(SyncEnvelope { seq, request });
        if !self.sink.reports_outcomes() {
            self.ledger.settle(&entity, seq);
        }
        seq
    }

    pub(crate) fn delete_node(&mut self, id: &str) -> Vec<LogicEvent> {
        let Some(cascaded) = self.store.delete_node(id) else {
            return Vec::new();
        };
        self.emit(SyncRequest::DeleteNode { id: id.to_string() });
        self.selection.prune(self.store.state());
        let mut events = Vec::new();
        if self.modes.prune(|n| self.store.state().contains_node(n)) {
            events.push(LogicEvent::ConnectionCancelled);
        }
        events.push(LogicEvent::NodeDeleted {
            id: id.to_string(),
            cascaded: cascaded.into_iter().map(|p| p.id).collect(),
        });
        events
    }

    pub(crate) fn delete_path(&mut self, id: &str) -> Vec<LogicEvent> {
        if !self.store.delete_path(id) {
            return Vec::new();
        }
        self.emit(SyncRequest::DeletePath { id: id.to_string() });
        self.selection.prune(self.store.state());
        vec![LogicEvent::PathDeleted(id.to_string())]
    }

    /// Drops the selection and pending connection entries that refer to entities which
    /// no longer exist.
    fn prune_transient(&mut self) -> Vec<LogicEvent> {
        let mut events = Vec::new();
        if self.selection.prune(self.store.state()) {
            events.push(LogicEvent::SelectionChanged);
        }
        let graph = self.store.state();
        if self.modes.prune(|n| graph.contains_node(n)) {
            events.push(LogicEvent::ConnectionCancelled);
        }
        events.push(LogicEvent::RepaintNeeded);
        events
    }

    fn reset_transient(&mut self) {
        self.selection.clear();
        self.modes.cancel_connection();
    }
}

fn repaint_if(needed: bool) -> Vec<LogicEvent> {
    if needed {
        vec![LogicEvent::RepaintNeeded]
    } else {
        Vec::new()
    }
}
