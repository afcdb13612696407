use glam::DVec2;

use crate::Editor;
use crate::edit_mode::{EditMode, Intent};
use crate::input::{InputEvent, Key, Modifiers, PointerButton};
use crate::math::{self, Hit};
use crate::model::{NodeId, NodePatch, PathId, Position};
use crate::sync::SyncRequest;

/// Events emitted by the Editor logic to the host application.
#[derive(Clone, Debug, PartialEq)]
pub enum LogicEvent {
    /// The visual state has changed, requiring a repaint.
    RepaintNeeded,
    SelectionChanged,
    ModeChanged(EditMode),
    /// Add-path mode picked its source node.
    ConnectionStarted {
        source: NodeId,
    },
    ConnectionCancelled,
    NodeCreated(NodeId),
    PathCreated(PathId),
    NodeDeleted {
        id: NodeId,
        /// Paths removed along with the node.
        cascaded: Vec<PathId>,
    },
    PathDeleted(PathId),
    /// A node drag finished.
    NodeMoved {
        id: NodeId,
        from: Position,
        to: Position,
    },
}

/// The pointer gesture in progress.
///
/// A press stays a potential click until the pointer travels further than the drag
/// threshold. Clicks are resolved on release.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    /// Pressed on empty canvas.
    PressCanvas {
        /// Press position (Screen Space).
        origin: DVec2,
        /// Position the view was last panned to (Screen Space).
        last: DVec2,
        panning: bool,
    },
    /// Pressed on a node.
    PressNode {
        id: NodeId,
        origin_screen: DVec2,
        /// Node position when the press started.
        origin_position: Position,
        /// Offset from the node centre to the grab point (Canvas Space).
        grab_offset: DVec2,
        dragging: bool,
        additive: bool,
    },
    /// Pressed on a path.
    PressPath {
        id: PathId,
        additive: bool,
    },
}

impl Editor {
    /// Dispatches a raw input event.
    pub fn handle(&mut self, event: InputEvent) -> Vec<LogicEvent> {
        match event {
            InputEvent::PointerDown {
                position,
                button,
                modifiers,
            } => self.pointer_down(position, button, modifiers),
            InputEvent::PointerMove { position } => self.pointer_move(position),
            InputEvent::PointerUp { position, button } => self.pointer_up(position, button),
            InputEvent::Wheel { position, delta_y } => self.wheel(position, delta_y),
            InputEvent::KeyDown { key, modifiers } => self.key_down(key, modifiers),
        }
    }

    pub fn pointer_down(
        &mut self,
        position: DVec2,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> Vec<LogicEvent> {
        self.pointer = position;
        if button != PointerButton::Primary {
            return Vec::new();
        }

        let canvas = self.view.screen_to_canvas(position);
        let additive = modifiers.shift() && self.modes.mode() == EditMode::Select;

        self.gesture = match self.hit(canvas) {
            Some(Hit::Node(id)) => {
                let origin_position = match self.store.node(&id) {
                    Some(node) => node.position,
                    None => return Vec::new(),
                };
                Gesture::PressNode {
                    grab_offset: canvas - origin_position.to_vec2(),
                    id,
                    origin_screen: position,
                    origin_position,
                    dragging: false,
                    additive,
                }
            }
            Some(Hit::Path(id)) => Gesture::PressPath { id, additive },
            None => Gesture::PressCanvas {
                origin: position,
                last: position,
                panning: false,
            },
        };
        Vec::new()
    }

    pub fn pointer_move(&mut self, position: DVec2) -> Vec<LogicEvent> {
        self.pointer = position;
        let threshold = self.config.drag_threshold;
        let select_mode = self.modes.mode() == EditMode::Select;

        match &mut self.gesture {
            Gesture::PressCanvas {
                origin,
                last,
                panning,
            } => {
                if !*panning && select_mode && origin.distance(position) > threshold {
                    *panning = true;
                }
                if *panning {
                    let delta = position - *last;
                    *last = position;
                    self.view.pan_by(delta);
                    return vec![LogicEvent::RepaintNeeded];
                }
            }
            Gesture::PressNode {
                id,
                origin_screen,
                origin_position,
                grab_offset,
                dragging,
                ..
            } => {
                if !*dragging && select_mode && origin_screen.distance(position) > threshold {
                    *dragging = true;
                    self.store.bring_to_front(id);
                }
                if *dragging {
                    let target = self.view.screen_to_canvas(position) - *grab_offset;
                    self.store
                        .set_transient_position(id, origin_position.with_planar(target));
                    return vec![LogicEvent::RepaintNeeded];
                }
            }
            Gesture::PressPath { .. } | Gesture::Idle => {}
        }

        // Keep the connection preview following the pointer.
        if self.modes.connecting_from().is_some() {
            return vec![LogicEvent::RepaintNeeded];
        }
        Vec::new()
    }

    pub fn pointer_up(&mut self, position: DVec2, button: PointerButton) -> Vec<LogicEvent> {
        self.pointer = position;
        if button != PointerButton::Primary {
            return Vec::new();
        }

        let gesture = std::mem::take(&mut self.gesture);
        // The pressed entity may have been deleted (Delete key) before the release.
        let target_gone = match &gesture {
            Gesture::PressNode { id, .. } => self.store.node(id).is_none(),
            Gesture::PressPath { id, .. } => self.store.path(id).is_none(),
            Gesture::PressCanvas { .. } | Gesture::Idle => false,
        };
        if target_gone {
            return Vec::new();
        }

        match gesture {
            Gesture::Idle => Vec::new(),
            Gesture::PressCanvas { panning: true, .. } => Vec::new(),
            Gesture::PressCanvas { origin, .. } => {
                let at = self.view.screen_to_canvas(origin);
                let intents = self.modes.on_canvas_click(at, self.store.node_count());
                self.apply_intents(intents)
            }
            Gesture::PressNode {
                id,
                origin_position,
                dragging: true,
                ..
            } => self.finish_drag(id, origin_position),
            Gesture::PressNode {
                id, additive: true, ..
            } => {
                self.selection.toggle_node(&id);
                vec![LogicEvent::SelectionChanged, LogicEvent::RepaintNeeded]
            }
            Gesture::PressNode { id, .. } => {
                let intents = self.modes.on_node_click(&id, self.store.path_count());
                self.apply_intents(intents)
            }
            Gesture::PressPath { id, additive: true } => {
                self.selection.toggle_path(&id);
                vec![LogicEvent::SelectionChanged, LogicEvent::RepaintNeeded]
            }
            Gesture::PressPath { id, .. } => {
                let intents = self.modes.on_path_click(&id);
                self.apply_intents(intents)
            }
        }
    }

    /// Zooms around the pointer. Scrolling up (negative delta) zooms in.
    pub fn wheel(&mut self, position: DVec2, delta_y: f64) -> Vec<LogicEvent> {
        self.pointer = position;
        let steps = if delta_y < 0.0 {
            1
        } else if delta_y > 0.0 {
            -1
        } else {
            return Vec::new();
        };
        if self.view.zoom_at(position, steps) {
            vec![LogicEvent::RepaintNeeded]
        } else {
            Vec::new()
        }
    }

    pub fn key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<LogicEvent> {
        match key {
            Key::Delete | Key::Backspace => self.delete_selection(),
            Key::Z if modifiers.command() && modifiers.shift() => self.redo(),
            Key::Z if modifiers.command() => self.undo(),
            Key::Y if modifiers.command() => self.redo(),
            Key::Escape => {
                if self.modes.cancel_connection() {
                    vec![LogicEvent::ConnectionCancelled, LogicEvent::RepaintNeeded]
                } else {
                    Vec::new()
                }
            }
            Key::Z | Key::Y => Vec::new(),
        }
    }

    /// Line from the pending connection's source to the pointer (Canvas Space).
    pub fn connection_preview(&self) -> Option<(DVec2, DVec2)> {
        let source = self.modes.connecting_from()?;
        let node = self.store.node(source)?;
        Some((
            node.position.to_vec2(),
            self.view.screen_to_canvas(self.pointer),
        ))
    }

    /// Applies click intents in order.
    ///
    /// Store contract violations are logged and otherwise ignored.
    pub fn apply_intents(&mut self, intents: Vec<Intent>) -> Vec<LogicEvent> {
        let mut events = Vec::new();
        for intent in intents {
            match intent {
                Intent::ClearSelection => {
                    if !self.selection.is_empty() {
                        self.selection.clear();
                        events.push(LogicEvent::SelectionChanged);
                    }
                }
                Intent::SelectNode(id) => {
                    self.selection.select_node(id);
                    events.push(LogicEvent::SelectionChanged);
                }
                Intent::SelectPath(id) => {
                    self.selection.select_path(id);
                    events.push(LogicEvent::SelectionChanged);
                }
                Intent::CreateNode(node) => {
                    let request = SyncRequest::CreateNode { node: node.clone() };
                    let id = node.id.clone();
                    match self.store.add_node(node) {
                        Ok(()) => {
                            tracing::info!(node_id = %id, "Node created");
                            self.emit(request);
                            events.push(LogicEvent::NodeCreated(id));
                        }
                        Err(e) => tracing::warn!(node_id = %id, "Rejected node: {e}"),
                    }
                }
                Intent::BeginConnect(source) => {
                    events.push(LogicEvent::ConnectionStarted { source });
                }
                Intent::CancelConnect => events.push(LogicEvent::ConnectionCancelled),
                Intent::CreatePath(path) => {
                    let request = SyncRequest::CreatePath { path: path.clone() };
                    let id = path.id.clone();
                    match self.store.add_path(path) {
                        Ok(()) => {
                            tracing::info!(path_id = %id, "Path created");
                            self.emit(request);
                            events.push(LogicEvent::PathCreated(id));
                        }
                        Err(e) => tracing::warn!(path_id = %id, "Rejected path: {e}"),
                    }
                }
                Intent::DeleteNode(id) => events.extend(self.delete_node(&id)),
                Intent::DeletePath(id) => events.extend(self.delete_path(&id)),
            }
        }
        if !events.is_empty() {
            events.push(LogicEvent::RepaintNeeded);
        }
        events
    }

    /// Ends the gesture in progress as if the pointer were released where it is. Only an
    /// active drag has an effect: its final position is recorded and persisted.
    pub(crate) fn commit_gesture(&mut self) -> Vec<LogicEvent> {
        match std::mem::take(&mut self.gesture) {
            Gesture::PressNode {
                id,
                origin_position,
                dragging: true,
                ..
            } => self.finish_drag(id, origin_position),
            _ => Vec::new(),
        }
    }

    /// Abandons the gesture in progress. A dragged node returns to where the drag
    /// started, so nothing is recorded or sent. Returns true if a drag was rolled back.
    pub(crate) fn cancel_gesture(&mut self) -> bool {
        match std::mem::take(&mut self.gesture) {
            Gesture::PressNode {
                id,
                origin_position,
                dragging: true,
                ..
            } => {
                self.store.set_transient_position(&id, origin_position);
                tracing::debug!(node_id = %id, "Drag abandoned");
                true
            }
            _ => false,
        }
    }

    fn finish_drag(&mut self, id: NodeId, origin: Position) -> Vec<LogicEvent> {
        let Some(destination) = self.store.node(&id).map(|n| n.position) else {
            return Vec::new();
        };
        if let Err(e) = self.store.move_node(&id, origin, destination) {
            tracing::warn!(node_id = %id, "Drag ended on a missing node: {e}");
            return Vec::new();
        }
        self.emit(SyncRequest::UpdateNode {
            id: id.clone(),
            patch: NodePatch::position(destination),
        });
        tracing::debug!(node_id = %id, x = destination.x, y = destination.y, "Node moved");
        vec![
            LogicEvent::NodeMoved {
                id,
                from: origin,
                to: destination,
            },
            LogicEvent::RepaintNeeded,
        ]
    }

    fn hit(&self, canvas: DVec2) -> Option<Hit> {
        math::hit_test(
            self.store.state(),
            canvas,
            self.config.node_radius,
            self.config.path_hit_tolerance,
        )
    }
}
