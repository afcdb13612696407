//! # Remote Synchronisation
//!
//! The Editor never waits on the network. Every accepted mutation is turned into one or
//! more `SyncRequest`s, stamped with a sequence number and handed to a `SyncSink`. The
//! host reports the outcome back later through `Editor::report_outcome`.
//!
//! Sequence numbers are tracked per entity by the `SyncLedger`, so an outcome that
//! arrives after a newer request for the same entity can be recognised as stale.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::EntityKind;
use crate::history::{CascadeUndo, Command};
use crate::model::{GraphState, Node, NodeId, NodePatch, Path, PathId, PathPatch};

/// The entity a request is about.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntityRef {
    Node(NodeId),
    Path(PathId),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Node(_) => EntityKind::Node,
            EntityRef::Path(_) => EntityKind::Path,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            EntityRef::Node(id) | EntityRef::Path(id) => id,
        }
    }
}

/// One call against the remote API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum SyncRequest {
    CreateNode { node: Node },
    UpdateNode { id: NodeId, patch: NodePatch },
    DeleteNode { id: NodeId },
    CreatePath { path: Path },
    UpdatePath { id: PathId, patch: PathPatch },
    DeletePath { id: PathId },
}

impl SyncRequest {
    pub fn entity(&self) -> EntityRef {
        match self {
            SyncRequest::CreateNode { node } => EntityRef::Node(node.id.clone()),
            SyncRequest::UpdateNode { id, .. } | SyncRequest::DeleteNode { id } => {
                EntityRef::Node(id.clone())
            }
            SyncRequest::CreatePath { path } => EntityRef::Path(path.id.clone()),
            SyncRequest::UpdatePath { id, .. } | SyncRequest::DeletePath { id } => {
                EntityRef::Path(id.clone())
            }
        }
    }

    pub fn op(&self) -> &'static str {
        match self {
            SyncRequest::CreateNode { .. } => "createNode",
            SyncRequest::UpdateNode { .. } => "updateNode",
            SyncRequest::DeleteNode { .. } => "deleteNode",
            SyncRequest::CreatePath { .. } => "createPath",
            SyncRequest::UpdatePath { .. } => "updatePath",
            SyncRequest::DeletePath { .. } => "deletePath",
        }
    }
}

/// A request stamped with its per-entity sequence number.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncEnvelope {
    pub seq: u64,
    pub request: SyncRequest,
}

/// The settled result of a request, as reported by the host.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncOutcome {
    pub entity: EntityRef,
    pub seq: u64,
    pub result: Result<(), String>,
}

impl SyncOutcome {
    pub fn success(envelope: &SyncEnvelope) -> Self {
        Self {
            entity: envelope.request.entity(),
            seq: envelope.seq,
            result: Ok(()),
        }
    }

    pub fn failure(envelope: &SyncEnvelope, message: impl Into<String>) -> Self {
        Self {
            entity: envelope.request.entity(),
            seq: envelope.seq,
            result: Err(message.into()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// No newer request for the entity was issued after this one.
    Current,
    /// A newer request superseded this one.
    Stale,
}

/// Receives outgoing requests. Must not block.
pub trait SyncSink: Send {
    fn submit(&self, envelope: SyncEnvelope);

    /// Whether outcomes for submitted requests will be reported back. When not, the
    /// editor settles each request as soon as it is submitted.
    fn reports_outcomes(&self) -> bool {
        true
    }
}

/// Discards every request. Used when the editor runs offline.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl SyncSink for NullSink {
    fn submit(&self, envelope: SyncEnvelope) {
        tracing::trace!(
            seq = envelope.seq,
            op = envelope.request.op(),
            "Dropping sync request (offline)"
        );
    }

    fn reports_outcomes(&self) -> bool {
        false
    }
}

/// Buffers requests in memory. Clones share the buffer.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<SyncEnvelope>>>,
}

impl MemorySink {
    /// Drains everything submitted so far.
    pub fn take(&self) -> Vec<SyncEnvelope> {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *buffer)
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SyncSink for MemorySink {
    fn submit(&self, envelope: SyncEnvelope) {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(envelope);
    }
}

/// Tracks the latest sequence number issued per entity.
#[derive(Clone, Debug, Default)]
pub struct SyncLedger {
    next_seq: u64,
    latest: HashMap<EntityRef, u64>,
}

impl SyncLedger {
    /// Issues the next sequence number for `entity`. Numbers are unique across
    /// entities and strictly increasing.
    pub fn issue(&mut self, entity: EntityRef) -> u64 {
        self.next_seq += 1;
        self.latest.insert(entity, self.next_seq);
        self.next_seq
    }

    /// Classifies an outcome. The entity's entry is released once its latest request
    /// settles.
    pub fn settle(&mut self, entity: &EntityRef, seq: u64) -> Freshness {
        match self.latest.get(entity) {
            Some(&latest) if latest == seq => {
                self.latest.remove(entity);
                Freshness::Current
            }
            _ => Freshness::Stale,
        }
    }

    /// Number of entities with a request still in flight.
    pub fn pending(&self) -> usize {
        self.latest.len()
    }

    pub fn latest(&self, entity: &EntityRef) -> Option<u64> {
        self.latest.get(entity).copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A user-visible message queued by the editor.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub entity: Option<EntityRef>,
}

impl Command {
    /// Requests that bring the remote copy in line after this command was applied
    /// (on push or redo).
    ///
    /// Creations are only requested for entities that actually exist in `graph`.
    pub fn forward_requests(&self, graph: &GraphState) -> Vec<SyncRequest> {
        match self {
            Command::AddNode(node) => create_node(graph, &node.id).into_iter().collect(),
            Command::DeleteNode { node, .. } => vec![SyncRequest::DeleteNode {
                id: node.id.clone(),
            }],
            Command::UpdateNodePosition { id, new, .. } => vec![SyncRequest::UpdateNode {
                id: id.clone(),
                patch: NodePatch::position(*new),
            }],
            Command::AddPath(path) => create_path(graph, &path.id).into_iter().collect(),
            Command::DeletePath(path) => vec![SyncRequest::DeletePath {
                id: path.id.clone(),
            }],
        }
    }

    /// Requests that bring the remote copy in line after this command was undone.
    pub fn inverse_requests(&self, graph: &GraphState, cascade: CascadeUndo) -> Vec<SyncRequest> {
        match self {
            Command::AddNode(node) => vec![SyncRequest::DeleteNode {
                id: node.id.clone(),
            }],
            Command::DeleteNode { node, cascaded } => {
                let mut requests: Vec<SyncRequest> =
                    create_node(graph, &node.id).into_iter().collect();
                if cascade == CascadeUndo::Compound {
                    requests.extend(cascaded.iter().filter_map(|p| create_path(graph, &p.id)));
                }
                requests
            }
            Command::UpdateNodePosition { id, old, .. } => vec![SyncRequest::UpdateNode {
                id: id.clone(),
                patch: NodePatch::position(*old),
            }],
            Command::AddPath(path) => vec![SyncRequest::DeletePath {
                id: path.id.clone(),
            }],
            Command::DeletePath(path) => create_path(graph, &path.id).into_iter().collect(),
        }
    }
}

fn create_node(graph: &GraphState, id: &str) -> Option<SyncRequest> {
    graph
        .node(id)
        .map(|node| SyncRequest::CreateNode { node: node.clone() })
}

fn create_path(graph: &GraphState, id: &str) -> Option<SyncRequest> {
    graph
        .path(id)
        .map(|path| SyncRequest::CreatePath { path: path.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;

    #[test]
    fn ledger_flags_superseded_outcomes() {
        let mut ledger = SyncLedger::default();
        let node = EntityRef::Node("a".into());

        let first = ledger.issue(node.clone());
        let second = ledger.issue(node.clone());
        let other = ledger.issue(EntityRef::Path("p".into()));
        assert!(first < second && second < other);

        assert_eq!(ledger.settle(&node, first), Freshness::Stale);
        assert_eq!(ledger.settle(&node, second), Freshness::Current);
        assert_eq!(ledger.pending(), 1);
        // Already settled.
        assert_eq!(ledger.settle(&node, second), Freshness::Stale);
    }

    #[test]
    fn memory_sink_clones_share_buffer() {
        let sink = MemorySink::default();
        let handle = sink.clone();
        sink.submit(SyncEnvelope {
            seq: 1,
            request: SyncRequest::DeleteNode { id: "a".into() },
        });
        assert_eq!(handle.len(), 1);
        assert_eq!(handle.take()[0].request.entity(), EntityRef::Node("a".into()));
        assert!(sink.is_empty());
    }

    #[test]
    fn inverse_of_node_delete_recreates_only_what_was_restored() {
        let mut graph = GraphState::default();
        graph.insert_node(Node::new("a", "A", Position::default()));
        graph.insert_node(Node::new("b", "B", Position::default()));
        let path = Path::new("p", "P", "a", "b");
        graph.insert_path(path.clone());

        let command = Command::DeleteNode {
            node: Node::new("a", "A", Position::default()),
            cascaded: vec![path],
        };

        let requests = command.inverse_requests(&graph, CascadeUndo::Compound);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].op(), "createPath");

        graph.remove_path("p");
        let requests = command.inverse_requests(&graph, CascadeUndo::NodeOnly);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].op(), "createNode");
    }
}
