//! # Core Data Models
//!
//! This module defines the waypoint graph: `Node`s (stations the robot can stop at)
//! and `Path`s (directed, weighted edges between them).
//!
//! Entities are stored in flat arenas (`SlotMap`) with an id index, the same way the
//! canvas keeps them: the opaque string ids are the stable identity shared with the
//! server, the arena keys are transient and never leave this module.

use chrono::{DateTime, Utc};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use slotmap::{SlotMap, new_key_type};
use std::collections::HashMap;

use crate::error::{EditorError, Result};

/// Opaque, globally unique node identity.
pub type NodeId = String;
/// Opaque, globally unique path identity.
pub type PathId = String;
/// Open string-keyed bag carried by nodes and paths.
pub type Metadata = Map<String, Value>;

new_key_type! {
    /// Arena key for a Node. Not stable across removal/reinsertion.
    pub struct NodeKey;
    /// Arena key for a Path.
    pub struct PathKey;
}

/// Canvas-space position of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    /// Height above the floor plan, when the site is multi-level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Planar part of the position.
    pub fn to_vec2(self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Builds a planar position, keeping `z` from `self`.
    pub fn with_planar(self, p: DVec2) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: self.z,
        }
    }
}

impl From<DVec2> for Position {
    fn from(p: DVec2) -> Self {
        Self::new(p.x, p.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    #[default]
    Normal,
    Start,
    End,
    Waypoint,
    Charging,
    Storage,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Active,
    Inactive,
    Error,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathType {
    #[default]
    Normal,
    Bidirectional,
    OneWay,
    Emergency,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStatus {
    #[default]
    Active,
    Inactive,
    Blocked,
}

/// A waypoint or station on the canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: NodeType,
    pub position: Position,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Metadata>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Creates an active `normal` node stamped with the current time.
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, position: Position) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeType::Normal,
            position,
            status: NodeStatus::Active,
            properties: None,
            metadata: Metadata::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_kind(mut self, kind: NodeType) -> Self {
        self.kind = kind;
        self
    }
}

/// A directed, weighted edge between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub id: PathId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: PathType,
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f64,
    #[serde(default)]
    pub status: PathStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Metadata>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Path {
    /// Creates an active `normal` path of weight 1.
    pub fn new(
        id: impl Into<PathId>,
        name: impl Into<String>,
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            kind: PathType::Normal,
            from: from.into(),
            to: to.into(),
            weight: 1.0,
            status: PathStatus::Active,
            properties: None,
            metadata: Metadata::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// True if `node` is either endpoint.
    pub fn touches(&self, node: &str) -> bool {
        self.from == node || self.to == node
    }
}

/// Partial update for a node. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl NodePatch {
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    fn apply(&self, node: &mut Node) {
        if let Some(name) = &self.name {
            node.name = name.clone();
        }
        if let Some(kind) = self.kind {
            node.kind = kind;
        }
        if let Some(position) = self.position {
            node.position = position;
        }
        if let Some(status) = self.status {
            node.status = status;
        }
        if let Some(properties) = &self.properties {
            node.properties = Some(properties.clone());
        }
        if let Some(metadata) = &self.metadata {
            node.metadata = metadata.clone();
        }
    }
}

/// Partial update for a path. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PathType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PathStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl PathPatch {
    fn apply(&self, path: &mut Path) {
        if let Some(name) = &self.name {
            path.name = name.clone();
        }
        if let Some(kind) = self.kind {
            path.kind = kind;
        }
        if let Some(from) = &self.from {
            path.from = from.clone();
        }
        if let Some(to) = &self.to {
            path.to = to.clone();
        }
        if let Some(weight) = self.weight {
            path.weight = weight;
        }
        if let Some(status) = self.status {
            path.status = status;
        }
        if let Some(properties) = &self.properties {
            path.properties = Some(properties.clone());
        }
        if let Some(metadata) = &self.metadata {
            path.metadata = metadata.clone();
        }
    }
}

/// Rejects weights that are negative or not a number.
pub fn validate_weight(weight: f64) -> Result<()> {
    if weight.is_nan() || weight < 0.0 {
        return Err(EditorError::Validation(format!(
            "path weight must be non-negative, got {weight}"
        )));
    }
    Ok(())
}

/// The raw graph state.
///
/// This struct only stores entities; it performs no history recording. The primitives
/// here are what `CommandHistory` replays when undoing and redoing, and what bulk
/// reconciliation with the server goes through.
#[derive(Clone, Debug, Default)]
pub struct GraphState {
    nodes: SlotMap<NodeKey, Node>,
    paths: SlotMap<PathKey, Path>,
    node_index: HashMap<NodeId, NodeKey>,
    path_index: HashMap<PathId, PathKey>,
    /// Draw order cache.
    /// Lower index = Background/Bottom.
    /// Higher index = Foreground/Top.
    draw_order: Vec<NodeKey>,
    /// Insertion order of paths.
    path_order: Vec<PathKey>,
    dirty: bool,
}

impl GraphState {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).and_then(|&key| self.nodes.get(key))
    }

    pub fn path(&self, id: &str) -> Option<&Path> {
        self.path_index.get(id).and_then(|&key| self.paths.get(key))
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn contains_path(&self, id: &str) -> bool {
        self.path_index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// Nodes from back to front (insertion order, adjusted by `bring_to_front`).
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.draw_order.iter().filter_map(|&key| self.nodes.get(key))
    }

    /// Nodes from front to back, the order hit tests run in.
    pub fn nodes_front_to_back(&self) -> impl Iterator<Item = &Node> {
        self.draw_order
            .iter()
            .rev()
            .filter_map(|&key| self.nodes.get(key))
    }

    /// Paths in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.path_order.iter().filter_map(|&key| self.paths.get(key))
    }

    /// Paths with `node` as either endpoint.
    pub fn paths_touching<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Path> + 'a {
        self.paths().filter(move |p| p.touches(node))
    }

    /// Both endpoints of the path, if they exist.
    pub fn endpoints(&self, path: &Path) -> Option<(&Node, &Node)> {
        Some((self.node(&path.from)?, self.node(&path.to)?))
    }

    /// Inserts a node, replacing any node with the same id in place.
    pub fn insert_node(&mut self, node: Node) -> NodeKey {
        if let Some(&key) = self.node_index.get(&node.id) {
            self.nodes[key] = node;
            return key;
        }
        let id = node.id.clone();
        let key = self.nodes.insert(node);
        self.node_index.insert(id, key);
        self.draw_order.push(key);
        key
    }

    /// Removes a node without touching its paths.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let key = self.node_index.remove(id)?;
        self.draw_order.retain(|&k| k != key);
        self.nodes.remove(key)
    }

    /// Removes a node and every path referencing it.
    ///
    /// Returns the removed node with the cascaded paths in insertion order.
    pub fn remove_node_cascading(&mut self, id: &str) -> Option<(Node, Vec<Path>)> {
        let node = self.remove_node(id)?;
        let cascaded = self.remove_paths_touching(id);
        Some((node, cascaded))
    }

    /// Inserts a path, replacing any path with the same id in place.
    ///
    /// Endpoints are not checked here; callers that accept user input go through
    /// `GraphStore::add_path`.
    pub fn insert_path(&mut self, path: Path) -> PathKey {
        if let Some(&key) = self.path_index.get(&path.id) {
            self.paths[key] = path;
            return key;
        }
        let id = path.id.clone();
        let key = self.paths.insert(path);
        self.path_index.insert(id, key);
        self.path_order.push(key);
        key
    }

    pub fn remove_path(&mut self, id: &str) -> Option<Path> {
        let key = self.path_index.remove(id)?;
        self.path_order.retain(|&k| k != key);
        self.paths.remove(key)
    }

    /// Removes every path with `node` as an endpoint.
    pub fn remove_paths_touching(&mut self, node: &str) -> Vec<Path> {
        let doomed: Vec<PathId> = self.paths_touching(node).map(|p| p.id.clone()).collect();
        doomed
            .iter()
            .filter_map(|id| self.remove_path(id))
            .collect()
    }

    /// Sets a node's position, returning the previous one.
    pub fn set_node_position(&mut self, id: &str, position: Position) -> Option<Position> {
        let key = *self.node_index.get(id)?;
        let node = self.nodes.get_mut(key)?;
        Some(std::mem::replace(&mut node.position, position))
    }

    pub(crate) fn patch_node(&mut self, id: &str, patch: &NodePatch) -> Option<&Node> {
        let key = *self.node_index.get(id)?;
        let node = self.nodes.get_mut(key)?;
        patch.apply(node);
        Some(node)
    }

    pub(crate) fn patch_path(&mut self, id: &str, patch: &PathPatch) -> Option<&Path> {
        let key = *self.path_index.get(id)?;
        let path = self.paths.get_mut(key)?;
        patch.apply(path);
        Some(path)
    }

    /// Moves a node to the top of the draw order.
    pub fn bring_to_front(&mut self, id: &str) {
        if let Some(&key) = self.node_index.get(id) {
            self.draw_order.retain(|&k| k != key);
            self.draw_order.push(key);
        }
    }

    /// Replaces the node set wholesale.
    ///
    /// Paths whose endpoints disappear are dropped so the referential invariant holds.
    pub fn replace_nodes(&mut self, nodes: Vec<Node>) {
        self.nodes.clear();
        self.node_index.clear();
        self.draw_order.clear();
        for node in nodes {
            self.insert_node(node);
        }

        let dangling: Vec<PathId> = self
            .paths()
            .filter(|p| !self.contains_node(&p.from) || !self.contains_node(&p.to))
            .map(|p| p.id.clone())
            .collect();
        if !dangling.is_empty() {
            tracing::debug!(count = dangling.len(), "Dropping paths left dangling by node replace");
        }
        for id in dangling {
            self.remove_path(&id);
        }
    }

    /// Replaces the path set wholesale, skipping paths with missing endpoints.
    pub fn replace_paths(&mut self, paths: Vec<Path>) {
        self.paths.clear();
        self.path_index.clear();
        self.path_order.clear();
        for path in paths {
            if self.contains_node(&path.from) && self.contains_node(&path.to) {
                self.insert_path(path);
            } else {
                tracing::warn!(
                    path_id = %path.id,
                    from = %path.from,
                    to = %path.to,
                    "Skipping path with missing endpoint"
                );
            }
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.paths.clear();
        self.node_index.clear();
        self.path_index.clear();
        self.draw_order.clear();
        self.path_order.clear();
    }

    /// True when the graph changed since the last `mark_clean`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
