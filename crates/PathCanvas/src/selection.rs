use std::collections::BTreeSet;

use crate::model::{GraphState, NodeId, PathId};

/// The set of selected nodes and paths.
///
/// Single selection (`select_node` / `select_path`) is exclusive across both kinds.
/// The additive operations used by shift-click never clear the other kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionModel {
    nodes: BTreeSet<NodeId>,
    paths: BTreeSet<PathId>,
}

impl SelectionModel {
    /// Selects exactly one node.
    pub fn select_node(&mut self, id: impl Into<NodeId>) {
        self.clear();
        self.nodes.insert(id.into());
    }

    /// Selects exactly one path.
    pub fn select_path(&mut self, id: impl Into<PathId>) {
        self.clear();
        self.paths.insert(id.into());
    }

    /// Adds or removes a node from the batch selection.
    pub fn toggle_node(&mut self, id: &str) {
        if !self.nodes.remove(id) {
            self.nodes.insert(id.to_string());
        }
    }

    pub fn toggle_path(&mut self, id: &str) {
        if !self.paths.remove(id) {
            self.paths.insert(id.to_string());
        }
    }

    pub fn extend_nodes<I: IntoIterator<Item = NodeId>>(&mut self, ids: I) {
        self.nodes.extend(ids);
    }

    pub fn extend_paths<I: IntoIterator<Item = PathId>>(&mut self, ids: I) {
        self.paths.extend(ids);
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.paths.clear();
    }

    /// The selected node when exactly one node is selected.
    pub fn selected_node(&self) -> Option<&NodeId> {
        match self.nodes.len() {
            1 => self.nodes.iter().next(),
            _ => None,
        }
    }

    /// The selected path when exactly one path is selected.
    pub fn selected_path(&self) -> Option<&PathId> {
        match self.paths.len() {
            1 => self.paths.iter().next(),
            _ => None,
        }
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    pub fn contains_path(&self, id: &str) -> bool {
        self.paths.contains(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathId> {
        self.paths.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.paths.is_empty()
    }

    /// Drops ids that no longer exist in `graph`. Returns `true` if anything changed.
    pub fn prune(&mut self, graph: &GraphState) -> bool {
        let before = self.nodes.len() + self.paths.len();
        self.nodes.retain(|id| graph.contains_node(id));
        self.paths.retain(|id| graph.contains_path(id));
        before != self.nodes.len() + self.paths.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, Position};

    #[test]
    fn single_selection_is_exclusive() {
        let mut selection = SelectionModel::default();
        selection.select_node("a");
        selection.select_path("p");
        assert_eq!(selection.selected_node(), None);
        assert_eq!(selection.selected_path().map(String::as_str), Some("p"));

        selection.select_node("b");
        assert_eq!(selection.selected_node().map(String::as_str), Some("b"));
        assert_eq!(selection.paths().count(), 0);
    }

    #[test]
    fn additive_operations_mix_kinds() {
        let mut selection = SelectionModel::default();
        selection.select_node("a");
        selection.extend_paths(["p".to_string()]);
        selection.toggle_node("b");
        assert_eq!(selection.nodes().count(), 2);
        assert!(selection.contains_path("p"));

        selection.toggle_node("a");
        assert_eq!(selection.selected_node().map(String::as_str), Some("b"));
    }

    #[test]
    fn prune_drops_missing_ids() {
        let mut graph = GraphState::default();
        graph.insert_node(Node::new("a", "A", Position::default()));

        let mut selection = SelectionModel::default();
        selection.extend_nodes(["a".to_string(), "gone".to_string()]);
        selection.extend_paths(["p".to_string()]);

        assert!(selection.prune(&graph));
        assert_eq!(selection.nodes().collect::<Vec<_>>(), vec!["a"]);
        assert!(!selection.prune(&graph));
    }
}
