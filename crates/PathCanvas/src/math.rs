use glam::DVec2;

use crate::model::{GraphState, NodeId, PathId};

/// What lies under a canvas point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hit {
    Node(NodeId),
    Path(PathId),
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f64::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Finds the entity under `point` (canvas space).
///
/// Nodes are circles of `node_radius`, tested front to back, and win over paths.
/// Paths are straight segments between their endpoints' centres.
pub fn hit_test(
    graph: &GraphState,
    point: DVec2,
    node_radius: f64,
    path_tolerance: f64,
) -> Option<Hit> {
    if let Some(node) = graph
        .nodes_front_to_back()
        .find(|n| n.position.to_vec2().distance(point) <= node_radius)
    {
        return Some(Hit::Node(node.id.clone()));
    }

    // Later paths are drawn on top, so they win ties.
    let mut best: Option<(&PathId, f64)> = None;
    for path in graph.paths() {
        let Some((from, to)) = graph.endpoints(path) else {
            continue;
        };
        let d = distance_to_segment(point, from.position.to_vec2(), to.position.to_vec2());
        if d <= path_tolerance && best.is_none_or(|(_, bd)| d <= bd) {
            best = Some((&path.id, d));
        }
    }
    best.map(|(id, _)| Hit::Path(id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, Path, Position};

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(10.0, 0.0);
        assert_eq!(distance_to_segment(DVec2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(DVec2::new(-4.0, 3.0), a, b), 5.0);
        assert_eq!(distance_to_segment(DVec2::new(1.0, 1.0), a, a), 2f64.sqrt());
    }

    #[test]
    fn nodes_win_over_paths_and_topmost_node_wins() {
        let mut graph = GraphState::default();
        graph.insert_node(Node::new("a", "A", Position::new(0.0, 0.0)));
        graph.insert_node(Node::new("b", "B", Position::new(100.0, 0.0)));
        graph.insert_node(Node::new("c", "C", Position::new(10.0, 0.0)));
        graph.insert_path(Path::new("p", "P", "a", "b"));

        assert_eq!(hit_test(&graph, DVec2::new(5.0, 0.0), 20.0, 5.0), Some(Hit::Node("c".into())));
        graph.bring_to_front("a");
        assert_eq!(hit_test(&graph, DVec2::new(5.0, 0.0), 20.0, 5.0), Some(Hit::Node("a".into())));
        assert_eq!(hit_test(&graph, DVec2::new(50.0, 4.0), 20.0, 5.0), Some(Hit::Path("p".into())));
        assert_eq!(hit_test(&graph, DVec2::new(50.0, 30.0), 20.0, 5.0), None);
    }
}
