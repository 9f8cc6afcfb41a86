//! Fixed-topology stage diagram.
//!
//! The graph illustrates the kill-chain framework itself. It does not depend
//! on the query or on the model's answer, so it is built once and shared.

use serde::{Deserialize, Serialize};

use super::KillChainStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankDirection {
    /// Left to right.
    LeftRight,
}

impl RankDirection {
    pub fn as_dot(&self) -> &'static str {
        match self {
            RankDirection::LeftRight => "LR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    Box,
}

impl NodeShape {
    pub fn as_dot(&self) -> &'static str {
        match self {
            NodeShape::Box => "box",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub shape: NodeShape,
    pub filled: bool,
    pub color: String,
}

impl NodeStyle {
    pub fn stage_box() -> Self {
        Self {
            shape: NodeShape::Box,
            filled: true,
            color: "lightblue".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub style: NodeStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

/// Renderer-agnostic description of a directed graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSpec {
    pub name: String,
    pub direction: RankDirection,
    /// Size hint in inches (width, height).
    pub size: Option<(u32, u32)>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphSpec {
    /// Seven identically styled stages, each linked to its successor.
    pub fn kill_chain() -> Self {
        let nodes = KillChainStage::ALL
            .iter()
            .map(|stage| GraphNode {
                id: stage.label().to_string(),
                label: stage.label().to_string(),
                style: NodeStyle::stage_box(),
            })
            .collect();

        let edges = KillChainStage::ALL
            .windows(2)
            .map(|pair| GraphEdge {
                from: pair[0].label().to_string(),
                to: pair[1].label().to_string(),
            })
            .collect();

        Self {
            name: "kill_chain".into(),
            direction: RankDirection::LeftRight,
            size: Some((10, 5)),
            nodes,
            edges,
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.nodes.iter().map(|node| node.label.as_str()).collect()
    }
}

/// Stage graph builder entry point.
pub fn build_graph() -> GraphSpec {
    GraphSpec::kill_chain()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_has_seven_labelled_nodes() {
        let graph = build_graph();
        assert_eq!(
            graph.labels(),
            ["Recon", "Weaponize", "Delivery", "Exploit", "Install", "C2", "Actions"]
        );
        assert!(graph
            .nodes
            .iter()
            .all(|node| node.style == NodeStyle::stage_box()));
    }

    #[test]
    fn test_graph_edges_form_single_path() {
        let graph = build_graph();
        assert_eq!(graph.edges.len(), 6);
        for (edge, pair) in graph.edges.iter().zip(graph.nodes.windows(2)) {
            assert_eq!(edge.from, pair[0].id);
            assert_eq!(edge.to, pair[1].id);
        }
        assert_eq!(graph.direction, RankDirection::LeftRight);
    }

    #[test]
    fn test_graph_is_idempotent() {
        assert_eq!(build_graph(), build_graph());
    }
}
