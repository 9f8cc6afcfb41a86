use std::fmt::Write as _;

use crate::{
    application::services::{GraphFormat, GraphRenderer, RenderedGraph},
    domain::{DomainError, GraphSpec},
};

/// Emits Graphviz DOT source. Needs no external tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotRenderer;

impl DotRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn to_dot(graph: &GraphSpec) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "digraph {} {{", quote(&graph.name));
        let _ = writeln!(out, "    rankdir={};", graph.direction.as_dot());
        if let Some((width, height)) = graph.size {
            let _ = writeln!(out, "    size=\"{width},{height}\";");
        }

        for node in &graph.nodes {
            let mut attrs = vec![
                format!("label={}", quote(&node.label)),
                format!("shape={}", node.style.shape.as_dot()),
            ];
            if node.style.filled {
                attrs.push("style=filled".to_string());
            }
            attrs.push(format!("color={}", quote(&node.style.color)));
            let _ = writeln!(out, "    {} [{}];", quote(&node.id), attrs.join(", "));
        }

        for edge in &graph.edges {
            let _ = writeln!(out, "    {} -> {};", quote(&edge.from), quote(&edge.to));
        }

        out.push('}');
        out.push('\n');
        out
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

impl GraphRenderer for DotRenderer {
    fn render(&self, graph: &GraphSpec) -> Result<RenderedGraph, DomainError> {
        Ok(RenderedGraph {
            format: GraphFormat::Dot,
            body: Self::to_dot(graph),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::build_graph;

    #[test]
    fn test_kill_chain_dot_output() {
        let dot = DotRenderer::to_dot(&build_graph());

        assert!(dot.starts_with("digraph \"kill_chain\" {"));
        assert!(dot.contains("rankdir=LR;"));
        assert!(dot.contains("size=\"10,5\";"));
        assert!(dot.contains(
            "\"Recon\" [label=\"Recon\", shape=box, style=filled, color=\"lightblue\"];"
        ));
        assert!(dot.contains("\"Install\" -> \"C2\";"));
        assert_eq!(dot.matches("->").count(), 6);
        assert_eq!(dot.matches("shape=box").count(), 7);
    }

    #[test]
    fn test_quotes_are_escaped() {
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
    }
}
