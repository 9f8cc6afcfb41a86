use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{DomainError, GraphSpec, ResponseText};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphFormat {
    /// Graphviz source.
    Dot,
    Svg,
}

impl GraphFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            GraphFormat::Dot => "dot",
            GraphFormat::Svg => "svg",
        }
    }
}

impl FromStr for GraphFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dot" | "gv" => Ok(GraphFormat::Dot),
            "svg" => Ok(GraphFormat::Svg),
            other => Err(DomainError::validation(format!(
                "unsupported graph format `{other}`"
            ))),
        }
    }
}

/// Displayable artifact produced by a [`GraphRenderer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedGraph {
    pub format: GraphFormat,
    pub body: String,
}

/// Contract for the graph renderer collaborator.
pub trait GraphRenderer: Send + Sync {
    fn render(&self, graph: &GraphSpec) -> Result<RenderedGraph, DomainError>;
}

/// Writes the stage diagram and the model's breakdown to an output sink.
pub struct Presenter {
    renderer: Arc<dyn GraphRenderer>,
    graph_output: Option<PathBuf>,
}

impl Presenter {
    pub fn new(renderer: Arc<dyn GraphRenderer>) -> Self {
        Self {
            renderer,
            graph_output: None,
        }
    }

    /// Write the rendered artifact to `path` instead of inlining it.
    pub fn with_graph_output(mut self, path: Option<PathBuf>) -> Self {
        self.graph_output = path;
        self
    }

    /// Both outputs are produced independently: a render failure still shows
    /// the text, and is returned afterwards.
    pub fn present<W: Write>(
        &self,
        out: &mut W,
        graph: &GraphSpec,
        text: &ResponseText,
    ) -> Result<(), DomainError> {
        writeln!(out, "## Attack Progression Graph")?;
        let graph_result = self.write_graph(out, graph);
        if let Err(err) = &graph_result {
            warn!(target: "killchain::render", error = %err, "stage graph could not be rendered");
            writeln!(out, "(graph unavailable: {err})")?;
        }

        writeln!(out)?;
        writeln!(out, "### Technical Breakdown")?;
        writeln!(out, "{text}")?;
        out.flush()?;

        graph_result
    }

    pub fn present_graph<W: Write>(&self, out: &mut W, graph: &GraphSpec) -> Result<(), DomainError> {
        self.write_graph(out, graph)?;
        out.flush()?;
        Ok(())
    }

    fn write_graph<W: Write>(&self, out: &mut W, graph: &GraphSpec) -> Result<(), DomainError> {
        let rendered = self.renderer.render(graph)?;

        match &self.graph_output {
            Some(path) => {
                fs::write(path, rendered.body.as_bytes()).map_err(|err| {
                    DomainError::render(format!(
                        "failed to write graph to {}: {err}",
                        path.display()
                    ))
                })?;
                writeln!(
                    out,
                    "graph written to {} ({})",
                    path.display(),
                    rendered.format.extension()
                )?;
            }
            None => writeln!(out, "{}", rendered.body)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::FakeRenderer;
    use crate::domain::build_graph;

    #[test]
    fn test_present_shows_graph_then_text() {
        let presenter = Presenter::new(Arc::new(FakeRenderer::ok("digraph {}")));
        let mut out = Vec::new();

        presenter
            .present(&mut out, &build_graph(), &ResponseText::new("Step 1: recon"))
            .unwrap();

        let printed = String::from_utf8(out).unwrap();
        let graph_at = printed.find("digraph {}").unwrap();
        let text_at = printed.find("Step 1: recon").unwrap();
        assert!(graph_at < text_at);
        assert!(printed.contains("### Technical Breakdown"));
    }

    #[test]
    fn test_present_empty_response_does_not_fail() {
        let presenter = Presenter::new(Arc::new(FakeRenderer::ok("digraph {}")));
        let mut out = Vec::new();

        presenter
            .present(&mut out, &build_graph(), &ResponseText::default())
            .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("digraph {}"));
        assert!(printed.trim_end().ends_with("### Technical Breakdown"));
    }

    #[test]
    fn test_render_failure_still_displays_text() {
        let presenter = Presenter::new(Arc::new(FakeRenderer::failing("dot not installed")));
        let mut out = Vec::new();

        let err = presenter
            .present(&mut out, &build_graph(), &ResponseText::new("Step 7: exfiltration"))
            .unwrap_err();

        assert!(matches!(err, DomainError::RenderFailure(_)));
        assert!(String::from_utf8(out).unwrap().contains("Step 7: exfiltration"));
    }

    #[test]
    fn test_graph_output_is_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kill_chain.dot");
        let presenter = Presenter::new(Arc::new(FakeRenderer::ok("digraph kill_chain {}")))
            .with_graph_output(Some(path.clone()));
        let mut out = Vec::new();

        presenter.present_graph(&mut out, &build_graph()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "digraph kill_chain {}");
        assert!(String::from_utf8(out).unwrap().contains("graph written to"));
    }

    #[test]
    fn test_graph_format_parsing() {
        assert_eq!("SVG".parse::<GraphFormat>().unwrap(), GraphFormat::Svg);
        assert_eq!("dot".parse::<GraphFormat>().unwrap(), GraphFormat::Dot);
        assert!("pdf".parse::<GraphFormat>().is_err());
    }
}
