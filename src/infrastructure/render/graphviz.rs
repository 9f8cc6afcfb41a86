use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::{
    application::services::{GraphFormat, GraphRenderer, RenderedGraph},
    domain::{DomainError, GraphSpec},
};

use super::DotRenderer;

/// Renders through the Graphviz `dot` executable.
pub struct GraphvizRenderer {
    format: GraphFormat,
    binary: Option<PathBuf>,
}

impl GraphvizRenderer {
    /// Looks `dot` up on `PATH` at render time.
    pub fn new(format: GraphFormat) -> Self {
        Self {
            format,
            binary: None,
        }
    }

    pub fn with_binary(format: GraphFormat, binary: impl Into<PathBuf>) -> Self {
        Self {
            format,
            binary: Some(binary.into()),
        }
    }

    fn resolve_binary(&self) -> Result<PathBuf, DomainError> {
        match &self.binary {
            Some(path) => Ok(path.clone()),
            None => which::which("dot").map_err(|err| {
                DomainError::render(format!("graphviz `dot` executable not found: {err}"))
            }),
        }
    }
}

impl GraphRenderer for GraphvizRenderer {
    fn render(&self, graph: &GraphSpec) -> Result<RenderedGraph, DomainError> {
        let source = DotRenderer::to_dot(graph);
        if self.format == GraphFormat::Dot {
            return Ok(RenderedGraph {
                format: GraphFormat::Dot,
                body: source,
            });
        }

        let binary = self.resolve_binary()?;
        debug!(target: "killchain::render", binary = %binary.display(), "invoking graphviz");

        let mut child = Command::new(&binary)
            .arg(format!("-T{}", self.format.extension()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                DomainError::render(format!("failed to launch {}: {err}", binary.display()))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .map_err(|err| DomainError::render(format!("failed to feed graphviz: {err}")))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|err| DomainError::render(format!("graphviz did not finish: {err}")))?;

        if !output.status.success() {
            return Err(DomainError::render(format!(
                "graphviz exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let body = String::from_utf8(output.stdout)
            .map_err(|err| DomainError::render(format!("graphviz produced non-utf8 output: {err}")))?;

        Ok(RenderedGraph {
            format: self.format,
            body,
        })
    }
}
