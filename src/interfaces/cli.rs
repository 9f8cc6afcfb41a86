//! Command-line shell.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::{
    application::{
        services::{GraphFormat, GraphRenderer},
        Presenter,
    },
    build_environment,
    infrastructure::{DotRenderer, GraphvizRenderer},
};

#[derive(Debug, Parser)]
#[command(
    name = "killchain",
    version,
    about = "Map a CVE or threat scenario onto the seven stages of the Cyber Kill Chain"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Retrieve context, ask the reasoning model, and show the stage breakdown.
    Analyze {
        /// CVE or threat scenario, e.g. "Log4Shell analysis".
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        #[command(flatten)]
        graph: GraphArgs,
        /// Print the full report as JSON instead of the text layout.
        #[arg(long)]
        json: bool,
    },
    /// Print the kill-chain stage diagram only.
    Graph {
        #[command(flatten)]
        graph: GraphArgs,
    },
    /// Check that the knowledge store and the reasoning service are reachable.
    Health,
    /// Show the effective configuration.
    Config,
}

#[derive(Debug, Args)]
struct GraphArgs {
    /// Diagram format: `dot` source, or `svg` rendered through Graphviz.
    #[arg(long, default_value = "dot")]
    graph_format: GraphFormat,
    /// Write the diagram to this file instead of stdout.
    #[arg(long)]
    graph_out: Option<PathBuf>,
}

impl GraphArgs {
    fn presenter(&self) -> Presenter {
        Presenter::new(renderer_for(self.graph_format)).with_graph_output(self.graph_out.clone())
    }
}

pub fn renderer_for(format: GraphFormat) -> Arc<dyn GraphRenderer> {
    match format {
        GraphFormat::Dot => Arc::new(DotRenderer::new()),
        GraphFormat::Svg => Arc::new(GraphvizRenderer::new(format)),
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let context = build_environment().context("failed to bootstrap killchain environment")?;
    let stdout = std::io::stdout();

    match cli.command {
        Command::Analyze { query, graph, json } => {
            let query = query.join(" ");
            let report = context.analyze(&query)?;
            let mut out = stdout.lock();

            if json {
                serde_json::to_writer_pretty(&mut out, &report)?;
                writeln!(out)?;
            } else {
                graph.presenter().present(&mut out, &report.graph, &report.response)?;
            }
        }
        Command::Graph { graph } => {
            graph.presenter().present_graph(&mut stdout.lock(), &context.graph())?;
        }
        Command::Health => {
            let health = context.health();
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, &health)?;
            writeln!(out)?;
            if !health.ok {
                bail!("killchain is not ready");
            }
        }
        Command::Config => {
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(
                &mut out,
                &serde_json::json!({
                    "data_dir": context.data_dir(),
                    "config": context.config(),
                }),
            )?;
            writeln!(out)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_joins_query_words() {
        let cli = Cli::try_parse_from(["killchain", "analyze", "Log4Shell", "analysis", "--json"])
            .unwrap();
        match cli.command {
            Command::Analyze { query, graph, json } => {
                assert_eq!(query.join(" "), "Log4Shell analysis");
                assert_eq!(graph.graph_format, GraphFormat::Dot);
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_graph_format_flag() {
        let cli = Cli::try_parse_from(["killchain", "graph", "--graph-format", "svg"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Graph { graph } if graph.graph_format == GraphFormat::Svg
        ));
        assert!(Cli::try_parse_from(["killchain", "graph", "--graph-format", "pdf"]).is_err());
    }

    #[test]
    fn test_analyze_requires_a_query() {
        assert!(Cli::try_parse_from(["killchain", "analyze"]).is_err());
    }
}
