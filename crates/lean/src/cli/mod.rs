//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `graph`: print the edges still reachable from the main module
//! - `cut-edge`: preview removing one dependency edge
//! - `cut-vertex`: preview removing one module entirely
//! - `dominators`: print the dominator tree
//!
//! # Global Flags
//!
//! - `--input`: edge list file (stdin when omitted)
//! - `--weights`: JSON table of module sizes and usage counts
//! - `--config`: YAML configuration file
//! - `--workers`: cap on concurrent usage computations
//! - `--without FROM:TO`: remove an edge before the command runs
//! - `--json`: output in JSON format
//!
//! # Example
//!
//! ```bash
//! go mod graph | lean cut-edge example.com/app golang.org/x/text@v0.3.0
//! go mod graph | lean --without example.com/app:golang.org/x/text@v0.3.0 dominators
//! ```

mod args;
mod execute;
mod validators;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{CutEdgeArgs, CutVertexArgs, EdgeArg};
pub use validators::parse_edge;

use crate::output::OutputMode;

/// Lean - what-if analysis for module dependency graphs
///
/// Reads `go mod graph` output and reports which modules stop being
/// reachable from the main module when a dependency is cut.
#[derive(Parser, Debug)]
#[command(name = "lean")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Edge list to read, one `from to` pair per line (defaults to stdin)
    #[arg(short, long, global = true)]
    pub input: Option<PathBuf>,

    /// JSON weight table with module sizes and usage counts
    #[arg(long, global = true)]
    pub weights: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Maximum concurrent usage computations (overrides the config file)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Remove an edge before running the command (repeatable)
    #[arg(long, value_name = "FROM:TO", value_parser = parse_edge, global = true)]
    pub without: Vec<EdgeArg>,

    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the edges reachable from the main module
    ///
    /// Edges removed with `--without` are listed separately.
    Graph,

    /// Preview cutting one dependency edge
    ///
    /// Lists the modules that would no longer be reachable and the edges
    /// that would go with them. The graph itself is not changed.
    CutEdge(CutEdgeArgs),

    /// Preview removing one module
    ///
    /// Lists the modules only reachable through it.
    CutVertex(CutVertexArgs),

    /// Show the dominator tree
    ///
    /// Each module is printed under the closest module every path to it
    /// from the main module must pass through.
    Dominators,
}

impl Cli {
    /// Parse CLI arguments from command line
    #[must_use]
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error if the arguments do not parse.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Default log filter for the requested verbosity.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Output mode selected by `--json`.
    #[must_use]
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or ingested, an edge
    /// named by `--without` does not exist, or the command itself fails.
    pub fn execute(&self) -> Result<()> {
        let mode = self.output_mode();
        let session = execute::load_session(self)?;

        match &self.command {
            Commands::Graph => execute::execute_graph(&session, mode),
            Commands::CutEdge(args) => execute::execute_cut_edge(&session, args, mode),
            Commands::CutVertex(args) => execute::execute_cut_vertex(&session, args, mode),
            Commands::Dominators => execute::execute_dominators(&session, mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_cut_edge_with_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lean",
            "cut-edge",
            "app",
            "lib",
            "--json",
            "--input",
            "graph.txt",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.input, Some(PathBuf::from("graph.txt")));
        match cli.command {
            Commands::CutEdge(args) => {
                assert_eq!(args.from, "app");
                assert_eq!(args.to, "lib");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn without_is_repeatable() {
        let cli = Cli::try_parse_from([
            "lean",
            "--without",
            "a:b",
            "--without",
            "b:c",
            "dominators",
        ])
        .unwrap();

        let pairs: Vec<(&str, &str)> = cli
            .without
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "b"), ("b", "c")]);
    }

    #[test]
    fn cut_vertex_requires_a_label() {
        assert!(Cli::try_parse_from(["lean", "cut-vertex"]).is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["lean"]).is_err());
    }

    #[rstest]
    #[case::quiet(&["lean", "graph"], "warn")]
    #[case::verbose(&["lean", "-v", "graph"], "info")]
    #[case::debug(&["lean", "-vv", "graph"], "debug")]
    #[case::trace(&["lean", "-vvvv", "graph"], "trace")]
    fn verbosity_maps_to_filter(#[case] argv: &[&str], #[case] expected: &str) {
        let cli = Cli::try_parse_from(argv).unwrap();
        assert_eq!(cli.log_filter(), expected);
    }

    #[test]
    fn json_flag_selects_output_mode() {
        let cli = Cli::try_parse_from(["lean", "graph", "--json"]).unwrap();
        assert_eq!(cli.output_mode(), OutputMode::Json);

        let cli = Cli::try_parse_from(["lean", "graph"]).unwrap();
        assert_eq!(cli.output_mode(), OutputMode::Text);
    }
}
