//! Command execution logic.

use std::fs::File;
use std::io::{self, BufReader};
use std::sync::Arc;

use anyhow::{Context, Result};
use lean_graph::{Ingestor, LeanConfig, Session, WeightTable};

use super::Cli;
use super::args::{CutEdgeArgs, CutVertexArgs};
use crate::output::{self, OutputMode};

/// Ingest the edge list named by the global flags and apply `--without`.
pub(super) fn load_session(cli: &Cli) -> Result<Session> {
    let mut config = match &cli.config {
        Some(path) => LeanConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => LeanConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.ingest.max_in_flight = workers;
    }

    let ingestor = match &cli.weights {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open weights {}", path.display()))?;
            let table = Arc::new(
                WeightTable::from_json(BufReader::new(file))
                    .with_context(|| format!("failed to read weights {}", path.display()))?,
            );
            Ingestor::new(table.clone(), table)
        }
        None => Ingestor::unweighted(),
    }
    .with_config(config.ingest);

    let graph = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open input {}", path.display()))?;
            ingestor
                .ingest(BufReader::new(file))
                .with_context(|| format!("failed to ingest {}", path.display()))?
        }
        None => ingestor
            .ingest(io::stdin().lock())
            .context("failed to ingest standard input")?,
    };

    let mut session = Session::new(graph);
    for edge in &cli.without {
        session
            .remove_edge(&edge.from, &edge.to)
            .with_context(|| format!("cannot remove {edge}"))?;
    }
    if !cli.without.is_empty() {
        tracing::info!(removed = cli.without.len(), "Applied --without edges");
    }

    Ok(session)
}

/// Execute the graph command
pub(super) fn execute_graph(session: &Session, mode: OutputMode) -> Result<()> {
    match mode {
        OutputMode::Json => output::print_json(&session.snapshot())?,
        OutputMode::Text => output::print_snapshot(session.working().root(), &session.snapshot()),
    }
    Ok(())
}

/// Execute the cut-edge command
pub(super) fn execute_cut_edge(session: &Session, args: &CutEdgeArgs, mode: OutputMode) -> Result<()> {
    let cut = session.cut_edge(&args.from, &args.to)?;

    match mode {
        OutputMode::Json => output::print_json(&cut)?,
        OutputMode::Text => output::print_edge_cut(&args.from, &args.to, &cut),
    }
    Ok(())
}

/// Execute the cut-vertex command
pub(super) fn execute_cut_vertex(
    session: &Session,
    args: &CutVertexArgs,
    mode: OutputMode,
) -> Result<()> {
    let cut = session.cut_vertex(&args.label)?;

    match mode {
        OutputMode::Json => output::print_json(&cut)?,
        OutputMode::Text => output::print_vertex_cut(&cut),
    }
    Ok(())
}

/// Execute the dominators command
pub(super) fn execute_dominators(session: &Session, mode: OutputMode) -> Result<()> {
    let tree = session.dominator_tree()?;

    match mode {
        OutputMode::Json => output::print_json(&tree)?,
        OutputMode::Text => output::print_tree(&tree.to_nested()),
    }
    Ok(())
}
