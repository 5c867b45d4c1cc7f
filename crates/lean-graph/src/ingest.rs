//! Building a graph from an edge list.
//!
//! The input is what `go mod graph` prints: one edge per line, exactly two
//! whitespace-separated labels, source first. Blank lines are skipped. The
//! first source label becomes the root.
//!
//! ## Phases
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       Ingestor::ingest                     │
//! ├────────────────────────────────────────────────────────────┤
//! │  Phase 1 (Sequential): parse lines, size each new vertex   │
//! │  Phase 2 (Parallel):   weigh edges in a bounded pool       │
//! │  Phase 3 (Sequential): assemble the edge map               │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Phase 2 runs at most `max_in_flight` usage computations at once and joins
//! all of them before phase 3, so a returned graph is always fully weighted.
//! Any format error or provider failure aborts ingestion; no partial graph
//! is returned.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::IngestConfig;
use crate::edge_map::EdgeMap;
use crate::error::{Error, Result};
use crate::graph::{Graph, GraphInner};
use crate::types::{Usages, Vertex};
use crate::weights::{NoUsages, SizeProvider, UnknownSizes, UsageCache, UsageProvider};

/// Builds graphs from edge lists using a pair of weight providers.
#[derive(Clone)]
pub struct Ingestor {
    sizes: Arc<dyn SizeProvider>,
    usages: Arc<UsageCache>,
    config: IngestConfig,
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("usages", &self.usages)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Ingestor {
    /// Create an ingestor with the given providers and default settings.
    #[must_use]
    pub fn new(sizes: Arc<dyn SizeProvider>, usages: Arc<dyn UsageProvider>) -> Self {
        Self {
            sizes,
            usages: Arc::new(UsageCache::new(usages)),
            config: IngestConfig::default(),
        }
    }

    /// An ingestor whose graphs carry no size or usage information.
    #[must_use]
    pub fn unweighted() -> Self {
        Self::new(Arc::new(UnknownSizes), Arc::new(NoUsages))
    }

    /// Replace the ingestion settings.
    #[must_use]
    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    /// The usage cache shared by every graph this ingestor builds.
    #[must_use]
    pub fn usage_cache(&self) -> &Arc<UsageCache> {
        &self.usages
    }

    /// Ingest an edge list held in memory.
    ///
    /// # Errors
    ///
    /// See [`Ingestor::ingest`].
    pub fn ingest_str(&self, input: &str) -> Result<Graph> {
        self.ingest(input.as_bytes())
    }

    /// Ingest an edge list from a reader.
    ///
    /// # Errors
    ///
    /// - [`Error::Format`] if a non-blank line does not hold exactly two labels
    /// - [`Error::EmptyInput`] if there are no edges at all
    /// - [`Error::Config`] if the settings are invalid
    /// - [`Error::Io`] if reading fails
    /// - any error a weight provider returns
    pub fn ingest<R: BufRead>(&self, reader: R) -> Result<Graph> {
        self.config.validate()?;

        let mut root: Option<String> = None;
        let mut vertices: HashMap<String, Arc<Vertex>> = HashMap::new();
        let mut seen_pairs: HashSet<(String, String)> = HashSet::new();
        let mut pairs: Vec<(String, String)> = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }
            let [from, to] = parts[..] else {
                return Err(Error::Format {
                    line: index + 1,
                    message: format!("expected 2 labels, got {}: {line}", parts.len()),
                });
            };

            for label in [from, to] {
                if !vertices.contains_key(label) {
                    let size = self.sizes.module_size(label)?;
                    vertices.insert(label.to_string(), Arc::new(Vertex::new(label, size)));
                }
            }

            // `go mod graph` always prints the main module as the first source.
            if root.is_none() {
                root = Some(from.to_string());
            }

            let pair = (from.to_string(), to.to_string());
            if seen_pairs.insert(pair.clone()) {
                pairs.push(pair);
            }
        }

        let root = root.ok_or(Error::EmptyInput)?;
        let weights = self.weigh_edges(&pairs)?;

        let mut edges = EdgeMap::new();
        for ((from, to), usages) in pairs.iter().zip(weights) {
            edges.set(
                Arc::clone(&vertices[from]),
                Arc::clone(&vertices[to]),
                usages,
            );
        }

        tracing::info!(
            root = %root,
            vertices = vertices.len(),
            edges = edges.len(),
            "Ingested dependency graph"
        );

        Ok(Graph::from_parts(
            root,
            GraphInner { vertices, edges },
            Arc::clone(&self.usages),
        ))
    }

    /// Look up usages for every pair, at most `max_in_flight` at a time.
    ///
    /// Returns weights in the same order as `pairs`.
    fn weigh_edges(&self, pairs: &[(String, String)]) -> Result<Vec<Usages>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_in_flight)
            .thread_name(|i| format!("lean-weigh-{i}"))
            .build()?;

        tracing::debug!(
            edges = pairs.len(),
            workers = self.config.max_in_flight,
            "Weighing edges"
        );

        pool.install(|| {
            pairs
                .par_iter()
                .map(|(from, to)| self.usages.lookup(from, to))
                .collect()
        })
    }
}

impl Graph {
    /// Build an unweighted graph from an in-memory edge list.
    ///
    /// # Errors
    ///
    /// See [`Ingestor::ingest`].
    pub fn from_edge_list(input: &str) -> Result<Graph> {
        Ingestor::unweighted().ingest_str(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Size;
    use crate::weights::WeightTable;
    use rstest::rstest;

    #[test]
    fn first_source_becomes_root() {
        let g = Graph::from_edge_list("\n  \nb c\na b\n").unwrap();
        assert_eq!(g.root(), "b");
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.edge_count(), 2);
    }

    #[rstest]
    #[case::one_label("a b\nlonely\n", 2, 1)]
    #[case::three_labels("a b c", 1, 3)]
    fn malformed_line_is_format_error(
        #[case] input: &str,
        #[case] expected_line: usize,
        #[case] expected_count: usize,
    ) {
        let err = Graph::from_edge_list(input).unwrap_err();
        match err {
            Error::Format { line, message } => {
                assert_eq!(line, expected_line);
                assert!(message.contains(&format!("got {expected_count}")));
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[rstest]
    #[case::empty("")]
    #[case::only_blank_lines("\n\n   \n")]
    fn input_without_edges_is_rejected(#[case] input: &str) {
        assert!(matches!(
            Graph::from_edge_list(input),
            Err(Error::EmptyInput)
        ));
    }

    #[rstest]
    #[case::spaces("a b\n   \nb c")]
    #[case::tabs_and_spaces("a b\n \t \nb c")]
    #[case::trailing("a b\nb c\n\t\n")]
    fn whitespace_only_lines_are_skipped(#[case] input: &str) {
        let g = Graph::from_edge_list(input).unwrap();
        assert_eq!(g.root(), "a");
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn duplicate_lines_collapse_into_one_edge() {
        let g = Graph::from_edge_list("a b\na b\nb c").unwrap();
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn providers_weigh_vertices_and_edges() {
        let table = Arc::new(
            WeightTable::new()
                .with_size("a", 10)
                .with_usages("a", "b", Usages::Count(4))
                .with_usages("b", "c", Usages::Unattributed),
        );
        let ingestor = Ingestor::new(table.clone(), table);

        let g = ingestor.ingest_str("a b\nb c").unwrap();

        assert_eq!(g.vertex("a").unwrap().size, Size::Known(10));
        assert_eq!(g.vertex("b").unwrap().size, Size::Unknown);
        let edges = g.edges();
        assert_eq!(edges.get("a", "b").unwrap().usages, Usages::Count(4));
        assert_eq!(edges.get("b", "c").unwrap().usages, Usages::Unattributed);
        assert_eq!(ingestor.usage_cache().len(), 2);
    }

    #[test]
    fn zero_workers_is_config_error() {
        let ingestor = Ingestor::unweighted().with_config(IngestConfig { max_in_flight: 0 });
        assert!(matches!(ingestor.ingest_str("a b"), Err(Error::Config(_))));
    }
}
