//! Hypothetical cuts: what stops being reachable if an edge or a vertex goes.
//!
//! Both queries validate and copy under the live graph's lock, then release
//! it and work on the private copy. The live graph is never mutated, and two
//! cuts never block each other beyond the copy step.
//!
//! Callers that interleave cuts with live mutation may see different
//! snapshots per call; serializing a multi-step interaction is up to them.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::edge_map::EdgeMap;
use crate::error::Result;
use crate::graph::{Graph, GraphInner};

/// Result of removing one edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EdgeCut {
    /// The cut edge plus every edge only reachable through it
    pub edges: EdgeMap,
    /// Vertices no longer reachable from root, sorted
    pub vertices: Vec<String>,
    /// Sum of known sizes of `vertices`
    pub pruned_bytes: u64,
    /// How many of `vertices` have no known size
    pub unknown_sizes: usize,
}

/// Result of removing one vertex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VertexCut {
    /// The removed vertex
    pub vertex: String,
    /// Vertices no longer reachable from root (those `vertex` dominates), sorted
    pub vertices: Vec<String>,
    /// Sum of known sizes of `vertices`
    pub pruned_bytes: u64,
    /// How many of `vertices` have no known size
    pub unknown_sizes: usize,
}

/// Sum known sizes of `labels`, counting the unknown ones.
fn footprint<'a>(inner: &GraphInner, labels: impl IntoIterator<Item = &'a String>) -> (u64, usize) {
    let mut bytes = 0u64;
    let mut unknown = 0usize;
    for label in labels {
        match inner.vertices.get(label).and_then(|v| v.size.bytes()) {
            Some(b) => bytes = bytes.saturating_add(b),
            None => unknown += 1,
        }
    }
    (bytes, unknown)
}

/// Vertices that stop being reachable from `root` once `vertex` is removed.
///
/// `snapshot` is not modified; the removal happens on a private clone.
/// `vertex` must exist in `snapshot`.
pub(crate) fn dominated_by(
    snapshot: &GraphInner,
    root: &str,
    vertex: &str,
) -> Result<BTreeSet<String>> {
    let targets: Vec<String> = snapshot
        .edges
        .outgoing(vertex)
        .map(|edge| edge.to.label.clone())
        .filter(|target| target != vertex)
        .collect();

    let mut working = snapshot.clone();
    working.remove_vertex(vertex)?;

    let kept = working.reachable(root);
    let mut lost = BTreeSet::new();
    for target in &targets {
        lost.extend(
            working
                .reachable(target)
                .into_iter()
                .filter(|label| !kept.contains(label)),
        );
    }
    Ok(lost)
}

impl Graph {
    /// What would be pruned if the `from -> to` edge were cut.
    ///
    /// Reports the cut edge together with every edge reachable from `to`
    /// that is no longer reachable from root, and the vertices that became
    /// unreachable. When `to` has no outgoing edges left it is still
    /// reported on its own, unless root reaches it some other way.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VertexNotFound`] or [`Error::EdgeNotFound`] if
    /// either endpoint or the edge itself is missing.
    ///
    /// [`Error::VertexNotFound`]: crate::Error::VertexNotFound
    /// [`Error::EdgeNotFound`]: crate::Error::EdgeNotFound
    pub fn hypothetical_cut_edge(&self, from: &str, to: &str) -> Result<EdgeCut> {
        let mut working = {
            let inner = self.lock();
            inner.require_edge(from, to)?;
            inner.clone()
        };

        let cut = working.edges.remove(from, to)?;
        let root = self.root();

        let still_connected = working.connected(root);
        let downstream = working.connected(to);
        let mut edges = still_connected.negative_complement(&downstream);
        edges.insert(cut);

        let kept: HashSet<String> = working.reachable(root);
        let vertices: BTreeSet<String> = working
            .reachable(to)
            .into_iter()
            .filter(|label| !kept.contains(label))
            .collect();
        let (pruned_bytes, unknown_sizes) = footprint(&working, &vertices);

        tracing::debug!(
            from,
            to,
            pruned_edges = edges.len(),
            pruned_vertices = vertices.len(),
            "Hypothetical edge cut"
        );

        Ok(EdgeCut {
            edges,
            vertices: vertices.into_iter().collect(),
            pruned_bytes,
            unknown_sizes,
        })
    }

    /// What would be pruned if `vertex` were removed: the vertices it
    /// dominates.
    ///
    /// Cutting a vertex with no downstream reports nothing. Cutting the root
    /// reports every other vertex it reaches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VertexNotFound`] if `vertex` is missing.
    ///
    /// [`Error::VertexNotFound`]: crate::Error::VertexNotFound
    pub fn hypothetical_cut_vertex(&self, vertex: &str) -> Result<VertexCut> {
        let snapshot = {
            let inner = self.lock();
            inner.require_vertex(vertex)?;
            inner.clone()
        };

        let lost = dominated_by(&snapshot, self.root(), vertex)?;
        let (pruned_bytes, unknown_sizes) = footprint(&snapshot, &lost);

        tracing::debug!(vertex, pruned_vertices = lost.len(), "Hypothetical vertex cut");

        Ok(VertexCut {
            vertex: vertex.to_string(),
            vertices: lost.into_iter().collect(),
            pruned_bytes,
            unknown_sizes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Usages;
    use crate::weights::WeightTable;
    use crate::Ingestor;
    use std::sync::Arc;

    fn graph(input: &str) -> Graph {
        Graph::from_edge_list(input).unwrap()
    }

    #[test]
    fn cut_edge_validates_before_copying() {
        let g = graph("a b\nb c");

        assert!(g.hypothetical_cut_edge("a", "zzz").unwrap_err().is_not_found());
        assert!(g.hypothetical_cut_edge("zzz", "b").unwrap_err().is_not_found());
        assert!(g.hypothetical_cut_edge("a", "c").unwrap_err().is_not_found());
    }

    #[test]
    fn cut_edge_leaves_live_graph_untouched() {
        let g = graph("a b\nb c");
        let before = g.edges();

        g.hypothetical_cut_edge("a", "b").unwrap();

        assert_eq!(g.edges(), before);
    }

    #[test]
    fn cut_edge_with_alternative_path_prunes_only_the_edge() {
        let g = graph("a b\na c\nc b\nb d");

        let cut = g.hypothetical_cut_edge("a", "b").unwrap();

        assert!(cut.vertices.is_empty());
        assert_eq!(cut.edges.len(), 1);
        assert!(cut.edges.contains("a", "b"));
    }

    #[test]
    fn cut_edge_back_to_root_prunes_nothing_but_the_edge() {
        let g = graph("a b\nb a");

        let cut = g.hypothetical_cut_edge("b", "a").unwrap();
        assert!(cut.vertices.is_empty());

        let cut = g.hypothetical_cut_edge("a", "b").unwrap();
        assert_eq!(cut.vertices, vec!["b"]);
    }

    #[test]
    fn cut_vertex_ignores_self_loops() {
        let g = graph("a b\nb b\nb c");

        let cut = g.hypothetical_cut_vertex("b").unwrap();
        assert_eq!(cut.vertices, vec!["c"]);
    }

    #[test]
    fn cut_vertex_missing_is_not_found() {
        let g = graph("a b");
        assert!(g.hypothetical_cut_vertex("c").unwrap_err().is_not_found());
    }

    #[test]
    fn cuts_report_pruned_footprint() {
        let table = Arc::new(
            WeightTable::new()
                .with_size("b", 100)
                .with_size("c", 20)
                .with_usages("a", "b", Usages::Count(2)),
        );
        let g = Ingestor::new(table.clone(), table)
            .ingest_str("a b\nb c\nb d")
            .unwrap();

        let cut = g.hypothetical_cut_edge("a", "b").unwrap();
        assert_eq!(cut.pruned_bytes, 120);
        assert_eq!(cut.unknown_sizes, 1);
        assert_eq!(cut.edges.get("a", "b").unwrap().usages, Usages::Count(2));

        let cut = g.hypothetical_cut_vertex("b").unwrap();
        assert_eq!(cut.vertices, vec!["c", "d"]);
        assert_eq!(cut.pruned_bytes, 20);
        assert_eq!(cut.unknown_sizes, 1);
    }
}
