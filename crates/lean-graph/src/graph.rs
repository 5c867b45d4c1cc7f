//! The live dependency graph.
//!
//! A [`Graph`] owns a vertex registry and one [`EdgeMap`] behind a single
//! mutex. Every structural read or write, including the traversal behind
//! [`Graph::connected`], holds that lock for its whole duration. Graph sizes
//! this tool targets (a few thousand modules) do not warrant anything finer.
//!
//! # Invariants
//!
//! - `root` is fixed for the life of the instance. It may be removed as a
//!   vertex, after which nothing is reachable.
//! - Every edge's endpoints are present in the vertex registry.
//!
//! # Copies
//!
//! [`Graph::copy`] shares the immutable [`Vertex`] records but clones every
//! edge, so the copy can be mutated freely. Hypothetical cuts and dominator
//! builds always work on such a private copy.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::edge_map::EdgeMap;
use crate::error::{Error, Result};
use crate::types::{Edge, Vertex};
use crate::weights::UsageCache;

/// Vertex registry and edges, guarded by [`Graph`]'s lock.
#[derive(Debug, Clone, Default)]
pub(crate) struct GraphInner {
    pub(crate) vertices: HashMap<String, Arc<Vertex>>,
    pub(crate) edges: EdgeMap,
}

impl GraphInner {
    pub(crate) fn require_vertex(&self, label: &str) -> Result<&Arc<Vertex>> {
        self.vertices
            .get(label)
            .ok_or_else(|| Error::VertexNotFound(label.to_string()))
    }

    pub(crate) fn require_edge(&self, from: &str, to: &str) -> Result<()> {
        self.require_vertex(from)?;
        self.require_vertex(to)?;
        if self.edges.contains(from, to) {
            Ok(())
        } else {
            Err(Error::edge_not_found(from, to))
        }
    }

    /// Edges reachable from `start` by following outgoing edges.
    ///
    /// Depth-first; each expanded source is marked visited so cycles
    /// terminate.
    pub(crate) fn connected<'a>(&'a self, start: &'a str) -> EdgeMap {
        let mut sub = EdgeMap::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack = vec![start];

        while let Some(from) = stack.pop() {
            if !visited.insert(from) {
                continue;
            }
            for edge in self.edges.outgoing(from) {
                sub.insert(edge.clone());
                stack.push(&edge.to.label);
            }
        }
        sub
    }

    /// Labels reachable from `start`, `start` included.
    pub(crate) fn reachable(&self, start: &str) -> HashSet<String> {
        let mut labels: HashSet<String> = self
            .connected(start)
            .labels()
            .into_iter()
            .map(str::to_string)
            .collect();
        labels.insert(start.to_string());
        labels
    }

    pub(crate) fn remove_vertex(&mut self, label: &str) -> Result<Arc<Vertex>> {
        let vertex = self
            .vertices
            .remove(label)
            .ok_or_else(|| Error::VertexNotFound(label.to_string()))?;
        let removed = self.edges.remove_touching(label);
        tracing::debug!(vertex = label, edges = removed, "Removed vertex");
        Ok(vertex)
    }
}

/// A directed dependency graph with a fixed entry point.
pub struct Graph {
    root: String,
    inner: Mutex<GraphInner>,
    usages: Arc<UsageCache>,
}

impl Graph {
    pub(crate) fn from_parts(root: String, inner: GraphInner, usages: Arc<UsageCache>) -> Self {
        Self {
            root,
            inner: Mutex::new(inner),
            usages,
        }
    }

    /// Acquire the graph lock.
    ///
    /// A panic while the lock was held cannot leave the registry and edge
    /// map disagreeing (each mutation is a single map operation pair), so a
    /// poisoned lock is simply taken over.
    pub(crate) fn lock(&self) -> MutexGuard<'_, GraphInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the locked state, sharing this graph's usage cache.
    pub(crate) fn copy_of(&self, inner: &GraphInner) -> Graph {
        Graph::from_parts(self.root.clone(), inner.clone(), Arc::clone(&self.usages))
    }

    /// The entry point: the first source label seen during ingestion.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Independent copy with the same root, vertex records and edge weights.
    ///
    /// No weight provider is called.
    #[must_use]
    pub fn copy(&self) -> Graph {
        let inner = self.lock();
        self.copy_of(&inner)
    }

    /// Add (or re-add) the `from -> to` edge between existing vertices.
    ///
    /// The usage weight is looked up before the lock is taken, so a slow
    /// provider does not block readers. Previously seen pairs come straight
    /// from the usage cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VertexNotFound`] if either endpoint is missing, or the
    /// provider's error if weighing the edge fails.
    pub fn add_edge(&self, from: &str, to: &str) -> Result<()> {
        {
            let inner = self.lock();
            inner.require_vertex(from)?;
            inner.require_vertex(to)?;
        }

        let usages = self.usages.lookup(from, to)?;

        let mut inner = self.lock();
        let from_vertex = Arc::clone(inner.require_vertex(from)?);
        let to_vertex = Arc::clone(inner.require_vertex(to)?);
        inner.edges.set(from_vertex, to_vertex, usages);
        Ok(())
    }

    /// Remove the `from -> to` edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VertexNotFound`] if either endpoint is missing, or
    /// [`Error::EdgeNotFound`] if there is no such edge.
    pub fn remove_edge(&self, from: &str, to: &str) -> Result<Edge> {
        let mut inner = self.lock();
        inner.require_vertex(from)?;
        inner.require_vertex(to)?;
        inner.edges.remove(from, to)
    }

    /// Remove a vertex and every edge touching it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VertexNotFound`] if there is no such vertex.
    pub fn remove_vertex(&self, label: &str) -> Result<Arc<Vertex>> {
        self.lock().remove_vertex(label)
    }

    /// The sub-graph reachable from `start`.
    ///
    /// This is what "reachable from a vertex" means everywhere in this crate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VertexNotFound`] if `start` is not a vertex.
    pub fn connected(&self, start: &str) -> Result<EdgeMap> {
        let inner = self.lock();
        inner.require_vertex(start)?;
        Ok(inner.connected(start))
    }

    /// The sub-graph reachable from the root; empty once the root is removed.
    #[must_use]
    pub fn view(&self) -> EdgeMap {
        let inner = self.lock();
        if inner.vertices.contains_key(&self.root) {
            inner.connected(&self.root)
        } else {
            EdgeMap::new()
        }
    }

    /// Labels reachable from `start`, `start` included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VertexNotFound`] if `start` is not a vertex.
    pub fn reachable(&self, start: &str) -> Result<HashSet<String>> {
        let inner = self.lock();
        inner.require_vertex(start)?;
        Ok(inner.reachable(start))
    }

    /// The vertex record for `label`.
    #[must_use]
    pub fn vertex(&self, label: &str) -> Option<Arc<Vertex>> {
        self.lock().vertices.get(label).cloned()
    }

    /// Whether `label` is a vertex.
    #[must_use]
    pub fn contains_vertex(&self, label: &str) -> bool {
        self.lock().vertices.contains_key(label)
    }

    /// Whether the `from -> to` edge exists.
    #[must_use]
    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        self.lock().edges.contains(from, to)
    }

    /// All vertex labels, sorted.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.lock().vertices.keys().cloned().collect();
        labels.sort();
        labels
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.lock().vertices.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.lock().edges.len()
    }

    /// Snapshot of every edge, reachable or not.
    #[must_use]
    pub fn edges(&self) -> EdgeMap {
        self.lock().edges.clone()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Graph")
            .field("root", &self.root)
            .field("vertices", &inner.vertices.len())
            .field("edges", &inner.edges.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(input: &str) -> Graph {
        Graph::from_edge_list(input).unwrap()
    }

    #[test]
    fn connected_follows_outgoing_edges_only() {
        let g = graph("a b\nb c\nd b");

        let sub = g.connected("a").unwrap();
        assert_eq!(sub.len(), 2);
        assert!(sub.contains("a", "b"));
        assert!(sub.contains("b", "c"));
        assert!(!sub.contains("d", "b"));
    }

    #[test]
    fn connected_terminates_on_cycles() {
        let g = graph("a b\nb c\nc a");

        let sub = g.connected("b").unwrap();
        assert_eq!(sub.len(), 3);
    }

    #[test]
    fn connected_unknown_vertex_is_not_found() {
        let g = graph("a b");
        assert!(g.connected("zzz").unwrap_err().is_not_found());
    }

    #[test]
    fn reachable_includes_start_even_without_edges() {
        let g = graph("a b");

        let from_leaf = g.reachable("b").unwrap();
        assert_eq!(from_leaf, HashSet::from(["b".to_string()]));
    }

    #[test]
    fn copy_is_independent_of_source() {
        let g = graph("a b\nb c");
        let copy = g.copy();

        copy.remove_edge("b", "c").unwrap();
        copy.remove_vertex("a").unwrap();

        assert!(g.contains_edge("b", "c"));
        assert!(g.contains_vertex("a"));
        assert_eq!(copy.root(), "a");
        assert_eq!(copy.edge_count(), 0);
    }

    #[test]
    fn copy_shares_vertex_records() {
        let g = graph("a b");
        let copy = g.copy();

        let original = g.vertex("b").unwrap();
        let copied = copy.vertex("b").unwrap();
        assert!(Arc::ptr_eq(&original, &copied));
    }

    #[test]
    fn add_edge_requires_both_vertices() {
        let g = graph("a b");

        assert!(g.add_edge("a", "nope").unwrap_err().is_not_found());
        assert!(g.add_edge("nope", "a").unwrap_err().is_not_found());

        g.add_edge("b", "a").unwrap();
        assert!(g.contains_edge("b", "a"));
    }

    #[test]
    fn remove_edge_then_restore() {
        let g = graph("a b\nb c");

        let removed = g.remove_edge("a", "b").unwrap();
        assert_eq!(removed.key(), ("a", "b"));
        assert!(g.view().is_empty());
        assert!(g.remove_edge("a", "b").unwrap_err().is_not_found());

        g.add_edge("a", "b").unwrap();
        assert_eq!(g.view().len(), 2);
    }

    #[test]
    fn remove_vertex_drops_every_touching_edge() {
        let g = graph("a b\nb c\nc b\na c");

        g.remove_vertex("b").unwrap();

        let view = g.view();
        assert!(!view.labels().contains("b"));
        assert!(view.edges().all(|e| e.from.label != "b" && e.to.label != "b"));
        assert_eq!(g.vertex_count(), 2);
        assert!(g.remove_vertex("b").unwrap_err().is_not_found());
    }

    #[test]
    fn removing_root_empties_the_view() {
        let g = graph("a b\nb c");

        g.remove_vertex("a").unwrap();
        assert!(g.view().is_empty());
        assert_eq!(g.root(), "a");
    }
}
