//! Sparse adjacency structure: `from -> to -> Edge`.
//!
//! At most one edge exists per ordered `(from, to)` pair; setting a pair
//! again overwrites it. The map has no locking of its own and is always
//! reached through its owning [`Graph`](crate::Graph)'s lock, or owned
//! outright as a query result.
//!
//! Both levels are `BTreeMap`s so iteration, and therefore serialized output,
//! is ordered by label.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::{Edge, Usages, Vertex};

/// Two-level map from source label to target label to [`Edge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EdgeMap {
    edges: BTreeMap<String, BTreeMap<String, Edge>>,
}

impl EdgeMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the `from -> to` edge.
    ///
    /// The usage weight must already be computed; this never calls out to a
    /// provider.
    pub fn set(&mut self, from: Arc<Vertex>, to: Arc<Vertex>, usages: Usages) {
        self.insert(Edge::new(from, to, usages));
    }

    /// Insert or overwrite an edge by value.
    pub fn insert(&mut self, edge: Edge) {
        self.edges
            .entry(edge.from.label.clone())
            .or_default()
            .insert(edge.to.label.clone(), edge);
    }

    /// Remove the `from -> to` edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EdgeNotFound`] if the pair is absent.
    pub fn remove(&mut self, from: &str, to: &str) -> Result<Edge> {
        let targets = self
            .edges
            .get_mut(from)
            .ok_or_else(|| Error::edge_not_found(from, to))?;
        let edge = targets
            .remove(to)
            .ok_or_else(|| Error::edge_not_found(from, to))?;
        if targets.is_empty() {
            self.edges.remove(from);
        }
        Ok(edge)
    }

    /// Remove every edge with `label` as either endpoint.
    ///
    /// Returns how many edges were removed.
    pub fn remove_touching(&mut self, label: &str) -> usize {
        let mut removed = self.edges.remove(label).map_or(0, |targets| targets.len());
        self.edges.retain(|_, targets| {
            if targets.remove(label).is_some() {
                removed += 1;
            }
            !targets.is_empty()
        });
        removed
    }

    /// Whether the `from -> to` edge is present.
    #[must_use]
    pub fn contains(&self, from: &str, to: &str) -> bool {
        self.edges
            .get(from)
            .is_some_and(|targets| targets.contains_key(to))
    }

    /// The `from -> to` edge, if present.
    #[must_use]
    pub fn get(&self, from: &str, to: &str) -> Option<&Edge> {
        self.edges.get(from)?.get(to)
    }

    /// Outgoing edges of `from`, ordered by target label.
    pub fn outgoing(&self, from: &str) -> impl Iterator<Item = &Edge> {
        self.edges.get(from).into_iter().flat_map(BTreeMap::values)
    }

    /// Every edge, ordered by `(from, to)`.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values().flat_map(BTreeMap::values)
    }

    /// Both endpoints of every edge.
    ///
    /// A vertex appears once per edge it touches; callers use the result as
    /// a membership set.
    #[must_use]
    pub fn vertices(&self) -> Vec<&Arc<Vertex>> {
        self.edges()
            .flat_map(|edge| [&edge.from, &edge.to])
            .collect()
    }

    /// Distinct endpoint labels.
    #[must_use]
    pub fn labels(&self) -> HashSet<&str> {
        self.edges()
            .flat_map(|edge| [edge.from.label.as_str(), edge.to.label.as_str()])
            .collect()
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    /// Whether the map holds no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Edges of `other` whose `(from, to)` pair is absent from `self`.
    ///
    /// With `self` as the old world and `other` as the new one this answers
    /// "what exists now that did not before"; reversed, "what was lost".
    /// Runs in O(size of `other`).
    #[must_use]
    pub fn negative_complement(&self, other: &EdgeMap) -> EdgeMap {
        let mut out = EdgeMap::new();
        for edge in other.edges() {
            let (from, to) = edge.key();
            if !self.contains(from, to) {
                out.insert(edge.clone());
            }
        }
        out
    }
}

impl FromIterator<Edge> for EdgeMap {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        let mut map = EdgeMap::new();
        for edge in iter {
            map.insert(edge);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Size;

    fn vertex(label: &str) -> Arc<Vertex> {
        Arc::new(Vertex::new(label, Size::Unknown))
    }

    fn map_of(pairs: &[(&str, &str)]) -> EdgeMap {
        pairs
            .iter()
            .map(|(from, to)| Edge::new(vertex(from), vertex(to), Usages::default()))
            .collect()
    }

    #[test]
    fn set_overwrites_existing_pair() {
        let mut map = EdgeMap::new();
        let (a, b) = (vertex("a"), vertex("b"));
        map.set(Arc::clone(&a), Arc::clone(&b), Usages::Count(1));
        map.set(a, b, Usages::Count(7));

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("a", "b").map(|e| e.usages), Some(Usages::Count(7)));
    }

    #[test]
    fn remove_missing_edge_is_not_found() {
        let mut map = map_of(&[("a", "b")]);

        let err = map.remove("a", "c").unwrap_err();
        assert!(err.is_not_found());
        let err = map.remove("x", "b").unwrap_err();
        assert!(err.is_not_found());

        map.remove("a", "b").unwrap();
        assert!(map.is_empty());
        assert!(!map.contains("a", "b"));
    }

    #[test]
    fn remove_touching_drops_both_directions() {
        let mut map = map_of(&[("a", "b"), ("b", "c"), ("c", "b"), ("a", "c")]);

        assert_eq!(map.remove_touching("b"), 3);
        assert_eq!(map.len(), 1);
        assert!(map.contains("a", "c"));
        assert!(!map.labels().contains("b"));
    }

    #[test]
    fn vertices_repeats_shared_endpoints() {
        let map = map_of(&[("a", "b"), ("a", "c")]);

        assert_eq!(map.vertices().len(), 4);
        assert_eq!(map.labels().len(), 3);
    }

    #[test]
    fn negative_complement_of_self_is_empty() {
        let map = map_of(&[("a", "b"), ("b", "c")]);
        assert!(map.negative_complement(&map).is_empty());
    }

    #[test]
    fn negative_complement_keeps_only_new_pairs() {
        let empty = EdgeMap::new();
        let populated = map_of(&[("a", "b")]);
        assert_eq!(empty.negative_complement(&populated), populated);

        let old = map_of(&[("a", "b"), ("x", "y")]);
        let new = map_of(&[("a", "b"), ("a", "c"), ("c", "d")]);
        let added = old.negative_complement(&new);

        assert_eq!(added, map_of(&[("a", "c"), ("c", "d")]));
        assert!(added.edges().all(|e| new.contains(e.key().0, e.key().1)));
    }

    #[test]
    fn serializes_as_nested_maps() {
        let map = map_of(&[("a", "b")]);
        let json = serde_json::to_value(&map).unwrap();

        assert_eq!(json["a"]["b"]["from"], "a");
        assert_eq!(json["a"]["b"]["num_usages"], 0);
    }
}
