//! Interactive what-if session over one ingested graph.
//!
//! A session keeps the graph as ingested, a working copy the user edits, and
//! a cart of the edges the user has removed so far. Resetting throws the
//! working copy away and starts again from the original.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::cut::{EdgeCut, VertexCut};
use crate::dominators::DominatorTree;
use crate::edge_map::EdgeMap;
use crate::error::Result;
use crate::graph::Graph;

/// Removed edges, `from -> {to}`.
pub type Cart = BTreeMap<String, BTreeSet<String>>;

/// Serializable state of a session: what is still reachable, and what was cut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Edges reachable from root in the working graph
    pub graph: EdgeMap,
    /// Edges removed so far
    pub cart: Cart,
}

/// An original graph plus an editable working copy.
#[derive(Debug)]
pub struct Session {
    original: Graph,
    working: Graph,
    cart: Cart,
}

impl Session {
    /// Start a session on a freshly ingested graph.
    #[must_use]
    pub fn new(original: Graph) -> Self {
        let working = original.copy();
        Self {
            original,
            working,
            cart: Cart::new(),
        }
    }

    /// The graph as ingested.
    #[must_use]
    pub fn original(&self) -> &Graph {
        &self.original
    }

    /// The graph with the user's edits applied.
    #[must_use]
    pub fn working(&self) -> &Graph {
        &self.working
    }

    /// Edges removed so far.
    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Edges reachable from root in the working graph.
    #[must_use]
    pub fn view(&self) -> EdgeMap {
        self.working.view()
    }

    /// Current view and cart.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            graph: self.view(),
            cart: self.cart.clone(),
        }
    }

    /// Remove an edge from the working graph and put it in the cart.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the edge or an endpoint is missing; the
    /// cart is left unchanged in that case.
    pub fn remove_edge(&mut self, from: &str, to: &str) -> Result<()> {
        self.working.remove_edge(from, to)?;
        self.cart
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        tracing::debug!(from, to, "Edge moved to cart");
        Ok(())
    }

    /// Put an edge back into the working graph and take it out of the cart.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if either endpoint is no longer a vertex.
    pub fn restore_edge(&mut self, from: &str, to: &str) -> Result<()> {
        self.working.add_edge(from, to)?;
        if let Some(targets) = self.cart.get_mut(from) {
            targets.remove(to);
            if targets.is_empty() {
                self.cart.remove(from);
            }
        }
        tracing::debug!(from, to, "Edge restored");
        Ok(())
    }

    /// Remove a vertex, and every edge touching it, from the working graph.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if there is no such vertex.
    pub fn remove_vertex(&mut self, label: &str) -> Result<()> {
        self.working.remove_vertex(label).map(|_| ())
    }

    /// Preview cutting an edge of the working graph.
    ///
    /// # Errors
    ///
    /// See [`Graph::hypothetical_cut_edge`].
    pub fn cut_edge(&self, from: &str, to: &str) -> Result<EdgeCut> {
        self.working.hypothetical_cut_edge(from, to)
    }

    /// Preview removing a vertex of the working graph.
    ///
    /// # Errors
    ///
    /// See [`Graph::hypothetical_cut_vertex`].
    pub fn cut_vertex(&self, label: &str) -> Result<VertexCut> {
        self.working.hypothetical_cut_vertex(label)
    }

    /// Dominator tree of the working graph.
    ///
    /// # Errors
    ///
    /// See [`Graph::dominator_tree`].
    pub fn dominator_tree(&self) -> Result<DominatorTree> {
        self.working.dominator_tree()
    }

    /// Discard all edits.
    pub fn reset(&mut self) {
        self.working = self.original.copy();
        self.cart.clear();
        tracing::debug!("Session reset");
    }
}
