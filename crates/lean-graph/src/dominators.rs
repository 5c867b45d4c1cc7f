//! Dominator tree construction from per-vertex hypothetical cuts.
//!
//! Vertex `w` dominates `w'` when every path from root to `w'` passes
//! through `w`. The tree places each vertex under its nearest dominator.
//!
//! ## Algorithm
//!
//! This is naive and costs O(V·(V+E)). It is not a flow-graph
//! dominator algorithm such as Lengauer-Tarjan or Cooper-Harvey-Kennedy.
//!
//! 1. For every vertex `v` reachable from root, cut `v` on a private copy of
//!    the graph. What stops being reachable is `dominates[v]`: every vertex
//!    `v` dominates, not only the immediate ones.
//! 2. Reconcile those independent sets into one tree. Each `v` is processed
//!    in turn, and each member `dv` of `dominates[v]` is placed beneath `v`:
//!    - an unparented `dv` is attached directly under `v`;
//!    - otherwise walk up `dv`'s ancestor chain. If the chain's top is itself
//!      dominated by `v`, the top is reattached under `v`. If a parent/child
//!      pair `(w1, w2)` is found with `v` dominating `w2` and `w1` dominating
//!      `v`, `v` is spliced in between.
//!    - reaching the top without either is a contradiction between the sets.
//!
//! Dominance is transitive and the dominators of a vertex form a chain, so
//! the splice point is unique. Vertices are processed from the largest
//! dominance set to the smallest, so every dominator of `v` is already
//! placed when `v`'s turn comes. The resulting parent relation does not
//! depend on hash or label order; child order within a node is not
//! meaningful (views sort children by label).
//!
//! Nodes live in an arena indexed by `NodeId`, which keeps the subtree
//! splicing in step 2 to plain index relinking.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::cut::dominated_by;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::types::{Size, Vertex};

/// Index of a node in a [`DominatorTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(usize);

#[derive(Debug, Clone)]
struct TreeNode {
    vertex: Arc<Vertex>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Immediate-dominance tree of the vertices reachable from root.
#[derive(Debug, Clone)]
pub struct DominatorTree {
    nodes: Vec<TreeNode>,
    index: HashMap<String, NodeId>,
    root: NodeId,
}

/// Owned, serializable view of a (sub)tree. Children are sorted by label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeView {
    /// Vertex label
    pub label: String,
    /// Vertex size
    pub size: Size,
    /// Vertices this one immediately dominates
    pub children: Vec<TreeView>,
}

impl TreeView {
    /// Build a view node, sorting `children` by label.
    pub fn new(label: impl Into<String>, size: Size, mut children: Vec<TreeView>) -> Self {
        children.sort_by(|a, b| a.label.cmp(&b.label));
        Self {
            label: label.into(),
            size,
            children,
        }
    }

    /// Number of vertices in this subtree, itself included.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(TreeView::len).sum::<usize>()
    }

    /// Always `false`: a view holds at least its own vertex.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl DominatorTree {
    fn with_vertices(vertices: Vec<Arc<Vertex>>, root: &str) -> Self {
        let index = vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (v.label.clone(), NodeId(i)))
            .collect::<HashMap<_, _>>();
        let nodes = vertices
            .into_iter()
            .map(|vertex| TreeNode {
                vertex,
                parent: None,
                children: Vec::new(),
            })
            .collect();
        let root = index[root];
        Self { nodes, index, root }
    }

    fn label(&self, id: NodeId) -> &str {
        &self.nodes[id.0].vertex.label
    }

    fn parent_id(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    fn top_of(&self, mut id: NodeId) -> NodeId {
        while let Some(parent) = self.parent_id(id) {
            id = parent;
        }
        id
    }

    /// Whether `ancestor` is `id` or lies above it.
    fn is_ancestor_id(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.parent_id(id) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn chain(&self, mut id: NodeId) -> Vec<&str> {
        let mut labels = vec![self.label(id)];
        while let Some(parent) = self.parent_id(id) {
            labels.push(self.label(parent));
            id = parent;
        }
        labels
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// The root vertex.
    #[must_use]
    pub fn root(&self) -> &Arc<Vertex> {
        &self.nodes[self.root.0].vertex
    }

    /// Number of vertices in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `label` is in the tree.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Immediate dominator of `label`; `None` for the root or an unknown label.
    #[must_use]
    pub fn parent(&self, label: &str) -> Option<&str> {
        let id = *self.index.get(label)?;
        self.parent_id(id).map(|parent| self.label(parent))
    }

    /// Vertices `label` immediately dominates, sorted.
    #[must_use]
    pub fn children(&self, label: &str) -> Vec<&str> {
        let Some(&id) = self.index.get(label) else {
            return Vec::new();
        };
        let mut children: Vec<&str> = self.nodes[id.0]
            .children
            .iter()
            .map(|&child| self.label(child))
            .collect();
        children.sort_unstable();
        children
    }

    /// Every dominator of `label`, nearest first, ending at the root.
    #[must_use]
    pub fn dominators(&self, label: &str) -> Vec<&str> {
        self.index
            .get(label)
            .map(|&id| self.chain(id).into_iter().skip(1).collect())
            .unwrap_or_default()
    }

    /// Whether `dominator` dominates `label` (every vertex dominates itself).
    #[must_use]
    pub fn dominates(&self, dominator: &str, label: &str) -> bool {
        match (self.index.get(dominator), self.index.get(label)) {
            (Some(&a), Some(&b)) => self.is_ancestor_id(a, b),
            _ => false,
        }
    }

    /// Owned nested view rooted at the root.
    #[must_use]
    pub fn to_nested(&self) -> TreeView {
        self.view_of(self.root)
    }

    fn view_of(&self, id: NodeId) -> TreeView {
        let node = &self.nodes[id.0];
        let children = node.children.iter().map(|&c| self.view_of(c)).collect();
        TreeView::new(node.vertex.label.clone(), node.vertex.size, children)
    }
}

impl Serialize for DominatorTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_nested().serialize(serializer)
    }
}

impl fmt::Display for DominatorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_view(f: &mut fmt::Formatter<'_>, view: &TreeView, depth: usize) -> fmt::Result {
            writeln!(f, "{:indent$}{}", "", view.label, indent = depth * 2)?;
            for child in &view.children {
                write_view(f, child, depth + 1)?;
            }
            Ok(())
        }
        write_view(f, &self.to_nested(), 0)
    }
}

fn describe(set: &BTreeSet<String>) -> String {
    let members: Vec<&str> = set.iter().map(String::as_str).collect();
    format!("{{{}}}", members.join(", "))
}

/// Step 2: folds independently computed dominance sets into one tree.
struct Reconciler<'a> {
    dominates: &'a HashMap<String, BTreeSet<String>>,
    tree: DominatorTree,
}

impl Reconciler<'_> {
    fn claims(&self, dominator: NodeId, id: NodeId) -> bool {
        self.dominates
            .get(self.tree.label(dominator))
            .is_some_and(|set| set.contains(self.tree.label(id)))
    }

    fn inconsistent(&self, v: NodeId, dv: NodeId, reason: &str) -> Error {
        let vertex = self.tree.label(v).to_string();
        let dominatee = self.tree.label(dv).to_string();
        let empty = BTreeSet::new();
        let detail = format!(
            "{reason}; dominates[{vertex}] = {}; chain of {dominatee} = [{}]",
            describe(self.dominates.get(&vertex).unwrap_or(&empty)),
            self.tree.chain(dv).join(" <- "),
        );
        tracing::error!(%vertex, %dominatee, %detail, "Dominance sets cannot be reconciled");
        Error::InconsistentDominance {
            vertex,
            dominatee,
            detail,
        }
    }

    /// Attach the unparented `child` under `parent`.
    fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.tree.is_ancestor_id(child, parent) {
            return Err(self.inconsistent(parent, child, "attaching would create a cycle"));
        }
        self.tree.detach(child);
        self.tree.link(parent, child);
        Ok(())
    }

    /// Make `v` the child of `upper` and the parent of `lower`.
    fn splice(&mut self, upper: NodeId, v: NodeId, lower: NodeId) -> Result<()> {
        if self.tree.is_ancestor_id(v, upper) {
            return Err(self.inconsistent(v, lower, "splicing would create a cycle"));
        }
        self.tree.detach(lower);
        self.tree.detach(v);
        self.tree.link(upper, v);
        self.tree.link(v, lower);
        Ok(())
    }

    /// Place `dv`, which `v` dominates, somewhere beneath `v`.
    fn place(&mut self, v: NodeId, dv: NodeId) -> Result<()> {
        if self.tree.is_ancestor_id(dv, v) {
            return Err(self.inconsistent(v, dv, "dominatee is already placed above the vertex"));
        }
        if self.tree.parent_id(dv).is_none() {
            return self.attach(v, dv);
        }

        let mut child = dv;
        while let Some(parent) = self.tree.parent_id(child) {
            if parent == v {
                return Ok(());
            }

            let top = self.tree.top_of(child);
            if self.claims(v, top) {
                return self.attach(v, top);
            }

            if self.claims(v, child) && self.claims(parent, v) {
                return self.splice(parent, v, child);
            }

            child = parent;
        }

        Err(self.inconsistent(v, dv, "no insertion point on the ancestor chain"))
    }

    fn run(mut self) -> Result<DominatorTree> {
        let dominates = self.dominates;
        let mut order: Vec<(&String, &BTreeSet<String>)> = dominates.iter().collect();
        order.sort_by(|(a, a_set), (b, b_set)| b_set.len().cmp(&a_set.len()).then(a.cmp(b)));

        for (vertex, dominated) in order {
            let v = self.tree.index[vertex.as_str()];
            for dominatee in dominated {
                let Some(&dv) = self.tree.index.get(dominatee.as_str()) else {
                    return Err(self.inconsistent(v, v, &format!("{dominatee} is not reachable")));
                };
                self.place(v, dv)?;
            }
        }

        let root = self.tree.root;
        for i in 0..self.tree.nodes.len() {
            let id = NodeId(i);
            if id != root && self.tree.parent_id(id).is_none() {
                return Err(self.inconsistent(root, id, "vertex has no dominator"));
            }
        }
        if self.tree.parent_id(root).is_some() {
            return Err(self.inconsistent(root, root, "root was placed under another vertex"));
        }

        Ok(self.tree)
    }
}

impl Graph {
    /// Build the dominator tree of everything reachable from root.
    ///
    /// The tree is rebuilt from a single snapshot on every call. Vertices no
    /// longer reachable from root are left out.
    ///
    /// # Errors
    ///
    /// - [`Error::VertexNotFound`] if the root has been removed
    /// - [`Error::InconsistentDominance`] if the per-vertex dominance sets
    ///   contradict each other
    pub fn dominator_tree(&self) -> Result<DominatorTree> {
        let snapshot = self.lock().clone();
        let root = self.root();
        snapshot.require_vertex(root)?;

        let mut reachable: Vec<String> = snapshot.reachable(root).into_iter().collect();
        reachable.sort();

        let mut dominates = HashMap::with_capacity(reachable.len());
        for vertex in &reachable {
            let dominated = dominated_by(&snapshot, root, vertex)?;
            tracing::debug!(vertex = %vertex, dominated = dominated.len(), "Computed dominance set");
            dominates.insert(vertex.clone(), dominated);
        }

        let vertices = reachable
            .iter()
            .map(|label| snapshot.require_vertex(label).map(Arc::clone))
            .collect::<Result<Vec<_>>>()?;

        let tree = Reconciler {
            dominates: &dominates,
            tree: DominatorTree::with_vertices(vertices, root),
        }
        .run()?;

        tracing::info!(root = %root, vertices = tree.len(), "Built dominator tree");
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sets(entries: &[(&str, &[&str])]) -> HashMap<String, BTreeSet<String>> {
        entries
            .iter()
            .map(|(v, dominated)| {
                (
                    (*v).to_string(),
                    dominated.iter().map(|d| (*d).to_string()).collect(),
                )
            })
            .collect()
    }

    fn bare_tree(labels: &[&str], root: &str) -> DominatorTree {
        let vertices = labels
            .iter()
            .map(|l| Arc::new(Vertex::new(*l, Size::Unknown)))
            .collect();
        DominatorTree::with_vertices(vertices, root)
    }

    #[test]
    fn reconciles_nested_sets_into_chain() {
        let dominates = sets(&[("a", &["b", "c"]), ("b", &["c"]), ("c", &[])]);
        let tree = Reconciler {
            dominates: &dominates,
            tree: bare_tree(&["a", "b", "c"], "a"),
        }
        .run()
        .unwrap();

        assert_eq!(tree.parent("b"), Some("a"));
        assert_eq!(tree.parent("c"), Some("b"));
        assert_eq!(tree.dominators("c"), vec!["b", "a"]);
        assert!(tree.dominates("a", "c"));
        assert!(!tree.dominates("c", "a"));
    }

    #[test]
    fn mutual_dominance_is_reported_with_context() {
        let dominates = sets(&[("a", &["b", "c"]), ("b", &["c"]), ("c", &["b"])]);
        let err = Reconciler {
            dominates: &dominates,
            tree: bare_tree(&["a", "b", "c"], "a"),
        }
        .run()
        .unwrap_err();

        match err {
            Error::InconsistentDominance { detail, .. } => {
                assert!(detail.contains("dominates["), "detail was: {detail}");
            }
            other => panic!("expected inconsistent dominance, got {other:?}"),
        }
    }

    #[test]
    fn undominated_vertex_is_reported() {
        let dominates = sets(&[("a", &["b"]), ("b", &[]), ("c", &[])]);
        let err = Reconciler {
            dominates: &dominates,
            tree: bare_tree(&["a", "b", "c"], "a"),
        }
        .run()
        .unwrap_err();

        assert!(matches!(
            err,
            Error::InconsistentDominance { ref dominatee, .. } if dominatee == "c"
        ));
    }

    #[test]
    fn display_indents_by_depth() {
        let tree = Graph::from_edge_list("a b\nb c\na d")
            .unwrap()
            .dominator_tree()
            .unwrap();

        assert_eq!(tree.to_string(), "a\n  b\n    c\n  d\n");
    }

    #[test]
    fn removed_root_is_not_found() {
        let g = Graph::from_edge_list("a b").unwrap();
        g.remove_vertex("a").unwrap();

        assert!(g.dominator_tree().unwrap_err().is_not_found());
    }

    #[test]
    fn unreachable_vertices_are_left_out() {
        let g = Graph::from_edge_list("a b\nb c\nx c").unwrap();

        let tree = g.dominator_tree().unwrap();
        assert_eq!(tree.len(), 3);
        assert!(!tree.contains("x"));
        assert_eq!(tree.parent("c"), Some("b"));
    }
}
