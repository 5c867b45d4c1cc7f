//! Lean - what-if analysis for module dependency graphs.
//!
//! Lean answers the question an engineer asks before a refactor: "if I
//! dropped this dependency (or this whole module), what else would stop
//! being reachable from my main module?"
//!
//! ## Components
//!
//! - [`EdgeMap`]: sparse `from -> to -> Edge` adjacency with set operations
//! - [`Graph`]: vertex registry plus edges behind one lock; mutation and
//!   reachability ([`Graph::connected`])
//! - [`Ingestor`]: builds a [`Graph`] from a `go mod graph` style edge list,
//!   weighing edges in a bounded worker pool
//! - Cut engine: [`Graph::hypothetical_cut_edge`] and
//!   [`Graph::hypothetical_cut_vertex`] simulate removals on private copies
//! - [`DominatorTree`]: built by [`Graph::dominator_tree`] from one
//!   hypothetical vertex cut per vertex
//! - [`Session`]: original graph, working copy and cart of removed edges
//!
//! ## Example
//!
//! ```
//! use lean_graph::Graph;
//!
//! let graph = Graph::from_edge_list("app lib\nlib util\napp log").unwrap();
//!
//! let cut = graph.hypothetical_cut_edge("app", "lib").unwrap();
//! assert_eq!(cut.vertices, vec!["lib", "util"]);
//!
//! let tree = graph.dominator_tree().unwrap();
//! assert_eq!(tree.parent("util"), Some("lib"));
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod cut;
pub mod dominators;
pub mod edge_map;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod session;
pub mod types;
pub mod weights;

pub use config::{IngestConfig, LeanConfig};
pub use cut::{EdgeCut, VertexCut};
pub use dominators::{DominatorTree, TreeView};
pub use edge_map::EdgeMap;
pub use error::{Error, Result};
pub use graph::Graph;
pub use ingest::Ingestor;
pub use session::{Cart, Session, SessionSnapshot};
pub use types::{Edge, Size, Usages, Vertex};
pub use weights::{NoUsages, SizeProvider, UnknownSizes, UsageCache, UsageProvider, WeightTable};
