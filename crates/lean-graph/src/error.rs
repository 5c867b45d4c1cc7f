//! Error types for graph operations.
//!
//! Errors fall into two groups, following a 4xx/5xx style split:
//!
//! - **Input problems** (caller's fault): a malformed edge list, an empty
//!   edge list, or a reference to a vertex or edge that does not exist. The
//!   live graph is never changed when one of these is returned.
//! - **Internal problems** (our fault or a collaborator's): a weight provider
//!   failed, the worker pool could not be built, or the per-vertex dominance
//!   sets could not be reconciled into one tree.
//!
//! `InconsistentDominance` is an invariant violation rather than a condition
//! callers are expected to recover from. It carries enough context to
//! diagnose which vertex and which dominance sets disagreed.

use thiserror::Error;

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for graph operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An edge-list line did not hold exactly two labels.
    #[error("line {line}: {message}")]
    Format {
        /// 1-based line number in the input
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// The edge list held no edges, so there is no root.
    #[error("edge list contains no edges")]
    EmptyInput,

    /// A referenced vertex is not in the graph.
    #[error("vertex {0} does not exist")]
    VertexNotFound(String),

    /// A referenced edge is not in the graph.
    #[error("edge ({from}, {to}) does not exist")]
    EdgeNotFound {
        /// Source label
        from: String,
        /// Target label
        to: String,
    },

    /// Per-vertex dominance sets contradict each other.
    #[error("inconsistent dominance while placing {dominatee} under {vertex}: {detail}")]
    InconsistentDominance {
        /// Vertex whose dominance set was being reconciled
        vertex: String,
        /// Member of that set that could not be placed
        dominatee: String,
        /// The conflicting sets and chain that led here
        detail: String,
    },

    /// An external weight provider failed.
    #[error("weight provider failed for {subject}: {message}")]
    Provider {
        /// Vertex label or `from -> to` pair being weighed
        subject: String,
        /// Provider's description of the failure
        message: String,
    },

    /// Reading input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The edge-weighting worker pool could not be started.
    #[error("worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Shorthand for an [`Error::EdgeNotFound`].
    pub(crate) fn edge_not_found(from: &str, to: &str) -> Self {
        Self::EdgeNotFound {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns `true` if a referenced vertex or edge was missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::VertexNotFound(_) | Self::EdgeNotFound { .. })
    }

    /// Returns `true` if this is an input problem (4xx-style).
    ///
    /// Input problems are issues with what the caller passed in and can be
    /// fixed by the caller.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Format { .. }
                | Self::EmptyInput
                | Self::VertexNotFound(_)
                | Self::EdgeNotFound { .. }
                | Self::Config(_)
        )
    }
}
