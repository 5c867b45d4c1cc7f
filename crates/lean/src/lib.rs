//! Lean - see what a module dependency graph loses when an edge or a module
//! is cut.
//!
//! This crate holds the command-line front end over [`lean_graph`]. The
//! binary reads an edge list (the output of `go mod graph`), optionally
//! removes some edges, and answers one question about the result.

#![forbid(unsafe_code)]

pub mod cli;
pub mod output;
