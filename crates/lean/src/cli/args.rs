//! CLI argument structs for the commands that take operands.

use std::fmt;

use clap::Parser;

use super::validators::validate_label;

/// Arguments for the `cut-edge` command
#[derive(Parser, Debug, Clone)]
pub struct CutEdgeArgs {
    /// Depending module (source of the edge)
    #[arg(value_parser = validate_label)]
    pub from: String,

    /// Depended-upon module (target of the edge)
    #[arg(value_parser = validate_label)]
    pub to: String,
}

/// Arguments for the `cut-vertex` command
#[derive(Parser, Debug, Clone)]
pub struct CutVertexArgs {
    /// Module to remove
    #[arg(value_parser = validate_label)]
    pub label: String,
}

/// An edge named on the command line as `FROM:TO`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeArg {
    /// Source label
    pub from: String,
    /// Target label
    pub to: String,
}

impl fmt::Display for EdgeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}
