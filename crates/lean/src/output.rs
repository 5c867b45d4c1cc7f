//! Output formatting for CLI commands.
//!
//! Every command prints either human-readable colored text or pretty JSON
//! for programmatic use.

use std::io::{self, Write};

use colored::Colorize;
use lean_graph::{EdgeCut, EdgeMap, SessionSnapshot, Size, TreeView, Usages, VertexCut};
use serde::Serialize;

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Print any serializable value as pretty JSON
///
/// # Errors
///
/// Returns an error if serialization or writing to stdout fails.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(handle, "{json}")
}

/// Render a byte count with a binary unit.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for &next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

/// Describe what a cut frees, e.g. `3 modules, 12.0 KiB (1 of unknown size)`.
#[must_use]
pub fn describe_footprint(count: usize, bytes: u64, unknown: usize) -> String {
    let noun = if count == 1 { "module" } else { "modules" };
    let mut text = format!("{count} {noun}, {}", format_bytes(bytes));
    if unknown > 0 {
        text.push_str(&format!(" ({unknown} of unknown size)"));
    }
    text
}

fn print_labels(labels: &[String]) {
    for label in labels {
        println!("  {} {}", "•".dimmed(), label);
    }
}

fn print_edges(edges: &EdgeMap) {
    for edge in edges.edges() {
        println!(
            "  {} {} {} {}",
            "•".dimmed(),
            edge.from.label,
            "->".dimmed(),
            edge.to.label
        );
        if edge.usages != Usages::Count(0) {
            println!("      {}", format!("usages: {}", edge.usages).dimmed());
        }
    }
}

/// Print the reachable graph and the edges removed so far
pub fn print_snapshot(root: &str, snapshot: &SessionSnapshot) {
    println!(
        "{} {} ({} edges reachable)",
        "Root:".white().bold(),
        root.cyan().bold(),
        snapshot.graph.len()
    );
    print_edges(&snapshot.graph);

    if !snapshot.cart.is_empty() {
        println!();
        println!("{}", "Removed:".yellow().bold());
        for (from, targets) in &snapshot.cart {
            for to in targets {
                println!("  {} {} {} {}", "•".dimmed(), from, "->".dimmed(), to);
            }
        }
    }
}

/// Print the result of a hypothetical edge cut
pub fn print_edge_cut(from: &str, to: &str, cut: &EdgeCut) {
    let edge = format!("{from} -> {to}");
    if cut.vertices.is_empty() {
        println!(
            "Cutting {} prunes no modules; {} stays reachable another way",
            edge.cyan().bold(),
            to
        );
        return;
    }

    println!(
        "Cutting {} prunes {}",
        edge.cyan().bold(),
        describe_footprint(cut.vertices.len(), cut.pruned_bytes, cut.unknown_sizes).green()
    );
    print_labels(&cut.vertices);
    println!();
    println!("{} ({}):", "Pruned edges".white().bold(), cut.edges.len());
    print_edges(&cut.edges);
}

/// Print the result of a hypothetical vertex cut
pub fn print_vertex_cut(cut: &VertexCut) {
    if cut.vertices.is_empty() {
        println!(
            "Removing {} prunes no other modules",
            cut.vertex.cyan().bold()
        );
        return;
    }

    println!(
        "Removing {} prunes {}",
        cut.vertex.cyan().bold(),
        describe_footprint(cut.vertices.len(), cut.pruned_bytes, cut.unknown_sizes).green()
    );
    print_labels(&cut.vertices);
}

fn size_suffix(size: Size) -> String {
    match size {
        Size::Known(bytes) => format!(" ({})", format_bytes(bytes)),
        Size::Unknown => String::new(),
    }
}

fn print_subtree(view: &TreeView, depth: usize) {
    println!(
        "{:indent$}{}{}",
        "",
        view.label,
        size_suffix(view.size).dimmed(),
        indent = depth * 2
    );
    for child in &view.children {
        print_subtree(child, depth + 1);
    }
}

/// Print a dominator tree, one module per line, indented under its dominator
pub fn print_tree(root: &TreeView) {
    println!("{}{}", root.label.cyan().bold(), size_suffix(root.size).dimmed());
    for child in &root.children {
        print_subtree(child, 1);
    }
}
