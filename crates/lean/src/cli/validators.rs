//! Validators for CLI operands.
//!
//! Labels must look like what an edge list can contain: one non-empty token
//! without whitespace.

use super::args::EdgeArg;

/// Validate a module label.
///
/// # Errors
///
/// Returns a message if the label is empty or contains whitespace.
pub fn validate_label(s: &str) -> Result<String, String> {
    if s.is_empty() {
        return Err("module label cannot be empty".to_string());
    }
    if s.chars().any(char::is_whitespace) {
        return Err(format!("module label cannot contain whitespace: '{s}'"));
    }
    Ok(s.to_string())
}

/// Parse an edge written as `FROM:TO`.
///
/// Go module paths never contain `:`, so the first colon separates the two
/// labels.
///
/// # Errors
///
/// Returns a message if there is no colon or either label is invalid.
pub fn parse_edge(s: &str) -> Result<EdgeArg, String> {
    let Some((from, to)) = s.split_once(':') else {
        return Err(format!("expected FROM:TO, got '{s}'"));
    };
    Ok(EdgeArg {
        from: validate_label(from)?,
        to: validate_label(to)?,
    })
}
