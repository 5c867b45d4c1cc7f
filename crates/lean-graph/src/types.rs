//! Core value types: vertices, edges and their weights.
//!
//! Vertices are immutable once built and shared through `Arc`, so a graph
//! copy can reference the same records as its source. Edges are plain values
//! that point at their endpoint vertices.

use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// On-disk footprint of a module, as reported by a [`SizeProvider`].
///
/// [`SizeProvider`]: crate::weights::SizeProvider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Size {
    /// Size in bytes
    Known(u64),
    /// The provider could not locate the module
    #[default]
    Unknown,
}

impl Size {
    /// Bytes, if known.
    #[must_use]
    pub fn bytes(self) -> Option<u64> {
        match self {
            Self::Known(bytes) => Some(bytes),
            Self::Unknown => None,
        }
    }
}

impl Serialize for Size {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(bytes) => serializer.serialize_u64(*bytes),
            Self::Unknown => serializer.serialize_none(),
        }
    }
}

/// How many times `from` refers to `to`, as reported by a [`UsageProvider`].
///
/// [`UsageProvider`]: crate::weights::UsageProvider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Usages {
    /// Number of references to symbols of `to`
    Count(u64),
    /// `to` is used, but not through any named symbol (a blank import)
    Unattributed,
}

impl Usages {
    /// Wire value: the count, or `-1` for [`Usages::Unattributed`].
    #[must_use]
    pub fn as_wire(self) -> i64 {
        match self {
            Self::Count(n) => i64::try_from(n).unwrap_or(i64::MAX),
            Self::Unattributed => -1,
        }
    }
}

impl Default for Usages {
    fn default() -> Self {
        Self::Count(0)
    }
}

impl fmt::Display for Usages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Unattributed => write!(f, "unattributed"),
        }
    }
}

impl Serialize for Usages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_wire())
    }
}

/// A module in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Vertex {
    /// Unique label, e.g. `golang.org/x/text@v0.3.2`
    pub label: String,
    /// Footprint on disk
    pub size: Size,
}

impl Vertex {
    /// Create a vertex record.
    pub fn new(label: impl Into<String>, size: Size) -> Self {
        Self {
            label: label.into(),
            size,
        }
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// A directed dependency `from -> to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Depending module
    pub from: Arc<Vertex>,
    /// Depended-upon module
    pub to: Arc<Vertex>,
    /// How much `from` uses `to`
    pub usages: Usages,
}

impl Edge {
    /// Create an edge between two existing vertices.
    #[must_use]
    pub fn new(from: Arc<Vertex>, to: Arc<Vertex>, usages: Usages) -> Self {
        Self { from, to, usages }
    }

    /// `(from, to)` labels.
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.from.label, &self.to.label)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.from, self.to, self.usages)
    }
}

impl Serialize for Edge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Edge", 3)?;
        state.serialize_field("from", &self.from.label)?;
        state.serialize_field("to", &self.to.label)?;
        state.serialize_field("num_usages", &self.usages)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usages_wire_format_uses_minus_one_sentinel() {
        assert_eq!(Usages::Count(4).as_wire(), 4);
        assert_eq!(Usages::Unattributed.as_wire(), -1);
        assert_eq!(serde_json::to_string(&Usages::Unattributed).unwrap(), "-1");
    }

    #[test]
    fn unknown_size_serializes_as_null() {
        let v = Vertex::new("example.com/mod@v1.0.0", Size::Unknown);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["size"], serde_json::Value::Null);
        assert_eq!(Size::Known(12).bytes(), Some(12));
    }

    #[test]
    fn edge_serializes_endpoint_labels() {
        let a = Arc::new(Vertex::new("a", Size::Known(1)));
        let b = Arc::new(Vertex::new("b", Size::Unknown));
        let edge = Edge::new(a, b, Usages::Count(3));

        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["from"], "a");
        assert_eq!(json["to"], "b");
        assert_eq!(json["num_usages"], 3);
        assert_eq!(edge.to_string(), "a -> b (3)");
    }
}
