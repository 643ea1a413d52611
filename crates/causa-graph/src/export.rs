//! Static graph exports.
//!
//! A [`StaticGraph`] is the generic directed-graph shape the builder
//! consumes: vertices and edges with string attribute maps, where one edge
//! attribute names the mediating topic. Any parser producing this shape
//! can feed [`GraphBuilder::build_static`](crate::GraphBuilder::build_static).
//!
//! Two readers are provided:
//!
//! - JSON, via serde ([`load_json`], [`from_json_str`])
//! - Graphviz DOT ([`load_dot`], [`crate::dot::parse_dot`])

use crate::dot::parse_dot;
use causa_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Attribute bag attached to a vertex or edge.
pub type Attributes = BTreeMap<String, String>;

/// A vertex declared in a static export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticVertex {
    /// Raw (escaped) identifier.
    pub id: String,
    /// Declared attributes.
    #[serde(default)]
    pub attributes: Attributes,
}

impl StaticVertex {
    /// Create a vertex with no attributes.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
        }
    }
}

/// An edge declared in a static export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticEdge {
    /// Raw source identifier.
    pub from: String,
    /// Raw target identifier.
    pub to: String,
    /// Declared attributes, usually including the topic name.
    #[serde(default)]
    pub attributes: Attributes,
}

impl StaticEdge {
    /// Create an edge with no attributes.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            attributes: Attributes::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A parsed static export.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticGraph {
    /// Explicitly declared vertices.
    #[serde(default)]
    pub vertices: Vec<StaticVertex>,
    /// Declared edges.
    #[serde(default)]
    pub edges: Vec<StaticEdge>,
}

impl StaticGraph {
    /// Create an empty export.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Load a JSON static export from a file.
pub fn load_json(path: impl AsRef<Path>) -> Result<StaticGraph> {
    let json = std::fs::read_to_string(path.as_ref())
        .map_err(|e| Error::io_with_path(e, path.as_ref()))?;
    from_json_str(&json)
}

/// Parse a JSON static export.
pub fn from_json_str(json: &str) -> Result<StaticGraph> {
    serde_json::from_str(json).map_err(|e| Error::parse(format!("Failed to parse graph JSON: {e}")))
}

/// Load a Graphviz DOT export from a file.
pub fn load_dot(path: impl AsRef<Path>) -> Result<StaticGraph> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| Error::io_with_path(e, path.as_ref()))?;
    parse_dot(&text)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_from_json_str() {
        let json = r#"{
            "vertices": [
                {"id": "n___a", "attributes": {"shape": "ellipse"}},
                {"id": "n___b"}
            ],
            "edges": [
                {"from": "n___a", "to": "n___b", "attributes": {"URL": "topic_3A__x"}}
            ]
        }"#;

        let export = from_json_str(json).unwrap();
        assert_eq!(export.vertices.len(), 2);
        assert_eq!(export.vertices[0].attributes["shape"], "ellipse");
        assert!(export.vertices[1].attributes.is_empty());
        assert_eq!(export.edges[0].attributes["URL"], "topic_3A__x");
    }

    #[test]
    fn test_from_json_str_missing_sections() {
        let export = from_json_str("{}").unwrap();
        assert!(export.vertices.is_empty());
        assert!(export.edges.is_empty());
    }

    #[test]
    fn test_from_json_str_invalid() {
        let err = from_json_str("{not json").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_load_json_and_dot_files() {
        let dir = tempdir().unwrap();

        let export = StaticGraph {
            vertices: vec![StaticVertex::new("n___a")],
            edges: vec![StaticEdge::new("n___a", "n___b").with_attribute("URL", "topic_3A__x")],
        };
        let json_path = dir.path().join("graph.json");
        std::fs::write(&json_path, serde_json::to_string(&export).unwrap()).unwrap();
        assert_eq!(load_json(&json_path).unwrap(), export);

        let dot_path = dir.path().join("graph.dot");
        std::fs::write(&dot_path, "digraph g { n___a -> n___b [URL=topic_3A__x]; }").unwrap();
        let parsed = load_dot(&dot_path).unwrap();
        assert_eq!(parsed.edges, export.edges);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_dot("/nonexistent/graph.dot").unwrap_err();
        assert!(matches!(err, Error::IoWithPath { .. }));
    }
}
