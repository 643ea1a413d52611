//! Error types for Causa operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used across
//! all Causa crates. Uses `thiserror` for derive macros.
//!
//! Graph-analysis failures (`VertexNotFound`, `CycleDetected`) are caller
//! configuration or precondition errors and are never retried.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur in Causa operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error without path context.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error on a specific file.
    #[error("I/O error at {path}: {source}")]
    IoWithPath {
        /// The underlying I/O error.
        source: std::io::Error,
        /// The file being accessed.
        path: PathBuf,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Content not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Failed to parse an input document.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A higher-level operation failed.
    #[error("Operation failed: {0}")]
    Operation(String),

    /// A source or sink vertex named by the caller is not in the graph.
    #[error("Vertex not found in graph: {id}")]
    VertexNotFound {
        /// Display form of the missing vertex (`node:a/b`).
        id: String,
    },

    /// Chain enumeration revisited a vertex on the current branch.
    #[error("Cycle detected along reverse-publish path: {}", path.join(" <- "))]
    CycleDetected {
        /// Branch from the sink back to the repeated vertex.
        path: Vec<String>,
    },

    /// A live introspection call failed.
    #[error("Introspection error: {0}")]
    Introspection(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error for a missing file.
    pub fn file_not_found(path: impl AsRef<Path>) -> Self {
        Self::NotFound(format!("file {}", path.as_ref().display()))
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an operation error.
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Create an introspection error.
    pub fn introspection(msg: impl Into<String>) -> Self {
        Self::Introspection(msg.into())
    }

    /// Create a vertex-not-found error.
    pub fn vertex_not_found(id: impl ToString) -> Self {
        Self::VertexNotFound { id: id.to_string() }
    }

    /// Attach a path to an I/O error.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoWithPath {
            source,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Whether this error names a missing vertex.
    pub fn is_vertex_not_found(&self) -> bool {
        matches!(self, Self::VertexNotFound { .. })
    }

    /// Whether this error reports a cycle.
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::CycleDetected { .. })
    }
}

/// Result type alias using Causa's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_not_found_display() {
        let err = Error::vertex_not_found("node:planning/cruise");
        assert_eq!(
            err.to_string(),
            "Vertex not found in graph: node:planning/cruise"
        );
        assert!(err.is_vertex_not_found());
        assert!(!err.is_cycle());
    }

    #[test]
    fn test_cycle_detected_display() {
        let err = Error::CycleDetected {
            path: vec!["node:c".into(), "topic:y".into(), "node:c".into()],
        };
        assert_eq!(
            err.to_string(),
            "Cycle detected along reverse-publish path: node:c <- topic:y <- node:c"
        );
        assert!(err.is_cycle());
    }

    #[test]
    fn test_io_with_path_display() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::io_with_path(io, "/tmp/graph.dot");
        assert!(err.to_string().contains("/tmp/graph.dot"));
    }

    #[test]
    fn test_io_from_conversion() {
        fn fails() -> Result<()> {
            Err(std::io::Error::other("boom"))?
        }
        assert!(matches!(fails(), Err(Error::Io(_))));
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(Error::config("x"), Error::Config(_)));
        assert!(matches!(Error::parse("x"), Error::Parse(_)));
        assert!(matches!(Error::operation("x"), Error::Operation(_)));
        assert!(matches!(Error::introspection("x"), Error::Introspection(_)));
        assert!(matches!(Error::file_not_found("/a"), Error::NotFound(_)));
    }
}
