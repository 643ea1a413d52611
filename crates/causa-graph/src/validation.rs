//! Graph validation and integrity checking.
//!
//! Provides functions to validate graph structure and detect issues such as
//! orphan vertices, self-loops, cycles (which break chain enumeration),
//! unclassified identifiers, and edges violating the node/topic layering.

use crate::{EntityKind, TopicGraph};
use petgraph::algo::tarjan_scc;
use serde::{Deserialize, Serialize};

// ============================================================================
// Types
// ============================================================================

/// Result of graph validation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the graph is valid (no critical issues).
    pub valid: bool,
    /// Critical issues that should be fixed.
    pub errors: Vec<ValidationIssue>,
    /// Non-critical issues (warnings).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Create a new empty (valid) result.
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error (marks graph as invalid).
    pub fn add_error(&mut self, issue: ValidationIssue) {
        self.valid = false;
        self.errors.push(issue);
    }

    /// Add a warning.
    pub fn add_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Total issue count (errors + warnings).
    pub fn total_issues(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// A validation issue found in the graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Issue type/code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Affected vertex ids.
    #[serde(default)]
    pub vertices: Vec<String>,
    /// Affected edge descriptions.
    #[serde(default)]
    pub edges: Vec<String>,
}

impl ValidationIssue {
    /// Create a new issue.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            vertices: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Attach affected vertices.
    pub fn with_vertices(mut self, vertices: Vec<String>) -> Self {
        self.vertices = vertices;
        self
    }

    /// Attach affected edges.
    pub fn with_edges(mut self, edges: Vec<String>) -> Self {
        self.edges = edges;
        self
    }
}

// ============================================================================
// Validation functions
// ============================================================================

/// Validate a graph for common issues.
///
/// Errors:
/// - Self-loops
/// - Cycles (chain enumeration would not terminate)
///
/// Warnings:
/// - Orphan vertices (no connections)
/// - Unknown-kind vertices
/// - Node → node and topic → topic edges
pub fn validate_graph(graph: &TopicGraph) -> ValidationResult {
    let mut result = ValidationResult::new();

    check_self_loops(graph, &mut result);
    check_cycles(graph, &mut result);
    check_orphans(graph, &mut result);
    check_unknown_kinds(graph, &mut result);
    check_layering(graph, &mut result);

    result
}

/// Quick check if graph has any validation errors.
pub fn is_valid(graph: &TopicGraph) -> bool {
    validate_graph(graph).valid
}

// ============================================================================
// Individual checks
// ============================================================================

fn check_self_loops(graph: &TopicGraph, result: &mut ValidationResult) {
    let self_loops: Vec<String> = graph
        .edges()
        .filter(|(from, to)| from == to)
        .map(|(from, to)| format!("{from} -> {to}"))
        .collect();

    if !self_loops.is_empty() {
        result.add_error(
            ValidationIssue::new(
                "SELF_LOOPS",
                format!("{} edge(s) are self-loops", self_loops.len()),
            )
            .with_edges(self_loops),
        );
    }
}

/// Multi-vertex strongly connected components; self-loops are reported
/// separately.
fn check_cycles(graph: &TopicGraph, result: &mut ValidationResult) {
    let mut components: Vec<Vec<String>> = tarjan_scc(graph.inner())
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| {
            let mut ids: Vec<String> = component
                .into_iter()
                .map(|idx| graph.entity(idx).id.to_string())
                .collect();
            ids.sort_unstable();
            ids
        })
        .collect();
    components.sort_unstable();

    for ids in components {
        result.add_error(
            ValidationIssue::new(
                "CYCLE",
                format!("{} vertices form a cycle", ids.len()),
            )
            .with_vertices(ids),
        );
    }
}

fn check_orphans(graph: &TopicGraph, result: &mut ValidationResult) {
    let orphans: Vec<String> = graph
        .indices()
        .filter(|&idx| graph.in_degree(idx) == 0 && graph.out_degree(idx) == 0)
        .map(|idx| graph.entity(idx).id.to_string())
        .collect();

    if !orphans.is_empty() {
        result.add_warning(
            ValidationIssue::new(
                "ORPHAN_VERTICES",
                format!("{} vertex(es) have no connections", orphans.len()),
            )
            .with_vertices(orphans),
        );
    }
}

fn check_unknown_kinds(graph: &TopicGraph, result: &mut ValidationResult) {
    let unknown: Vec<String> = graph
        .entities()
        .filter(|e| e.kind() == EntityKind::Unknown)
        .map(|e| e.id.path.clone())
        .collect();

    if !unknown.is_empty() {
        result.add_warning(
            ValidationIssue::new(
                "UNKNOWN_KIND",
                format!("{} identifier(s) match no naming scheme", unknown.len()),
            )
            .with_vertices(unknown),
        );
    }
}

/// Edges between unknown vertices are opaque and never flagged.
fn check_layering(graph: &TopicGraph, result: &mut ValidationResult) {
    let violations: Vec<String> = graph
        .edges()
        .filter(|(from, to)| {
            from != to
                && from.kind == to.kind
                && from.kind != EntityKind::Unknown
        })
        .map(|(from, to)| format!("{from} -> {to}"))
        .collect();

    if !violations.is_empty() {
        result.add_warning(
            ValidationIssue::new(
                "LAYER_VIOLATION",
                format!(
                    "{} edge(s) link two vertices of the same kind",
                    violations.len()
                ),
            )
            .with_edges(violations),
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
