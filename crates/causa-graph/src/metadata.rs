//! Per-vertex metadata handed to renderers.
//!
//! Everything here is derived from graph structure alone: degrees, a
//! root/leaf classification, and the shortest distance to the nearest leaf
//! and from the nearest root. Styling is left to the consumer.

use crate::{EntityKind, Subgraph, TopicGraph};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Structural position of a vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexRole {
    /// No edges at all.
    Singleton,
    /// No incoming edges.
    Root,
    /// No outgoing edges.
    Leaf,
    /// Both incoming and outgoing edges.
    Internal,
}

impl VertexRole {
    /// Classify from degrees. An isolated vertex is a singleton, not a root.
    pub fn from_degrees(in_degree: usize, out_degree: usize) -> Self {
        match (in_degree, out_degree) {
            (0, 0) => Self::Singleton,
            (0, _) => Self::Root,
            (_, 0) => Self::Leaf,
            _ => Self::Internal,
        }
    }
}

/// Derived metadata for one vertex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexMetadata {
    /// Display form of the id (`kind:path`).
    pub id: String,
    /// Vertex classification.
    pub kind: EntityKind,
    /// Hierarchical name.
    pub path: String,
    /// First path segment.
    pub component: String,
    /// Last path segment.
    pub label: String,
    /// Number of incoming edges.
    pub in_degree: usize,
    /// Number of outgoing edges.
    pub out_degree: usize,
    /// Structural position.
    pub role: VertexRole,
    /// Shortest distance to any leaf, if one is reachable.
    pub sink_distance: Option<usize>,
    /// Shortest distance from any root, if one reaches this vertex.
    pub source_distance: Option<usize>,
    /// Attributes carried through from the source export.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// An edge in a [`GraphView`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEdge {
    /// Source vertex id.
    pub from: String,
    /// Target vertex id.
    pub to: String,
}

/// A renderer-ready graph: metadata keyed by vertex id plus an edge list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphView {
    /// View name.
    pub label: String,
    /// Always `true`; present for consumers that handle both kinds.
    pub directed: bool,
    /// Per-vertex metadata keyed by `kind:path`.
    pub vertices: BTreeMap<String, VertexMetadata>,
    /// Edges in insertion order.
    pub edges: Vec<ViewEdge>,
}

impl GraphView {
    /// Build a view of a whole graph.
    pub fn new(label: impl Into<String>, graph: &TopicGraph) -> Self {
        let vertices = vertex_metadata(graph)
            .into_iter()
            .map(|meta| (meta.id.clone(), meta))
            .collect();
        let edges = graph
            .edges()
            .map(|(from, to)| ViewEdge {
                from: from.to_string(),
                to: to.to_string(),
            })
            .collect();
        Self {
            label: label.into(),
            directed: true,
            vertices,
            edges,
        }
    }

    /// Build a view of a named subgraph.
    pub fn from_subgraph(subgraph: &Subgraph) -> Self {
        Self::new(subgraph.label.clone(), &subgraph.graph)
    }
}

/// Compute metadata for every vertex, in insertion order.
pub fn vertex_metadata(graph: &TopicGraph) -> Vec<VertexMetadata> {
    let to_leaf = nearest_distances(graph, &graph.leaves(), Walk::Upstream);
    let from_root = nearest_distances(graph, &graph.roots(), Walk::Downstream);

    graph
        .indices()
        .map(|idx| {
            let entity = graph.entity(idx);
            let in_degree = graph.in_degree(idx);
            let out_degree = graph.out_degree(idx);
            VertexMetadata {
                id: entity.id.to_string(),
                kind: entity.kind(),
                path: entity.id.path.clone(),
                component: entity.id.component().to_string(),
                label: entity.id.label().to_string(),
                in_degree,
                out_degree,
                role: VertexRole::from_degrees(in_degree, out_degree),
                sink_distance: to_leaf.get(&idx).copied(),
                source_distance: from_root.get(&idx).copied(),
                attributes: entity.metadata.clone(),
            }
        })
        .collect()
}

#[derive(Clone, Copy)]
enum Walk {
    Upstream,
    Downstream,
}

/// Multi-source BFS: distance from each vertex to the closest of `seeds`.
///
/// Equivalent to the minimum over all-pairs shortest paths restricted to
/// the seed set, in linear time.
fn nearest_distances(graph: &TopicGraph, seeds: &[NodeIndex], walk: Walk) -> HashMap<NodeIndex, usize> {
    let mut dist: HashMap<NodeIndex, usize> = seeds.iter().map(|&s| (s, 0)).collect();
    let mut queue: VecDeque<NodeIndex> = seeds.iter().copied().collect();

    while let Some(current) = queue.pop_front() {
        let Some(&d) = dist.get(&current) else {
            continue;
        };
        let next = match walk {
            Walk::Upstream => graph.predecessors(current),
            Walk::Downstream => graph.successors(current),
        };
        for other in next {
            if !dist.contains_key(&other) {
                dist.insert(other, d + 1);
                queue.push_back(other);
            }
        }
    }

    dist
}

// ============================================================================
// Tests
// ============================================================================
