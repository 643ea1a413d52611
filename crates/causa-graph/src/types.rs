//! Core graph types.
//!
//! Vertices are [`Entity`] values identified by an [`EntityId`], the pair
//! `(kind, path)`. The [`TopicGraph`] stores them in a petgraph `DiGraph`
//! and keeps an id → `NodeIndex` map so lookups never re-parse strings.
//!
//! An edge `a → b` means "data flows from `a` to `b`": a node publishes to
//! a topic, or a topic is delivered to a subscribing node.

use causa_core::{Error, Result};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// EntityKind / EntityId
// ============================================================================

/// Classification of a graph vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A middleware process that publishes and/or subscribes.
    Node,
    /// A named data channel between nodes.
    Topic,
    /// An identifier matching no known naming scheme; passed through opaquely.
    Unknown,
}

impl EntityKind {
    /// Get the canonical string name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Topic => "topic",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "node" => Ok(Self::Node),
            "topic" => Ok(Self::Topic),
            "unknown" => Ok(Self::Unknown),
            other => Err(Error::invalid_data(format!("unknown entity kind '{other}'"))),
        }
    }
}

/// Canonical vertex identity: `(kind, path)`.
///
/// `path` is a slash-separated hierarchical name without a leading slash,
/// e.g. `sensing/lidar/top/velodyne_packets`. For [`EntityKind::Unknown`]
/// it holds the raw identifier unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    /// Vertex classification.
    pub kind: EntityKind,
    /// Hierarchical name.
    pub path: String,
}

impl EntityId {
    /// Create an id of the given kind.
    pub fn new(kind: EntityKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Create a node id.
    pub fn node(path: impl Into<String>) -> Self {
        Self::new(EntityKind::Node, path)
    }

    /// Create a topic id.
    pub fn topic(path: impl Into<String>) -> Self {
        Self::new(EntityKind::Topic, path)
    }

    /// Create an unknown-kind id holding a raw identifier.
    pub fn unknown(raw: impl Into<String>) -> Self {
        Self::new(EntityKind::Unknown, raw)
    }

    /// First path segment (the subsystem, e.g. `sensing`).
    pub fn component(&self) -> &str {
        self.path.split('/').next().unwrap_or_default()
    }

    /// Last path segment, used as a short display label.
    pub fn label(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.path)
    }
}

impl FromStr for EntityId {
    type Err = Error;

    /// Parse `kind:path`. A leading `/` on node and topic paths is dropped,
    /// so `node:/planning/cruise` and `node:planning/cruise` are equal.
    fn from_str(s: &str) -> Result<Self> {
        let (kind, path) = s
            .split_once(':')
            .ok_or_else(|| Error::invalid_data(format!("expected kind:path, got '{s}'")))?;
        let kind: EntityKind = kind.trim().parse()?;
        let path = match kind {
            EntityKind::Unknown => path.to_string(),
            EntityKind::Node | EntityKind::Topic => path.trim().trim_start_matches('/').to_string(),
        };
        if path.is_empty() {
            return Err(Error::invalid_data(format!("empty path in '{s}'")));
        }
        Ok(Self { kind, path })
    }
}

// ============================================================================
// Entity
// ============================================================================

/// A vertex: identity plus an opaque attribute bag carried through unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Vertex identity.
    pub id: EntityId,
    /// Styling/metadata attributes from the source export.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Entity {
    /// Create an entity with no metadata.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            metadata: BTreeMap::new(),
        }
    }

    /// Add a metadata attribute.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Vertex classification.
    pub fn kind(&self) -> EntityKind {
        self.id.kind
    }
}

// ============================================================================
// TopicGraph
// ============================================================================

/// The two-layer node/topic graph for one analysis run.
///
/// Read-only once built: construction goes through
/// [`GraphBuilder`](crate::GraphBuilder) or [`TopicGraph::from_edges`], and
/// derived views are new graphs produced by [`TopicGraph::induced`].
#[derive(Clone, Debug, Default)]
pub struct TopicGraph {
    graph: DiGraph<Entity, ()>,
    index: HashMap<EntityId, NodeIndex>,
}

impl TopicGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph directly from an edge list.
    ///
    /// Endpoints are inserted on first sight; repeated vertices and edges
    /// are ignored.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (EntityId, EntityId)>,
    {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph.insert_edge(from, to);
        }
        graph
    }

    /// Insert a vertex, returning its index.
    ///
    /// Idempotent: an existing vertex keeps its index, and only metadata
    /// keys it does not already have are added.
    pub(crate) fn insert_entity(&mut self, entity: Entity) -> NodeIndex {
        if let Some(&idx) = self.index.get(&entity.id) {
            let existing = &mut self.graph[idx].metadata;
            for (key, value) in entity.metadata {
                existing.entry(key).or_insert(value);
            }
            return idx;
        }
        let id = entity.id.clone();
        let idx = self.graph.add_node(entity);
        self.index.insert(id, idx);
        idx
    }

    /// Insert an edge between two ids, creating bare vertices as needed.
    ///
    /// Returns `true` if the edge was new.
    pub(crate) fn insert_edge(&mut self, from: EntityId, to: EntityId) -> bool {
        let from_idx = self.insert_entity(Entity::new(from));
        let to_idx = self.insert_entity(Entity::new(to));
        self.insert_edge_between(from_idx, to_idx)
    }

    /// Insert an edge between two existing vertices. Returns `true` if new.
    pub(crate) fn insert_edge_between(&mut self, from: NodeIndex, to: NodeIndex) -> bool {
        if self.graph.contains_edge(from, to) {
            return false;
        }
        self.graph.add_edge(from, to, ());
        true
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Check if a vertex exists.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains_key(id)
    }

    /// Get the index for a vertex id.
    pub fn index_of(&self, id: &EntityId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Get the index for a vertex id, failing with `VertexNotFound`.
    pub fn require(&self, id: &EntityId) -> Result<NodeIndex> {
        self.index_of(id).ok_or_else(|| Error::vertex_not_found(id))
    }

    /// Get the entity at an index.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not belong to this graph.
    pub fn entity(&self, idx: NodeIndex) -> &Entity {
        &self.graph[idx]
    }

    /// Look up an entity by id.
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.index_of(id).map(|idx| &self.graph[idx])
    }

    /// All vertex indices in insertion order.
    pub fn indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// All entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.graph.node_weights()
    }

    /// All edges as `(from, to)` id pairs, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&EntityId, &EntityId)> {
        self.graph
            .edge_references()
            .map(|e| (&self.graph[e.source()].id, &self.graph[e.target()].id))
    }

    /// Vertex ids as a set, for comparing graphs.
    pub fn vertex_set(&self) -> BTreeSet<EntityId> {
        self.entities().map(|e| e.id.clone()).collect()
    }

    /// Edges as a set of id pairs, for comparing graphs.
    pub fn edge_set(&self) -> BTreeSet<(EntityId, EntityId)> {
        self.edges()
            .map(|(from, to)| (from.clone(), to.clone()))
            .collect()
    }

    /// Sources of incoming edges, ordered by edge insertion.
    pub fn predecessors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_in_order(idx, Direction::Incoming)
    }

    /// Targets of outgoing edges, ordered by edge insertion.
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_in_order(idx, Direction::Outgoing)
    }

    fn neighbors_in_order(&self, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| {
                let other = match direction {
                    Direction::Incoming => e.source(),
                    Direction::Outgoing => e.target(),
                };
                (e.id(), other)
            })
            .collect();
        edges.sort_by_key(|(edge, _)| *edge);
        edges.into_iter().map(|(_, other)| other).collect()
    }

    /// Number of incoming edges.
    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Incoming).count()
    }

    /// Number of outgoing edges.
    pub fn out_degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Outgoing).count()
    }

    /// Vertices with no incoming edges.
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.indices().filter(|&idx| self.in_degree(idx) == 0).collect()
    }

    /// Vertices with no outgoing edges.
    pub fn leaves(&self) -> Vec<NodeIndex> {
        self.indices().filter(|&idx| self.out_degree(idx) == 0).collect()
    }

    /// Build the induced subgraph on `keep`.
    ///
    /// Vertices and edges keep their relative insertion order; entities
    /// are cloned so the parent graph is never touched.
    pub fn induced(&self, keep: &HashSet<NodeIndex>) -> TopicGraph {
        let mut sub = TopicGraph::new();
        let mut mapping: HashMap<NodeIndex, NodeIndex> = HashMap::with_capacity(keep.len());
        for idx in self.indices().filter(|idx| keep.contains(idx)) {
            mapping.insert(idx, sub.insert_entity(self.graph[idx].clone()));
        }
        for edge in self.graph.edge_references() {
            if let (Some(&from), Some(&to)) = (mapping.get(&edge.source()), mapping.get(&edge.target())) {
                sub.insert_edge_between(from, to);
            }
        }
        sub
    }

    /// Access the underlying petgraph graph.
    pub fn inner(&self) -> &DiGraph<Entity, ()> {
        &self.graph
    }
}

// ============================================================================
// Subgraph
// ============================================================================

/// A named, immutable view derived from a parent [`TopicGraph`].
#[derive(Clone, Debug)]
pub struct Subgraph {
    /// View name, e.g. `topic:sensing/imu -> node:planning/cruise`.
    pub label: String,
    /// The induced graph.
    pub graph: TopicGraph,
}

impl Subgraph {
    /// Create a named view.
    pub fn new(label: impl Into<String>, graph: TopicGraph) -> Self {
        Self {
            label: label.into(),
            graph,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_graph() -> TopicGraph {
        TopicGraph::from_edges([
            (EntityId::node("a"), EntityId::topic("x")),
            (EntityId::topic("x"), EntityId::node("b")),
            (EntityId::node("b"), EntityId::topic("y")),
            (EntityId::topic("y"), EntityId::node("c")),
        ])
    }

    // ------------------------------------------------------------------------
    // EntityId
    // ------------------------------------------------------------------------

    #[test]
    fn test_entity_id_display() {
        let id = EntityId::topic("sensing/lidar/top/velodyne_packets");
        assert_eq!(id.to_string(), "topic:sensing/lidar/top/velodyne_packets");
    }

    #[test]
    fn test_entity_id_parse_strips_leading_slash() {
        let id: EntityId = "node:/planning/cruise".parse().unwrap();
        assert_eq!(id, EntityId::node("planning/cruise"));
    }

    #[test]
    fn test_entity_id_parse_unknown_keeps_raw() {
        let id: EntityId = "unknown:/weird__name".parse().unwrap();
        assert_eq!(id, EntityId::unknown("/weird__name"));
    }

    #[test]
    fn test_entity_id_parse_errors() {
        assert!("planning/cruise".parse::<EntityId>().is_err());
        assert!("service:a".parse::<EntityId>().is_err());
        assert!("node:/".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_entity_id_component_and_label() {
        let id = EntityId::node("sensing/lidar/top/velodyne_node");
        assert_eq!(id.component(), "sensing");
        assert_eq!(id.label(), "velodyne_node");

        let flat = EntityId::node("rviz");
        assert_eq!(flat.component(), "rviz");
        assert_eq!(flat.label(), "rviz");
    }

    // ------------------------------------------------------------------------
    // TopicGraph
    // ------------------------------------------------------------------------

    #[test]
    fn test_from_edges_counts() {
        let graph = chain_graph();
        assert_eq!(graph.vertex_count(), 5);
        assert_eq!(graph.edge_count(), 4);
        assert!(graph.contains(&EntityId::topic("x")));
        assert!(!graph.contains(&EntityId::node("x")));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut graph = chain_graph();
        let idx = graph.insert_entity(Entity::new(EntityId::node("a")));
        assert_eq!(Some(idx), graph.index_of(&EntityId::node("a")));
        assert!(!graph.insert_edge(EntityId::node("a"), EntityId::topic("x")));
        assert_eq!(graph.vertex_count(), 5);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_insert_merges_missing_metadata_only() {
        let mut graph = TopicGraph::new();
        graph.insert_entity(Entity::new(EntityId::node("a")).with_metadata("shape", "ellipse"));
        graph.insert_entity(
            Entity::new(EntityId::node("a"))
                .with_metadata("shape", "box")
                .with_metadata("label", "/a"),
        );
        let entity = graph.get(&EntityId::node("a")).unwrap();
        assert_eq!(entity.metadata["shape"], "ellipse");
        assert_eq!(entity.metadata["label"], "/a");
    }

    #[test]
    fn test_require_missing_vertex() {
        let graph = chain_graph();
        let err = graph.require(&EntityId::node("zzz")).unwrap_err();
        assert!(err.is_vertex_not_found());
    }

    #[test]
    fn test_degrees_roots_leaves() {
        let graph = chain_graph();
        let b = graph.index_of(&EntityId::node("b")).unwrap();
        assert_eq!(graph.in_degree(b), 1);
        assert_eq!(graph.out_degree(b), 1);

        let roots: Vec<_> = graph.roots().into_iter().map(|i| graph.entity(i).id.clone()).collect();
        let leaves: Vec<_> = graph.leaves().into_iter().map(|i| graph.entity(i).id.clone()).collect();
        assert_eq!(roots, vec![EntityId::node("a")]);
        assert_eq!(leaves, vec![EntityId::node("c")]);
    }

    #[test]
    fn test_predecessors_in_insertion_order() {
        let graph = TopicGraph::from_edges([
            (EntityId::node("r1"), EntityId::topic("t")),
            (EntityId::node("r2"), EntityId::topic("t")),
            (EntityId::node("r3"), EntityId::topic("t")),
        ]);
        let t = graph.index_of(&EntityId::topic("t")).unwrap();
        let preds: Vec<_> = graph
            .predecessors(t)
            .into_iter()
            .map(|i| graph.entity(i).id.path.clone())
            .collect();
        assert_eq!(preds, vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn test_induced_subgraph() {
        let graph = chain_graph();
        let keep: HashSet<_> = ["a", "b"]
            .iter()
            .map(|p| graph.index_of(&EntityId::node(*p)).unwrap())
            .chain(graph.index_of(&EntityId::topic("x")))
            .collect();

        let sub = graph.induced(&keep);
        assert_eq!(sub.vertex_count(), 3);
        assert_eq!(sub.edge_count(), 2);
        // Parent is untouched
        assert_eq!(graph.vertex_count(), 5);
    }

    #[test]
    fn test_vertex_and_edge_sets() {
        let graph = chain_graph();
        assert!(graph.vertex_set().contains(&EntityId::node("c")));
        assert!(
            graph
                .edge_set()
                .contains(&(EntityId::node("b"), EntityId::topic("y")))
        );
    }
}
