//! Graph construction.
//!
//! [`GraphBuilder`] produces one [`TopicGraph`] from either a static export
//! or a live [`Introspector`]. Both paths normalize identifiers first and
//! insert idempotently, so repeated names never create duplicate vertices
//! and building twice from the same input yields the same graph.
//!
//! # Static mode
//!
//! Each export edge `src → dst` carrying a topic attribute becomes
//! `src → topic → dst`, materializing the topic as its own vertex even when
//! the export only encodes node-to-node edges.
//!
//! # Live mode
//!
//! The node view (`topics_published_by` / `topics_subscribed_by`) and the
//! topic view (`publishers_of` / `subscribers_of`) are both collected and
//! their union is kept. Edges seen by only one view are reported in
//! [`BuildStats::view_mismatches`] rather than dropped.

use crate::introspect::Introspector;
use crate::normalize::{normalize, normalize_live};
use crate::{Entity, EntityId, EntityKind, StaticGraph, TopicGraph};
use causa_core::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Edge attribute naming the mediating topic in DOT exports.
pub const DEFAULT_TOPIC_ATTRIBUTE: &str = "URL";

/// Statistics from a graph build.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BuildStats {
    /// Number of vertices in the built graph.
    pub vertices_created: usize,
    /// Number of edges in the built graph.
    pub edges_created: usize,
    /// Raw edges (static) or discovered linkages (live) processed.
    pub edges_processed: usize,
    /// Raw identifiers that matched no naming scheme.
    pub unknown_identifiers: Vec<String>,
    /// Static edges with no topic attribute, kept as direct edges.
    pub unlabelled_edges: Vec<String>,
    /// Live edges reported by only one of the two views.
    pub view_mismatches: Vec<String>,
    /// Per-entity introspection failures (entity skipped).
    pub errors: Vec<String>,
}

/// Builds a [`TopicGraph`] from static or live input.
#[derive(Clone, Debug)]
pub struct GraphBuilder {
    topic_attribute: String,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Create a builder using [`DEFAULT_TOPIC_ATTRIBUTE`].
    pub fn new() -> Self {
        Self {
            topic_attribute: DEFAULT_TOPIC_ATTRIBUTE.to_string(),
        }
    }

    /// Set the edge attribute that names the mediating topic.
    pub fn with_topic_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.topic_attribute = attribute.into();
        self
    }

    /// Build from a static export.
    ///
    /// Never fails: malformed identifiers become unknown-kind vertices and
    /// are listed in the returned stats.
    pub fn build_static(&self, export: &StaticGraph) -> (TopicGraph, BuildStats) {
        let mut graph = TopicGraph::new();
        let mut stats = BuildStats::default();
        let mut unknown: HashSet<String> = HashSet::new();

        let mut classify = |raw: &str, stats: &mut BuildStats| {
            let id = normalize(raw);
            if id.kind == EntityKind::Unknown && unknown.insert(raw.to_string()) {
                log::warn!("identifier '{raw}' matches no naming scheme");
                stats.unknown_identifiers.push(raw.to_string());
            }
            id
        };

        for vertex in &export.vertices {
            let mut entity = Entity::new(classify(&vertex.id, &mut stats));
            entity.metadata = vertex.attributes.clone();
            graph.insert_entity(entity);
        }

        for edge in &export.edges {
            stats.edges_processed += 1;
            let from = graph.insert_entity(Entity::new(classify(&edge.from, &mut stats)));
            let to = graph.insert_entity(Entity::new(classify(&edge.to, &mut stats)));

            let raw_topic = edge
                .attributes
                .get(&self.topic_attribute)
                .filter(|raw| !raw.trim().is_empty());
            match raw_topic {
                Some(raw_topic) => {
                    let mut topic = Entity::new(attribute_topic(raw_topic));
                    topic.metadata = edge.attributes.clone();
                    let topic = graph.insert_entity(topic);
                    graph.insert_edge_between(from, topic);
                    graph.insert_edge_between(topic, to);
                }
                None => {
                    log::warn!(
                        "edge {} -> {} has no '{}' attribute, keeping it as a direct edge",
                        edge.from,
                        edge.to,
                        self.topic_attribute
                    );
                    stats
                        .unlabelled_edges
                        .push(format!("{} -> {}", edge.from, edge.to));
                    graph.insert_edge_between(from, to);
                }
            }
        }

        stats.vertices_created = graph.vertex_count();
        stats.edges_created = graph.edge_count();
        log::debug!(
            "static build: {} vertices, {} edges",
            stats.vertices_created,
            stats.edges_created
        );
        (graph, stats)
    }

    /// Build from a live system.
    ///
    /// Fails only if the node or topic listing fails; a failing per-entity
    /// query is recorded in [`BuildStats::errors`] and that entity's
    /// linkage from that view is skipped.
    pub fn build_live<I: Introspector + ?Sized>(
        &self,
        introspector: &I,
    ) -> Result<(TopicGraph, BuildStats)> {
        let mut graph = TopicGraph::new();
        let mut stats = BuildStats::default();

        let nodes = introspector.list_nodes()?;
        let topics = introspector.list_topics()?;
        log::debug!(
            "{}: {} nodes, {} topics",
            introspector.name(),
            nodes.len(),
            topics.len()
        );

        for name in &nodes {
            graph.insert_entity(Entity::new(normalize_live(EntityKind::Node, name)));
        }
        for name in &topics {
            graph.insert_entity(Entity::new(normalize_live(EntityKind::Topic, name)));
        }

        let mut node_view = EdgeView::default();
        for node in &nodes {
            let node_id = normalize_live(EntityKind::Node, node);
            match introspector.topics_published_by(node) {
                Ok(topics) => {
                    for topic in topics {
                        node_view.push(node_id.clone(), normalize_live(EntityKind::Topic, &topic));
                    }
                }
                Err(e) => record_failure(&mut stats, node, &e),
            }
            match introspector.topics_subscribed_by(node) {
                Ok(topics) => {
                    for topic in topics {
                        node_view.push(normalize_live(EntityKind::Topic, &topic), node_id.clone());
                    }
                }
                Err(e) => record_failure(&mut stats, node, &e),
            }
        }

        let mut topic_view = EdgeView::default();
        for topic in &topics {
            let topic_id = normalize_live(EntityKind::Topic, topic);
            match introspector.publishers_of(topic) {
                Ok(publishers) => {
                    for node in publishers {
                        topic_view.push(normalize_live(EntityKind::Node, &node), topic_id.clone());
                    }
                }
                Err(e) => record_failure(&mut stats, topic, &e),
            }
            match introspector.subscribers_of(topic) {
                Ok(subscribers) => {
                    for node in subscribers {
                        topic_view.push(topic_id.clone(), normalize_live(EntityKind::Node, &node));
                    }
                }
                Err(e) => record_failure(&mut stats, topic, &e),
            }
        }

        stats.edges_processed = node_view.order.len() + topic_view.order.len();

        for (from, to) in node_view.only_in(&topic_view) {
            stats
                .view_mismatches
                .push(format!("{from} -> {to} (node view only)"));
        }
        for (from, to) in topic_view.only_in(&node_view) {
            stats
                .view_mismatches
                .push(format!("{from} -> {to} (topic view only)"));
        }
        if !stats.view_mismatches.is_empty() {
            log::warn!(
                "{} edge(s) reported by only one introspection view",
                stats.view_mismatches.len()
            );
        }

        for (from, to) in node_view.order.into_iter().chain(topic_view.order) {
            graph.insert_edge(from, to);
        }

        stats.vertices_created = graph.vertex_count();
        stats.edges_created = graph.edge_count();
        Ok((graph, stats))
    }
}

/// Identity of the vertex named by an edge's topic attribute.
///
/// That position always holds a topic, so a name matching no encoding
/// (e.g. `sensing_points`) is taken as a topic path rather than unknown.
fn attribute_topic(raw: &str) -> EntityId {
    let id = normalize(raw);
    if id.kind == EntityKind::Unknown {
        log::debug!("bare topic name '{raw}' in topic attribute");
        EntityId::topic(raw.trim())
    } else {
        id
    }
}

/// Edges discovered by one introspection view, in discovery order.
#[derive(Default)]
struct EdgeView {
    order: Vec<(EntityId, EntityId)>,
    seen: HashSet<(EntityId, EntityId)>,
}

impl EdgeView {
    fn push(&mut self, from: EntityId, to: EntityId) {
        let edge = (from, to);
        if self.seen.insert(edge.clone()) {
            self.order.push(edge);
        }
    }

    fn only_in<'a>(&'a self, other: &'a EdgeView) -> impl Iterator<Item = &'a (EntityId, EntityId)> {
        self.order.iter().filter(|edge| !other.seen.contains(*edge))
    }
}

fn record_failure(stats: &mut BuildStats, name: &str, error: &causa_core::Error) {
    log::warn!("introspection of {name} failed: {error}");
    stats.errors.push(format!("{name}: {error}"));
}

// ============================================================================
// Tests
// ============================================================================
