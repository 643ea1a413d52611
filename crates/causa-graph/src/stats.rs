//! Graph statistics.
//!
//! Provides functions for summarising graph composition: vertex counts per
//! kind, root/leaf/orphan counts, degree distribution, and top-vertex
//! rankings.

use crate::{EntityKind, TopicGraph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Types
// ============================================================================

/// Comprehensive statistics about a graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphStats {
    /// Total number of vertices.
    pub vertex_count: usize,
    /// Total number of edges.
    pub edge_count: usize,
    /// Number of node vertices.
    pub node_count: usize,
    /// Number of topic vertices.
    pub topic_count: usize,
    /// Number of unknown-kind vertices.
    pub unknown_count: usize,
    /// Vertices per top-level component.
    pub component_distribution: BTreeMap<String, usize>,
    /// Vertices with no incoming edges (orphans excluded).
    pub root_count: usize,
    /// Vertices with no outgoing edges (orphans excluded).
    pub leaf_count: usize,
    /// Vertices without any edges.
    pub orphan_count: usize,
    /// Average edges per vertex (in + out).
    pub avg_degree: f32,
    /// Maximum in-degree.
    pub max_in_degree: usize,
    /// Maximum out-degree.
    pub max_out_degree: usize,
    /// Vertex with the highest in-degree (most publishers or topics feeding it).
    pub most_fed: Option<String>,
    /// Vertex with the highest out-degree (widest fan-out).
    pub most_fanout: Option<String>,
}

/// Direction for degree calculation.
#[derive(Clone, Copy, Debug)]
pub enum DegreeDirection {
    /// Incoming edges only.
    In,
    /// Outgoing edges only.
    Out,
    /// Both directions.
    Both,
}

// ============================================================================
// Functions
// ============================================================================

/// Compute comprehensive statistics for a graph.
pub fn compute_stats(graph: &TopicGraph) -> GraphStats {
    let vertex_count = graph.vertex_count();
    let edge_count = graph.edge_count();

    let mut node_count = 0;
    let mut topic_count = 0;
    let mut unknown_count = 0;
    let mut component_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for entity in graph.entities() {
        match entity.kind() {
            EntityKind::Node => node_count += 1,
            EntityKind::Topic => topic_count += 1,
            EntityKind::Unknown => unknown_count += 1,
        }
        *component_distribution
            .entry(entity.id.component().to_string())
            .or_insert(0) += 1;
    }

    let mut root_count = 0;
    let mut leaf_count = 0;
    let mut orphan_count = 0;
    let mut max_in: Option<(usize, String)> = None;
    let mut max_out: Option<(usize, String)> = None;

    for idx in graph.indices() {
        let in_degree = graph.in_degree(idx);
        let out_degree = graph.out_degree(idx);
        match (in_degree, out_degree) {
            (0, 0) => orphan_count += 1,
            (0, _) => root_count += 1,
            (_, 0) => leaf_count += 1,
            _ => {}
        }

        // First vertex wins ties so results follow insertion order.
        let id = &graph.entity(idx).id;
        if max_in.as_ref().is_none_or(|(best, _)| in_degree > *best) {
            max_in = Some((in_degree, id.to_string()));
        }
        if max_out.as_ref().is_none_or(|(best, _)| out_degree > *best) {
            max_out = Some((out_degree, id.to_string()));
        }
    }

    // Each edge contributes one in-degree and one out-degree
    let avg_degree = if vertex_count > 0 {
        (2 * edge_count) as f32 / vertex_count as f32
    } else {
        0.0
    };

    let (max_in_degree, most_fed) = split(max_in);
    let (max_out_degree, most_fanout) = split(max_out);

    GraphStats {
        vertex_count,
        edge_count,
        node_count,
        topic_count,
        unknown_count,
        component_distribution,
        root_count,
        leaf_count,
        orphan_count,
        avg_degree,
        max_in_degree,
        max_out_degree,
        most_fed,
        most_fanout,
    }
}

fn split(best: Option<(usize, String)>) -> (usize, Option<String>) {
    match best {
        Some((degree, id)) => (degree, Some(id)),
        None => (0, None),
    }
}

/// Get a quick summary of graph size.
pub fn quick_summary(graph: &TopicGraph) -> String {
    format!(
        "{} vertices, {} edges",
        graph.vertex_count(),
        graph.edge_count()
    )
}

/// Get top N vertices by degree.
///
/// Ties keep insertion order.
pub fn top_vertices_by_degree(
    graph: &TopicGraph,
    limit: usize,
    direction: DegreeDirection,
) -> Vec<(String, usize)> {
    let mut scores: Vec<(String, usize)> = graph
        .indices()
        .map(|idx| {
            let degree = match direction {
                DegreeDirection::In => graph.in_degree(idx),
                DegreeDirection::Out => graph.out_degree(idx),
                DegreeDirection::Both => graph.in_degree(idx) + graph.out_degree(idx),
            };
            (graph.entity(idx).id.to_string(), degree)
        })
        .collect();

    scores.sort_by(|a, b| b.1.cmp(&a.1));
    scores.truncate(limit);
    scores
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Entity, EntityId};

    fn create_test_graph() -> TopicGraph {
        let mut graph = TopicGraph::from_edges([
            (EntityId::node("sensing/lidar"), EntityId::topic("sensing/points")),
            (EntityId::node("sensing/radar"), EntityId::topic("sensing/points")),
            (EntityId::topic("sensing/points"), EntityId::node("perception/fusion")),
            (EntityId::node("perception/fusion"), EntityId::topic("perception/objects")),
        ]);
        graph.insert_entity(Entity::new(EntityId::unknown("orphan")));
        graph
    }

    #[test]
    fn test_compute_stats_basic_counts() {
        let stats = compute_stats(&create_test_graph());

        assert_eq!(stats.vertex_count, 6);
        assert_eq!(stats.edge_count, 4);
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.topic_count, 2);
        assert_eq!(stats.unknown_count, 1);
    }

    #[test]
    fn test_compute_stats_component_distribution() {
        let stats = compute_stats(&create_test_graph());

        assert_eq!(stats.component_distribution["sensing"], 3);
        assert_eq!(stats.component_distribution["perception"], 2);
        assert_eq!(stats.component_distribution["orphan"], 1);
    }

    #[test]
    fn test_compute_stats_roots_leaves_orphans() {
        let stats = compute_stats(&create_test_graph());

        assert_eq!(stats.root_count, 2); // lidar, radar
        assert_eq!(stats.leaf_count, 1); // perception/objects
        assert_eq!(stats.orphan_count, 1);
    }

    #[test]
    fn test_compute_stats_avg_degree() {
        let stats = compute_stats(&create_test_graph());

        // 4 edges -> 8 total degree over 6 vertices
        assert!((stats.avg_degree - 8.0 / 6.0).abs() < 0.01);
    }

    #[test]
    fn test_compute_stats_max_degrees() {
        let stats = compute_stats(&create_test_graph());

        assert_eq!(stats.max_in_degree, 2);
        assert_eq!(stats.most_fed.as_deref(), Some("topic:sensing/points"));
        // All fan-outs are 1; the first vertex wins the tie
        assert_eq!(stats.max_out_degree, 1);
        assert_eq!(stats.most_fanout.as_deref(), Some("node:sensing/lidar"));
    }

    #[test]
    fn test_compute_stats_empty_graph() {
        let stats = compute_stats(&TopicGraph::new());

        assert_eq!(stats.vertex_count, 0);
        assert_eq!(stats.edge_count, 0);
        assert_eq!(stats.avg_degree, 0.0);
        assert!(stats.most_fed.is_none());
        assert!(stats.most_fanout.is_none());
    }

    #[test]
    fn test_quick_summary() {
        assert_eq!(quick_summary(&create_test_graph()), "6 vertices, 4 edges");
        assert_eq!(quick_summary(&TopicGraph::new()), "0 vertices, 0 edges");
    }

    #[test]
    fn test_top_vertices_by_degree_in() {
        let top = top_vertices_by_degree(&create_test_graph(), 2, DegreeDirection::In);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0], ("topic:sensing/points".to_string(), 2));
    }

    #[test]
    fn test_top_vertices_by_degree_both() {
        let top = top_vertices_by_degree(&create_test_graph(), 3, DegreeDirection::Both);

        assert_eq!(top[0], ("topic:sensing/points".to_string(), 3));
        assert_eq!(top[1], ("node:perception/fusion".to_string(), 2));
    }

    #[test]
    fn test_top_vertices_limit_and_empty() {
        let top = top_vertices_by_degree(&create_test_graph(), 1, DegreeDirection::Out);
        assert_eq!(top.len(), 1);

        let none = top_vertices_by_degree(&TopicGraph::new(), 5, DegreeDirection::Both);
        assert!(none.is_empty());
    }

    #[test]
    fn test_graph_stats_serialization() {
        let stats = compute_stats(&create_test_graph());

        let json = serde_json::to_string(&stats).unwrap();
        let parsed: GraphStats = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.vertex_count, stats.vertex_count);
        assert_eq!(parsed.orphan_count, stats.orphan_count);
    }
}
