//! Constrained reachability between sources and a sink.
//!
//! [`extract`] keeps exactly the vertices lying on some path from a source
//! to the sink. Reachability is computed on an auxiliary view of the graph
//! that drops the sink's outgoing edges and the source's incoming edges, so
//! paths that leave the sink and come back, or that enter the source from
//! elsewhere, do not pull extra vertices in. The returned edges are induced
//! from the parent graph.

use crate::{EntityId, Subgraph, TopicGraph};
use causa_core::{Error, Result};
use petgraph::graph::NodeIndex;
use std::collections::{HashSet, VecDeque};

/// Label prefix of the combined multi-source view.
pub const ALL_SOURCES_LABEL: &str = "all_sources";

/// Label of the unfiltered view.
pub const FULL_LABEL: &str = "full";

// ============================================================================
// Public API
// ============================================================================

/// Extract the constrained subgraph between `source` and `sink`.
///
/// Vertex set is `(A ∩ D) ∪ {source, sink}` where `D` is everything
/// reachable from `source` and `A` everything reaching `sink`, both on the
/// auxiliary graph. An unreachable pair yields the two vertices with no
/// edges; `source == sink` yields that single vertex.
///
/// # Errors
///
/// `VertexNotFound` if either endpoint is absent from `graph`.
pub fn extract(graph: &TopicGraph, source: &EntityId, sink: &EntityId) -> Result<Subgraph> {
    let s = graph.require(source)?;
    let t = graph.require(sink)?;
    let label = format!("{source} -> {sink}");

    if s == t {
        let mut single = TopicGraph::new();
        single.insert_entity(graph.entity(s).clone());
        return Ok(Subgraph::new(label, single));
    }

    let keep = constrained_vertices(graph, s, t);
    log::debug!("{label}: {} vertices on constrained paths", keep.len());
    Ok(Subgraph::new(label, graph.induced(&keep)))
}

/// Union of [`extract`] over several sources against one sink.
///
/// The vertex set is the union of the per-source vertex sets; edges are
/// induced from the parent graph on that union.
///
/// # Errors
///
/// `InvalidData` if `sources` is empty, `VertexNotFound` if any id is absent.
pub fn extract_multi(graph: &TopicGraph, sources: &[EntityId], sink: &EntityId) -> Result<Subgraph> {
    if sources.is_empty() {
        return Err(Error::invalid_data("at least one source is required"));
    }
    let t = graph.require(sink)?;

    let mut keep = HashSet::new();
    for source in sources {
        let s = graph.require(source)?;
        if s == t {
            keep.insert(s);
        } else {
            keep.extend(constrained_vertices(graph, s, t));
        }
    }

    Ok(Subgraph::new(
        format!("{ALL_SOURCES_LABEL} -> {sink}"),
        graph.induced(&keep),
    ))
}

/// The sink plus every vertex that can reach it, with induced edges.
///
/// # Errors
///
/// `VertexNotFound` if `sink` is absent.
pub fn ancestors_subgraph(graph: &TopicGraph, sink: &EntityId) -> Result<Subgraph> {
    let t = graph.require(sink)?;
    let keep = bfs(graph, t, Step::Backward, |_, _| true);
    Ok(Subgraph::new(format!("ancestors of {sink}"), graph.induced(&keep)))
}

/// The named view set for one analysis run.
///
/// Order: the combined `all_sources -> sink` view, the `full` graph, then
/// one view per source in the order given.
///
/// # Errors
///
/// Same as [`extract_multi`].
pub fn analysis_views(
    graph: &TopicGraph,
    sources: &[EntityId],
    sink: &EntityId,
) -> Result<Vec<Subgraph>> {
    let per_source = sources
        .iter()
        .map(|source| extract(graph, source, sink))
        .collect::<Result<Vec<_>>>()?;

    let mut views = Vec::with_capacity(per_source.len() + 2);
    views.push(extract_multi(graph, sources, sink)?);
    views.push(Subgraph::new(FULL_LABEL, graph.clone()));
    views.extend(per_source);
    Ok(views)
}

// ============================================================================
// Traversal
// ============================================================================

#[derive(Clone, Copy)]
enum Step {
    Forward,
    Backward,
}

fn constrained_vertices(graph: &TopicGraph, s: NodeIndex, t: NodeIndex) -> HashSet<NodeIndex> {
    // An edge (from, to) is usable unless it leaves the sink or enters the source.
    let usable = |from: NodeIndex, to: NodeIndex| from != t && to != s;

    let descendants = bfs(graph, s, Step::Forward, usable);
    let mut keep: HashSet<NodeIndex> = if descendants.contains(&t) {
        let ancestors = bfs(graph, t, Step::Backward, usable);
        descendants.intersection(&ancestors).copied().collect()
    } else {
        HashSet::new()
    };
    keep.insert(s);
    keep.insert(t);
    keep
}

/// Breadth-first closure from `start`, following only edges accepted by
/// `usable(from, to)`.
fn bfs<F>(graph: &TopicGraph, start: NodeIndex, step: Step, usable: F) -> HashSet<NodeIndex>
where
    F: Fn(NodeIndex, NodeIndex) -> bool,
{
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        let next = match step {
            Step::Forward => graph.successors(current),
            Step::Backward => graph.predecessors(current),
        };
        for other in next {
            let (from, to) = match step {
                Step::Forward => (current, other),
                Step::Backward => (other, current),
            };
            if usable(from, to) && visited.insert(other) {
                queue.push_back(other);
            }
        }
    }

    visited
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn n(path: &str) -> EntityId {
        EntityId::node(path)
    }

    fn t(path: &str) -> EntityId {
        EntityId::topic(path)
    }

    /// `A → X → B → Y → C`
    fn scenario() -> TopicGraph {
        TopicGraph::from_edges([
            (n("A"), t("X")),
            (t("X"), n("B")),
            (n("B"), t("Y")),
            (t("Y"), n("C")),
        ])
    }

    fn ids(sub: &Subgraph) -> BTreeSet<EntityId> {
        sub.graph.vertex_set()
    }

    /// Whether `to` is reachable from `from` using only the graph's edges.
    fn has_path(graph: &TopicGraph, from: &EntityId, to: &EntityId) -> bool {
        let (Some(start), Some(goal)) = (graph.index_of(from), graph.index_of(to)) else {
            return false;
        };
        bfs(graph, start, Step::Forward, |_, _| true).contains(&goal)
    }

    // ------------------------------------------------------------------------
    // extract
    // ------------------------------------------------------------------------

    #[test]
    fn test_extract_scenario_keeps_whole_chain() {
        let graph = scenario();
        let sub = extract(&graph, &n("A"), &n("C")).unwrap();

        assert_eq!(sub.graph.vertex_count(), 5);
        assert_eq!(sub.graph.edge_count(), 4);
        assert_eq!(sub.label, "node:A -> node:C");
    }

    #[test]
    fn test_extract_drops_side_branches() {
        let mut edges = vec![
            (n("A"), t("X")),
            (t("X"), n("B")),
            (n("B"), t("Y")),
            (t("Y"), n("C")),
        ];
        // Unrelated publisher into the chain and a dead-end branch
        edges.push((n("other"), t("X")));
        edges.push((n("B"), t("log")));
        let graph = TopicGraph::from_edges(edges);

        let sub = extract(&graph, &n("A"), &n("C")).unwrap();
        assert!(!sub.graph.contains(&n("other")));
        assert!(!sub.graph.contains(&t("log")));
        assert_eq!(sub.graph.vertex_count(), 5);
    }

    #[test]
    fn test_extract_excludes_cycle_through_sink() {
        // A → X → C → Z → D → W → C: D and its topics are only reachable by
        // leaving the sink.
        let graph = TopicGraph::from_edges([
            (n("A"), t("X")),
            (t("X"), n("C")),
            (n("C"), t("Z")),
            (t("Z"), n("D")),
            (n("D"), t("W")),
            (t("W"), n("C")),
        ]);

        let sub = extract(&graph, &n("A"), &n("C")).unwrap();
        assert_eq!(ids(&sub), BTreeSet::from([n("A"), t("X"), n("C")]));
    }

    #[test]
    fn test_extract_excludes_reentry_into_source() {
        // P → Q → A is upstream of the source and must not appear.
        let graph = TopicGraph::from_edges([
            (n("P"), t("Q")),
            (t("Q"), n("A")),
            (n("A"), t("X")),
            (t("X"), n("C")),
            (n("C"), t("R")),
            (t("R"), n("A")),
        ]);

        let sub = extract(&graph, &n("A"), &n("C")).unwrap();
        assert_eq!(ids(&sub), BTreeSet::from([n("A"), t("X"), n("C")]));
        // Removed edges are restored when both endpoints survive
        assert!(sub.graph.edge_set().contains(&(n("A"), t("X"))));
    }

    #[test]
    fn test_extract_restores_edges_between_kept_endpoints() {
        // Direct sink → source edge is not a path vertex, but the induced
        // edge set still comes from the parent graph.
        let graph = TopicGraph::from_edges([
            (n("A"), t("X")),
            (t("X"), n("C")),
            (n("C"), n("A")),
        ]);
        let sub = extract(&graph, &n("A"), &n("C")).unwrap();
        assert_eq!(sub.graph.edge_count(), 3);
    }

    #[test]
    fn test_extract_unreachable_pair() {
        let graph = TopicGraph::from_edges([(n("A"), t("X")), (n("C"), t("Y"))]);
        let sub = extract(&graph, &n("A"), &n("C")).unwrap();

        assert_eq!(ids(&sub), BTreeSet::from([n("A"), n("C")]));
        assert_eq!(sub.graph.edge_count(), 0);
    }

    #[test]
    fn test_extract_reversed_direction_is_unreachable() {
        let graph = scenario();
        let sub = extract(&graph, &n("C"), &n("A")).unwrap();
        assert_eq!(sub.graph.vertex_count(), 2);
        assert_eq!(sub.graph.edge_count(), 0);
    }

    #[test]
    fn test_extract_source_equals_sink() {
        let graph = TopicGraph::from_edges([(n("A"), t("X")), (t("X"), n("A"))]);
        let sub = extract(&graph, &n("A"), &n("A")).unwrap();
        assert_eq!(ids(&sub), BTreeSet::from([n("A")]));
        assert_eq!(sub.graph.edge_count(), 0);
    }

    #[test]
    fn test_extract_missing_vertex() {
        let graph = scenario();
        let err = extract(&graph, &n("missing"), &n("C")).unwrap_err();
        assert!(err.is_vertex_not_found());
        let err = extract(&graph, &n("A"), &t("missing")).unwrap_err();
        assert!(err.is_vertex_not_found());
    }

    #[test]
    fn test_extract_vertices_lie_on_source_sink_paths() {
        // Diamond with a shared downstream branch and a feedback loop
        let graph = TopicGraph::from_edges([
            (n("s"), t("a")),
            (n("s"), t("b")),
            (t("a"), n("m")),
            (t("b"), n("m")),
            (n("m"), t("out")),
            (t("out"), n("sink")),
            (n("m"), t("debug")),
            (t("debug"), n("viewer")),
            (n("sink"), t("fb")),
            (t("fb"), n("m")),
        ]);
        let source = n("s");
        let sink = n("sink");
        let sub = extract(&graph, &source, &sink).unwrap();

        for v in ids(&sub) {
            assert!(v == source || has_path(&graph, &source, &v), "{v} not reachable");
            assert!(v == sink || has_path(&graph, &v, &sink), "{v} cannot reach sink");
        }
        assert!(!sub.graph.contains(&n("viewer")));
        assert!(!sub.graph.contains(&t("fb")));
        assert_eq!(sub.graph.vertex_count(), 6);
    }

    // ------------------------------------------------------------------------
    // extract_multi
    // ------------------------------------------------------------------------

    fn two_sources() -> TopicGraph {
        TopicGraph::from_edges([
            (n("s1"), t("a")),
            (t("a"), n("m")),
            (n("s2"), t("b")),
            (t("b"), n("sink")),
            (n("m"), t("c")),
            (t("c"), n("sink")),
            (n("s2"), t("unrelated")),
        ])
    }

    #[test]
    fn test_extract_multi_is_union_of_single_extracts() {
        let graph = two_sources();
        let sources = [n("s1"), n("s2")];
        let sink = n("sink");

        let combined = extract_multi(&graph, &sources, &sink).unwrap();
        let mut expected = BTreeSet::new();
        for source in &sources {
            expected.extend(ids(&extract(&graph, source, &sink).unwrap()));
        }

        assert_eq!(ids(&combined), expected);
        assert_eq!(combined.label, "all_sources -> node:sink");
        assert!(!combined.graph.contains(&t("unrelated")));
    }

    #[test]
    fn test_extract_multi_requires_sources() {
        let graph = two_sources();
        let err = extract_multi(&graph, &[], &n("sink")).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_extract_multi_missing_source() {
        let graph = two_sources();
        let err = extract_multi(&graph, &[n("s1"), n("nope")], &n("sink")).unwrap_err();
        assert!(err.is_vertex_not_found());
    }

    // ------------------------------------------------------------------------
    // ancestors_subgraph / analysis_views
    // ------------------------------------------------------------------------

    #[test]
    fn test_ancestors_subgraph() {
        let graph = two_sources();
        let sub = ancestors_subgraph(&graph, &n("m")).unwrap();
        assert_eq!(ids(&sub), BTreeSet::from([n("s1"), t("a"), n("m")]));
        assert_eq!(sub.graph.edge_count(), 2);
    }

    #[test]
    fn test_analysis_views_order() {
        let graph = two_sources();
        let views = analysis_views(&graph, &[n("s1"), n("s2")], &n("sink")).unwrap();

        let labels: Vec<_> = views.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "all_sources -> node:sink",
                "full",
                "node:s1 -> node:sink",
                "node:s2 -> node:sink",
            ]
        );
        assert_eq!(views[1].graph.vertex_count(), graph.vertex_count());
    }
}
