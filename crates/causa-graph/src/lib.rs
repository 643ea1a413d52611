//! Pub/sub dependency graph analysis for Causa.
//!
//! This crate builds a single typed node/topic graph and derives the views
//! an analysis run needs: constrained source → sink subgraphs, ancestor
//! sets, root → sink causal chains, and per-vertex metadata for renderers.
//!
//! # Features
//!
//! - `test-utils`: Expose `introspect::mock::MockIntrospector` for
//!   downstream tests
//!
//! # Key Abstractions
//!
//! - `EntityId`: `(kind, path)` vertex identity, set once at normalization
//! - `TopicGraph`: petgraph-backed graph, read-only after construction
//! - `Introspector` trait: live data source (the `ros2` CLI or a mock)

#![doc = include_str!("../README.md")]

pub mod builder;
pub mod chains;
pub mod dot;
pub mod export;
pub mod introspect;
pub mod metadata;
pub mod normalize;
pub mod reachability;
pub mod stats;
pub mod types;
pub mod validation;

pub use builder::{BuildStats, DEFAULT_TOPIC_ATTRIBUTE, GraphBuilder};
pub use chains::{Chain, ChainOptions, ChainSet, enumerate_chains};
pub use dot::parse_dot;
pub use export::{Attributes, StaticEdge, StaticGraph, StaticVertex, load_dot, load_json};
pub use introspect::{Introspector, Ros2Cli};
pub use metadata::{GraphView, VertexMetadata, VertexRole, vertex_metadata};
pub use normalize::{encode, normalize, normalize_live};
pub use reachability::{analysis_views, ancestors_subgraph, extract, extract_multi};
pub use stats::{DegreeDirection, GraphStats, compute_stats, quick_summary, top_vertices_by_degree};
pub use types::{Entity, EntityId, EntityKind, Subgraph, TopicGraph};
pub use validation::{ValidationIssue, ValidationResult, is_valid, validate_graph};
