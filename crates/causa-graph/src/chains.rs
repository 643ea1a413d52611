//! Causal chain enumeration.
//!
//! A chain is one root-to-sink path, where a root is any vertex with no
//! incoming edges. [`enumerate_chains`] walks incoming edges from the sink
//! with an explicit stack, emitting every branch independently; shared
//! sub-paths are not memoized, so the result may be exponential in the
//! fan-in along the way.
//!
//! The walk terminates only on graphs that are acyclic upstream of the
//! sink. With [`ChainOptions::detect_cycles`] (the default) a vertex
//! repeating on the current branch fails fast with `CycleDetected`.

use crate::{EntityId, TopicGraph};
use causa_core::{Error, Result};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Limits for [`enumerate_chains`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainOptions {
    /// Stop after this many chains.
    pub max_chains: Option<usize>,
    /// Do not follow branches longer than this many vertices.
    pub max_depth: Option<usize>,
    /// Fail on a vertex repeated within one branch.
    pub detect_cycles: bool,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            max_chains: None,
            max_depth: None,
            detect_cycles: true,
        }
    }
}

impl ChainOptions {
    /// Limit the number of chains.
    pub fn with_max_chains(mut self, max: usize) -> Self {
        self.max_chains = Some(max);
        self
    }

    /// Limit branch length (in vertices, sink included).
    pub fn with_max_depth(mut self, max: usize) -> Self {
        self.max_depth = Some(max);
        self
    }

    /// Toggle cycle detection.
    pub fn with_cycle_detection(mut self, enabled: bool) -> Self {
        self.detect_cycles = enabled;
        self
    }
}

/// One root-to-sink path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    /// Vertices ordered root first, sink last.
    pub vertices: Vec<EntityId>,
}

impl Chain {
    /// The root vertex.
    pub fn root(&self) -> Option<&EntityId> {
        self.vertices.first()
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the chain has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Result of a chain enumeration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainSet {
    /// The sink all chains end at.
    pub sink: EntityId,
    /// Chains in discovery order.
    pub chains: Vec<Chain>,
    /// Whether a limit cut the enumeration short.
    pub truncated: bool,
}

/// One level of the explicit DFS stack.
struct Frame {
    vertex: NodeIndex,
    preds: Vec<NodeIndex>,
    next: usize,
}

impl Frame {
    fn new(graph: &TopicGraph, vertex: NodeIndex) -> Self {
        Self {
            vertex,
            preds: graph.predecessors(vertex),
            next: 0,
        }
    }

    fn exhausted(&self) -> bool {
        self.next >= self.preds.len()
    }
}

/// Enumerate every root-to-sink chain ending at `sink`.
///
/// Chains come out in depth-first order, first-inserted incoming edge
/// first. A sink with no incoming edges yields the single chain `[sink]`;
/// a zero `max_chains` or `max_depth` yields no chains, marked truncated.
///
/// # Errors
///
/// - `VertexNotFound` if `sink` is absent
/// - `CycleDetected` if cycle detection is on and a branch revisits a
///   vertex; the error path runs from the sink to the repeated vertex
pub fn enumerate_chains(
    graph: &TopicGraph,
    sink: &EntityId,
    options: &ChainOptions,
) -> Result<ChainSet> {
    let start = graph.require(sink)?;

    // A zero limit admits nothing, not even the single-vertex chain `[sink]`.
    if options.max_chains == Some(0) || options.max_depth == Some(0) {
        return Ok(ChainSet {
            sink: sink.clone(),
            chains: Vec::new(),
            truncated: true,
        });
    }

    let mut chains = Vec::new();
    let mut truncated = false;

    let mut stack = vec![Frame::new(graph, start)];
    let mut on_path = HashSet::from([start]);

    while let Some(top) = stack.last_mut() {
        if top.preds.is_empty() {
            let vertices = stack
                .iter()
                .rev()
                .map(|frame| graph.entity(frame.vertex).id.clone())
                .collect();
            chains.push(Chain { vertices });

            if options.max_chains.is_some_and(|max| chains.len() >= max) {
                stack.pop();
                truncated = stack.iter().any(|frame| !frame.exhausted());
                break;
            }
            pop(&mut stack, &mut on_path);
            continue;
        }

        if top.exhausted() {
            pop(&mut stack, &mut on_path);
            continue;
        }

        let pred = top.preds[top.next];
        top.next += 1;

        if options.detect_cycles && on_path.contains(&pred) {
            let mut path: Vec<String> = stack
                .iter()
                .map(|frame| graph.entity(frame.vertex).id.to_string())
                .collect();
            path.push(graph.entity(pred).id.to_string());
            return Err(Error::CycleDetected { path });
        }

        if options.max_depth.is_some_and(|max| stack.len() >= max) {
            truncated = true;
            continue;
        }

        on_path.insert(pred);
        stack.push(Frame::new(graph, pred));
    }

    if truncated {
        log::debug!("chain enumeration for {sink} truncated at {} chains", chains.len());
    }

    Ok(ChainSet {
        sink: sink.clone(),
        chains,
        truncated,
    })
}

fn pop(stack: &mut Vec<Frame>, on_path: &mut HashSet<NodeIndex>) {
    if let Some(frame) = stack.pop() {
        // Only remove if no other frame still holds the vertex (possible when
        // cycle detection is off).
        if !stack.iter().any(|f| f.vertex == frame.vertex) {
            on_path.remove(&frame.vertex);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
