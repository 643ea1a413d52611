//! Live introspection of a running middleware system.
//!
//! The [`Introspector`] trait is the builder's view of a live system: node
//! and topic listings plus both directions of the publish/subscribe
//! linkage. Implementations are treated as black boxes that may be slow and
//! may disagree with themselves; see
//! [`GraphBuilder::build_live`](crate::GraphBuilder::build_live) for how the
//! two views are reconciled.
//!
//! [`Ros2Cli`] implements the trait by running the `ros2` command-line tool.
//! Calls are blocking and carry no timeout or retry policy of their own.

use causa_core::{Error, Result};
use std::collections::HashMap;
use std::process::Command;
use std::sync::Mutex;

/// Capability calls needed to build a graph from a live system.
///
/// All names are native hierarchical names (`/sensing/lidar/top/...`).
pub trait Introspector {
    /// List every node name.
    fn list_nodes(&self) -> Result<Vec<String>>;

    /// List every topic name.
    fn list_topics(&self) -> Result<Vec<String>>;

    /// Nodes publishing to `topic`.
    fn publishers_of(&self, topic: &str) -> Result<Vec<String>>;

    /// Nodes subscribed to `topic`.
    fn subscribers_of(&self, topic: &str) -> Result<Vec<String>>;

    /// Topics `node` publishes to.
    fn topics_published_by(&self, node: &str) -> Result<Vec<String>>;

    /// Topics `node` subscribes to.
    fn topics_subscribed_by(&self, node: &str) -> Result<Vec<String>>;

    /// Returns the name of this introspector for logging/debugging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

// ============================================================================
// ros2 CLI introspector
// ============================================================================

/// Publisher/subscriber names parsed from one `info` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Endpoints {
    /// Publishing side: node names for a topic, topic names for a node.
    pub publishers: Vec<String>,
    /// Subscribing side: node names for a topic, topic names for a node.
    pub subscribers: Vec<String>,
}

/// Introspector backed by the `ros2` command-line tool.
///
/// `info` results are cached per name so the publisher and subscriber
/// queries for one entity share a single process invocation.
#[derive(Debug)]
pub struct Ros2Cli {
    command: String,
    topic_cache: Mutex<HashMap<String, Endpoints>>,
    node_cache: Mutex<HashMap<String, Endpoints>>,
}

impl Ros2Cli {
    /// Create an introspector running `command` (usually `ros2`).
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            topic_cache: Mutex::new(HashMap::new()),
            node_cache: Mutex::new(HashMap::new()),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        log::debug!("running {} {}", self.command, args.join(" "));
        let output = Command::new(&self.command)
            .args(args)
            .output()
            .map_err(|e| Error::introspection(format!("failed to run {}: {e}", self.command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::introspection(format!(
                "{} {} failed: {}",
                self.command,
                args.join(" "),
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| Error::introspection(format!("invalid UTF-8 from {}: {e}", self.command)))
    }

    fn topic_endpoints(&self, topic: &str) -> Result<Endpoints> {
        cached(&self.topic_cache, topic, || {
            Ok(parse_topic_info(&self.run(&["topic", "info", "-v", topic])?))
        })
    }

    fn node_endpoints(&self, node: &str) -> Result<Endpoints> {
        cached(&self.node_cache, node, || {
            Ok(parse_node_info(&self.run(&["node", "info", node])?))
        })
    }
}

impl Default for Ros2Cli {
    fn default() -> Self {
        Self::new("ros2")
    }
}

fn cached<F>(cache: &Mutex<HashMap<String, Endpoints>>, key: &str, fetch: F) -> Result<Endpoints>
where
    F: FnOnce() -> Result<Endpoints>,
{
    if let Ok(guard) = cache.lock() {
        if let Some(hit) = guard.get(key) {
            return Ok(hit.clone());
        }
    }
    let endpoints = fetch()?;
    if let Ok(mut guard) = cache.lock() {
        guard.insert(key.to_string(), endpoints.clone());
    }
    Ok(endpoints)
}

impl Introspector for Ros2Cli {
    fn list_nodes(&self) -> Result<Vec<String>> {
        Ok(parse_name_list(&self.run(&["node", "list"])?))
    }

    fn list_topics(&self) -> Result<Vec<String>> {
        Ok(parse_name_list(&self.run(&["topic", "list"])?))
    }

    fn publishers_of(&self, topic: &str) -> Result<Vec<String>> {
        Ok(self.topic_endpoints(topic)?.publishers)
    }

    fn subscribers_of(&self, topic: &str) -> Result<Vec<String>> {
        Ok(self.topic_endpoints(topic)?.subscribers)
    }

    fn topics_published_by(&self, node: &str) -> Result<Vec<String>> {
        Ok(self.node_endpoints(node)?.publishers)
    }

    fn topics_subscribed_by(&self, node: &str) -> Result<Vec<String>> {
        Ok(self.node_endpoints(node)?.subscribers)
    }

    fn name(&self) -> &str {
        &self.command
    }
}

// ============================================================================
// Output parsers
// ============================================================================

/// Placeholder name reported for endpoints whose node is not known.
const UNKNOWN_NODE_NAME: &str = "_NODE_NAME_UNKNOWN_";

/// Parse `node list` / `topic list` output: one name per line.
pub fn parse_name_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse `topic info -v` output into fully-qualified node names.
///
/// Each endpoint block lists `Node name`, `Node namespace`, and
/// `Endpoint type` (`PUBLISHER` or `SUBSCRIPTION`).
pub fn parse_topic_info(output: &str) -> Endpoints {
    let mut endpoints = Endpoints::default();
    let mut name: Option<&str> = None;
    let mut namespace = "/";

    for line in output.lines().map(str::trim) {
        if let Some(value) = line.strip_prefix("Node name:") {
            name = Some(value.trim());
            namespace = "/";
        } else if let Some(value) = line.strip_prefix("Node namespace:") {
            namespace = value.trim();
        } else if let Some(value) = line.strip_prefix("Endpoint type:") {
            let Some(node) = name.take() else { continue };
            if node == UNKNOWN_NODE_NAME {
                log::debug!("skipping endpoint with unknown node name");
                continue;
            }
            let qualified = qualify(namespace, node);
            match value.trim() {
                "PUBLISHER" => endpoints.publishers.push(qualified),
                "SUBSCRIPTION" => endpoints.subscribers.push(qualified),
                other => log::debug!("ignoring endpoint type {other}"),
            }
        }
    }

    endpoints
}

/// Parse `node info` output into topic names.
///
/// Only the `Subscribers:` and `Publishers:` sections are read; each entry
/// is `  /topic: message/Type`.
pub fn parse_node_info(output: &str) -> Endpoints {
    #[derive(Clone, Copy)]
    enum Section {
        Other,
        Publishers,
        Subscribers,
    }

    let mut endpoints = Endpoints::default();
    let mut section = Section::Other;

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.ends_with(':') && !trimmed.starts_with('/') {
            section = match trimmed {
                "Publishers:" => Section::Publishers,
                "Subscribers:" => Section::Subscribers,
                _ => Section::Other,
            };
            continue;
        }
        let Some((topic, _type)) = trimmed.split_once(": ") else {
            continue;
        };
        match section {
            Section::Publishers => endpoints.publishers.push(topic.to_string()),
            Section::Subscribers => endpoints.subscribers.push(topic.to_string()),
            Section::Other => {}
        }
    }

    endpoints
}

fn qualify(namespace: &str, name: &str) -> String {
    let namespace = namespace.trim_end_matches('/');
    format!("{namespace}/{name}")
}

// ============================================================================
// Mock introspector for testing
// ============================================================================

/// An in-memory introspector for testing.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use std::collections::HashSet;

    /// Mock introspector whose node view and topic view can be made to
    /// disagree.
    #[derive(Clone, Debug, Default)]
    pub struct MockIntrospector {
        pub nodes: Vec<String>,
        pub topics: Vec<String>,
        /// `(node, topic)` publications visible from the node side.
        pub node_view_publishes: Vec<(String, String)>,
        /// `(node, topic)` subscriptions visible from the node side.
        pub node_view_subscribes: Vec<(String, String)>,
        /// `(node, topic)` publications visible from the topic side.
        pub topic_view_publishes: Vec<(String, String)>,
        /// `(node, topic)` subscriptions visible from the topic side.
        pub topic_view_subscribes: Vec<(String, String)>,
        /// Names whose per-entity queries fail.
        pub failing: HashSet<String>,
    }

    impl MockIntrospector {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_node(mut self, node: &str) -> Self {
            self.nodes.push(node.to_string());
            self
        }

        pub fn with_topic(mut self, topic: &str) -> Self {
            self.topics.push(topic.to_string());
            self
        }

        /// `node` publishes to `topic`, seen by both views.
        pub fn publishes(self, node: &str, topic: &str) -> Self {
            self.publishes_in_node_view(node, topic)
                .publishes_in_topic_view(node, topic)
        }

        /// `node` subscribes to `topic`, seen by both views.
        pub fn subscribes(self, node: &str, topic: &str) -> Self {
            self.subscribes_in_node_view(node, topic)
                .subscribes_in_topic_view(node, topic)
        }

        pub fn publishes_in_node_view(mut self, node: &str, topic: &str) -> Self {
            self.node_view_publishes.push((node.into(), topic.into()));
            self
        }

        pub fn publishes_in_topic_view(mut self, node: &str, topic: &str) -> Self {
            self.topic_view_publishes.push((node.into(), topic.into()));
            self
        }

        pub fn subscribes_in_node_view(mut self, node: &str, topic: &str) -> Self {
            self.node_view_subscribes.push((node.into(), topic.into()));
            self
        }

        pub fn subscribes_in_topic_view(mut self, node: &str, topic: &str) -> Self {
            self.topic_view_subscribes.push((node.into(), topic.into()));
            self
        }

        pub fn failing_on(mut self, name: &str) -> Self {
            self.failing.insert(name.to_string());
            self
        }

        fn check(&self, name: &str) -> Result<()> {
            if self.failing.contains(name) {
                Err(Error::introspection(format!("mock failure for {name}")))
            } else {
                Ok(())
            }
        }
    }

    fn select(pairs: &[(String, String)], key: &str, by_node: bool) -> Vec<String> {
        pairs
            .iter()
            .filter(|(node, topic)| if by_node { node == key } else { topic == key })
            .map(|(node, topic)| if by_node { topic.clone() } else { node.clone() })
            .collect()
    }

    impl Introspector for MockIntrospector {
        fn list_nodes(&self) -> Result<Vec<String>> {
            Ok(self.nodes.clone())
        }

        fn list_topics(&self) -> Result<Vec<String>> {
            Ok(self.topics.clone())
        }

        fn publishers_of(&self, topic: &str) -> Result<Vec<String>> {
            self.check(topic)?;
            Ok(select(&self.topic_view_publishes, topic, false))
        }

        fn subscribers_of(&self, topic: &str) -> Result<Vec<String>> {
            self.check(topic)?;
            Ok(select(&self.topic_view_subscribes, topic, false))
        }

        fn topics_published_by(&self, node: &str) -> Result<Vec<String>> {
            self.check(node)?;
            Ok(select(&self.node_view_publishes, node, true))
        }

        fn topics_subscribed_by(&self, node: &str) -> Result<Vec<String>> {
            self.check(node)?;
            Ok(select(&self.node_view_subscribes, node, true))
        }

        fn name(&self) -> &str {
            "mock"
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
