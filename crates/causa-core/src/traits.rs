//! Core traits for Causa configuration.
//!
//! Handlers never read configuration files directly. They receive a
//! [`ConfigProvider`], which tells them where the graph comes from
//! ([`InputSource`]) and which sink/sources to analyze
//! ([`AnalysisTargets`]).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::Result;
use crate::util::de;

/// Where a graph snapshot is obtained from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// A Graphviz export of the running system.
    Dot(PathBuf),
    /// A JSON static export (vertices and edges with attribute maps).
    Json(PathBuf),
    /// Live introspection through the middleware command-line tool.
    Live {
        /// Executable used for introspection calls (e.g. `ros2`).
        command: String,
    },
}

/// Sink/source selection and chain-enumeration limits for one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisTargets {
    /// Sink vertex in `kind:path` form.
    pub sink: Option<String>,
    /// Source vertices in `kind:path` form.
    #[serde(deserialize_with = "de::list_or_comma_string")]
    pub sources: Vec<String>,
    /// Stop chain enumeration after this many chains.
    #[serde(deserialize_with = "de::opt_usize_or_string")]
    pub max_chains: Option<usize>,
    /// Prune chains longer than this many vertices.
    #[serde(deserialize_with = "de::opt_usize_or_string")]
    pub max_depth: Option<usize>,
    /// Fail fast when a reverse-publish cycle is found.
    #[serde(deserialize_with = "de::bool_or_string")]
    pub detect_cycles: bool,
}

impl Default for AnalysisTargets {
    fn default() -> Self {
        Self {
            sink: None,
            sources: Vec::new(),
            max_chains: None,
            max_depth: None,
            detect_cycles: true,
        }
    }
}

/// Trait for application configuration.
///
/// # Bounds
///
/// - `Send + Sync`: Configuration must be shareable across threads
/// - `Clone`: Configuration can be duplicated for passing to subsystems
/// - `'static`: Configuration lifetime is not borrowed
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use causa_core::{AnalysisTargets, ConfigProvider, InputSource, Result};
///
/// #[derive(Clone)]
/// struct FixedConfig {
///     dot: PathBuf,
/// }
///
/// impl ConfigProvider for FixedConfig {
///     fn project_name(&self) -> &str {
///         "autoware"
///     }
///
///     fn input_source(&self) -> Result<InputSource> {
///         Ok(InputSource::Dot(self.dot.clone()))
///     }
///
///     fn output_dir(&self) -> Result<PathBuf> {
///         Ok(PathBuf::from("out"))
///     }
///
///     fn analysis(&self) -> AnalysisTargets {
///         AnalysisTargets::default()
///     }
/// }
/// ```
pub trait ConfigProvider: Send + Sync + Clone + 'static {
    /// The project name, used for env var prefixes and report labels.
    fn project_name(&self) -> &str;

    /// Where the graph should be loaded from.
    ///
    /// # Errors
    ///
    /// Returns an error if no input has been configured.
    fn input_source(&self) -> Result<InputSource>;

    /// Directory that JSON views are written to.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be determined.
    fn output_dir(&self) -> Result<PathBuf>;

    /// Configured sink, sources, and enumeration limits.
    fn analysis(&self) -> AnalysisTargets;

    /// Static-export edge attribute naming the mediating topic.
    fn topic_attribute(&self) -> &str {
        "URL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_targets_default() {
        let targets = AnalysisTargets::default();
        assert!(targets.sink.is_none());
        assert!(targets.sources.is_empty());
        assert!(targets.max_chains.is_none());
        assert!(targets.max_depth.is_none());
        assert!(targets.detect_cycles);
    }

    #[test]
    fn test_input_source_serialization() {
        let source = InputSource::Live {
            command: "ros2".to_string(),
        };
        let json = serde_json::to_string(&source).unwrap();
        assert_eq!(json, r#"{"live":{"command":"ros2"}}"#);

        let parsed: InputSource = serde_json::from_str(r#"{"dot":"graph.dot"}"#).unwrap();
        assert_eq!(parsed, InputSource::Dot(PathBuf::from("graph.dot")));
    }

    #[test]
    fn test_analysis_targets_partial_deserialization() {
        let targets: AnalysisTargets =
            serde_json::from_str(r#"{"sink":"node:planning/cruise"}"#).unwrap();
        assert_eq!(targets.sink.as_deref(), Some("node:planning/cruise"));
        assert!(targets.detect_cycles);
    }

    #[test]
    fn test_analysis_targets_string_forms() {
        let targets: AnalysisTargets = serde_json::from_str(
            r#"{"sources": "node:a,topic:b", "max_chains": "10", "max_depth": "4", "detect_cycles": "false"}"#,
        )
        .unwrap();
        assert_eq!(targets.sources, vec!["node:a", "topic:b"]);
        assert_eq!(targets.max_chains, Some(10));
        assert_eq!(targets.max_depth, Some(4));
        assert!(!targets.detect_cycles);
    }
}
