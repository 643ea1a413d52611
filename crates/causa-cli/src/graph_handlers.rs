//! Handler functions for graph CLI commands.
//!
//! Every handler loads the graph from the resolved [`InputSource`], runs one
//! analysis from `causa-graph`, and prints a human-readable summary. Commands
//! taking `--output` also write a JSON [`GraphView`] (or a full
//! [`AnalysisReport`]) for renderers.

use causa_core::traits::{AnalysisTargets, ConfigProvider, InputSource};
use causa_core::{Error, Result};
use causa_graph::{
    BuildStats, ChainOptions, ChainSet, DegreeDirection, EntityId, EntityKind, GraphBuilder,
    GraphView, Ros2Cli, Subgraph, TopicGraph, analysis_views, ancestors_subgraph, compute_stats,
    enumerate_chains, extract, extract_multi, is_valid, load_dot, load_json, normalize,
    quick_summary, top_vertices_by_degree, validate_graph,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default file name for `graph analyze` output.
pub const ANALYSIS_FILE: &str = "analysis.json";

/// Number of highest-degree vertices listed by `graph stats`.
pub const TOP_VERTICES: usize = 5;

// ============================================================================
// Option types
// ============================================================================

/// Options for `graph extract`.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Sink override.
    pub sink: Option<String>,
    /// Source overrides; empty means use the configured sources.
    pub sources: Vec<String>,
    /// JSON output path.
    pub output: Option<String>,
}

/// Options for `graph chains`.
#[derive(Debug, Clone, Default)]
pub struct ChainsOptions {
    /// Sink override.
    pub sink: Option<String>,
    /// Chain-count limit override.
    pub max_chains: Option<usize>,
    /// Depth limit override.
    pub max_depth: Option<usize>,
    /// Disable cycle detection regardless of config.
    pub no_cycle_check: bool,
}

/// Everything `graph analyze` writes: the named views plus the chains.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Project name from config.
    pub project: String,
    /// Sink in `kind:path` form.
    pub sink: String,
    /// Sources in `kind:path` form.
    pub sources: Vec<String>,
    /// Views in order: all sources, full, then one per source.
    pub views: Vec<GraphView>,
    /// Root-to-sink chains.
    pub chains: ChainSet,
}

// ============================================================================
// Graph loading
// ============================================================================

/// Build the graph from the given input.
///
/// Live introspection blocks on subprocesses, so it runs on tokio's
/// blocking pool.
pub async fn load_graph<C: ConfigProvider>(
    config: &C,
    input: &InputSource,
) -> Result<(TopicGraph, BuildStats)> {
    let builder = GraphBuilder::new().with_topic_attribute(config.topic_attribute());

    match input {
        InputSource::Dot(path) => {
            let export = load_dot(require_file(path)?)?;
            Ok(builder.build_static(&export))
        }
        InputSource::Json(path) => {
            let export = load_json(require_file(path)?)?;
            Ok(builder.build_static(&export))
        }
        InputSource::Live { command } => {
            let introspector = Ros2Cli::new(command.clone());
            tokio::task::spawn_blocking(move || builder.build_live(&introspector))
                .await
                .map_err(|e| Error::operation(format!("introspection task failed: {e}")))?
        }
    }
}

fn require_file(path: &Path) -> Result<&Path> {
    if path.exists() {
        Ok(path)
    } else {
        Err(Error::file_not_found(path))
    }
}

/// Resolve a vertex argument: `kind:path`, or a raw export identifier.
pub fn parse_vertex(raw: &str) -> Result<EntityId> {
    match raw.split_once(':') {
        Some((kind, _)) if kind.parse::<EntityKind>().is_ok() => raw.parse(),
        _ => Ok(normalize(raw)),
    }
}

fn resolve_sink(cli: Option<String>, targets: &AnalysisTargets) -> Result<EntityId> {
    let raw = cli.or_else(|| targets.sink.clone()).ok_or_else(|| {
        Error::config("No sink given: pass --sink or set analysis.sink")
    })?;
    parse_vertex(&raw)
}

fn resolve_sources(cli: Vec<String>, targets: &AnalysisTargets) -> Result<Vec<EntityId>> {
    let raw = if cli.is_empty() {
        targets.sources.clone()
    } else {
        cli
    };
    if raw.is_empty() {
        return Err(Error::config(
            "No sources given: pass --source or set analysis.sources",
        ));
    }
    raw.iter().map(|s| parse_vertex(s)).collect()
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| Error::Serialization(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| Error::io_with_path(e, path))?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Build the graph and report build statistics.
pub async fn handle_build<C: ConfigProvider>(
    config: &C,
    input: &InputSource,
    output: Option<String>,
) -> Result<()> {
    let (graph, stats) = load_graph(config, input).await?;

    println!("Graph built: {}", quick_summary(&graph));
    println!("  Vertices:         {}", stats.vertices_created);
    println!("  Edges:            {}", stats.edges_created);
    println!("  Edges processed:  {}", stats.edges_processed);
    print_list("Unknown ids", &stats.unknown_identifiers);
    print_list("Unlabelled edges", &stats.unlabelled_edges);
    print_list("View mismatches", &stats.view_mismatches);
    print_list("Errors", &stats.errors);

    if !is_valid(&graph) {
        println!("\nGraph has validation errors; run `graph validate` for details.");
    }

    if let Some(output) = output {
        let path = PathBuf::from(output);
        write_json(&path, &GraphView::new("full", &graph))?;
        println!("\nGraph view saved to: {}", path.display());
    }
    Ok(())
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("  {title}: {}", items.len());
    for item in items {
        println!("    - {item}");
    }
}

/// Validate graph integrity.
pub async fn handle_validate<C: ConfigProvider>(config: &C, input: &InputSource) -> Result<()> {
    let (graph, _) = load_graph(config, input).await?;
    let result = validate_graph(&graph);

    if result.valid {
        println!("Graph is valid.");
    } else {
        println!("Graph has validation issues:");
    }

    for (label, issues) in [("ERROR", &result.errors), ("WARN ", &result.warnings)] {
        for issue in issues {
            println!("  {label} [{}]: {}", issue.code, issue.message);
            for item in issue.vertices.iter().chain(&issue.edges) {
                println!("    - {item}");
            }
        }
    }

    println!(
        "\nSummary: {} error(s), {} warning(s)",
        result.errors.len(),
        result.warnings.len()
    );

    if result.valid {
        Ok(())
    } else {
        Err(Error::operation(format!(
            "Graph validation failed with {} error(s)",
            result.errors.len()
        )))
    }
}

/// Show graph statistics.
pub async fn handle_stats<C: ConfigProvider>(config: &C, input: &InputSource) -> Result<()> {
    let (graph, _) = load_graph(config, input).await?;
    let stats = compute_stats(&graph);

    println!("Graph Statistics");
    println!("================");
    println!("Vertices:       {}", stats.vertex_count);
    println!("  Nodes:        {}", stats.node_count);
    println!("  Topics:       {}", stats.topic_count);
    println!("  Unknown:      {}", stats.unknown_count);
    println!("  Roots:        {}", stats.root_count);
    println!("  Leaves:       {}", stats.leaf_count);
    println!("  Orphans:      {}", stats.orphan_count);
    println!("Edges:          {}", stats.edge_count);
    println!("Avg degree:     {:.2}", stats.avg_degree);
    if let Some(id) = &stats.most_fed {
        println!("Max in-degree:  {} ({id})", stats.max_in_degree);
    }
    if let Some(id) = &stats.most_fanout {
        println!("Max out-degree: {} ({id})", stats.max_out_degree);
    }

    if !stats.component_distribution.is_empty() {
        println!("\nComponents:");
        let mut components: Vec<_> = stats.component_distribution.iter().collect();
        components.sort_by(|a, b| b.1.cmp(a.1));
        for (component, count) in components {
            println!("  {component}: {count}");
        }
    }

    let top = top_vertices_by_degree(&graph, TOP_VERTICES, DegreeDirection::Both);
    if !top.is_empty() {
        println!("\nTop vertices by degree:");
        for (id, degree) in top {
            println!("  {id}: {degree}");
        }
    }
    Ok(())
}

/// Extract the constrained subgraph between source(s) and the sink.
pub async fn handle_extract<C: ConfigProvider>(
    config: &C,
    input: &InputSource,
    options: ExtractOptions,
) -> Result<()> {
    let targets = config.analysis();
    let sink = resolve_sink(options.sink, &targets)?;
    let sources = resolve_sources(options.sources, &targets)?;
    let (graph, _) = load_graph(config, input).await?;

    let view = match sources.as_slice() {
        [single] => extract(&graph, single, &sink)?,
        many => extract_multi(&graph, many, &sink)?,
    };
    print_subgraph(&view);

    if let Some(output) = options.output {
        let path = PathBuf::from(output);
        write_json(&path, &GraphView::from_subgraph(&view))?;
        println!("\nView saved to: {}", path.display());
    }
    Ok(())
}

/// Show the sink and everything upstream of it.
pub async fn handle_ancestors<C: ConfigProvider>(
    config: &C,
    input: &InputSource,
    sink: Option<String>,
) -> Result<()> {
    let sink = resolve_sink(sink, &config.analysis())?;
    let (graph, _) = load_graph(config, input).await?;
    print_subgraph(&ancestors_subgraph(&graph, &sink)?);
    Ok(())
}

fn print_subgraph(view: &Subgraph) {
    println!(
        "{}: {} vertices, {} edges",
        view.label,
        view.graph.vertex_count(),
        view.graph.edge_count()
    );
    for entity in view.graph.entities() {
        println!("  - {}", entity.id);
    }
}

/// Enumerate root-to-sink chains.
pub async fn handle_chains<C: ConfigProvider>(
    config: &C,
    input: &InputSource,
    options: ChainsOptions,
) -> Result<()> {
    let targets = config.analysis();
    let sink = resolve_sink(options.sink, &targets)?;
    let chain_options = ChainOptions {
        max_chains: options.max_chains.or(targets.max_chains),
        max_depth: options.max_depth.or(targets.max_depth),
        detect_cycles: targets.detect_cycles && !options.no_cycle_check,
    };
    let (graph, _) = load_graph(config, input).await?;
    let set = enumerate_chains(&graph, &sink, &chain_options)?;

    println!("Chains ending at {}:", set.sink);
    for (i, chain) in set.chains.iter().enumerate() {
        let path: Vec<String> = chain.vertices.iter().map(ToString::to_string).collect();
        println!("  {}. {}", i + 1, path.join(" -> "));
    }
    println!("\n{} chain(s)", set.chains.len());
    if set.truncated {
        println!("  WARNING: limits reached; enumeration is incomplete.");
    }
    Ok(())
}

/// Write the full view set and chains for the configured targets.
pub async fn handle_analyze<C: ConfigProvider>(
    config: &C,
    input: &InputSource,
    output: Option<String>,
) -> Result<()> {
    let targets = config.analysis();
    let sink = resolve_sink(None, &targets)?;
    let sources = resolve_sources(Vec::new(), &targets)?;
    let path = match output {
        Some(p) => PathBuf::from(p),
        None => config.output_dir()?.join(ANALYSIS_FILE),
    };

    let (graph, _) = load_graph(config, input).await?;
    let views = analysis_views(&graph, &sources, &sink)?;
    let chain_options = ChainOptions {
        max_chains: targets.max_chains,
        max_depth: targets.max_depth,
        detect_cycles: targets.detect_cycles,
    };
    let chains = enumerate_chains(&graph, &sink, &chain_options)?;

    for view in &views {
        println!(
            "  {}: {} vertices, {} edges",
            view.label,
            view.graph.vertex_count(),
            view.graph.edge_count()
        );
    }
    println!("  {} chain(s) ending at {sink}", chains.chains.len());

    let report = AnalysisReport {
        project: config.project_name().to_string(),
        sink: sink.to_string(),
        sources: sources.iter().map(ToString::to_string).collect(),
        views: views.iter().map(GraphView::from_subgraph).collect(),
        chains,
    };
    write_json(&path, &report)?;
    println!("\nAnalysis saved to: {}", path.display());
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Clone)]
    struct TestConfig {
        out: PathBuf,
        targets: AnalysisTargets,
    }

    impl ConfigProvider for TestConfig {
        fn project_name(&self) -> &str {
            "test"
        }

        fn input_source(&self) -> Result<InputSource> {
            Err(Error::config("inputs are passed explicitly in tests"))
        }

        fn output_dir(&self) -> Result<PathBuf> {
            Ok(self.out.clone())
        }

        fn analysis(&self) -> AnalysisTargets {
            self.targets.clone()
        }
    }

    const SAMPLE_DOT: &str = r#"
        digraph rosgraph {
          n___sensing__lidar -> n___perception__fusion [URL="topic_3A__sensing__points"];
          n___sensing__imu -> n___perception__fusion [URL="topic_3A__sensing__imu"];
          n___perception__fusion -> n___planning__cruise [URL="topic_3A__perception__objects"];
          n___planning__cruise -> n___system__rviz [URL="topic_3A__planning__trajectory"];
        }
    "#;

    fn setup(dir: &Path) -> (TestConfig, InputSource) {
        let dot = dir.join("rosgraph.dot");
        std::fs::write(&dot, SAMPLE_DOT).unwrap();
        let config = TestConfig {
            out: dir.join("out"),
            targets: AnalysisTargets {
                sink: Some("node:/planning/cruise".into()),
                sources: vec!["node:/sensing/lidar".into(), "n___sensing__imu".into()],
                ..Default::default()
            },
        };
        (config, InputSource::Dot(dot))
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_load_graph_dot() {
        let dir = tempdir().unwrap();
        let (config, input) = setup(dir.path());

        let (graph, stats) = load_graph(&config, &input).await.unwrap();
        assert_eq!(graph.vertex_count(), 9);
        assert_eq!(graph.edge_count(), 8);
        assert!(stats.unlabelled_edges.is_empty());
    }

    #[tokio::test]
    async fn test_load_graph_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(
            &path,
            r#"{"edges": [{"from": "n___a", "to": "n___b", "attributes": {"URL": "/x"}}]}"#,
        )
        .unwrap();
        let (config, _) = setup(dir.path());

        let (graph, _) = load_graph(&config, &InputSource::Json(path)).await.unwrap();
        assert!(graph.contains(&EntityId::topic("x")));
    }

    #[tokio::test]
    async fn test_load_graph_missing_file() {
        let dir = tempdir().unwrap();
        let (config, _) = setup(dir.path());
        let input = InputSource::Dot(dir.path().join("missing.dot"));

        let err = load_graph(&config, &input).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_load_graph_live_without_tool() {
        let dir = tempdir().unwrap();
        let (config, _) = setup(dir.path());
        let input = InputSource::Live {
            command: "causa-test-no-such-binary".into(),
        };

        let err = load_graph(&config, &input).await.unwrap_err();
        assert!(matches!(err, Error::Introspection(_)));
    }

    #[test]
    fn test_parse_vertex_forms() {
        assert_eq!(
            parse_vertex("node:/planning/cruise").unwrap(),
            EntityId::node("planning/cruise")
        );
        assert_eq!(
            parse_vertex("n___planning__cruise").unwrap(),
            EntityId::node("planning/cruise")
        );
        assert_eq!(parse_vertex("/sensing/imu").unwrap(), EntityId::topic("sensing/imu"));
        assert!(parse_vertex("node:").is_err());
    }

    #[test]
    fn test_resolve_targets() {
        let targets = AnalysisTargets::default();
        assert!(resolve_sink(None, &targets).is_err());
        assert!(resolve_sources(Vec::new(), &targets).is_err());

        let sink = resolve_sink(Some("node:c".into()), &targets).unwrap();
        assert_eq!(sink, EntityId::node("c"));
    }

    // ------------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_handle_build_writes_view() {
        let dir = tempdir().unwrap();
        let (config, input) = setup(dir.path());
        let output = dir.path().join("views").join("full.json");

        handle_build(&config, &input, Some(output.to_string_lossy().into()))
            .await
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(json["label"], "full");
        assert_eq!(json["vertices"]["node:sensing/lidar"]["role"], "root");
    }

    #[tokio::test]
    async fn test_handle_validate_and_stats() {
        let dir = tempdir().unwrap();
        let (config, input) = setup(dir.path());

        assert!(handle_validate(&config, &input).await.is_ok());
        assert!(handle_stats(&config, &input).await.is_ok());
    }

    #[tokio::test]
    async fn test_handle_validate_cyclic_graph_fails() {
        let dir = tempdir().unwrap();
        let (config, _) = setup(dir.path());
        let dot = dir.path().join("cycle.dot");
        std::fs::write(
            &dot,
            "digraph { n___a -> n___b [URL=topic_3A__x]; n___b -> n___a [URL=topic_3A__y]; }",
        )
        .unwrap();

        let input = InputSource::Dot(dot);
        assert!(handle_validate(&config, &input).await.is_err());
        // Build and stats only report problems
        assert!(handle_build(&config, &input, None).await.is_ok());
        assert!(handle_stats(&config, &input).await.is_ok());
    }

    #[tokio::test]
    async fn test_handle_extract_single_and_multi() {
        let dir = tempdir().unwrap();
        let (config, input) = setup(dir.path());
        let output = dir.path().join("extract.json");

        let options = ExtractOptions {
            sources: vec!["node:sensing/lidar".into()],
            output: Some(output.to_string_lossy().into()),
            ..Default::default()
        };
        handle_extract(&config, &input, options).await.unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(json["vertices"].as_object().unwrap().len(), 5);

        // Configured sources: lidar and imu
        handle_extract(&config, &input, ExtractOptions::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_handle_extract_unknown_sink() {
        let dir = tempdir().unwrap();
        let (config, input) = setup(dir.path());
        let options = ExtractOptions {
            sink: Some("node:nowhere".into()),
            ..Default::default()
        };

        let err = handle_extract(&config, &input, options).await.unwrap_err();
        assert!(err.is_vertex_not_found());
    }

    #[tokio::test]
    async fn test_handle_ancestors_and_chains() {
        let dir = tempdir().unwrap();
        let (config, input) = setup(dir.path());

        assert!(handle_ancestors(&config, &input, None).await.is_ok());

        let options = ChainsOptions {
            max_chains: Some(1),
            ..Default::default()
        };
        assert!(handle_chains(&config, &input, options).await.is_ok());
    }

    #[tokio::test]
    async fn test_handle_analyze_writes_report() {
        let dir = tempdir().unwrap();
        let (config, input) = setup(dir.path());

        handle_analyze(&config, &input, None).await.unwrap();

        let path = dir.path().join("out").join(ANALYSIS_FILE);
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        let labels: Vec<&str> = json["views"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["label"].as_str().unwrap())
            .collect();
        assert_eq!(
            labels,
            vec![
                "all_sources -> node:planning/cruise",
                "full",
                "node:sensing/lidar -> node:planning/cruise",
                "node:sensing/imu -> node:planning/cruise",
            ]
        );
        assert_eq!(json["chains"]["chains"].as_array().unwrap().len(), 2);
        assert_eq!(json["chains"]["truncated"], false);
    }
}
