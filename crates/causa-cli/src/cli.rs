//! CLI argument parsing and command definitions.
//!
//! Global flags select configuration, verbosity, and (optionally) override
//! the configured graph input. Analysis commands live under `graph`.

use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "CAUSA_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Read the graph from a Graphviz DOT export.
    #[arg(long, conflicts_with_all = ["json", "live"])]
    pub dot: Option<String>,

    /// Read the graph from a JSON static export.
    #[arg(long, conflicts_with = "live")]
    pub json: Option<String>,

    /// Introspect a running system instead of reading an export.
    #[arg(long)]
    pub live: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<BaseCommand>,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum BaseCommand {
    /// Print version information.
    Version,

    /// Graph analysis operations.
    Graph(GraphCommand),

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "analysis.sink").
        key: String,
    },

    /// Set a configuration value by dotted key.
    Set {
        /// Dotted key (e.g., "input.dot_path").
        key: String,

        /// Value to set. `analysis.sources` takes a comma-separated list.
        value: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

/// Graph-specific subcommands.
#[derive(Parser, Debug)]
pub struct GraphCommand {
    /// Graph subcommand to execute.
    #[command(subcommand)]
    pub command: GraphSubcommand,
}

/// Available graph subcommands.
///
/// Vertex arguments take `kind:path` (`node:/planning/cruise`) or a raw
/// export identifier (`n___planning__cruise`). Omitted sinks and sources
/// fall back to the `[analysis]` config section.
#[derive(Subcommand, Debug)]
pub enum GraphSubcommand {
    /// Build the graph and report build statistics.
    Build {
        /// Write the full graph view as JSON to this path.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate graph integrity.
    Validate,

    /// Show graph statistics.
    Stats,

    /// Extract the subgraph between source(s) and a sink.
    Extract {
        /// Sink vertex.
        #[arg(long)]
        sink: Option<String>,

        /// Source vertex (repeatable).
        #[arg(long = "source")]
        sources: Vec<String>,

        /// Write the view as JSON to this path.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show everything upstream of a sink.
    Ancestors {
        /// Sink vertex.
        #[arg(long)]
        sink: Option<String>,
    },

    /// Enumerate root-to-sink causal chains.
    Chains {
        /// Sink vertex.
        #[arg(long)]
        sink: Option<String>,

        /// Stop after this many chains.
        #[arg(long)]
        max_chains: Option<usize>,

        /// Prune chains longer than this many vertices.
        #[arg(long)]
        max_depth: Option<usize>,

        /// Disable cycle detection.
        #[arg(long)]
        no_cycle_check: bool,
    },

    /// Write the full view set and chains for the configured targets.
    Analyze {
        /// Output file (defaults to `<output.dir>/analysis.json`).
        #[arg(short, long)]
        output: Option<String>,
    },
}

// ============================================================================
// Tests
// ============================================================================
