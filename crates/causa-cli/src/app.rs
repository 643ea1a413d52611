//! CausaCli application framework.
//!
//! Ties parsed arguments, configuration, and logging together and dispatches
//! commands to their handlers.

use crate::cli::{BaseCommand, CliArgs, GraphSubcommand};
use crate::config::CausaConfig;
use crate::graph_handlers::{ChainsOptions, ExtractOptions};
use crate::{config_handlers, graph_handlers};
use causa_core::Result;
use causa_core::traits::{ConfigProvider, InputSource};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ============================================================================
// CausaCli
// ============================================================================

/// CLI application parameterized over a config provider.
pub struct CausaCli<C: ConfigProvider> {
    name: String,
    config: Arc<C>,
    version: String,
}

impl CausaCli<CausaConfig> {
    /// Create from CLI args, loading config from file/env.
    ///
    /// `--dot`, `--json`, and `--live` replace whatever input the config
    /// names.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let mut config = CausaConfig::load(args.config.as_deref())?;
        if let Some(input) = input_override(args, &config) {
            config = config.with_input_override(input);
        }
        Ok(Self::new(name, config))
    }
}

fn input_override(args: &CliArgs, config: &CausaConfig) -> Option<InputSource> {
    if args.live {
        Some(InputSource::Live {
            command: config.input.ros2_command.clone(),
        })
    } else if let Some(dot) = &args.dot {
        Some(InputSource::Dot(PathBuf::from(dot)))
    } else {
        args.json
            .as_ref()
            .map(|json| InputSource::Json(PathBuf::from(json)))
    }
}

impl<C: ConfigProvider> CausaCli<C> {
    /// Create a new CLI application.
    pub fn new(name: impl Into<String>, config: C) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Get a reference to the config provider.
    pub fn config(&self) -> &C {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    /// `log` records from the library crates are bridged by tracing-subscriber.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);

        match args.command {
            Some(BaseCommand::Version) => {
                println!("{} {}", self.name, self.version);
                Ok(())
            }
            Some(BaseCommand::Graph(graph_cmd)) => self.handle_graph(graph_cmd.command).await,
            Some(BaseCommand::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            None => {
                println!("{} {} (use --help for usage)", self.name, self.version);
                Ok(())
            }
        }
    }

    /// Dispatch graph subcommands to handlers.
    async fn handle_graph(&self, command: GraphSubcommand) -> Result<()> {
        let config = &*self.config;
        let input = config.input_source()?;
        tracing::debug!(?input, "loading graph");

        match command {
            GraphSubcommand::Build { output } => {
                graph_handlers::handle_build(config, &input, output).await
            }
            GraphSubcommand::Validate => graph_handlers::handle_validate(config, &input).await,
            GraphSubcommand::Stats => graph_handlers::handle_stats(config, &input).await,
            GraphSubcommand::Extract {
                sink,
                sources,
                output,
            } => {
                let options = ExtractOptions {
                    sink,
                    sources,
                    output,
                };
                graph_handlers::handle_extract(config, &input, options).await
            }
            GraphSubcommand::Ancestors { sink } => {
                graph_handlers::handle_ancestors(config, &input, sink).await
            }
            GraphSubcommand::Chains {
                sink,
                max_chains,
                max_depth,
                no_cycle_check,
            } => {
                let options = ChainsOptions {
                    sink,
                    max_chains,
                    max_depth,
                    no_cycle_check,
                };
                graph_handlers::handle_chains(config, &input, options).await
            }
            GraphSubcommand::Analyze { output } => {
                graph_handlers::handle_analyze(config, &input, output).await
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
