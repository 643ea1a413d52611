//! Configuration for the `causa` CLI.
//!
//! Provides the [`CausaConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `CAUSA_CONFIG` environment variable
//! 3. XDG default: `~/.config/causa/config.toml`
//! 4. Built-in defaults
//!
//! Environment overrides use the `CAUSA_<SECTION>_<KEY>` form, e.g.
//! `CAUSA_INPUT_DOT_PATH` or `CAUSA_ANALYSIS_SINK`.

use causa_core::traits::{AnalysisTargets, ConfigProvider, InputSource};
use causa_core::util::de;
use causa_core::{Error, Result};
use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "CAUSA_CONFIG";

/// Serializes tests that set `CAUSA_*` variables against tests asserting
/// on values those variables would override.
#[cfg(test)]
pub(crate) static TEST_ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the `causa` CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CausaConfig {
    /// Project name, used in report labels.
    pub project_name: String,

    /// Where the graph comes from.
    pub input: InputConfig,

    /// Sink, sources, and chain limits.
    pub analysis: AnalysisTargets,

    /// Where JSON views are written.
    pub output: OutputConfig,
}

/// Graph input configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Graphviz DOT export.
    pub dot_path: Option<String>,

    /// JSON static export.
    pub json_path: Option<String>,

    /// Introspect a running system instead of reading an export.
    #[serde(deserialize_with = "de::bool_or_string")]
    pub live: bool,

    /// Executable used for live introspection.
    pub ros2_command: String,

    /// Edge attribute naming the mediating topic in static exports.
    pub topic_attribute: String,
}

/// Output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory (defaults to the working directory).
    pub dir: Option<String>,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for CausaConfig {
    fn default() -> Self {
        Self {
            project_name: "causa".to_string(),
            input: InputConfig::default(),
            analysis: AnalysisTargets::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dot_path: None,
            json_path: None,
            live: false,
            ros2_command: "ros2".to_string(),
            topic_attribute: "URL".to_string(),
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl CausaConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level("CAUSA");
        env_opts.add_section("input");
        env_opts.add_section("analysis");
        env_opts.add_section("output");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("causa").join("config.toml"))
    }

    /// Replace the configured input with a command-line override.
    pub fn with_input_override(mut self, input: InputSource) -> Self {
        self.input.dot_path = None;
        self.input.json_path = None;
        self.input.live = false;
        match input {
            InputSource::Dot(path) => self.input.dot_path = Some(path.to_string_lossy().into()),
            InputSource::Json(path) => self.input.json_path = Some(path.to_string_lossy().into()),
            InputSource::Live { command } => {
                self.input.live = true;
                self.input.ros2_command = command;
            }
        }
        self
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten this config into environment variable pairs with `CAUSA_` prefix.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value = toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, "CAUSA", &mut vars);
        Ok(vars)
    }
}

// ============================================================================
// ConfigProvider implementation
// ============================================================================

impl ConfigProvider for CausaConfig {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Live introspection wins over exports; a DOT export wins over JSON.
    fn input_source(&self) -> Result<InputSource> {
        if self.input.live {
            return Ok(InputSource::Live {
                command: self.input.ros2_command.clone(),
            });
        }
        if let Some(path) = &self.input.dot_path {
            return Ok(InputSource::Dot(PathBuf::from(path)));
        }
        if let Some(path) = &self.input.json_path {
            return Ok(InputSource::Json(PathBuf::from(path)));
        }
        Err(Error::config(
            "No graph input configured: pass --dot, --json or --live, or set input.dot_path",
        ))
    }

    fn output_dir(&self) -> Result<PathBuf> {
        match &self.output.dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => std::env::current_dir()
                .map_err(|e| Error::config(format!("Could not determine output directory: {e}"))),
        }
    }

    fn analysis(&self) -> AnalysisTargets {
        self.analysis.clone()
    }

    fn topic_attribute(&self) -> &str {
        &self.input.topic_attribute
    }
}

// ============================================================================
// Helper: flatten TOML to env vars
// ============================================================================

/// Recursively flatten a TOML value into `KEY=value` pairs.
fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                flatten_toml_value(val, &format!("{prefix}_{}", key.to_uppercase()), out);
            }
        }
        // Lists (analysis.sources) export in the comma form `config set` accepts
        toml::Value::Array(items) => {
            let joined: Vec<String> = items
                .iter()
                .map(|item| match item {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            out.push((prefix.to_string(), joined.join(",")));
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        toml::Value::Integer(i) => out.push((prefix.to_string(), i.to_string())),
        toml::Value::Float(f) => out.push((prefix.to_string(), f.to_string())),
        toml::Value::Boolean(b) => out.push((prefix.to_string(), b.to_string())),
        toml::Value::Datetime(dt) => out.push((prefix.to_string(), dt.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================
