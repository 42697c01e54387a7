//! Configuration resolution for ccstream.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (`<config dir>/ccstream/settings.json`)
//! 3. Project config (`.ccstream/settings.json`)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)
//!
//! Files may be partial; keys they omit keep the value from the layer below.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Complete ccstream configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub cli: CliConfig,
}

/// Settings for the `ccstream` binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Bytes read from the input per fragment.
    pub chunk_size: usize,
    pub log_level: String,
    pub format: OutputFormat,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8 * 1024,
            log_level: "info".to_string(),
            format: OutputFormat::default(),
        }
    }
}

/// How the binary reports a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Stream text to stdout as it arrives.
    #[default]
    Text,
    /// One JSON object once the stream ends.
    Json,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(Error::Config(format!(
                "Unknown output format '{other}' (expected 'text' or 'json')"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    load_config_from(
        global_config_path().as_deref(),
        project_dir,
        |key| std::env::var(key).ok(),
    )
}

/// Load configuration from explicit sources.
///
/// `env` looks up an environment variable by name.
pub fn load_config_from(
    global_path: Option<&Path>,
    project_dir: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    let mut merged = serde_json::to_value(Config::default())?;

    if let Some(path) = global_path.filter(|p| p.exists()) {
        merge_json(&mut merged, load_config_file(path)?);
    }

    if let Some(dir) = project_dir {
        let project_path = project_config_path(dir);
        if project_path.exists() {
            merge_json(&mut merged, load_config_file(&project_path)?);
        }
    }

    let mut config: Config = serde_json::from_value(merged)
        .map_err(|e| Error::Config(format!("Invalid configuration: {e}")))?;

    apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Reject values the binary cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cli.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be at least 1".into()));
        }
        Ok(())
    }
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ccstream").join("settings.json"))
}

/// Project config file path under `dir`.
pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(".ccstream").join("settings.json")
}

fn load_config_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;
    if !value.is_object() {
        return Err(Error::Config(format!(
            "Config file {} must contain a JSON object",
            path.display()
        )));
    }
    Ok(value)
}

/// Recursively overlay `overlay` onto `base`; objects merge, everything else
/// replaces.
fn merge_json(base: &mut Value, overlay: Value) {
    let overlay = match overlay {
        Value::Object(map) => map,
        other => {
            *base = other;
            return;
        }
    };
    if !base.is_object() {
        *base = Value::Object(overlay);
        return;
    }
    let Some(base) = base.as_object_mut() else {
        return;
    };
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) => merge_json(existing, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

fn apply_env_overrides(config: &mut Config, env: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(val) = env("CCSTREAM_CHUNK_SIZE") {
        config.cli.chunk_size = val.trim().parse().map_err(|e| {
            Error::Config(format!("Invalid CCSTREAM_CHUNK_SIZE '{val}': {e}"))
        })?;
    }
    if let Some(val) = env("CCSTREAM_LOG_LEVEL") {
        config.cli.log_level = val;
    }
    if let Some(val) = env("CCSTREAM_FORMAT") {
        config.cli.format = val.parse()?;
    }
    Ok(())
}
