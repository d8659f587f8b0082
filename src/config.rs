//! Config loading: user file, destination repo file, env overrides.
//!
//! Layering, lowest to highest: built-in defaults, the user config at
//! `~/.config/graft/config.toml`, a `graft.toml` at the destination
//! root, then `GRAFT_*` environment variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub stdout: bool,
    pub stdout_format: LogFormat,
    pub filter: Option<String>,
    pub file: FileLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            stdout_format: LogFormat::Tree,
            filter: None,
            file: FileLoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub rotation: LogRotation,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: None,
            format: LogFormat::Json,
            rotation: LogRotation::Daily,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Tree,
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tree" => Ok(LogFormat::Tree),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!(
                "unknown log format {other:?}; expected tree, pretty, compact or json"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRotation {
    Daily,
    Hourly,
    Minutely,
    Never,
}

/// Partial config as read from a file; unset fields fall through to
/// the layer below.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigLayer {
    pub logging: Option<LoggingOverride>,
}

impl ConfigLayer {
    fn apply_to(&self, target: &mut Config) {
        if let Some(logging) = &self.logging {
            logging.apply_to(&mut target.logging);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingOverride {
    pub stdout: Option<bool>,
    pub stdout_format: Option<LogFormat>,
    pub filter: Option<String>,
    pub file: Option<FileLoggingOverride>,
}

impl LoggingOverride {
    fn apply_to(&self, target: &mut LoggingConfig) {
        if let Some(stdout) = self.stdout {
            target.stdout = stdout;
        }
        if let Some(format) = self.stdout_format {
            target.stdout_format = format;
        }
        if let Some(filter) = self.filter.as_ref() {
            target.filter = Some(filter.clone());
        }
        if let Some(file) = self.file.as_ref() {
            file.apply_to(&mut target.file);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoggingOverride {
    pub enabled: Option<bool>,
    pub dir: Option<PathBuf>,
    pub format: Option<LogFormat>,
    pub rotation: Option<LogRotation>,
}

impl FileLoggingOverride {
    fn apply_to(&self, target: &mut FileLoggingConfig) {
        if let Some(enabled) = self.enabled {
            target.enabled = enabled;
        }
        if let Some(dir) = self.dir.as_ref() {
            target.dir = Some(dir.clone());
        }
        if let Some(format) = self.format {
            target.format = format;
        }
        if let Some(rotation) = self.rotation {
            target.rotation = rotation;
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub fn config_path() -> PathBuf {
    paths::config_dir().join("config.toml")
}

pub fn repo_config_path(repo_root: &Path) -> PathBuf {
    repo_root.join("graft.toml")
}

fn load_layer(path: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Loads config for a run against the given destination root.
pub fn load_for_repo(repo_root: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    if let Some(layer) = load_layer(&config_path())? {
        layer.apply_to(&mut config);
    }
    if let Some(root) = repo_root
        && let Some(layer) = load_layer(&repo_config_path(root))?
    {
        layer.apply_to(&mut config);
    }
    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

fn apply_overrides_from(config: &mut Config, get: impl Fn(&str) -> Option<String>) {
    if let Some(raw) = get("GRAFT_LOG") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            config.logging.filter = Some(trimmed.to_string());
        }
    }

    if let Some(raw) = get("GRAFT_LOG_FORMAT") {
        match raw.parse::<LogFormat>() {
            Ok(format) => config.logging.stdout_format = format,
            Err(err) => tracing::warn!("invalid GRAFT_LOG_FORMAT, ignoring: {err}"),
        }
    }

    if let Some(raw) = get("GRAFT_LOG_STDOUT") {
        match raw.trim() {
            "0" | "false" | "no" => config.logging.stdout = false,
            "1" | "true" | "yes" => config.logging.stdout = true,
            other => tracing::warn!("invalid GRAFT_LOG_STDOUT {other:?}, ignoring"),
        }
    }

    if let Some(raw) = get("GRAFT_LOG_DIR") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            config.logging.file.enabled = true;
            config.logging.file.dir = Some(PathBuf::from(trimmed));
        }
    }
}
