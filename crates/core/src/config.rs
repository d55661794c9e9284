//! Configuration loading
//!
//! Resolution order:
//! 1. `$REW_CONFIG` (explicit path)
//! 2. `<config_dir>/rew/config.toml`
//! 3. Built-in defaults
//!
//! `REW_MAX_DEPTH` overrides `engine.max_depth` after the file is read.

use crate::{Result, RewError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Env var naming an explicit config file
pub const CONFIG_ENV: &str = "REW_CONFIG";
/// Env var overriding `engine.max_depth`
pub const MAX_DEPTH_ENV: &str = "REW_MAX_DEPTH";
/// Retry budget used when a caller does not give one
pub const DEFAULT_RETRIES: u32 = 1;
/// Source unit checkpointed when none is named
pub const DEFAULT_SOURCE_UNIT: &str = "<stdin>";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewConfig {
    pub engine: EngineConfig,
    pub trace: TraceConfig,
    pub log: LogConfig,
}

/// Checkpoint engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Retry budget for `checkpoint()` without an explicit budget
    pub default_retries: u32,
    /// Maximum number of live generations below the root
    pub max_depth: u32,
    /// Flush stdout/stderr before duplicating or terminating a generation
    pub flush_stdio: bool,
}

impl EngineConfig {
    pub const DEFAULT: EngineConfig = EngineConfig {
        default_retries: DEFAULT_RETRIES,
        max_depth: 4096,
        flush_stdio: true,
    };
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Trace-hook settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Source unit whose events trigger checkpoints
    pub source_unit: String,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            source_unit: DEFAULT_SOURCE_UNIT.to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Write events to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
            file: None,
        }
    }
}

impl RewConfig {
    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: RewConfig =
            toml::from_str(text).map_err(|e| RewError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RewError::Io {
            context: format!("reading {}", path.display()),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RewError::Config(e.to_string()))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(1..=65_536).contains(&self.engine.max_depth) {
            return Err(RewError::Config(format!(
                "engine.max_depth must be 1-65536, got {}",
                self.engine.max_depth
            )));
        }
        if self.trace.source_unit.is_empty() {
            return Err(RewError::Config(
                "trace.source_unit must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(MAX_DEPTH_ENV) {
            self.engine.max_depth = value.trim().parse().map_err(|_| {
                RewError::Config(format!("{MAX_DEPTH_ENV} is not a number: {value}"))
            })?;
        }
        self.validate()
    }
}

/// Path of the config file that [`load`] reads, if one can be determined
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("rew").join("config.toml"))
}

/// Load configuration from the resolved path, falling back to defaults
pub fn load() -> Result<RewConfig> {
    let mut config = match config_file_path() {
        Some(path) if path.exists() => RewConfig::from_file(&path)?,
        _ => RewConfig::default(),
    };
    config.apply_env()?;
    Ok(config)
}
