//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use rew_core::LogConfig;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` wins over `log.filter`. Events go to stderr, or to `log.file`
/// through a blocking appender: a background writer thread would not exist
/// in forked generations.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .with_context(|| format!("Invalid log filter: {}", config.filter))?,
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match &config.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("Log file has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            builder
                .with_ansi(false)
                .with_writer(tracing_appender::rolling::never(dir, file_name))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
