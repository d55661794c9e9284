//! Configuration command
//!
//! Shows the effective configuration after file and environment overrides.

use anyhow::Result;
use owo_colors::OwoColorize;
use rew_core::config::{self, RewConfig};

/// Print every configuration value
pub fn run(config: &RewConfig, as_toml: bool) -> Result<()> {
    if as_toml {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let location = match config::config_file_path() {
        Some(path) if path.exists() => path.display().to_string(),
        Some(path) => format!("{} (not present, using defaults)", path.display()),
        None => "(no config directory, using defaults)".to_string(),
    };

    println!("{}", "rew Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), location.dimmed());

    println!("{}", "[engine]".yellow());
    println!(
        "  {} = {} {}",
        "default_retries".cyan(),
        config.engine.default_retries,
        "(rew shell always uses an unlimited budget)".dimmed()
    );
    println!(
        "  {} = {} {}",
        "max_depth".cyan(),
        config.engine.max_depth,
        format!("(override with {})", config::MAX_DEPTH_ENV).dimmed()
    );
    println!("  {} = {}", "flush_stdio".cyan(), config.engine.flush_stdio);

    println!("\n{}", "[trace]".yellow());
    println!(
        "  {} = {:?}",
        "source_unit".cyan(),
        config.trace.source_unit
    );

    println!("\n{}", "[log]".yellow());
    println!("  {} = {:?}", "filter".cyan(), config.log.filter);
    match &config.log.file {
        Some(path) => println!("  {} = {:?}", "file".cyan(), path.display().to_string()),
        None => println!("  {} = {}", "file".cyan(), "(stderr)".dimmed()),
    }

    println!("\n{}", "Valid Ranges:".bold());
    println!("  max_depth: 1-65536");
    println!("  source_unit: non-empty");

    Ok(())
}
