//! rew CLI - reversible execution shell

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod cmd;
mod util;

/// rew - checkpoint and rewind a running program
#[derive(Parser)]
#[command(name = "rew")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the reversible shell (one checkpoint per line, `undo` to go back)
    Shell {
        /// Source unit whose statements checkpoint (default: trace.source_unit)
        #[arg(long)]
        source_unit: Option<String>,
    },
    /// Show the effective configuration
    Config {
        /// Print as TOML instead of the annotated listing
        #[arg(long)]
        toml: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = rew_core::config::load().context("Failed to load configuration")?;
    util::init_logging(&config.log)?;

    match cli.command {
        Commands::Shell { source_unit } => cmd::shell::run(&config, source_unit),
        Commands::Config { toml } => cmd::config::run(&config, toml),
    }
}
