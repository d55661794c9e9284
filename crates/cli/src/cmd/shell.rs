//! Reversible interactive shell
//!
//! Every line runs in a fresh generation: a statement trace event fires
//! before each read and the installed hook checkpoints there. `undo` rewinds
//! past the previous line, and an empty line or end of input rewinds all
//! the way back to the start.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use rew_cli::{classify, read_line, Bindings, Input, Interpreter};
use rew_core::{EngineConfig, RewConfig};
use rew_trace::{checkpoint_each_statement, emit, TraceEvent};
use std::io::Write;
use tracing::debug;

/// Budget for each line's checkpoint
///
/// Replaces `engine.default_retries` from the config for the whole session.
/// Every landing re-arms, so consecutive `undo`s keep stepping back one
/// line at a time.
pub const SHELL_RETRIES: u32 = u32::MAX;

const PROMPT: &str = ">>> ";

pub fn run(config: &RewConfig, source_unit: Option<String>) -> Result<()> {
    // 1. Resolve the source unit whose statements checkpoint
    let source_unit = source_unit.unwrap_or_else(|| config.trace.source_unit.clone());

    // 2. Configure the engine and install the hook
    rew_engine::configure(EngineConfig {
        default_retries: SHELL_RETRIES,
        ..config.engine
    });
    checkpoint_each_statement(true, &source_unit);
    debug!(%source_unit, "shell started");

    // 3. Read-eval loop
    let mut interpreter = Interpreter::new();
    let mut line_number: u32 = 1;
    let mut stdout = std::io::stdout();

    loop {
        emit(&TraceEvent::statement(&source_unit, line_number));
        // After the checkpoint, so a generation resumed by `undo` shows the
        // reverted bindings
        println!("{}", Bindings(interpreter.scope().locals()).dimmed());

        print!("{}", PROMPT);
        stdout.flush().context("Failed to write prompt")?;
        let line = read_line().context("Failed to read input")?;

        match classify(line.as_deref()) {
            Ok(Input::Quit) => {
                rew_engine::rewind_all();
                break;
            }
            Ok(Input::Undo(distance)) => {
                debug!(%distance, "undo");
                // Only returns in the root generation, where there is nothing to undo
                rew_engine::rewind(distance);
                println!("{}", "nothing to undo".dimmed());
            }
            Ok(Input::Code(code)) => match interpreter.execute(code) {
                Ok(Some(value)) => println!("{}", value),
                Ok(None) => {}
                Err(e) => println!("{} {}", "error:".red(), e),
            },
            Err(e) => println!("{} {}", "error:".red(), e),
        }

        line_number += 1;
    }

    // 4. Only the root generation gets here
    checkpoint_each_statement(false, &source_unit);
    Ok(())
}
