//! Runs the `rew` binary with piped stdin and an isolated config

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// `rew` invocation builder
pub struct RewCommand {
    args: Vec<String>,
    env: Vec<(String, String)>,
    stdin_data: String,
    home: TempDir,
}

impl RewCommand {
    /// Command whose config lookup points into a fresh temp directory
    pub fn new(args: &[&str]) -> Result<Self> {
        Ok(Self {
            args: args.iter().map(|s| s.to_string()).collect(),
            env: Vec::new(),
            stdin_data: String::new(),
            home: TempDir::new()?,
        })
    }

    /// Path the command reads its config from
    pub fn config_path(&self) -> PathBuf {
        self.home.path().join("config.toml")
    }

    /// Set environment variable
    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Provide stdin data
    pub fn stdin(&mut self, data: &str) -> &mut Self {
        self.stdin_data = data.to_string();
        self
    }

    /// Execute command and capture its output
    pub fn execute(&self) -> Result<CommandResult> {
        let mut child = Command::new(env!("CARGO_BIN_EXE_rew"))
            .args(&self.args)
            .env("REW_CONFIG", self.config_path())
            .env_remove("RUST_LOG")
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn rew")?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(self.stdin_data.as_bytes())?;
        }

        let output = child
            .wait_with_output()
            .context("Failed to wait for rew")?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }
}

/// Captured output of one run
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    /// Check if command succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Bindings the shell displayed before each prompt, colors removed
    pub fn shown_bindings(&self) -> Vec<String> {
        self.stdout
            .lines()
            .map(|line| line.rsplit(">>> ").next().unwrap_or(line))
            .filter(|text| text.starts_with('\u{1b}'))
            .map(strip_ansi)
            .filter(|text| text.starts_with('{'))
            .collect()
    }

    /// Values the shell printed, in order
    ///
    /// Value lines are the only uncolored output that follows a prompt.
    pub fn printed_values(&self) -> Vec<String> {
        self.stdout
            .split(">>> ")
            .skip(1)
            .filter_map(|chunk| chunk.lines().next())
            .filter(|line| !line.is_empty() && !line.contains('\u{1b}'))
            .map(str::to_string)
            .collect()
    }
}

/// Remove `ESC [ ... m` color sequences
fn strip_ansi(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for code in chars.by_ref() {
                if code == 'm' {
                    break;
                }
            }
        } else {
            plain.push(c);
        }
    }
    plain
}
