//! Shared helpers for the generation scenarios
//!
//! Scenarios duplicate the test process, so observations cannot live in
//! memory: every generation appends to the same file, strictly one after
//! another, and the root reads it back at the end.

#![allow(dead_code)]

use anyhow::{Context, Result};
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use tempfile::TempDir;

/// Append-only record shared by every generation of a scenario
pub struct Tape {
    _dir: TempDir,
    path: PathBuf,
}

impl Tape {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new().context("Failed to create tape directory")?;
        let path = dir.path().join("tape");
        std::fs::write(&path, "").context("Failed to create tape")?;
        Ok(Self { _dir: dir, path })
    }

    /// Append one entry
    pub fn record(&self, value: impl Display) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .context("Failed to open tape")?;
        writeln!(file, "{}", value)?;
        Ok(())
    }

    pub fn entries(&self) -> Result<Vec<String>> {
        let contents = std::fs::read_to_string(&self.path).context("Failed to read tape")?;
        Ok(contents.lines().map(str::to_string).collect())
    }

    pub fn values<T>(&self) -> Result<Vec<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.entries()?
            .iter()
            .map(|entry| entry.parse::<T>().context("Failed to parse tape entry"))
            .collect()
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }
}

/// Run one scenario and report it the way the test harness would
pub fn run(name: &str, scenario: fn() -> Result<()>) -> Result<()> {
    match scenario() {
        Ok(()) => {
            println!("test {} ... ok", name);
            Ok(())
        }
        Err(err) => {
            println!("test {} ... FAILED", name);
            Err(err.context(format!("scenario '{}' failed", name)))
        }
    }
}
