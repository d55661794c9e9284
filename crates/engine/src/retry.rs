//! Retry scopes: checkpoint on entry, rewind on exit
//!
//! Leaving a scope (normally or by panic unwinding) rewinds to its entry
//! checkpoint, so the block re-runs from scratch until the budget is spent.
//! After that the exit rewinds past the scope to whatever checkpoint
//! encloses it, or is absorbed in the root generation.

use crate::{checkpoint, named_checkpoint, named_rewind, rewind};
use rew_core::{CheckpointName, Distance, Result, DEFAULT_RETRIES};

/// Anonymous retry scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    retries: u32,
}

impl Retry {
    pub fn new(retries: u32) -> Self {
        Self { retries }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Checkpoint and return the guard that rewinds when dropped
    pub fn enter(&self) -> Result<RetryGuard> {
        checkpoint(self.retries)?;
        Ok(RetryGuard { armed: true })
    }
}

impl Default for Retry {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES)
    }
}

/// Live retry scope; rewinds one level when dropped
#[must_use = "dropping the guard rewinds immediately"]
#[derive(Debug)]
pub struct RetryGuard {
    armed: bool,
}

impl RetryGuard {
    /// Leave the scope keeping its effects
    pub fn commit(mut self) {
        self.armed = false;
    }
}

impl Drop for RetryGuard {
    fn drop(&mut self) {
        if self.armed {
            rewind(Distance::ONE);
        }
    }
}

/// Named retry scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRetry {
    name: CheckpointName,
}

impl NamedRetry {
    pub fn new(name: &str) -> Result<Self> {
        Ok(Self {
            name: CheckpointName::new(name)?,
        })
    }

    pub fn name(&self) -> &CheckpointName {
        &self.name
    }

    pub fn enter(&self) -> Result<NamedRetryGuard> {
        named_checkpoint(self.name.as_str())?;
        Ok(NamedRetryGuard {
            name: self.name.clone(),
        })
    }
}

/// Live named retry scope; rewinds to its name when dropped
#[must_use = "dropping the guard rewinds immediately"]
#[derive(Debug)]
pub struct NamedRetryGuard {
    name: CheckpointName,
}

impl Drop for NamedRetryGuard {
    fn drop(&mut self) {
        // Unresolvable in the root; already logged by named_rewind
        let _ = named_rewind(self.name.as_str());
    }
}

/// Run `f` inside an anonymous retry scope
///
/// The value only escapes from the attempt that is not rewound.
pub fn retry<T>(retries: u32, f: impl FnOnce() -> T) -> Result<T> {
    let _guard = Retry::new(retries).enter()?;
    Ok(f())
}

/// Run a fallible `f`, retrying only failed attempts
///
/// `Ok` commits the scope; `Err` rewinds to its entry while budget remains.
/// Once it is spent the error rewinds past the scope, and in the root
/// generation it is handed back to the caller.
pub fn attempt<T, E>(
    retries: u32,
    f: impl FnOnce() -> std::result::Result<T, E>,
) -> Result<std::result::Result<T, E>> {
    let guard = Retry::new(retries).enter()?;
    let outcome = f();
    match outcome {
        Ok(_) => guard.commit(),
        Err(_) => drop(guard),
    }
    Ok(outcome)
}
