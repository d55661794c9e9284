//! Named-checkpoint registry
//!
//! Bidirectional name ↔ code map. It lives in ordinary process memory, so
//! duplicating a generation copies it by value: names registered before a
//! fork stay resolvable in descendants, names registered afterwards in one
//! branch are invisible to the other.

use crate::status::{StatusByte, ALL_SENTINEL};
use crate::{Result, RewError};
use std::collections::BTreeMap;
use std::fmt;

/// Smallest code handed out; 0 is what a generation that ends normally reports
const FIRST_CODE: u8 = 1;
/// Largest code handed out; 255 is the "rewind all" sentinel
const LAST_CODE: u8 = ALL_SENTINEL - 1;

/// A validated, non-empty checkpoint name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CheckpointName(String);

impl CheckpointName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(RewError::EmptyName);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for CheckpointName {
    type Error = RewError;

    fn try_from(name: &str) -> Result<Self> {
        Self::new(name)
    }
}

impl AsRef<str> for CheckpointName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckpointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Live named checkpoints of one generation
#[derive(Debug, Clone, Default)]
pub struct Registry {
    by_name: BTreeMap<CheckpointName, StatusByte>,
    by_code: BTreeMap<StatusByte, CheckpointName>,
}

impl Registry {
    pub const fn new() -> Self {
        Self {
            by_name: BTreeMap::new(),
            by_code: BTreeMap::new(),
        }
    }

    /// Register `name` under the lowest free code
    ///
    /// Fails without touching the registry when the name is live or every
    /// code is taken.
    pub fn register(&mut self, name: &CheckpointName) -> Result<StatusByte> {
        if self.by_name.contains_key(name) {
            return Err(RewError::NameConflict(name.to_string()));
        }

        let code = (FIRST_CODE..=LAST_CODE)
            .map(StatusByte::new)
            .find(|code| !self.by_code.contains_key(code))
            .ok_or(RewError::RegistryFull(self.by_code.len()))?;

        self.by_name.insert(name.clone(), code);
        self.by_code.insert(code, name.clone());
        Ok(code)
    }

    /// Code registered for `name`
    pub fn code_of(&self, name: &CheckpointName) -> Option<StatusByte> {
        self.by_name.get(name).copied()
    }

    /// Name registered under `code`
    pub fn name_of(&self, code: StatusByte) -> Option<&CheckpointName> {
        self.by_code.get(&code)
    }

    /// Drop the entry for `code`, returning its name
    pub fn remove(&mut self, code: StatusByte) -> Option<CheckpointName> {
        let name = self.by_code.remove(&code)?;
        self.by_name.remove(&name);
        Some(name)
    }

    pub fn contains(&self, name: &CheckpointName) -> bool {
        self.by_name.contains_key(name)
    }

    /// Live names in code order
    pub fn names(&self) -> impl Iterator<Item = &CheckpointName> {
        self.by_code.values()
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
