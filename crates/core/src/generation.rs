//! Per-generation engine state

use crate::Registry;

/// State one generation carries across duplication
///
/// Held by value: a forked descendant starts from a copy and the two copies
/// diverge independently afterwards.
#[derive(Debug, Clone)]
pub struct Generation {
    is_root: bool,
    depth: u32,
    registry: Registry,
}

impl Generation {
    /// State of the process that started the program
    pub const fn root() -> Self {
        Self {
            is_root: true,
            depth: 0,
            registry: Registry::new(),
        }
    }

    /// Turn a freshly duplicated copy into the descendant's state
    pub fn descend(&mut self) {
        self.is_root = false;
        self.depth += 1;
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Number of live ancestors
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::root()
    }
}
