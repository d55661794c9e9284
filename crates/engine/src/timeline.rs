//! Engine state for one generation

use crate::process;
use rew_core::{CheckpointName, EngineConfig, Generation, Result, RewError, StatusByte};

/// Checkpoint/rewind engine bound to the current generation
///
/// A `Timeline` is plain process memory. Duplicating the process gives the
/// descendant its own copy, which [`checkpoint`](Timeline::checkpoint) then
/// marks as non-root; the ancestor's copy is untouched.
///
/// Only the thread that calls into the engine survives a duplication, so a
/// program using it should be single-threaded while checkpoints are live.
#[derive(Debug, Clone)]
pub struct Timeline {
    pub(crate) generation: Generation,
    pub(crate) config: EngineConfig,
}

impl Timeline {
    pub const fn new(config: EngineConfig) -> Self {
        Self {
            generation: Generation::root(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    /// True only in the process that started the program
    pub fn is_root(&self) -> bool {
        self.generation.is_root()
    }

    /// Number of live ancestors of this generation
    pub fn depth(&self) -> u32 {
        self.generation.depth()
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// Named checkpoints resolvable from this generation
    pub fn named_checkpoints(&self) -> impl Iterator<Item = &CheckpointName> {
        self.generation.registry().names()
    }

    /// Refuse to create a generation past `max_depth`
    pub(crate) fn ensure_capacity(&self) -> Result<()> {
        if self.depth() >= self.config.max_depth {
            return Err(RewError::DepthExceeded {
                max: self.config.max_depth,
            });
        }
        Ok(())
    }

    pub(crate) fn terminate(&self, status: StatusByte) -> ! {
        process::terminate(status, self.config.flush_stdio)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(EngineConfig::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_timeline_is_root() {
        let timeline = Timeline::default();
        assert!(timeline.is_root());
        assert_eq!(timeline.depth(), 0);
        assert_eq!(timeline.named_checkpoints().count(), 0);
    }

    #[test]
    fn test_capacity_limit() {
        let mut timeline = Timeline::new(EngineConfig {
            max_depth: 2,
            ..EngineConfig::DEFAULT
        });
        assert!(timeline.ensure_capacity().is_ok());

        timeline.generation.descend();
        assert!(timeline.ensure_capacity().is_ok());

        timeline.generation.descend();
        let err = timeline.ensure_capacity().unwrap_err();
        assert!(matches!(err, RewError::DepthExceeded { max: 2 }));
        assert!(err.is_fatal());
    }
}
