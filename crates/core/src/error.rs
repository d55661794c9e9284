//! Error types shared by the rew crates

use std::io;
use thiserror::Error;

/// Errors raised by the checkpoint/rewind engine and its collaborators
#[derive(Debug, Error)]
pub enum RewError {
    /// `named_checkpoint` called with a name that is already live
    #[error("checkpoint name '{0}' already in use")]
    NameConflict(String),

    /// `named_rewind` could not find a reachable checkpoint
    #[error("can't find checkpoint '{0}'")]
    UnknownCheckpoint(String),

    /// Checkpoint names must be non-empty
    #[error("checkpoint name must not be empty")]
    EmptyName,

    /// Rewind distance outside `-1..=255`
    #[error("invalid rewind distance {0} (expected -1..=255)")]
    InvalidDistance(i64),

    /// Rewind distance that is not a number or `all`
    #[error("invalid rewind distance '{0}'")]
    UnparsableDistance(String),

    /// Termination status that cannot be carried in one byte
    #[error("invalid status {0} (expected 0..=255)")]
    InvalidStatus(i32),

    /// Every named-checkpoint code is in use
    #[error("named checkpoint registry is full ({0} live names)")]
    RegistryFull(usize),

    /// Too many live generations
    #[error("refusing to exceed {max} live generations")]
    DepthExceeded { max: u32 },

    /// The OS could not duplicate the process
    #[error("failed to duplicate process")]
    Fork(#[source] io::Error),

    /// Waiting for a descendant generation failed
    #[error("failed to wait for generation {pid}")]
    Wait {
        pid: i32,
        #[source]
        source: io::Error,
    },

    /// A descendant died from a signal instead of terminating with a status
    #[error("generation {pid} was killed by {signal}")]
    GenerationKilled { pid: i32, signal: String },

    /// Configuration could not be loaded or is out of range
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl RewError {
    /// Whether the engine can no longer uphold one live generation per branch
    ///
    /// Fatal errors come from the OS (duplication, waiting, a killed
    /// descendant) or from running out of generations. Everything else is
    /// reported and recovered locally.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RewError::Fork(_)
                | RewError::Wait { .. }
                | RewError::GenerationKilled { .. }
                | RewError::DepthExceeded { .. }
                | RewError::InvalidStatus(_)
        )
    }
}
